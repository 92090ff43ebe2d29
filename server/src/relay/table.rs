//! Declarative relay route table.
//!
//! Each `RelaySpec` describes one browser-facing `(method, route)` pair and
//! the single backend endpoint it forwards to. The table is static and
//! immutable; `routes::api_routes` registers one handler per entry.

use axum::http::Method;
use axum::routing::MethodFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RelayMethod {
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }

    #[must_use]
    pub fn filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Delete => MethodFilter::DELETE,
        }
    }
}

/// Where authorization is decided for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Enforced locally: no verified session means 401 without a backend call.
    Session,
    /// Delegated: the caller's `Authorization` header is passed through
    /// (or omitted) and the backend decides.
    Bearer,
    /// No credential is forwarded.
    Public,
}

/// An allow-listed query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParam {
    pub name: &'static str,
    /// Sent when the caller omits the parameter. `None` means omit it too.
    pub default: Option<&'static str>,
}

impl QueryParam {
    #[must_use]
    pub const fn defaulted(name: &'static str, default: &'static str) -> Self {
        Self { name, default: Some(default) }
    }

    #[must_use]
    pub const fn optional(name: &'static str) -> Self {
        Self { name, default: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Nothing is forwarded; any inbound body is ignored.
    None,
    /// Inbound body must be JSON; listed fields must be present and non-empty.
    Json { required: &'static [&'static str] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySpec {
    /// Short identifier used in logs.
    pub name: &'static str,
    pub method: RelayMethod,
    /// Browser-facing path template with `{param}` segments.
    pub route: &'static str,
    /// Backend path template. Placeholders resolve from route params first,
    /// then from `segments`.
    pub backend_path: &'static str,
    /// Query parameters substituted into `backend_path` instead of appended.
    pub segments: &'static [QueryParam],
    /// Query parameters appended to the backend URL, in this order.
    pub query: &'static [QueryParam],
    pub auth: AuthPolicy,
    pub body: BodyPolicy,
    /// Message for the synthesized 500 when the backend call fails.
    pub failure_message: &'static str,
}

pub static RELAY_ROUTES: &[RelaySpec] = &[
    // -------------------------------------------------------------------------
    // Coupons
    // -------------------------------------------------------------------------
    RelaySpec {
        name: "coupon_list",
        method: RelayMethod::Get,
        route: "/api/coupon/list",
        backend_path: "/api/coupon/list",
        segments: &[],
        query: &[
            QueryParam::defaulted("page", "1"),
            QueryParam::defaulted("page_size", "20"),
            QueryParam::optional("is_active"),
        ],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::None,
        failure_message: "Failed to fetch coupons",
    },
    RelaySpec {
        name: "coupon_create",
        method: RelayMethod::Post,
        route: "/api/coupon/create",
        backend_path: "/api/coupon/create",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::Json { required: &["code", "name", "type", "value"] },
        failure_message: "Failed to create coupon",
    },
    RelaySpec {
        name: "coupon_use",
        method: RelayMethod::Post,
        route: "/api/coupon/use",
        backend_path: "/api/coupon/use",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::Json { required: &["code"] },
        failure_message: "Failed to use coupon",
    },
    RelaySpec {
        name: "coupon_validate",
        method: RelayMethod::Get,
        route: "/api/coupon/validate/{code}",
        backend_path: "/api/coupon/validate/{code}",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::None,
        failure_message: "Failed to validate coupon",
    },
    RelaySpec {
        name: "my_coupons",
        method: RelayMethod::Get,
        route: "/api/coupon/my-coupons",
        backend_path: "/api/coupon/my-coupons",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::None,
        failure_message: "Failed to fetch my coupons",
    },
    // -------------------------------------------------------------------------
    // Monetization
    // -------------------------------------------------------------------------
    RelaySpec {
        name: "monetization_get",
        method: RelayMethod::Get,
        route: "/api/monetization",
        backend_path: "/api/monetization/{endpoint}",
        segments: &[QueryParam::defaulted("endpoint", "plan")],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::None,
        failure_message: "Failed to fetch monetization data",
    },
    RelaySpec {
        name: "monetization_post",
        method: RelayMethod::Post,
        route: "/api/monetization",
        backend_path: "/api/monetization/{endpoint}",
        segments: &[QueryParam::defaulted("endpoint", "subscribe")],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::Json { required: &[] },
        failure_message: "Failed to process monetization request",
    },
    // -------------------------------------------------------------------------
    // Recommendation + social feed
    // -------------------------------------------------------------------------
    RelaySpec {
        name: "trending",
        method: RelayMethod::Get,
        route: "/api/recommendation/trending",
        backend_path: "/api/recommendation/trending",
        segments: &[],
        query: &[QueryParam::defaulted("limit", "20"), QueryParam::defaulted("time_window", "7")],
        auth: AuthPolicy::Public,
        body: BodyPolicy::None,
        failure_message: "Failed to fetch trending videos",
    },
    RelaySpec {
        name: "feed",
        method: RelayMethod::Get,
        route: "/api/recommendation/feed",
        backend_path: "/api/recommendation/feed",
        segments: &[],
        query: &[QueryParam::defaulted("limit", "20")],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::None,
        failure_message: "Failed to fetch feed",
    },
    RelaySpec {
        name: "timeline",
        method: RelayMethod::Get,
        route: "/api/sns/timeline",
        backend_path: "/api/sns/timeline",
        segments: &[],
        query: &[QueryParam::defaulted("page", "1"), QueryParam::defaulted("page_size", "20")],
        auth: AuthPolicy::Public,
        body: BodyPolicy::None,
        failure_message: "Failed to fetch timeline",
    },
    RelaySpec {
        name: "video_like",
        method: RelayMethod::Post,
        route: "/api/sns/video/{video_id}/like",
        backend_path: "/api/sns/video/{video_id}/like",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::None,
        failure_message: "Failed to like video",
    },
    RelaySpec {
        name: "video_unlike",
        method: RelayMethod::Delete,
        route: "/api/sns/video/{video_id}/like",
        backend_path: "/api/sns/video/{video_id}/like",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Bearer,
        body: BodyPolicy::None,
        failure_message: "Failed to unlike video",
    },
    // -------------------------------------------------------------------------
    // Studio projects (session enforced locally)
    // -------------------------------------------------------------------------
    RelaySpec {
        name: "project_list",
        method: RelayMethod::Get,
        route: "/api/allinone-studio/project",
        backend_path: "/api/allinone-studio/project",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Session,
        body: BodyPolicy::None,
        failure_message: "Failed to load projects",
    },
    RelaySpec {
        name: "project_save",
        method: RelayMethod::Post,
        route: "/api/allinone-studio/project",
        backend_path: "/api/allinone-studio/project",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Session,
        body: BodyPolicy::Json { required: &["id", "type"] },
        failure_message: "Failed to save project",
    },
    RelaySpec {
        name: "project_get",
        method: RelayMethod::Get,
        route: "/api/allinone-studio/project/{id}",
        backend_path: "/api/allinone-studio/project/{id}",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Session,
        body: BodyPolicy::None,
        failure_message: "Failed to load project",
    },
    RelaySpec {
        name: "project_update",
        method: RelayMethod::Put,
        route: "/api/allinone-studio/project/{id}",
        backend_path: "/api/allinone-studio/project/{id}",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Session,
        body: BodyPolicy::Json { required: &[] },
        failure_message: "Failed to update project",
    },
    RelaySpec {
        name: "project_delete",
        method: RelayMethod::Delete,
        route: "/api/allinone-studio/project/{id}",
        backend_path: "/api/allinone-studio/project/{id}",
        segments: &[],
        query: &[],
        auth: AuthPolicy::Session,
        body: BodyPolicy::None,
        failure_message: "Failed to delete project",
    },
];

/// Look up a spec by its log name.
#[cfg(test)]
#[must_use]
pub fn find(name: &str) -> Option<&'static RelaySpec> {
    RELAY_ROUTES.iter().find(|spec| spec.name == name)
}

/// Names of `{param}` placeholders in a path template, in order.
#[cfg(test)]
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    template
        .split('/')
        .filter_map(|segment| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .collect()
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
