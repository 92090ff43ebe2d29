//! Route guard gating content on the shared auth state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Wraps page content. Protected routes (`require_auth`) send anonymous users
//! to `redirect_to`; guest-only routes send signed-in users to the landing
//! page. Navigation fires once per transition and never while loading.

use leptos::prelude::*;
use leptos::tachys::view::any_view::IntoAny;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::util::auth::{AuthStore, DEFAULT_LOGIN, GuardDecision, RedirectLatch, guard_decision};

#[component]
pub fn RouteGuard(
    /// `true` for protected routes, `false` for guest-only routes.
    #[prop(default = true)]
    require_auth: bool,
    /// Target for anonymous users on a protected route.
    #[prop(into, default = DEFAULT_LOGIN.to_owned())]
    redirect_to: String,
    children: ChildrenFn,
) -> impl IntoView {
    let auth = expect_context::<AuthStore>();
    let state = auth.state();
    let navigate = use_navigate();

    let decision = Memo::new(move |_| guard_decision(&state.get(), require_auth, &redirect_to));

    let latch = StoredValue::new(RedirectLatch::default());
    Effect::new(move || {
        let current = decision.get();
        if let Some(target) = latch.try_update_value(|l| l.observe(&current)).flatten() {
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    move || match decision.get() {
        GuardDecision::Loading => view! {
            <div class="route-guard__loading" role="status" aria-busy="true">
                <span class="route-guard__spinner"></span>
                "Loading..."
            </div>
        }
        .into_any(),
        GuardDecision::Redirect(_) => ().into_any(),
        GuardDecision::Render => children().into_any(),
    }
}
