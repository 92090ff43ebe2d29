//! Dashboard page, the authenticated landing route.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shows the signed-in identity from the auth store. Anonymous visitors are
//! redirected to `/login` by the enclosing guard.

use leptos::prelude::*;

use crate::components::route_guard::RouteGuard;
use crate::util::auth::AuthStore;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = expect_context::<AuthStore>();
    let state = auth.state();

    let email = move || state.get().user.map(|u| u.email).unwrap_or_default();
    let role = move || state.get().user.map(|u| u.role).unwrap_or_default();

    view! {
        <RouteGuard>
            <div class="dashboard-page">
                <h1>"Dashboard"</h1>
                <p class="dashboard-page__identity">
                    "Signed in as " <strong>{email}</strong> " (" {role} ")"
                </p>
                <button class="dashboard-page__refresh" on:click=move |_| auth.spawn_refresh()>
                    "Re-check session"
                </button>
            </div>
        </RouteGuard>
    }
}
