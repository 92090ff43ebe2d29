//! Login page shown to anonymous visitors.
//!
//! Sign-in itself happens on the backend, which sets the `session_token`
//! cookie. "I've signed in" re-checks the session so the guard can move the
//! user on without a reload.

use leptos::prelude::*;

use crate::components::route_guard::RouteGuard;
use crate::util::auth::AuthStore;

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = expect_context::<AuthStore>();

    view! {
        <RouteGuard require_auth=false>
            <div class="login-page">
                <div class="login-card">
                    <h1>"Sign in"</h1>
                    <p class="login-card__subtitle">"Your session is checked automatically."</p>
                    <button class="login-button" on:click=move |_| auth.spawn_refresh()>
                        "I've signed in"
                    </button>
                </div>
            </div>
        </RouteGuard>
    }
}
