//! Root application component with routing and the auth context.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::pages::{dashboard::DashboardPage, login::LoginPage};
use crate::util::auth::AuthStore;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the auth store, runs the mount refresh, and re-validates the
/// session on window focus.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let auth = AuthStore::new();
    provide_context(auth);

    // Effects only run in the browser, so SSR never issues the check.
    Effect::new(move |prev: Option<()>| {
        if prev.is_none() {
            auth.spawn_refresh();
        }
    });
    auth.install_focus_refresh();

    view! {
        <Title text="Relay"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("login") view=LoginPage/>
                <Route path=StaticSegment("") view=DashboardPage/>
            </Routes>
        </Router>
    }
}
