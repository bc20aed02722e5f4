use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use lazy_static::lazy_static;
use tracing::debug;

use crate::{auth::session::Session, state::AppState};

pub mod routes;

use routes::{decide, GateDecision, RouteClass, RoutePolicy};

lazy_static! {
    static ref POLICY: RoutePolicy = RoutePolicy::default();
}

/// Page-level access control. Runs before any handler; the outcome is a
/// pass-through or a redirect, never an error body.
pub async fn access_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let class = POLICY.classify(&path);
    if class == RouteClass::Bypass {
        return next.run(req).await;
    }

    let session = state.sessions.resolve(req.headers());
    let pages = &state.config.pages;
    match decide(class, session.is_some(), &pages.sign_in, &pages.landing) {
        GateDecision::Allow => {
            if let Some(session) = session {
                req.extensions_mut().insert::<Session>(session);
            }
            next.run(req).await
        }
        GateDecision::Redirect(target) => {
            debug!(%path, ?class, %target, "gate redirect");
            // Keep the query string, only the path changes.
            let location = match req.uri().query() {
                Some(q) => format!("{target}?{q}"),
                None => target,
            };
            Redirect::temporary(&location).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        accounts::memory::MemoryAccountStore,
        auth::{dto::Identity, session::SESSION_COOKIE},
    };
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn gated() -> (Router, AppState) {
        let state = AppState::fake(Arc::new(MemoryAccountStore::default()));
        let app = Router::new()
            .fallback(|req: Request| async move {
                let who = req
                    .extensions()
                    .get::<Session>()
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "anonymous".into());
                format!("page for {who}")
            })
            .layer(from_fn_with_state(state.clone(), access_gate))
            .with_state(state.clone());
        (app, state)
    }

    fn cookie(state: &AppState) -> String {
        let token = state
            .sessions
            .issue(&Identity {
                id: Uuid::new_v4(),
                name: "alice".into(),
                email: "alice@x.com".into(),
            })
            .unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut req = HttpRequest::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        app.clone().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
    }

    fn location(res: &Response) -> &str {
        res.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn protected_page_without_session_redirects_to_sign_in() {
        let (app, _) = gated();
        let res = get(&app, "/dashboard?tab=stats", None).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), "/sign-in?tab=stats");
    }

    #[tokio::test]
    async fn protected_page_with_session_passes_through() {
        let (app, state) = gated();
        let res = get(&app, "/feed", Some(&cookie(&state))).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn entry_pages_send_signed_in_users_to_landing() {
        let (app, state) = gated();
        let c = cookie(&state);
        for path in ["/", "/sign-in", "/sign-up"] {
            let res = get(&app, path, Some(&c)).await;
            assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
            assert_eq!(location(&res), "/feed");

            let res = get(&app, path, None).await;
            assert_eq!(res.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn blog_posts_are_open_either_way() {
        let (app, state) = gated();
        assert_eq!(get(&app, "/blog/rust-tips", None).await.status(), StatusCode::OK);
        let res = get(&app, "/blog/rust-tips", Some(&cookie(&state))).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forged_cookie_counts_as_no_session() {
        let (app, _) = gated();
        let res = get(&app, "/feed", Some(&format!("{SESSION_COOKIE}=not.a.jwt"))).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), "/sign-in");
    }

    #[tokio::test]
    async fn assets_and_api_are_never_redirected() {
        let (app, _) = gated();
        for path in ["/_next/data.json", "/api/anything", "/logo.svg"] {
            assert_eq!(get(&app, path, None).await.status(), StatusCode::OK, "{path}");
        }
    }
}
