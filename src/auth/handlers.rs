use axum::{
    extract::{FromRef, Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{error, info, instrument, warn};

use crate::{
    accounts::AccountStore,
    auth::{
        credentials::{authenticate, register},
        dto::{OAuthCallback, PublicAccount, SignInForm, SignUpForm},
        extractors::{CurrentSession, FormFields, MaybeSession},
        oauth::link_identity,
        session::{cookie_value, SessionKeys, OAUTH_STATE_COOKIE},
    },
    error::AuthError,
    response::{ApiResponse, Empty},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/session", get(session))
        .route("/api/auth/me", get(me))
}

pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signin/google", get(google_sign_in))
        .route("/api/auth/callback/google", get(google_callback))
}

fn with_cookies(
    mut res: Response,
    cookies: impl IntoIterator<Item = Option<HeaderValue>>,
) -> Response {
    for cookie in cookies.into_iter().flatten() {
        res.headers_mut().append(SET_COOKIE, cookie);
    }
    res
}

fn not_configured() -> Response {
    ApiResponse::error(StatusCode::NOT_FOUND, "Google sign-in is not configured.").into_response()
}

#[instrument(skip(state, form))]
pub async fn sign_up(
    State(state): State<AppState>,
    FormFields(form): FormFields<SignUpForm>,
) -> Result<Response, AuthError> {
    let account = register(state.store.as_ref(), form).await?;
    Ok(
        ApiResponse::success(StatusCode::CREATED, "User created successfully.", account)
            .into_response(),
    )
}

#[instrument(skip(state, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    FormFields(form): FormFields<SignInForm>,
) -> Result<Response, AuthError> {
    let identity = authenticate(state.store.as_ref(), &form.email, &form.password).await?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys.issue(&identity).map_err(AuthError::Internal)?;
    info!(user_id = %identity.id, "session issued");

    let res = ApiResponse::success(StatusCode::OK, "Signed in.", identity).into_response();
    Ok(with_cookies(res, [keys.session_cookie(&token)]))
}

#[instrument(skip(state, session))]
pub async fn sign_out(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Response {
    if let Some(session) = &session {
        info!(user_id = %session.user_id, "signed out");
    }
    let keys = SessionKeys::from_ref(&state);
    let res = ApiResponse::success(StatusCode::OK, "Signed out.", Empty {}).into_response();
    with_cookies(res, [keys.clear_session_cookie()])
}

pub async fn session(MaybeSession(session): MaybeSession) -> Response {
    ApiResponse::success(StatusCode::OK, "Session resolved.", session).into_response()
}

#[instrument(skip(state, session))]
pub async fn me(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AuthError> {
    let Some(account) = state.store.find_by_id(session.user_id).await? else {
        warn!(user_id = %session.user_id, "session refers to a missing account");
        return Err(AuthError::Unauthorized);
    };
    let body = PublicAccount::from(account);
    Ok(ApiResponse::success(StatusCode::OK, "Account loaded.", body).into_response())
}

#[instrument(skip(state))]
pub async fn google_sign_in(State(state): State<AppState>) -> Result<Response, AuthError> {
    let Some(provider) = state.google.as_ref() else {
        return Ok(not_configured());
    };
    let csrf: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let url = provider.authorize_url(&csrf).map_err(AuthError::Internal)?;
    let keys = SessionKeys::from_ref(&state);
    Ok(with_cookies(
        Redirect::to(&url).into_response(),
        [keys.oauth_state_cookie(&csrf)],
    ))
}

#[instrument(skip(state, headers, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<OAuthCallback>,
) -> Result<Response, AuthError> {
    let keys = SessionKeys::from_ref(&state);
    let denied = |reason: &str| {
        let target = format!("{}?error={reason}", state.config.pages.sign_in);
        with_cookies(
            Redirect::to(&target).into_response(),
            [keys.clear_oauth_state_cookie()],
        )
    };

    let Some(provider) = state.google.as_ref() else {
        return Ok(not_configured());
    };
    if let Some(err) = &params.error {
        warn!(provider_error = %err, "provider returned an error");
        return Ok(denied("AccessDenied"));
    }

    let expected = cookie_value(&headers, OAUTH_STATE_COOKIE);
    let (Some(code), Some(returned)) = (params.code.as_deref(), params.state.as_deref()) else {
        warn!("callback missing code or state");
        return Ok(denied("AccessDenied"));
    };
    if expected.as_deref() != Some(returned) {
        warn!("oauth state mismatch");
        return Ok(denied("AccessDenied"));
    }

    let assertion = match provider.exchange(code).await {
        Ok(assertion) => assertion,
        Err(e) => {
            error!(error = %e, "provider code exchange failed");
            return Ok(denied("OAuthCallback"));
        }
    };

    let identity = match link_identity(state.store.as_ref(), provider.kind(), assertion).await {
        Ok(identity) => identity,
        Err(AuthError::ProviderDenied) => return Ok(denied("AccessDenied")),
        Err(other) => return Err(other),
    };

    let token = keys.issue(&identity).map_err(AuthError::Internal)?;
    info!(user_id = %identity.id, "session issued via provider");
    Ok(with_cookies(
        Redirect::to(&state.config.pages.landing).into_response(),
        [keys.session_cookie(&token), keys.clear_oauth_state_cookie()],
    ))
}
