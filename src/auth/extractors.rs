use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts, Multipart, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form,
};
use serde::{
    de::{value::MapDeserializer, DeserializeOwned},
    Deserialize,
};
use tracing::warn;

use super::session::{Session, SessionKeys};
use crate::error::AuthError;

/// Requires a valid session cookie or bearer token.
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // The access gate already resolved it for page requests.
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(CurrentSession(session.clone()));
        }
        let keys = SessionKeys::from_ref(state);
        match keys.resolve(&parts.headers) {
            Some(session) => Ok(CurrentSession(session)),
            None => {
                warn!("missing or invalid session");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

/// Resolves the session when present without rejecting anonymous requests.
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(MaybeSession(Some(session.clone())));
        }
        Ok(MaybeSession(SessionKeys::from_ref(state).resolve(&parts.headers)))
    }
}

/// Form body sent either url-encoded or as `multipart/form-data` (what a
/// browser `FormData` post produces). Only text fields are read; file parts
/// are skipped.
pub struct FormFields<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormFields<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(inner) = Form::<T>::from_request(req, state)
                .await
                .map_err(unreadable_form)?;
            return Ok(FormFields(inner));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(unreadable_form)?;
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(unreadable_form)? {
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field.text().await.map_err(unreadable_form)?;
            fields.push((name, value));
        }

        let fields = MapDeserializer::<_, serde::de::value::Error>::new(fields.into_iter());
        <T as Deserialize>::deserialize(fields)
            .map(FormFields)
            .map_err(unreadable_form)
    }
}

fn unreadable_form(err: impl std::fmt::Display) -> AuthError {
    warn!(error = %err, "unreadable form body");
    AuthError::InvalidInput("Request must be form-encoded.".into())
}
