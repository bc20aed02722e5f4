use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{header, HeaderMap, HeaderValue},
};
use anyhow::Context;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::dto::Identity;
use crate::{config::SessionConfig, state::AppState};

pub const SESSION_COOKIE: &str = "inkgate_session";
pub const OAUTH_STATE_COOKIE: &str = "inkgate_oauth_state";

/// Signed session payload held by the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // account id
    pub name: String,  // display name
    pub email: String, // account email
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Authenticated context derived from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
        }
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub cookie_secure: bool,
}

impl From<&SessionConfig> for SessionKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(u64::try_from(cfg.ttl_minutes).unwrap_or(0).saturating_mul(60)),
            cookie_secure: cfg.cookie_secure,
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.as_ref().clone()
    }
}

impl SessionKeys {
    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .context("session expiry out of range")?;
        let claims = Claims {
            sub: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %identity.id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Session> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims.into())
    }

    /// Session carried by the request, if any. Each candidate token (bearer
    /// first, then the session cookie) is verified in turn, so a stale
    /// bearer does not hide a valid cookie. Invalid, expired and absent
    /// tokens all resolve to `None`.
    pub fn resolve(&self, headers: &HeaderMap) -> Option<Session> {
        [bearer_token(headers), cookie_value(headers, SESSION_COOKIE)]
            .into_iter()
            .flatten()
            .find_map(|token| match self.verify(&token) {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!(error = %e, "session token rejected");
                    None
                }
            })
    }

    pub fn session_cookie(&self, token: &str) -> Option<HeaderValue> {
        self.cookie(SESSION_COOKIE, token, self.ttl.as_secs())
    }

    pub fn clear_session_cookie(&self) -> Option<HeaderValue> {
        self.cookie(SESSION_COOKIE, "", 0)
    }

    pub fn oauth_state_cookie(&self, state: &str) -> Option<HeaderValue> {
        self.cookie(OAUTH_STATE_COOKIE, state, 600)
    }

    pub fn clear_oauth_state_cookie(&self) -> Option<HeaderValue> {
        self.cookie(OAUTH_STATE_COOKIE, "", 0)
    }

    fn cookie(&self, name: &str, value: &str, max_age: u64) -> Option<HeaderValue> {
        let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, val)| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
