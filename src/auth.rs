use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

/// Name of the session cookie carried by the admin browser.
pub const SESSION_COOKIE: &str = "swot_session";

/// Sessions (and their cookie) live for 24 hours.
pub const SESSION_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Session
///
/// A server-side session record created on successful admin login. The cookie
/// only carries the opaque session id; the username lives here.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    pub expires_at: DateTime<Utc>,
}

/// SessionStore
///
/// In-process session table mapping opaque UUIDv4 ids to `Session` records.
/// Shared across requests via the cloned `Arc`; expired entries are evicted
/// lazily on access. Sessions do not survive a process restart, which is
/// acceptable for a single-admin internal tool.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// create
    ///
    /// Mints a new session for `user`, valid for `SESSION_MAX_AGE_SECS`, and
    /// returns the opaque id to be set as the cookie value.
    pub async fn create(&self, user: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session {
            user: user.to_string(),
            expires_at: Utc::now() + Duration::seconds(SESSION_MAX_AGE_SECS),
        };
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    /// get
    ///
    /// Resolves an id to its session if present and unexpired. Expired entries
    /// are removed on the spot so the table does not accumulate stale rows.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some(session) if session.expires_at > Utc::now() => Some(session.clone()),
            Some(_) => {
                sessions.remove(id);
                None
            }
            None => None,
        }
    }

    /// destroy
    ///
    /// Unconditionally removes a session. Destroying an unknown id is a no-op,
    /// which lets logout always report success.
    pub async fn destroy(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }
}

/// build_session_cookie
///
/// The Set-Cookie value issued on login: HttpOnly, SameSite=Lax, scoped to the
/// whole site, expiring with the server-side session. `secure` is enabled in
/// production (TLS) deployments only.
pub fn build_session_cookie(session_id: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, session_id, SESSION_MAX_AGE_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// clear_session_cookie
///
/// The Set-Cookie value issued on logout: same attributes, Max-Age=0 so the
/// browser drops the cookie immediately.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// session_id_from_headers
///
/// Extracts the session cookie value from a request's Cookie header, if any.
/// Shared by the `AdminUser` extractor and the logout handler (which must be
/// able to destroy a session without requiring one).
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    let prefix = format!("{}=", SESSION_COOKIE);
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// AdminUser Extractor Result
///
/// The resolved identity of an authenticated admin request. Handlers take this
/// as an argument to gate themselves: if no valid session cookie accompanies
/// the request, the extractor rejects with 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: String,
}

/// AdminUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AdminUser usable as a
/// function argument in any session-gated handler. This cleanly separates
/// authentication (extractor) from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: pull the SessionStore from the application state.
/// 2. Cookie Extraction: find the session cookie among the request's cookies.
/// 3. Session Lookup: resolve the id to an unexpired server-side session.
///
/// Rejection: 401 `{success:false, error:"Unauthorized"}` on any failure,
/// with no side effects.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionStore::from_ref(state);

        let session_id =
            session_id_from_headers(&parts.headers).ok_or_else(ApiError::unauthorized)?;

        let session = sessions
            .get(&session_id)
            .await
            .ok_or_else(ApiError::unauthorized)?;

        Ok(AdminUser { user: session.user })
    }
}
