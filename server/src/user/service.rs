use kanri_core::user::UserStore;

use axum::http::HeaderMap;

use crate::{
    AppError,
    cookies::{
        build_session_cookie, build_user_cookie, clear_session_cookie, clear_user_cookie,
        extract_session_token,
    },
    types::{AuthenticatedRestSession, SessionLookup, SessionUser},
};

pub struct UserService {
    user_store: UserStore,
}

impl UserService {
    pub fn new(user_store: UserStore) -> Self {
        Self { user_store }
    }

    /// Resolves the principal from the session cookie or bearer token,
    /// sliding the session expiry and re-issuing cookies on every hit.
    pub(crate) async fn authenticate_rest_request(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedRestSession, AppError> {
        let Some(session_id) = extract_session_token(headers) else {
            return Err(AppError::unauthorized("Authentication required"));
        };

        let Some(session) = self
            .user_store
            .refresh_session(&session_id)
            .await
            .map_err(AppError::from_anyhow)?
        else {
            return Err(AppError::unauthorized("Session expired"));
        };

        let Some(user) = self
            .user_store
            .find_by_id(session.user_id.as_str())
            .await
            .map_err(AppError::from_anyhow)?
        else {
            return Err(AppError::unauthorized("Authentication required"));
        };

        let set_cookies = vec![
            build_session_cookie(&session.id, session.expires_at),
            build_user_cookie(session.user_id.as_str(), session.expires_at),
        ];

        Ok(AuthenticatedRestSession { user, set_cookies })
    }

    /// Session lookup for `GET /api/auth/session`: never errors on a bad
    /// token, it just reports no user and clears the stale cookies.
    pub(crate) async fn pad_session_response(
        &self,
        headers: &HeaderMap,
    ) -> Result<SessionLookup, AppError> {
        let Some(session_id) = extract_session_token(headers) else {
            return Ok(SessionLookup {
                user: None,
                cookies: Vec::new(),
            });
        };

        let mut cookies = Vec::new();

        let Some(session) = self
            .user_store
            .refresh_session(&session_id)
            .await
            .map_err(AppError::from_anyhow)?
        else {
            cookies.push(clear_session_cookie());
            cookies.push(clear_user_cookie());
            return Ok(SessionLookup {
                user: None,
                cookies,
            });
        };

        let Some(user) = self
            .user_store
            .find_by_id(session.user_id.as_str())
            .await
            .map_err(AppError::from_anyhow)?
        else {
            self.delete_session(&session.id).await?;
            cookies.push(clear_session_cookie());
            cookies.push(clear_user_cookie());
            return Ok(SessionLookup {
                user: None,
                cookies,
            });
        };

        cookies.push(build_session_cookie(&session.id, session.expires_at));
        cookies.push(build_user_cookie(session.user_id.as_str(), session.expires_at));

        Ok(SessionLookup {
            user: Some(SessionUser::from(&user)),
            cookies,
        })
    }

    pub(crate) async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        self.user_store
            .delete_session(session_id)
            .await
            .map_err(AppError::from_anyhow)
    }
}
