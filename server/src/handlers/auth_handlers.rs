// Authentication and session management handlers

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    auth::{authenticate_with_password, pad_session_response},
    cookies::{
        build_session_cookie, build_user_cookie, clear_session_cookie, clear_user_cookie,
        extract_session_token,
    },
    error::AppError,
    http::append_set_cookie_headers,
    state::AppState,
    types::{SessionUser, SessionUserPayload, SignInRequest, SuccessResponse},
};

pub(crate) async fn sign_in_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Response, AppError> {
    let SignInRequest { email, password } = payload;
    let email = email.trim().to_owned();
    if email.is_empty() {
        return Err(AppError::bad_request("Email is required"));
    }

    let password = password.ok_or_else(|| AppError::bad_request("Password is required"))?;
    if password.is_empty() {
        return Err(AppError::bad_request("Password is required"));
    }

    let (user, session) = authenticate_with_password(&state, &email, &password).await?;

    let cookies = vec![
        build_session_cookie(&session.id, session.expires_at),
        build_user_cookie(user.id.as_str(), session.expires_at),
    ];

    let mut response = Json(SessionUser::from(&user)).into_response();
    append_set_cookie_headers(&mut response, &cookies)?;
    Ok(response)
}

pub(crate) async fn get_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session_lookup = pad_session_response(&state, &headers).await?;
    let payload = SessionUserPayload {
        user: session_lookup.user,
    };
    let mut response = Json(payload).into_response();
    append_set_cookie_headers(&mut response, &session_lookup.cookies)?;
    Ok(response)
}

pub(crate) async fn sign_out_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(session_id) = extract_session_token(&headers) {
        state.user_service.delete_session(&session_id).await?;
    }

    let mut response = Json(SuccessResponse::ok()).into_response();
    append_set_cookie_headers(&mut response, &[clear_session_cookie(), clear_user_cookie()])?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{StatusCode, header::SET_COOKIE},
    };
    use serde_json::Value as JsonValue;

    use crate::{
        auth::generate_password_hash,
        cookies::{SESSION_COOKIE_NAME, USER_COOKIE_NAME},
        test_support::{setup_state, signed_in_headers},
    };

    #[tokio::test]
    async fn sign_in_returns_user_and_sets_cookies() {
        let (_temp_dir, _database, state) = setup_state().await;
        let password_hash = generate_password_hash("secret").expect("hash password");
        let user = state
            .user_store
            .create("signin@example.com", &password_hash, Some("Sign In"))
            .await
            .expect("create user");

        let response = sign_in_handler(
            State(state.clone()),
            Json(SignInRequest {
                email: user.email.clone(),
                password: Some("secret".into()),
            }),
        )
        .await
        .expect("sign-in response");

        assert_eq!(response.status(), StatusCode::OK);
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["id"], user.id.as_str());
        assert_eq!(json["email"], user.email);
        assert_eq!(json["name"], "Sign In");

        let cookies: Vec<_> = parts.headers.get_all(SET_COOKIE).iter().collect();
        assert!(cookies.iter().any(|value| {
            value
                .to_str()
                .unwrap()
                .starts_with(&format!("{}=", SESSION_COOKIE_NAME))
        }));
        assert!(cookies.iter().any(|value| {
            value
                .to_str()
                .unwrap()
                .starts_with(&format!("{}=", USER_COOKIE_NAME))
        }));
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_password_with_401() {
        let (_temp_dir, _database, state) = setup_state().await;
        let password_hash = generate_password_hash("secret").expect("hash password");
        state
            .user_store
            .create("locked@example.com", &password_hash, None)
            .await
            .expect("create user");

        let err = sign_in_handler(
            State(state.clone()),
            Json(SignInRequest {
                email: "locked@example.com".into(),
                password: Some("wrong".into()),
            }),
        )
        .await
        .expect_err("bad password should error");

        let (status, payload) = err.into_payload();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(payload.error, "Invalid credentials");
    }

    #[tokio::test]
    async fn session_lookup_returns_current_user() {
        let (_temp_dir, _database, state) = setup_state().await;
        let user = state
            .user_store
            .create("current@example.com", "hash", Some("Current"))
            .await
            .expect("create user");
        let headers = signed_in_headers(&state, &user).await;

        let response = get_session_handler(State(state.clone()), headers)
            .await
            .expect("session response");
        assert_eq!(response.status(), StatusCode::OK);

        let (_parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["user"]["id"], user.id.as_str());
        assert_eq!(json["user"]["name"], "Current");
    }

    #[tokio::test]
    async fn session_lookup_clears_stale_cookie() {
        let (_temp_dir, _database, state) = setup_state().await;
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            axum::http::HeaderValue::from_str(&format!("{}=invalid", SESSION_COOKIE_NAME))
                .expect("cookie header"),
        );

        let response = get_session_handler(State(state.clone()), headers)
            .await
            .expect("session response");
        assert_eq!(response.status(), StatusCode::OK);

        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert!(json.get("user").is_none());

        let set_cookies: Vec<_> = parts.headers.get_all(SET_COOKIE).iter().collect();
        assert!(set_cookies.iter().any(|value| {
            let value = value.to_str().unwrap();
            value.starts_with(&format!("{}=", SESSION_COOKIE_NAME)) && value.contains("Max-Age=0")
        }));
    }

    #[tokio::test]
    async fn sign_out_removes_session() {
        let (_temp_dir, _database, state) = setup_state().await;
        let user = state
            .user_store
            .create("signout@example.com", "hash", None)
            .await
            .expect("create user");
        let session = state
            .user_store
            .create_session(user.id.as_str())
            .await
            .expect("create session");

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            axum::http::HeaderValue::from_str(&format!(
                "{}={}",
                SESSION_COOKIE_NAME, session.id
            ))
            .expect("cookie header"),
        );

        let response = sign_out_handler(State(state.clone()), headers)
            .await
            .expect("sign-out response");
        assert_eq!(response.status(), StatusCode::OK);

        let stored = state
            .user_store
            .find_session(&session.id)
            .await
            .expect("query session");
        assert!(stored.is_none(), "session should be deleted");
    }
}
