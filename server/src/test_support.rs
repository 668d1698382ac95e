#![allow(dead_code)]

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use kanri_core::{config::AppConfig, db::Database, user::UserRecord};
use tempfile::TempDir;

use crate::{
    cookies::{SESSION_COOKIE_NAME, USER_COOKIE_NAME},
    state::{AppState, build_state},
    utils::db::run_migrations,
};

pub(crate) async fn setup_state() -> (TempDir, Database, AppState) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let mut config = AppConfig::default();
    let db_path = temp_dir.path().join("test.db");
    config.database_path = db_path.to_string_lossy().into_owned();

    let database = Database::connect(&config).await.expect("connect database");
    run_migrations(database.pool())
        .await
        .expect("apply migrations");

    let state = build_state(&database);
    (temp_dir, database, state)
}

pub(crate) async fn seed_user(state: &AppState, email: &str) -> UserRecord {
    state
        .user_store
        .create(email, "hash", None)
        .await
        .expect("create user")
}

pub(crate) async fn signed_in_headers(state: &AppState, user: &UserRecord) -> HeaderMap {
    let session = state
        .user_store
        .create_session(user.id.as_str())
        .await
        .expect("create session");

    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!(
            "{}={}; {}={}",
            SESSION_COOKIE_NAME,
            session.id,
            USER_COOKIE_NAME,
            user.id.as_str()
        ))
        .expect("cookie header"),
    );
    headers
}
