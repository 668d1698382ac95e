#![allow(dead_code)]

use anyhow::Result;
use tempfile::TempDir;

use crate::{config::AppConfig, db::Database};

pub(crate) async fn setup_database() -> Result<(TempDir, Database)> {
    let temp_dir = tempfile::tempdir()?;
    let mut config = AppConfig::default();
    let db_path = temp_dir.path().join("test.db");
    config.database_path = db_path.to_string_lossy().into_owned();

    let database = Database::connect(&config).await?;
    sqlx::migrate!("../server/migrations")
        .run(database.pool())
        .await?;

    Ok((temp_dir, database))
}
