//! Client-side preference store backed by SQLite.
//!
//! Holds the handful of values the client keeps between runs: the auth
//! token and the selected academic year.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use shared::domain::AcademicYearId;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

pub const SELECTED_ACADEMIC_YEAR_KEY: &str = "selectedAcademicYearId";
pub const AUTH_TOKEN_KEY: &str = "token";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPreference {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open preference store at '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn preference(&self, key: &str) -> Result<Option<StoredPreference>> {
        let row = sqlx::query("SELECT key, value, updated_at FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read preference '{key}'"))?;
        row.map(|r| -> Result<StoredPreference> {
            let updated_at: String = r.get(2);
            Ok(StoredPreference {
                key: r.get(0),
                value: r.get(1),
                updated_at: DateTime::parse_from_rfc3339(&updated_at)
                    .with_context(|| format!("corrupt timestamp for preference '{key}'"))?
                    .with_timezone(&Utc),
            })
        })
        .transpose()
    }

    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        Ok(self.preference(key).await?.map(|p| p.value))
    }

    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write preference '{key}'"))?;
        Ok(())
    }

    /// Returns whether a value was present.
    pub async fn remove_preference(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove preference '{key}'"))?;
        Ok(result.rows_affected() > 0)
    }

    /// A stored id that no longer parses is treated as absent.
    pub async fn selected_academic_year(&self) -> Result<Option<AcademicYearId>> {
        Ok(self
            .get_preference(SELECTED_ACADEMIC_YEAR_KEY)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(AcademicYearId))
    }

    pub async fn set_selected_academic_year(&self, id: AcademicYearId) -> Result<()> {
        self.set_preference(SELECTED_ACADEMIC_YEAR_KEY, &id.0.to_string())
            .await
    }

    pub async fn auth_token(&self) -> Result<Option<String>> {
        self.get_preference(AUTH_TOKEN_KEY).await
    }

    pub async fn set_auth_token(&self, token: &str) -> Result<()> {
        self.set_preference(AUTH_TOKEN_KEY, token).await
    }

    pub async fn clear_auth_token(&self) -> Result<bool> {
        self.remove_preference(AUTH_TOKEN_KEY).await
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
