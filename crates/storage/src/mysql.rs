use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::types::Json;
use tracing::info;

use watchpost_core::config::{resolve_env_vars, DbSettings};
use watchpost_core::event::DetectionEvent;

use crate::error::StorageError;
use crate::store::EventStore;

const MAX_CONNECTIONS: u32 = 5;

/// Event store backed by the MySQL `event` table.
#[derive(Clone)]
pub struct MySqlEventStore {
    pool: MySqlPool,
}

impl MySqlEventStore {
    /// Connect using the `db` config section and apply pending migrations.
    ///
    /// The password may reference environment variables as `${VAR}`.
    pub async fn connect(settings: &DbSettings) -> Result<Self, StorageError> {
        let options = connect_options(settings)?;
        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            "MySQL connected"
        );

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database migrations applied successfully");

        Ok(Self { pool })
    }
}

fn connect_options(settings: &DbSettings) -> Result<MySqlConnectOptions, StorageError> {
    let password = resolve_env_vars(&settings.password)?;
    Ok(MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&password)
        .database(&settings.database))
}

#[async_trait]
impl EventStore for MySqlEventStore {
    async fn log_event(&self, event: &DetectionEvent) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO event (identifier, label, confidence, bounding_box, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&event.identifier)
        .bind(&event.label)
        .bind(event.confidence)
        .bind(Json(&event.bounding_box))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM event WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn backend_name(&self) -> &str {
        "mysql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(password: &str) -> DbSettings {
        DbSettings {
            host: "db.local".to_string(),
            port: 3307,
            user: "watchpost".to_string(),
            password: password.to_string(),
            database: "events".to_string(),
        }
    }

    #[test]
    fn connect_options_resolve_password_env() {
        std::env::set_var("WP_STORAGE_TEST_PASSWORD", "hunter2");
        let options = connect_options(&settings("${WP_STORAGE_TEST_PASSWORD}")).unwrap();
        assert_eq!(options.get_host(), "db.local");
        assert_eq!(options.get_port(), 3307);
        assert_eq!(options.get_username(), "watchpost");
        assert_eq!(options.get_database(), Some("events"));
        std::env::remove_var("WP_STORAGE_TEST_PASSWORD");
    }

    #[test]
    fn connect_options_missing_env_is_config_error() {
        let result = connect_options(&settings("${WP_STORAGE_UNSET_98765}"));
        match result {
            Err(StorageError::Config(e)) => assert!(e.to_string().contains("WP_STORAGE_UNSET_98765")),
            Err(other) => panic!("expected Config error, got: {other}"),
            Ok(_) => panic!("expected Config error"),
        }
    }
}
