use chrono::Utc;
use std::{error::Error, fmt, sync::Arc};
use tokio_postgres::{Client, Error as ClientError};

/// Opaque key/value storage backed by the `plugin_kv` table.
#[derive(Clone)]
pub struct KvService {
    client: Arc<Client>,
}

impl KvService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvServiceError> {
        let row = self
            .client
            .query_opt("SELECT value FROM plugin_kv WHERE key = $1", &[&key])
            .await
            .map_err(|source| KvServiceError::Get {
                source,
                key: key.to_string(),
            })?;
        Ok(row.map(|row| row.get(0)))
    }

    pub async fn set(&self, key: &str, value: &[u8]) -> Result<(), KvServiceError> {
        self.client
            .execute(
                r#"
                INSERT INTO plugin_kv (key, value, updated_at) VALUES ($1, $2, $3)
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
                "#,
                &[&key, &value, &Utc::now().naive_utc()],
            )
            .await
            .map_err(|source| KvServiceError::Set {
                source,
                key: key.to_string(),
            })?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum KvServiceError {
    Get { source: ClientError, key: String },
    Set { source: ClientError, key: String },
}

impl fmt::Display for KvServiceError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::KvServiceError::*;
        match self {
            Get { source, key } => write!(out, "Could not get value for key {}: {}", key, source),
            Set { source, key } => write!(out, "Could not set value for key {}: {}", key, source),
        }
    }
}

impl Error for KvServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::KvServiceError::*;
        Some(match self {
            Get { source, .. } => source,
            Set { source, .. } => source,
        })
    }
}
