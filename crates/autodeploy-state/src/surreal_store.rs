//! SurrealDB-backed ProjectStore implementation
//!
//! Rows are stored as `repositories:<name>` records so that `upsert` is a
//! single keyed write. Timestamps are converted between `chrono` and
//! SurrealDB datetimes at the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::StorageError;
use crate::migrations;
use crate::storage_traits::{ProjectRecord, ProjectStore, StorageResult};

const TABLE: &str = "repositories";

/// Connection settings for the deployment queue database
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Connection string (e.g. "ws://localhost:8000", "surrealkv://.autodeploy/db")
    pub url: String,
    /// Optional username; authentication is skipped when absent
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// Namespace (default: "autodeploy")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether the user is a root user (true) or database user (false)
    pub is_root: bool,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            namespace: "autodeploy".to_string(),
            database: "main".to_string(),
            is_root: false,
        }
    }

    /// Set credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - AUTODEPLOY_DATABASE_URL (required)
    /// - AUTODEPLOY_DATABASE_USER / AUTODEPLOY_DATABASE_PASS (optional)
    /// - AUTODEPLOY_DATABASE_NAMESPACE (optional, default: "autodeploy")
    /// - AUTODEPLOY_DATABASE_NAME (optional, default: "main")
    /// - AUTODEPLOY_DATABASE_ROOT (optional, default: "false")
    pub fn from_env() -> StorageResult<Self> {
        let url = std::env::var("AUTODEPLOY_DATABASE_URL").map_err(|_| {
            StorageError::MissingCredential {
                var: "AUTODEPLOY_DATABASE_URL".to_string(),
            }
        })?;
        let mut config = Self::new(url);
        config.username = std::env::var("AUTODEPLOY_DATABASE_USER").ok();
        config.password = std::env::var("AUTODEPLOY_DATABASE_PASS").ok();
        if let Ok(ns) = std::env::var("AUTODEPLOY_DATABASE_NAMESPACE") {
            config.namespace = ns;
        }
        if let Ok(db) = std::env::var("AUTODEPLOY_DATABASE_NAME") {
            config.database = db;
        }
        config.is_root = std::env::var("AUTODEPLOY_DATABASE_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbProject {
    name: String,
    project_path: String,
    branch: String,
    publish_path: Option<String>,
    post_deploy_path: Option<String>,
    automated: bool,
    queued: bool,
    deployment_group: i64,
    last_deployed_at: Option<SurrealDatetime>,
}

impl From<ProjectRecord> for DbProject {
    fn from(record: ProjectRecord) -> Self {
        Self {
            name: record.name,
            project_path: record.project_path,
            branch: record.branch,
            publish_path: record.publish_path,
            post_deploy_path: record.post_deploy_path,
            automated: record.automated,
            queued: record.queued,
            deployment_group: record.deployment_group,
            last_deployed_at: record.last_deployed_at.map(SurrealDatetime::from),
        }
    }
}

impl DbProject {
    fn into_record(self) -> ProjectRecord {
        ProjectRecord {
            name: self.name,
            project_path: self.project_path,
            branch: self.branch,
            publish_path: self.publish_path,
            post_deploy_path: self.post_deploy_path,
            automated: self.automated,
            queued: self.queued,
            deployment_group: self.deployment_group,
            last_deployed_at: self.last_deployed_at.map(DateTime::<Utc>::from),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueuedRow {
    queued: bool,
}

/// SurrealDB-backed implementation of [`ProjectStore`].
pub struct SurrealProjectStore {
    db: Surreal<Any>,
}

impl SurrealProjectStore {
    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect(&ConnectionConfig::new("mem://")).await
    }

    /// Connect, authenticate when credentials are present, and initialize the schema.
    #[instrument(skip(config), fields(url = %config.url, namespace = %config.namespace, database = %config.database))]
    pub async fn connect(config: &ConnectionConfig) -> StorageResult<Self> {
        let db = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to connect to {}: {}", config.url, e))
            })?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            if config.is_root {
                db.signin(Root { username, password })
                    .await
                    .map_err(|e| StorageError::Connection(format!("Root auth failed: {e}")))?;
            } else {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username,
                    password,
                })
                .await
                .map_err(|e| StorageError::Connection(format!("DB auth failed: {e}")))?;
            }
        }

        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        info!("SurrealProjectStore connected");
        Ok(Self { db })
    }

    /// Connect using `ConnectionConfig::from_env`.
    pub async fn from_env() -> StorageResult<Self> {
        let config = ConnectionConfig::from_env()?;
        Self::connect(&config).await
    }
}

#[async_trait]
impl ProjectStore for SurrealProjectStore {
    #[instrument(skip(self, record), fields(project = %record.name))]
    async fn upsert(&self, record: ProjectRecord) -> StorageResult<()> {
        debug!("Upserting project");
        let key = record.name.clone();
        let _stored: Option<DbProject> = self
            .db
            .upsert((TABLE, key))
            .content(DbProject::from(record))
            .await?;
        Ok(())
    }

    async fn list_automated(&self) -> StorageResult<Vec<ProjectRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT name, project_path, branch, publish_path, post_deploy_path, \
                 automated, queued, deployment_group, last_deployed_at \
                 FROM repositories WHERE automated = true \
                 ORDER BY deployment_group ASC, name ASC",
            )
            .await?;
        let rows: Vec<DbProject> = result.take(0)?;
        Ok(rows.into_iter().map(DbProject::into_record).collect())
    }

    async fn is_queued(&self, name: &str) -> StorageResult<bool> {
        let mut result = self
            .db
            .query("SELECT queued FROM repositories WHERE name = $name")
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<QueuedRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|r| r.queued)
            .ok_or_else(|| StorageError::ProjectNotFound {
                name: name.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn set_queued(&self, name: &str, queued: bool) -> StorageResult<()> {
        let mut result = self
            .db
            .query("UPDATE repositories SET queued = $queued WHERE name = $name RETURN AFTER")
            .bind(("queued", queued))
            .bind(("name", name.to_string()))
            .await?;
        let updated: Vec<DbProject> = result.take(0)?;
        if updated.is_empty() {
            return Err(StorageError::ProjectNotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_deployment(&self, name: &str, at: DateTime<Utc>) -> StorageResult<()> {
        let mut result = self
            .db
            .query("UPDATE repositories SET last_deployed_at = $at WHERE name = $name RETURN AFTER")
            .bind(("at", SurrealDatetime::from(at)))
            .bind(("name", name.to_string()))
            .await?;
        let updated: Vec<DbProject> = result.take(0)?;
        if updated.is_empty() {
            return Err(StorageError::ProjectNotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
