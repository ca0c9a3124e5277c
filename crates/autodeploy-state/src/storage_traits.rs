//! Storage trait definitions for the deployment queue.
//!
//! `ProjectStore` is the only abstraction: a table of project rows, each
//! carrying a `queued` flag. All methods are async and backend-agnostic.
//! An in-memory fake is provided for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// One row of the `repositories` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Unique project name
    pub name: String,
    /// Project file or directory the project is built from
    pub project_path: String,
    /// Branch pulled on each deployment
    pub branch: String,
    /// Publish output directory, if the project publishes artifacts
    pub publish_path: Option<String>,
    /// Executable run after a successful deployment
    pub post_deploy_path: Option<String>,
    /// Whether the project takes part in automated deployment at all
    pub automated: bool,
    /// Whether the project is due for deployment
    pub queued: bool,
    /// Ordering group; lower groups deploy first
    pub deployment_group: i64,
    /// When the project last deployed successfully
    pub last_deployed_at: Option<DateTime<Utc>>,
}

impl ProjectRecord {
    /// A minimal automated, unqueued record.
    pub fn new(
        name: impl Into<String>,
        project_path: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            project_path: project_path.into(),
            branch: branch.into(),
            publish_path: None,
            post_deploy_path: None,
            automated: true,
            queued: false,
            deployment_group: 0,
            last_deployed_at: None,
        }
    }

    pub fn queued(mut self, queued: bool) -> Self {
        self.queued = queued;
        self
    }

    pub fn in_group(mut self, group: i64) -> Self {
        self.deployment_group = group;
        self
    }

    pub fn with_publish_path(mut self, path: impl Into<String>) -> Self {
        self.publish_path = Some(path.into());
        self
    }

    pub fn with_post_deploy(mut self, path: impl Into<String>) -> Self {
        self.post_deploy_path = Some(path.into());
        self
    }

    pub fn manual(mut self) -> Self {
        self.automated = false;
        self
    }
}

/// Deployment queue store.
///
/// Guarantees:
/// - `list_automated` returns only rows with `automated == true`, ordered by
///   `deployment_group` then `name`.
/// - Flag and timestamp updates on an unknown name fail with
///   `StorageError::ProjectNotFound`.
/// - `upsert` replaces the row with the same name.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert or replace a project row.
    async fn upsert(&self, record: ProjectRecord) -> StorageResult<()>;

    /// All automated projects in deployment order.
    async fn list_automated(&self) -> StorageResult<Vec<ProjectRecord>>;

    /// Current value of the `queued` flag.
    async fn is_queued(&self, name: &str) -> StorageResult<bool>;

    /// Set or clear the `queued` flag.
    async fn set_queued(&self, name: &str, queued: bool) -> StorageResult<()>;

    /// Record a successful deployment time.
    async fn record_deployment(&self, name: &str, at: DateTime<Utc>) -> StorageResult<()>;
}

/// Sort rows into deployment order.
pub fn deployment_order(records: &mut [ProjectRecord]) {
    records.sort_by(|a, b| {
        a.deployment_group
            .cmp(&b.deployment_group)
            .then_with(|| a.name.cmp(&b.name))
    });
}
