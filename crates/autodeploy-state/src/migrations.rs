//! SurrealDB schema initialization
//!
//! Sets up the `repositories` table with its indexes. Safe to call on every
//! connection (idempotent).

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Initialize all autodeploy tables in SurrealDB
pub async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    info!("Initializing autodeploy SurrealDB schema");
    init_repositories_table(db).await?;
    info!("autodeploy schema initialization complete");
    Ok(())
}

/// Initialize `repositories` table with constraints and indexes
///
/// Schema:
/// ```text
/// TABLE repositories {
///   name:              STRING (unique)
///   project_path:      STRING
///   branch:            STRING
///   publish_path:      STRING?
///   post_deploy_path:  STRING?
///   automated:         BOOL
///   queued:            BOOL (indexed)
///   deployment_group:  INT (indexed)
///   last_deployed_at:  DATETIME?
/// }
/// ```
async fn init_repositories_table(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing repositories table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS repositories SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS name ON repositories TYPE string;
        DEFINE FIELD IF NOT EXISTS project_path ON repositories TYPE string;
        DEFINE FIELD IF NOT EXISTS branch ON repositories TYPE string;
        DEFINE FIELD IF NOT EXISTS publish_path ON repositories TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS post_deploy_path ON repositories TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS automated ON repositories TYPE bool DEFAULT true;
        DEFINE FIELD IF NOT EXISTS queued ON repositories TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS deployment_group ON repositories TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS last_deployed_at ON repositories TYPE option<datetime>;

        DEFINE INDEX IF NOT EXISTS idx_repository_name ON TABLE repositories COLUMNS name UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_repository_queued ON TABLE repositories COLUMNS queued;
        DEFINE INDEX IF NOT EXISTS idx_repository_group ON TABLE repositories COLUMNS deployment_group;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?
        .check()
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;

    debug!("repositories table ready");
    Ok(())
}
