//! Autodeploy-State: persistence for the queued-flag deployment backend.
//!
//! Projects live in a `repositories` table. Each row declares where the
//! project sits on disk, which branch is tracked, and two pieces of mutable
//! state: the `queued` flag that marks it due for deployment and the
//! timestamp of its last successful deployment.
//!
//! ## Key Components
//!
//! - `ProjectStore`: backend-agnostic trait consumed by `autodeploy-core`
//! - `SurrealProjectStore`: SurrealDB implementation (remote or `mem://`)
//! - `fakes::MemoryProjectStore`: in-memory implementation for tests

mod error;
pub mod fakes;
mod migrations;
pub mod storage_traits;
pub mod surreal_store;

pub use error::StorageError;
pub use storage_traits::{ProjectRecord, ProjectStore, StorageResult};
pub use surreal_store::{ConnectionConfig, SurrealProjectStore};
