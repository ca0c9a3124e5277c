//! Eligibility gate: is a project due for deployment right now?
//!
//! The declaration says *what* to deploy; the signal says *when*. Two
//! interchangeable backends exist and one is chosen per invocation:
//!
//! - [`MarkerFileSignal`]: an `active` project is due while a marker file
//!   sits in its source directory.
//! - [`QueuedFlagSignal`]: a project is due while its `queued` flag is set
//!   in the deployment queue store.
//!
//! After the pipeline has run for an eligible project the signal is consumed
//! exactly once, whatever the outcome, so a failing project is reported
//! through the logs instead of retried on every run.

use async_trait::async_trait;
use autodeploy_state::ProjectStore;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::EligibilityBackend;
use crate::domain::{ProjectDeclaration, Result};

#[async_trait]
pub trait EligibilitySource: Send + Sync {
    fn backend(&self) -> EligibilityBackend;

    /// Check the signal. Must not mutate it.
    async fn is_eligible(&self, project: &ProjectDeclaration) -> Result<bool>;

    /// Clear the signal after the pipeline ran. `deployed` is the outcome.
    async fn consume(&self, project: &ProjectDeclaration, deployed: bool) -> Result<()>;
}

/// Marker-file backend.
#[derive(Debug, Clone)]
pub struct MarkerFileSignal {
    marker_name: String,
}

impl MarkerFileSignal {
    pub fn new(marker_name: impl Into<String>) -> Self {
        Self {
            marker_name: marker_name.into(),
        }
    }

    pub fn marker_path(&self, project: &ProjectDeclaration) -> PathBuf {
        project.source_directory.join(&self.marker_name)
    }
}

impl Default for MarkerFileSignal {
    fn default() -> Self {
        Self::new("deploy.txt")
    }
}

#[async_trait]
impl EligibilitySource for MarkerFileSignal {
    fn backend(&self) -> EligibilityBackend {
        EligibilityBackend::MarkerFile
    }

    async fn is_eligible(&self, project: &ProjectDeclaration) -> Result<bool> {
        if !project.active {
            return Ok(false);
        }
        Ok(tokio::fs::try_exists(self.marker_path(project)).await?)
    }

    async fn consume(&self, project: &ProjectDeclaration, _deployed: bool) -> Result<()> {
        match tokio::fs::remove_file(self.marker_path(project)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Queued-flag backend.
///
/// Consuming clears the flag; a successful deployment also records its time.
#[derive(Clone)]
pub struct QueuedFlagSignal {
    store: Arc<dyn ProjectStore>,
}

impl QueuedFlagSignal {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EligibilitySource for QueuedFlagSignal {
    fn backend(&self) -> EligibilityBackend {
        EligibilityBackend::QueuedFlag
    }

    async fn is_eligible(&self, project: &ProjectDeclaration) -> Result<bool> {
        Ok(self.store.is_queued(&project.name).await?)
    }

    async fn consume(&self, project: &ProjectDeclaration, deployed: bool) -> Result<()> {
        self.store.set_queued(&project.name, false).await?;
        if deployed {
            self.store
                .record_deployment(&project.name, Utc::now())
                .await?;
        }
        Ok(())
    }
}
