//! Batch coordination: one sequential pass over all declared projects.
//!
//! Two modes share the same eligibility check:
//!
//! - **report**: list the projects that are due, touching nothing.
//! - **deploy**: run the pipeline for every due project, consume its signal,
//!   and send a single notification naming the deployed projects.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::context::DeployContext;
use crate::domain::{DeclarationError, DeployEvent, PipelineReport, ProjectDeclaration};
use crate::eligibility::EligibilitySource;
use crate::notify::Notifier;
use crate::pipeline::PipelineExecutor;
use crate::policy::StepPolicy;
use crate::source::Declared;

/// A project that was not evaluated, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectError {
    pub name: String,
    pub reason: String,
}

/// Output of report mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReport {
    /// Due projects, in declaration order.
    pub eligible: Vec<String>,
    pub errors: Vec<ProjectError>,
}

/// Output of deploy mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: Uuid,

    /// Projects whose pipeline passed, in execution order.
    pub deployed: Vec<String>,

    /// Projects whose pipeline ran and failed.
    pub failed: Vec<String>,

    /// Declarations or signals that could not be evaluated.
    pub errors: Vec<ProjectError>,

    /// Whether the batch notification was delivered.
    pub notified: bool,

    pub reports: Vec<PipelineReport>,
}

/// Notification text for a batch, or `None` when nothing was deployed.
pub fn notification_text(deployed: &[String]) -> Option<String> {
    if deployed.is_empty() {
        return None;
    }
    Some(format!(
        "The following project(s) have been deployed: {}",
        deployed.join(", ")
    ))
}

/// Drives one batch over the declared projects.
pub struct BatchCoordinator {
    ctx: DeployContext,
    signal: Arc<dyn EligibilitySource>,
    notifier: Arc<dyn Notifier>,
}

impl BatchCoordinator {
    pub fn new(
        ctx: DeployContext,
        signal: Arc<dyn EligibilitySource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ctx,
            signal,
            notifier,
        }
    }

    /// Report mode. Checks every signal, mutates none.
    pub async fn report(&self, declared: Vec<Declared>) -> PendingReport {
        let mut report = PendingReport::default();
        let mut seen = HashSet::new();

        for entry in declared {
            let Some(project) = self.admit(entry, &mut seen, &mut report.errors) else {
                continue;
            };
            match self.signal.is_eligible(&project).await {
                Ok(true) => report.eligible.push(project.name),
                Ok(false) => {}
                Err(e) => self.signal_error(&project.name, e.to_string(), &mut report.errors),
            }
        }

        info!(eligible = report.eligible.len(), "Pending deployment check finished");
        report
    }

    /// Deploy mode. Strictly sequential; one project's failure never stops
    /// the batch.
    pub async fn deploy(&self, declared: Vec<Declared>) -> BatchResult {
        let batch_id = Uuid::new_v4();
        let span = info_span!("autodeploy.batch", batch_id = %batch_id);
        self.deploy_batch(batch_id, declared).instrument(span).await
    }

    async fn deploy_batch(&self, batch_id: Uuid, declared: Vec<Declared>) -> BatchResult {
        let mut result = BatchResult {
            batch_id,
            deployed: Vec::new(),
            failed: Vec::new(),
            errors: Vec::new(),
            notified: false,
            reports: Vec::new(),
        };
        let mut seen = HashSet::new();
        let executor = PipelineExecutor::new(&self.ctx);

        for entry in declared {
            let Some(project) = self.admit(entry, &mut seen, &mut result.errors) else {
                continue;
            };
            match self.signal.is_eligible(&project).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    self.signal_error(&project.name, e.to_string(), &mut result.errors);
                    continue;
                }
            }

            let span = info_span!("autodeploy.project", project = %project.name);
            let report = async {
                let policy = StepPolicy::resolve(&project, self.ctx.sink.as_ref());
                executor.execute(&project, &policy).await
            }
            .instrument(span)
            .await;

            match self.signal.consume(&project, report.deployed).await {
                Ok(()) => self.ctx.sink.record(&DeployEvent::SignalConsumed {
                    project: project.name.clone(),
                    backend: self.signal.backend().name().to_string(),
                }),
                Err(e) => self.ctx.sink.record(&DeployEvent::SignalError {
                    project: project.name.clone(),
                    message: format!("failed to clear eligibility signal: {e}"),
                }),
            }

            if report.deployed {
                result.deployed.push(project.name.clone());
            } else {
                result.failed.push(project.name.clone());
            }
            result.reports.push(report);
        }

        self.ctx.sink.record(&DeployEvent::BatchFinished {
            deployed: result.deployed.clone(),
            failed: result.failed.clone(),
        });

        if let Some(text) = notification_text(&result.deployed) {
            match self.notifier.notify(&text).await {
                Ok(()) => result.notified = true,
                Err(e) => self.ctx.sink.record(&DeployEvent::NotificationFailed {
                    message: e.to_string(),
                }),
            }
        }

        result
    }

    /// Unwrap a declaration, rejecting invalid and repeated ones.
    fn admit(
        &self,
        entry: Declared,
        seen: &mut HashSet<String>,
        errors: &mut Vec<ProjectError>,
    ) -> Option<ProjectDeclaration> {
        let err = match entry {
            Ok(project) if seen.insert(project.name.clone()) => return Some(project),
            Ok(project) => DeclarationError::DuplicateProject { name: project.name },
            Err(e) => e,
        };
        self.ctx.sink.record(&DeployEvent::DeclarationInvalid {
            project: err.project().to_string(),
            message: err.to_string(),
        });
        errors.push(ProjectError {
            name: err.project().to_string(),
            reason: err.to_string(),
        });
        None
    }

    fn signal_error(&self, name: &str, message: String, errors: &mut Vec<ProjectError>) {
        self.ctx.sink.record(&DeployEvent::SignalError {
            project: name.to_string(),
            message: message.clone(),
        });
        errors.push(ProjectError {
            name: name.to_string(),
            reason: message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text() {
        assert_eq!(notification_text(&[]), None);
        assert_eq!(
            notification_text(&["A".to_string(), "B".to_string()]).as_deref(),
            Some("The following project(s) have been deployed: A, B")
        );
    }
}
