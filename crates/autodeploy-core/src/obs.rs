//! Structured observability for deployment events.
//!
//! The engine reports through the [`EventSink`] trait and never waits on it.
//! [`TracingSink`] turns each event into one `tracing` record carrying an
//! `event = "<dotted.name>"` field, at the level given by its severity.
//! Critical events are logged at `error!` with `critical = true`.

use tracing::{error, info, warn};

use crate::domain::DeployEvent;

/// Fire-and-forget receiver of deployment events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &DeployEvent);
}

/// Emits every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &DeployEvent) {
        let name = event.name();
        match event {
            DeployEvent::PipelineStarted { project } => {
                info!(event = name, project = %project, "Deploying project '{}'", project);
            }
            DeployEvent::StepFailed {
                project,
                step,
                reason,
            } => {
                error!(
                    event = name,
                    project = %project,
                    step = %step,
                    reason = %reason,
                    "Step '{}' failed for project '{}'",
                    step,
                    project
                );
            }
            DeployEvent::PolicyViolation { project, message } => {
                error!(event = name, project = %project, "{}", message);
            }
            DeployEvent::DeclarationInvalid { project, message } => {
                error!(event = name, critical = true, project = %project, "{}", message);
            }
            DeployEvent::PipelineFinished { project, deployed } => {
                if *deployed {
                    info!(event = name, project = %project, deployed, "Project '{}' deployment succeeded", project);
                } else {
                    warn!(event = name, project = %project, deployed, "Project '{}' deployment failed", project);
                }
            }
            DeployEvent::SignalConsumed { project, backend } => {
                info!(event = name, project = %project, backend = %backend, "Eligibility signal consumed");
            }
            DeployEvent::SignalError { project, message } => {
                error!(event = name, project = %project, "{}", message);
            }
            DeployEvent::BatchFinished { deployed, failed } => {
                info!(
                    event = name,
                    deployed = deployed.len(),
                    failed = failed.len(),
                    "Batch finished"
                );
            }
            DeployEvent::NotificationFailed { message } => {
                warn!(event = name, "Notification failed: {}", message);
            }
        }
    }
}
