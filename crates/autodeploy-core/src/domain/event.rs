//! Structured deployment events handed to the event sink.

use serde::{Deserialize, Serialize};

use super::step::Step;

/// Severity of a deployment event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// One observable thing that happened during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeployEvent {
    PipelineStarted {
        project: String,
    },
    StepFailed {
        project: String,
        step: Step,
        reason: String,
    },
    PolicyViolation {
        project: String,
        message: String,
    },
    DeclarationInvalid {
        project: String,
        message: String,
    },
    PipelineFinished {
        project: String,
        deployed: bool,
    },
    SignalConsumed {
        project: String,
        backend: String,
    },
    SignalError {
        project: String,
        message: String,
    },
    BatchFinished {
        deployed: Vec<String>,
        failed: Vec<String>,
    },
    NotificationFailed {
        message: String,
    },
}

impl DeployEvent {
    /// Dotted event name used as the `event` field in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DeployEvent::PipelineStarted { .. } => "pipeline.started",
            DeployEvent::StepFailed { .. } => "pipeline.step_failed",
            DeployEvent::PolicyViolation { .. } => "policy.violation",
            DeployEvent::DeclarationInvalid { .. } => "declaration.invalid",
            DeployEvent::PipelineFinished { .. } => "pipeline.finished",
            DeployEvent::SignalConsumed { .. } => "signal.consumed",
            DeployEvent::SignalError { .. } => "signal.error",
            DeployEvent::BatchFinished { .. } => "batch.finished",
            DeployEvent::NotificationFailed { .. } => "notify.failed",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DeployEvent::PipelineStarted { .. }
            | DeployEvent::SignalConsumed { .. }
            | DeployEvent::BatchFinished { .. } => Severity::Info,
            DeployEvent::PipelineFinished { deployed, .. } => {
                if *deployed {
                    Severity::Info
                } else {
                    Severity::Warning
                }
            }
            DeployEvent::NotificationFailed { .. } => Severity::Warning,
            DeployEvent::StepFailed { .. }
            | DeployEvent::PolicyViolation { .. }
            | DeployEvent::SignalError { .. } => Severity::Error,
            DeployEvent::DeclarationInvalid { .. } => Severity::Critical,
        }
    }

    /// Project the event belongs to, if it is project-scoped.
    pub fn project(&self) -> Option<&str> {
        match self {
            DeployEvent::PipelineStarted { project }
            | DeployEvent::StepFailed { project, .. }
            | DeployEvent::PolicyViolation { project, .. }
            | DeployEvent::DeclarationInvalid { project, .. }
            | DeployEvent::PipelineFinished { project, .. }
            | DeployEvent::SignalConsumed { project, .. }
            | DeployEvent::SignalError { project, .. } => Some(project),
            DeployEvent::BatchFinished { .. } | DeployEvent::NotificationFailed { .. } => None,
        }
    }
}
