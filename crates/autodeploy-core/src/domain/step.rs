//! Pipeline steps and their outcomes.

use serde::{Deserialize, Serialize};

/// The fixed deployment step sequence, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Fetch the tracked branch.
    Pull,

    /// Compile in release configuration.
    Build,

    /// Copy build output to the publish target without rebuilding.
    Publish,

    /// Install from the dependency manifest, when one exists.
    InstallDependencies,

    /// Run the declared post-deploy executable.
    PostDeploy,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Pull,
        Step::Build,
        Step::Publish,
        Step::InstallDependencies,
        Step::PostDeploy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Pull => "pull",
            Step::Build => "build",
            Step::Publish => "publish",
            Step::InstallDependencies => "install_dependencies",
            Step::PostDeploy => "post_deploy",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one step for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Skipped by policy; counts as a pass.
    NotApplicable,
    Succeeded,
    Failed { reason: String },
}

impl StepOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        StepOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// Everything the executor did for one project.
///
/// `steps` holds only the steps that were reached, in order; a step cut off
/// by an earlier failure does not appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub project: String,
    pub steps: Vec<(Step, StepOutcome)>,
    pub deployed: bool,
}

impl PipelineReport {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            steps: Vec::new(),
            deployed: false,
        }
    }

    pub fn push(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push((step, outcome));
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    /// Whether the step actually ran a command (succeeded or failed).
    pub fn attempted(&self, step: Step) -> bool {
        matches!(
            self.outcome(step),
            Some(StepOutcome::Succeeded) | Some(StepOutcome::Failed { .. })
        )
    }

    /// First step that failed, if any.
    pub fn failed_step(&self) -> Option<Step> {
        self.steps
            .iter()
            .find(|(_, o)| o.is_failure())
            .map(|(s, _)| *s)
    }
}
