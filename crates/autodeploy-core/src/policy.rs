//! Step policy: which optional steps apply to a project.

use std::path::PathBuf;

use crate::domain::{DeployEvent, ProjectDeclaration, RuntimeKind};
use crate::obs::EventSink;

/// Optional steps resolved from a declaration and the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPolicy {
    pub runtime: RuntimeKind,

    /// Build (and maybe publish) the project.
    pub buildable: bool,

    /// Validated publish target; only set when `buildable`.
    pub publish_target: Option<PathBuf>,

    /// The declared hook exists on disk.
    pub has_post_deploy: bool,
}

impl StepPolicy {
    /// Resolve the policy for `project`.
    ///
    /// Only compiled projects build. A declared publish target that does not
    /// exist as a directory is a policy violation: it is reported to `sink`
    /// and turns build and publish off, but the pipeline still runs.
    pub fn resolve(project: &ProjectDeclaration, sink: &dyn EventSink) -> Self {
        let mut buildable = project.runtime.is_compiled();
        let mut publish_target = None;

        if buildable {
            if let Some(target) = &project.publish_target {
                if target.is_dir() {
                    publish_target = Some(target.clone());
                } else {
                    sink.record(&DeployEvent::PolicyViolation {
                        project: project.name.clone(),
                        message: format!(
                            "Project '{}' has an invalid publish directory '{}'",
                            project.name,
                            target.display()
                        ),
                    });
                    buildable = false;
                }
            }
        }

        let has_post_deploy = project
            .post_deploy_hook
            .as_deref()
            .is_some_and(|hook| hook.is_file());

        Self {
            runtime: project.runtime,
            buildable,
            publish_target,
            has_post_deploy,
        }
    }

    pub fn should_publish(&self) -> bool {
        self.buildable && self.publish_target.is_some()
    }
}
