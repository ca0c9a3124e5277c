//! Per-project step sequence with short-circuit semantics.

use tracing::{debug, info};

use crate::config::HookWorkingDir;
use crate::context::DeployContext;
use crate::domain::{DeployEvent, PipelineReport, ProjectDeclaration, Step, StepOutcome};
use crate::policy::StepPolicy;
use crate::process::CommandSpec;

/// Runs the fixed step order for one project.
///
/// Pull gates everything. Build gates publish. Dependency install runs
/// whenever the pull succeeded; the post-deploy hook only runs when every
/// earlier step passed. Each step is attempted at most once.
pub struct PipelineExecutor<'a> {
    ctx: &'a DeployContext,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(ctx: &'a DeployContext) -> Self {
        Self { ctx }
    }

    /// Execute the pipeline. Never fails: every problem ends up as a failed
    /// step in the returned report.
    pub async fn execute(
        &self,
        project: &ProjectDeclaration,
        policy: &StepPolicy,
    ) -> PipelineReport {
        let mut report = PipelineReport::new(&project.name);
        self.ctx.sink.record(&DeployEvent::PipelineStarted {
            project: project.name.clone(),
        });

        if !project.source_directory.is_dir() {
            let reason = format!(
                "source directory '{}' does not exist",
                project.source_directory.display()
            );
            self.fail(project, &mut report, Step::Pull, reason);
            return self.finish(project, report);
        }

        if !self.run_step(project, &mut report, Step::Pull).await {
            return self.finish(project, report);
        }

        let mut deployed = true;

        if policy.buildable {
            deployed = self.run_step(project, &mut report, Step::Build).await;
            // a failed build cuts publish off; it stays out of the report
            if deployed {
                if policy.should_publish() {
                    deployed = self.run_step(project, &mut report, Step::Publish).await;
                } else {
                    report.push(Step::Publish, StepOutcome::NotApplicable);
                }
            }
        } else {
            report.push(Step::Build, StepOutcome::NotApplicable);
            report.push(Step::Publish, StepOutcome::NotApplicable);
        }

        let manifest = project
            .source_directory
            .join(&self.ctx.toolchain.dependency_manifest);
        if manifest.is_file() {
            if !self
                .run_step(project, &mut report, Step::InstallDependencies)
                .await
            {
                deployed = false;
            }
        } else {
            debug!(project = %project.name, manifest = %manifest.display(), "No dependency manifest");
            report.push(Step::InstallDependencies, StepOutcome::NotApplicable);
        }

        if deployed && policy.has_post_deploy {
            deployed = self.run_hook(project, &mut report).await;
        } else if deployed {
            report.push(Step::PostDeploy, StepOutcome::NotApplicable);
        }

        report.deployed = deployed;
        self.finish(project, report)
    }

    async fn run_step(
        &self,
        project: &ProjectDeclaration,
        report: &mut PipelineReport,
        step: Step,
    ) -> bool {
        match self.ctx.toolchain.render(step, project) {
            Ok(cmd) => self.run_command(project, report, step, cmd).await,
            Err(e) => {
                self.fail(project, report, step, e.to_string());
                false
            }
        }
    }

    async fn run_hook(&self, project: &ProjectDeclaration, report: &mut PipelineReport) -> bool {
        let Some(hook) = project.post_deploy_hook.as_ref() else {
            report.push(Step::PostDeploy, StepOutcome::NotApplicable);
            return true;
        };
        let mut cmd = CommandSpec::new(hook.display().to_string());
        if self.ctx.hook_dir == HookWorkingDir::Project {
            cmd = cmd.current_dir(&project.source_directory);
        }
        self.run_command(project, report, Step::PostDeploy, cmd).await
    }

    async fn run_command(
        &self,
        project: &ProjectDeclaration,
        report: &mut PipelineReport,
        step: Step,
        cmd: CommandSpec,
    ) -> bool {
        let cmd = cmd.timeout(self.ctx.process_timeout);
        info!(project = %project.name, step = %step, command = %cmd.command_line(), "Running step");

        let outcome = self.ctx.runner.run(&cmd).await;
        if outcome.success() {
            report.push(step, StepOutcome::Succeeded);
            true
        } else {
            self.fail(project, report, step, outcome.describe());
            false
        }
    }

    fn fail(
        &self,
        project: &ProjectDeclaration,
        report: &mut PipelineReport,
        step: Step,
        reason: String,
    ) {
        self.ctx.sink.record(&DeployEvent::StepFailed {
            project: project.name.clone(),
            step,
            reason: reason.clone(),
        });
        report.push(step, StepOutcome::failed(reason));
    }

    fn finish(&self, project: &ProjectDeclaration, report: PipelineReport) -> PipelineReport {
        self.ctx.sink.record(&DeployEvent::PipelineFinished {
            project: project.name.clone(),
            deployed: report.deployed,
        });
        report
    }
}
