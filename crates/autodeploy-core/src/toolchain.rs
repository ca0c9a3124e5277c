//! Command templates for the external-process steps.

use serde::{Deserialize, Serialize};

use crate::domain::{DeployError, ProjectDeclaration, Result, Step};
use crate::process::CommandSpec;

/// Argument-vector templates for each external-process step.
///
/// Every element may contain the placeholders `{name}`, `{branch}`,
/// `{project_file}`, `{publish_target}` and `{manifest}`. No shell is
/// involved; each element becomes exactly one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    /// git pull origin {branch}
    pub pull: Vec<String>,

    /// dotnet build -c Release
    pub build: Vec<String>,

    /// dotnet publish {project_file} -c Release --no-build -o {publish_target}
    pub publish: Vec<String>,

    /// pip install -r {manifest}
    pub install: Vec<String>,

    /// Dependency manifest looked up in the source directory.
    pub dependency_manifest: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            pull: strings(&["git", "pull", "origin", "{branch}"]),
            build: strings(&["dotnet", "build", "-c", "Release"]),
            publish: strings(&[
                "dotnet",
                "publish",
                "{project_file}",
                "-c",
                "Release",
                "--no-build",
                "-o",
                "{publish_target}",
            ]),
            install: strings(&["pip", "install", "-r", "{manifest}"]),
            dependency_manifest: "requirements.txt".to_string(),
        }
    }
}

impl Toolchain {
    /// Template for a step. The post-deploy hook has none: it runs the
    /// declared executable directly.
    pub fn template(&self, step: Step) -> Option<&[String]> {
        match step {
            Step::Pull => Some(&self.pull),
            Step::Build => Some(&self.build),
            Step::Publish => Some(&self.publish),
            Step::InstallDependencies => Some(&self.install),
            Step::PostDeploy => None,
        }
    }

    /// Render the command for `step`, run from the project's source directory.
    pub fn render(&self, step: Step, project: &ProjectDeclaration) -> Result<CommandSpec> {
        let template = self.template(step).unwrap_or_default();
        let (program, args) = template.split_first().ok_or_else(|| {
            DeployError::Config(format!("no command configured for step '{}'", step))
        })?;

        let vars = Vars {
            name: &project.name,
            branch: &project.branch,
            project_file: project.project_file_name(),
            publish_target: project
                .publish_target
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            manifest: &self.dependency_manifest,
        };

        Ok(CommandSpec::new(vars.substitute(program))
            .args(args.iter().map(|a| vars.substitute(a)))
            .current_dir(&project.source_directory))
    }
}

struct Vars<'a> {
    name: &'a str,
    branch: &'a str,
    project_file: String,
    publish_target: String,
    manifest: &'a str,
}

impl Vars<'_> {
    fn substitute(&self, template: &str) -> String {
        template
            .replace("{name}", self.name)
            .replace("{branch}", self.branch)
            .replace("{project_file}", &self.project_file)
            .replace("{publish_target}", &self.publish_target)
            .replace("{manifest}", self.manifest)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
