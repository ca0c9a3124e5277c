//! Settings document.
//!
//! One JSON file drives a deployment host: which eligibility backend is in
//! use, the project declarations (marker-file backend), toolchain command
//! templates, hook and timeout behavior, report output and notification.
//! Every section is optional except where the selected backend needs it.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::project::non_blank;
use crate::domain::{DeclarationError, DeployError, ProjectDeclaration, Result, RuntimeKind};
use crate::toolchain::Toolchain;

/// Which mechanism marks a project as due. Exactly one per invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityBackend {
    /// `active` projects with a marker file in their source directory.
    #[default]
    MarkerFile,

    /// Rows with `queued = true` in the deployment queue database.
    QueuedFlag,
}

impl EligibilityBackend {
    pub fn name(&self) -> &'static str {
        match self {
            EligibilityBackend::MarkerFile => "marker_file",
            EligibilityBackend::QueuedFlag => "queued_flag",
        }
    }
}

/// Working directory for the post-deploy hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookWorkingDir {
    /// The project's source directory.
    #[default]
    Project,

    /// Whatever directory autodeploy itself runs in.
    Inherit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSettings {
    pub working_directory: HookWorkingDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory the pending-deployment report is written to.
    pub output_dir: PathBuf,

    /// Open the report with the platform opener after writing it.
    pub open: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            open: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramSettings {
    pub chat_id: String,

    /// Override for the Bot API base URL.
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub telegram: Option<TelegramSettings>,
}

/// One entry of the `projects` map, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProjectEntry {
    pub active: Option<bool>,
    pub directory: Option<String>,
    pub branch: Option<String>,
    pub language: Option<String>,
    pub publish_location: Option<String>,
    pub post_deploy_batch_file: Option<String>,
    pub deployment_group: Option<i64>,
}

impl RawProjectEntry {
    /// Validate into a declaration, naming the first missing field.
    pub fn validate(&self, name: &str) -> std::result::Result<ProjectDeclaration, DeclarationError> {
        let missing = |field: &'static str| DeclarationError::MissingField {
            project: name.to_string(),
            field,
        };

        let active = self.active.ok_or_else(|| missing("active"))?;
        let directory = non_blank(self.directory.clone()).ok_or_else(|| missing("directory"))?;
        let branch = non_blank(self.branch.clone()).ok_or_else(|| missing("branch"))?;
        let runtime = RuntimeKind::from_language(self.language.as_deref()).map_err(|value| {
            DeclarationError::UnrecognizedRuntime {
                project: name.to_string(),
                value,
            }
        })?;

        let project_file = RuntimeKind::language_extension(self.language.as_deref())
            .map(|ext| PathBuf::from(&directory).join(format!("{name}{ext}")));
        let mut decl = ProjectDeclaration::new(name, directory, branch.trim(), runtime)
            .in_group(self.deployment_group.unwrap_or_default());
        decl.project_file = project_file;
        decl.active = active;
        decl.publish_target = non_blank(self.publish_location.clone()).map(PathBuf::from);
        decl.post_deploy_hook = non_blank(self.post_deploy_batch_file.clone()).map(PathBuf::from);
        Ok(decl)
    }
}

/// The `projects` map in document order. Repeated names are kept so the
/// batch can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectEntries(pub Vec<(String, RawProjectEntry)>);

impl ProjectEntries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, RawProjectEntry)> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for ProjectEntries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = ProjectEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of project name to project settings")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, entry)) = map.next_entry::<String, RawProjectEntry>()? {
                    entries.push((name, entry));
                }
                Ok(ProjectEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Serialize for ProjectEntries {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

/// Top-level settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub eligibility: EligibilityBackend,

    /// Marker file name looked up in each source directory.
    pub marker_file: String,

    pub projects: ProjectEntries,

    pub toolchain: Toolchain,

    pub hooks: HookSettings,

    /// Per-process timeout in seconds; `0` disables it.
    pub process_timeout_secs: u64,

    pub report: ReportSettings,

    pub notify: NotifySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            eligibility: EligibilityBackend::default(),
            marker_file: "deploy.txt".to_string(),
            projects: ProjectEntries::default(),
            toolchain: Toolchain::default(),
            hooks: HookSettings::default(),
            process_timeout_secs: 3600,
            report: ReportSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl AppConfig {
    /// Read and parse the settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
            .map_err(|e| DeployError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Document-level checks; per-project problems are left to validation.
    fn check(&self) -> Result<()> {
        if self.marker_file.trim().is_empty() {
            return Err(DeployError::Config("marker_file must not be empty".to_string()));
        }
        if self.eligibility == EligibilityBackend::MarkerFile && self.projects.is_empty() {
            return Err(DeployError::Config(
                "marker_file eligibility requires a non-empty 'projects' map".to_string(),
            ));
        }
        Ok(())
    }

    pub fn process_timeout(&self) -> Option<Duration> {
        (self.process_timeout_secs > 0).then(|| Duration::from_secs(self.process_timeout_secs))
    }
}
