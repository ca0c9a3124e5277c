//! Project declarations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a project is turned into runnable artifacts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    /// Built and published before it runs (.NET projects).
    Compiled,

    /// Runs from source; may still carry a dependency manifest.
    Interpreted,

    /// Nothing declared; treated like an interpreted project.
    Undeclared,
}

impl RuntimeKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeKind::Compiled => "compiled",
            RuntimeKind::Interpreted => "interpreted",
            RuntimeKind::Undeclared => "undeclared",
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, RuntimeKind::Compiled)
    }

    /// Parse a declared language token. Blank or absent means `Undeclared`.
    ///
    /// Returns the offending token when it is not recognized.
    pub fn from_language(token: Option<&str>) -> std::result::Result<Self, String> {
        let token = match token.map(str::trim) {
            None | Some("") => return Ok(RuntimeKind::Undeclared),
            Some(t) => t,
        };
        match token.to_ascii_lowercase().as_str() {
            "compiled" | "dotnet" | ".net" | "csharp" | "c#" | "vb" | "vbnet" | "vb.net" => {
                Ok(RuntimeKind::Compiled)
            }
            "interpreted" | "python" => Ok(RuntimeKind::Interpreted),
            _ => Err(token.to_string()),
        }
    }

    /// Project file extension implied by a declared language token.
    pub fn language_extension(token: Option<&str>) -> Option<&'static str> {
        match token?.trim().to_ascii_lowercase().as_str() {
            "compiled" | "dotnet" | ".net" | "csharp" | "c#" => Some(".csproj"),
            "vb" | "vbnet" | "vb.net" => Some(".vbproj"),
            "python" => Some(".pyproj"),
            _ => None,
        }
    }

    /// Classify a project file by extension.
    pub fn from_project_file(path: &Path) -> std::result::Result<Self, String> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csproj" | "vbproj" => Ok(RuntimeKind::Compiled),
            "pyproj" => Ok(RuntimeKind::Interpreted),
            "" => Ok(RuntimeKind::Undeclared),
            other => Err(format!(".{other}")),
        }
    }
}

/// Immutable per-project configuration, resolved once at batch start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeclaration {
    /// Unique key within a run.
    pub name: String,

    /// Working directory for every step.
    pub source_directory: PathBuf,

    /// Project file inside `source_directory`, when one was declared.
    pub project_file: Option<PathBuf>,

    /// Branch pulled on each deployment.
    pub branch: String,

    pub runtime: RuntimeKind,

    /// Publish output directory.
    pub publish_target: Option<PathBuf>,

    /// Executable run after a successful deployment.
    pub post_deploy_hook: Option<PathBuf>,

    /// Only consulted by the marker-file eligibility backend.
    pub active: bool,

    /// Ordering group carried from the project source.
    pub deployment_group: i64,
}

impl ProjectDeclaration {
    pub fn new(
        name: impl Into<String>,
        source_directory: impl Into<PathBuf>,
        branch: impl Into<String>,
        runtime: RuntimeKind,
    ) -> Self {
        Self {
            name: name.into(),
            source_directory: source_directory.into(),
            project_file: None,
            branch: branch.into(),
            runtime,
            publish_target: None,
            post_deploy_hook: None,
            active: true,
            deployment_group: 0,
        }
    }

    pub fn with_project_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_file = Some(path.into());
        self
    }

    pub fn with_publish_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.publish_target = Some(path.into());
        self
    }

    pub fn with_post_deploy_hook(mut self, path: impl Into<PathBuf>) -> Self {
        self.post_deploy_hook = Some(path.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn in_group(mut self, group: i64) -> Self {
        self.deployment_group = group;
        self
    }

    /// File name handed to the publish command: the declared project file,
    /// `<name>.csproj` for a compiled project without one, otherwise the
    /// project name.
    pub fn project_file_name(&self) -> String {
        match self.project_file.as_deref().and_then(Path::file_name) {
            Some(file) => file.to_string_lossy().into_owned(),
            None if self.runtime.is_compiled() => format!("{}.csproj", self.name),
            None => self.name.clone(),
        }
    }
}

/// Treat blank strings as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
