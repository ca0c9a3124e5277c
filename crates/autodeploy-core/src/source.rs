//! Project sources: where declarations come from.

use async_trait::async_trait;
use autodeploy_state::{ProjectRecord, ProjectStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ProjectEntries;
use crate::domain::project::non_blank;
use crate::domain::{DeclarationError, ProjectDeclaration, Result, RuntimeKind};

/// One declaration, or the reason it could not be resolved.
pub type Declared = std::result::Result<ProjectDeclaration, DeclarationError>;

/// Supplies the ordered declarations for one batch.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Declared>>;
}

/// Declarations from the `projects` section of the settings document.
#[derive(Debug, Clone)]
pub struct ConfigProjectSource {
    entries: ProjectEntries,
}

impl ConfigProjectSource {
    pub fn new(entries: ProjectEntries) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl ProjectSource for ConfigProjectSource {
    async fn load(&self) -> Result<Vec<Declared>> {
        Ok(self
            .entries
            .iter()
            .map(|(name, entry)| entry.validate(name))
            .collect())
    }
}

/// Declarations from the deployment queue store, already ordered by
/// deployment group and then name.
#[derive(Clone)]
pub struct StoreProjectSource {
    store: Arc<dyn ProjectStore>,
}

impl StoreProjectSource {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProjectSource for StoreProjectSource {
    async fn load(&self) -> Result<Vec<Declared>> {
        let records = self.store.list_automated().await?;
        Ok(records.iter().map(declaration_from_record).collect())
    }
}

/// Map a store row to a declaration.
///
/// `project_path` names either the project file (its parent becomes the
/// source directory and the extension selects the runtime) or the source
/// directory itself, in which case no runtime is declared.
pub fn declaration_from_record(record: &ProjectRecord) -> Declared {
    let path = PathBuf::from(record.project_path.trim());
    if path.as_os_str().is_empty() {
        return Err(DeclarationError::MissingField {
            project: record.name.clone(),
            field: "project_path",
        });
    }
    let branch = non_blank(Some(record.branch.clone())).ok_or_else(|| {
        DeclarationError::MissingField {
            project: record.name.clone(),
            field: "branch",
        }
    })?;

    let names_file = !path.is_dir() && path.extension().is_some();
    let mut decl = if names_file {
        let runtime = RuntimeKind::from_project_file(&path).map_err(|value| {
            DeclarationError::UnrecognizedRuntime {
                project: record.name.clone(),
                value,
            }
        })?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        ProjectDeclaration::new(&record.name, dir, branch.trim(), runtime).with_project_file(path)
    } else {
        ProjectDeclaration::new(&record.name, path, branch.trim(), RuntimeKind::Undeclared)
    };

    decl.publish_target = non_blank(record.publish_path.clone()).map(PathBuf::from);
    decl.post_deploy_hook = non_blank(record.post_deploy_path.clone()).map(PathBuf::from);
    decl.active = record.automated;
    Ok(decl.in_group(record.deployment_group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodeploy_state::fakes::MemoryProjectStore;

    #[test]
    fn test_record_with_project_file() {
        let record = ProjectRecord::new("Api", "/srv/api/Api.csproj", "release")
            .with_publish_path("/var/www/api")
            .with_post_deploy("  ");
        let decl = declaration_from_record(&record).unwrap();

        assert_eq!(decl.source_directory, PathBuf::from("/srv/api"));
        assert_eq!(decl.runtime, RuntimeKind::Compiled);
        assert_eq!(decl.project_file_name(), "Api.csproj");
        assert_eq!(decl.publish_target, Some(PathBuf::from("/var/www/api")));
        assert_eq!(decl.post_deploy_hook, None);
    }

    #[test]
    fn test_record_with_directory() {
        let dir = tempfile::tempdir().unwrap();
        let record = ProjectRecord::new("site", dir.path().to_string_lossy(), "main");
        let decl = declaration_from_record(&record).unwrap();

        assert_eq!(decl.source_directory, dir.path());
        assert_eq!(decl.runtime, RuntimeKind::Undeclared);
    }

    #[test]
    fn test_record_with_unknown_extension_is_rejected() {
        let record = ProjectRecord::new("Odd", "/srv/odd/Odd.fsproj", "main");
        assert_eq!(
            declaration_from_record(&record),
            Err(DeclarationError::UnrecognizedRuntime {
                project: "Odd".to_string(),
                value: ".fsproj".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_store_source_keeps_store_order() {
        let store = Arc::new(MemoryProjectStore::with_records([
            ProjectRecord::new("b", "/srv/b", "main").in_group(1),
            ProjectRecord::new("z", "/srv/z", "main"),
            ProjectRecord::new("a", "/srv/a", "main").in_group(1),
            ProjectRecord::new("m", "/srv/m", "main").manual(),
        ]));
        let declared = StoreProjectSource::new(store).load().await.unwrap();
        let names: Vec<_> = declared
            .into_iter()
            .map(|d| d.unwrap().name)
            .collect();
        assert_eq!(names, vec!["z", "a", "b"]);
    }
}
