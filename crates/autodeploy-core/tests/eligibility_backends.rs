//! End-to-end batches over both eligibility backends.

use autodeploy_core::fakes::{FakeRunner, RecordingNotifier, RecordingSink};
use autodeploy_core::{
    AppConfig, BatchCoordinator, ConfigProjectSource, DeployContext, MarkerFileSignal,
    ProjectSource, QueuedFlagSignal, StoreProjectSource,
};
use autodeploy_state::fakes::MemoryProjectStore;
use autodeploy_state::ProjectRecord;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn project_dir(root: &Path, name: &str, marker: bool) -> String {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    if marker {
        std::fs::write(dir.join("deploy.txt"), "").unwrap();
    }
    dir.to_string_lossy().into_owned()
}

/// Test: marker-file batch driven by a settings document
#[tokio::test]
async fn test_marker_file_batch_from_settings() {
    let root = TempDir::new().unwrap();
    let api = project_dir(root.path(), "api", true);
    let bot = project_dir(root.path(), "bot", true);
    let idle = project_dir(root.path(), "idle", true);
    let quiet = project_dir(root.path(), "quiet", false);

    let document = json!({
        "eligibility": "marker_file",
        "projects": {
            "Api": { "active": true, "directory": api, "branch": "main", "language": "csharp" },
            "Bot": { "active": true, "directory": bot, "branch": "dev", "language": "python" },
            "Idle": { "active": false, "directory": idle, "branch": "main" },
            "Quiet": { "active": true, "directory": quiet, "branch": "main" },
            "Broken": { "active": true, "branch": "main" }
        }
    });
    let config = AppConfig::from_json_str(&document.to_string()).unwrap();
    let declared = ConfigProjectSource::new(config.projects.clone())
        .load()
        .await
        .unwrap();
    assert_eq!(declared.len(), 5);

    let runner = Arc::new(FakeRunner::new().fail("git pull origin dev", 1));
    let sink = Arc::new(RecordingSink::new());
    let ctx = DeployContext::from_config(&config, runner.clone(), sink.clone());
    let notifier = Arc::new(RecordingNotifier::new());
    let coordinator = BatchCoordinator::new(
        ctx,
        Arc::new(MarkerFileSignal::new(&config.marker_file)),
        notifier.clone(),
    );

    let pending = coordinator.report(declared.clone()).await;
    assert_eq!(pending.eligible, vec!["Api", "Bot"]);
    assert!(Path::new(&api).join("deploy.txt").exists());

    let result = coordinator.deploy(declared).await;

    assert_eq!(result.deployed, vec!["Api"]);
    assert_eq!(result.failed, vec!["Bot"]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].name, "Broken");
    assert!(!Path::new(&api).join("deploy.txt").exists());
    assert!(!Path::new(&bot).join("deploy.txt").exists());
    assert!(Path::new(&idle).join("deploy.txt").exists());
    assert_eq!(
        notifier.messages(),
        vec!["The following project(s) have been deployed: Api"]
    );
    for cmd in runner.invocations() {
        assert_eq!(cmd.timeout, Some(std::time::Duration::from_secs(3600)));
    }
}

/// Test: queued-flag batch driven by the deployment queue store
#[tokio::test]
async fn test_queued_flag_batch_from_store() {
    let root = TempDir::new().unwrap();
    let web = project_dir(root.path(), "web", false);
    let jobs = project_dir(root.path(), "jobs", false);
    let later = project_dir(root.path(), "later", false);

    let store = Arc::new(MemoryProjectStore::with_records([
        ProjectRecord::new("Web", &web, "main").queued(true).in_group(2),
        ProjectRecord::new("Jobs", &jobs, "main").queued(true).in_group(1),
        ProjectRecord::new("Later", &later, "main").in_group(1),
        ProjectRecord::new("Manual", &web, "main").queued(true).manual(),
    ]));

    let declared = StoreProjectSource::new(store.clone()).load().await.unwrap();
    let runner = Arc::new(FakeRunner::new().fail("git", 1));
    let sink = Arc::new(RecordingSink::new());
    let coordinator = BatchCoordinator::new(
        DeployContext::new(runner.clone(), sink.clone()),
        Arc::new(QueuedFlagSignal::new(store.clone())),
        Arc::new(RecordingNotifier::new()),
    );

    let result = coordinator.deploy(declared).await;

    assert!(result.deployed.is_empty());
    assert_eq!(result.failed, vec!["Jobs", "Web"]);
    assert!(!store.get("Jobs").unwrap().queued);
    assert!(!store.get("Web").unwrap().queued);
    assert!(store.get("Web").unwrap().last_deployed_at.is_none());
    assert!(store.get("Manual").unwrap().queued);
    assert!(!result.notified);
}

/// Test: successful queued deployment records its time
#[tokio::test]
async fn test_queued_flag_success_records_time() {
    let root = TempDir::new().unwrap();
    let web = project_dir(root.path(), "web", false);
    let store = Arc::new(MemoryProjectStore::with_records([ProjectRecord::new(
        "Web", &web, "main",
    )
    .queued(true)]));

    let declared = StoreProjectSource::new(store.clone()).load().await.unwrap();
    let coordinator = BatchCoordinator::new(
        DeployContext::new(Arc::new(FakeRunner::new()), Arc::new(RecordingSink::new())),
        Arc::new(QueuedFlagSignal::new(store.clone())),
        Arc::new(RecordingNotifier::new()),
    );

    let result = coordinator.deploy(declared).await;

    assert_eq!(result.deployed, vec!["Web"]);
    let record = store.get("Web").unwrap();
    assert!(!record.queued);
    assert!(record.last_deployed_at.is_some());
}

/// Test: settings-declared compiled projects publish their project file
#[tokio::test]
async fn test_settings_language_selects_publish_project_file() {
    let root = TempDir::new().unwrap();
    let website = project_dir(root.path(), "website", true);
    let tools = project_dir(root.path(), "tools", true);
    let out = TempDir::new().unwrap();

    let document = json!({
        "projects": {
            "Website": {
                "active": true,
                "directory": website,
                "branch": "main",
                "language": "csharp",
                "publishLocation": out.path()
            },
            "Tools": {
                "active": true,
                "directory": tools,
                "branch": "main",
                "language": "vb",
                "publishLocation": out.path()
            }
        }
    });
    let config = AppConfig::from_json_str(&document.to_string()).unwrap();
    let declared = ConfigProjectSource::new(config.projects.clone())
        .load()
        .await
        .unwrap();

    let runner = Arc::new(FakeRunner::new());
    let coordinator = BatchCoordinator::new(
        DeployContext::from_config(&config, runner.clone(), Arc::new(RecordingSink::new())),
        Arc::new(MarkerFileSignal::new(&config.marker_file)),
        Arc::new(RecordingNotifier::new()),
    );

    let result = coordinator.deploy(declared).await;

    assert_eq!(result.deployed, vec!["Website", "Tools"]);
    let target = out.path().display().to_string();
    assert_eq!(
        runner.command_lines(),
        vec![
            "git pull origin main".to_string(),
            "dotnet build -c Release".to_string(),
            format!("dotnet publish Website.csproj -c Release --no-build -o {target}"),
            "git pull origin main".to_string(),
            "dotnet build -c Release".to_string(),
            format!("dotnet publish Tools.vbproj -c Release --no-build -o {target}"),
        ]
    );
}
