//! Explicit context shared by the pipeline components.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, HookWorkingDir};
use crate::obs::EventSink;
use crate::process::ProcessRunner;
use crate::toolchain::Toolchain;

/// Collaborators and settings for one invocation, built once and passed
/// to each component that needs them.
#[derive(Clone)]
pub struct DeployContext {
    pub runner: Arc<dyn ProcessRunner>,
    pub sink: Arc<dyn EventSink>,
    pub toolchain: Toolchain,
    pub hook_dir: HookWorkingDir,
    pub process_timeout: Option<Duration>,
}

impl DeployContext {
    /// Context with the default toolchain, project-directory hooks and no timeout.
    pub fn new(runner: Arc<dyn ProcessRunner>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            runner,
            sink,
            toolchain: Toolchain::default(),
            hook_dir: HookWorkingDir::default(),
            process_timeout: None,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        runner: Arc<dyn ProcessRunner>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            runner,
            sink,
            toolchain: config.toolchain.clone(),
            hook_dir: config.hooks.working_directory,
            process_timeout: config.process_timeout(),
        }
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_hook_dir(mut self, hook_dir: HookWorkingDir) -> Self {
        self.hook_dir = hook_dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.process_timeout = timeout;
        self
    }
}
