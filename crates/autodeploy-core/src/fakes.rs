//! In-memory fakes for the engine's collaborators (testing only)
//!
//! Each fake records what it was asked to do so tests can assert on
//! invocation order and on which side effects happened.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::EligibilityBackend;
use crate::domain::{DeployError, DeployEvent, ProjectDeclaration, Result};
use crate::eligibility::EligibilitySource;
use crate::notify::Notifier;
use crate::obs::EventSink;
use crate::process::{CommandSpec, ProcessRunner, RunOutcome};

/// Process runner with scripted outcomes.
///
/// A command's outcome is the first script entry whose prefix matches its
/// command line; unmatched commands exit 0.
#[derive(Debug, Default)]
pub struct FakeRunner {
    script: Vec<(String, RunOutcome)>,
    invocations: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, prefix: impl Into<String>, outcome: RunOutcome) -> Self {
        self.script.push((prefix.into(), outcome));
        self
    }

    /// Make commands starting with `prefix` exit with `code`.
    pub fn fail(self, prefix: impl Into<String>, code: i32) -> Self {
        self.respond(prefix, RunOutcome::Exited(code))
    }

    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(CommandSpec::command_line)
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> RunOutcome {
        let line = spec.command_line();
        self.invocations.lock().unwrap().push(spec.clone());
        self.script
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or(RunOutcome::Exited(0))
    }
}

/// Event sink that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeployEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(DeployEvent::name).collect()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &DeployEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Notifier that stores messages, or rejects them when built with
/// [`RecordingNotifier::failing`].
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every message passed to `notify`, including rejected ones.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(DeployError::Notify("chat unreachable".to_string()));
        }
        Ok(())
    }
}

/// Eligibility backend over a fixed set of due project names.
#[derive(Debug, Default)]
pub struct MemorySignal {
    due: Mutex<HashSet<String>>,
    broken: HashSet<String>,
    checks: Mutex<Vec<String>>,
    consumed: Mutex<Vec<(String, bool)>>,
}

impl MemorySignal {
    pub fn due<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            due: Mutex::new(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Make the check for `name` fail.
    pub fn broken(mut self, name: impl Into<String>) -> Self {
        self.broken.insert(name.into());
        self
    }

    /// Names checked, in order.
    pub fn checks(&self) -> Vec<String> {
        self.checks.lock().unwrap().clone()
    }

    /// `(name, deployed)` for every consumed signal, in order.
    pub fn consumed(&self) -> Vec<(String, bool)> {
        self.consumed.lock().unwrap().clone()
    }

    pub fn is_due(&self, name: &str) -> bool {
        self.due.lock().unwrap().contains(name)
    }
}

#[async_trait]
impl EligibilitySource for MemorySignal {
    fn backend(&self) -> EligibilityBackend {
        EligibilityBackend::MarkerFile
    }

    async fn is_eligible(&self, project: &ProjectDeclaration) -> Result<bool> {
        self.checks.lock().unwrap().push(project.name.clone());
        if self.broken.contains(&project.name) {
            return Err(DeployError::Config(format!(
                "signal for '{}' unreadable",
                project.name
            )));
        }
        Ok(self.is_due(&project.name))
    }

    async fn consume(&self, project: &ProjectDeclaration, deployed: bool) -> Result<()> {
        self.due.lock().unwrap().remove(&project.name);
        self.consumed
            .lock()
            .unwrap()
            .push((project.name.clone(), deployed));
        Ok(())
    }
}
