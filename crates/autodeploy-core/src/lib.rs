//! Autodeploy Core Library
//!
//! The deployment pipeline engine. For each declared project it decides
//! whether the project is due ([`eligibility`]), which optional steps apply
//! ([`policy`]), runs the fixed step sequence ([`pipeline`]) through an
//! injected [`process::ProcessRunner`], and folds the per-project outcomes
//! into one batch result and notification ([`batch`]).
//!
//! Every side-effecting collaborator (process runner, event sink, notifier,
//! eligibility backend, project source) is a trait object handed in through
//! [`DeployContext`] or the [`BatchCoordinator`] constructor, so the engine
//! can be driven entirely by the fakes in [`fakes`].

pub mod batch;
pub mod config;
pub mod context;
pub mod domain;
pub mod eligibility;
pub mod fakes;
pub mod notify;
pub mod obs;
pub mod pipeline;
pub mod policy;
pub mod process;
pub mod report;
pub mod source;
pub mod telemetry;
pub mod toolchain;

pub use batch::{notification_text, BatchCoordinator, BatchResult, PendingReport, ProjectError};
pub use config::{
    AppConfig, EligibilityBackend, HookWorkingDir, ProjectEntries, RawProjectEntry,
};
pub use context::DeployContext;
pub use domain::{
    DeclarationError, DeployError, DeployEvent, PipelineReport, ProjectDeclaration, Result,
    RuntimeKind, Severity, Step, StepOutcome,
};
pub use eligibility::{EligibilitySource, MarkerFileSignal, QueuedFlagSignal};
pub use notify::{LogNotifier, Notifier, TelegramNotifier};
pub use obs::{EventSink, TracingSink};
pub use pipeline::PipelineExecutor;
pub use policy::StepPolicy;
pub use process::{CommandSpec, ProcessRunner, RunOutcome, TokioProcessRunner};
pub use report::{open_report, render_pending_html, write_pending_report, PENDING_REPORT_FILE};
pub use source::{ConfigProjectSource, Declared, ProjectSource, StoreProjectSource};
pub use telemetry::init_tracing;
pub use toolchain::Toolchain;
