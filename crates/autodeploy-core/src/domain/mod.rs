//! Domain model: project declarations, pipeline steps, events and errors.

pub mod error;
pub mod event;
pub mod project;
pub mod step;

pub use error::{DeclarationError, DeployError, Result};
pub use event::{DeployEvent, Severity};
pub use project::{ProjectDeclaration, RuntimeKind};
pub use step::{PipelineReport, Step, StepOutcome};
