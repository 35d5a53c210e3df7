//! Linker core: pure state machine, run data model and remote target parsing.
mod effect;
mod error;
mod instructions;
mod msg;
mod remote;
mod request;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{LinkError, LinkErrorKind};
pub use instructions::InstructionSet;
pub use msg::Msg;
pub use remote::{repo_name_for_folder, GitHubRepo, RemoteStatus, RemoteTarget};
pub use request::{GitignoreTemplate, LinkRequest, DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE_NAME};
pub use state::{LinkPhase, RunState, StepResult};
pub use update::update;
pub use view_model::LinkViewModel;
