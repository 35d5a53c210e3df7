use std::path::PathBuf;

use crate::{GitignoreTemplate, LinkPhase, RemoteTarget};

/// External work requested by `update`; executed one at a time by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckRemote {
        local_path: PathBuf,
        remote: RemoteTarget,
    },
    Initialize {
        local_path: PathBuf,
        remote_name: String,
        remote_url: String,
        branch: Option<String>,
        gitignore: Option<GitignoreTemplate>,
        /// Set when the probe found no repository; it is created before the remote is added.
        create_remote: Option<RemoteTarget>,
    },
    Reconcile {
        local_path: PathBuf,
        remote_name: String,
        remote_url: String,
        branch: Option<String>,
    },
    Stage {
        local_path: PathBuf,
    },
    Commit {
        local_path: PathBuf,
        message: String,
    },
    Push {
        local_path: PathBuf,
        remote_name: String,
        /// Remote branch to update; `None` pushes to the current branch's name.
        branch: Option<String>,
    },
}

impl Effect {
    pub fn phase(&self) -> LinkPhase {
        match self {
            Effect::CheckRemote { .. } => LinkPhase::CheckingRemote,
            Effect::Initialize { .. } => LinkPhase::Initializing,
            Effect::Reconcile { .. } => LinkPhase::Reconciling,
            Effect::Stage { .. } => LinkPhase::Staging,
            Effect::Commit { .. } => LinkPhase::Committing,
            Effect::Push { .. } => LinkPhase::Pushing,
        }
    }
}
