use std::fmt;

use crate::view_model::{LinkViewModel, PLANNED_STEPS};
use crate::{LinkError, LinkErrorKind, LinkRequest, RemoteStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPhase {
    #[default]
    Idle,
    CheckingRemote,
    Initializing,
    Reconciling,
    Staging,
    Committing,
    Pushing,
    Done,
    Failed,
}

impl LinkPhase {
    pub fn step_name(self) -> &'static str {
        match self {
            LinkPhase::Idle => "Idle",
            LinkPhase::CheckingRemote => "CheckingRemote",
            LinkPhase::Initializing => "Initializing",
            LinkPhase::Reconciling => "Reconciling",
            LinkPhase::Staging => "Staging",
            LinkPhase::Committing => "Committing",
            LinkPhase::Pushing => "Pushing",
            LinkPhase::Done => "Done",
            LinkPhase::Failed => "Failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LinkPhase::Done | LinkPhase::Failed)
    }

    /// Phases that run an external step and report a `StepResult`.
    pub fn is_step(self) -> bool {
        !matches!(self, LinkPhase::Idle | LinkPhase::Done | LinkPhase::Failed)
    }

    /// Successor after a successful step. `CheckingRemote` branches on the
    /// probe result and is handled by `update`.
    pub(crate) fn next(self) -> LinkPhase {
        match self {
            LinkPhase::Initializing | LinkPhase::Reconciling => LinkPhase::Staging,
            LinkPhase::Staging => LinkPhase::Committing,
            LinkPhase::Committing => LinkPhase::Pushing,
            LinkPhase::Pushing => LinkPhase::Done,
            other => other,
        }
    }
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step_name())
    }
}

/// Outcome of one stage of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub phase: LinkPhase,
    pub succeeded: bool,
    pub message: String,
    pub error: Option<LinkErrorKind>,
}

impl StepResult {
    pub fn success(phase: LinkPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            succeeded: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failure(phase: LinkPhase, error: &LinkError) -> Self {
        Self {
            phase,
            succeeded: false,
            message: error.message.clone(),
            error: Some(error.kind),
        }
    }

    pub fn step_name(&self) -> &'static str {
        self.phase.step_name()
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error {
            None => write!(f, "{}:true {}", self.step_name(), self.message),
            Some(kind) => write!(f, "{}:false [{kind}] {}", self.step_name(), self.message),
        }
    }
}

/// Run context: everything one linking run knows, passed explicitly through `update`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    phase: LinkPhase,
    request: Option<LinkRequest>,
    remote_status: Option<RemoteStatus>,
    steps: Vec<StepResult>,
    failure: Option<LinkError>,
    push_branch: Option<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    pub fn request(&self) -> Option<&LinkRequest> {
        self.request.as_ref()
    }

    pub fn remote_status(&self) -> Option<&RemoteStatus> {
        self.remote_status.as_ref()
    }

    /// Remote branch the reconcile step pulled, if any.
    pub fn push_branch(&self) -> Option<&str> {
        self.push_branch.as_deref()
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn failure(&self) -> Option<&LinkError> {
        self.failure.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn into_steps(self) -> Vec<StepResult> {
        self.steps
    }

    /// Snapshot for renderers. Progress counts successful steps; only `Done` reads 100%.
    pub fn view(&self) -> LinkViewModel {
        let progress_percent = if self.phase == LinkPhase::Done {
            100
        } else {
            let done = self.steps.iter().filter(|step| step.succeeded).count();
            (done.min(PLANNED_STEPS) * 100 / PLANNED_STEPS) as u8
        };
        LinkViewModel {
            phase: self.phase,
            steps: self.steps.clone(),
            progress_percent,
            remote_status: self.remote_status.clone(),
            failure: self.failure.clone(),
        }
    }

    pub(crate) fn begin(&mut self, request: LinkRequest) {
        self.request = Some(request);
        self.phase = LinkPhase::CheckingRemote;
    }

    pub(crate) fn set_remote_status(&mut self, status: RemoteStatus) {
        self.remote_status = Some(status);
    }

    pub(crate) fn set_push_branch(&mut self, branch: String) {
        self.push_branch = Some(branch);
    }

    pub(crate) fn record_success(&mut self, message: impl Into<String>) {
        self.steps.push(StepResult::success(self.phase, message));
    }

    pub(crate) fn advance(&mut self, phase: LinkPhase) {
        self.phase = phase;
    }

    pub(crate) fn fail(&mut self, error: LinkError) {
        self.steps.push(StepResult::failure(self.phase, &error));
        self.failure = Some(error);
        self.phase = LinkPhase::Failed;
    }
}
