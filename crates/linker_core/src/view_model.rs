use crate::{LinkError, LinkPhase, RemoteStatus, StepResult};

/// Both paths run five steps: check, init or reconcile, stage, commit, push.
pub(crate) const PLANNED_STEPS: usize = 5;

/// What a progress display needs after each step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkViewModel {
    pub phase: LinkPhase,
    pub steps: Vec<StepResult>,
    pub progress_percent: u8,
    pub remote_status: Option<RemoteStatus>,
    pub failure: Option<LinkError>,
}

impl LinkViewModel {
    pub fn last_step(&self) -> Option<&StepResult> {
        self.steps.last()
    }

    pub fn succeeded(&self) -> bool {
        self.phase == LinkPhase::Done
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }
}
