#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Caller asked to link a folder to a remote.
    Start(crate::LinkRequest),
    /// Remote-existence probe finished.
    RemoteChecked(Result<crate::RemoteStatus, crate::LinkError>),
    /// Engine finished the external work for a phase.
    StepFinished {
        phase: crate::LinkPhase,
        outcome: Result<String, crate::LinkError>,
    },
    /// Reconciling succeeded after pulling `branch`; later pushes go there.
    Reconciled { branch: String, message: String },
    /// Caller cancelled; honoured between steps only.
    CancelRequested,
    /// Leaves the run untouched.
    NoOp,
}
