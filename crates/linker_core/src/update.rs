use crate::{Effect, LinkError, LinkErrorKind, LinkPhase, LinkRequest, Msg, RemoteStatus, RunState};

/// Pure update function: applies a message to the run and returns the next effect, if any.
///
/// At most one effect is returned per message, so a run never has two
/// external commands in flight.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start(request) => {
            if state.phase() != LinkPhase::Idle {
                return (state, Vec::new());
            }
            let effect = Effect::CheckRemote {
                local_path: request.local_path.clone(),
                remote: request.remote.clone(),
            };
            state.begin(request);
            vec![effect]
        }
        Msg::RemoteChecked(result) => {
            if state.phase() != LinkPhase::CheckingRemote {
                return (state, Vec::new());
            }
            match result {
                Ok(status) => {
                    state.record_success(status.describe());
                    let next = if status.needs_publish() {
                        LinkPhase::Initializing
                    } else {
                        LinkPhase::Reconciling
                    };
                    state.set_remote_status(status);
                    state.advance(next);
                    next_effect(&state)
                }
                Err(error) => {
                    state.fail(error);
                    Vec::new()
                }
            }
        }
        Msg::StepFinished { phase, outcome } => {
            if phase != state.phase() || phase == LinkPhase::CheckingRemote || !phase.is_step() {
                return (state, Vec::new());
            }
            match outcome {
                Ok(message) => {
                    state.record_success(message);
                    state.advance(phase.next());
                    next_effect(&state)
                }
                Err(error) => {
                    state.fail(error);
                    Vec::new()
                }
            }
        }
        Msg::Reconciled { branch, message } => {
            if state.phase() != LinkPhase::Reconciling {
                return (state, Vec::new());
            }
            state.record_success(message);
            state.set_push_branch(branch);
            state.advance(LinkPhase::Reconciling.next());
            next_effect(&state)
        }
        Msg::CancelRequested => {
            let phase = state.phase();
            if phase.is_step() {
                state.fail(LinkError::new(
                    LinkErrorKind::Cancelled,
                    format!("cancelled before {phase}"),
                ));
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn next_effect(state: &RunState) -> Vec<Effect> {
    let Some(request) = state.request() else {
        return Vec::new();
    };
    effect_for(state, request).into_iter().collect()
}

fn effect_for(state: &RunState, request: &LinkRequest) -> Option<Effect> {
    let status = state.remote_status();
    let local_path = request.local_path.clone();
    let effect = match state.phase() {
        LinkPhase::Initializing => Effect::Initialize {
            local_path,
            remote_name: request.remote_name.clone(),
            remote_url: request.remote.url().to_string(),
            branch: request.branch.clone(),
            gitignore: request.gitignore,
            create_remote: matches!(status, Some(RemoteStatus::Absent))
                .then(|| request.remote.clone()),
        },
        LinkPhase::Reconciling => {
            let advertised = match status {
                Some(RemoteStatus::HasCommits { default_branch }) => default_branch.clone(),
                _ => None,
            };
            Effect::Reconcile {
                local_path,
                remote_name: request.remote_name.clone(),
                remote_url: request.remote.url().to_string(),
                branch: advertised.or_else(|| request.branch.clone()),
            }
        }
        LinkPhase::Staging => Effect::Stage { local_path },
        LinkPhase::Committing => Effect::Commit {
            local_path,
            message: request.commit_message.clone(),
        },
        LinkPhase::Pushing => Effect::Push {
            local_path,
            remote_name: request.remote_name.clone(),
            branch: state.push_branch().map(ToOwned::to_owned),
        },
        LinkPhase::Idle | LinkPhase::CheckingRemote | LinkPhase::Done | LinkPhase::Failed => {
            return None
        }
    };
    Some(effect)
}
