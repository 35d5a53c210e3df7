use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use linker_core::{
    repo_name_for_folder, update, Effect, GitignoreTemplate, LinkError, LinkErrorKind, LinkPhase,
    LinkRequest, Msg, RemoteStatus, RemoteTarget, RunState, StepResult,
};
use linker_logging::{linker_error, linker_info, linker_warn};
use tokio_util::sync::CancellationToken;

use crate::classify::is_missing_remote_ref;
use crate::persist::{ensure_writable_dir, write_gitignore, GitignoreWrite};
use crate::repo::{failure, merge_in_progress_error};
use crate::{GitHubApiProbe, GitRepo, GitRunner, LinkEvent, RemoteProbe, RunLock};

#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Where run-in-progress markers are created.
    pub lock_dir: PathBuf,
    /// Branch for a fresh `git init` when neither the request nor git config names one.
    pub fallback_branch: String,
    pub allow_unrelated_histories: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            lock_dir: std::env::temp_dir(),
            fallback_branch: "main".to_string(),
            allow_unrelated_histories: false,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: LinkEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<LinkEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<LinkEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: LinkEvent) {
        let _ = self.tx.send(event);
    }
}

struct DiscardSink;

impl ProgressSink for DiscardSink {
    fn emit(&self, _event: LinkEvent) {}
}

/// Drives one run: feeds effects from the core state machine to git, one at a time.
pub struct Linker {
    git: Arc<dyn GitRunner>,
    probe: Arc<dyn RemoteProbe>,
    github: Option<GitHubApiProbe>,
    settings: LinkSettings,
}

impl Linker {
    pub fn new(git: Arc<dyn GitRunner>, probe: Arc<dyn RemoteProbe>, settings: LinkSettings) -> Self {
        Self {
            git,
            probe,
            github: None,
            settings,
        }
    }

    /// GitHub API used to create absent GitHub remotes and to find the account login.
    pub fn with_github(mut self, github: GitHubApiProbe) -> Self {
        self.github = Some(github);
        self
    }

    /// Runs to completion without progress reporting or cancellation.
    pub async fn link(&self, request: LinkRequest) -> Vec<StepResult> {
        self.run(request, &DiscardSink, &CancellationToken::new())
            .await
    }

    /// Runs the workflow, emitting a view of the run as soon as each step is known.
    ///
    /// `cancel` is checked between steps; a running git command is never interrupted.
    pub async fn run(
        &self,
        request: LinkRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Vec<StepResult> {
        linker_info!(
            "link start path={:?} remote={}",
            request.local_path,
            request.remote
        );
        let lock = RunLock::acquire(&request.local_path, &self.settings.lock_dir);
        let (mut state, effects) = update(RunState::new(), Msg::Start(request));
        let _lock = match lock {
            Ok(lock) => lock,
            Err(err) => {
                let error = LinkError::from(err);
                linker_warn!("link refused: {}", error);
                // Reported as a failed check so the run still has exactly one step.
                let (state, _) = update(state, Msg::RemoteChecked(Err(error)));
                sink.emit(LinkEvent::Progress(state.view()));
                sink.emit(LinkEvent::Finished(state.view()));
                return state.into_steps();
            }
        };

        let mut pending: VecDeque<Effect> = effects.into();
        let mut reported = 0;
        while let Some(effect) = pending.pop_front() {
            let msg = if cancel.is_cancelled() {
                Msg::CancelRequested
            } else {
                self.execute(effect).await
            };
            let (next, effects) = update(state, msg);
            state = next;
            pending.extend(effects);

            if state.steps().len() > reported {
                for step in &state.steps()[reported..] {
                    if step.succeeded {
                        linker_info!("{}", step);
                    } else {
                        linker_error!("{}", step);
                    }
                }
                reported = state.steps().len();
                sink.emit(LinkEvent::Progress(state.view()));
            }
        }

        linker_info!("link finished phase={}", state.phase());
        sink.emit(LinkEvent::Finished(state.view()));
        state.into_steps()
    }

    async fn execute(&self, effect: Effect) -> Msg {
        let phase = effect.phase();
        let outcome = match effect {
            Effect::CheckRemote { local_path, remote } => {
                return Msg::RemoteChecked(self.check(&local_path, &remote).await);
            }
            Effect::Initialize {
                local_path,
                remote_name,
                remote_url,
                branch,
                gitignore,
                create_remote,
            } => {
                self.initialize(
                    &local_path,
                    &remote_name,
                    &remote_url,
                    branch,
                    gitignore,
                    create_remote.as_ref(),
                )
                .await
            }
            Effect::Reconcile {
                local_path,
                remote_name,
                remote_url,
                branch,
            } => {
                return match self
                    .reconcile(&local_path, &remote_name, &remote_url, branch)
                    .await
                {
                    Ok((branch, message)) => Msg::Reconciled { branch, message },
                    Err(error) => Msg::StepFinished {
                        phase,
                        outcome: Err(error),
                    },
                };
            }
            Effect::Stage { local_path } => self.stage(&local_path).await,
            Effect::Commit {
                local_path,
                message,
            } => self.commit(&local_path, &message).await,
            Effect::Push {
                local_path,
                remote_name,
                branch,
            } => self.push(&local_path, &remote_name, branch.as_deref()).await,
        };
        Msg::StepFinished { phase, outcome }
    }

    /// Preflight and probe only: the folder is writable, git runs, and what the remote holds.
    pub async fn check(&self, local_path: &Path, remote: &RemoteTarget) -> Result<RemoteStatus, LinkError> {
        ensure_writable_dir(local_path)?;
        let version = self.git.run(None, &["--version"]).await?;
        if !version.success {
            return Err(failure(&["--version"], &version));
        }
        self.probe.probe(remote, local_path).await
    }

    /// GitHub repository named after the folder, for callers that give no repository.
    ///
    /// The owner is `default_owner`, else the login behind the GitHub token,
    /// else git's `user.name`.
    pub async fn folder_target(
        &self,
        local_path: &Path,
        default_owner: Option<&str>,
    ) -> Result<RemoteTarget, LinkError> {
        let folder = std::fs::canonicalize(local_path).unwrap_or_else(|_| local_path.to_path_buf());
        if repo_name_for_folder(&folder).is_none() {
            return Err(LinkError::new(
                LinkErrorKind::InvalidRequest,
                format!("cannot derive a repository name from {}", folder.display()),
            ));
        }
        let owner = match default_owner.map(str::trim).filter(|owner| !owner.is_empty()) {
            Some(owner) => owner.to_string(),
            None => self.account_owner().await?,
        };
        let target = RemoteTarget::for_folder(&folder, &owner)?;
        linker_info!("repository {} derived from folder {:?}", target, folder);
        Ok(target)
    }

    async fn account_owner(&self) -> Result<String, LinkError> {
        if let Some(github) = self.github.as_ref().filter(|github| github.has_token()) {
            match github.authenticated_login().await {
                Ok(login) => return Ok(login),
                Err(err) => linker_warn!("GitHub login lookup failed: {}", err),
            }
        }
        let output = self.git.run(None, &["config", "--get", "user.name"]).await?;
        let name = output.stdout.trim();
        if output.success && !name.is_empty() {
            return Ok(name.to_string());
        }
        Err(LinkError::new(
            LinkErrorKind::InvalidRequest,
            "no repository owner known; give owner/name, set default_owner or git's user.name",
        ))
    }

    /// Creates the repository the probe reported absent.
    async fn create_remote(
        &self,
        repo: &GitRepo<'_>,
        remote: &RemoteTarget,
        branch: &str,
    ) -> Result<String, LinkError> {
        if let Some(bare) = remote.local_path() {
            repo.create_bare_remote(&bare, branch).await?;
            return Ok(format!("created bare repository {}", bare.display()));
        }
        match (remote.github(), &self.github) {
            (Some(github_repo), Some(github)) => {
                github.create_repository(github_repo).await?;
                Ok(format!("created GitHub repository {}", github_repo.full_name()))
            }
            (Some(github_repo), None) => Err(LinkError::new(
                LinkErrorKind::RemoteMissing,
                format!(
                    "{} does not exist and no GitHub API is configured to create it",
                    github_repo.full_name()
                ),
            )),
            (None, _) => Err(LinkError::new(
                LinkErrorKind::RemoteMissing,
                format!("{remote} does not exist; create it on its host first"),
            )),
        }
    }

    async fn resolve_branch(&self, repo: &GitRepo<'_>, requested: Option<String>) -> String {
        match requested {
            Some(branch) => branch,
            None => repo
                .configured_default_branch()
                .await
                .unwrap_or_else(|| self.settings.fallback_branch.clone()),
        }
    }

    async fn initialize(
        &self,
        local_path: &Path,
        remote_name: &str,
        remote_url: &str,
        branch: Option<String>,
        gitignore: Option<GitignoreTemplate>,
        create_remote: Option<&RemoteTarget>,
    ) -> Result<String, LinkError> {
        let repo = GitRepo::new(self.git.as_ref(), local_path);
        let mut notes = Vec::new();
        let local_branch = if repo.is_repository() {
            match repo.current_branch().await? {
                Some(current) => {
                    notes.push(format!("existing repository on {current}"));
                    current
                }
                None => {
                    notes.push("existing repository".to_string());
                    self.resolve_branch(&repo, branch).await
                }
            }
        } else {
            let branch = self.resolve_branch(&repo, branch).await;
            repo.init(&branch).await?;
            notes.push(format!("initialized repository on {branch}"));
            branch
        };

        if let Some(template) = gitignore {
            match write_gitignore(local_path, template)? {
                GitignoreWrite::Written => {
                    notes.push(format!(".gitignore written from {} template", template.name()))
                }
                GitignoreWrite::AlreadyPresent => notes.push("kept existing .gitignore".to_string()),
            }
        }

        if let Some(remote) = create_remote {
            notes.push(self.create_remote(&repo, remote, &local_branch).await?);
        }

        let change = repo.configure_remote(remote_name, remote_url).await?;
        notes.push(change.describe(remote_name, remote_url));
        Ok(notes.join("; "))
    }

    async fn reconcile(
        &self,
        local_path: &Path,
        remote_name: &str,
        remote_url: &str,
        branch: Option<String>,
    ) -> Result<(String, String), LinkError> {
        let repo = GitRepo::new(self.git.as_ref(), local_path);
        let mut branch = self.resolve_branch(&repo, branch).await;
        let mut notes = Vec::new();
        if !repo.is_repository() {
            repo.init(&branch).await?;
            notes.push(format!("initialized repository on {branch}"));
        }
        if repo.merge_in_progress() {
            return Err(merge_in_progress_error());
        }

        let change = repo.configure_remote(remote_name, remote_url).await?;
        notes.push(change.describe(remote_name, remote_url));

        let allow_unrelated = self.settings.allow_unrelated_histories;
        let mut output = repo.pull(remote_name, &branch, allow_unrelated).await?;
        if !output.success && is_missing_remote_ref(&output.stderr) {
            if let Some(alternative) = alternative_branch(&branch) {
                linker_warn!(
                    "remote has no branch {}, retrying with {}",
                    branch,
                    alternative
                );
                if !repo.has_commits().await? {
                    repo.point_head_at(alternative).await?;
                }
                branch = alternative.to_string();
                output = repo.pull(remote_name, &branch, allow_unrelated).await?;
            }
        }
        if !output.success {
            return Err(failure(&["pull", remote_name, branch.as_str()], &output));
        }

        let summary = linker_logging::one_line(&output.stdout);
        if summary.is_empty() {
            notes.push(format!("pulled {remote_name}/{branch}"));
        } else {
            notes.push(format!("pulled {remote_name}/{branch}: {summary}"));
        }
        Ok((branch, notes.join("; ")))
    }

    async fn stage(&self, local_path: &Path) -> Result<String, LinkError> {
        let repo = GitRepo::new(self.git.as_ref(), local_path);
        let staged = repo.stage_all().await?;
        Ok(match staged {
            0 => "nothing to stage".to_string(),
            1 => "staged 1 change".to_string(),
            n => format!("staged {n} changes"),
        })
    }

    async fn commit(&self, local_path: &Path, message: &str) -> Result<String, LinkError> {
        let repo = GitRepo::new(self.git.as_ref(), local_path);
        if repo.staged_count().await? > 0 {
            repo.commit(message, false).await?;
        } else if repo.has_commits().await? {
            return Ok("nothing to commit".to_string());
        } else {
            // Unborn branch: an empty root commit gives the push something to publish.
            repo.commit(message, true).await?;
        }
        let head = repo.short_head().await?;
        Ok(format!("committed {head} \"{message}\""))
    }

    async fn push(
        &self,
        local_path: &Path,
        remote_name: &str,
        branch: Option<&str>,
    ) -> Result<String, LinkError> {
        let repo = GitRepo::new(self.git.as_ref(), local_path);
        let target_branch = match branch {
            Some(branch) => Some(branch.to_string()),
            None => repo.current_branch().await?,
        };
        let summary = repo.push(remote_name, branch).await?;
        let target = match target_branch {
            Some(branch) => format!("{remote_name}/{branch}"),
            None => remote_name.to_string(),
        };
        if summary.is_empty() {
            Ok(format!("pushed to {target}"))
        } else {
            Ok(format!("pushed to {target}: {summary}"))
        }
    }
}

fn alternative_branch(branch: &str) -> Option<&'static str> {
    match branch {
        "main" => Some("master"),
        "master" => Some("main"),
        _ => None,
    }
}
