use std::path::Path;

use linker_core::{LinkError, LinkErrorKind};
use linker_logging::one_line;

use crate::classify::classify_failure;
use crate::{GitOutput, GitRunner};

/// How `configure_remote` left the named remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteChange {
    Added,
    Updated,
    Unchanged,
}

impl RemoteChange {
    pub fn describe(self, name: &str, url: &str) -> String {
        match self {
            RemoteChange::Added => format!("added remote {name} -> {url}"),
            RemoteChange::Updated => format!("updated remote {name} -> {url}"),
            RemoteChange::Unchanged => format!("remote {name} already points to {url}"),
        }
    }
}

/// Git operations scoped to one working tree.
pub struct GitRepo<'a> {
    git: &'a dyn GitRunner,
    path: &'a Path,
}

impl<'a> GitRepo<'a> {
    pub fn new(git: &'a dyn GitRunner, path: &'a Path) -> Self {
        Self { git, path }
    }

    pub fn is_repository(&self) -> bool {
        self.path.join(".git").exists()
    }

    pub fn merge_in_progress(&self) -> bool {
        self.path.join(".git").join("MERGE_HEAD").exists()
    }

    pub async fn exec(&self, args: &[&str]) -> Result<GitOutput, LinkError> {
        Ok(self.git.run(Some(self.path), args).await?)
    }

    /// Runs git and turns a non-zero exit into a classified `LinkError`.
    pub async fn exec_ok(&self, args: &[&str]) -> Result<String, LinkError> {
        let output = self.exec(args).await?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(failure(args, &output))
        }
    }

    /// `git init` with HEAD pointing at `branch`; works on git versions without `init -b`.
    pub async fn init(&self, branch: &str) -> Result<(), LinkError> {
        self.exec_ok(&["init"]).await?;
        let head = format!("refs/heads/{branch}");
        self.exec_ok(&["symbolic-ref", "HEAD", &head]).await?;
        Ok(())
    }

    pub async fn point_head_at(&self, branch: &str) -> Result<(), LinkError> {
        let head = format!("refs/heads/{branch}");
        self.exec_ok(&["symbolic-ref", "HEAD", &head]).await?;
        Ok(())
    }

    pub async fn has_commits(&self) -> Result<bool, LinkError> {
        let output = self.exec(&["rev-parse", "--verify", "--quiet", "HEAD"]).await?;
        Ok(output.success)
    }

    pub async fn current_branch(&self) -> Result<Option<String>, LinkError> {
        let output = self
            .exec(&["symbolic-ref", "--quiet", "--short", "HEAD"])
            .await?;
        let branch = output.stdout.trim();
        Ok((output.success && !branch.is_empty()).then(|| branch.to_string()))
    }

    /// `init.defaultBranch` from the user's git config, if set.
    pub async fn configured_default_branch(&self) -> Option<String> {
        let output = self
            .git
            .run(None, &["config", "--get", "init.defaultBranch"])
            .await
            .ok()?;
        let branch = output.stdout.trim();
        (output.success && !branch.is_empty()).then(|| branch.to_string())
    }

    /// Adds the remote, or rewrites its URL when it points elsewhere.
    pub async fn configure_remote(&self, name: &str, url: &str) -> Result<RemoteChange, LinkError> {
        let existing = self.exec(&["remote", "get-url", name]).await?;
        if existing.success {
            if existing.stdout.trim() == url {
                return Ok(RemoteChange::Unchanged);
            }
            self.exec_ok(&["remote", "set-url", name, url]).await?;
            return Ok(RemoteChange::Updated);
        }
        self.exec_ok(&["remote", "add", name, url]).await?;
        Ok(RemoteChange::Added)
    }

    /// Stages everything and returns how many paths are staged afterwards.
    pub async fn stage_all(&self) -> Result<usize, LinkError> {
        self.exec_ok(&["add", "--all"]).await?;
        self.staged_count().await
    }

    /// Counts index entries that differ from HEAD (or from nothing on an unborn branch).
    pub async fn staged_count(&self) -> Result<usize, LinkError> {
        let status = self.exec_ok(&["status", "--porcelain"]).await?;
        Ok(status
            .lines()
            .filter(|line| {
                let index = line.chars().next().unwrap_or(' ');
                index != ' ' && index != '?' && index != '!'
            })
            .count())
    }

    pub async fn commit(&self, message: &str, allow_empty: bool) -> Result<(), LinkError> {
        if allow_empty {
            self.exec_ok(&["commit", "--allow-empty", "-m", message])
                .await?;
        } else {
            self.exec_ok(&["commit", "-m", message]).await?;
        }
        Ok(())
    }

    pub async fn short_head(&self) -> Result<String, LinkError> {
        Ok(self
            .exec_ok(&["rev-parse", "--short", "HEAD"])
            .await?
            .trim()
            .to_string())
    }

    pub async fn pull(
        &self,
        remote: &str,
        branch: &str,
        allow_unrelated_histories: bool,
    ) -> Result<GitOutput, LinkError> {
        let mut args = vec!["pull", "--no-rebase", "--no-edit"];
        if allow_unrelated_histories {
            args.push("--allow-unrelated-histories");
        }
        args.push(remote);
        args.push(branch);
        self.exec(&args).await
    }

    /// `git push -u remote HEAD[:branch]`; without a branch the remote branch
    /// takes the current branch's name.
    pub async fn push(&self, remote: &str, branch: Option<&str>) -> Result<String, LinkError> {
        let refspec = match branch {
            Some(branch) => format!("HEAD:{branch}"),
            None => "HEAD".to_string(),
        };
        let args = ["push", "-u", remote, refspec.as_str()];
        let output = self.exec(&args).await?;
        if output.success {
            // git reports push progress on stderr.
            Ok(one_line(&output.stderr))
        } else {
            Err(failure(&args, &output))
        }
    }

    /// Creates an empty bare repository at `bare` with HEAD on `branch`.
    ///
    /// Runs from the working tree, so a relative `bare` resolves the way the
    /// later push resolves it.
    pub async fn create_bare_remote(&self, bare: &Path, branch: &str) -> Result<(), LinkError> {
        let bare = bare.to_string_lossy();
        self.exec_ok(&["init", "--bare", &bare]).await?;
        let head = format!("refs/heads/{branch}");
        self.exec_ok(&["--git-dir", &bare, "symbolic-ref", "HEAD", &head])
            .await?;
        Ok(())
    }
}

/// Builds the error for a failed invocation, keeping git's own words.
pub(crate) fn failure(args: &[&str], output: &GitOutput) -> LinkError {
    let detail = if output.stderr.trim().is_empty() {
        one_line(&output.stdout)
    } else {
        one_line(&output.stderr)
    };
    let kind = classify_failure(&format!("{}\n{}", output.stderr, output.stdout));
    LinkError::new(kind, format!("git {} failed: {detail}", args.join(" ")))
}

pub(crate) fn merge_in_progress_error() -> LinkError {
    LinkError::new(
        LinkErrorKind::Conflict,
        "a merge is already in progress; resolve the conflicts and commit before linking again",
    )
}
