use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkErrorKind {
    /// Local folder missing, not a directory, or not writable.
    Filesystem,
    /// The git binary could not be started.
    ToolNotFound,
    /// The remote rejected our credentials.
    Authentication,
    /// Local and remote history cannot be reconciled without the user.
    Conflict,
    /// The remote repository does not exist.
    RemoteMissing,
    /// The remote could not be reached.
    Network,
    /// git exited with an error that fits no other kind.
    Command,
    /// Malformed repository name or URL.
    InvalidRequest,
    /// Another run holds the lock for the same folder.
    RunInProgress,
    /// The caller cancelled between steps.
    Cancelled,
}

impl LinkErrorKind {
    /// What the user should do before re-invoking the run.
    pub fn hint(self) -> &'static str {
        match self {
            LinkErrorKind::Filesystem => {
                "Check that the folder exists, is a directory and that you can write to it."
            }
            LinkErrorKind::ToolNotFound => {
                "Install git (https://git-scm.com) and make sure it is on PATH, or set git_program in the config."
            }
            LinkErrorKind::Authentication => {
                "Authenticate with the remote (for example `gh auth login` or a credential helper) and retry."
            }
            LinkErrorKind::Conflict => {
                "Resolve the conflicting files, commit the merge with `git commit`, then run the link again."
            }
            LinkErrorKind::RemoteMissing => {
                "Create the repository first (see `repo-linker instructions new`) or correct the URL."
            }
            LinkErrorKind::Network => "Check your network connection and the remote URL, then retry.",
            LinkErrorKind::Command => "Inspect the git output above, fix the cause and retry.",
            LinkErrorKind::InvalidRequest => {
                "Use `owner/name`, a full https:// or git@ URL, or a local path to a bare repository."
            }
            LinkErrorKind::RunInProgress => {
                "Wait for the other run on this folder to finish. Remove a stale lock file if no run is active."
            }
            LinkErrorKind::Cancelled => "The run was cancelled; run the link again to continue.",
        }
    }
}

impl fmt::Display for LinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkErrorKind::Filesystem => write!(f, "filesystem error"),
            LinkErrorKind::ToolNotFound => write!(f, "git not found"),
            LinkErrorKind::Authentication => write!(f, "authentication rejected"),
            LinkErrorKind::Conflict => write!(f, "conflict"),
            LinkErrorKind::RemoteMissing => write!(f, "remote not found"),
            LinkErrorKind::Network => write!(f, "network error"),
            LinkErrorKind::Command => write!(f, "command failed"),
            LinkErrorKind::InvalidRequest => write!(f, "invalid request"),
            LinkErrorKind::RunInProgress => write!(f, "run already in progress"),
            LinkErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkError {
    pub kind: LinkErrorKind,
    pub message: String,
}

impl LinkError {
    pub fn new(kind: LinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for LinkError {}
