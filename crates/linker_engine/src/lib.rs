//! Linker engine: git process plumbing, remote probes and effect execution.
mod classify;
mod git;
mod handle;
mod linker;
mod lock;
mod persist;
mod probe;
mod repo;
mod types;

pub use classify::{classify_failure, is_missing_remote_ref, is_missing_repository};
pub use git::{CommandGitRunner, GitError, GitOutput, GitRunner};
pub use handle::{Canceller, LinkerHandle};
pub use linker::{ChannelProgressSink, LinkSettings, Linker, ProgressSink};
pub use lock::{lock_file_name, LockError, RunLock};
pub use persist::{ensure_writable_dir, write_gitignore, AtomicFileWriter, GitignoreWrite, PersistError};
pub use probe::{GitHubApiProbe, GitHubApiSettings, GitLsRemoteProbe, RemoteProbe};
pub use repo::{GitRepo, RemoteChange};
pub use types::LinkEvent;
