use linker_core::LinkErrorKind;

const AUTHENTICATION: &[&str] = &[
    "authentication failed",
    "permission denied (publickey",
    "could not read username",
    "could not read password",
    "terminal prompts disabled",
    "returned error: 403",
    "returned error: 401",
    "permission to ",
    "invalid username or password",
];

const CONFLICT: &[&str] = &[
    "conflict",
    "automatic merge failed",
    "would be overwritten",
    "unrelated histories",
    "unmerged files",
    "you have not concluded your merge",
    "[rejected]",
    "non-fast-forward",
    "fetch first",
    "divergent branches",
];

const NETWORK: &[&str] = &[
    "could not resolve host",
    "could not resolve hostname",
    "connection refused",
    "timed out",
    "unable to access",
    "network is unreachable",
    "failed to connect",
    "connection reset",
    "could not read from remote repository",
];

/// Maps git's stderr to an error kind. First matching group wins.
///
/// A missing repository is checked before the network group: git follows
/// "does not appear to be a git repository" with "Could not read from remote repository".
pub fn classify_failure(stderr: &str) -> LinkErrorKind {
    let text = stderr.to_ascii_lowercase();
    let matches_any = |markers: &[&str]| markers.iter().any(|marker| text.contains(marker));
    if matches_any(AUTHENTICATION) {
        LinkErrorKind::Authentication
    } else if is_missing_repository(&text) {
        LinkErrorKind::RemoteMissing
    } else if matches_any(CONFLICT) {
        LinkErrorKind::Conflict
    } else if matches_any(NETWORK) {
        LinkErrorKind::Network
    } else {
        LinkErrorKind::Command
    }
}

/// True when git says the remote repository does not exist.
pub fn is_missing_repository(stderr: &str) -> bool {
    let text = stderr.to_ascii_lowercase();
    text.contains("repository not found")
        || text.contains("does not appear to be a git repository")
        || (text.contains("repository '") && text.contains("' not found"))
}

/// True when a pull named a branch the remote does not have.
pub fn is_missing_remote_ref(stderr: &str) -> bool {
    stderr.to_ascii_lowercase().contains("couldn't find remote ref")
}
