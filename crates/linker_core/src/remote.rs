use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::{LinkError, LinkErrorKind};

const GITHUB_HOST: &str = "github.com";

/// Owner and repository name of a GitHub-hosted remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub name: String,
}

impl GitHubRepo {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Where the local folder gets linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    url: String,
    github: Option<GitHubRepo>,
}

impl RemoteTarget {
    /// Parses a repository name or URL as typed by the user.
    ///
    /// Accepted forms: `name` (with `default_owner`), `owner/name`,
    /// `https://host/owner/name`, `host/owner/name`, `git@host:owner/name`,
    /// `ssh://` and `file://` URLs, and local paths to bare repositories.
    /// GitHub URLs are normalized to end with `.git`.
    pub fn parse(input: &str, default_owner: Option<&str>) -> Result<Self, LinkError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid("repository name is empty"));
        }

        if is_local_path(input) || input.starts_with("file://") {
            return Ok(Self {
                url: input.to_string(),
                github: None,
            });
        }

        if input.starts_with("ssh://") {
            let parsed = Url::parse(input).map_err(|err| invalid(format!("{input}: {err}")))?;
            let github = github_from_url(&parsed);
            return Ok(Self {
                url: input.to_string(),
                github,
            });
        }

        if input.starts_with("https://") || input.starts_with("http://") {
            return Self::from_http(input);
        }

        if input.contains('@') {
            return Self::from_scp_like(input);
        }

        let segments: Vec<&str> = input.trim_end_matches('/').split('/').collect();
        match segments.as_slice() {
            [name] => {
                let owner = default_owner
                    .map(str::trim)
                    .filter(|owner| !owner.is_empty())
                    .ok_or_else(|| {
                        invalid(format!(
                            "'{name}' has no owner; use owner/{name} or configure default_owner"
                        ))
                    })?;
                Self::github_shorthand(owner, name)
            }
            [owner, name] if !owner.contains('.') => Self::github_shorthand(owner, name),
            _ => Self::from_http(&format!("https://{input}")),
        }
    }

    /// GitHub repository named after `folder`, owned by `owner`.
    pub fn for_folder(folder: &Path, owner: &str) -> Result<Self, LinkError> {
        let name = repo_name_for_folder(folder).ok_or_else(|| {
            invalid(format!(
                "cannot derive a repository name from {}",
                folder.display()
            ))
        })?;
        Self::github_shorthand(owner.trim(), &name)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Filesystem location of a local-path or `file://` remote.
    pub fn local_path(&self) -> Option<PathBuf> {
        if let Some(rest) = self.url.strip_prefix("file://") {
            return Some(PathBuf::from(rest));
        }
        // `~` is left to the shell; git would take it literally.
        (is_local_path(&self.url) && !self.url.starts_with('~')).then(|| PathBuf::from(&self.url))
    }

    pub fn github(&self) -> Option<&GitHubRepo> {
        self.github.as_ref()
    }

    fn github_shorthand(owner: &str, name: &str) -> Result<Self, LinkError> {
        let name = name.strip_suffix(".git").unwrap_or(name);
        validate_segment("owner", owner)?;
        validate_segment("repository name", name)?;
        Ok(Self {
            url: format!("https://{GITHUB_HOST}/{owner}/{name}.git"),
            github: Some(GitHubRepo {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
        })
    }

    fn from_http(input: &str) -> Result<Self, LinkError> {
        let parsed = Url::parse(input).map_err(|err| invalid(format!("{input}: {err}")))?;
        if parsed.host_str().is_none() {
            return Err(invalid(format!("{input}: missing host")));
        }
        let path_is_empty = parsed
            .path_segments()
            .map(|mut segments| segments.all(str::is_empty))
            .unwrap_or(true);
        if path_is_empty {
            return Err(invalid(format!("{input}: missing repository path")));
        }
        let github = github_from_url(&parsed);
        Ok(Self {
            url: with_git_suffix(input),
            github,
        })
    }

    fn from_scp_like(input: &str) -> Result<Self, LinkError> {
        let (user_host, path) = input
            .split_once(':')
            .ok_or_else(|| invalid(format!("{input}: expected user@host:owner/name")))?;
        let host = user_host.rsplit('@').next().unwrap_or(user_host);
        let path = path.trim_matches('/');
        if host.is_empty() || path.is_empty() {
            return Err(invalid(format!("{input}: expected user@host:owner/name")));
        }
        let github = if host.eq_ignore_ascii_case(GITHUB_HOST) {
            github_from_path(path)
        } else {
            None
        };
        Ok(Self {
            url: format!("{user_host}:{}", with_git_suffix(path)),
            github,
        })
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// What the remote-existence check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Absent,
    Empty,
    HasCommits { default_branch: Option<String> },
}

impl RemoteStatus {
    /// True when the local history becomes the remote's initial state.
    pub fn needs_publish(&self) -> bool {
        matches!(self, RemoteStatus::Absent | RemoteStatus::Empty)
    }

    pub fn describe(&self) -> String {
        match self {
            RemoteStatus::Absent => "remote absent".to_string(),
            RemoteStatus::Empty => "remote exists and is empty".to_string(),
            RemoteStatus::HasCommits {
                default_branch: Some(branch),
            } => format!("remote has commits (default branch {branch})"),
            RemoteStatus::HasCommits {
                default_branch: None,
            } => "remote has commits".to_string(),
        }
    }
}

/// Repository name for a folder: its base name, with characters GitHub
/// does not accept replaced by `-`.
pub fn repo_name_for_folder(folder: &Path) -> Option<String> {
    let base = folder.file_name()?.to_str()?;
    let name: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let name = name.trim_matches('-');
    (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
}

fn invalid(message: impl Into<String>) -> LinkError {
    LinkError::new(LinkErrorKind::InvalidRequest, message)
}

fn validate_segment(label: &str, value: &str) -> Result<(), LinkError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(invalid(format!("invalid {label} '{value}'")))
    }
}

fn is_local_path(input: &str) -> bool {
    if input.starts_with('/') || input.starts_with('.') || input.starts_with('~') {
        return true;
    }
    if input.starts_with('\\') {
        return true;
    }
    let bytes = input.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
}

fn with_git_suffix(input: &str) -> String {
    let trimmed = input.trim_end_matches('/');
    if trimmed.ends_with(".git") {
        trimmed.to_string()
    } else {
        format!("{trimmed}.git")
    }
}

fn github_from_url(url: &Url) -> Option<GitHubRepo> {
    let host = url.host_str()?;
    if !host.eq_ignore_ascii_case(GITHUB_HOST) {
        return None;
    }
    github_from_path(url.path())
}

fn github_from_path(path: &str) -> Option<GitHubRepo> {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    match segments.as_slice() {
        [owner, name] => {
            let name = name.strip_suffix(".git").unwrap_or(name);
            if name.is_empty() {
                return None;
            }
            Some(GitHubRepo {
                owner: (*owner).to_string(),
                name: name.to_string(),
            })
        }
        _ => None,
    }
}
