use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use linker_core::{GitHubRepo, LinkError, LinkErrorKind, RemoteStatus, RemoteTarget};
use linker_logging::{linker_debug, linker_info};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::classify::is_missing_repository;
use crate::repo::failure;
use crate::GitRunner;

/// Answers "does the remote exist, and does it have history?".
#[async_trait::async_trait]
pub trait RemoteProbe: Send + Sync {
    async fn probe(&self, remote: &RemoteTarget, local_path: &Path) -> Result<RemoteStatus, LinkError>;
}

/// Probe through `git ls-remote`, so it works for any transport git speaks.
pub struct GitLsRemoteProbe {
    git: Arc<dyn GitRunner>,
}

impl GitLsRemoteProbe {
    pub fn new(git: Arc<dyn GitRunner>) -> Self {
        Self { git }
    }
}

#[async_trait::async_trait]
impl RemoteProbe for GitLsRemoteProbe {
    async fn probe(&self, remote: &RemoteTarget, local_path: &Path) -> Result<RemoteStatus, LinkError> {
        let args = ["ls-remote", "--symref", remote.url()];
        let output = self.git.run(Some(local_path), &args).await?;
        if !output.success {
            if is_missing_repository(&output.stderr) {
                linker_info!("remote {} not found", remote);
                return Ok(RemoteStatus::Absent);
            }
            return Err(failure(&args, &output));
        }
        Ok(parse_ls_remote(&output.stdout))
    }
}

/// Empty output or only an unborn HEAD symref means no commits.
fn parse_ls_remote(stdout: &str) -> RemoteStatus {
    let mut default_branch = None;
    let mut has_refs = false;
    for line in stdout.lines() {
        let mut fields = line.split('\t');
        let left = fields.next().unwrap_or("").trim();
        let right = fields.next().unwrap_or("").trim();
        if let Some(target) = left.strip_prefix("ref:") {
            if right == "HEAD" {
                default_branch = target
                    .trim()
                    .strip_prefix("refs/heads/")
                    .map(ToOwned::to_owned);
            }
        } else if !left.is_empty() {
            has_refs = true;
        }
    }
    if has_refs {
        RemoteStatus::HasCommits { default_branch }
    } else {
        RemoteStatus::Empty
    }
}

#[derive(Debug, Clone)]
pub struct GitHubApiSettings {
    pub api_base: String,
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Visibility of repositories created for absent remotes.
    pub create_private: bool,
}

impl Default for GitHubApiSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            create_private: true,
        }
    }
}

/// GitHub REST API client: probes repositories, and with a token looks up
/// the account and creates repositories.
#[derive(Debug, Clone)]
pub struct GitHubApiProbe {
    settings: GitHubApiSettings,
}

impl GitHubApiProbe {
    pub fn new(settings: GitHubApiSettings) -> Self {
        Self { settings }
    }

    pub fn has_token(&self) -> bool {
        self.settings.token.is_some()
    }

    /// Login of the account the token belongs to.
    pub async fn authenticated_login(&self) -> Result<String, LinkError> {
        self.require_token("look up the GitHub account")?;
        let client = self.build_client()?;
        let response = self
            .send(client.get(format!("{}/user", self.base())))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "the authenticated user"));
        }
        let json = read_json(response).await?;
        json.get("login")
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| unexpected_response("user has no login"))
    }

    /// Creates `repo` without any files, under the user or under the organization
    /// named by its owner.
    pub async fn create_repository(&self, repo: &GitHubRepo) -> Result<(), LinkError> {
        self.require_token(&format!("create {}", repo.full_name()))?;
        let login = self.authenticated_login().await?;
        let url = if login.eq_ignore_ascii_case(&repo.owner) {
            format!("{}/user/repos", self.base())
        } else {
            format!("{}/orgs/{}/repos", self.base(), repo.owner)
        };
        let body = serde_json::json!({
            "name": repo.name,
            "private": self.settings.create_private,
            "auto_init": false,
        });

        let client = self.build_client()?;
        let response = self
            .send(
                client
                    .post(&url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.to_string()),
            )
            .await?;
        match response.status() {
            status if status.is_success() => {
                linker_info!("created GitHub repository {}", repo.full_name());
                Ok(())
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = response.text().await.unwrap_or_default();
                Err(LinkError::new(
                    LinkErrorKind::Command,
                    format!(
                        "GitHub refused to create {}: {}",
                        repo.full_name(),
                        linker_logging::one_line(&detail)
                    ),
                ))
            }
            status => Err(status_error(status, &repo.full_name())),
        }
    }

    fn base(&self) -> &str {
        self.settings.api_base.trim_end_matches('/')
    }

    fn require_token(&self, action: &str) -> Result<(), LinkError> {
        if self.has_token() {
            Ok(())
        } else {
            Err(LinkError::new(
                LinkErrorKind::Authentication,
                format!("a GitHub token is required to {action}"),
            ))
        }
    }

    fn build_client(&self) -> Result<reqwest::Client, LinkError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .user_agent(concat!("repo-linker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| LinkError::new(LinkErrorKind::Network, err.to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LinkError> {
        let mut request = request.header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.settings.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        linker_debug!("{} {}", response.status(), response.url());
        Ok(response)
    }
}

#[async_trait::async_trait]
impl RemoteProbe for GitHubApiProbe {
    async fn probe(&self, remote: &RemoteTarget, _local_path: &Path) -> Result<RemoteStatus, LinkError> {
        let repo = remote.github().ok_or_else(|| {
            LinkError::new(
                LinkErrorKind::InvalidRequest,
                format!("{remote} is not a GitHub repository; use the git probe"),
            )
        })?;
        let client = self.build_client()?;
        let repo_url = format!("{}/repos/{}/{}", self.base(), repo.owner, repo.name);

        let response = self.send(client.get(&repo_url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(RemoteStatus::Absent),
            status if !status.is_success() => return Err(status_error(status, &repo.full_name())),
            _ => {}
        }
        let json = read_json(response).await?;
        let default_branch = json
            .get("default_branch")
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);

        let commits = self
            .send(client.get(format!("{repo_url}/commits?per_page=1")))
            .await?;
        match commits.status() {
            // GitHub answers 409 Conflict for "Git Repository is empty."
            StatusCode::CONFLICT => Ok(RemoteStatus::Empty),
            status if status.is_success() => Ok(RemoteStatus::HasCommits { default_branch }),
            status => Err(status_error(status, &repo.full_name())),
        }
    }
}

fn status_error(status: StatusCode, full_name: &str) -> LinkError {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LinkErrorKind::Authentication,
        status if status.is_server_error() => LinkErrorKind::Network,
        _ => LinkErrorKind::Command,
    };
    LinkError::new(kind, format!("GitHub API returned {status} for {full_name}"))
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, LinkError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(unexpected_response)
}

fn unexpected_response(detail: impl std::fmt::Display) -> LinkError {
    LinkError::new(
        LinkErrorKind::Command,
        format!("unexpected GitHub API response: {detail}"),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> LinkError {
    LinkError::new(LinkErrorKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ls_remote_with_refs_reports_head_branch() {
        let stdout = "ref: refs/heads/trunk\tHEAD\n\
                      1111111111111111111111111111111111111111\tHEAD\n\
                      1111111111111111111111111111111111111111\trefs/heads/trunk\n";
        assert_eq!(
            parse_ls_remote(stdout),
            RemoteStatus::HasCommits {
                default_branch: Some("trunk".to_string())
            }
        );
    }

    #[test]
    fn ls_remote_unborn_head_is_empty() {
        assert_eq!(parse_ls_remote(""), RemoteStatus::Empty);
        assert_eq!(
            parse_ls_remote("ref: refs/heads/main\tHEAD\n"),
            RemoteStatus::Empty
        );
    }
}
