use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use linker_core::{GitignoreTemplate, DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE_NAME};
use linker_engine::{
    AtomicFileWriter, CommandGitRunner, GitHubApiProbe, GitHubApiSettings, GitLsRemoteProbe,
    LinkSettings, Linker, RemoteProbe,
};
use linker_logging::linker_info;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "repo_linker.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// `git ls-remote`; works for any remote git can reach
    Git,
    /// GitHub REST API; GitHub repositories only
    Github,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// off, error, warn, info, debug or trace.
    pub level: String,
    /// `None` disables the log file.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("repo_linker.log")),
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level
            .parse()
            .with_context(|| format!("invalid log level '{}'", self.level))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    pub remote_name: String,
    /// Branch for freshly initialized repositories; git's `init.defaultBranch` when unset.
    pub default_branch: Option<String>,
    /// Owner used when only a repository name is given.
    pub default_owner: Option<String>,
    pub commit_message: String,
    /// python, node or rust.
    pub gitignore: Option<String>,
    pub probe: ProbeKind,
    pub git_program: String,
    pub github_api_base: String,
    /// Environment variable holding the GitHub token.
    pub github_token_env: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Visibility of GitHub repositories created for absent remotes.
    pub create_private: bool,
    /// Where run locks live; the system temp dir when unset.
    pub lock_dir: Option<PathBuf>,
    pub allow_unrelated_histories: bool,
    pub log: LogConfig,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        let api = GitHubApiSettings::default();
        Self {
            remote_name: DEFAULT_REMOTE_NAME.to_string(),
            default_branch: None,
            default_owner: None,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            gitignore: None,
            probe: ProbeKind::Git,
            git_program: "git".to_string(),
            github_api_base: api.api_base,
            github_token_env: "GITHUB_TOKEN".to_string(),
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            create_private: api.create_private,
            lock_dir: None,
            allow_unrelated_histories: false,
            log: LogConfig::default(),
        }
    }
}

impl LinkerConfig {
    /// Loads `explicit`, or `./repo_linker.ron` when present, or the defaults.
    ///
    /// Returns the file the values came from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let local = PathBuf::from(CONFIG_FILENAME);
                if !local.exists() {
                    return Ok((Self::default(), None));
                }
                local
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config = Self::from_ron(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok((config, Some(path)))
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::new();
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Writes the defaults to `path`; refuses to replace a file unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<PathBuf> {
        if path.exists() && !force {
            bail!("{} already exists (use --force to replace it)", path.display());
        }
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("{} is not a file path", path.display()))?;
        let content = Self::default().to_ron()?;
        let written = AtomicFileWriter::new(dir).write(filename, &content)?;
        linker_info!("wrote default config to {:?}", written);
        Ok(written)
    }

    fn validate(&self) -> Result<()> {
        if self.remote_name.trim().is_empty() {
            bail!("remote_name must not be empty");
        }
        if self.git_program.trim().is_empty() {
            bail!("git_program must not be empty");
        }
        self.gitignore_template()?;
        self.log.level_filter()?;
        Ok(())
    }

    pub fn gitignore_template(&self) -> Result<Option<GitignoreTemplate>> {
        match self.gitignore.as_deref() {
            None => Ok(None),
            Some(name) => match GitignoreTemplate::from_name(name) {
                Some(template) => Ok(Some(template)),
                None => bail!("unknown gitignore template '{name}' (python, node or rust)"),
            },
        }
    }

    pub fn link_settings(&self) -> LinkSettings {
        let mut settings = LinkSettings {
            allow_unrelated_histories: self.allow_unrelated_histories,
            ..LinkSettings::default()
        };
        if let Some(dir) = &self.lock_dir {
            settings.lock_dir = dir.clone();
        }
        if let Some(branch) = &self.default_branch {
            settings.fallback_branch = branch.clone();
        }
        settings
    }

    pub fn github_settings(&self) -> GitHubApiSettings {
        let token = std::env::var(&self.github_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty());
        if token.is_none() {
            linker_info!(
                "{} is not set; GitHub requests are unauthenticated and repositories cannot be created",
                self.github_token_env
            );
        }
        GitHubApiSettings {
            api_base: self.github_api_base.clone(),
            token,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            create_private: self.create_private,
        }
    }

    pub fn build_linker(&self, probe: ProbeKind) -> Linker {
        let git = Arc::new(CommandGitRunner::new(self.git_program.clone()));
        let github = GitHubApiProbe::new(self.github_settings());
        let probe: Arc<dyn RemoteProbe> = match probe {
            ProbeKind::Git => Arc::new(GitLsRemoteProbe::new(git.clone())),
            ProbeKind::Github => Arc::new(github.clone()),
        };
        Linker::new(git, probe, self.link_settings()).with_github(github)
    }
}
