use std::path::PathBuf;

use crate::RemoteTarget;

pub const DEFAULT_REMOTE_NAME: &str = "origin";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Initial commit";

/// One user-initiated run: which folder goes to which remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    pub local_path: PathBuf,
    pub remote: RemoteTarget,
    pub remote_name: String,
    pub commit_message: String,
    /// Branch to create on a fresh `git init`; `None` defers to git's own default.
    pub branch: Option<String>,
    pub gitignore: Option<GitignoreTemplate>,
}

impl LinkRequest {
    pub fn new(local_path: impl Into<PathBuf>, remote: RemoteTarget) -> Self {
        Self {
            local_path: local_path.into(),
            remote,
            remote_name: DEFAULT_REMOTE_NAME.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            branch: None,
            gitignore: None,
        }
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.commit_message = message;
        }
        self
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn with_remote_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.remote_name = name;
        }
        self
    }

    pub fn with_gitignore(mut self, template: Option<GitignoreTemplate>) -> Self {
        self.gitignore = template;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitignoreTemplate {
    Python,
    Node,
    Rust,
}

impl GitignoreTemplate {
    pub const ALL: [GitignoreTemplate; 3] = [
        GitignoreTemplate::Python,
        GitignoreTemplate::Node,
        GitignoreTemplate::Rust,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GitignoreTemplate::Python => "Python",
            GitignoreTemplate::Node => "Node",
            GitignoreTemplate::Rust => "Rust",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|template| template.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn contents(self) -> &'static str {
        match self {
            GitignoreTemplate::Python => PYTHON,
            GitignoreTemplate::Node => NODE,
            GitignoreTemplate::Rust => RUST,
        }
    }
}

const PYTHON: &str = "\
# Byte-compiled / optimized / DLL files
__pycache__/
*.py[cod]
*$py.class

# Distribution / packaging
dist/
build/
*.egg-info/

# Virtual environments
venv/
env/
.env/

# IDE files
.idea/
.vscode/
*.swp
*.swo

# Logs
*.log

# Local configuration
.env
";

const NODE: &str = "\
# Dependencies
node_modules/
npm-debug.log
yarn-error.log
yarn-debug.log

# Build
dist/
build/

# Environment variables
.env
.env.local
.env.development.local
.env.test.local
.env.production.local

# IDE
.idea/
.vscode/
*.swp
*.swo

# Logs
logs/
*.log

# OS
.DS_Store
Thumbs.db
";

const RUST: &str = "\
# Build output
/target/

# Backup files from rustfmt
**/*.rs.bk

# IDE
.idea/
.vscode/
*.swp

# OS
.DS_Store
Thumbs.db
";
