//! End-to-end runs against real git and local bare remotes.
//!
//! Skipped when no git binary is on PATH.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use linker_core::{LinkErrorKind, LinkPhase, LinkRequest, RemoteStatus, RemoteTarget, StepResult};
use linker_engine::{CommandGitRunner, GitLsRemoteProbe, LinkSettings, Linker, RemoteProbe};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const IDENTITY: &[(&str, &str)] = &[
    ("GIT_AUTHOR_NAME", "Linker Test"),
    ("GIT_AUTHOR_EMAIL", "linker@example.invalid"),
    ("GIT_COMMITTER_NAME", "Linker Test"),
    ("GIT_COMMITTER_EMAIL", "linker@example.invalid"),
    ("GIT_CONFIG_NOSYSTEM", "1"),
];

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Sandbox with its own HOME so user git config cannot leak into the runs.
struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        linker_logging::initialize_for_tests();
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("home")).unwrap();
        fs::create_dir(root.path().join("locks")).unwrap();
        Self { root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn envs(&self) -> Vec<(&'static str, String)> {
        let home = self.path("home").display().to_string();
        let mut envs: Vec<_> = IDENTITY
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        envs.push(("HOME", home.clone()));
        envs.push(("XDG_CONFIG_HOME", home));
        envs
    }

    fn git(&self, dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .envs(self.envs())
            .env("LC_ALL", "C")
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Empty bare repository whose HEAD names `main`.
    fn bare_remote(&self) -> PathBuf {
        let bare = self.path("remote.git");
        self.git(self.root.path(), &["init", "--bare", "remote.git"]);
        self.git(&bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        bare
    }

    fn folder(&self, name: &str) -> PathBuf {
        let folder = self.path(name);
        fs::create_dir(&folder).unwrap();
        folder
    }

    fn runner(&self) -> Arc<CommandGitRunner> {
        let runner = self
            .envs()
            .into_iter()
            .fold(CommandGitRunner::default(), |runner, (k, v)| {
                runner.with_env(k, v)
            });
        Arc::new(runner)
    }

    fn linker(&self) -> Linker {
        let git = self.runner();
        let probe = Arc::new(GitLsRemoteProbe::new(git.clone()));
        let settings = LinkSettings {
            lock_dir: self.path("locks"),
            ..LinkSettings::default()
        };
        Linker::new(git, probe, settings)
    }

    fn request(&self, folder: &Path, bare: &Path) -> LinkRequest {
        let remote = RemoteTarget::parse(&bare.display().to_string(), None).unwrap();
        LinkRequest::new(folder, remote).with_commit_message("Initial commit")
    }

    fn remote_tip(&self, bare: &Path) -> String {
        self.git(bare, &["rev-parse", "refs/heads/main"])
    }
}

fn phases(steps: &[StepResult]) -> Vec<(LinkPhase, bool)> {
    steps.iter().map(|s| (s.phase, s.succeeded)).collect()
}

#[tokio::test]
async fn empty_remote_receives_exactly_one_commit() {
    if !git_available() {
        return;
    }
    let sandbox = Sandbox::new();
    let bare = sandbox.bare_remote();
    let folder = sandbox.folder("project");
    fs::write(folder.join("README.md"), "hello\n").unwrap();

    let steps = sandbox
        .linker()
        .link(sandbox.request(&folder, &bare))
        .await;

    assert_eq!(
        phases(&steps),
        vec![
            (LinkPhase::CheckingRemote, true),
            (LinkPhase::Initializing, true),
            (LinkPhase::Staging, true),
            (LinkPhase::Committing, true),
            (LinkPhase::Pushing, true),
        ]
    );
    assert_eq!(steps[0].message, "remote exists and is empty");
    assert_eq!(sandbox.git(&bare, &["rev-list", "--count", "main"]), "1");
    assert_eq!(sandbox.git(&bare, &["show", "main:README.md"]), "hello");
}

#[tokio::test]
async fn missing_bare_remote_is_created_and_published() {
    if !git_available() {
        return;
    }
    let sandbox = Sandbox::new();
    let bare = sandbox.path("created.git");
    let folder = sandbox.folder("project");
    fs::write(folder.join("README.md"), "hello\n").unwrap();

    let steps = sandbox
        .linker()
        .link(sandbox.request(&folder, &bare))
        .await;

    assert_eq!(
        phases(&steps),
        vec![
            (LinkPhase::CheckingRemote, true),
            (LinkPhase::Initializing, true),
            (LinkPhase::Staging, true),
            (LinkPhase::Committing, true),
            (LinkPhase::Pushing, true),
        ],
        "{steps:?}"
    );
    assert_eq!(steps[0].message, "remote absent");
    assert!(steps[1].message.contains("created bare repository"));
    assert_eq!(sandbox.git(&bare, &["rev-list", "--count", "main"]), "1");
    assert_eq!(sandbox.git(&bare, &["symbolic-ref", "HEAD"]), "refs/heads/main");
    assert_eq!(sandbox.remote_tip(&bare), sandbox.git(&folder, &["rev-parse", "HEAD"]));
}

#[tokio::test]
async fn local_branch_name_does_not_leak_to_remote() {
    if !git_available() {
        return;
    }
    let sandbox = Sandbox::new();
    let bare = sandbox.bare_remote();
    let folder = sandbox.folder("project");
    fs::write(folder.join("README.md"), "hello\n").unwrap();
    let linker = sandbox.linker();
    assert!(linker
        .link(sandbox.request(&folder, &bare))
        .await
        .iter()
        .all(|s| s.succeeded));

    // Same history, but the local branch is now called master.
    sandbox.git(&folder, &["branch", "-m", "main", "master"]);
    fs::write(folder.join("notes.txt"), "local work\n").unwrap();

    let steps = linker.link(sandbox.request(&folder, &bare)).await;

    assert!(steps.iter().all(|s| s.succeeded), "{steps:?}");
    assert_eq!(steps[1].phase, LinkPhase::Reconciling);
    assert!(steps[1].message.contains("pulled origin/main"));
    assert!(steps[4].message.starts_with("pushed to origin/main"));
    assert_eq!(
        sandbox.git(&bare, &["for-each-ref", "--format=%(refname)", "refs/heads"]),
        "refs/heads/main"
    );
    assert_eq!(sandbox.remote_tip(&bare), sandbox.git(&folder, &["rev-parse", "HEAD"]));
    assert_eq!(sandbox.git(&bare, &["show", "main:notes.txt"]), "local work");
}

#[tokio::test]
async fn rerun_without_changes_leaves_remote_tip_unchanged() {
    if !git_available() {
        return;
    }
    let sandbox = Sandbox::new();
    let bare = sandbox.bare_remote();
    let folder = sandbox.folder("project");
    fs::write(folder.join("README.md"), "hello\n").unwrap();
    let linker = sandbox.linker();

    let first = linker.link(sandbox.request(&folder, &bare)).await;
    assert!(first.iter().all(|s| s.succeeded));
    let tip = sandbox.remote_tip(&bare);

    let second = linker.link(sandbox.request(&folder, &bare)).await;

    assert_eq!(
        phases(&second),
        vec![
            (LinkPhase::CheckingRemote, true),
            (LinkPhase::Reconciling, true),
            (LinkPhase::Staging, true),
            (LinkPhase::Committing, true),
            (LinkPhase::Pushing, true),
        ]
    );
    assert_eq!(second[2].message, "nothing to stage");
    assert_eq!(second[3].message, "nothing to commit");
    assert_eq!(sandbox.remote_tip(&bare), tip);
}

#[tokio::test]
async fn probe_sees_history_and_default_branch_after_publish() {
    if !git_available() {
        return;
    }
    let sandbox = Sandbox::new();
    let bare = sandbox.bare_remote();
    let folder = sandbox.folder("project");
    fs::write(folder.join("a.txt"), "a\n").unwrap();
    let probe = GitLsRemoteProbe::new(sandbox.runner());
    let target = RemoteTarget::parse(&bare.display().to_string(), None).unwrap();

    assert_eq!(
        probe.probe(&target, &folder).await.unwrap(),
        RemoteStatus::Empty
    );
    sandbox.linker().link(sandbox.request(&folder, &bare)).await;

    assert_eq!(
        probe.probe(&target, &folder).await.unwrap(),
        RemoteStatus::HasCommits {
            default_branch: Some("main".to_string())
        }
    );
}

#[tokio::test]
async fn divergent_edits_stop_with_conflict_until_resolved() {
    if !git_available() {
        return;
    }
    let sandbox = Sandbox::new();
    let bare = sandbox.bare_remote();
    let folder = sandbox.folder("project");
    fs::write(folder.join("README.md"), "base\n").unwrap();
    let linker = sandbox.linker();
    assert!(linker
        .link(sandbox.request(&folder, &bare))
        .await
        .iter()
        .all(|s| s.succeeded));

    // Someone else pushes a change to the same line.
    let bare_arg = bare.display().to_string();
    sandbox.git(sandbox.root.path(), &["clone", &bare_arg, "other"]);
    let other = sandbox.path("other");
    fs::write(other.join("README.md"), "theirs\n").unwrap();
    sandbox.git(&other, &["commit", "-am", "theirs"]);
    sandbox.git(&other, &["push", "origin", "HEAD:main"]);

    fs::write(folder.join("README.md"), "ours\n").unwrap();
    sandbox.git(&folder, &["commit", "-am", "ours"]);

    let conflicted = linker.link(sandbox.request(&folder, &bare)).await;
    let last = conflicted.last().unwrap();
    assert_eq!(last.phase, LinkPhase::Reconciling);
    assert_eq!(last.error, Some(LinkErrorKind::Conflict));

    // Still mid-merge: refused without touching anything.
    let refused = linker.link(sandbox.request(&folder, &bare)).await;
    assert_eq!(refused.last().unwrap().error, Some(LinkErrorKind::Conflict));

    fs::write(folder.join("README.md"), "merged\n").unwrap();
    sandbox.git(&folder, &["add", "README.md"]);
    sandbox.git(&folder, &["commit", "--no-edit"]);

    let resolved = linker.link(sandbox.request(&folder, &bare)).await;
    assert!(resolved.iter().all(|s| s.succeeded), "{resolved:?}");
    assert_eq!(resolved.last().unwrap().phase, LinkPhase::Pushing);
    assert_eq!(sandbox.git(&bare, &["show", "main:README.md"]), "merged");
}

#[tokio::test]
async fn missing_git_binary_fails_once_without_side_effects() {
    let sandbox = Sandbox::new();
    let folder = sandbox.folder("project");
    let git = Arc::new(CommandGitRunner::new("git-binary-that-does-not-exist"));
    let probe = Arc::new(GitLsRemoteProbe::new(git.clone()));
    let settings = LinkSettings {
        lock_dir: sandbox.path("locks"),
        ..LinkSettings::default()
    };
    let linker = Linker::new(git, probe, settings);
    let remote = RemoteTarget::parse("https://github.com/user/proj", None).unwrap();

    let steps = linker.link(LinkRequest::new(&folder, remote)).await;

    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].phase, LinkPhase::CheckingRemote);
    assert_eq!(steps[0].error, Some(LinkErrorKind::ToolNotFound));
    assert!(!folder.join(".git").exists());
    assert!(!sandbox.path("locks").read_dir().unwrap().any(|_| true));
}
