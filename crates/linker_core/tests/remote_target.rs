use std::path::{Path, PathBuf};

use linker_core::{
    repo_name_for_folder, GitHubRepo, GitignoreTemplate, InstructionSet, LinkErrorKind, RemoteStatus, RemoteTarget,
};
use pretty_assertions::assert_eq;

fn github(owner: &str, name: &str) -> Option<GitHubRepo> {
    Some(GitHubRepo {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

#[test]
fn owner_slash_name_becomes_github_https() {
    let target = RemoteTarget::parse("  octo/proj  ", None).unwrap();
    assert_eq!(target.url(), "https://github.com/octo/proj.git");
    assert_eq!(target.github().cloned(), github("octo", "proj"));
    assert_eq!(target.github().unwrap().full_name(), "octo/proj");
}

#[test]
fn bare_name_uses_default_owner() {
    let target = RemoteTarget::parse("proj", Some("octo")).unwrap();
    assert_eq!(target.url(), "https://github.com/octo/proj.git");

    let err = RemoteTarget::parse("proj", None).unwrap_err();
    assert_eq!(err.kind, LinkErrorKind::InvalidRequest);
}

#[test]
fn https_urls_gain_git_suffix() {
    let cases = [
        ("https://github.com/octo/proj", "https://github.com/octo/proj.git"),
        ("https://github.com/octo/proj/", "https://github.com/octo/proj.git"),
        ("https://github.com/octo/proj.git", "https://github.com/octo/proj.git"),
        ("github.com/octo/proj", "https://github.com/octo/proj.git"),
    ];
    for (input, expected) in cases {
        let target = RemoteTarget::parse(input, None).unwrap();
        assert_eq!(target.url(), expected, "input {input}");
        assert_eq!(target.github().cloned(), github("octo", "proj"), "input {input}");
    }
}

#[test]
fn non_github_hosts_have_no_slug() {
    let target = RemoteTarget::parse("https://gitlab.com/group/sub/proj", None).unwrap();
    assert_eq!(target.url(), "https://gitlab.com/group/sub/proj.git");
    assert!(target.github().is_none());
}

#[test]
fn scp_like_ssh_is_kept() {
    let target = RemoteTarget::parse("git@github.com:octo/proj", None).unwrap();
    assert_eq!(target.url(), "git@github.com:octo/proj.git");
    assert_eq!(target.github().cloned(), github("octo", "proj"));

    let err = RemoteTarget::parse("git@github.com", None).unwrap_err();
    assert_eq!(err.kind, LinkErrorKind::InvalidRequest);
}

#[test]
fn local_paths_and_file_urls_are_verbatim() {
    for input in ["/srv/git/proj.git", "./remote", "file:///srv/git/proj", "C:\\repos\\proj"] {
        let target = RemoteTarget::parse(input, None).unwrap();
        assert_eq!(target.url(), input);
        assert!(target.github().is_none());
    }
}

#[test]
fn only_filesystem_targets_have_a_local_path() {
    let bare = RemoteTarget::parse("/srv/git/proj.git", None).unwrap();
    assert_eq!(bare.local_path(), Some(PathBuf::from("/srv/git/proj.git")));
    let file = RemoteTarget::parse("file:///srv/git/proj", None).unwrap();
    assert_eq!(file.local_path(), Some(PathBuf::from("/srv/git/proj")));

    for input in ["octo/proj", "git@github.com:octo/proj", "~/git/proj.git"] {
        let target = RemoteTarget::parse(input, None).unwrap();
        assert_eq!(target.local_path(), None, "input {input}");
    }
}

#[test]
fn folder_name_becomes_repository_name() {
    assert_eq!(
        repo_name_for_folder(Path::new("/home/me/my-site")),
        Some("my-site".to_string())
    );
    assert_eq!(
        repo_name_for_folder(Path::new("/home/me/Mi proyecto")),
        Some("Mi-proyecto".to_string())
    );
    assert_eq!(repo_name_for_folder(Path::new("/")), None);

    let target = RemoteTarget::for_folder(Path::new("/home/me/my-site"), "octo").unwrap();
    assert_eq!(target.url(), "https://github.com/octo/my-site.git");
    assert_eq!(target.github().cloned(), github("octo", "my-site"));

    let err = RemoteTarget::for_folder(Path::new("/home/me/my-site"), "Jane Doe").unwrap_err();
    assert_eq!(err.kind, LinkErrorKind::InvalidRequest);
}

#[test]
fn rejects_empty_and_malformed_input() {
    for input in ["", "   ", "octo/pr oj", "https://github.com/"] {
        let err = RemoteTarget::parse(input, Some("octo")).unwrap_err();
        assert_eq!(err.kind, LinkErrorKind::InvalidRequest, "input {input:?}");
    }
}

#[test]
fn instructions_follow_remote_status() {
    assert_eq!(
        InstructionSet::for_status(&RemoteStatus::Absent),
        InstructionSet::NewRepository
    );
    assert_eq!(
        InstructionSet::for_status(&RemoteStatus::Empty),
        InstructionSet::NewRepository
    );
    let existing = InstructionSet::for_status(&RemoteStatus::HasCommits {
        default_branch: None,
    });
    assert_eq!(existing, InstructionSet::ExistingRepository);
    assert!(InstructionSet::NewRepository
        .steps()
        .iter()
        .any(|step| step.contains("Do NOT initialize")));
    assert!(existing.note().contains("conflicts"));
}

#[test]
fn gitignore_templates_resolve_by_name() {
    assert_eq!(
        GitignoreTemplate::from_name("python"),
        Some(GitignoreTemplate::Python)
    );
    assert_eq!(GitignoreTemplate::from_name(" NODE "), Some(GitignoreTemplate::Node));
    assert_eq!(GitignoreTemplate::from_name("cobol"), None);
    assert!(GitignoreTemplate::Rust.contents().contains("/target/"));
}
