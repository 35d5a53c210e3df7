use std::path::Path;

use linker_core::{GitHubRepo, LinkErrorKind, RemoteStatus, RemoteTarget};
use linker_engine::{GitHubApiProbe, GitHubApiSettings, RemoteProbe};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn probe_for(server: &MockServer, token: Option<&str>) -> GitHubApiProbe {
    GitHubApiProbe::new(GitHubApiSettings {
        api_base: server.uri(),
        token: token.map(ToOwned::to_owned),
        ..GitHubApiSettings::default()
    })
}

fn target() -> RemoteTarget {
    RemoteTarget::parse("octo/proj", None).unwrap()
}

fn repo(owner: &str) -> GitHubRepo {
    GitHubRepo {
        owner: owner.to_string(),
        name: "proj".to_string(),
    }
}

async fn mount_login(server: &MockServer, login: &str) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "login": login })),
        )
        .mount(server)
        .await;
}

async fn mount_repo(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/repos/octo/proj"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_commits(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/repos/octo/proj/commits"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_repository_is_absent() {
    let server = MockServer::start().await;
    mount_repo(&server, 404, r#"{"message":"Not Found"}"#).await;

    let status = probe_for(&server, None)
        .probe(&target(), Path::new("."))
        .await
        .unwrap();

    assert_eq!(status, RemoteStatus::Absent);
}

#[tokio::test]
async fn repository_with_commits_reports_default_branch() {
    let server = MockServer::start().await;
    mount_repo(&server, 200, r#"{"full_name":"octo/proj","default_branch":"trunk"}"#).await;
    mount_commits(&server, 200, r#"[{"sha":"abc"}]"#).await;

    let status = probe_for(&server, None)
        .probe(&target(), Path::new("."))
        .await
        .unwrap();

    assert_eq!(
        status,
        RemoteStatus::HasCommits {
            default_branch: Some("trunk".to_string())
        }
    );
}

#[tokio::test]
async fn empty_repository_answers_conflict_on_commits() {
    let server = MockServer::start().await;
    mount_repo(&server, 200, r#"{"default_branch":"main"}"#).await;
    mount_commits(&server, 409, r#"{"message":"Git Repository is empty."}"#).await;

    let status = probe_for(&server, None)
        .probe(&target(), Path::new("."))
        .await
        .unwrap();

    assert_eq!(status, RemoteStatus::Empty);
}

#[tokio::test]
async fn rejected_credentials_are_authentication_errors() {
    let server = MockServer::start().await;
    mount_repo(&server, 401, r#"{"message":"Bad credentials"}"#).await;

    let err = probe_for(&server, Some("bad"))
        .probe(&target(), Path::new("."))
        .await
        .unwrap_err();

    assert_eq!(err.kind, LinkErrorKind::Authentication);
    assert!(err.message.contains("octo/proj"));
}

#[tokio::test]
async fn token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/proj"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let status = probe_for(&server, Some("s3cret"))
        .probe(&target(), Path::new("."))
        .await
        .unwrap();

    assert_eq!(status, RemoteStatus::Absent);
}

#[tokio::test]
async fn server_errors_are_network_errors() {
    let server = MockServer::start().await;
    mount_repo(&server, 503, "").await;

    let err = probe_for(&server, None)
        .probe(&target(), Path::new("."))
        .await
        .unwrap_err();

    assert_eq!(err.kind, LinkErrorKind::Network);
}

#[tokio::test]
async fn non_github_targets_are_rejected() {
    let server = MockServer::start().await;
    let remote = RemoteTarget::parse("https://gitlab.com/octo/proj", None).unwrap();

    let err = probe_for(&server, None)
        .probe(&remote, Path::new("."))
        .await
        .unwrap_err();

    assert_eq!(err.kind, LinkErrorKind::InvalidRequest);
}

#[tokio::test]
async fn login_comes_from_user_endpoint() {
    let server = MockServer::start().await;
    mount_login(&server, "octo").await;

    let login = probe_for(&server, Some("t")).authenticated_login().await.unwrap();

    assert_eq!(login, "octo");
}

#[tokio::test]
async fn account_lookup_needs_a_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = probe_for(&server, None).authenticated_login().await.unwrap_err();

    assert_eq!(err.kind, LinkErrorKind::Authentication);
}

#[tokio::test]
async fn own_repository_is_created_under_user() {
    let server = MockServer::start().await;
    mount_login(&server, "Octo").await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(header("authorization", "Bearer t"))
        .and(body_partial_json(serde_json::json!({
            "name": "proj",
            "private": true,
            "auto_init": false,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    probe_for(&server, Some("t"))
        .create_repository(&repo("octo"))
        .await
        .unwrap();
}

#[tokio::test]
async fn other_owner_is_created_as_organization_repository() {
    let server = MockServer::start().await;
    mount_login(&server, "someone").await;
    Mock::given(method("POST"))
        .and(path("/orgs/octo/repos"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    probe_for(&server, Some("t"))
        .create_repository(&repo("octo"))
        .await
        .unwrap();
}

#[tokio::test]
async fn refused_creation_reports_github_message() {
    let server = MockServer::start().await;
    mount_login(&server, "octo").await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_string(
            r#"{"message":"Repository creation failed.","errors":[{"message":"name already exists on this account"}]}"#,
        ))
        .mount(&server)
        .await;

    let err = probe_for(&server, Some("t"))
        .create_repository(&repo("octo"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, LinkErrorKind::Command);
    assert!(err.message.contains("name already exists"));
}
