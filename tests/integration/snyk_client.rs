use crate::mocks::snyk::{
    first_targets_page_mock, integrations_mock, migrate_mock, migrate_request,
    next_targets_page_mock, target_json, TOKEN,
};
use futures::TryStreamExt;
use serde_json::json;
use snyk_github_app_migrator::apps;
use snyk_github_app_migrator::config::{RunConfig, SecretToken, Tenant};
use snyk_github_app_migrator::report::{Report, EXIT_MIGRATION_FAILED};
use snyk_github_app_migrator::snyk::{SnykApi, SnykClient};
use snyk_github_app_migrator::error::ApiError;
use snyk_github_app_migrator::types::{AppType, IntegrationType, Outcome, Target, TargetFilter};
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::body_json;
use wiremock::{MockServer, ResponseTemplate};

const ORG: &str = "org-1";

fn client(server: &MockServer) -> SnykClient {
    SnykClient::with_base_url(server.uri(), SecretToken::new(TOKEN)).unwrap()
}

fn config(dry_run: bool) -> RunConfig {
    RunConfig {
        org_id: ORG.to_string(),
        token: SecretToken::new(TOKEN),
        tenant: Tenant::Default,
        target_app_type: AppType::CloudApp,
        dry_run,
        include_github_targets: false,
        verbose: false,
    }
}

#[tokio::test]
async fn lists_integrations_from_v1_map() {
    let mock_server = MockServer::start().await;
    integrations_mock(
        ORG,
        json!({
            "github-enterprise": "int-ghe",
            "github-cloud-app": "int-app",
            "gitlab": "int-gl"
        }),
    )
    .mount(&mock_server)
    .await;

    let integrations = client(&mock_server).list_integrations(ORG).await.unwrap();

    let types: Vec<_> = integrations.iter().map(|x| x.r#type.clone()).collect();
    assert_eq!(
        types,
        vec![
            IntegrationType::GithubCloudApp,
            IntegrationType::GithubEnterprise,
            IntegrationType::Other("gitlab".to_string()),
        ]
    );
    assert_eq!(integrations[1].id, "int-ghe");
}

#[tokio::test]
async fn follows_pagination_links_in_order() {
    let mock_server = MockServer::start().await;
    first_targets_page_mock(
        ORG,
        "github-enterprise",
        vec![target_json("t1", "acme/one", "int-ghe"), target_json("t2", "acme/two", "int-ghe")],
        Some("/orgs/org-1/targets?version=2023-11-27~beta&limit=100&starting_after=c1"),
    )
    .mount(&mock_server)
    .await;
    next_targets_page_mock(
        ORG,
        "c1",
        vec![target_json("t3", "acme/three", "int-ghe")],
        Some("/rest/orgs/org-1/targets?version=2023-11-27~beta&limit=100&starting_after=c2"),
    )
    .mount(&mock_server)
    .await;
    next_targets_page_mock(ORG, "c2", vec![], Some("")).mount(&mock_server).await;

    let client = client(&mock_server);
    let targets: Vec<_> = client
        .list_targets(ORG, TargetFilter::source_type(IntegrationType::GithubEnterprise))
        .try_collect()
        .await
        .unwrap();

    let ids: Vec<_> = targets.iter().map(|x| x.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    assert_eq!(targets[2].display_name, "acme/three");
    assert_eq!(targets[0].integration_id.as_deref(), Some("int-ghe"));
    assert_eq!(targets[0].source_type, Some(IntegrationType::GithubEnterprise));
}

#[tokio::test]
async fn migrate_sends_destination_source_type() {
    let mock_server = MockServer::start().await;
    migrate_request(ORG, "t1")
        .and(body_json(json!({
            "data": { "id": "t1", "attributes": { "source_type": "github-cloud-app" } }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .migrate_target(ORG, "t1", AppType::CloudApp)
        .await
        .unwrap();
}

#[tokio::test]
async fn client_errors_are_permanent_and_carry_detail() {
    let mock_server = MockServer::start().await;
    migrate_mock(
        ORG,
        "t1",
        ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "status": "400", "detail": "invalid source_type" }]
        })),
        1,
    )
    .mount(&mock_server)
    .await;

    let err = client(&mock_server)
        .migrate_target(ORG, "t1", AppType::CloudApp)
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    assert!(err.to_string().contains("invalid source_type"));
}

#[tokio::test]
async fn server_errors_are_retried_once() {
    let mock_server = MockServer::start().await;
    migrate_mock(ORG, "t1", ResponseTemplate::new(503), 2)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .migrate_target(ORG, "t1", AppType::CloudApp)
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn end_to_end_run_against_mock_api() {
    let mock_server = MockServer::start().await;
    integrations_mock(
        ORG,
        json!({ "github-enterprise": "int-ghe", "github-cloud-app": "int-app" }),
    )
    .mount(&mock_server)
    .await;
    first_targets_page_mock(
        ORG,
        "github-enterprise",
        vec![
            target_json("t1", "acme/one", "int-ghe"),
            target_json("t2", "acme/two", "int-ghe"),
            target_json("t3", "acme/three", "int-ghe"),
            target_json("t4", "acme/moved", "int-app"),
        ],
        None,
    )
    .mount(&mock_server)
    .await;
    migrate_mock(ORG, "t1", ResponseTemplate::new(200), 1)
        .mount(&mock_server)
        .await;
    migrate_mock(ORG, "t2", ResponseTemplate::new(409), 1)
        .mount(&mock_server)
        .await;
    migrate_mock(
        ORG,
        "t3",
        ResponseTemplate::new(404).set_body_json(json!({ "message": "Target not found" })),
        1,
    )
    .mount(&mock_server)
    .await;

    let mut report = Report::new();
    apps::run(&client(&mock_server), &config(false), &mut report)
        .await
        .unwrap();

    let outcomes: Vec<_> = report.results().iter().map(|x| x.outcome).collect();
    assert_eq!(
        outcomes,
        vec![Outcome::Migrated, Outcome::Skipped, Outcome::Failed]
    );
    assert_eq!(
        report.results()[2].error_detail.as_deref(),
        Some("HTTP 404 Not Found: Target not found")
    );
    assert!(!report.render().contains(TOKEN));
    assert_eq!(report.exit_code(), EXIT_MIGRATION_FAILED);
}

#[tokio::test]
async fn dry_run_against_mock_api_sends_no_patch() {
    let mock_server = MockServer::start().await;
    integrations_mock(
        ORG,
        json!({ "github-enterprise": "int-ghe", "github-cloud-app": "int-app" }),
    )
    .mount(&mock_server)
    .await;
    first_targets_page_mock(
        ORG,
        "github-enterprise",
        vec![target_json("t1", "acme/one", "int-ghe")],
        None,
    )
    .mount(&mock_server)
    .await;
    migrate_mock(ORG, "t1", ResponseTemplate::new(200), 0)
        .mount(&mock_server)
        .await;

    let mut report = Report::new();
    apps::run(&client(&mock_server), &config(true), &mut report)
        .await
        .unwrap();

    assert_eq!(report.count(Outcome::WouldMigrate), 1);
}

#[tokio::test]
async fn timeouts_are_retried_once() {
    let mock_server = MockServer::start().await;
    migrate_mock(
        ORG,
        "t1",
        ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
        2,
    )
    .mount(&mock_server)
    .await;

    let client = SnykClient::with_timeout(
        mock_server.uri(),
        SecretToken::new(TOKEN),
        Duration::from_millis(100),
    )
    .unwrap();
    let err = client
        .migrate_target(ORG, "t1", AppType::CloudApp)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_api_fails_the_target_with_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = SnykClient::with_timeout(
        format!("http://127.0.0.1:{}", port),
        SecretToken::new(TOKEN),
        Duration::from_secs(2),
    )
    .unwrap();
    let target = Target {
        id: "t1".to_string(),
        display_name: "acme/one".to_string(),
        integration_id: Some("int-ghe".to_string()),
        source_type: Some(IntegrationType::GithubEnterprise),
    };

    let result = apps::migrate_target(&client, &config(false), &target).await;

    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.target_id, "t1");
    let detail = result.error_detail.unwrap();
    assert!(detail.contains("network error"), "{}", detail);
    assert!(!detail.contains(TOKEN));
}
