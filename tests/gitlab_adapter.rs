use gitstats::gitlab::{GitLabConfig, GitLabService};
use gitstats::metrics::{CallStatus, Metrics};
use gitstats::model::{CommitListOptions, CommitStats};
use gitstats::stats::aggregate;
use gitstats::{Error, GitService, Identifier, Provider};
use mockito::{Matcher, Server, ServerGuard};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn service(server: &ServerGuard) -> (GitLabService, Arc<Metrics>) {
    let config = GitLabConfig {
        token: Some("glpat-test".to_string()),
        ..GitLabConfig::with_host(server.url())
    };
    let metrics = Arc::new(Metrics::new().unwrap());
    let service = GitLabService::new(config, metrics.clone()).unwrap();
    (service, metrics)
}

fn project_json(id: i64, namespace: &str, path: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": path,
        "path": path,
        "path_with_namespace": format!("{namespace}/{path}"),
        "description": null,
        "web_url": format!("https://gitlab.example.com/{namespace}/{path}"),
        "http_url_to_repo": format!("https://gitlab.example.com/{namespace}/{path}.git"),
        "namespace": {"path": namespace, "full_path": namespace},
        "created_at": "2021-03-04T05:06:07.000Z",
        "last_activity_at": "2024-02-01T00:00:00.000Z",
        "star_count": 3,
        "forks_count": 1
    })
}

fn commit_json(sha: &str, author: &str, stats: Option<(i64, i64)>) -> serde_json::Value {
    let mut commit = json!({
        "id": sha,
        "message": format!("change {sha}"),
        "author_name": author,
        "author_email": format!("{}@example.com", author.to_lowercase()),
        "authored_date": "2024-01-01T10:00:00.000+02:00",
        "web_url": format!("https://gitlab.example.com/group/app/-/commit/{sha}")
    });
    if let Some((additions, deletions)) = stats {
        commit["stats"] =
            json!({"additions": additions, "deletions": deletions, "total": additions + deletions});
    }
    commit
}

#[tokio::test]
async fn test_get_project_by_encoded_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock(
            "GET",
            Matcher::Regex(r"^/api/v4/projects/group(%2F|/)app$".to_string()),
        )
        .match_header("private-token", "glpat-test")
        .with_status(200)
        .with_body(project_json(99, "group", "app").to_string())
        .create_async()
        .await;

    let (service, metrics) = service(&server);
    let repo = service
        .get_repo(&Identifier::parse("group/app").unwrap())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(repo.id, 99);
    assert_eq!(repo.owner, "group");
    assert_eq!(repo.name, "app");
    assert_eq!(repo.description, "");
    assert_eq!(repo.stars, 3);
    assert_eq!(repo.open_issues, 0);
    assert!(repo.updated_at.is_some());
    assert_eq!(
        metrics.api_call_count(Provider::GitLab, "get_repo", CallStatus::Success),
        1
    );
}

#[tokio::test]
async fn test_get_project_by_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v4/projects/99")
        .with_status(200)
        .with_body(project_json(99, "group", "app").to_string())
        .create_async()
        .await;

    let (service, _) = service(&server);
    let repo = service.get_repo(&Identifier::Id(99)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(repo.full_name(), "group/app");
}

#[tokio::test]
async fn test_missing_project_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v4/projects/5")
        .with_status(404)
        .with_body(r#"{"message":"404 Project Not Found"}"#)
        .create_async()
        .await;

    let (service, _) = service(&server);
    let result = service.get_repo(&Identifier::Id(5)).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_owner_falls_back_from_group_to_user() {
    let mut server = Server::new_async().await;
    let group = server
        .mock("GET", "/api/v4/groups/jane/projects")
        .match_query(Matcher::UrlEncoded("include_subgroups".into(), "true".into()))
        .with_status(404)
        .create_async()
        .await;
    let user = server
        .mock("GET", "/api/v4/users/jane/projects")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!([project_json(1, "jane", "dotfiles")]).to_string())
        .create_async()
        .await;

    let (service, _) = service(&server);
    let repos = service.get_all_repos("jane").await.unwrap();

    group.assert_async().await;
    user.assert_async().await;
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].owner, "jane");
}

#[tokio::test]
async fn test_empty_owner_lists_memberships() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v4/projects")
        .match_query(Matcher::UrlEncoded("membership".into(), "true".into()))
        .with_status(200)
        .with_body(json!([project_json(1, "group", "app"), project_json(2, "group", "lib")]).to_string())
        .create_async()
        .await;

    let (service, _) = service(&server);
    let repos = service.get_all_repos("").await.unwrap();

    mock.assert_async().await;
    assert_eq!(repos.len(), 2);
}

#[tokio::test]
async fn test_inline_stats_used_and_missing_ones_fetched() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v4/projects/99")
        .with_status(200)
        .with_body(project_json(99, "group", "app").to_string())
        .create_async()
        .await;
    let listing = server
        .mock("GET", "/api/v4/projects/99/repository/commits")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("with_stats".into(), "true".into()),
            Matcher::UrlEncoded("ref_name".into(), "main".into()),
            Matcher::UrlEncoded("per_page".into(), "20".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(
            json!([
                commit_json("c1", "Alice", Some((10, 2))),
                commit_json("c2", "Bob", None),
                commit_json("c3", "Alice", Some((3, 1))),
                commit_json("c4", "Carol", None),
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let c2 = server
        .mock("GET", "/api/v4/projects/99/repository/commits/c2")
        .with_status(200)
        .with_body(commit_json("c2", "Bob", Some((5, 1))).to_string())
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v4/projects/99/repository/commits/c4")
        .with_status(200)
        .with_body(commit_json("c4", "Carol", None).to_string())
        .create_async()
        .await;

    let (service, metrics) = service(&server);
    let options = CommitListOptions {
        sha: "main".to_string(),
        page: 2,
        per_page: 20,
        ..Default::default()
    };
    let commits = service
        .get_project_commits(&Identifier::Id(99), &options)
        .await
        .unwrap();

    listing.assert_async().await;
    c2.assert_async().await;

    let stats: Vec<_> = commits.iter().map(|c| c.stats).collect();
    assert_eq!(
        stats,
        vec![
            CommitStats::new(10, 2, 12),
            CommitStats::new(5, 1, 6),
            CommitStats::new(3, 1, 4),
            CommitStats::default(),
        ]
    );
    assert_eq!(metrics.snapshot().stat_fallbacks, 1);

    let totals = aggregate(&commits);
    assert_eq!(totals["Alice"], CommitStats::new(13, 3, 16));
    assert_eq!(totals["Bob"], CommitStats::new(5, 1, 6));
    assert_eq!(totals["Carol"], CommitStats::default());
}

#[tokio::test]
async fn test_contributors_carry_only_names() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v4/projects/99")
        .with_status(200)
        .with_body(project_json(99, "group", "app").to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/v4/projects/99/repository/contributors")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                {"name": "Alice", "email": "alice@example.com", "commits": 12, "additions": 0, "deletions": 0},
                {"name": "Bob", "email": "bob@example.com", "commits": 1, "additions": 0, "deletions": 0}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let (service, _) = service(&server);
    let users = service
        .get_repo_contributors(&Identifier::Id(99))
        .await
        .unwrap();

    let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert!(users.iter().all(|u| u.login.is_empty() && u.id == 0));
}

#[tokio::test]
async fn test_auth_failure_is_upstream() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v4/projects")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"401 Unauthorized"}"#)
        .create_async()
        .await;

    let (service, metrics) = service(&server);
    let result = service.get_all_repos("").await;

    assert!(matches!(result, Err(Error::Upstream(_))));
    assert_eq!(
        metrics.api_call_count(Provider::GitLab, "list_repos", CallStatus::Failure),
        1
    );
}
