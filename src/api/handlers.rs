use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::{
    api::models::*, config::Settings, metrics::Metrics, registry::Services, service::Identifier,
    stats::AuthorStats, Error, Result,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub metrics: Arc<Metrics>,
    pub settings: Settings,
}

/// Cached payloads go out exactly as stored
fn json_bytes(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}

/// GET /api/:provider/repos - List repositories
pub async fn list_repos(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<OwnerParams>,
) -> Result<Response> {
    debug!("List repos request: {} owner={:?}", provider, params.owner);

    let service = state.services.get(&provider)?;
    Ok(json_bytes(service.all_repos(&params.owner).await?))
}

/// GET /api/:provider/repo - Get one repository
pub async fn get_repo(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<RepoParams>,
) -> Result<Response> {
    debug!("Get repo request: {} {}", provider, params.id);

    let service = state.services.get(&provider)?;
    let identifier = Identifier::parse(&params.id)?;
    Ok(json_bytes(service.repo(&identifier).await?))
}

/// GET /api/:provider/commits - One page of commits with stats
pub async fn list_commits(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CommitParams>,
) -> Result<Response> {
    debug!("List commits request: {} {:?}", provider, params);

    let service = state.services.get(&provider)?;
    let identifier = Identifier::parse(&params.id)?;
    Ok(json_bytes(
        service
            .project_commits(&identifier, &params.options())
            .await?,
    ))
}

/// GET /api/:provider/contributors - Repository contributors
pub async fn list_contributors(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<RepoParams>,
) -> Result<Response> {
    debug!("List contributors request: {} {}", provider, params.id);

    let service = state.services.get(&provider)?;
    let identifier = Identifier::parse(&params.id)?;
    Ok(json_bytes(service.repo_contributors(&identifier).await?))
}

/// GET /api/:provider/stats - Per-author totals over one page of commits
pub async fn author_stats(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CommitParams>,
) -> Result<Json<AuthorStats>> {
    debug!("Author stats request: {} {:?}", provider, params);

    let service = state.services.get(&provider)?;
    let identifier = Identifier::parse(&params.id)?;
    let stats = service.author_stats(&identifier, &params.options()).await?;
    Ok(Json(stats))
}

/// GET /api/:provider/loc - Total lines of a repository
pub async fn lines_of_code(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<LocParams>,
) -> Result<Response> {
    debug!("Lines of code request: {} {}", provider, params.repo_url);

    let service = state.services.get(&provider)?;
    if params.repo_url.trim().is_empty() {
        return Err(Error::Validation("repoUrl is required".to_string()));
    }
    Ok(json_bytes(service.lines_of_code(params.repo_url.trim()).await?))
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        providers: state.services.iter().map(|s| s.provider()).collect(),
    }))
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    Ok((
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        state.metrics.render()?,
    )
        .into_response())
}
