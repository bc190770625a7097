use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
    routing::get,
    Router,
};
use repofetch_core::{merge_repositories, run_query, RepoPage, RepoQuery, RepoQueryParams};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::request_log::{CorrelationId, CORRELATION_ID_HEADER};
use crate::AppState;

/// `GET /api/repos`: the installation's repositories merged with stored
/// metadata, filtered, sorted and paginated.
///
/// An inbound `X-Correlation-ID` is reused for the upstream GitHub calls.
pub async fn list_repos_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<RepoQueryParams>,
) -> Result<Json<RepoPage>, AppError> {
    let correlation_id = headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| CorrelationId(v.to_string()))
        .unwrap_or_else(CorrelationId::generate);

    let Some(installation_id) = state.installation_id else {
        warn!("Rejecting repository listing: GITHUB_INSTALLATION_ID is not configured");
        return Err(AppError::InstallationIdMissing);
    };

    let query = RepoQuery::from_params(&params);

    let repositories = state
        .fetcher
        .fetch_repositories(installation_id, &correlation_id)
        .await
        .map_err(|e| {
            error!(
                installation_id,
                correlation_id = %correlation_id,
                "Failed to fetch repositories: {:#}",
                e
            );
            AppError::Upstream(e)
        })?;

    let metadata = state.store.all().await?;
    let merged = merge_repositories(repositories, &metadata);
    let page = run_query(merged, &query);

    info!(
        installation_id,
        correlation_id = %correlation_id,
        total = page.total,
        filtered = page.filtered,
        page = page.page,
        per_page = page.per_page,
        sort = ?query.sort,
        order = query.order.as_str(),
        "Listed repositories"
    );

    Ok(Json(page))
}

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/repos", get(list_repos_handler))
}
