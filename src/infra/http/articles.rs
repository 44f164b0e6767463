use std::num::NonZeroU32;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Response,
    routing::get,
};
use serde::Serialize;

use crate::{
    application::{
        error::HttpError,
        listing::{ListingError, PageSource},
    },
    domain::articles::ArticleCard,
};

use super::{HttpState, db_health_response, middleware::log_responses};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/articles/{page}", get(list_articles))
        .route("/_health/db", get(db_health))
        .layer(middleware::from_fn(log_responses))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ArticleListBody {
    pub articles: Vec<ArticleCard>,
    pub source: PageSource,
}

/// Serve one listing page.
///
/// The path segment is validated here, before the listing core is reached:
/// the core assumes a positive integer page number.
async fn list_articles(
    State(state): State<HttpState>,
    Path(page): Path<String>,
) -> Result<Json<ArticleListBody>, HttpError> {
    let page: NonZeroU32 = page.parse().map_err(|_| {
        HttpError::new(
            "http::articles",
            StatusCode::BAD_REQUEST,
            "page number must be a positive integer",
            format!("rejected page path segment `{page}`"),
        )
    })?;

    let listing = state
        .listing
        .get_page(page)
        .await
        .map_err(listing_error_to_http)?;

    Ok(Json(ArticleListBody {
        articles: listing.articles,
        source: listing.source,
    }))
}

fn listing_error_to_http(err: ListingError) -> HttpError {
    // both layers of the listing path collapse into one failure kind
    HttpError::from_error(
        "http::articles",
        StatusCode::SERVICE_UNAVAILABLE,
        "article store unavailable",
        &err,
    )
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}
