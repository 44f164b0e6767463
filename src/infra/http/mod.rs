mod articles;
mod middleware;

pub use articles::{ArticleListBody, build_router};

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::application::listing::ListingService;
use crate::infra::db::PostgresArticles;

#[derive(Clone)]
pub struct HttpState {
    pub listing: Arc<ListingService>,
    pub db: Arc<PostgresArticles>,
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
