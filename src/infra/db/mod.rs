//! Postgres-backed article store.

mod articles;
mod util;

pub use util::map_sqlx_error;

use std::{num::NonZeroU32, sync::Arc};

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

/// Connection pool wrapper implementing the paginated-read primitive.
#[derive(Clone)]
pub struct PostgresArticles {
    pool: Arc<PgPool>,
    page_size: NonZeroU32,
}

impl PostgresArticles {
    pub fn new(pool: PgPool, page_size: NonZeroU32) -> Self {
        Self {
            pool: Arc::new(pool),
            page_size,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}
