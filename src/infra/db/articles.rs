use std::num::NonZeroU32;

use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::application::repos::{ArticleStore, StoreError};
use crate::domain::articles::{ArticleCard, ArticleResource};

use super::PostgresArticles;
use super::util::map_sqlx_error;

const CARD_COLUMNS: &str = "id, author_id, author_name, author_avatar, title, description, \
     cover_url, resources, views, favorites";

#[derive(sqlx::FromRow)]
struct ArticleCardRow {
    id: Uuid,
    author_id: Uuid,
    author_name: String,
    author_avatar: String,
    title: String,
    description: String,
    cover_url: String,
    resources: Json<Vec<ArticleResource>>,
    views: i64,
    favorites: i64,
}

impl From<ArticleCardRow> for ArticleCard {
    fn from(row: ArticleCardRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            author_name: row.author_name,
            author_avatar: row.author_avatar,
            title: row.title,
            description: row.description,
            cover_url: row.cover_url,
            resources: row.resources.0,
            views: row.views,
            favorites: row.favorites,
        }
    }
}

#[async_trait]
impl ArticleStore for PostgresArticles {
    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE deleted = FALSE")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(total.max(0) as u64)
    }

    async fn page(&self, n: NonZeroU32) -> Result<Vec<ArticleCard>, StoreError> {
        let limit = i64::from(self.page_size().get());
        let offset = i64::from(n.get() - 1) * limit;

        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM articles \
             WHERE deleted = FALSE \
             ORDER BY updated_at DESC \
             OFFSET $1 LIMIT $2"
        );

        let rows = sqlx::query_as::<_, ArticleCardRow>(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleCard::from).collect())
    }
}
