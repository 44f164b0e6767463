use crate::application::repos::StoreError;

pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            StoreError::Timeout
        }
        other => StoreError::from_persistence(other),
    }
}
