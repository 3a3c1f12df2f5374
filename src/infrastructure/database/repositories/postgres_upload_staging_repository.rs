use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::UploadStaging;
use crate::domain::repositories::{UploadStagingError, UploadStagingRepository};
use crate::infrastructure::database::models::UploadModel;
use crate::infrastructure::database::schema::ai_uploads_temp::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresUploadStagingRepository {
    pool: DbPool,
}

impl PostgresUploadStagingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, UploadStagingError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, UploadStagingError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection_from_pool(&pool)
                .map_err(|e| UploadStagingError::DatabaseError(e.to_string()))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| UploadStagingError::DatabaseError(e.to_string()))?
    }
}

fn to_domain(model: UploadModel) -> Result<UploadStaging, UploadStagingError> {
    UploadStaging::try_from(model).map_err(|e| UploadStagingError::SerializationError(e.to_string()))
}

#[async_trait]
impl UploadStagingRepository for PostgresUploadStagingRepository {
    async fn save(&self, staging: &UploadStaging) -> Result<(), UploadStagingError> {
        let row = UploadModel::try_from(staging)
            .map_err(|e| UploadStagingError::SerializationError(e.to_string()))?;

        self.with_connection(move |conn| {
            diesel::insert_into(ai_uploads_temp)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| UploadStagingError::DatabaseError(e.to_string()))
        })
        .await
    }

    async fn find(&self, id: Uuid) -> Result<Option<UploadStaging>, UploadStagingError> {
        let model = self
            .with_connection(move |conn| {
                ai_uploads_temp
                    .find(id)
                    .select(UploadModel::as_select())
                    .first(conn)
                    .optional()
                    .map_err(|e| UploadStagingError::DatabaseError(e.to_string()))
            })
            .await?;

        model.map(to_domain).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, UploadStagingError> {
        self.with_connection(move |conn| {
            diesel::delete(ai_uploads_temp.find(id))
                .execute(conn)
                .map(|deleted| deleted > 0)
                .map_err(|e| UploadStagingError::DatabaseError(e.to_string()))
        })
        .await
    }

    async fn take(&self, id: Uuid) -> Result<Option<UploadStaging>, UploadStagingError> {
        let model = self
            .with_connection(move |conn| {
                diesel::delete(ai_uploads_temp.find(id))
                    .returning(UploadModel::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(|e| UploadStagingError::DatabaseError(e.to_string()))
            })
            .await?;

        model.map(to_domain).transpose()
    }

    async fn find_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<UploadStaging>, UploadStagingError> {
        let models = self
            .with_connection(move |conn| {
                ai_uploads_temp
                    .filter(expires_at.le(now))
                    .select(UploadModel::as_select())
                    .order(expires_at.asc())
                    .load(conn)
                    .map_err(|e| UploadStagingError::DatabaseError(e.to_string()))
            })
            .await?;

        models.into_iter().map(to_domain).collect()
    }
}
