use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::db::DatabaseProxy;
use crate::services::directory::{self, CollectionSummary};

#[derive(Debug, Deserialize)]
pub struct ClassChannelPayload {
    pub collection: String,
    pub channel_id: String,
    pub assigned_by: String,
}

/// Partial update; omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct ClassChannelUpdate {
    pub collection: Option<String>,
    pub channel_id: Option<String>,
    pub assigned_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassChannelDetail {
    pub id: String,
    pub classroom: Option<CollectionSummary>,
    pub collection: String,
    pub channel_id: String,
    pub assigned_by: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassChannelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

pub async fn create_class_channel(
    proxy: &DatabaseProxy,
    payload: ClassChannelPayload,
) -> Result<ClassChannelDetail, ClassChannelError> {
    if !directory::collection_exists(proxy, &payload.collection).await? {
        return Err(ClassChannelError::Validation(format!(
            "collection {} does not exist",
            payload.collection
        )));
    }
    if !directory::facility_user_exists(proxy, &payload.assigned_by).await? {
        return Err(ClassChannelError::Validation(format!(
            "facility user {} does not exist",
            payload.assigned_by
        )));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO class_channels (id, collection_id, channel_id, assigned_by)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(&id)
    .bind(&payload.collection)
    .bind(&payload.channel_id)
    .bind(&payload.assigned_by)
    .execute(proxy.pool())
    .await?;

    get_class_channel(proxy, &id).await
}

pub async fn update_class_channel(
    proxy: &DatabaseProxy,
    id: &str,
    update: ClassChannelUpdate,
) -> Result<ClassChannelDetail, ClassChannelError> {
    let row = sqlx::query(
        "SELECT collection_id, channel_id, assigned_by FROM class_channels WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| ClassChannelError::NotFound(format!("class channel {id} does not exist")))?;

    if let Some(collection) = &update.collection {
        if !directory::collection_exists(proxy, collection).await? {
            return Err(ClassChannelError::Validation(format!(
                "collection {collection} does not exist"
            )));
        }
    }
    if let Some(assigned_by) = &update.assigned_by {
        if !directory::facility_user_exists(proxy, assigned_by).await? {
            return Err(ClassChannelError::Validation(format!(
                "facility user {assigned_by} does not exist"
            )));
        }
    }

    let collection = update
        .collection
        .unwrap_or_else(|| row.get("collection_id"));
    let channel_id = update.channel_id.unwrap_or_else(|| row.get("channel_id"));
    let assigned_by = update.assigned_by.unwrap_or_else(|| row.get("assigned_by"));

    sqlx::query(
        r#"
        UPDATE class_channels
        SET collection_id = $2, channel_id = $3, assigned_by = $4
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&collection)
    .bind(&channel_id)
    .bind(&assigned_by)
    .execute(proxy.pool())
    .await?;

    get_class_channel(proxy, id).await
}

pub async fn get_class_channel(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<ClassChannelDetail, ClassChannelError> {
    let row = sqlx::query(
        "SELECT id, collection_id, channel_id, assigned_by FROM class_channels WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| ClassChannelError::NotFound(format!("class channel {id} does not exist")))?;

    assemble(proxy, &row).await
}

pub async fn list_class_channels(
    proxy: &DatabaseProxy,
    collection_id: Option<&str>,
) -> Result<Vec<ClassChannelDetail>, ClassChannelError> {
    let rows = match collection_id {
        Some(collection_id) => {
            sqlx::query(
                r#"
                SELECT id, collection_id, channel_id, assigned_by
                FROM class_channels
                WHERE collection_id = $1
                ORDER BY channel_id
                "#,
            )
            .bind(collection_id)
            .fetch_all(proxy.pool())
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, collection_id, channel_id, assigned_by
                FROM class_channels
                ORDER BY collection_id, channel_id
                "#,
            )
            .fetch_all(proxy.pool())
            .await?
        }
    };

    let mut channels = Vec::with_capacity(rows.len());
    for row in &rows {
        channels.push(assemble(proxy, row).await?);
    }
    Ok(channels)
}

pub async fn delete_class_channel(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<(), ClassChannelError> {
    let result = sqlx::query("DELETE FROM class_channels WHERE id = $1")
        .bind(id)
        .execute(proxy.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ClassChannelError::NotFound(format!(
            "class channel {id} does not exist"
        )));
    }
    Ok(())
}

async fn assemble(
    proxy: &DatabaseProxy,
    row: &sqlx::postgres::PgRow,
) -> Result<ClassChannelDetail, ClassChannelError> {
    let collection_id: String = row.get("collection_id");
    let classroom = directory::get_collection(proxy, &collection_id).await?;

    Ok(ClassChannelDetail {
        id: row.get("id"),
        classroom,
        collection: collection_id,
        channel_id: row.get("channel_id"),
        assigned_by: row.get("assigned_by"),
    })
}
