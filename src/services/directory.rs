//! Lookups against the collection/facility-user directory.
//!
//! The directory is owned by the surrounding platform; this service only
//! reads it for validation and for assembling lesson serializations.

use serde::Serialize;
use sqlx::{QueryBuilder, Row};

use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub parent: Option<String>,
}

pub async fn get_collection(
    proxy: &DatabaseProxy,
    collection_id: &str,
) -> Result<Option<CollectionSummary>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, name, kind, parent_id
        FROM collections
        WHERE id = $1
        "#,
    )
    .bind(collection_id)
    .fetch_optional(proxy.pool())
    .await?;

    Ok(row.map(|row| CollectionSummary {
        id: row.get("id"),
        name: row.get("name"),
        kind: row.get("kind"),
        parent: row.get("parent_id"),
    }))
}

pub async fn collection_exists(
    proxy: &DatabaseProxy,
    collection_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM collections WHERE id = $1")
        .bind(collection_id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.is_some())
}

pub async fn facility_user_exists(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM facility_users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.is_some())
}

/// Distinct member ids across a set of collections, for the `learner_ids`
/// field of a lesson serialization.
pub async fn learner_ids_for_collections(
    proxy: &DatabaseProxy,
    collection_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    if collection_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<sqlx::Postgres>::new(
        "SELECT DISTINCT user_id FROM memberships WHERE collection_id IN (",
    );
    {
        let mut sep = qb.separated(", ");
        for id in collection_ids {
            sep.push_bind(id);
        }
    }
    qb.push(") ORDER BY user_id");

    let rows = qb.build().fetch_all(proxy.pool()).await?;
    Ok(rows.iter().map(|row| row.get("user_id")).collect())
}
