//! Availability checks against the content-node catalog.
//!
//! The catalog is maintained by the content import machinery elsewhere; a
//! resource reference is valid only if a node matching all three identifiers
//! is currently available.

use crate::db::DatabaseProxy;

pub async fn resource_available(
    proxy: &DatabaseProxy,
    content_id: &str,
    channel_id: &str,
    node_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT 1
        FROM content_nodes
        WHERE content_id = $1
          AND channel_id = $2
          AND id = $3
          AND available = TRUE
        "#,
    )
    .bind(content_id)
    .bind(channel_id)
    .bind(node_id)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.is_some())
}
