use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::db::DatabaseProxy;
use crate::services::content;
use crate::services::directory::{self, CollectionSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub contentnode_id: String,
    pub channel_id: String,
    pub content_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentInput {
    pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct LessonPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<ResourceRef>,
    #[serde(default)]
    pub is_active: bool,
    pub collection: String,
    #[serde(default)]
    pub lesson_assignments: Vec<AssignmentInput>,
}

/// Partial update; omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub resources: Option<Vec<ResourceRef>>,
    pub is_active: Option<bool>,
    pub lesson_assignments: Option<Vec<AssignmentInput>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentDetail {
    pub id: String,
    pub collection: String,
    pub assigned_by: String,
    pub collection_kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LessonDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub resources: Vec<ResourceRef>,
    pub is_active: bool,
    pub collection: String,
    pub classroom: Option<CollectionSummary>,
    pub lesson_assignments: Vec<AssignmentDetail>,
    pub created_by: String,
    pub learner_ids: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LessonError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Set reconciliation between persisted and requested assignment collections.
///
/// Ids in the intersection are left alone so their original assigner
/// attribution survives the write.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssignmentDiff {
    pub to_create: Vec<String>,
    pub to_remove: Vec<String>,
}

pub fn assignment_diff(current: &HashSet<String>, target: &HashSet<String>) -> AssignmentDiff {
    let mut to_create: Vec<String> = target.difference(current).cloned().collect();
    let mut to_remove: Vec<String> = current.difference(target).cloned().collect();
    to_create.sort();
    to_remove.sort();
    AssignmentDiff {
        to_create,
        to_remove,
    }
}

/// Every resource must resolve to an available content node; any miss aborts
/// the whole write.
async fn validate_resources(
    proxy: &DatabaseProxy,
    resources: &[ResourceRef],
) -> Result<(), LessonError> {
    for resource in resources {
        let available = content::resource_available(
            proxy,
            &resource.content_id,
            &resource.channel_id,
            &resource.contentnode_id,
        )
        .await?;
        if !available {
            return Err(LessonError::Validation(
                "One or more of the selected resources is not available".to_string(),
            ));
        }
    }
    Ok(())
}

async fn validate_collection(
    proxy: &DatabaseProxy,
    collection_id: &str,
) -> Result<(), LessonError> {
    if !directory::collection_exists(proxy, collection_id).await? {
        return Err(LessonError::Validation(format!(
            "collection {collection_id} does not exist"
        )));
    }
    Ok(())
}

pub async fn create_lesson(
    proxy: &DatabaseProxy,
    acting_user: &str,
    payload: LessonPayload,
) -> Result<LessonDetail, LessonError> {
    if !directory::facility_user_exists(proxy, acting_user).await? {
        return Err(LessonError::Validation(format!(
            "facility user {acting_user} does not exist"
        )));
    }
    validate_collection(proxy, &payload.collection).await?;
    for assignment in &payload.lesson_assignments {
        validate_collection(proxy, &assignment.collection).await?;
    }
    validate_resources(proxy, &payload.resources).await?;

    let lesson_id = Uuid::new_v4().to_string();
    let resources_json = serde_json::to_value(&payload.resources)
        .map_err(|err| LessonError::Validation(format!("invalid resources payload: {err}")))?;

    sqlx::query(
        r#"
        INSERT INTO lessons (id, title, description, resources, is_active, collection_id, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&lesson_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&resources_json)
    .bind(payload.is_active)
    .bind(&payload.collection)
    .bind(acting_user)
    .execute(proxy.pool())
    .await?;

    // at most one assignment row per (lesson, collection)
    let mut seen = HashSet::new();
    for assignment in &payload.lesson_assignments {
        if seen.insert(assignment.collection.as_str()) {
            insert_assignment(proxy, &lesson_id, &assignment.collection, acting_user).await?;
        }
    }

    get_lesson(proxy, &lesson_id).await
}

pub async fn update_lesson(
    proxy: &DatabaseProxy,
    acting_user: &str,
    lesson_id: &str,
    update: LessonUpdate,
) -> Result<LessonDetail, LessonError> {
    let row = sqlx::query(
        "SELECT title, description, resources, is_active FROM lessons WHERE id = $1",
    )
    .bind(lesson_id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LessonError::NotFound(format!("lesson {lesson_id} does not exist")))?;

    if let Some(resources) = &update.resources {
        validate_resources(proxy, resources).await?;
    }
    if let Some(assignments) = &update.lesson_assignments {
        for assignment in assignments {
            validate_collection(proxy, &assignment.collection).await?;
        }
    }

    let title = update.title.unwrap_or_else(|| row.get("title"));
    let description = update.description.unwrap_or_else(|| row.get("description"));
    let is_active = update.is_active.unwrap_or_else(|| row.get("is_active"));
    let resources_json = match &update.resources {
        Some(resources) => serde_json::to_value(resources)
            .map_err(|err| LessonError::Validation(format!("invalid resources payload: {err}")))?,
        None => row.get("resources"),
    };

    sqlx::query(
        r#"
        UPDATE lessons
        SET title = $2, description = $3, resources = $4, is_active = $5
        WHERE id = $1
        "#,
    )
    .bind(lesson_id)
    .bind(&title)
    .bind(&description)
    .bind(&resources_json)
    .bind(is_active)
    .execute(proxy.pool())
    .await?;

    if let Some(assignments) = update.lesson_assignments {
        reconcile_assignments(proxy, lesson_id, acting_user, &assignments).await?;
    }

    get_lesson(proxy, lesson_id).await
}

/// Applies §4.1-style set reconciliation: create `target - current` stamped
/// with the acting user, delete `current - target`, leave the rest untouched.
async fn reconcile_assignments(
    proxy: &DatabaseProxy,
    lesson_id: &str,
    acting_user: &str,
    assignments: &[AssignmentInput],
) -> Result<(), LessonError> {
    let rows = sqlx::query("SELECT collection_id FROM lesson_assignments WHERE lesson_id = $1")
        .bind(lesson_id)
        .fetch_all(proxy.pool())
        .await?;
    let current: HashSet<String> = rows.iter().map(|row| row.get("collection_id")).collect();
    let target: HashSet<String> = assignments
        .iter()
        .map(|assignment| assignment.collection.clone())
        .collect();

    let diff = assignment_diff(&current, &target);

    for collection_id in &diff.to_create {
        insert_assignment(proxy, lesson_id, collection_id, acting_user).await?;
    }

    for collection_id in &diff.to_remove {
        sqlx::query(
            "DELETE FROM lesson_assignments WHERE lesson_id = $1 AND collection_id = $2",
        )
        .bind(lesson_id)
        .bind(collection_id)
        .execute(proxy.pool())
        .await?;
    }

    Ok(())
}

async fn insert_assignment(
    proxy: &DatabaseProxy,
    lesson_id: &str,
    collection_id: &str,
    assigned_by: &str,
) -> Result<(), LessonError> {
    sqlx::query(
        r#"
        INSERT INTO lesson_assignments (id, lesson_id, collection_id, assigned_by)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(lesson_id)
    .bind(collection_id)
    .bind(assigned_by)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn get_lesson(
    proxy: &DatabaseProxy,
    lesson_id: &str,
) -> Result<LessonDetail, LessonError> {
    let row = sqlx::query(
        r#"
        SELECT id, title, description, resources, is_active, collection_id, created_by
        FROM lessons
        WHERE id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LessonError::NotFound(format!("lesson {lesson_id} does not exist")))?;

    assemble_lesson(proxy, &row).await
}

pub async fn list_lessons(
    proxy: &DatabaseProxy,
    collection_id: Option<&str>,
) -> Result<Vec<LessonDetail>, LessonError> {
    let rows = match collection_id {
        Some(collection_id) => {
            sqlx::query(
                r#"
                SELECT id, title, description, resources, is_active, collection_id, created_by
                FROM lessons
                WHERE collection_id = $1
                ORDER BY title
                "#,
            )
            .bind(collection_id)
            .fetch_all(proxy.pool())
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, title, description, resources, is_active, collection_id, created_by
                FROM lessons
                ORDER BY title
                "#,
            )
            .fetch_all(proxy.pool())
            .await?
        }
    };

    let mut lessons = Vec::with_capacity(rows.len());
    for row in &rows {
        lessons.push(assemble_lesson(proxy, row).await?);
    }
    Ok(lessons)
}

pub async fn delete_lesson(proxy: &DatabaseProxy, lesson_id: &str) -> Result<(), LessonError> {
    sqlx::query("DELETE FROM lesson_assignments WHERE lesson_id = $1")
        .bind(lesson_id)
        .execute(proxy.pool())
        .await?;

    let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
        .bind(lesson_id)
        .execute(proxy.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(LessonError::NotFound(format!(
            "lesson {lesson_id} does not exist"
        )));
    }
    Ok(())
}

async fn assemble_lesson(
    proxy: &DatabaseProxy,
    row: &sqlx::postgres::PgRow,
) -> Result<LessonDetail, LessonError> {
    let lesson_id: String = row.get("id");
    let collection_id: String = row.get("collection_id");

    let resources_json: serde_json::Value = row.get("resources");
    let resources: Vec<ResourceRef> = serde_json::from_value(resources_json)
        .map_err(|err| LessonError::Validation(format!("corrupt resources column: {err}")))?;

    let assignment_rows = sqlx::query(
        r#"
        SELECT a.id, a.collection_id, a.assigned_by, c.kind
        FROM lesson_assignments a
        LEFT JOIN collections c ON c.id = a.collection_id
        WHERE a.lesson_id = $1
        ORDER BY a.collection_id
        "#,
    )
    .bind(&lesson_id)
    .fetch_all(proxy.pool())
    .await?;

    let lesson_assignments: Vec<AssignmentDetail> = assignment_rows
        .iter()
        .map(|row| AssignmentDetail {
            id: row.get("id"),
            collection: row.get("collection_id"),
            assigned_by: row.get("assigned_by"),
            collection_kind: row.get("kind"),
        })
        .collect();

    let assigned_ids: Vec<String> = lesson_assignments
        .iter()
        .map(|assignment| assignment.collection.clone())
        .collect();
    let learner_ids = directory::learner_ids_for_collections(proxy, &assigned_ids).await?;

    let classroom = directory::get_collection(proxy, &collection_id).await?;

    Ok(LessonDetail {
        id: lesson_id,
        title: row.get("title"),
        description: row.get("description"),
        resources,
        is_active: row.get("is_active"),
        collection: collection_id,
        classroom,
        lesson_assignments,
        created_by: row.get("created_by"),
        learner_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_diff_creates_only_new_ids() {
        let diff = assignment_diff(&ids(&["a"]), &ids(&["a", "b", "c"]));
        assert_eq!(diff.to_create, vec!["b".to_string(), "c".to_string()]);
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn test_diff_removes_dropped_ids() {
        let diff = assignment_diff(&ids(&["a", "b"]), &ids(&["b"]));
        assert_eq!(diff.to_remove, vec!["a".to_string()]);
        assert!(diff.to_create.is_empty());
    }

    #[test]
    fn test_diff_leaves_intersection_untouched() {
        let diff = assignment_diff(&ids(&["a", "b"]), &ids(&["b", "c"]));
        assert_eq!(diff.to_create, vec!["c".to_string()]);
        assert_eq!(diff.to_remove, vec!["a".to_string()]);
        assert!(!diff.to_create.contains(&"b".to_string()));
        assert!(!diff.to_remove.contains(&"b".to_string()));
    }

    #[test]
    fn test_diff_empty_target_removes_everything() {
        let diff = assignment_diff(&ids(&["a", "b"]), &ids(&[]));
        assert_eq!(diff.to_remove, vec!["a".to_string(), "b".to_string()]);
        assert!(diff.to_create.is_empty());
    }
}
