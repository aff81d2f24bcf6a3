//! Offline attempt reports, accumulated per (student, collection) pair.
//!
//! A submission either inserts a fresh row or merges into the existing one:
//! the attempt counter always increments, time spent accumulates, `attended`
//! resets to the incoming value, and every other scalar takes the incoming
//! value when present. The (student_id, collection_id) lookup distinguishes
//! not-found from store errors; only not-found falls through to insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use crate::db::DatabaseProxy;
use crate::services::directory;

fn default_response() -> serde_json::Value {
    serde_json::json!([])
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfflineReportPayload {
    pub class_id: String,
    pub student_id: String,
    pub number_of_attempt: i32,
    pub course_id: String,
    pub unit_id: String,
    pub lesson_id: String,
    pub collection_id: String,
    #[serde(default)]
    pub collection_type: Option<String>,
    pub content_id: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub time_spent: Option<f64>,
    pub reaction: i32,
    #[serde(default = "default_response")]
    pub student_response: serde_json::Value,
    #[serde(default)]
    pub score: Option<bool>,
    pub created_by: String,
    pub modified_by: String,
    #[serde(default)]
    pub attended: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfflineReport {
    pub id: i64,
    pub class_id: String,
    pub student_id: String,
    pub number_of_attempt: i32,
    pub course_id: String,
    pub unit_id: String,
    pub lesson_id: String,
    pub collection_id: String,
    pub collection_type: Option<String>,
    pub content_id: String,
    pub content_type: Option<String>,
    pub time_spent: f64,
    pub reaction: i32,
    pub student_response: serde_json::Value,
    pub score: bool,
    pub attended: i32,
    pub created_by: String,
    pub modified_by: String,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

pub async fn submit_report(
    proxy: &DatabaseProxy,
    payload: OfflineReportPayload,
) -> Result<OfflineReport, ReportError> {
    if payload.time_spent.is_some_and(|value| value < 0.0) {
        return Err(ReportError::Validation(
            "time_spent must not be negative".to_string(),
        ));
    }

    for user in [&payload.created_by, &payload.modified_by] {
        if !directory::facility_user_exists(proxy, user).await? {
            return Err(ReportError::Validation(format!(
                "facility user {user} does not exist"
            )));
        }
    }

    let existing = fetch_by_student_and_collection(
        proxy,
        &payload.student_id,
        &payload.collection_id,
    )
    .await?;

    match existing {
        None => insert_report(proxy, payload, Utc::now()).await,
        Some(existing) => {
            let merged = merge_submission(&existing, &payload, Utc::now());
            store_merged(proxy, &merged).await?;
            Ok(merged)
        }
    }
}

async fn fetch_by_student_and_collection(
    proxy: &DatabaseProxy,
    student_id: &str,
    collection_id: &str,
) -> Result<Option<OfflineReport>, ReportError> {
    let row = sqlx::query(
        r#"
        SELECT id, class_id, student_id, number_of_attempt, course_id, unit_id,
               lesson_id, collection_id, collection_type, content_id, content_type,
               time_spent, reaction, student_response, score, attended,
               created_by, modified_by, created_date, modified_date
        FROM offline_reports
        WHERE student_id = $1 AND collection_id = $2
        "#,
    )
    .bind(student_id)
    .bind(collection_id)
    .fetch_optional(proxy.pool())
    .await?;

    Ok(row.map(|row| map_row(&row)))
}

async fn insert_report(
    proxy: &DatabaseProxy,
    payload: OfflineReportPayload,
    now: DateTime<Utc>,
) -> Result<OfflineReport, ReportError> {
    let row = sqlx::query(
        r#"
        INSERT INTO offline_reports
          (class_id, student_id, number_of_attempt, course_id, unit_id, lesson_id,
           collection_id, collection_type, content_id, content_type, time_spent,
           reaction, student_response, score, attended, created_by, modified_by,
           created_date, modified_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $18)
        RETURNING id
        "#,
    )
    .bind(&payload.class_id)
    .bind(&payload.student_id)
    .bind(payload.number_of_attempt)
    .bind(&payload.course_id)
    .bind(&payload.unit_id)
    .bind(&payload.lesson_id)
    .bind(&payload.collection_id)
    .bind(&payload.collection_type)
    .bind(&payload.content_id)
    .bind(&payload.content_type)
    .bind(payload.time_spent.unwrap_or(0.0))
    .bind(payload.reaction)
    .bind(&payload.student_response)
    .bind(payload.score.unwrap_or(false))
    .bind(payload.attended.unwrap_or(0))
    .bind(&payload.created_by)
    .bind(&payload.modified_by)
    .bind(now)
    .fetch_one(proxy.pool())
    .await?;

    Ok(OfflineReport {
        id: row.get("id"),
        class_id: payload.class_id,
        student_id: payload.student_id,
        number_of_attempt: payload.number_of_attempt,
        course_id: payload.course_id,
        unit_id: payload.unit_id,
        lesson_id: payload.lesson_id,
        collection_id: payload.collection_id,
        collection_type: payload.collection_type,
        content_id: payload.content_id,
        content_type: payload.content_type,
        time_spent: payload.time_spent.unwrap_or(0.0),
        reaction: payload.reaction,
        student_response: payload.student_response,
        score: payload.score.unwrap_or(false),
        attended: payload.attended.unwrap_or(0),
        created_by: payload.created_by,
        modified_by: payload.modified_by,
        created_date: now,
        modified_date: now,
    })
}

async fn store_merged(proxy: &DatabaseProxy, merged: &OfflineReport) -> Result<(), ReportError> {
    sqlx::query(
        r#"
        UPDATE offline_reports
        SET class_id = $2, number_of_attempt = $3, course_id = $4, unit_id = $5,
            lesson_id = $6, collection_type = $7, content_id = $8, content_type = $9,
            time_spent = $10, reaction = $11, student_response = $12, score = $13,
            attended = $14, created_by = $15, modified_by = $16, modified_date = $17
        WHERE id = $1
        "#,
    )
    .bind(merged.id)
    .bind(&merged.class_id)
    .bind(merged.number_of_attempt)
    .bind(&merged.course_id)
    .bind(&merged.unit_id)
    .bind(&merged.lesson_id)
    .bind(&merged.collection_type)
    .bind(&merged.content_id)
    .bind(&merged.content_type)
    .bind(merged.time_spent)
    .bind(merged.reaction)
    .bind(&merged.student_response)
    .bind(merged.score)
    .bind(merged.attended)
    .bind(&merged.created_by)
    .bind(&merged.modified_by)
    .bind(merged.modified_date)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

/// Merge a repeat submission into the stored row.
///
/// The attempt counter increments unconditionally and time spent accumulates;
/// `attended` resets to the incoming value (0 when omitted) rather than
/// accumulating. The identity pair and creation timestamp never change.
pub fn merge_submission(
    existing: &OfflineReport,
    incoming: &OfflineReportPayload,
    now: DateTime<Utc>,
) -> OfflineReport {
    OfflineReport {
        id: existing.id,
        class_id: incoming.class_id.clone(),
        student_id: existing.student_id.clone(),
        number_of_attempt: existing.number_of_attempt + 1,
        course_id: incoming.course_id.clone(),
        unit_id: incoming.unit_id.clone(),
        lesson_id: incoming.lesson_id.clone(),
        collection_id: existing.collection_id.clone(),
        collection_type: incoming
            .collection_type
            .clone()
            .or_else(|| existing.collection_type.clone()),
        content_id: incoming.content_id.clone(),
        content_type: incoming
            .content_type
            .clone()
            .or_else(|| existing.content_type.clone()),
        time_spent: existing.time_spent + incoming.time_spent.unwrap_or(0.0),
        reaction: incoming.reaction,
        student_response: incoming.student_response.clone(),
        score: incoming.score.unwrap_or(existing.score),
        attended: incoming.attended.unwrap_or(0),
        created_by: incoming.created_by.clone(),
        modified_by: incoming.modified_by.clone(),
        created_date: existing.created_date,
        modified_date: now,
    }
}

fn map_row(row: &sqlx::postgres::PgRow) -> OfflineReport {
    OfflineReport {
        id: row.get("id"),
        class_id: row.get("class_id"),
        student_id: row.get("student_id"),
        number_of_attempt: row.get("number_of_attempt"),
        course_id: row.get("course_id"),
        unit_id: row.get("unit_id"),
        lesson_id: row.get("lesson_id"),
        collection_id: row.get("collection_id"),
        collection_type: row.get("collection_type"),
        content_id: row.get("content_id"),
        content_type: row.get("content_type"),
        time_spent: row.get("time_spent"),
        reaction: row.get("reaction"),
        student_response: row.get("student_response"),
        score: row.get("score"),
        attended: row.get("attended"),
        created_by: row.get("created_by"),
        modified_by: row.get("modified_by"),
        created_date: row.get("created_date"),
        modified_date: row.get("modified_date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_existing() -> OfflineReport {
        OfflineReport {
            id: 7,
            class_id: "class-1".to_string(),
            student_id: "student-1".to_string(),
            number_of_attempt: 3,
            course_id: "course-1".to_string(),
            unit_id: "unit-1".to_string(),
            lesson_id: "lesson-1".to_string(),
            collection_id: "collection-1".to_string(),
            collection_type: Some("classroom".to_string()),
            content_id: "content-1".to_string(),
            content_type: Some("exercise".to_string()),
            time_spent: 120.0,
            reaction: 2,
            student_response: serde_json::json!(["first"]),
            score: false,
            attended: 1,
            created_by: "teacher-1".to_string(),
            modified_by: "teacher-1".to_string(),
            created_date: Utc.timestamp_opt(1_000, 0).unwrap(),
            modified_date: Utc.timestamp_opt(1_000, 0).unwrap(),
        }
    }

    fn sample_incoming() -> OfflineReportPayload {
        OfflineReportPayload {
            class_id: "class-1".to_string(),
            student_id: "student-1".to_string(),
            number_of_attempt: 1,
            course_id: "course-1".to_string(),
            unit_id: "unit-1".to_string(),
            lesson_id: "lesson-2".to_string(),
            collection_id: "collection-1".to_string(),
            collection_type: None,
            content_id: "content-2".to_string(),
            content_type: None,
            time_spent: Some(45.0),
            reaction: 4,
            student_response: serde_json::json!(["second"]),
            score: Some(true),
            created_by: "teacher-2".to_string(),
            modified_by: "teacher-2".to_string(),
            attended: None,
        }
    }

    #[test]
    fn test_merge_increments_attempts_unconditionally() {
        let merged = merge_submission(&sample_existing(), &sample_incoming(), Utc::now());
        // incoming carried number_of_attempt = 1, which is ignored on merge
        assert_eq!(merged.number_of_attempt, 4);
    }

    #[test]
    fn test_merge_accumulates_time_spent() {
        let merged = merge_submission(&sample_existing(), &sample_incoming(), Utc::now());
        assert_eq!(merged.time_spent, 165.0);
    }

    #[test]
    fn test_merge_defaults_time_delta_to_zero() {
        let mut incoming = sample_incoming();
        incoming.time_spent = None;
        let merged = merge_submission(&sample_existing(), &incoming, Utc::now());
        assert_eq!(merged.time_spent, 120.0);
    }

    #[test]
    fn test_merge_resets_attended_to_zero_when_omitted() {
        let merged = merge_submission(&sample_existing(), &sample_incoming(), Utc::now());
        assert_eq!(merged.attended, 0);
    }

    #[test]
    fn test_merge_resets_attended_to_incoming_value() {
        let mut incoming = sample_incoming();
        incoming.attended = Some(5);
        let merged = merge_submission(&sample_existing(), &incoming, Utc::now());
        // a reset, not existing.attended + 5
        assert_eq!(merged.attended, 5);
    }

    #[test]
    fn test_merge_overwrites_scalars_and_keeps_omitted() {
        let merged = merge_submission(&sample_existing(), &sample_incoming(), Utc::now());
        assert_eq!(merged.lesson_id, "lesson-2");
        assert_eq!(merged.content_id, "content-2");
        assert_eq!(merged.reaction, 4);
        assert!(merged.score);
        assert_eq!(merged.student_response, serde_json::json!(["second"]));
        // omitted optionals retain the stored values
        assert_eq!(merged.collection_type.as_deref(), Some("classroom"));
        assert_eq!(merged.content_type.as_deref(), Some("exercise"));
    }

    #[test]
    fn test_merge_preserves_identity_and_creation_date() {
        let now = Utc.timestamp_opt(2_000, 0).unwrap();
        let merged = merge_submission(&sample_existing(), &sample_incoming(), now);
        assert_eq!(merged.id, 7);
        assert_eq!(merged.student_id, "student-1");
        assert_eq!(merged.collection_id, "collection-1");
        assert_eq!(merged.created_date, Utc.timestamp_opt(1_000, 0).unwrap());
        assert_eq!(merged.modified_date, now);
    }
}
