//! Exam logs and their attempt records.
//!
//! `progress` and `score` on an exam log are read-time values: progress is
//! the question count of the related exam, score is the sum of `correct`
//! over the latest attempt per distinct item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::db::DatabaseProxy;

fn default_array() -> serde_json::Value {
    serde_json::json!([])
}

#[derive(Debug, thiserror::Error)]
pub enum ExamLogError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct ExamLogPayload {
    pub exam: String,
    pub user: String,
    #[serde(default)]
    pub closed: bool,
}

/// Partial update. `completion_timestamp` is read-only and stamped
/// server-side when `closed` flips to true.
#[derive(Debug, Default, Deserialize)]
pub struct ExamLogUpdate {
    pub closed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ExamLogDetail {
    pub id: String,
    pub exam: String,
    pub user: String,
    pub closed: bool,
    pub progress: i32,
    pub score: f64,
    pub completion_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ExamAttemptLogPayload {
    pub examlog: String,
    pub user: String,
    pub content_id: String,
    pub channel_id: String,
    pub item: String,
    pub start_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub correct: f64,
    #[serde(default)]
    pub hinted: bool,
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
    #[serde(default)]
    pub simple_answer: String,
    #[serde(default = "default_array")]
    pub interaction_history: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ExamAttemptLogDetail {
    pub id: String,
    pub examlog: String,
    pub user: String,
    pub content_id: String,
    pub channel_id: String,
    pub item: String,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub completion_timestamp: Option<DateTime<Utc>>,
    pub time_spent: f64,
    pub complete: bool,
    pub correct: f64,
    pub hinted: bool,
    pub answer: Option<serde_json::Value>,
    pub simple_answer: String,
    pub interaction_history: serde_json::Value,
}

pub async fn create_exam_log(
    proxy: &DatabaseProxy,
    payload: ExamLogPayload,
) -> Result<ExamLogDetail, ExamLogError> {
    let exam_exists = sqlx::query("SELECT 1 FROM exams WHERE id = $1")
        .bind(&payload.exam)
        .fetch_optional(proxy.pool())
        .await?
        .is_some();
    if !exam_exists {
        return Err(ExamLogError::Validation(format!(
            "exam {} does not exist",
            payload.exam
        )));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO exam_logs (id, exam_id, user_id, closed, completion_timestamp)
        VALUES ($1, $2, $3, $4, NULL)
        "#,
    )
    .bind(&id)
    .bind(&payload.exam)
    .bind(&payload.user)
    .bind(payload.closed)
    .execute(proxy.pool())
    .await?;

    get_exam_log(proxy, &id).await
}

pub async fn update_exam_log(
    proxy: &DatabaseProxy,
    id: &str,
    update: ExamLogUpdate,
) -> Result<ExamLogDetail, ExamLogError> {
    let row = sqlx::query("SELECT closed FROM exam_logs WHERE id = $1")
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?
        .ok_or_else(|| ExamLogError::NotFound(format!("exam log {id} does not exist")))?;

    let was_closed: bool = row.get("closed");
    let closed = update.closed.unwrap_or(was_closed);

    if closed && !was_closed {
        sqlx::query("UPDATE exam_logs SET closed = $2, completion_timestamp = $3 WHERE id = $1")
            .bind(id)
            .bind(closed)
            .bind(Utc::now())
            .execute(proxy.pool())
            .await?;
    } else {
        sqlx::query("UPDATE exam_logs SET closed = $2 WHERE id = $1")
            .bind(id)
            .bind(closed)
            .execute(proxy.pool())
            .await?;
    }

    get_exam_log(proxy, id).await
}

pub async fn get_exam_log(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<ExamLogDetail, ExamLogError> {
    let row = sqlx::query(
        r#"
        SELECT l.id, l.exam_id, l.user_id, l.closed, l.completion_timestamp,
               e.question_count
        FROM exam_logs l
        JOIN exams e ON e.id = l.exam_id
        WHERE l.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| ExamLogError::NotFound(format!("exam log {id} does not exist")))?;

    let attempts = fetch_item_attempts(proxy, id).await?;
    let score = exam_score(&attempts);

    Ok(ExamLogDetail {
        id: row.get("id"),
        exam: row.get("exam_id"),
        user: row.get("user_id"),
        closed: row.get("closed"),
        progress: row.get("question_count"),
        score,
        completion_timestamp: row.get("completion_timestamp"),
    })
}

pub async fn create_exam_attempt_log(
    proxy: &DatabaseProxy,
    payload: ExamAttemptLogPayload,
) -> Result<ExamAttemptLogDetail, ExamLogError> {
    let exam_log = sqlx::query("SELECT user_id FROM exam_logs WHERE id = $1")
        .bind(&payload.examlog)
        .fetch_optional(proxy.pool())
        .await?
        .ok_or_else(|| ExamLogError::Validation("Invalid exam log".to_string()))?;

    let exam_log_user: String = exam_log.get("user_id");
    if exam_log_user != payload.user {
        return Err(ExamLogError::Validation(
            "User field and user for related exam log are not the same".to_string(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO exam_attempt_logs
          (id, exam_log_id, user_id, content_id, channel_id, item, start_timestamp,
           end_timestamp, completion_timestamp, time_spent, complete, correct,
           hinted, answer, simple_answer, interaction_history)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(&id)
    .bind(&payload.examlog)
    .bind(&payload.user)
    .bind(&payload.content_id)
    .bind(&payload.channel_id)
    .bind(&payload.item)
    .bind(payload.start_timestamp)
    .bind(payload.end_timestamp)
    .bind(payload.completion_timestamp)
    .bind(payload.time_spent)
    .bind(payload.complete)
    .bind(payload.correct)
    .bind(payload.hinted)
    .bind(&payload.answer)
    .bind(&payload.simple_answer)
    .bind(&payload.interaction_history)
    .execute(proxy.pool())
    .await?;

    Ok(ExamAttemptLogDetail {
        id,
        examlog: payload.examlog,
        user: payload.user,
        content_id: payload.content_id,
        channel_id: payload.channel_id,
        item: payload.item,
        start_timestamp: payload.start_timestamp,
        end_timestamp: payload.end_timestamp,
        completion_timestamp: payload.completion_timestamp,
        time_spent: payload.time_spent,
        complete: payload.complete,
        correct: payload.correct,
        hinted: payload.hinted,
        answer: payload.answer,
        simple_answer: payload.simple_answer,
        interaction_history: payload.interaction_history,
    })
}

// ---------------------------------------------------------------------------
// Score computation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ItemAttempt {
    pub item: String,
    pub correct: f64,
    pub completion_timestamp: Option<DateTime<Utc>>,
}

async fn fetch_item_attempts(
    proxy: &DatabaseProxy,
    exam_log_id: &str,
) -> Result<Vec<ItemAttempt>, ExamLogError> {
    let rows = sqlx::query(
        r#"
        SELECT item, correct, completion_timestamp
        FROM exam_attempt_logs
        WHERE exam_log_id = $1
        "#,
    )
    .bind(exam_log_id)
    .fetch_all(proxy.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|row| ItemAttempt {
            item: row.get("item"),
            correct: row.get("correct"),
            completion_timestamp: row.get("completion_timestamp"),
        })
        .collect())
}

/// Sum of `correct` over the latest attempt per distinct item, where latest
/// is decided by completion timestamp. Attempts without a completion
/// timestamp lose to any that have one.
pub fn exam_score(attempts: &[ItemAttempt]) -> f64 {
    use std::collections::HashMap;

    let mut latest: HashMap<&str, (Option<DateTime<Utc>>, f64)> = HashMap::new();
    for attempt in attempts {
        let replace = match latest.get(attempt.item.as_str()) {
            Some((existing_ts, _)) => attempt.completion_timestamp >= *existing_ts,
            None => true,
        };
        if replace {
            latest.insert(
                attempt.item.as_str(),
                (attempt.completion_timestamp, attempt.correct),
            );
        }
    }
    latest.values().map(|(_, correct)| correct).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(seconds: i64) -> Option<DateTime<Utc>> {
        Some(Utc.timestamp_opt(seconds, 0).unwrap())
    }

    fn attempt(item: &str, correct: f64, completion: Option<DateTime<Utc>>) -> ItemAttempt {
        ItemAttempt {
            item: item.to_string(),
            correct,
            completion_timestamp: completion,
        }
    }

    #[test]
    fn test_score_uses_latest_attempt_per_item() {
        let attempts = vec![
            attempt("a", 1.0, ts(1)),
            attempt("a", 0.0, ts(2)),
            attempt("b", 1.0, ts(3)),
        ];
        // item a's latest attempt is incorrect, so only b counts
        assert_eq!(exam_score(&attempts), 1.0);
    }

    #[test]
    fn test_score_empty_attempts() {
        assert_eq!(exam_score(&[]), 0.0);
    }

    #[test]
    fn test_score_single_item_retried_correctly() {
        let attempts = vec![attempt("a", 0.0, ts(1)), attempt("a", 1.0, ts(5))];
        assert_eq!(exam_score(&attempts), 1.0);
    }

    #[test]
    fn test_score_unfinished_attempt_loses_to_finished() {
        let attempts = vec![attempt("a", 1.0, ts(4)), attempt("a", 0.0, None)];
        assert_eq!(exam_score(&attempts), 1.0);
    }

    #[test]
    fn test_score_sums_distinct_items() {
        let attempts = vec![
            attempt("a", 1.0, ts(1)),
            attempt("b", 1.0, ts(2)),
            attempt("c", 0.0, ts(3)),
        ];
        assert_eq!(exam_score(&attempts), 2.0);
    }
}
