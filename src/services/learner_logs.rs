//! Engagement logs: session, summary, mastery, attempt and user-session
//! records of a learner's interaction history.
//!
//! Several serialized fields are not stored values. `pastattempts`,
//! `totalattempts`, `currentmasterylog` and the total-progress figure are
//! computed at read time from the attempt history, so the helpers that do the
//! computing are kept as plain functions over fetched rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::db::DatabaseProxy;

fn default_object() -> serde_json::Value {
    serde_json::json!({})
}

fn default_array() -> serde_json::Value {
    serde_json::json!([])
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Content session logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SessionLogPayload {
    pub user: String,
    pub content_id: String,
    pub channel_id: String,
    pub start_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "default_object")]
    pub extra_fields: serde_json::Value,
}

/// Partial update; omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct SessionLogUpdate {
    pub end_timestamp: Option<DateTime<Utc>>,
    pub time_spent: Option<f64>,
    pub progress: Option<f64>,
    pub extra_fields: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SessionLogDetail {
    pub id: String,
    pub user: String,
    pub content_id: String,
    pub channel_id: String,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub time_spent: f64,
    pub progress: f64,
    pub kind: Option<String>,
    pub extra_fields: serde_json::Value,
}

pub async fn create_session_log(
    proxy: &DatabaseProxy,
    payload: SessionLogPayload,
) -> Result<SessionLogDetail, LogError> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO content_session_logs
          (id, user_id, content_id, channel_id, start_timestamp, end_timestamp,
           time_spent, progress, kind, extra_fields)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&id)
    .bind(&payload.user)
    .bind(&payload.content_id)
    .bind(&payload.channel_id)
    .bind(payload.start_timestamp)
    .bind(payload.end_timestamp)
    .bind(payload.time_spent)
    .bind(payload.progress)
    .bind(&payload.kind)
    .bind(&payload.extra_fields)
    .execute(proxy.pool())
    .await?;

    get_session_log(proxy, &id).await
}

pub async fn update_session_log(
    proxy: &DatabaseProxy,
    id: &str,
    update: SessionLogUpdate,
) -> Result<SessionLogDetail, LogError> {
    let row = sqlx::query(
        "SELECT end_timestamp, time_spent, progress, extra_fields FROM content_session_logs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LogError::NotFound(format!("session log {id} does not exist")))?;

    let end_timestamp = update.end_timestamp.or_else(|| row.get("end_timestamp"));
    let time_spent = update.time_spent.unwrap_or_else(|| row.get("time_spent"));
    let progress = update.progress.unwrap_or_else(|| row.get("progress"));
    let extra_fields = update
        .extra_fields
        .unwrap_or_else(|| row.get("extra_fields"));

    sqlx::query(
        r#"
        UPDATE content_session_logs
        SET end_timestamp = $2, time_spent = $3, progress = $4, extra_fields = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(end_timestamp)
    .bind(time_spent)
    .bind(progress)
    .bind(&extra_fields)
    .execute(proxy.pool())
    .await?;

    get_session_log(proxy, id).await
}

pub async fn get_session_log(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<SessionLogDetail, LogError> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, content_id, channel_id, start_timestamp, end_timestamp,
               time_spent, progress, kind, extra_fields
        FROM content_session_logs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LogError::NotFound(format!("session log {id} does not exist")))?;

    Ok(SessionLogDetail {
        id: row.get("id"),
        user: row.get("user_id"),
        content_id: row.get("content_id"),
        channel_id: row.get("channel_id"),
        start_timestamp: row.get("start_timestamp"),
        end_timestamp: row.get("end_timestamp"),
        time_spent: row.get("time_spent"),
        progress: row.get("progress"),
        kind: row.get("kind"),
        extra_fields: row.get("extra_fields"),
    })
}

// ---------------------------------------------------------------------------
// Content summary logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SummaryLogPayload {
    pub user: String,
    pub content_id: String,
    pub channel_id: String,
    pub start_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "default_object")]
    pub extra_fields: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SummaryLogDetail {
    pub id: String,
    pub user: String,
    pub content_id: String,
    pub channel_id: String,
    pub start_timestamp: DateTime<Utc>,
    pub currentmasterylog: Option<MasteryLogDetail>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub completion_timestamp: Option<DateTime<Utc>>,
    pub time_spent: f64,
    pub progress: f64,
    pub kind: Option<String>,
    pub extra_fields: serde_json::Value,
}

pub async fn create_summary_log(
    proxy: &DatabaseProxy,
    payload: SummaryLogPayload,
) -> Result<SummaryLogDetail, LogError> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO content_summary_logs
          (id, user_id, content_id, channel_id, start_timestamp, end_timestamp,
           completion_timestamp, time_spent, progress, kind, extra_fields)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&id)
    .bind(&payload.user)
    .bind(&payload.content_id)
    .bind(&payload.channel_id)
    .bind(payload.start_timestamp)
    .bind(payload.end_timestamp)
    .bind(payload.completion_timestamp)
    .bind(payload.time_spent)
    .bind(payload.progress)
    .bind(&payload.kind)
    .bind(&payload.extra_fields)
    .execute(proxy.pool())
    .await?;

    get_summary_log(proxy, &id).await
}

pub async fn get_summary_log(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<SummaryLogDetail, LogError> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, content_id, channel_id, start_timestamp, end_timestamp,
               completion_timestamp, time_spent, progress, kind, extra_fields
        FROM content_summary_logs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LogError::NotFound(format!("summary log {id} does not exist")))?;

    let mastery_rows = sqlx::query(
        "SELECT id, end_timestamp FROM mastery_logs WHERE summary_log_id = $1",
    )
    .bind(id)
    .fetch_all(proxy.pool())
    .await?;
    let cursors: Vec<MasteryCursor> = mastery_rows
        .iter()
        .map(|row| MasteryCursor {
            id: row.get("id"),
            end_timestamp: row.get("end_timestamp"),
        })
        .collect();

    let currentmasterylog = match current_mastery(&cursors) {
        Some(mastery_id) => Some(get_mastery_log(proxy, mastery_id).await?),
        None => None,
    };

    Ok(SummaryLogDetail {
        id: row.get("id"),
        user: row.get("user_id"),
        content_id: row.get("content_id"),
        channel_id: row.get("channel_id"),
        start_timestamp: row.get("start_timestamp"),
        currentmasterylog,
        end_timestamp: row.get("end_timestamp"),
        completion_timestamp: row.get("completion_timestamp"),
        time_spent: row.get("time_spent"),
        progress: row.get("progress"),
        kind: row.get("kind"),
        extra_fields: row.get("extra_fields"),
    })
}

/// Sum of `progress` over the user's exactly-complete summary logs.
pub async fn total_progress(proxy: &DatabaseProxy, user_id: &str) -> Result<f64, LogError> {
    let rows = sqlx::query("SELECT progress FROM content_summary_logs WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(proxy.pool())
        .await?;
    let progresses: Vec<f64> = rows.iter().map(|row| row.get("progress")).collect();
    Ok(completed_progress_total(&progresses))
}

// ---------------------------------------------------------------------------
// Mastery logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MasteryLogPayload {
    pub summarylog: String,
    pub user: String,
    pub start_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_timestamp: Option<DateTime<Utc>>,
    #[serde(default = "default_object")]
    pub mastery_criterion: serde_json::Value,
    pub mastery_level: i32,
    #[serde(default)]
    pub complete: bool,
}

#[derive(Debug, Serialize)]
pub struct MasteryLogDetail {
    pub id: String,
    pub summarylog: String,
    pub start_timestamp: DateTime<Utc>,
    pub pastattempts: Vec<PastAttempt>,
    pub totalattempts: i64,
    pub user: String,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub completion_timestamp: Option<DateTime<Utc>>,
    pub mastery_criterion: serde_json::Value,
    pub mastery_level: i32,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PastAttempt {
    pub correct: f64,
    pub hinted: bool,
}

pub async fn create_mastery_log(
    proxy: &DatabaseProxy,
    payload: MasteryLogPayload,
) -> Result<MasteryLogDetail, LogError> {
    let summary_exists = sqlx::query("SELECT 1 FROM content_summary_logs WHERE id = $1")
        .bind(&payload.summarylog)
        .fetch_optional(proxy.pool())
        .await?
        .is_some();
    if !summary_exists {
        return Err(LogError::Validation(format!(
            "summary log {} does not exist",
            payload.summarylog
        )));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO mastery_logs
          (id, summary_log_id, user_id, start_timestamp, end_timestamp,
           completion_timestamp, mastery_criterion, mastery_level, complete)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&id)
    .bind(&payload.summarylog)
    .bind(&payload.user)
    .bind(payload.start_timestamp)
    .bind(payload.end_timestamp)
    .bind(payload.completion_timestamp)
    .bind(&payload.mastery_criterion)
    .bind(payload.mastery_level)
    .bind(payload.complete)
    .execute(proxy.pool())
    .await?;

    get_mastery_log(proxy, &id).await
}

pub async fn get_mastery_log(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<MasteryLogDetail, LogError> {
    let row = sqlx::query(
        r#"
        SELECT id, summary_log_id, user_id, start_timestamp, end_timestamp,
               completion_timestamp, mastery_criterion, mastery_level, complete
        FROM mastery_logs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LogError::NotFound(format!("mastery log {id} does not exist")))?;

    let summary_log_id: String = row.get("summary_log_id");
    let attempts = fetch_attempt_cursors(proxy, &summary_log_id).await?;
    let (pastattempts, totalattempts) = attempt_history(attempts);

    Ok(MasteryLogDetail {
        id: row.get("id"),
        summarylog: summary_log_id,
        start_timestamp: row.get("start_timestamp"),
        pastattempts,
        totalattempts,
        user: row.get("user_id"),
        end_timestamp: row.get("end_timestamp"),
        completion_timestamp: row.get("completion_timestamp"),
        mastery_criterion: row.get("mastery_criterion"),
        mastery_level: row.get("mastery_level"),
        complete: row.get("complete"),
    })
}

// ---------------------------------------------------------------------------
// Attempt logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AttemptLogPayload {
    pub masterylog: String,
    pub sessionlog: String,
    pub user: String,
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
    #[serde(default = "default_object")]
    pub answer: serde_json::Value,
    #[serde(default)]
    pub simple_answer: String,
    #[serde(default = "default_array")]
    pub interaction_history: serde_json::Value,
}

/// Partial update; omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct AttemptLogUpdate {
    pub end_timestamp: Option<DateTime<Utc>>,
    pub completion_timestamp: Option<DateTime<Utc>>,
    pub time_spent: Option<f64>,
    pub complete: Option<bool>,
    pub correct: Option<f64>,
    pub hinted: Option<bool>,
    pub answer: Option<serde_json::Value>,
    pub simple_answer: Option<String>,
    pub interaction_history: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct AttemptLogDetail {
    pub id: String,
    pub masterylog: String,
    pub sessionlog: String,
    pub user: String,
    pub item: String,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub completion_timestamp: Option<DateTime<Utc>>,
    pub time_spent: f64,
    pub complete: bool,
    pub correct: f64,
    pub hinted: bool,
    pub answer: serde_json::Value,
    pub simple_answer: String,
    pub interaction_history: serde_json::Value,
}

pub async fn create_attempt_log(
    proxy: &DatabaseProxy,
    payload: AttemptLogPayload,
) -> Result<AttemptLogDetail, LogError> {
    let mastery_exists = sqlx::query("SELECT 1 FROM mastery_logs WHERE id = $1")
        .bind(&payload.masterylog)
        .fetch_optional(proxy.pool())
        .await?
        .is_some();
    if !mastery_exists {
        return Err(LogError::Validation(format!(
            "mastery log {} does not exist",
            payload.masterylog
        )));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO attempt_logs
          (id, mastery_log_id, session_log_id, user_id, item, start_timestamp,
           end_timestamp, completion_timestamp, time_spent, complete, correct,
           hinted, answer, simple_answer, interaction_history)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(&id)
    .bind(&payload.masterylog)
    .bind(&payload.sessionlog)
    .bind(&payload.user)
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

    get_attempt_log(proxy, &id).await
}

pub async fn update_attempt_log(
    proxy: &DatabaseProxy,
    id: &str,
    update: AttemptLogUpdate,
) -> Result<AttemptLogDetail, LogError> {
    let row = sqlx::query(
        r#"
        SELECT end_timestamp, completion_timestamp, time_spent, complete, correct,
               hinted, answer, simple_answer, interaction_history
        FROM attempt_logs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LogError::NotFound(format!("attempt log {id} does not exist")))?;

    let end_timestamp = update.end_timestamp.or_else(|| row.get("end_timestamp"));
    let completion_timestamp = update
        .completion_timestamp
        .or_else(|| row.get("completion_timestamp"));
    let time_spent = update.time_spent.unwrap_or_else(|| row.get("time_spent"));
    let complete = update.complete.unwrap_or_else(|| row.get("complete"));
    let correct = update.correct.unwrap_or_else(|| row.get("correct"));
    let hinted = update.hinted.unwrap_or_else(|| row.get("hinted"));
    let answer = update.answer.unwrap_or_else(|| row.get("answer"));
    let simple_answer = update
        .simple_answer
        .unwrap_or_else(|| row.get("simple_answer"));
    let interaction_history = update
        .interaction_history
        .unwrap_or_else(|| row.get("interaction_history"));

    sqlx::query(
        r#"
        UPDATE attempt_logs
        SET end_timestamp = $2, completion_timestamp = $3, time_spent = $4,
            complete = $5, correct = $6, hinted = $7, answer = $8,
            simple_answer = $9, interaction_history = $10
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(end_timestamp)
    .bind(completion_timestamp)
    .bind(time_spent)
    .bind(complete)
    .bind(correct)
    .bind(hinted)
    .bind(&answer)
    .bind(&simple_answer)
    .bind(&interaction_history)
    .execute(proxy.pool())
    .await?;

    get_attempt_log(proxy, id).await
}

pub async fn get_attempt_log(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<AttemptLogDetail, LogError> {
    let row = sqlx::query(
        r#"
        SELECT id, mastery_log_id, session_log_id, user_id, item, start_timestamp,
               end_timestamp, completion_timestamp, time_spent, complete, correct,
               hinted, answer, simple_answer, interaction_history
        FROM attempt_logs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?
    .ok_or_else(|| LogError::NotFound(format!("attempt log {id} does not exist")))?;

    Ok(AttemptLogDetail {
        id: row.get("id"),
        masterylog: row.get("mastery_log_id"),
        sessionlog: row.get("session_log_id"),
        user: row.get("user_id"),
        item: row.get("item"),
        start_timestamp: row.get("start_timestamp"),
        end_timestamp: row.get("end_timestamp"),
        completion_timestamp: row.get("completion_timestamp"),
        time_spent: row.get("time_spent"),
        complete: row.get("complete"),
        correct: row.get("correct"),
        hinted: row.get("hinted"),
        answer: row.get("answer"),
        simple_answer: row.get("simple_answer"),
        interaction_history: row.get("interaction_history"),
    })
}

// ---------------------------------------------------------------------------
// User session logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserSessionLogPayload {
    pub user: String,
    #[serde(default)]
    pub channels: String,
    pub start_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub last_interaction_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pages: String,
}

#[derive(Debug, Serialize)]
pub struct UserSessionLogDetail {
    pub id: String,
    pub user: String,
    pub channels: String,
    pub start_timestamp: DateTime<Utc>,
    pub last_interaction_timestamp: Option<DateTime<Utc>>,
    pub pages: String,
}

pub async fn create_user_session_log(
    proxy: &DatabaseProxy,
    payload: UserSessionLogPayload,
) -> Result<UserSessionLogDetail, LogError> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO user_session_logs
          (id, user_id, channels, start_timestamp, last_interaction_timestamp, pages)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&id)
    .bind(&payload.user)
    .bind(&payload.channels)
    .bind(payload.start_timestamp)
    .bind(payload.last_interaction_timestamp)
    .bind(&payload.pages)
    .execute(proxy.pool())
    .await?;

    Ok(UserSessionLogDetail {
        id,
        user: payload.user,
        channels: payload.channels,
        start_timestamp: payload.start_timestamp,
        last_interaction_timestamp: payload.last_interaction_timestamp,
        pages: payload.pages,
    })
}

// ---------------------------------------------------------------------------
// Read-time aggregate helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AttemptCursor {
    pub correct: f64,
    pub hinted: bool,
    pub start_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MasteryCursor {
    pub id: String,
    pub end_timestamp: Option<DateTime<Utc>>,
}

/// All attempts recorded against any mastery cycle of the given summary log.
async fn fetch_attempt_cursors(
    proxy: &DatabaseProxy,
    summary_log_id: &str,
) -> Result<Vec<AttemptCursor>, LogError> {
    let rows = sqlx::query(
        r#"
        SELECT a.correct, a.hinted, a.start_timestamp
        FROM attempt_logs a
        JOIN mastery_logs m ON m.id = a.mastery_log_id
        WHERE m.summary_log_id = $1
        "#,
    )
    .bind(summary_log_id)
    .fetch_all(proxy.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|row| AttemptCursor {
            correct: row.get("correct"),
            hinted: row.get("hinted"),
            start_timestamp: row.get("start_timestamp"),
        })
        .collect())
}

/// The ten most recent (correct, hinted) pairs, newest first, plus the total
/// attempt count.
pub fn attempt_history(mut attempts: Vec<AttemptCursor>) -> (Vec<PastAttempt>, i64) {
    let total = attempts.len() as i64;
    attempts.sort_by(|a, b| b.start_timestamp.cmp(&a.start_timestamp));
    let past = attempts
        .into_iter()
        .take(10)
        .map(|attempt| PastAttempt {
            correct: attempt.correct,
            hinted: attempt.hinted,
        })
        .collect();
    (past, total)
}

/// The mastery cycle with the latest end timestamp, absent when none exist.
/// Cycles without an end timestamp lose to any that have one.
pub fn current_mastery(logs: &[MasteryCursor]) -> Option<&str> {
    logs.iter()
        .max_by_key(|log| log.end_timestamp)
        .map(|log| log.id.as_str())
}

/// Sum of `progress` restricted to logs that are exactly complete.
pub fn completed_progress_total(progresses: &[f64]) -> f64 {
    progresses
        .iter()
        .filter(|progress| **progress == 1.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    fn cursor(correct: f64, hinted: bool, seconds: i64) -> AttemptCursor {
        AttemptCursor {
            correct,
            hinted,
            start_timestamp: ts(seconds),
        }
    }

    #[test]
    fn test_attempt_history_caps_at_ten_newest_first() {
        let attempts: Vec<AttemptCursor> = (0..15)
            .map(|i| cursor(if i % 2 == 0 { 1.0 } else { 0.0 }, false, i))
            .collect();
        let (past, total) = attempt_history(attempts);
        assert_eq!(total, 15);
        assert_eq!(past.len(), 10);
        // newest attempt has start_timestamp 14 and correct == 1.0
        assert_eq!(past[0].correct, 1.0);
        assert_eq!(past[1].correct, 0.0);
    }

    #[test]
    fn test_attempt_history_orders_newest_first() {
        let attempts = vec![
            cursor(0.0, false, 10),
            cursor(1.0, true, 30),
            cursor(0.0, true, 20),
        ];
        let (past, total) = attempt_history(attempts);
        assert_eq!(total, 3);
        assert_eq!(
            past,
            vec![
                PastAttempt {
                    correct: 1.0,
                    hinted: true
                },
                PastAttempt {
                    correct: 0.0,
                    hinted: true
                },
                PastAttempt {
                    correct: 0.0,
                    hinted: false
                },
            ]
        );
    }

    #[test]
    fn test_current_mastery_absent_without_logs() {
        assert!(current_mastery(&[]).is_none());
    }

    #[test]
    fn test_current_mastery_picks_latest_end_timestamp() {
        let logs = vec![
            MasteryCursor {
                id: "old".to_string(),
                end_timestamp: Some(ts(100)),
            },
            MasteryCursor {
                id: "open".to_string(),
                end_timestamp: None,
            },
            MasteryCursor {
                id: "latest".to_string(),
                end_timestamp: Some(ts(200)),
            },
        ];
        assert_eq!(current_mastery(&logs), Some("latest"));
    }

    #[test]
    fn test_completed_progress_total_ignores_partial() {
        let total = completed_progress_total(&[1.0, 0.5, 1.0, 0.99]);
        assert_eq!(total, 2.0);
    }

    #[test]
    fn test_completed_progress_total_empty() {
        assert_eq!(completed_progress_total(&[]), 0.0);
    }
}
