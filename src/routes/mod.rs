mod class_channels;
mod exam_logs;
mod health;
mod learner_logs;
mod lessons;
mod offline_reports;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use bytes::Bytes;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/lesson",
            get(lessons::list_lessons).post(lessons::create_lesson),
        )
        .route(
            "/api/lesson/:id",
            get(lessons::get_lesson)
                .put(lessons::update_lesson)
                .delete(lessons::delete_lesson),
        )
        .route(
            "/api/classchannel",
            get(class_channels::list_class_channels).post(class_channels::create_class_channel),
        )
        .route(
            "/api/classchannel/:id",
            get(class_channels::get_class_channel)
                .put(class_channels::update_class_channel)
                .delete(class_channels::delete_class_channel),
        )
        .route(
            "/api/contentsessionlog",
            post(learner_logs::create_session_log),
        )
        .route(
            "/api/contentsessionlog/:id",
            put(learner_logs::update_session_log),
        )
        .route(
            "/api/contentsummarylog",
            post(learner_logs::create_summary_log),
        )
        .route(
            "/api/contentsummarylog/:id",
            get(learner_logs::get_summary_log),
        )
        .route("/api/masterylog", post(learner_logs::create_mastery_log))
        .route("/api/masterylog/:id", get(learner_logs::get_mastery_log))
        .route("/api/attemptlog", post(learner_logs::create_attempt_log))
        .route(
            "/api/attemptlog/:id",
            put(learner_logs::update_attempt_log),
        )
        .route(
            "/api/usersessionlog",
            post(learner_logs::create_user_session_log),
        )
        .route("/api/examlog", post(exam_logs::create_exam_log))
        .route(
            "/api/examlog/:id",
            get(exam_logs::get_exam_log).put(exam_logs::update_exam_log),
        )
        .route(
            "/api/examattemptlog",
            post(exam_logs::create_exam_attempt_log),
        )
        .route(
            "/api/totalprogress/:user_id",
            get(learner_logs::total_progress),
        )
        .route(
            "/api/reportsdataoffline",
            post(offline_reports::submit_report),
        )
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "no such endpoint").into_response()
}

pub(crate) async fn split_body(
    req: Request<Body>,
) -> Result<(axum::http::request::Parts, Bytes), Response> {
    let (parts, body) = req.into_parts();
    let body_bytes = match axum::body::to_bytes(body, 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return Err(
                json_error(StatusCode::BAD_REQUEST, "BODY_TOO_LARGE", "request body too large")
                    .into_response(),
            )
        }
    };
    Ok((parts, body_bytes))
}

pub(crate) fn get_query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(k), Some(value)) if k == key => Some(value.to_string()),
            _ => None,
        }
    })
}
