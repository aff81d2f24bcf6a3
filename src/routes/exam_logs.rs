use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::actor;
use crate::response::json_error;
use crate::services::exam_logs::{
    self, ExamAttemptLogPayload, ExamLogError, ExamLogPayload, ExamLogUpdate,
};
use crate::state::AppState;

use super::split_body;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

pub async fn create_exam_log(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };
    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };
    let payload: ExamLogPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match exam_logs::create_exam_log(proxy.as_ref(), payload).await {
        Ok(data) => (
            StatusCode::CREATED,
            Json(SuccessResponse {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn get_exam_log(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match exam_logs::get_exam_log(proxy.as_ref(), &id).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn update_exam_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request<Body>,
) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };
    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };
    let update: ExamLogUpdate = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match exam_logs::update_exam_log(proxy.as_ref(), &id, update).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn create_exam_attempt_log(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };
    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };
    let payload: ExamAttemptLogPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match exam_logs::create_exam_attempt_log(proxy.as_ref(), payload).await {
        Ok(data) => (
            StatusCode::CREATED,
            Json(SuccessResponse {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(err) => handle_service_error(err),
    }
}

fn missing_actor() -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        "missing acting user",
    )
    .into_response()
}

fn service_unavailable() -> Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "SERVICE_UNAVAILABLE",
        "database unavailable",
    )
    .into_response()
}

fn invalid_payload(err: serde_json::Error) -> Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        format!("invalid exam log payload: {err}"),
    )
    .into_response()
}

fn handle_service_error(err: ExamLogError) -> Response {
    match err {
        ExamLogError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg).into_response()
        }
        ExamLogError::NotFound(msg) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg).into_response()
        }
        ExamLogError::Sql(sql_err) => {
            tracing::warn!(error = %sql_err, "exam log query failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal server error",
            )
            .into_response()
        }
    }
}
