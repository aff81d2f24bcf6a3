use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::actor;
use crate::response::json_error;
use crate::services::learner_logs::{
    self, AttemptLogPayload, AttemptLogUpdate, LogError, MasteryLogPayload, SessionLogPayload,
    SessionLogUpdate, SummaryLogPayload, UserSessionLogPayload,
};
use crate::state::AppState;

use super::split_body;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct TotalProgressResponse {
    id: String,
    progress: f64,
}

pub async fn create_session_log(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };
    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };
    let payload: SessionLogPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::create_session_log(proxy.as_ref(), payload).await {
        Ok(data) => created(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn update_session_log(
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
    let update: SessionLogUpdate = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::update_session_log(proxy.as_ref(), &id, update).await {
        Ok(data) => ok(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn create_summary_log(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };
    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };
    let payload: SummaryLogPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::create_summary_log(proxy.as_ref(), payload).await {
        Ok(data) => created(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn get_summary_log(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::get_summary_log(proxy.as_ref(), &id).await {
        Ok(data) => ok(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn create_mastery_log(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };
    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };
    let payload: MasteryLogPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::create_mastery_log(proxy.as_ref(), payload).await {
        Ok(data) => created(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn get_mastery_log(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::get_mastery_log(proxy.as_ref(), &id).await {
        Ok(data) => ok(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn create_attempt_log(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };
    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };
    let payload: AttemptLogPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::create_attempt_log(proxy.as_ref(), payload).await {
        Ok(data) => created(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn update_attempt_log(
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
    let update: AttemptLogUpdate = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::update_attempt_log(proxy.as_ref(), &id, update).await {
        Ok(data) => ok(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn create_user_session_log(
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
    let payload: UserSessionLogPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => return invalid_payload(err),
    };
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::create_user_session_log(proxy.as_ref(), payload).await {
        Ok(data) => created(data),
        Err(err) => handle_service_error(err),
    }
}

pub async fn total_progress(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match learner_logs::total_progress(proxy.as_ref(), &user_id).await {
        Ok(progress) => ok(TotalProgressResponse {
            id: user_id,
            progress,
        }),
        Err(err) => handle_service_error(err),
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(SuccessResponse {
        success: true,
        data,
    })
    .into_response()
}

fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data,
        }),
    )
        .into_response()
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
        format!("invalid log payload: {err}"),
    )
    .into_response()
}

fn handle_service_error(err: LogError) -> Response {
    match err {
        LogError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg).into_response()
        }
        LogError::NotFound(msg) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg).into_response()
        }
        LogError::Sql(sql_err) => {
            tracing::warn!(error = %sql_err, "learner log query failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal server error",
            )
            .into_response()
        }
    }
}
