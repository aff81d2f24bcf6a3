use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::actor;
use crate::response::json_error;
use crate::services::lessons::{self, LessonError, LessonPayload, LessonUpdate};
use crate::state::AppState;

use super::{get_query_param, split_body};

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

pub async fn list_lessons(State(state): State<AppState>, req: Request<Body>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    let query = req.uri().query().unwrap_or("");
    let collection = get_query_param(query, "collection");

    match lessons::list_lessons(proxy.as_ref(), collection.as_deref()).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn get_lesson(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match lessons::get_lesson(proxy.as_ref(), &id).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn create_lesson(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };

    let Some(acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };

    let payload: LessonPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("invalid lesson payload: {err}"),
            )
            .into_response()
        }
    };

    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match lessons::create_lesson(proxy.as_ref(), &acting_user, payload).await {
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

pub async fn update_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request<Body>,
) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };

    let Some(acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };

    let update: LessonUpdate = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("invalid lesson payload: {err}"),
            )
            .into_response()
        }
    };

    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match lessons::update_lesson(proxy.as_ref(), &acting_user, &id, update).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn delete_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request<Body>,
) -> Response {
    let Some(_acting_user) = actor::acting_user(req.headers()) else {
        return missing_actor();
    };

    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match lessons::delete_lesson(proxy.as_ref(), &id).await {
        Ok(()) => Json(MessageResponse {
            success: true,
            message: "lesson deleted",
        })
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

fn handle_service_error(err: LessonError) -> Response {
    match err {
        LessonError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg).into_response()
        }
        LessonError::NotFound(msg) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg).into_response()
        }
        LessonError::Sql(sql_err) => {
            tracing::warn!(error = %sql_err, "lesson query failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal server error",
            )
            .into_response()
        }
    }
}
