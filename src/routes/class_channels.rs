use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::actor;
use crate::response::json_error;
use crate::services::class_channels::{
    self, ClassChannelError, ClassChannelPayload, ClassChannelUpdate,
};
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

pub async fn list_class_channels(State(state): State<AppState>, req: Request<Body>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    let query = req.uri().query().unwrap_or("");
    let collection = get_query_param(query, "collection");

    match class_channels::list_class_channels(proxy.as_ref(), collection.as_deref()).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn get_class_channel(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match class_channels::get_class_channel(proxy.as_ref(), &id).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn create_class_channel(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };

    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return missing_actor();
    };

    let payload: ClassChannelPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("invalid class channel payload: {err}"),
            )
            .into_response()
        }
    };

    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match class_channels::create_class_channel(proxy.as_ref(), payload).await {
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

pub async fn update_class_channel(
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

    let update: ClassChannelUpdate = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("invalid class channel payload: {err}"),
            )
            .into_response()
        }
    };

    let Some(proxy) = state.db_proxy() else {
        return service_unavailable();
    };

    match class_channels::update_class_channel(proxy.as_ref(), &id, update).await {
        Ok(data) => Json(SuccessResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => handle_service_error(err),
    }
}

pub async fn delete_class_channel(
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

    match class_channels::delete_class_channel(proxy.as_ref(), &id).await {
        Ok(()) => Json(MessageResponse {
            success: true,
            message: "class channel deleted",
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

fn handle_service_error(err: ClassChannelError) -> Response {
    match err {
        ClassChannelError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg).into_response()
        }
        ClassChannelError::NotFound(msg) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg).into_response()
        }
        ClassChannelError::Sql(sql_err) => {
            tracing::warn!(error = %sql_err, "class channel query failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal server error",
            )
            .into_response()
        }
    }
}
