use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::actor;
use crate::response::json_error;
use crate::services::offline_reports::{self, OfflineReportPayload, ReportError};
use crate::state::AppState;

use super::split_body;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

pub async fn submit_report(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body_bytes) = match split_body(req).await {
        Ok(value) => value,
        Err(res) => return res,
    };

    let Some(_acting_user) = actor::acting_user(&parts.headers) else {
        return json_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "missing acting user",
        )
        .into_response();
    };

    let payload: OfflineReportPayload = match serde_json::from_slice(&body_bytes) {
        Ok(value) => value,
        Err(err) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("invalid offline report payload: {err}"),
            )
            .into_response()
        }
    };

    let Some(proxy) = state.db_proxy() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "database unavailable",
        )
        .into_response();
    };

    match offline_reports::submit_report(proxy.as_ref(), payload).await {
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

fn handle_service_error(err: ReportError) -> Response {
    match err {
        ReportError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg).into_response()
        }
        ReportError::Sql(sql_err) => {
            tracing::warn!(error = %sql_err, "offline report query failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal server error",
            )
            .into_response()
        }
    }
}
