use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use server_api::ApiContext;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{CreateDayRequest, DayRecord, DeleteDayRequest},
};
use storage::Storage;
use tracing::{error, info};

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(%database_url, %error, "failed to open SQLite database");
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/days/", get(http_list_days))
        .route("/api/days/addDay", post(http_create_day))
        .route("/api/days/deleteDay", delete(http_delete_day))
        .with_state(state)
}

type ErrorResponse = (StatusCode, Json<ApiError>);

fn error_response(err: ApiError) -> ErrorResponse {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, ErrorResponse> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| error_response(ApiError::new(ErrorCode::Internal, e.to_string())))?;
    Ok("ok")
}

async fn http_list_days(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DayRecord>>, ErrorResponse> {
    let days = server_api::list_days(&state.api)
        .await
        .map_err(error_response)?;
    Ok(Json(days))
}

async fn http_create_day(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDayRequest>,
) -> Result<Json<DayRecord>, ErrorResponse> {
    let day = server_api::create_day(&state.api, request.number)
        .await
        .map_err(error_response)?;
    Ok(Json(day))
}

async fn http_delete_day(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteDayRequest>,
) -> Result<StatusCode, ErrorResponse> {
    server_api::delete_day(&state.api, request.number)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body, body::Body, http::Request};
    use shared::domain::DayNumber;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        build_router(Arc::new(AppState {
            api: ApiContext { storage },
        }))
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn post_day(number: u32) -> Request<Body> {
        Request::post("/api/days/addDay")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "number": number }).to_string(),
            ))
            .expect("request")
    }

    fn delete_day_request(number: u32) -> Request<Body> {
        Request::delete("/api/days/deleteDay")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "number": number }).to_string(),
            ))
            .expect("request")
    }

    fn list_request() -> Request<Body> {
        Request::get("/api/days/").body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn healthz_reports_ok_when_storage_is_ready() {
        let app = test_app().await;
        let request = Request::get("/healthz")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(bytes.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn day_lifecycle_over_http() {
        let app = test_app().await;

        let created = app.clone().oneshot(post_day(1)).await.expect("response");
        assert_eq!(created.status(), StatusCode::OK);
        let day: DayRecord = json_body(created).await;
        assert_eq!(day.number, DayNumber(1));

        let created = app.clone().oneshot(post_day(2)).await.expect("response");
        assert_eq!(created.status(), StatusCode::OK);

        let listed = app.clone().oneshot(list_request()).await.expect("response");
        assert_eq!(listed.status(), StatusCode::OK);
        let days: Vec<DayRecord> = json_body(listed).await;
        assert_eq!(days.len(), 2);

        let deleted = app
            .clone()
            .oneshot(delete_day_request(1))
            .await
            .expect("response");
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let listed = app.oneshot(list_request()).await.expect("response");
        let days: Vec<DayRecord> = json_body(listed).await;
        // the surviving day was renumbered down to 1
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].number, DayNumber(1));
    }

    #[tokio::test]
    async fn create_with_gap_is_rejected_as_validation_error() {
        let app = test_app().await;
        let response = app.oneshot(post_day(5)).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let err: ApiError = json_body(response).await;
        assert!(matches!(err.code, ErrorCode::Validation));
    }

    #[tokio::test]
    async fn deleting_missing_day_returns_not_found() {
        let app = test_app().await;
        let response = app
            .oneshot(delete_day_request(3))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let err: ApiError = json_body(response).await;
        assert!(matches!(err.code, ErrorCode::NotFound));
    }
}
