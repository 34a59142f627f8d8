//! Axum server and routes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use mlog_scheduler::{NoticeBoard, Scheduler};
use mlog_store::{query, stats};
use mlog_types::{
    AppendRequest, AppendResponse, AvailabilityData, AvailabilityResponse, BaseResponse,
    ConnectRequest, JobStatusResponse, LogPageResponse, LogQuery, LogStats, LogStatsResponse,
    LogStore, LogStoreError, NoticeKind, NoticeListResponse, RevealRequest, RevealResponse,
    SessionResponse, WriterSession,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Explicit application state: the store, its scheduler, the notice board, and the
/// connected writer (if any).
pub struct AppState {
    pub store: Arc<dyn LogStore + Send + Sync>,
    pub scheduler: Arc<dyn Scheduler + Send + Sync>,
    pub notices: Arc<NoticeBoard>,
    pub session: RwLock<Option<WriterSession>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LogStore + Send + Sync>,
        scheduler: Arc<dyn Scheduler + Send + Sync>,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        Self {
            store,
            scheduler,
            notices,
            session: RwLock::new(None),
        }
    }

    async fn current_session(&self) -> Option<WriterSession> {
        self.session.read().await.clone()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/store/available", get(handle_available))
        .route("/session", get(handle_session))
        .route("/session/connect", post(handle_connect))
        .route("/session/disconnect", post(handle_disconnect))
        .route("/logs", get(handle_list).post(handle_append))
        .route("/logs/jobs/status", get(handle_job_status))
        .route("/logs/stats", get(handle_stats))
        .route("/logs/reveal", post(handle_reveal))
        .route("/notices", get(handle_notices))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

const STORE_UNAVAILABLE: &str = "store unavailable";

fn error_code(e: &LogStoreError) -> i32 {
    match e {
        LogStoreError::NotConnected => 401,
        LogStoreError::InvalidInput(_) => 400,
        LogStoreError::Declined { .. } => 403,
        LogStoreError::SubmissionFailed { .. } | LogStoreError::Codec(_) => 500,
    }
}

async fn handle_health() -> &'static str {
    "ok"
}

async fn handle_available(State(state): State<Arc<AppState>>) -> Json<AvailabilityResponse> {
    let available = state.store.check_availability().await;
    Json(BaseResponse::ok(AvailabilityData { available }))
}

async fn handle_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    match state.current_session().await {
        Some(s) => Json(BaseResponse::ok(s)),
        None => Json(BaseResponse {
            code: 200,
            message: "not connected".to_string(),
            data: None,
        }),
    }
}

async fn handle_connect(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConnectRequest>,
) -> Json<SessionResponse> {
    match WriterSession::connect(&req.account) {
        Ok(session) => {
            tracing::info!(account = %session.account, "wallet connected");
            state
                .notices
                .post(
                    NoticeKind::Success,
                    format!("connected {}", session.short_account()),
                )
                .await;
            *state.session.write().await = Some(session.clone());
            Json(BaseResponse::ok(session))
        }
        Err(e) => Json(BaseResponse::error(400, e.to_string())),
    }
}

async fn handle_disconnect(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let previous = state.session.write().await.take();
    if let Some(ref s) = previous {
        tracing::info!(account = %s.account, "wallet disconnected");
    }
    Json(BaseResponse {
        code: 200,
        message: "disconnected".to_string(),
        data: previous,
    })
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LogQuery>,
) -> Json<LogPageResponse> {
    let report = state.store.load_all().await;
    let page = query(&report.records, &q);
    if !report.available {
        return Json(BaseResponse {
            code: 503,
            message: STORE_UNAVAILABLE.to_string(),
            data: Some(page),
        });
    }
    Json(BaseResponse {
        code: 200,
        message: format!("Success ({} skipped)", report.skipped),
        data: Some(page),
    })
}

async fn handle_append(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AppendRequest>,
) -> Json<AppendResponse> {
    let session = state.current_session().await;
    let candidate = req.candidate();

    if req.is_async() {
        let Some(session) = session else {
            let e = LogStoreError::NotConnected;
            return Json(BaseResponse::error(error_code(&e), e.to_string()));
        };
        if let Err(e) = candidate.validate() {
            return Json(BaseResponse::error(error_code(&e), e.to_string()));
        }
        return match state.scheduler.submit_append(session, candidate).await {
            Ok(task_id) => {
                tracing::info!(task_id = %task_id, "append job submitted (async)");
                Json(BaseResponse {
                    code: 200,
                    message: "Log append job submitted".to_string(),
                    data: Some(serde_json::json!({ "task_id": task_id })),
                })
            }
            Err(e) => Json(BaseResponse::error(500, e.to_string())),
        };
    }

    if session.is_some() {
        state
            .notices
            .post(
                NoticeKind::Pending,
                format!("submitting log for {}", candidate.category),
            )
            .await;
    }
    match state.store.append(session.as_ref(), &candidate).await {
        Ok(record) => {
            state
                .notices
                .post(NoticeKind::Success, format!("log {} committed", record.id))
                .await;
            Json(BaseResponse::ok(serde_json::json!(record)))
        }
        Err(e) => {
            state.notices.post(NoticeKind::Error, e.to_string()).await;
            Json(BaseResponse {
                code: error_code(&e),
                message: e.to_string(),
                data: Some(serde_json::json!({
                    "phase": e.phase(),
                    "orphan": e.left_orphan(),
                })),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JobStatusQuery {
    #[serde(default)]
    pub task_id: Option<String>,
}

async fn handle_job_status(
    State(state): State<Arc<AppState>>,
    Query(q): Query<JobStatusQuery>,
) -> Json<JobStatusResponse> {
    let Some(task_id) = q.task_id.as_deref() else {
        return Json(BaseResponse::error(400, "task_id is required"));
    };
    match state.scheduler.get_status(task_id).await {
        Ok(Some(job)) => Json(BaseResponse::ok(job)),
        Ok(None) => Json(BaseResponse::error(404, "Job not found")),
        Err(e) => Json(BaseResponse::error(500, e.to_string())),
    }
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> Json<LogStatsResponse> {
    let report = state.store.load_all().await;
    if !report.available {
        return Json(BaseResponse {
            code: 503,
            message: STORE_UNAVAILABLE.to_string(),
            data: Some(LogStats::default()),
        });
    }
    Json(BaseResponse::ok(stats(&report.records)))
}

async fn handle_reveal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevealRequest>,
) -> Json<RevealResponse> {
    let report = state.store.load_all().await;
    let Some(record) = report.records.iter().find(|r| r.id == req.id) else {
        return Json(BaseResponse::error(404, format!("log not found: {}", req.id)));
    };
    match state.store.reveal(record) {
        Ok(envelope) => Json(BaseResponse::ok(envelope)),
        Err(e) => Json(BaseResponse::error(error_code(&e), e.to_string())),
    }
}

async fn handle_notices(State(state): State<Arc<AppState>>) -> Json<NoticeListResponse> {
    Json(BaseResponse::ok(state.notices.active().await))
}
