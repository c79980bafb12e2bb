//! HTTP display surface: one page plus a small JSON API over the controller.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::info;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    view::WalletView,
    wallet::WalletIdentity,
    workflow::{WalletController, WorkflowError},
};

pub type SharedController = Arc<WalletController>;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub address: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let status = match &err {
            WorkflowError::Busy(_) => StatusCode::CONFLICT,
            WorkflowError::WalletNotConnected => StatusCode::BAD_REQUEST,
            WorkflowError::Mint(_) | WorkflowError::Balance(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(controller: SharedController) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/wallet", get(wallet))
        .route("/api/refresh", post(refresh))
        .route("/api/mint", post(mint))
        .route("/api/connect", post(connect))
        .route("/api/disconnect", post(disconnect))
        .layer(CorsLayer::permissive())
        .with_state(controller)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, controller: SharedController) -> Result<()> {
    info!("🌐 [API] Listening on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(router(controller).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("🛑 [API] Shutting down");
        })
        .await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn wallet(State(ctrl): State<SharedController>) -> Json<WalletView> {
    Json(ctrl.view().await)
}

async fn refresh(State(ctrl): State<SharedController>) -> Result<Json<WalletView>, ApiError> {
    ctrl.refresh_balances().await?;
    Ok(Json(ctrl.view().await))
}

async fn mint(State(ctrl): State<SharedController>) -> Result<Json<WalletView>, ApiError> {
    ctrl.mint_demo_token().await?;
    Ok(Json(ctrl.view().await))
}

async fn connect(
    State(ctrl): State<SharedController>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<WalletView>, ApiError> {
    let identity = WalletIdentity::from_address(&req.address).map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: format!("{e:#}"),
    })?;
    ctrl.connect(identity).await;
    // A failed first refresh is already recorded in the view's error field.
    let _ = ctrl.refresh_balances().await;
    Ok(Json(ctrl.view().await))
}

async fn disconnect(State(ctrl): State<SharedController>) -> Json<WalletView> {
    ctrl.disconnect().await;
    Json(ctrl.view().await)
}
