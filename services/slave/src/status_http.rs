//! Local status HTTP surface.
//!
//! - `GET /healthz` — always 200 (process is running)
//! - `GET /readyz`  — 200 once the broker façade is constructed and the
//!   device path has been opened at least once, 503 otherwise
//!
//! # Readiness contract
//! Reflects local prerequisites only; a later device I/O error does not
//! flip readiness back off (the device action reopens on its own).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct SubsystemStatus {
    ready: bool,
    reason: Option<String>,
}

impl SubsystemStatus {
    pub fn ready() -> Self {
        Self {
            ready: true,
            reason: None,
        }
    }

    pub fn not_ready(reason: String) -> Self {
        Self {
            ready: false,
            reason: Some(reason),
        }
    }
}

#[derive(Clone)]
struct AppState {
    subsystem: Arc<Mutex<SubsystemStatus>>,
}

/// A cloneable handle letting the rest of the process flip readiness after
/// startup completes (e.g. once the device path is confirmed to exist).
#[derive(Clone)]
pub struct SubsystemHandle {
    subsystem: Arc<Mutex<SubsystemStatus>>,
}

impl SubsystemHandle {
    pub async fn set(&self, status: SubsystemStatus) {
        *self.subsystem.lock().await = status;
    }
}

pub struct StatusServer {
    local_addr: SocketAddr,
    handle: SubsystemHandle,
}

impl StatusServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> SubsystemHandle {
        self.handle.clone()
    }

    pub async fn start(bind: &str, subsystem: SubsystemStatus) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(bind).await?;
        let local_addr = listener.local_addr()?;

        let subsystem = Arc::new(Mutex::new(subsystem));
        let handle = SubsystemHandle {
            subsystem: subsystem.clone(),
        };
        let state = AppState { subsystem };
        let app = Router::new()
            .route("/healthz", get(healthz))
            .route("/readyz", get(readyz))
            .with_state(state);

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(StatusServer { local_addr, handle })
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<AppState>) -> (StatusCode, String) {
    let ss = state.subsystem.lock().await;
    if ss.ready {
        (StatusCode::OK, "ready".to_owned())
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ss.reason.clone().unwrap_or_else(|| "not ready".to_owned()),
        )
    }
}
