//! Local status HTTP surface.
//!
//! - `GET /healthz` — always 200 (process is running)
//! - `GET /readyz`  — 200 once the broker façade is constructed and the
//!   Unix socket is bound, 503 otherwise
//!
//! # Readiness contract
//! Reflects local prerequisites only; an unreachable broker after startup
//! does not flip readiness back off (the façade reconnects on its own).

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

pub struct StatusServer {
    local_addr: SocketAddr,
}

impl StatusServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn start(bind: &str, subsystem: SubsystemStatus) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(bind).await?;
        let local_addr = listener.local_addr()?;

        let state = AppState {
            subsystem: Arc::new(Mutex::new(subsystem)),
        };
        let app = Router::new()
            .route("/healthz", get(healthz))
            .route("/readyz", get(readyz))
            .with_state(state);

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(StatusServer { local_addr })
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn not_ready_status_carries_its_reason() {
        let status = SubsystemStatus::not_ready("socket not bound".to_owned());
        assert!(!status.ready);
        assert_eq!(status.reason.as_deref(), Some("socket not bound"));
    }

    #[tokio::test]
    async fn server_binds_an_ephemeral_port_and_answers_healthz() {
        let server = StatusServer::start("127.0.0.1:0", SubsystemStatus::ready())
            .await
            .unwrap();
        let addr = server.local_addr();
        let response = reqwest_get(&format!("http://{addr}/healthz")).await;
        assert_eq!(response, "ok");
    }

    async fn reqwest_get(url: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;

        let url = url.strip_prefix("http://").unwrap();
        let mut stream = TcpStream::connect(url).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let text = String::from_utf8_lossy(&buf);
        text.rsplit("\r\n\r\n").next().unwrap_or("").to_string()
    }
}
