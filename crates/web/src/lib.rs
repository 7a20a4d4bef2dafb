//! Liveness responder: answers the host's health-check requests so the
//! process is kept alive. Runs as an independent task sharing nothing with
//! the pipeline except a read-only status snapshot.

use {
    axum::{Json, Router, extract::State, response::IntoResponse, routing::get},
    guildsync_cron::SchedulerStatus,
    tokio::sync::watch,
    tracing::info,
};

#[derive(Clone)]
pub struct WebState {
    pub version: &'static str,
    pub status: watch::Receiver<SchedulerStatus>,
}

/// Build the liveness router (shared between production startup and tests).
pub fn build_app(state: WebState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// The keep-alive contract: `GET /` → `200 "Bot is running."`.
async fn root_handler() -> &'static str {
    "Bot is running."
}

async fn health_handler(State(state): State<WebState>) -> impl IntoResponse {
    let status = state.status.borrow().clone();
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "last_run_at": status.last_run_at,
        "scheduler": status,
    }))
}

/// Bind and serve until the process shuts down.
pub async fn serve(bind: &str, port: u16, state: WebState) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "liveness server listening");
    axum::serve(listener, build_app(state)).await?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {axum::http::StatusCode, guildsync_cron::SchedulerState};

    use super::*;

    fn state() -> WebState {
        let (_tx, rx) = watch::channel(SchedulerStatus::default());
        WebState {
            version: "0.0.0-test",
            status: rx,
        }
    }

    #[tokio::test]
    async fn root_answers_the_keep_alive_contract() {
        assert_eq!(root_handler().await, "Bot is running.");
    }

    #[tokio::test]
    async fn health_reports_scheduler_state() {
        let response = health_handler(State(state())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(
            json["scheduler"]["state"],
            serde_json::to_value(SchedulerState::Idle).unwrap()
        );
    }

    #[tokio::test]
    async fn health_reports_last_run_timestamp_at_top_level() {
        let (tx, rx) = watch::channel(SchedulerStatus::default());
        let ran_at = chrono::Utc::now();
        tx.send_modify(|s| s.last_run_at = Some(ran_at));
        let state = WebState {
            version: "0.0.0-test",
            status: rx,
        };

        let response = health_handler(State(state)).await.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["last_run_at"], serde_json::to_value(ran_at).unwrap());
    }
}
