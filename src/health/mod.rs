//! Component health registry plus the liveness probe listener.
//!
//! The probe listener runs on its own task and shares nothing with the
//! session loop except this lock-guarded registry. Raw TCP + tokio keeps
//! it dependency-free.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub updated_at: String,
    pub last_ok: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: String,
    pub pid: u32,
    pub uptime_seconds: u64,
    pub components: BTreeMap<String, ComponentHealth>,
}

struct Registry {
    started_at: Instant,
    components: Mutex<BTreeMap<String, ComponentHealth>>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| Registry {
        started_at: Instant::now(),
        components: Mutex::new(BTreeMap::new()),
    })
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn upsert<F>(component: &str, update: F)
where
    F: FnOnce(&mut ComponentHealth),
{
    if let Ok(mut map) = registry().components.lock() {
        let now = now_rfc3339();
        let entry = map
            .entry(component.to_string())
            .or_insert_with(|| ComponentHealth {
                status: "starting".into(),
                updated_at: now.clone(),
                last_ok: None,
                last_error: None,
            });
        update(entry);
        entry.updated_at = now;
    }
}

pub fn mark_ok(component: &str) {
    upsert(component, |entry| {
        entry.status = "ok".into();
        entry.last_ok = Some(now_rfc3339());
        entry.last_error = None;
    });
}

pub fn mark_error(component: &str, error: impl ToString) {
    let err = error.to_string();
    upsert(component, move |entry| {
        entry.status = "error".into();
        entry.last_error = Some(err);
    });
}

pub fn snapshot() -> HealthSnapshot {
    let components = registry()
        .components
        .lock()
        .map_or_else(|_| BTreeMap::new(), |map| map.clone());

    let status = if components.values().any(|c| c.status == "error") {
        "degraded"
    } else {
        "ok"
    };

    HealthSnapshot {
        status: status.into(),
        pid: std::process::id(),
        uptime_seconds: registry().started_at.elapsed().as_secs(),
        components,
    }
}

pub fn snapshot_json() -> serde_json::Value {
    serde_json::to_value(snapshot()).unwrap_or_else(|_| {
        serde_json::json!({
            "status": "error",
            "message": "failed to serialize health snapshot"
        })
    })
}

/// Run the liveness probe listener. Answers `GET /` with a plain "alive"
/// line and `GET /health` with the registry snapshot.
pub async fn run_probe_server(port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "liveness probe listening");
    mark_ok("probe");

    loop {
        let (mut stream, _peer) = listener.accept().await?;

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let n = match tokio::time::timeout(
                std::time::Duration::from_secs(10),
                stream.read(&mut buf),
            )
            .await
            {
                Ok(Ok(n)) if n > 0 => n,
                _ => return,
            };

            let request = String::from_utf8_lossy(&buf[..n]);
            let first_line = request.lines().next().unwrap_or("");
            let parts: Vec<&str> = first_line.split_whitespace().collect();

            let (status, content_type, body) = match parts.as_slice() {
                ["GET", "/", ..] => (200, "text/plain", "Bot is alive".to_string()),
                ["GET", "/health", ..] => (200, "application/json", snapshot_json().to_string()),
                [_, _, ..] => (404, "text/plain", "Not Found".to_string()),
                _ => (400, "text/plain", "Bad Request".to_string()),
            };

            let _ = write_response(&mut stream, status, content_type, &body).await;
        });
    }
}

async fn write_response(
    stream: &mut tokio::net::TcpStream,
    status: u16,
    content_type: &str,
    body: &str,
) -> std::io::Result<()> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn mark_ok_then_error_tracks_last_states() {
        mark_ok("unit-test-component");
        mark_error("unit-test-component", "boom");

        let snap = snapshot();
        let entry = &snap.components["unit-test-component"];
        assert_eq!(entry.status, "error");
        assert!(entry.last_ok.is_some());
        assert_eq!(entry.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn snapshot_serializes() {
        mark_ok("unit-test-serialize");
        let json = snapshot_json();
        assert!(json.get("pid").is_some());
        assert!(json.get("components").is_some());
    }

    async fn probe_request(port: u16, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        stream
            .write_all(format!("GET {path} HTTP/1.1\r\nHost: x\r\n\r\n").as_bytes())
            .await
            .unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn probe_answers_root_and_health() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        tokio::spawn(async move {
            let _ = run_probe_server(port).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let root = probe_request(port, "/").await;
        assert!(root.starts_with("HTTP/1.1 200"));
        assert!(root.contains("Bot is alive"));

        let health = probe_request(port, "/health").await;
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.contains("components"));

        let missing = probe_request(port, "/nope").await;
        assert!(missing.starts_with("HTTP/1.1 404"));
    }
}
