//! UDS JSON-RPC control server: minimal hand-rolled implementation.
//! Connection-per-request, newline-delimited JSON.
//!
//! This is how a headless host (or a window shell) reports user
//! interaction back to the overlay.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use popcast_core::ToastId;

use crate::overlay::OverlayHandle;

/// Run the UDS JSON-RPC server.
pub async fn run_server(socket_path: &str, overlay: OverlayHandle) -> anyhow::Result<()> {
    // Create socket directory with mode 0700
    let socket_dir = std::path::Path::new(socket_path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid socket path"))?;

    std::fs::create_dir_all(socket_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    // Check for stale socket
    if std::path::Path::new(socket_path).exists() {
        if tokio::net::UnixStream::connect(socket_path).await.is_err() {
            std::fs::remove_file(socket_path)?;
            tracing::info!("removed stale socket at {socket_path}");
        } else {
            anyhow::bail!("another agent is already running at {socket_path}");
        }
    }

    let listener = UnixListener::bind(socket_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("UDS server listening on {socket_path}");

    loop {
        let (stream, _) = listener.accept().await?;
        let overlay = overlay.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, overlay).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    overlay: OverlayHandle,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let request: serde_json::Value = serde_json::from_str(line.trim())?;
    let method = request["method"].as_str().unwrap_or("");
    let id = request["id"].clone();

    let response = match dispatch_method(method, &request["params"], &overlay).await {
        Ok(result) => serde_json::json!({
            "jsonrpc": "2.0",
            "result": result,
            "id": id,
        }),
        Err(RpcError { code, message }) => serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": code, "message": message},
            "id": id,
        }),
    };

    let mut resp = serde_json::to_string(&response)?;
    resp.push('\n');
    writer.write_all(resp.as_bytes()).await?;

    Ok(())
}

struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

async fn dispatch_method(
    method: &str,
    params: &serde_json::Value,
    overlay: &OverlayHandle,
) -> Result<serde_json::Value, RpcError> {
    let internal = |e: anyhow::Error| RpcError::new(-32603, e.to_string());

    match method {
        "list_toasts" => {
            let snapshot = overlay.snapshot().await.map_err(internal)?;
            serde_json::to_value(snapshot).map_err(|e| RpcError::new(-32603, e.to_string()))
        }
        "dismiss" | "action" | "logo_failed" => {
            let toast_id = params["toast_id"]
                .as_u64()
                .map(ToastId)
                .ok_or_else(|| RpcError::new(-32602, "missing toast_id"))?;
            let handled = match method {
                "dismiss" => overlay.dismiss(toast_id).await,
                "action" => overlay.action(toast_id).await,
                _ => overlay.logo_failed(toast_id).await,
            }
            .map_err(internal)?;
            Ok(serde_json::json!({ "toast_id": toast_id, "handled": handled }))
        }
        _ => Err(RpcError::new(-32601, "method not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use popcast_core::presenter::CascadePlacement;
    use popcast_core::{Bounds, Command, EntryId, SpawnRequest, Station, ToastContent};
    use tokio::sync::mpsc;

    use crate::client::rpc_call;
    use crate::overlay::spawn_overlay;
    use crate::surface::recording::RecordingSurface;

    async fn start(dir: &std::path::Path) -> (String, OverlayHandle) {
        let station = Station::new(Box::new(CascadePlacement::new(Bounds {
            width: 1920,
            height: 1080,
        })));
        let (status_tx, _status_rx) = mpsc::unbounded_channel();
        let (overlay, _task) = spawn_overlay(station, RecordingSurface::default(), status_tx);
        let socket = dir.join("popcast.sock").to_string_lossy().into_owned();
        let server_socket = socket.clone();
        let server_overlay = overlay.clone();
        tokio::spawn(async move {
            let _ = run_server(&server_socket, server_overlay).await;
        });
        for _ in 0..100 {
            if std::path::Path::new(&socket).exists() {
                break;
            }
            tokio::task::yield_now().await;
        }
        (socket, overlay)
    }

    fn spawn_cmd(persistent: bool) -> Command {
        Command::Spawn(SpawnRequest {
            origin: EntryId::new("e-1"),
            content: ToastContent {
                company_name: "Acme".into(),
                title: "Hi".into(),
                message: "there".into(),
                logo: Some("https://cdn.example/logo.png".into()),
                duration_secs: 0,
            },
            persistent,
        })
    }

    #[tokio::test]
    async fn list_and_dismiss_over_socket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (socket, overlay) = start(dir.path()).await;
        overlay.deliver(spawn_cmd(false)).await.expect("deliver");

        let listed = rpc_call(&socket, "list_toasts", serde_json::json!({}))
            .await
            .expect("rpc");
        assert_eq!(listed["interactive"], true);
        assert_eq!(listed["status"], "ONLINE");
        let toast_id = listed["toasts"][0]["id"].as_u64().expect("id");

        let result = rpc_call(&socket, "dismiss", serde_json::json!({ "toast_id": toast_id }))
            .await
            .expect("rpc");
        assert_eq!(result["handled"], true);
    }

    #[tokio::test]
    async fn logo_failure_switches_icon() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (socket, overlay) = start(dir.path()).await;
        overlay.deliver(spawn_cmd(true)).await.expect("deliver");
        let toast_id = overlay.snapshot().await.expect("snapshot").toasts[0].id.0;

        let result = rpc_call(
            &socket,
            "logo_failed",
            serde_json::json!({ "toast_id": toast_id }),
        )
        .await
        .expect("rpc");
        assert_eq!(result["handled"], true);

        let listed = rpc_call(&socket, "list_toasts", serde_json::json!({}))
            .await
            .expect("rpc");
        assert_eq!(
            listed["toasts"][0]["icon"],
            serde_json::json!({"kind": "glyph", "value": "alert"})
        );
    }

    #[tokio::test]
    async fn bad_requests_are_rpc_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (socket, _overlay) = start(dir.path()).await;

        let err = rpc_call(&socket, "action", serde_json::json!({}))
            .await
            .expect_err("missing param");
        assert!(err.to_string().contains("-32602"));

        let err = rpc_call(&socket, "explode", serde_json::json!({}))
            .await
            .expect_err("unknown method");
        assert!(err.to_string().contains("method not found"));
    }
}
