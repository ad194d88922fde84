//! UDS JSON-RPC client for CLI subcommands.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

pub(crate) async fn rpc_call(
    socket_path: &str,
    method: &str,
    params: serde_json::Value,
) -> anyhow::Result<serde_json::Value> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to agent at {socket_path}: {e}"))?;

    let (reader, mut writer) = stream.into_split();

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });
    let mut req = serde_json::to_string(&request)?;
    req.push('\n');
    writer.write_all(req.as_bytes()).await?;
    writer.shutdown().await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response: serde_json::Value = serde_json::from_str(line.trim())?;

    if let Some(error) = response.get("error") {
        anyhow::bail!("RPC error: {error}");
    }

    Ok(response["result"].clone())
}

/// `popcast ls`: what the running agent currently shows.
pub async fn cmd_ls(socket_path: &str) -> anyhow::Result<()> {
    let snapshot = rpc_call(socket_path, "list_toasts", serde_json::json!({})).await?;
    print!("{}", format_toast_list(&snapshot));
    Ok(())
}

/// `popcast dismiss <id>`: press the close control of a toast.
pub async fn cmd_dismiss(socket_path: &str, toast_id: u64) -> anyhow::Result<()> {
    report(socket_path, "dismiss", toast_id).await
}

/// `popcast act <id>`: press the action button of a toast.
pub async fn cmd_act(socket_path: &str, toast_id: u64) -> anyhow::Result<()> {
    report(socket_path, "action", toast_id).await
}

async fn report(socket_path: &str, method: &str, toast_id: u64) -> anyhow::Result<()> {
    let result = rpc_call(
        socket_path,
        method,
        serde_json::json!({ "toast_id": toast_id }),
    )
    .await?;
    if result["handled"].as_bool() == Some(true) {
        println!("{method}: toast {toast_id}");
    } else {
        println!("{method}: toast {toast_id} ignored");
    }
    Ok(())
}

/// Pure formatting logic for `ls` output, separated for testability.
pub(crate) fn format_toast_list(snapshot: &serde_json::Value) -> String {
    let status = snapshot["status"].as_str().unwrap_or("--");
    let mode = if snapshot["interactive"].as_bool() == Some(true) {
        "interactive"
    } else {
        "click-through"
    };
    let mut out = format!("status: {status}  overlay: {mode}\n");

    let toasts = snapshot["toasts"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    if toasts.is_empty() {
        out.push_str("(no toasts)\n");
        return out;
    }

    for t in toasts {
        let id = t["id"].as_u64().unwrap_or(0);
        let kind = if t["persistent"].as_bool() == Some(true) {
            "ALERT"
        } else {
            "TOAST"
        };
        let state = t["state"].as_str().unwrap_or("?");
        let timer = match t["remaining_secs"].as_u64() {
            Some(secs) if secs > 0 => format!("{secs}s"),
            _ if t["closable"].as_bool() == Some(true) => "[x]".to_string(),
            _ => "-".to_string(),
        };
        out.push_str(&format!(
            "{id:>4}  {kind}  {state:<8} {timer:>4}  [{}] {}: {}\n",
            t["company_name"].as_str().unwrap_or(""),
            t["title"].as_str().unwrap_or(""),
            t["message"].as_str().unwrap_or(""),
        ));
    }
    out
}
