//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use popcast_core::EntryType;

#[derive(Parser)]
#[command(name = "popcast", about = "Broadcast pop-up notifications to display stations")]
pub struct Cli {
    /// UDS socket path (default: $XDG_RUNTIME_DIR/popcast/popcast.sock)
    #[arg(long, short = 's', global = true, env = "POPCAST_SOCKET")]
    pub socket_path: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the display agent (poll loop + overlay + control socket)
    Agent(AgentOpts),
    /// Append one entry to the broadcast log
    Send(SendOpts),
    /// Claim a roster station or generate a local identity
    Provision(ProvisionOpts),
    /// List toasts visible on the running agent
    Ls,
    /// Close a toast on the running agent
    Dismiss(ToastArg),
    /// Press a toast's action control on the running agent
    Act(ToastArg),
}

#[derive(clap::Args)]
pub struct AgentOpts {
    /// Broadcast log: http(s) base URL, file:// URL or plain path
    #[arg(long, env = "POPCAST_LOG_URL")]
    pub log_url: String,

    /// Poll interval in milliseconds
    #[arg(long, env = "POPCAST_POLL_MS", default_value = "2000")]
    pub poll_ms: u64,

    #[arg(long, env = "POPCAST_SCREEN_WIDTH", default_value = "1920")]
    pub screen_width: u32,

    #[arg(long, env = "POPCAST_SCREEN_HEIGHT", default_value = "1080")]
    pub screen_height: u32,

    /// Bearer credential for the log (overrides the identity file)
    #[arg(long, env = "POPCAST_CREDENTIAL", hide_env_values = true)]
    pub credential: Option<String>,

    /// Identity file (default: <config dir>/popcast/identity.toml)
    #[arg(long, env = "POPCAST_IDENTITY_FILE")]
    pub identity_file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SendOpts {
    #[arg(long, env = "POPCAST_LOG_URL")]
    pub log_url: String,

    #[arg(long, env = "POPCAST_CREDENTIAL", hide_env_values = true)]
    pub credential: Option<String>,

    /// BROADCAST, PERSISTENT, KILL_ALERTS, LOCK_INPUT or UNLOCK_INPUT
    #[arg(long = "type", default_value = "BROADCAST", value_parser = parse_entry_type)]
    pub entry_type: EntryType,

    /// Comma-separated station ids, or ALL
    #[arg(long, default_value = "ALL")]
    pub targets: String,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub message: String,

    #[arg(long, default_value = "")]
    pub company: String,

    /// Logo image URL
    #[arg(long)]
    pub logo: Option<String>,

    /// Auto-dismiss after N seconds (0 = until dismissed)
    #[arg(long, default_value = "0")]
    pub duration: u64,
}

#[derive(clap::Args)]
pub struct ProvisionOpts {
    /// Roster station to claim (e.g. Station-3)
    #[arg(long, conflicts_with_all = ["generate", "reset"])]
    pub station: Option<String>,

    /// Generate a STATION-<OS>-<n> id
    #[arg(long, conflicts_with = "reset")]
    pub generate: bool,

    /// Delete the stored identity
    #[arg(long)]
    pub reset: bool,

    /// Credential stored with the identity
    #[arg(long, hide_env_values = true, env = "POPCAST_CREDENTIAL")]
    pub credential: Option<String>,

    #[arg(long, env = "POPCAST_IDENTITY_FILE")]
    pub identity_file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ToastArg {
    /// Toast id as shown by `popcast ls`
    pub toast_id: u64,
}

fn parse_entry_type(s: &str) -> Result<EntryType, String> {
    s.parse::<EntryType>().map_err(|e| e.to_string())
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/popcast/popcast.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/popcast-{user}/popcast.sock")
}
