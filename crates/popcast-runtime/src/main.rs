//! popcast: broadcast pop-up notification runtime binary.
//! One process per display station; `send` is the authority side.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod client;
mod cmd_send;
mod overlay;
mod placement;
mod poll_loop;
mod provision;
mod server;
mod surface;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);

    match args.command {
        cli::Command::Agent(opts) => {
            init_tracing("info", args.log_json);
            tracing::info!("popcast agent starting");
            poll_loop::run_agent(opts, &socket_path).await?;
        }
        cli::Command::Send(opts) => {
            init_tracing("warn", args.log_json);
            cmd_send::cmd_send(opts).await?;
        }
        cli::Command::Provision(opts) => {
            init_tracing("warn", args.log_json);
            provision::cmd_provision(&opts)?;
        }
        cli::Command::Ls => {
            client::cmd_ls(&socket_path).await?;
        }
        cli::Command::Dismiss(arg) => {
            client::cmd_dismiss(&socket_path, arg.toast_id).await?;
        }
        cli::Command::Act(arg) => {
            client::cmd_act(&socket_path, arg.toast_id).await?;
        }
    }

    Ok(())
}

/// `POPCAST_LOG` wins over `RUST_LOG`. Logs go to stderr so command output
/// on stdout stays parseable.
fn init_tracing(default_filter: &str, log_json: bool) {
    let filter = std::env::var("POPCAST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_filter.to_string());
    let env_filter = tracing_subscriber::EnvFilter::new(filter);
    if log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
