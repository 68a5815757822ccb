//! rolechat CLI and REST API entry point.
//!
//! Binary name: `rolechat`
//!
//! Parses CLI arguments, loads configuration, initializes tracing and the
//! storage backend, then dispatches to a command handler or starts the
//! REST API server.

mod cli;

use clap::Parser;
use clap_complete::generate;

use rolechat_api::http;
use rolechat_api::state::AppState;
use rolechat_infra::config::{load_app_config, resolve_data_dir};
use rolechat_observe::tracing_setup::{
    TracingOptions, default_filter, init_tracing, shutdown_tracing,
};

use cli::{Cli, Commands, RoleCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "rolechat", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir(|key| std::env::var(key).ok());
    let loaded = load_app_config(&data_dir, cli.config.as_deref()).await;

    init_tracing(&TracingOptions {
        json: loaded.config.log.json,
        otel: loaded.config.log.otel,
        default_filter: default_filter(cli.verbose, cli.quiet),
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    // Config problems found before the subscriber existed
    loaded.log_warnings();

    let result = run(cli, loaded.config, data_dir).await;
    shutdown_tracing();
    result
}

async fn run(
    cli: Cli,
    mut config: rolechat_types::config::AppConfig,
    data_dir: std::path::PathBuf,
) -> anyhow::Result<()> {
    if let Commands::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }

    let state = AppState::init(config, data_dir).await?;

    match cli.command {
        Commands::Serve { .. } => serve(state).await?,

        Commands::Roles { action } => match action {
            RoleCommand::List => cli::role::list_roles(&state, cli.json).await?,
            RoleCommand::Create { name, persona, human } => {
                cli::role::create_role(&state, name, persona, human, cli.json).await?
            }
            RoleCommand::Sync { no_prune } => {
                cli::role::sync_roles(&state, no_prune, cli.json).await?
            }
        },

        Commands::History { role_id } => {
            cli::role::show_history(&state, &role_id, cli.json).await?
        }

        Commands::Chat { role_id, message } => {
            cli::chat::chat_once(&state, &role_id, &message, cli.json).await?
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, storage = %state.config.storage.backend, "server listening");
    println!(
        "  {} rolechat API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
