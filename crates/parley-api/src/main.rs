//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands, ModelAction};
use parley_types::model::NewModel;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,parley=debug",
        _ => "trace",
    };
    parley_observe::tracing_setup::init_tracing(cli.otel, filter)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let (state, analytics_worker) = AppState::init(cancel.clone()).await?;

    let result = run(cli, state).await;

    // Drain queued analytics events before exiting.
    cancel.cancel();
    if let Err(e) = analytics_worker.await {
        tracing::warn!(error = %e, "analytics worker ended abnormally");
    }
    parley_observe::tracing_setup::shutdown_tracing();

    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Parley API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }
        Commands::Ask {
            external_id,
            prompt,
            chat,
            image,
            file,
        } => {
            cli::ask::ask(
                &state,
                &external_id,
                prompt,
                chat.as_deref(),
                image.as_deref(),
                file.as_deref(),
                cli.json,
            )
            .await?;
        }
        Commands::Models { action } => match action {
            ModelAction::List => cli::models::list_models(&state, cli.json).await?,
            ModelAction::Add {
                system_name,
                providers,
                display_name,
                premium,
                capabilities,
            } => {
                let new = NewModel {
                    system_name,
                    display_name,
                    providers,
                    premium,
                    capabilities,
                };
                cli::models::add_model(&state, new, cli.json).await?;
            }
        },
        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
