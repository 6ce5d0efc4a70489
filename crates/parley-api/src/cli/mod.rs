//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod models;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with AI models through the Parley message pipeline.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Send one message through the pipeline and print the reply.
    Ask {
        /// External account id of the sender (created on first use).
        external_id: String,

        /// Message text. May start with a `/shortcut`.
        prompt: String,

        /// Continue an existing chat instead of starting a new one.
        #[arg(long)]
        chat: Option<String>,

        /// Image to attach; its text is extracted before answering.
        #[arg(long)]
        image: Option<PathBuf>,

        /// Document to attach; its content is extracted before answering.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Manage the model catalog.
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show system status.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List catalog models.
    #[command(alias = "ls")]
    List,

    /// Add a model to the catalog.
    Add {
        /// Name the inference gateway understands.
        system_name: String,

        /// Provider ids in routing order.
        #[arg(long = "provider", required = true)]
        providers: Vec<String>,

        /// Human-readable name (defaults to the system name).
        #[arg(long)]
        display_name: Option<String>,

        /// Charge the premium quota bucket.
        #[arg(long)]
        premium: bool,

        /// Capability tags, e.g. `image_output`.
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },
}
