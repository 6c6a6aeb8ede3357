// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photobooth — strip printing backend.
//
// Entry point. Initialises logging, loads configuration from the environment
// and runs the selected subcommand.

use std::process::ExitCode;

use clap::Parser;

use photobooth_core::AppConfig;
use photobooth_server::cli::{Cli, Command, ServeArgs};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            tracing::info!("Photobooth server starting");
            let mut config = AppConfig::from_env();
            if let Some(port) = args.port {
                config.port = port;
            }
            if let Some(data_dir) = args.data_dir {
                config.data_dir = data_dir;
            }
            photobooth_server::serve(config).await
        }
        Command::Print(args) => photobooth_server::cli::run_print(args).await.map(|copies| {
            tracing::info!(copies, "print queue finished");
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "photobooth exited with an error");
            ExitCode::FAILURE
        }
    }
}
