// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use cmd::commands;
use cmd::common::{Backends, OutputFormat};
use cmd::config::Config;
use cmd::events::EventRenderer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "lake")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $LAKE_CONFIG_FILE, then ~/.lake.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Filesystem commands for local, DBFS, volume and workspace paths
    #[command(subcommand)]
    Fs(FsCommands),

    /// Shell completion backend
    #[command(name = "__complete", hide = true)]
    Complete(CompleteArgs),
}

#[derive(Subcommand)]
enum FsCommands {
    /// Copy files and directories
    Cp(CpArgs),
    /// Make a directory, including missing parents
    Mkdir {
        dir_path: String,
    },
    /// Remove a file or directory
    Rm {
        path: String,
        /// Remove directories and their contents
        #[arg(short, long)]
        recursive: bool,
    },
    /// List directory contents
    Ls(LsArgs),
    /// Print a file to stdout
    Cat {
        file_path: String,
    },
}

#[derive(Args)]
struct CpArgs {
    source: String,
    target: String,

    /// Copy directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Overwrite existing files
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args)]
struct LsArgs {
    path: String,

    /// Show type, size and modification time
    #[arg(short, long)]
    long: bool,

    /// Show absolute paths
    #[arg(long)]
    absolute: bool,
}

#[derive(Args)]
struct CompleteArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    let backends = Backends::from_config(&config, token)?;

    match cli.command {
        Commands::Complete(args) => {
            commands::complete_command(&backends, &args.words, |line| println!("{line}")).await;
            Ok(())
        }
        Commands::Fs(FsCommands::Cp(args)) => {
            let renderer = EventRenderer::new(cli.output)?;
            let options = commands::CopyOptions {
                recursive: args.recursive,
                overwrite: args.overwrite,
            };
            let mut render_error = None;
            commands::cp_command(&backends, &args.source, &args.target, options, |event| {
                match renderer.render(&event) {
                    Ok(line) => print!("{line}"),
                    Err(err) => render_error = Some(err),
                }
            })
            .await?;
            render_error.map_or(Ok(()), Err)
        }
        Commands::Fs(FsCommands::Mkdir { dir_path }) => {
            commands::mkdir_command(&backends, &dir_path).await
        }
        Commands::Fs(FsCommands::Rm { path, recursive }) => {
            commands::rm_command(&backends, &path, recursive).await
        }
        Commands::Fs(FsCommands::Ls(args)) => {
            let options = commands::ListOptions {
                long: args.long,
                absolute: args.absolute,
            };
            let mut lines = Vec::new();
            commands::ls_command(&backends, &args.path, options, |entry| lines.push(entry))
                .await?;
            for entry in &lines {
                print!("{}", commands::ls::render_entry(entry, args.long, cli.output)?);
            }
            Ok(())
        }
        Commands::Fs(FsCommands::Cat { file_path }) => {
            let mut stdout = tokio::io::stdout();
            commands::cat_command(&backends, &file_path, &mut stdout).await
        }
    }
}
