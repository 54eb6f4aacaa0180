use std::path::PathBuf;

use anyhow::Context;
use blockgate_node::RepoError;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use directories::ProjectDirs;

mod init_config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the blockgate repo; defaults to $BLOCKGATE_PATH, then the
    /// user data directory
    #[arg(short, long, value_name = "PATH")]
    repo: Option<PathBuf>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the repo and write its default config
    Init(init_config::CmdInit),
    /// Start the daemon and serve the block store over HTTP
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let repo_root = match cli.repo {
        Some(path) => path,
        None => match std::env::var_os("BLOCKGATE_PATH") {
            Some(path) => PathBuf::from(path),
            None => ProjectDirs::from("", "", "blockgate")
                .context("failed to determine repo directory path")?
                .data_dir()
                .join("repo"),
        },
    };

    match cli.cmd {
        Commands::Init(cmd) => cmd.run(&repo_root),
        Commands::Daemon => match blockgate_node::run_daemon(repo_root).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(RepoError::Missing { path }) = err.downcast_ref::<RepoError>() {
                    eprintln!("Error: no blockgate repo found in {}", path.display());
                    eprintln!("please run: blockgate init");
                    std::process::exit(1);
                }
                Err(err)
            }
        },
    }
}
