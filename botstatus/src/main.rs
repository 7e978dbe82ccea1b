//! Bot status monitor entry point

use botstatus::cli::{check_config, once, run, Cli, Commands};
use botstatus::config::load_env_file;
use botstatus::logging;
use botstatus::shutdown::{listen_for_signals, ShutdownController};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // セッション等は .env から読み込む(既存の環境変数より優先)
    if let Err(e) = load_env_file(&cli.env_file).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let shutdown = ShutdownController::default();
    tokio::spawn(listen_for_signals(shutdown.clone()));

    let result = match cli.command {
        Some(Commands::Once(args)) => once::execute(&args, &cli.config, shutdown.clone()).await,
        Some(Commands::CheckConfig(args)) => check_config::execute(&args, &cli.config).await,
        Some(Commands::Run(args)) => run::execute(&args, &cli.config, shutdown.clone()).await,
        None => run::execute(&run::RunArgs::default(), &cli.config, shutdown.clone()).await,
    };

    // Release the signal listener.
    shutdown.request_shutdown();

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
