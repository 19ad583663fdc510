use clap::Parser;
use colored::Colorize;

use galago_smoke_cli::cli::{Cli, Commands};
use galago_smoke_cli::commands;
use galago_smoke_cli::error::CliError;
use galago_smoke_cli::logging;
use galago_smoke_cli::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 로깅 초기화 (설정 파일 오류는 명령이 보고)
    let general = logging::general_config(&cli.config, cli.log_level.as_deref()).await;
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("{} {e}", "warning:".yellow().bold());
    }

    tracing::debug!(config = %cli.config.display(), "galago-smoke starting");

    let writer = OutputWriter::new(cli.output);
    let result: Result<(), CliError> = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::List => commands::list::execute(&writer),
        Commands::Preflight => commands::preflight::execute(&writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}
