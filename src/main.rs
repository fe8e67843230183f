use clap::Parser;
use colored::Colorize;

use foxesscloud_exporter::cli::{Cli, Commands};
use foxesscloud_exporter::config::StaticConfig;
use foxesscloud_exporter::runtime::modes;
use foxesscloud_exporter::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Some(Commands::Config { action }) = cli.command {
        return modes::run_config_command(action);
    }

    let mut config = match StaticConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    let guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Starting foxesscloud_exporter {}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = modes::run_server(&config).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        // 退出前刷新日志
        drop(guard);
        std::process::exit(1);
    }

    drop(guard);
    Ok(())
}
