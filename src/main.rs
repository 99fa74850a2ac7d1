use clap::Parser;
use parlor::core::config::{self, CliOverrides, ParlorConfig};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "parlor", about = "Terminal client for a conversational backend")]
struct Args {
    /// Backend base URL (overrides config and PARLOR_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Channel to join on startup
    #[arg(short, long)]
    channel: Option<String>,

    /// User id sent with every message
    #[arg(short, long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // The TUI owns the terminal, so logs go to parlor.log in the working directory.
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("parlor.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Using default config: {}", e);
        ParlorConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url.as_deref(),
            channel: args.channel.as_deref(),
            user: args.user.as_deref(),
        },
    );

    log::info!(
        "Parlor starting up against {} (channel: {:?})",
        resolved.base_url,
        resolved.channel_id
    );

    parlor::tui::run(resolved)
}
