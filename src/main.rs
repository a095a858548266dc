use clap::Parser;
use docchat::core::config::{self, CliOverrides};
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "docchat", about = "Chat with your documents from the terminal")]
struct Args {
    /// Base URL of the document-chat server
    #[arg(short, long)]
    server: Option<String>,

    /// Delay between reloading a document and jumping to a cited page
    #[arg(long, value_name = "MS")]
    seek_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}; using defaults");
            Default::default()
        }
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            server: args.server,
            seek_delay_ms: args.seek_delay_ms,
        },
    );

    // Initialize file logger - writes to docchat.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("docchat.log") {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!("docchat starting up against {}", resolved.base_url);

    docchat::tui::run(resolved)
}
