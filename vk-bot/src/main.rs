//! vk-bot binary: serve the VK callback endpoint, or reset a chat's thread.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::BotConfig;

const APP_NAME: &str = "vk-assistant";

#[derive(Parser, Debug)]
#[command(name = "vk-bot")]
#[command(about = "VK community bot answering through an OpenAI assistant")]
struct Args {
    /// JSON config file
    #[arg(short, long, value_name = "PATH", default_value = "config.json", env = "VK_BOT_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the callback server (default)
    Serve(ServeArgs),
    /// Forget the thread of a chat; the next message starts a new conversation
    Reset(ResetArgs),
}

#[derive(clap::Args, Debug)]
struct ResetArgs {
    #[arg(long, value_name = "ID", allow_hyphen_values = true)]
    chat_id: i64,

    /// Server base URL (default: derived from `address` in the config)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Delete the row in the database directly; only while the server is stopped
    #[arg(long)]
    offline: bool,
}

#[derive(clap::Args, Debug, Default)]
struct ServeArgs {
    /// Overrides `address` from the config file
    #[arg(long, value_name = "ADDR")]
    address: Option<String>,

    /// Write logs to this file instead of stdout
    #[arg(long, value_name = "PATH", env = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    config::load_and_apply(APP_NAME, None).context("load environment")?;

    match args.cmd.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(serve) => {
            let mut bot = BotConfig::from_path(&args.config)
                .with_context(|| format!("config {}", args.config.display()))?;
            if let Some(address) = serve.address {
                bot.address = address;
            }
            let _guard = config::init_tracing(serve.log_file.as_deref())?;
            vk_bot::serve(&bot).await
        }
        Command::Reset(reset) => {
            let bot = BotConfig::read(&args.config)
                .with_context(|| format!("config {}", args.config.display()))?;
            let _guard = config::init_tracing(None)?;
            if reset.offline {
                return vk_bot::reset_chat_offline(&bot.database_path, reset.chat_id).await;
            }
            let secret = bot
                .vk
                .secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .context("vk.secret must be set to reset a chat on a running server (or pass --offline)")?;
            let url = reset
                .url
                .unwrap_or_else(|| vk_bot::local_admin_url(&bot.address));
            vk_bot::request_reset(&url, secret, reset.chat_id).await
        }
    }
}
