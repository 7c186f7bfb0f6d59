//! Parla - practice spoken conversations with an AI partner, in your terminal

mod app;
mod chat;
mod conversation;
mod input_utils;
mod speech;
mod ui;
mod voice;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "parla")]
#[command(about = "Practice spoken conversations with an AI partner")]
#[command(version)]
struct Args {
    /// Chat model to use
    #[arg(short, long, default_value = "gpt-4o-mini")]
    model: String,

    /// Chat completions endpoint
    #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
    endpoint: String,

    /// Voice for speech output (e.g. alloy, nova, onyx)
    #[arg(short, long, default_value = "alloy")]
    voice: String,

    /// Language hint for speech recognition (ISO 639-1, e.g. en, es, fr)
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// Start with speech output muted
    #[arg(long)]
    mute: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let options = app::Options {
        model: args.model,
        endpoint: args.endpoint,
        voice: args.voice,
        language: args.lang,
        muted: args.mute,
    };

    // Run the app
    let mut app = app::App::new(options)?;
    app.run().await
}
