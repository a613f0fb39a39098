//! mentor-voice: record samples, clone a voice, and speak text with it.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mentor_voice::api::HttpVoiceService;
use mentor_voice::app::App;
use mentor_voice::capture::MicrophoneCapture;
use mentor_voice::config::Config;
use mentor_voice::history::{History, HistoryStore, KeyValueHistory};
use mentor_voice::panel::SpeechPanel;
use mentor_voice::player::RodioPlayer;
use mentor_voice::preview::CommandPreview;
use mentor_voice::recorder::VoiceRecorder;
use mentor_voice::session;
use mentor_voice::storage::{FileStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "mentor-voice", about = "Clone your voice and create motivational messages")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the voice service (overrides api.base_url)
    #[arg(long)]
    api_url: Option<String>,

    /// Use an existing voice instead of creating one
    #[arg(long)]
    voice_id: Option<String>,

    /// Keep history in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr, stdout belongs to the session
    let filter = if args.verbose {
        EnvFilter::new("debug,symphonia=info,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("warn,mentor_voice=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("mentor-voice starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(url) = args.api_url {
        config.api.base_url = url;
    }

    let service = HttpVoiceService::new(&config.api)?;
    info!("Voice service: {}", service.base_url());

    let history_store: Box<dyn HistoryStore> = if args.ephemeral {
        info!("History kept in memory only");
        Box::new(KeyValueHistory::new(MemoryStore::new()))
    } else {
        let store = FileStore::new(config.storage.resolved_path());
        info!("History stored in {}", store.path().display());
        Box::new(KeyValueHistory::new(store))
    };

    let recorder = VoiceRecorder::new(Box::new(MicrophoneCapture::new(config.audio.clone())));
    let panel = SpeechPanel::new(
        History::load(history_store),
        Box::new(CommandPreview::new(config.preview.clone())),
        Box::new(RodioPlayer::new()),
    )
    .with_quote_defaults(config.speech.include_quote, config.speech.quote_position);

    let mut app = App::new(Arc::new(service), recorder, panel);
    if let Some(voice_id) = args.voice_id {
        app = app.with_voice_id(voice_id);
    }

    session::run(&mut app).await?;

    info!("mentor-voice exiting");
    Ok(())
}
