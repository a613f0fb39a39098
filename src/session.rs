//! Interactive terminal session.
//!
//! Reads one command per line from stdin. A 100ms tick notices when a
//! preview finishes on its own.

use std::path::PathBuf;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::api::QuotePosition;
use crate::app::App;
use crate::panel::MAX_TEXT_CHARS;

const HELP: &str = "\
Voice recorder:
  name <voice name>       set the name of the voice to create
  record                  start recording a sample
  stop                    stop recording and keep the sample
  recordings              list recorded samples
  play <n>                play sample n
  create                  upload all samples and create the voice
  voice                   show the active voice id

Text to speech:
  text <text>             set the text (max 1000 characters)
  quote on|off            include a motivational quote
  position start|end      where the quote goes
  preview                 speak the text with the local engine
  cancel                  stop the preview
  generate                speak the text with the cloned voice
  replay                  play the last generated audio again
  save <path>             write the last generated audio to a file
  history                 list recent requests
  use <n>                 load request n back into the fields

  status | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Name(String),
    Record,
    Stop,
    Recordings,
    Play(usize),
    Create,
    Voice,
    Text(String),
    Quote(bool),
    Position(QuotePosition),
    Preview,
    Cancel,
    Generate,
    Replay,
    Save(PathBuf),
    History,
    Use(usize),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "name" => Self::Name(rest.to_string()),
            "record" => Self::Record,
            "stop" => Self::Stop,
            "recordings" => Self::Recordings,
            "play" => Self::Play(parse_index(rest, "play <n>")?),
            "create" => Self::Create,
            "voice" => Self::Voice,
            "text" => Self::Text(rest.to_string()),
            "quote" => match rest.to_ascii_lowercase().as_str() {
                "on" | "yes" | "true" => Self::Quote(true),
                "off" | "no" | "false" => Self::Quote(false),
                _ => return Err(CommandError::Usage("quote on|off")),
            },
            "position" => Self::Position(
                rest.parse()
                    .map_err(|_| CommandError::Usage("position start|end"))?,
            ),
            "preview" => Self::Preview,
            "cancel" => Self::Cancel,
            "generate" => Self::Generate,
            "replay" => Self::Replay,
            "save" if !rest.is_empty() => Self::Save(PathBuf::from(rest)),
            "save" => return Err(CommandError::Usage("save <path>")),
            "history" => Self::History,
            "use" => Self::Use(parse_index(rest, "use <n>")?),
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// 1-based index as typed by the user → 0-based.
fn parse_index(arg: &str, usage: &'static str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// Run the session until `quit` or end of input.
pub async fn run(app: &mut App) -> std::io::Result<()> {
    println!("mentor-voice: clone your voice and create motivational messages");
    println!("Type 'help' for commands.");
    if let Some(id) = app.voice_id() {
        println!("Voice ID: {id}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut preview_tick = tokio::time::interval(tokio::time::Duration::from_millis(100));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => execute(app, command).await,
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            _ = preview_tick.tick() => {
                if app.panel_mut().poll_preview() {
                    println!("Preview finished.");
                }
            }
        }
    }

    app.panel_mut().stop_preview();
    app.panel_mut().stop_playback();
    if app.recorder().is_recording() {
        warn!("Exiting with a recording in progress, sample discarded");
    }
    Ok(())
}

async fn execute(app: &mut App, command: Command) {
    match command {
        Command::Name(name) => {
            app.recorder_mut().set_voice_name(&name);
            println!("Voice name: {name}");
        }
        Command::Record => match app.recorder_mut().start_recording() {
            Ok(()) => println!("Recording... type 'stop' when done."),
            Err(e) => println!("{e}"),
        },
        Command::Stop => match app.recorder_mut().stop_recording() {
            Ok(recording) => println!("Sample kept ({:.1}s).", recording.duration_secs),
            Err(e) => println!("{e}"),
        },
        Command::Recordings => {
            let recordings = app.recorder().recordings();
            println!("Recordings ({}):", recordings.len());
            for (i, r) in recordings.iter().enumerate() {
                println!(
                    "  {}. {:.1}s  recorded {}",
                    i + 1,
                    r.duration_secs,
                    r.created_at.format("%H:%M:%S")
                );
            }
        }
        Command::Play(index) => match app.play_recording(index) {
            Ok(true) => println!("Playing sample {}.", index + 1),
            Ok(false) => println!("No sample {}.", index + 1),
            Err(e) => println!("Playback failed: {e}"),
        },
        Command::Create => {
            println!("Creating voice...");
            match app.create_voice().await {
                Ok(id) => {
                    println!("Voice successfully created!");
                    println!("Voice ID: {id}");
                }
                Err(e) => println!("{e}"),
            }
        }
        Command::Voice => match app.voice_id() {
            Some(id) => println!("Voice ID: {id}"),
            None => println!("Please create a voice first using the Voice Recorder."),
        },
        Command::Text(text) => {
            let panel = app.panel_mut();
            panel.set_text(&text);
            let len = panel.text().chars().count();
            println!("Text set ({len}/{MAX_TEXT_CHARS} characters).");
        }
        Command::Quote(on) => {
            app.panel_mut().set_include_quote(on);
            println!("Include motivational quote: {}", if on { "yes" } else { "no" });
        }
        Command::Position(position) => {
            app.panel_mut().set_quote_position(position);
            println!("Quote position: {position}");
        }
        Command::Preview => match app.panel_mut().preview_speech() {
            Ok(()) => println!("Previewing... type 'cancel' to stop."),
            Err(e) => println!("{e}"),
        },
        Command::Cancel => {
            if app.panel_mut().stop_preview() {
                println!("Preview stopped.");
            }
        }
        Command::Generate => {
            println!("Generating speech...");
            match app.generate_speech().await {
                Ok(generated) => {
                    println!("Playing generated audio ({} bytes).", generated.audio.len());
                    if let Some(spoken) = &generated.spoken_text {
                        println!("Spoken text: {spoken}");
                    }
                }
                Err(e) => println!("{e}"),
            }
        }
        Command::Replay => match app.panel_mut().replay() {
            Ok(true) => {}
            Ok(false) => println!("Nothing generated yet."),
            Err(e) => println!("Playback failed: {e}"),
        },
        Command::Save(path) => {
            let Some(generated) = app.panel().last_audio() else {
                println!("Nothing generated yet.");
                return;
            };
            match tokio::fs::write(&path, &generated.audio).await {
                Ok(()) => println!("Saved to {}", path.display()),
                Err(e) => println!("Failed to save {}: {e}", path.display()),
            }
        }
        Command::History => {
            let history = app.panel().history();
            if history.is_empty() {
                println!("No history yet.");
            }
            for (i, entry) in history.iter().enumerate() {
                println!("  {}. {}", i + 1, entry.summary(60));
            }
        }
        Command::Use(index) => {
            if app.panel_mut().use_history_entry(index) {
                let panel = app.panel();
                println!(
                    "Loaded: \"{}\" (quote: {}, position: {})",
                    panel.text(),
                    if panel.include_quote() { "on" } else { "off" },
                    panel.quote_position()
                );
            } else {
                println!("No history entry {}.", index + 1);
            }
        }
        Command::Status => {
            let recorder = app.recorder();
            let panel = app.panel();
            println!("Voice ID: {}", app.voice_id().unwrap_or("(none)"));
            println!(
                "Recorder: {} sample(s), name '{}'{}",
                recorder.recordings().len(),
                recorder.voice_name(),
                if recorder.is_recording() { ", recording" } else { "" }
            );
            println!(
                "Panel: {} | {} chars | quote {} at {}",
                panel.state(),
                panel.text().chars().count(),
                if panel.include_quote() { "on" } else { "off" },
                panel.quote_position()
            );
            println!("Playback: {}", if panel.is_playing() { "playing" } else { "idle" });
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}
