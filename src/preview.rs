//! Local speech preview through the platform speech engine.
//!
//! This is an approximation of the result, spoken in the engine's own voice.
//! The engine runs as a child process so it can be cancelled by killing it.

use std::process::{Child, Command, Stdio};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to start speech engine '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait SpeechPreview {
    fn start(&mut self, text: &str) -> Result<(), PreviewError>;
    /// `false` once speech has finished on its own or been cancelled.
    fn is_active(&mut self) -> bool;
    fn cancel(&mut self);
}

pub struct CommandPreview {
    config: PreviewConfig,
    child: Option<Child>,
}

impl CommandPreview {
    pub fn new(config: PreviewConfig) -> Self {
        info!("Speech preview engine: {}", config.command);
        Self {
            config,
            child: None,
        }
    }
}

impl SpeechPreview for CommandPreview {
    fn start(&mut self, text: &str) -> Result<(), PreviewError> {
        self.cancel();

        let child = Command::new(&self.config.command)
            .args(&self.config.args)
            // Text starting with '-' must not be read as an engine option.
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PreviewError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        debug!("Preview started (pid {})", child.id());
        self.child = Some(child);
        Ok(())
    }

    fn is_active(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(status)) if status.success() => {
                debug!("Preview finished: {status}");
                self.child = None;
                false
            }
            Ok(Some(status)) => {
                warn!("Speech engine '{}' failed: {status}", self.config.command);
                self.child = None;
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Failed to poll speech engine: {e}");
                self.child = None;
                false
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Speech engine already exited: {e}");
            }
            let _ = child.wait();
            info!("Preview cancelled");
        }
    }
}

impl Drop for CommandPreview {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(command: &str, args: &[&str]) -> CommandPreview {
        CommandPreview::new(PreviewConfig {
            command: command.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn missing_engine_reports_spawn_error() {
        let mut p = preview("/nonexistent/speech-engine", &[]);
        assert!(matches!(p.start("hello"), Err(PreviewError::Spawn { .. })));
        assert!(!p.is_active());
    }

    #[cfg(unix)]
    #[test]
    fn cancel_stops_running_engine() {
        // `sh -c 'sleep 5' -- <text>` ignores the text and just runs long.
        let mut p = preview("sh", &["-c", "sleep 5"]);
        p.start("hello").unwrap();
        assert!(p.is_active());
        p.cancel();
        assert!(!p.is_active());
    }

    #[cfg(unix)]
    #[test]
    fn text_follows_end_of_options_marker() {
        let dir = tempfile::tempdir().unwrap();
        let argv = dir.path().join("argv");
        let script = format!("printf '%s\\n' \"$@\" > '{}'", argv.display());
        let mut p = preview("sh", &["-c", &script, "engine"]);

        p.start("-5 pushups today").unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while p.is_active() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let recorded = std::fs::read_to_string(&argv).unwrap();
        assert_eq!(recorded, "--\n-5 pushups today\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_engine_clears_active() {
        let mut p = preview("false", &[]);
        p.start("hello").unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while p.is_active() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(!p.is_active());
    }

    #[cfg(unix)]
    #[test]
    fn engine_finishing_clears_active() {
        let mut p = preview("true", &[]);
        p.start("hello").unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while p.is_active() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(!p.is_active());
    }
}
