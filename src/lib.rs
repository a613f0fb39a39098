//! mentor-voice: record voice samples, clone the voice through a remote
//! service, and speak text with it.

pub mod api;
pub mod app;
pub mod capture;
pub mod config;
pub mod history;
pub mod panel;
pub mod player;
pub mod preview;
pub mod recorder;
pub mod session;
pub mod storage;
