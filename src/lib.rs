pub mod api;
pub mod cli;
pub mod config;
pub mod global;
pub mod pipeline;
pub mod playback;
pub mod poller;
pub mod recording;
pub mod session;
pub mod summarize;
