pub mod controller;
pub mod sink;

pub use controller::{active_segment_at, format_clock, PlaybackController};
pub use sink::{PlaybackError, PlaybackSink, RodioSink};
