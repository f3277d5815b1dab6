pub mod config;
pub mod convert;
pub mod ffmpeg;
pub mod paths;
pub mod shrink;

pub use config::AppConfig;
pub use convert::convert;
pub use ffmpeg::VideoEncoder;
pub use shrink::{fit_to_budget, FitOutcome, Transcode};
