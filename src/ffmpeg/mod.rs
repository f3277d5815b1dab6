pub mod encoder;
pub mod install;
pub mod probe;
pub mod progress;

pub use encoder::{EncodeJob, VideoEncoder};
pub use install::ensure_encoder;
pub use probe::probe_duration;
pub use progress::ProgressReporter;
