pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod media;
pub mod synthesis;
pub mod version;

pub use error::SpeechError;

pub type Sample = i16;
pub type PcmBuf = Vec<Sample>;
