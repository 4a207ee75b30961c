pub mod transcoder;

pub use transcoder::{transcode_mp3_to_wav, TranscodedAudio, Transcoder};
