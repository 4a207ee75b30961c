use crate::error::SpeechError;
use crate::PcmBuf;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

/// WAV output of a transcode, with the stream parameters that were
/// detected from the first MP3 frame.
#[derive(Debug, Clone)]
pub struct TranscodedAudio {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel.
    pub frames: usize,
}

impl TranscodedAudio {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }
}

/// Decodes MP3 into interleaved PCM, then re-encodes it as 16-bit WAV.
pub struct Transcoder {
    sample_rate: u32,
    channels: u16,
    pcm: PcmBuf,
    mp3_frames: usize,
}

impl Transcoder {
    pub fn new() -> Self {
        Self {
            sample_rate: 0,
            channels: 0,
            pcm: Vec::new(),
            mp3_frames: 0,
        }
    }

    /// Frames whose rate or channel count differ from the first decoded frame
    /// are a `Decode` error. minimp3 only yields frames once it has locked
    /// sync, so a short leading run in another format can be dropped silently.
    pub fn decode(&mut self, mp3: &[u8]) -> Result<(), SpeechError> {
        let mut decoder = minimp3::Decoder::new(Cursor::new(mp3));
        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    let sample_rate = frame.sample_rate as u32;
                    let channels = frame.channels as u16;
                    if self.mp3_frames == 0 {
                        self.sample_rate = sample_rate;
                        self.channels = channels;
                    } else if sample_rate != self.sample_rate || channels != self.channels {
                        return Err(SpeechError::Decode(format!(
                            "stream parameters changed at frame {}: {}Hz/{}ch -> {}Hz/{}ch",
                            self.mp3_frames, self.sample_rate, self.channels, sample_rate, channels
                        )));
                    }
                    self.pcm.extend_from_slice(&frame.data);
                    self.mp3_frames += 1;
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => return Err(SpeechError::Decode(format!("{:?}", e))),
            }
        }

        if self.mp3_frames == 0 || self.channels == 0 || self.pcm.is_empty() {
            return Err(SpeechError::Decode("no MP3 frames found".to_string()));
        }
        debug!(
            mp3_frames = self.mp3_frames,
            sample_rate = self.sample_rate,
            channels = self.channels,
            samples = self.pcm.len(),
            "decoded mp3 payload"
        );
        Ok(())
    }

    pub fn encode_wav(self) -> Result<TranscodedAudio, SpeechError> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.pcm.len() * 2));
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for &sample in &self.pcm {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(TranscodedAudio {
            wav: cursor.into_inner(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            frames: self.pcm.len() / self.channels as usize,
        })
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn transcode_mp3_to_wav(mp3: &[u8]) -> Result<TranscodedAudio, SpeechError> {
    let mut transcoder = Transcoder::new();
    transcoder.decode(mp3)?;
    transcoder.encode_wav()
}
