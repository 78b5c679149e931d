//! Streaming WAV writer built on `hound`
//!
//! WAV stores integer PCM little-endian, so every packed 3-byte group is
//! sign-extended to an `i32` and handed to hound as one 24-bit sample. The
//! bytes that land in the data chunk are the packed bytes unchanged.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{OutputStream, StreamSpec};

/// WAV output stream
pub struct WavStream {
    writer: WavWriter<BufWriter<File>>,
    bytes_per_sample: usize,
}

impl WavStream {
    /// Create the file and write the RIFF header
    pub fn create(path: &Path, spec: &StreamSpec) -> io::Result<Self> {
        if spec.bits_per_sample != 24 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}-bit raw WAV output is not supported", spec.bits_per_sample),
            ));
        }

        let wav_spec = WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(path, wav_spec).map_err(hound_to_io)?;

        Ok(WavStream {
            writer,
            bytes_per_sample: 3,
        })
    }
}

impl OutputStream for WavStream {
    fn write_raw(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        for group in bytes.chunks_exact(self.bytes_per_sample) {
            let sample = unpack_le24(group);
            if let Err(e) = self.writer.write_sample(sample) {
                if written == 0 {
                    return Err(hound_to_io(e));
                }
                log::warn!("WAV write stopped after {} bytes: {}", written, e);
                break;
            }
            written += self.bytes_per_sample;
        }
        Ok(written)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        self.writer.finalize().map_err(hound_to_io)
    }
}

/// Sign-extend a little-endian 24-bit group
fn unpack_le24(group: &[u8]) -> i32 {
    let raw = i32::from_le_bytes([group[0], group[1], group[2], 0]);
    (raw << 8) >> 8
}

fn hound_to_io(e: hound::Error) -> io::Error {
    match e {
        hound::Error::IoError(io_err) => io_err,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ContainerFormat;
    use tempfile::tempdir;

    #[test]
    fn test_unpack_le24_sign_extension() {
        assert_eq!(unpack_le24(&[0xEF, 0xCD, 0x2B]), 0x2BCDEF);
        assert_eq!(unpack_le24(&[0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(unpack_le24(&[0x00, 0x00, 0x80]), -8_388_608);
    }

    #[test]
    fn test_wav_stream_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.wav");
        let spec = StreamSpec::mono_24bit(44100, ContainerFormat::Wav);

        let mut stream = Box::new(WavStream::create(&path, &spec).unwrap());
        let payload = [0x01, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xEF, 0xCD, 0xAB];
        assert_eq!(stream.write_raw(&payload).unwrap(), payload.len());
        stream.close().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let wav_spec = reader.spec();
        assert_eq!(wav_spec.channels, 1);
        assert_eq!(wav_spec.bits_per_sample, 24);
        assert_eq!(wav_spec.sample_rate, 44100);

        let samples: Vec<i32> = reader.samples::<i32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, -1, unpack_le24(&[0xEF, 0xCD, 0xAB])]);
    }

    #[test]
    fn test_wav_payload_bytes_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bytes.wav");
        let spec = StreamSpec::mono_24bit(48000, ContainerFormat::Wav);

        let payload = [0xEF, 0xCD, 0xAB, 0x12, 0x34, 0x56];
        let mut stream = Box::new(WavStream::create(&path, &spec).unwrap());
        stream.write_raw(&payload).unwrap();
        stream.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.ends_with(&payload));
    }
}
