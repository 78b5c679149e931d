//! Streaming AIFF writer
//!
//! Writes a `FORM`/`COMM`/`SSND` header with placeholder sizes up front,
//! appends the packed sample bytes verbatim, and patches the sizes and the
//! frame count when the stream is closed.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::{OutputStream, StreamSpec};

/// Size of the COMM chunk body (fixed for plain AIFF)
const COMM_CHUNK_SIZE: u32 = 18;

/// Offset of the FORM size field
const FORM_SIZE_OFFSET: u64 = 4;
/// Offset of the numSampleFrames field inside COMM
const COMM_FRAMES_OFFSET: u64 = 22;
/// Offset of the SSND size field
const SSND_SIZE_OFFSET: u64 = 42;
/// Total header length; sample data starts here
pub const HEADER_LEN: u64 = 54;

/// AIFF output stream
pub struct AiffStream {
    writer: BufWriter<File>,
    bytes_per_frame: u32,
    data_len: u64,
}

impl AiffStream {
    /// Create the file and write a provisional header
    pub fn create(path: &Path, spec: &StreamSpec) -> io::Result<Self> {
        if spec.bits_per_sample % 8 != 0 || spec.channels == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "unsupported AIFF layout: {} channel(s), {} bits",
                    spec.channels, spec.bits_per_sample
                ),
            ));
        }

        let mut writer = BufWriter::new(File::create(path)?);
        write_header(&mut writer, spec, 0)?;

        Ok(AiffStream {
            writer,
            bytes_per_frame: spec.bytes_per_frame() as u32,
            data_len: 0,
        })
    }

    fn finalize(&mut self) -> io::Result<()> {
        // Chunks must have even length
        if self.data_len % 2 != 0 {
            self.writer.write_all(&[0])?;
        }
        let pad = self.data_len % 2;

        let data_len = u32::try_from(self.data_len).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "sample data exceeds AIFF size limit")
        })?;
        let frames = data_len / self.bytes_per_frame;
        let ssnd_size = 8 + data_len;
        let form_size = 4 + (8 + COMM_CHUNK_SIZE) + (8 + ssnd_size) + pad as u32;

        self.writer.seek(SeekFrom::Start(FORM_SIZE_OFFSET))?;
        self.writer.write_all(&form_size.to_be_bytes())?;
        self.writer.seek(SeekFrom::Start(COMM_FRAMES_OFFSET))?;
        self.writer.write_all(&frames.to_be_bytes())?;
        self.writer.seek(SeekFrom::Start(SSND_SIZE_OFFSET))?;
        self.writer.write_all(&ssnd_size.to_be_bytes())?;
        self.writer.flush()
    }
}

impl OutputStream for AiffStream {
    fn write_raw(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.writer.write_all(bytes)?;
        self.data_len += bytes.len() as u64;
        Ok(bytes.len())
    }

    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.finalize()
    }
}

fn write_header<W: Write>(out: &mut W, spec: &StreamSpec, frames: u32) -> io::Result<()> {
    // FORM container
    out.write_all(b"FORM")?;
    out.write_all(&0u32.to_be_bytes())?;
    out.write_all(b"AIFF")?;

    // COMM
    out.write_all(b"COMM")?;
    out.write_all(&COMM_CHUNK_SIZE.to_be_bytes())?;
    out.write_all(&spec.channels.to_be_bytes())?;
    out.write_all(&frames.to_be_bytes())?;
    out.write_all(&spec.bits_per_sample.to_be_bytes())?;
    out.write_all(&sample_rate_to_extended(spec.sample_rate))?;

    // SSND, offset and block size are always zero
    out.write_all(b"SSND")?;
    out.write_all(&8u32.to_be_bytes())?;
    out.write_all(&0u32.to_be_bytes())?;
    out.write_all(&0u32.to_be_bytes())?;
    Ok(())
}

/// Encode an integer sample rate as an 80-bit IEEE 754 extended float
///
/// Integer rates are represented exactly: the value is shifted so the top
/// mantissa bit is set and the exponent compensates for the shift.
pub fn sample_rate_to_extended(rate: u32) -> [u8; 10] {
    let mut result = [0u8; 10];
    if rate == 0 {
        return result;
    }

    let shift = rate.leading_zeros() + 32;
    let mantissa = (rate as u64) << shift;
    let exponent = (16383 + 63 - shift) as u16;

    result[0..2].copy_from_slice(&exponent.to_be_bytes());
    result[2..10].copy_from_slice(&mantissa.to_be_bytes());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ContainerFormat;
    use tempfile::tempdir;

    #[test]
    fn test_extended_sample_rate_44100() {
        let bytes = sample_rate_to_extended(44100);
        assert_eq!(bytes, [0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_extended_sample_rate_48000() {
        let bytes = sample_rate_to_extended(48000);
        assert_eq!(bytes, [0x40, 0x0E, 0xBB, 0x80, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_extended_sample_rate_zero() {
        assert_eq!(sample_rate_to_extended(0), [0u8; 10]);
    }

    #[test]
    fn test_header_patched_on_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.aif");
        let spec = StreamSpec::mono_24bit(48000, ContainerFormat::Aiff);

        let mut stream = Box::new(AiffStream::create(&path, &spec).unwrap());
        assert_eq!(stream.write_raw(&[1, 2, 3, 4, 5, 6]).unwrap(), 6);
        stream.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, HEADER_LEN + 6);
        assert_eq!(&bytes[0..4], b"FORM");
        assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()), 52);
        assert_eq!(&bytes[8..12], b"AIFF");
        assert_eq!(u16::from_be_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u32::from_be_bytes(bytes[22..26].try_into().unwrap()), 2);
        assert_eq!(u16::from_be_bytes(bytes[26..28].try_into().unwrap()), 24);
        assert_eq!(&bytes[38..42], b"SSND");
        assert_eq!(u32::from_be_bytes(bytes[42..46].try_into().unwrap()), 14);
        assert_eq!(&bytes[54..], &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_odd_payload_is_padded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.aif");
        let spec = StreamSpec::mono_24bit(44100, ContainerFormat::Aiff);

        let mut stream = Box::new(AiffStream::create(&path, &spec).unwrap());
        stream.write_raw(&[0xEF, 0xCD, 0xAB]).unwrap();
        stream.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, HEADER_LEN + 4);
        assert_eq!(*bytes.last().unwrap(), 0);
        // FORM size covers the pad byte, SSND size does not
        assert_eq!(
            u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize,
            bytes.len() - 8
        );
        assert_eq!(u32::from_be_bytes(bytes[42..46].try_into().unwrap()), 11);
    }

    #[test]
    fn test_empty_stream_is_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.aif");
        let spec = StreamSpec::mono_24bit(44100, ContainerFormat::Aiff);

        Box::new(AiffStream::create(&path, &spec).unwrap())
            .close()
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, HEADER_LEN);
        assert_eq!(u32::from_be_bytes(bytes[22..26].try_into().unwrap()), 0);
    }
}
