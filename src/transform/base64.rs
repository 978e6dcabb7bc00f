//! Base64 encode/decode filters.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result};

use super::Filter;

/// Buffers its input and emits the standard-alphabet encoding on `end`.
#[derive(Default)]
pub struct Base64Encode {
    buf: Vec<u8>,
}

impl Base64Encode {
    pub fn new() -> Self {
        Base64Encode::default()
    }
}

impl Filter for Base64Encode {
    fn write(&mut self, data: &[u8], _out: &mut Vec<u8>) -> Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn end(&mut self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(STANDARD.encode(&self.buf).as_bytes());
        Ok(())
    }
}

/// Buffers its input, strips ASCII whitespace (PEM-style line breaks), and
/// decodes on `end`.
#[derive(Default)]
pub struct Base64Decode {
    buf: Vec<u8>,
}

impl Base64Decode {
    pub fn new() -> Self {
        Base64Decode::default()
    }
}

impl Filter for Base64Decode {
    fn write(&mut self, data: &[u8], _out: &mut Vec<u8>) -> Result<()> {
        self.buf
            .extend(data.iter().copied().filter(|b| !b.is_ascii_whitespace()));
        Ok(())
    }

    fn end(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let decoded = STANDARD
            .decode(&self.buf)
            .map_err(|e| Error::Parse(format!("invalid base64 input: {}", e)))?;
        out.extend_from_slice(&decoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::buffer_source;

    #[test]
    fn test_encode_decode_round_trip() {
        let data: Vec<u8> = (0u8..=255).collect();
        let encoded = buffer_source(&data)
            .push(Base64Encode::new())
            .into_vec()
            .unwrap();
        let decoded = buffer_source(&encoded)
            .push(Base64Decode::new())
            .into_vec()
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        let decoded = buffer_source(b"aGVs\nbG8=\n")
            .push(Base64Decode::new())
            .into_vec()
            .unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(buffer_source(b"@@@@")
            .push(Base64Decode::new())
            .into_vec()
            .is_err());
    }
}
