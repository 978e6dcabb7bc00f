//! Composable byte-stream transforms.
//!
//! A pipeline connects one source through any number of filters to exactly
//! one sink. Evaluation is push-driven: the source pushes chunks downstream
//! until exhausted, each filter flushes on end-of-input, and the sink
//! captures the result. Nodes are single-use; the chain is consumed by the
//! terminal call.
//!
//! ```no_run
//! # use ndn_keychain::transform::{buffer_source, Base64Encode};
//! let encoded = buffer_source(b"hello").push(Base64Encode::new()).into_vec()?;
//! # Ok::<(), ndn_keychain::Error>(())
//! ```

mod base64;
mod digest;
mod signer;
mod verifier;

pub use self::base64::{Base64Decode, Base64Encode};
pub use self::digest::DigestFilter;
pub use self::signer::SignerFilter;
pub use self::verifier::VerifierFilter;

use std::io::{Read, Write};

use openssl::hash::MessageDigest;

use crate::error::{Error, Result};
use crate::key_params::DigestAlgorithm;

/// Chunk size used when draining stream sources.
const CHUNK_SIZE: usize = 1024;

/// A pipeline stage: consumes bytes, transforms, emits bytes.
///
/// `write` may buffer internally; `end` must flush everything that remains.
pub trait Filter {
    fn write(&mut self, data: &[u8], out: &mut Vec<u8>) -> Result<()>;
    fn end(&mut self, out: &mut Vec<u8>) -> Result<()>;
}

/// Byte producer feeding the head of a pipeline.
pub trait Source {
    /// Push the entire input through `consume`, chunk by chunk.
    fn pump(&mut self, consume: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<()>;
}

struct SliceSource<'a> {
    bufs: Vec<&'a [u8]>,
}

impl Source for SliceSource<'_> {
    fn pump(&mut self, consume: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<()> {
        for buf in &self.bufs {
            if !buf.is_empty() {
                consume(buf)?;
            }
        }
        Ok(())
    }
}

struct StreamSource<R: Read> {
    reader: R,
}

impl<R: Read> Source for StreamSource<R> {
    fn pump(&mut self, consume: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            let n = self.reader.read(&mut chunk)?;
            if n == 0 {
                return Ok(());
            }
            consume(&chunk[..n])?;
        }
    }
}

/// A source joined to a growing filter chain; terminal methods evaluate it.
pub struct Pipeline<S: Source> {
    source: S,
    filters: Vec<Box<dyn Filter>>,
}

impl<S: Source> Pipeline<S> {
    /// Append a filter to the chain.
    pub fn push(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Drive the chain to completion, collecting output into a buffer.
    pub fn into_vec(self) -> Result<Vec<u8>> {
        let Pipeline {
            mut source,
            mut filters,
        } = self;
        let mut out = Vec::new();
        source.pump(&mut |chunk| feed(&mut filters, chunk, &mut out))?;
        finish(&mut filters, &mut out)?;
        Ok(out)
    }

    /// Drive the chain to completion, writing output into `writer`.
    pub fn into_writer(self, writer: &mut dyn Write) -> Result<()> {
        let out = self.into_vec()?;
        writer.write_all(&out)?;
        Ok(())
    }

    /// Drive the chain and interpret the single result byte as a boolean.
    ///
    /// Intended for chains terminated by a [`VerifierFilter`].
    pub fn into_bool(self) -> Result<bool> {
        let out = self.into_vec()?;
        match out.as_slice() {
            [b] => Ok(*b != 0),
            _ => Err(Error::InvalidArgument(format!(
                "boolean sink expects exactly one byte, got {}",
                out.len()
            ))),
        }
    }
}

fn feed(filters: &mut [Box<dyn Filter>], data: &[u8], out: &mut Vec<u8>) -> Result<()> {
    match filters.split_first_mut() {
        None => {
            out.extend_from_slice(data);
            Ok(())
        }
        Some((head, rest)) => {
            let mut mid = Vec::new();
            head.write(data, &mut mid)?;
            if !mid.is_empty() {
                feed(rest, &mid, out)?;
            }
            Ok(())
        }
    }
}

fn finish(filters: &mut [Box<dyn Filter>], out: &mut Vec<u8>) -> Result<()> {
    match filters.split_first_mut() {
        None => Ok(()),
        Some((head, rest)) => {
            let mut mid = Vec::new();
            head.end(&mut mid)?;
            if !mid.is_empty() {
                feed(rest, &mid, out)?;
            }
            finish(rest, out)
        }
    }
}

/// Pipeline fed from a single byte buffer.
pub fn buffer_source(data: &[u8]) -> Pipeline<impl Source + '_> {
    Pipeline {
        source: SliceSource { bufs: vec![data] },
        filters: Vec::new(),
    }
}

/// Pipeline fed from a sequence of byte buffers, pushed in order.
pub fn buffers_source<'a>(bufs: &[&'a [u8]]) -> Pipeline<impl Source + 'a> {
    Pipeline {
        source: SliceSource {
            bufs: bufs.to_vec(),
        },
        filters: Vec::new(),
    }
}

/// Pipeline fed from a `std::io::Read` stream.
pub fn stream_source<R: Read>(reader: R) -> Pipeline<impl Source> {
    Pipeline {
        source: StreamSource { reader },
        filters: Vec::new(),
    }
}

/// Resolve a digest algorithm to the backing OpenSSL message digest.
pub(crate) fn message_digest(algo: DigestAlgorithm) -> Result<MessageDigest> {
    match algo {
        DigestAlgorithm::Sha256 => Ok(MessageDigest::sha256()),
        DigestAlgorithm::Sm3 => Ok(MessageDigest::sm3()),
        DigestAlgorithm::None => Err(Error::InvalidArgument(
            "NONE is not a valid digest algorithm".to_string(),
        )),
    }
}
