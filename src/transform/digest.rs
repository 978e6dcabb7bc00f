//! Message digest filter.

use openssl::hash::Hasher;

use crate::error::Result;
use crate::key_params::DigestAlgorithm;

use super::{message_digest, Filter};

/// Streams its input through an OpenSSL hash context and emits the digest
/// on `end`.
pub struct DigestFilter {
    hasher: Hasher,
}

impl DigestFilter {
    /// Fails for [`DigestAlgorithm::None`].
    pub fn new(algo: DigestAlgorithm) -> Result<Self> {
        Ok(DigestFilter {
            hasher: Hasher::new(message_digest(algo)?)?,
        })
    }
}

impl Filter for DigestFilter {
    fn write(&mut self, data: &[u8], _out: &mut Vec<u8>) -> Result<()> {
        self.hasher.update(data)?;
        Ok(())
    }

    fn end(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let digest = self.hasher.finish()?;
        out.extend_from_slice(&digest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::buffer_source;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string.
        let digest = buffer_source(b"")
            .push(DigestFilter::new(DigestAlgorithm::Sha256).unwrap())
            .into_vec()
            .unwrap();
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_none_algorithm_rejected() {
        assert!(DigestFilter::new(DigestAlgorithm::None).is_err());
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let bufs: [&[u8]; 2] = [b"ab", b"cd"];
        let split = crate::transform::buffers_source(&bufs)
            .push(DigestFilter::new(DigestAlgorithm::Sha256).unwrap())
            .into_vec()
            .unwrap();
        let whole = buffer_source(b"abcd")
            .push(DigestFilter::new(DigestAlgorithm::Sha256).unwrap())
            .into_vec()
            .unwrap();
        assert_eq!(split, whole);
    }
}
