//! Signing filter.

use crate::error::{Error, Result};
use crate::key_params::{DigestAlgorithm, KeyType};
use crate::private_key::PrivateKey;

use super::Filter;

/// Accumulates its input through a signing context and emits the signature
/// bytes downstream on `end`.
pub struct SignerFilter {
    key: PrivateKey,
    digest: DigestAlgorithm,
    buf: Vec<u8>,
}

impl SignerFilter {
    /// Rejects [`DigestAlgorithm::None`] and keys whose type is not
    /// signing-capable.
    pub fn new(digest: DigestAlgorithm, key: &PrivateKey, key_type: KeyType) -> Result<Self> {
        if digest == DigestAlgorithm::None {
            return Err(Error::InvalidArgument(
                "NONE is not a valid digest algorithm".to_string(),
            ));
        }
        if !key_type.is_signing_capable() {
            return Err(Error::InvalidArgument(format!(
                "Key type {} cannot sign",
                key_type
            )));
        }
        Ok(SignerFilter {
            key: key.clone().with_key_type(key_type),
            digest,
            buf: Vec::new(),
        })
    }
}

impl Filter for SignerFilter {
    fn write(&mut self, data: &[u8], _out: &mut Vec<u8>) -> Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn end(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let sig = self.key.sign_buffers(&[&self.buf], self.digest)?;
        out.extend_from_slice(&sig);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::private_key::test_vectors::*;
    use crate::transform::buffer_source;

    #[test]
    fn test_rejects_none_digest() {
        let key = PrivateKey::from_pkcs1_base64(EC_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        assert!(SignerFilter::new(DigestAlgorithm::None, &key, KeyType::Ec).is_err());
    }

    #[test]
    fn test_rejects_unsignable_key_type() {
        let key = PrivateKey::from_pkcs1_base64(EC_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        assert!(SignerFilter::new(DigestAlgorithm::Sha256, &key, KeyType::None).is_err());
    }

    #[test]
    fn test_produces_signature_bytes() {
        let key = PrivateKey::from_pkcs1_base64(EC_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        let sig = buffer_source(&[0x01, 0x02, 0x03, 0x04])
            .push(SignerFilter::new(DigestAlgorithm::Sha256, &key, KeyType::Ec).unwrap())
            .into_vec()
            .unwrap();
        assert!(!sig.is_empty());
    }
}
