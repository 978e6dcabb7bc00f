//! Verification filter.

use openssl::memcmp;
use openssl::sign::{Signer, Verifier};

use crate::error::{Error, Result};
use crate::key_params::{DigestAlgorithm, KeyType};
use crate::private_key::PrivateKey;
use crate::public_key::PublicKey;

use super::{message_digest, Filter};

enum VerifierKey {
    Public(PublicKey),
    /// HMAC verification needs the shared secret itself.
    Hmac(PrivateKey),
}

/// Accumulates its input, finalizes verification against the expected
/// signature on `end`, and emits a single boolean result byte.
pub struct VerifierFilter {
    key: VerifierKey,
    digest: DigestAlgorithm,
    signature: Vec<u8>,
    buf: Vec<u8>,
}

impl VerifierFilter {
    /// Verifier over a public key. Rejects [`DigestAlgorithm::None`] and
    /// unusable key types.
    pub fn new(
        digest: DigestAlgorithm,
        key: &PublicKey,
        key_type: KeyType,
        signature: &[u8],
    ) -> Result<Self> {
        Self::check(digest, key_type)?;
        Ok(VerifierFilter {
            key: VerifierKey::Public(key.clone().with_key_type(key_type)),
            digest,
            signature: signature.to_vec(),
            buf: Vec::new(),
        })
    }

    /// Verifier over a private key; legal only for HMAC, where verification
    /// recomputes the MAC with the shared secret.
    pub fn new_hmac(
        digest: DigestAlgorithm,
        key: &PrivateKey,
        key_type: KeyType,
        signature: &[u8],
    ) -> Result<Self> {
        Self::check(digest, key_type)?;
        if key_type != KeyType::Hmac {
            return Err(Error::InvalidArgument(format!(
                "Private-key verification is only defined for HMAC, not {}",
                key_type
            )));
        }
        Ok(VerifierFilter {
            key: VerifierKey::Hmac(key.clone()),
            digest,
            signature: signature.to_vec(),
            buf: Vec::new(),
        })
    }

    fn check(digest: DigestAlgorithm, key_type: KeyType) -> Result<()> {
        if digest == DigestAlgorithm::None {
            return Err(Error::InvalidArgument(
                "NONE is not a valid digest algorithm".to_string(),
            ));
        }
        if !key_type.is_signing_capable() {
            return Err(Error::InvalidArgument(format!(
                "Key type {} cannot verify",
                key_type
            )));
        }
        Ok(())
    }

    fn verify(&self) -> Result<bool> {
        let md = message_digest(self.digest)?;
        match &self.key {
            VerifierKey::Public(public) => {
                let mut verifier = match Verifier::new(md, public.pkey()) {
                    Ok(v) => v,
                    // A key/digest combination the provider refuses (e.g.
                    // SHA-256 over an SM2 key) is a failed verification,
                    // not a caller error.
                    Err(_) => return Ok(false),
                };
                if verifier.update(&self.buf).is_err() {
                    return Ok(false);
                }
                Ok(verifier.verify(&self.signature).unwrap_or(false))
            }
            VerifierKey::Hmac(secret) => {
                let mut signer = Signer::new(md, secret.pkey())?;
                signer.update(&self.buf)?;
                let mac = signer.sign_to_vec()?;
                Ok(mac.len() == self.signature.len() && memcmp::eq(&mac, &self.signature))
            }
        }
    }
}

impl Filter for VerifierFilter {
    fn write(&mut self, data: &[u8], _out: &mut Vec<u8>) -> Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn end(&mut self, out: &mut Vec<u8>) -> Result<()> {
        out.push(u8::from(self.verify()?));
        Ok(())
    }
}
