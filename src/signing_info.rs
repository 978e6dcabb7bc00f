//! Caller-supplied signing instructions.

use crate::data::ValidityPeriod;
use crate::key_params::DigestAlgorithm;
use crate::name::Name;
use crate::private_key::PrivateKey;

/// Which key should sign. The variants are mutually exclusive, so a
/// request can never carry both an identity and a key; callers wanting
/// key-level precision use [`Signer::Key`] directly.
#[derive(Debug, Clone, Default)]
pub enum Signer {
    /// Use the PIB's default identity; falls back to bare SHA-256 digest
    /// signing when no default identity exists.
    #[default]
    Null,
    /// The default key of the named identity.
    Identity(Name),
    /// The named key.
    Key(Name),
    /// The key named inside the given certificate name.
    Certificate(Name),
    /// Bare SHA-256 digest, no key at all.
    Sha256,
    /// The named HMAC key; imported into the TPM on first use.
    Hmac { key_name: Name, key: PrivateKey },
}

/// Format selector for signed Interests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignedInterestFormat {
    /// Packet Format v0.3: InterestSignatureInfo/-Value elements.
    #[default]
    V03,
    /// Legacy format: SignatureInfo and SignatureValue appended to the
    /// name as components.
    V02,
}

#[derive(Debug, Clone, Default)]
pub struct SigningInfo {
    signer: Signer,
    digest_algorithm: Option<DigestAlgorithm>,
    validity_period: Option<ValidityPeriod>,
    signed_interest_format: SignedInterestFormat,
}

impl SigningInfo {
    /// Sentinel key name meaning "SHA-256 digest, no key".
    pub fn digest_sha256_identity() -> Name {
        Name::from_uri("/localhost/identity/digest-sha256").expect("static uri")
    }

    pub fn by_identity(identity: Name) -> Self {
        SigningInfo {
            signer: Signer::Identity(identity),
            ..SigningInfo::default()
        }
    }

    pub fn by_key(key_name: Name) -> Self {
        SigningInfo {
            signer: Signer::Key(key_name),
            ..SigningInfo::default()
        }
    }

    pub fn by_certificate(cert_name: Name) -> Self {
        SigningInfo {
            signer: Signer::Certificate(cert_name),
            ..SigningInfo::default()
        }
    }

    pub fn with_sha256() -> Self {
        SigningInfo {
            signer: Signer::Sha256,
            ..SigningInfo::default()
        }
    }

    pub fn with_hmac(key_name: Name, key: PrivateKey) -> Self {
        SigningInfo {
            signer: Signer::Hmac { key_name, key },
            ..SigningInfo::default()
        }
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm.unwrap_or(DigestAlgorithm::Sha256)
    }

    pub fn set_digest_algorithm(&mut self, algo: DigestAlgorithm) -> &mut Self {
        self.digest_algorithm = Some(algo);
        self
    }

    pub fn validity_period(&self) -> Option<&ValidityPeriod> {
        self.validity_period.as_ref()
    }

    pub fn set_validity_period(&mut self, period: ValidityPeriod) -> &mut Self {
        self.validity_period = Some(period);
        self
    }

    pub fn signed_interest_format(&self) -> SignedInterestFormat {
        self.signed_interest_format
    }

    pub fn set_signed_interest_format(&mut self, format: SignedInterestFormat) -> &mut Self {
        self.signed_interest_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let info = SigningInfo::default();
        assert!(matches!(info.signer(), Signer::Null));
        assert_eq!(info.digest_algorithm(), DigestAlgorithm::Sha256);
        assert_eq!(info.signed_interest_format(), SignedInterestFormat::V03);
    }

    #[test]
    fn test_digest_identity_is_stable() {
        assert_eq!(
            SigningInfo::digest_sha256_identity().to_string(),
            "/localhost/identity/digest-sha256"
        );
    }
}
