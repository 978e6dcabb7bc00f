//! KeyChain: the security facade composing a PIB and a TPM.
//!
//! The KeyChain issues identities, keys, and certificates; routes signing
//! requests; and keeps the PIB and TPM in step. It recovers on its own in
//! exactly two cases: a missing default identity falls back to bare-digest
//! signing, and a PIB/TPM locator mismatch resets the PIB when the caller
//! permits it.

use tracing::{debug, trace};

use crate::certificate::{
    extract_identity_from_key_name, extract_key_name_from_cert_name, Certificate, SELF_ISSUER_ID,
};
use crate::configs::{
    default_pib_locator, default_tpm_locator, DEFAULT_PIB_SCHEME, DEFAULT_TPM_SCHEME,
};
use crate::data::{Data, SignatureInfo, ValidityPeriod};
use crate::error::{Error, Result};
use crate::interest::Interest;
use crate::key_params::{
    key_type_from_signature_type, signature_type_for, DigestAlgorithm, KeyParams, KeyType,
};
use crate::name::{Component, Name};
use crate::pib::{self, Identity, Key, MemoryPib, Pib, SqlitePib};
use crate::private_key::PrivateKey;
use crate::public_key::PublicKey;
use crate::safe_bag::SafeBag;
use crate::signing_info::{SignedInterestFormat, Signer, SigningInfo};
use crate::tlv;
use crate::tpm::{self, FileBackEnd, MemoryBackEnd, Tpm};
use crate::transform::{buffer_source, buffers_source, DigestFilter, VerifierFilter};

/// Freshness period stamped onto self-signed certificates.
const SELF_SIGNED_CERT_FRESHNESS_MS: u64 = 3_600_000;

/// Fixed payload for the SafeBag prove-of-possession check.
const PROOF_OF_POSSESSION_PAYLOAD: [u8; 4] = [0x01, 0x02, 0x03, 0x04];

const PIB_SCHEMES: [&str; 2] = [MemoryPib::SCHEME, SqlitePib::SCHEME];
const TPM_SCHEMES: [&str; 2] = [MemoryBackEnd::SCHEME, FileBackEnd::SCHEME];

/// Split a locator URI `scheme:location` at the first colon. A URI with no
/// colon is all scheme.
fn parse_locator_uri(uri: &str) -> (&str, &str) {
    match uri.split_once(':') {
        Some((scheme, location)) => (scheme, location),
        None => (uri, ""),
    }
}

fn parse_and_check(
    locator: &str,
    default_scheme: &str,
    supported: &[&str],
) -> Result<(String, String)> {
    let (scheme, location) = parse_locator_uri(locator);
    let scheme = if scheme.is_empty() {
        default_scheme
    } else {
        scheme
    };
    if !supported.contains(&scheme) {
        return Err(Error::unsupported_scheme(scheme));
    }
    Ok((scheme.to_string(), location.to_string()))
}

/// Parse and validate a PIB locator, returning `(scheme, location)`.
pub fn parse_and_check_pib_locator(locator: &str) -> Result<(String, String)> {
    parse_and_check(locator, DEFAULT_PIB_SCHEME, &PIB_SCHEMES)
}

/// Parse and validate a TPM locator, returning `(scheme, location)`.
pub fn parse_and_check_tpm_locator(locator: &str) -> Result<(String, String)> {
    parse_and_check(locator, DEFAULT_TPM_SCHEME, &TPM_SCHEMES)
}

fn canonical(scheme: &str, location: &str) -> String {
    format!("{}:{}", scheme, location)
}

fn canonical_default_pib_locator() -> String {
    let locator = default_pib_locator();
    let (scheme, location) = parse_locator_uri(&locator);
    let scheme = if scheme.is_empty() {
        DEFAULT_PIB_SCHEME
    } else {
        scheme
    };
    canonical(scheme, location)
}

fn canonical_default_tpm_locator() -> String {
    let locator = default_tpm_locator();
    let (scheme, location) = parse_locator_uri(&locator);
    let scheme = if scheme.is_empty() {
        DEFAULT_TPM_SCHEME
    } else {
        scheme
    };
    canonical(scheme, location)
}

pub struct KeyChain {
    pib: Pib,
    tpm: Tpm,
}

impl KeyChain {
    /// Open the PIB and TPM named by the locators.
    ///
    /// The recorded TPM locator in the PIB must agree with the requested
    /// one; on disagreement the PIB is reset when `allow_reset` is true,
    /// otherwise construction fails with [`Error::LocatorMismatch`]. A
    /// default-located PIB paired with a stale non-default TPM is reset
    /// silently and adopts the default TPM.
    ///
    /// # Arguments
    ///
    /// * `pib_locator` - `scheme:location` selecting the PIB backend; an
    ///   empty scheme selects `pib-sqlite3`
    /// * `tpm_locator` - `scheme:location` selecting the TPM backend; an
    ///   empty scheme selects `tpm-file`
    /// * `allow_reset` - whether a TPM locator mismatch may wipe the PIB
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either scheme is not a registered backend
    /// - Backend storage cannot be opened
    /// - The recorded and requested TPM locators disagree and
    ///   `allow_reset` is false
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ndn_keychain::KeyChain;
    /// # fn example() -> ndn_keychain::Result<()> {
    /// let key_chain = KeyChain::new("pib-sqlite3:/var/lib/ndn", "tpm-file:", false)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pib_locator: &str, tpm_locator: &str, allow_reset: bool) -> Result<Self> {
        let (pib_scheme, pib_location) = parse_and_check_pib_locator(pib_locator)?;
        let canonical_pib_locator = canonical(&pib_scheme, &pib_location);

        let pib = pib::create_pib(&pib_scheme, &pib_location)?;
        let old_tpm_locator = pib.tpm_locator()?;

        let (tpm_scheme, tpm_location) = parse_and_check_tpm_locator(tpm_locator)?;
        let mut canonical_tpm_locator = canonical(&tpm_scheme, &tpm_location);

        if canonical_pib_locator == canonical_default_pib_locator() {
            // The default PIB must pair with the default TPM; a stale
            // record is dropped rather than reported.
            if let Some(old) = &old_tpm_locator {
                if *old != canonical_default_tpm_locator() {
                    pib.reset()?;
                    canonical_tpm_locator = canonical_default_tpm_locator();
                }
            }
        } else if let Some(old) = &old_tpm_locator {
            if *old != canonical_tpm_locator {
                if allow_reset {
                    pib.reset()?;
                } else {
                    return Err(Error::LocatorMismatch {
                        recorded: old.clone(),
                        requested: canonical_tpm_locator,
                    });
                }
            }
        }

        let (tpm_scheme, tpm_location) = parse_and_check_tpm_locator(&canonical_tpm_locator)?;
        let tpm = tpm::create_tpm(&tpm_scheme, &tpm_location)?;
        pib.set_tpm_locator(&canonical_tpm_locator)?;

        Ok(KeyChain { pib, tpm })
    }

    /// Open the configured default PIB and TPM (environment variables,
    /// client configuration file, built-in defaults).
    pub fn with_defaults() -> Result<Self> {
        KeyChain::new(&default_pib_locator(), &default_tpm_locator(), true)
    }

    pub fn pib(&self) -> &Pib {
        &self.pib
    }

    pub fn tpm(&self) -> &Tpm {
        &self.tpm
    }

    // Identity and key lifecycle.

    /// Ensure `identity_name` exists with a default key and a self-signed
    /// default certificate.
    pub fn create_identity(&mut self, identity_name: &Name, params: &KeyParams) -> Result<Identity> {
        let identity = self.pib.add_identity(identity_name)?;

        let key = match identity.default_key() {
            Ok(key) => key,
            Err(Error::Pib(_)) => self.create_key(&identity, params)?,
            Err(e) => return Err(e),
        };

        match key.default_certificate() {
            Ok(_) => {}
            Err(Error::Pib(_)) => {
                debug!(key = %key.name(), "no default certificate, requesting self-signing");
                self.self_sign(&key)?;
            }
            Err(e) => return Err(e),
        }

        Ok(identity)
    }

    /// Generate a key in the TPM, record it in the PIB, and self-sign it.
    pub fn create_key(&mut self, identity: &Identity, params: &KeyParams) -> Result<Key> {
        let key_name = self.tpm.create_key(identity.name(), params)?;
        let public_key = self.tpm.get_public_key(&key_name)?.ok_or_else(|| {
            Error::Tpm(format!("Key `{}` vanished during creation", key_name))
        })?;
        let key = identity.add_key(&public_key, &key_name, params.key_type())?;

        debug!(key = %key.name(), "requesting self-signing for newly created key");
        self.self_sign(&key)?;
        Ok(key)
    }

    /// Generate an HMAC key in the TPM under `prefix`. HMAC keys have no
    /// public half and are not recorded in the PIB.
    pub fn create_hmac_key(&mut self, prefix: &Name, params: &KeyParams) -> Result<Name> {
        if params.key_type() != KeyType::Hmac {
            return Err(Error::InvalidArgument(format!(
                "Expected HMAC key params, got {}",
                params.key_type()
            )));
        }
        self.tpm.create_key(prefix, params)
    }

    /// Delete all of the identity's TPM keys, then its PIB record.
    /// Proceeds best-effort per key and surfaces the first TPM failure.
    pub fn delete_identity(&mut self, identity: &Identity) -> Result<()> {
        let mut first_failure = None;
        for key in identity.keys()? {
            if let Err(e) = self.tpm.delete_key(key.name()) {
                first_failure.get_or_insert(e);
            }
        }
        self.pib.remove_identity(identity.name())?;
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Remove the key from the PIB first, then from the TPM.
    pub fn delete_key(&mut self, identity: &Identity, key: &Key) -> Result<()> {
        if identity.name() != key.identity() {
            return Err(Error::InvalidArgument(format!(
                "Identity `{}` does not match key `{}`",
                identity.name(),
                key.name()
            )));
        }
        identity.remove_key(key.name())?;
        self.tpm.delete_key(key.name())
    }

    pub fn set_default_identity(&mut self, identity: &Identity) -> Result<()> {
        self.pib.set_default_identity(identity.name()).map(|_| ())
    }

    pub fn set_default_key(&mut self, identity: &Identity, key: &Key) -> Result<()> {
        if identity.name() != key.identity() {
            return Err(Error::InvalidArgument(format!(
                "Identity `{}` does not match key `{}`",
                identity.name(),
                key.name()
            )));
        }
        identity.set_default_key(key.name()).map(|_| ())
    }

    /// Attach a certificate to its key. The certificate name and content
    /// must match the key.
    pub fn add_certificate(&self, key: &Key, cert: &Certificate) -> Result<()> {
        if *key.name() != cert.key_name() || cert.public_key_bits() != key.public_key_bits() {
            return Err(Error::InvalidArgument(format!(
                "Key `{}` does not match certificate `{}`",
                key.name(),
                cert.name()
            )));
        }
        key.add_certificate(cert)
    }

    pub fn delete_certificate(&self, key: &Key, cert_name: &Name) -> Result<()> {
        if !Certificate::is_valid_name(cert_name) {
            return Err(Error::InvalidArgument(format!(
                "Wrong certificate name `{}`",
                cert_name
            )));
        }
        key.remove_certificate(cert_name)
    }

    pub fn set_default_certificate(&self, key: &Key, cert: &Certificate) -> Result<()> {
        self.add_certificate(key, cert)?;
        key.set_default_certificate(cert.name()).map(|_| ())
    }

    // SafeBag export/import.

    /// Export the certificate and its private key, encrypted under
    /// `password`.
    pub fn export_safe_bag(&self, cert: &Certificate, password: &[u8]) -> Result<SafeBag> {
        let key_name = cert.key_name();
        let encrypted_key = self
            .tpm
            .export_private_key(&key_name, password)
            .map_err(|e| {
                Error::KeyChain(format!(
                    "Failed to export private key `{}`: {}",
                    key_name, e
                ))
            })?;
        Ok(SafeBag::new(cert.data().clone(), encrypted_key))
    }

    /// Import a SafeBag: resolve the key type from the certificate's
    /// signature type, load the private key, prove possession by
    /// sign-and-verify over a fixed payload, then record everything. A
    /// freshly imported TPM key is rolled back on any later failure.
    pub fn import_safe_bag(&mut self, safe_bag: &SafeBag, password: &[u8]) -> Result<()> {
        let cert = Certificate::try_from(safe_bag.certificate().clone())?;
        let identity = cert.identity();
        let key_name = cert.key_name();
        let public_key_bits = cert.public_key_bits().to_vec();

        // The signature type is authoritative: SM2 and EC key blobs are
        // indistinguishable, but only SM2 certificates carry Sm3WithSm2.
        let key_type_from_sig = key_type_from_signature_type(cert.signature_type());
        if key_type_from_sig == KeyType::Hmac {
            return Err(Error::InvalidArgument(
                "HMAC keys cannot be transported in a SafeBag".to_string(),
            ));
        }

        let private_key =
            PrivateKey::from_pkcs8(safe_bag.encrypted_key(), password).map_err(|e| {
                Error::KeyChain(format!("Failed to import private key `{}`: {}", key_name, e))
            })?;
        let key_type = if key_type_from_sig != KeyType::None
            && key_type_from_sig != private_key.key_type()
        {
            key_type_from_sig
        } else {
            private_key.key_type()
        };

        if self.tpm.has_key(&key_name)? {
            return Err(Error::KeyChain(format!(
                "Private key `{}` already exists",
                key_name
            )));
        }
        if let Ok(existing) = self.pib.get_identity(&identity) {
            if existing.get_key(&key_name).is_ok() {
                return Err(Error::KeyChain(format!(
                    "Public key `{}` already exists",
                    key_name
                )));
            }
        }

        self.tpm
            .import_key_pair(&key_name, private_key.with_key_type(key_type))
            .map_err(|e| {
                Error::KeyChain(format!("Failed to import private key `{}`: {}", key_name, e))
            })?;

        if let Err(e) = self.check_imported_key(&cert, &key_name, &public_key_bits, key_type) {
            self.tpm.delete_key(&key_name)?;
            return Err(e);
        }

        if let Err(e) = (|| -> Result<()> {
            let id = self.pib.add_identity(&identity)?;
            let key = id.add_key(&public_key_bits, &key_name, key_type)?;
            key.add_certificate(&cert)
        })() {
            self.tpm.delete_key(&key_name)?;
            return Err(e);
        }
        Ok(())
    }

    /// Prove possession: sign a fixed payload with the imported key and
    /// verify with the certificate's public key.
    fn check_imported_key(
        &self,
        cert: &Certificate,
        key_name: &Name,
        public_key_bits: &[u8],
        key_type: KeyType,
    ) -> Result<()> {
        let digest = if key_type == KeyType::Sm2 {
            DigestAlgorithm::Sm3
        } else {
            DigestAlgorithm::Sha256
        };

        let signature = match self
            .tpm
            .sign(&[&PROOF_OF_POSSESSION_PAYLOAD], key_name, key_type, digest)
        {
            Ok(Some(sig)) => sig,
            _ => {
                return Err(Error::KeyChain(format!(
                    "Invalid private key `{}`",
                    key_name
                )))
            }
        };

        let public_key = PublicKey::from_pkcs8(public_key_bits)?;
        let verified = buffer_source(&PROOF_OF_POSSESSION_PAYLOAD)
            .push(VerifierFilter::new(digest, &public_key, key_type, &signature)?)
            .into_bool()?;
        if !verified {
            return Err(Error::KeyChain(format!(
                "Certificate `{}` and private key `{}` do not match",
                cert.name(),
                key_name
            )));
        }
        Ok(())
    }

    /// Import a loaded private key; the name must be free in the TPM.
    pub fn import_private_key(&mut self, key_name: &Name, key: PrivateKey) -> Result<()> {
        if self.tpm.has_key(key_name)? {
            return Err(Error::KeyChain(format!(
                "Private key `{}` already exists",
                key_name
            )));
        }
        self.tpm.import_key_pair(key_name, key).map_err(|e| {
            Error::KeyChain(format!("Failed to import private key `{}`: {}", key_name, e))
        })
    }

    // Signing.

    /// Produce a self-signed certificate for `key` and attach it.
    pub fn self_sign(&mut self, key: &Key) -> Result<Certificate> {
        let mut cert_name = key.name().clone();
        cert_name.push(Component::generic(SELF_ISSUER_ID.to_vec()));
        cert_name.append_version(None);

        let mut data = Data::new(cert_name);
        data.set_content_type(tlv::CONTENT_TYPE_KEY);
        data.set_freshness_period_ms(SELF_SIGNED_CERT_FRESHNESS_MS);
        data.set_content(key.public_key_bits().to_vec());

        let mut params = SigningInfo::by_key(key.name().clone());
        params.set_validity_period(ValidityPeriod::twenty_years_from_now());
        self.sign_data(&mut data, &params)?;

        let cert = Certificate::try_from(data)?;
        key.add_certificate(&cert)?;
        Ok(cert)
    }

    /// Sign a Data packet in place according to `params`.
    pub fn sign_data(&mut self, data: &mut Data, params: &SigningInfo) -> Result<()> {
        let (key_name, sig_info) = self.prepare_signature_info(params)?;
        let key_type = key_type_from_signature_type(sig_info.signature_type());

        data.set_signature_info(sig_info);
        let signed_portion = data.signed_portion()?;
        let signature = self.sign_buffers(
            &[&signed_portion],
            &key_name,
            key_type,
            params.digest_algorithm(),
        )?;
        data.set_signature_value(signature);
        Ok(())
    }

    /// Sign an Interest in place, in v0.3 or legacy format.
    pub fn sign_interest(&mut self, interest: &mut Interest, params: &SigningInfo) -> Result<()> {
        let (key_name, sig_info) = self.prepare_signature_info(params)?;
        let key_type = key_type_from_signature_type(sig_info.signature_type());

        match params.signed_interest_format() {
            SignedInterestFormat::V03 => {
                interest.set_signature_info(sig_info);
                let ranges = interest.signed_ranges()?;
                let refs: Vec<&[u8]> = ranges.iter().map(Vec::as_slice).collect();
                let signature =
                    self.sign_buffers(&refs, &key_name, key_type, params.digest_algorithm())?;
                interest.set_signature_value(signature);
            }
            SignedInterestFormat::V02 => {
                // Pre-v0.3 signed Interests append the Data-format
                // SignatureInfo and SignatureValue blocks as components.
                let mut signed_name = interest.name().clone();
                signed_name.push(Component::generic(sig_info.wire_encode()));

                let signature = self.sign_buffers(
                    &[&signed_name.encode_value()],
                    &key_name,
                    key_type,
                    params.digest_algorithm(),
                )?;
                let mut sig_value_block = Vec::new();
                tlv::write_tlv(&mut sig_value_block, tlv::SIGNATURE_VALUE, &signature);
                signed_name.push(Component::generic(sig_value_block));
                interest.set_name(signed_name);
            }
        }
        Ok(())
    }

    /// Resolve signing instructions down to a concrete key name and the
    /// SignatureInfo to place on the packet.
    fn prepare_signature_info(&mut self, params: &SigningInfo) -> Result<(Name, SignatureInfo)> {
        let mut sig_info = SignatureInfo::default();
        if let Some(period) = params.validity_period() {
            sig_info.set_validity_period(*period);
        }

        let key: Key = match params.signer() {
            Signer::Null => match self.pib.default_identity() {
                Ok(identity) => identity.default_key().map_err(|_| {
                    Error::InvalidSigningInfo(format!(
                        "Signing identity `{}` does not have a default key",
                        identity.name()
                    ))
                })?,
                Err(Error::Pib(_)) => {
                    // No default identity: fall back to bare digest signing.
                    sig_info.set_signature_type(tlv::SIGNATURE_DIGEST_SHA256);
                    trace!(?sig_info, "prepared signature info");
                    return Ok((SigningInfo::digest_sha256_identity(), sig_info));
                }
                Err(e) => return Err(e),
            },
            Signer::Identity(name) => {
                let identity = self.pib.get_identity(name).map_err(|_| {
                    Error::InvalidSigningInfo(format!(
                        "Signing identity `{}` does not exist",
                        name
                    ))
                })?;
                identity.default_key().map_err(|_| {
                    Error::InvalidSigningInfo(format!(
                        "Signing identity `{}` does not have a default key",
                        name
                    ))
                })?
            }
            Signer::Key(name) => {
                let identity_name = extract_identity_from_key_name(name)?;
                self.pib
                    .get_identity(&identity_name)
                    .and_then(|identity| identity.get_key(name))
                    .map_err(|_| {
                        Error::InvalidSigningInfo(format!(
                            "Signing key `{}` does not exist",
                            name
                        ))
                    })?
            }
            Signer::Certificate(name) => {
                let key_name = extract_key_name_from_cert_name(name)?;
                let identity_name = extract_identity_from_key_name(&key_name)?;
                self.pib
                    .get_identity(&identity_name)
                    .and_then(|identity| identity.get_key(&key_name))
                    .map_err(|_| {
                        Error::InvalidSigningInfo(format!(
                            "Signing certificate `{}` does not exist",
                            name
                        ))
                    })?
            }
            Signer::Sha256 => {
                sig_info.set_signature_type(tlv::SIGNATURE_DIGEST_SHA256);
                trace!(?sig_info, "prepared signature info");
                return Ok((SigningInfo::digest_sha256_identity(), sig_info));
            }
            Signer::Hmac { key_name, key } => {
                if !self.tpm.has_key(key_name)? {
                    self.tpm.import_key_pair(key_name, key.clone())?;
                }
                sig_info.set_signature_type(signature_type_for(
                    KeyType::Hmac,
                    params.digest_algorithm(),
                )?);
                sig_info.set_key_locator(key_name.clone());
                trace!(?sig_info, "prepared signature info");
                return Ok((key_name.clone(), sig_info));
            }
        };

        sig_info.set_signature_type(signature_type_for(
            key.key_type(),
            params.digest_algorithm(),
        )?);
        sig_info.set_key_locator(key.name().clone());
        trace!(?sig_info, "prepared signature info");
        Ok((key.name().clone(), sig_info))
    }

    /// Low-level signing routine. The sentinel digest identity yields a
    /// plain SHA-256; SM2 keys force SM3; a TPM miss is an
    /// `InvalidSigningInfo` error.
    pub fn sign_buffers(
        &self,
        bufs: &[&[u8]],
        key_name: &Name,
        key_type: KeyType,
        digest: DigestAlgorithm,
    ) -> Result<Vec<u8>> {
        if *key_name == SigningInfo::digest_sha256_identity() {
            return buffers_source(bufs)
                .push(DigestFilter::new(DigestAlgorithm::Sha256)?)
                .into_vec();
        }

        let digest = if key_type == KeyType::Sm2 {
            DigestAlgorithm::Sm3
        } else {
            digest
        };

        match self.tpm.sign(bufs, key_name, key_type, digest)? {
            Some(signature) => Ok(signature),
            None => Err(Error::InvalidSigningInfo(format!(
                "TPM signing failed for key `{}` (the PIB knows the key, but the TPM is \
                 missing the corresponding private key)",
                key_name
            ))),
        }
    }
}

impl std::fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyChain")
            .field("pib", &self.pib)
            .field("tpm", &self.tpm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification_helpers::{verify_data_with_certificate, verify_data_with_key};

    fn memory_key_chain() -> KeyChain {
        KeyChain::new("pib-memory:", "tpm-memory:", true).unwrap()
    }

    #[test]
    fn test_locator_parse_round_trip() {
        for (uri, scheme, location) in [
            ("pib-memory:", "pib-memory", ""),
            ("pib-sqlite3:/tmp/x", "pib-sqlite3", "/tmp/x"),
            ("pib-memory", "pib-memory", ""),
            ("", DEFAULT_PIB_SCHEME, ""),
        ] {
            let (s, l) = parse_and_check_pib_locator(uri).unwrap();
            assert_eq!((s.as_str(), l.as_str()), (scheme, location));
            let (s2, l2) = parse_and_check_pib_locator(&canonical(&s, &l)).unwrap();
            assert_eq!((s2, l2), (s, l));
        }
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let err = KeyChain::new("pib-exotic:", "tpm-memory:", true).unwrap_err();
        assert_eq!(err.to_string(), "pib-exotic is not supported");
        let err = KeyChain::new("pib-memory:", "tpm-osx:", true).unwrap_err();
        assert_eq!(err.to_string(), "tpm-osx is not supported");
    }

    #[test]
    fn test_create_identity_builds_full_chain() {
        let mut key_chain = memory_key_chain();
        let name = Name::from_uri("/pib/interface").unwrap();
        let identity = key_chain
            .create_identity(&name, &KeyParams::default())
            .unwrap();

        let key = identity.default_key().unwrap();
        assert_eq!(key.key_type(), KeyType::Ec);
        assert!(key_chain.tpm().has_key(key.name()).unwrap());

        let cert = key.default_certificate().unwrap();
        assert!(cert.is_self_signed());
        assert_eq!(cert.public_key_bits(), key.public_key_bits());
        assert!(cert.validity_period().is_some());
        assert!(verify_data_with_certificate(cert.data(), &cert));
    }

    #[test]
    fn test_every_pib_key_has_tpm_material() {
        let mut key_chain = memory_key_chain();
        for uri in ["/alice", "/bob", "/carol"] {
            key_chain
                .create_identity(&Name::from_uri(uri).unwrap(), &KeyParams::default())
                .unwrap();
        }
        for identity in key_chain.pib().identities().unwrap() {
            for key in identity.keys().unwrap() {
                assert!(key_chain.tpm().has_key(key.name()).unwrap());
            }
        }
    }

    #[test]
    fn test_delete_key_removes_both_sides() {
        let mut key_chain = memory_key_chain();
        let identity = key_chain
            .create_identity(&Name::from_uri("/alice").unwrap(), &KeyParams::default())
            .unwrap();
        let key = identity.default_key().unwrap();
        let key_name = key.name().clone();

        key_chain.delete_key(&identity, &key).unwrap();
        assert!(!key_chain.tpm().has_key(&key_name).unwrap());
        assert!(identity.get_key(&key_name).is_err());
    }

    #[test]
    fn test_delete_identity_removes_tpm_keys() {
        let mut key_chain = memory_key_chain();
        let identity = key_chain
            .create_identity(&Name::from_uri("/alice").unwrap(), &KeyParams::default())
            .unwrap();
        key_chain.create_key(&identity, &KeyParams::rsa()).unwrap();
        let names: Vec<Name> = identity
            .keys()
            .unwrap()
            .iter()
            .map(|k| k.name().clone())
            .collect();
        assert_eq!(names.len(), 2);

        key_chain.delete_identity(&identity).unwrap();
        for name in names {
            assert!(!key_chain.tpm().has_key(&name).unwrap());
        }
        assert!(key_chain
            .pib()
            .get_identity(&Name::from_uri("/alice").unwrap())
            .is_err());
    }

    #[test]
    fn test_add_certificate_checks_key_match() {
        let mut key_chain = memory_key_chain();
        let alice = key_chain
            .create_identity(&Name::from_uri("/alice").unwrap(), &KeyParams::default())
            .unwrap();
        let bob = key_chain
            .create_identity(&Name::from_uri("/bob").unwrap(), &KeyParams::default())
            .unwrap();

        let alice_key = alice.default_key().unwrap();
        let bob_cert = bob.default_key().unwrap().default_certificate().unwrap();
        assert!(matches!(
            key_chain.add_certificate(&alice_key, &bob_cert),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bare_digest_fallback_without_default_identity() {
        let mut key_chain = memory_key_chain();
        let mut data = Data::new(Name::from_uri("/unsigned/data").unwrap());
        key_chain
            .sign_data(&mut data, &SigningInfo::default())
            .unwrap();

        let info = data.signature_info().unwrap();
        assert_eq!(info.signature_type(), tlv::SIGNATURE_DIGEST_SHA256);

        let expected = buffer_source(&data.signed_portion().unwrap())
            .push(DigestFilter::new(DigestAlgorithm::Sha256).unwrap())
            .into_vec()
            .unwrap();
        assert_eq!(data.signature_value(), expected);
    }

    #[test]
    fn test_sign_data_with_default_identity() {
        let mut key_chain = memory_key_chain();
        let identity = key_chain
            .create_identity(&Name::from_uri("/alice").unwrap(), &KeyParams::default())
            .unwrap();
        let key = identity.default_key().unwrap();

        let mut data = Data::new(Name::from_uri("/alice/doc").unwrap());
        data.set_content(b"payload".to_vec());
        key_chain
            .sign_data(&mut data, &SigningInfo::default())
            .unwrap();

        let info = data.signature_info().unwrap();
        assert_eq!(info.signature_type(), tlv::SIGNATURE_SHA256_WITH_ECDSA);
        assert_eq!(info.key_locator(), Some(key.name()));
        assert!(verify_data_with_key(&data, &key));
    }

    #[test]
    fn test_sign_with_missing_signer_fails() {
        let mut key_chain = memory_key_chain();
        let mut data = Data::new(Name::from_uri("/x").unwrap());
        let params = SigningInfo::by_identity(Name::from_uri("/nobody").unwrap());
        assert!(matches!(
            key_chain.sign_data(&mut data, &params),
            Err(Error::InvalidSigningInfo(_))
        ));

        let params = SigningInfo::by_key(Name::from_uri("/nobody/KEY/%00").unwrap());
        assert!(matches!(
            key_chain.sign_data(&mut data, &params),
            Err(Error::InvalidSigningInfo(_))
        ));
    }

    #[test]
    fn test_sign_interest_v03_and_legacy() {
        let mut key_chain = memory_key_chain();
        let identity = key_chain
            .create_identity(&Name::from_uri("/alice").unwrap(), &KeyParams::default())
            .unwrap();
        let key = identity.default_key().unwrap();

        let mut interest = Interest::new(Name::from_uri("/alice/cmd").unwrap());
        key_chain
            .sign_interest(&mut interest, &SigningInfo::default())
            .unwrap();
        assert!(interest.signature_info().is_some());
        assert!(!interest.signature_value().is_empty());
        assert!(crate::verification_helpers::verify_interest_with_key(
            &interest, &key
        ));

        let mut legacy = Interest::new(Name::from_uri("/alice/cmd").unwrap());
        let mut params = SigningInfo::default();
        params.set_signed_interest_format(SignedInterestFormat::V02);
        key_chain.sign_interest(&mut legacy, &params).unwrap();
        // SignatureInfo and SignatureValue were appended as components.
        assert_eq!(legacy.name().size(), 2 + 2);
    }

    #[test]
    fn test_hmac_signing_imports_key_on_demand() {
        let mut key_chain = memory_key_chain();
        let hmac_key = PrivateKey::generate_hmac(256).unwrap();
        let key_name = Name::from_uri("/localhost/identity/hmac/test").unwrap();

        let mut data = Data::new(Name::from_uri("/measurement").unwrap());
        let params = SigningInfo::with_hmac(key_name.clone(), hmac_key.clone());
        key_chain.sign_data(&mut data, &params).unwrap();

        assert!(key_chain.tpm().has_key(&key_name).unwrap());
        assert_eq!(
            data.signature_info().unwrap().signature_type(),
            tlv::SIGNATURE_HMAC_WITH_SHA256
        );

        // Verify by recomputing the MAC over the signed portion.
        let mac = key_chain
            .tpm()
            .sign(
                &[&data.signed_portion().unwrap()],
                &key_name,
                KeyType::Hmac,
                DigestAlgorithm::Sha256,
            )
            .unwrap()
            .unwrap();
        assert_eq!(mac, data.signature_value());
    }

    #[test]
    fn test_safe_bag_round_trip() {
        let mut source = memory_key_chain();
        let identity = source
            .create_identity(&Name::from_uri("/trader").unwrap(), &KeyParams::ec())
            .unwrap();
        let key = identity.default_key().unwrap();
        let cert = key.default_certificate().unwrap();

        let safe_bag = source.export_safe_bag(&cert, b"secret").unwrap();
        let wire = safe_bag.wire_encode().unwrap();

        let mut fresh = memory_key_chain();
        let reparsed = SafeBag::from_wire(&wire).unwrap();
        fresh.import_safe_bag(&reparsed, b"secret").unwrap();

        let imported = fresh
            .pib()
            .get_identity(&Name::from_uri("/trader").unwrap())
            .unwrap();
        let imported_key = imported.get_key(key.name()).unwrap();
        assert_eq!(imported_key.public_key_bits(), key.public_key_bits());

        // Signing with the imported key verifies under the original cert.
        let mut data = Data::new(Name::from_uri("/trader/doc").unwrap());
        fresh
            .sign_data(&mut data, &SigningInfo::by_key(key.name().clone()))
            .unwrap();
        assert!(verify_data_with_certificate(&data, &cert));

        // Re-import collides on both the TPM and the PIB sides.
        assert!(fresh.import_safe_bag(&reparsed, b"secret").is_err());
    }

    #[test]
    fn test_safe_bag_import_wrong_password_fails() {
        let mut source = memory_key_chain();
        let identity = source
            .create_identity(&Name::from_uri("/trader").unwrap(), &KeyParams::ec())
            .unwrap();
        let cert = identity
            .default_key()
            .unwrap()
            .default_certificate()
            .unwrap();
        let safe_bag = source.export_safe_bag(&cert, b"secret").unwrap();

        let mut fresh = memory_key_chain();
        assert!(fresh.import_safe_bag(&safe_bag, b"wrong").is_err());
        // Nothing was left behind.
        assert!(!fresh.tpm().has_key(&cert.key_name()).unwrap());
        assert!(fresh
            .pib()
            .get_identity(&Name::from_uri("/trader").unwrap())
            .is_err());
    }

    #[test]
    fn test_locator_mismatch_and_reset() {
        let pib_dir = tempfile::tempdir().unwrap();
        let tpm_a = tempfile::tempdir().unwrap();
        let tpm_b = tempfile::tempdir().unwrap();
        let pib_locator = format!("pib-sqlite3:{}", pib_dir.path().display());
        let tpm_locator_a = format!("tpm-file:{}", tpm_a.path().display());
        let tpm_locator_b = format!("tpm-file:{}", tpm_b.path().display());

        let alice = Name::from_uri("/alice").unwrap();
        {
            let mut key_chain = KeyChain::new(&pib_locator, &tpm_locator_a, false).unwrap();
            key_chain
                .create_identity(&alice, &KeyParams::default())
                .unwrap();
        }

        // Reopening with the same pair preserves content.
        {
            let key_chain = KeyChain::new(&pib_locator, &tpm_locator_a, false).unwrap();
            assert!(key_chain.pib().get_identity(&alice).is_ok());
        }

        // A different TPM without permission to reset is a hard error.
        let err = KeyChain::new(&pib_locator, &tpm_locator_b, false).unwrap_err();
        assert!(matches!(err, Error::LocatorMismatch { .. }));

        // With permission, the PIB is reset and adopts the new TPM.
        let key_chain = KeyChain::new(&pib_locator, &tpm_locator_b, true).unwrap();
        assert!(key_chain.pib().get_identity(&alice).is_err());
        assert_eq!(
            key_chain.pib().tpm_locator().unwrap(),
            Some(tpm_locator_b.clone())
        );
    }

    #[test]
    fn test_import_private_key_rejects_collision() {
        let mut key_chain = memory_key_chain();
        let key_name = Name::from_uri("/alice/KEY/%AA").unwrap();
        key_chain
            .import_private_key(&key_name, PrivateKey::generate_ec(256).unwrap())
            .unwrap();
        assert!(key_chain
            .import_private_key(&key_name, PrivateKey::generate_ec(256).unwrap())
            .is_err());
    }

    #[test]
    fn test_create_hmac_key_requires_hmac_params() {
        let mut key_chain = memory_key_chain();
        let prefix = Name::from_uri("/localhost/identity/hmac").unwrap();
        let name = key_chain
            .create_hmac_key(&prefix, &KeyParams::hmac())
            .unwrap();
        assert!(prefix.is_prefix_of(&name));
        assert!(key_chain
            .create_hmac_key(&prefix, &KeyParams::ec())
            .is_err());
    }
}
