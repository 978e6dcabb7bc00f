//! Free-function signature verification.
//!
//! Every helper answers with a plain `bool`: a malformed packet, an
//! unusable key, or a signature that does not check out are all `false`,
//! never a panic or an error. Interest verification covers only the
//! signed ranges; freshness and replay are the caller's concern.

use openssl::memcmp;

use crate::certificate::Certificate;
use crate::data::Data;
use crate::interest::Interest;
use crate::key_params::{key_type_from_signature_type, DigestAlgorithm, KeyType};
use crate::name::Name;
use crate::pib;
use crate::public_key::PublicKey;
use crate::tlv;
use crate::tpm::Tpm;
use crate::transform::{buffers_source, DigestFilter, VerifierFilter};

/// The digest each key type uses on the wire.
fn digest_algorithm_for(key_type: KeyType) -> DigestAlgorithm {
    if key_type == KeyType::Sm2 {
        DigestAlgorithm::Sm3
    } else {
        DigestAlgorithm::Sha256
    }
}

/// Verify `signature` over `bufs` with an explicit key, key type, and
/// digest algorithm.
pub fn verify_signature(
    bufs: &[&[u8]],
    signature: &[u8],
    key: &PublicKey,
    key_type: KeyType,
    digest: DigestAlgorithm,
) -> bool {
    let filter = match VerifierFilter::new(digest, key, key_type, signature) {
        Ok(f) => f,
        Err(_) => return false,
    };
    buffers_source(bufs).push(filter).into_bool().unwrap_or(false)
}

/// Verify `signature` over `bufs` with a PKCS#8 public key blob.
pub fn verify_signature_with_bits(
    bufs: &[&[u8]],
    signature: &[u8],
    key_bits: &[u8],
    key_type: KeyType,
    digest: DigestAlgorithm,
) -> bool {
    match PublicKey::from_pkcs8(key_bits) {
        Ok(key) => verify_signature(bufs, signature, &key, key_type, digest),
        Err(_) => false,
    }
}

fn sha256_matches(bufs: &[&[u8]], signature: &[u8]) -> bool {
    let filter = match DigestFilter::new(DigestAlgorithm::Sha256) {
        Ok(f) => f,
        Err(_) => return false,
    };
    match buffers_source(bufs).push(filter).into_vec() {
        Ok(digest) => digest.len() == signature.len() && memcmp::eq(&digest, signature),
        Err(_) => false,
    }
}

/// The signed ranges and claimed signature type of a packet, if it is
/// well-formed enough to verify.
fn data_ranges(data: &Data) -> Option<(Vec<Vec<u8>>, u64)> {
    let info = data.signature_info()?;
    let signed = data.signed_portion().ok()?;
    Some((vec![signed], info.signature_type()))
}

fn interest_ranges(interest: &Interest) -> Option<(Vec<Vec<u8>>, u64)> {
    let info = interest.signature_info()?;
    let ranges = interest.signed_ranges().ok()?;
    Some((ranges, info.signature_type()))
}

fn verify_ranges(ranges: &[Vec<u8>], signature_type: u64, signature: &[u8], key_bits: &[u8]) -> bool {
    let bufs: Vec<&[u8]> = ranges.iter().map(Vec::as_slice).collect();
    if signature_type == tlv::SIGNATURE_DIGEST_SHA256 {
        return sha256_matches(&bufs, signature);
    }
    let key_type = key_type_from_signature_type(signature_type);
    if key_type == KeyType::None {
        return false;
    }
    verify_signature_with_bits(
        &bufs,
        signature,
        key_bits,
        key_type,
        digest_algorithm_for(key_type),
    )
}

/// Verify a Data packet with a PKCS#8 public key blob. `DigestSha256`
/// packets self-verify and ignore the key.
pub fn verify_data(data: &Data, key_bits: &[u8]) -> bool {
    match data_ranges(data) {
        Some((ranges, st)) => verify_ranges(&ranges, st, data.signature_value(), key_bits),
        None => false,
    }
}

/// Verify a Data packet with a PIB key.
pub fn verify_data_with_key(data: &Data, key: &pib::Key) -> bool {
    verify_data(data, key.public_key_bits())
}

/// Verify a Data packet with a certificate's public key.
pub fn verify_data_with_certificate(data: &Data, cert: &Certificate) -> bool {
    verify_data(data, cert.public_key_bits())
}

/// Verify a signed Interest with a PKCS#8 public key blob.
pub fn verify_interest(interest: &Interest, key_bits: &[u8]) -> bool {
    match interest_ranges(interest) {
        Some((ranges, st)) => verify_ranges(&ranges, st, interest.signature_value(), key_bits),
        None => false,
    }
}

/// Verify a signed Interest with a PIB key.
pub fn verify_interest_with_key(interest: &Interest, key: &pib::Key) -> bool {
    verify_interest(interest, key.public_key_bits())
}

/// Verify a signed Interest with a certificate's public key.
pub fn verify_interest_with_certificate(interest: &Interest, cert: &Certificate) -> bool {
    verify_interest(interest, cert.public_key_bits())
}

fn verify_ranges_with_tpm(
    ranges: &[Vec<u8>],
    signature: &[u8],
    tpm: &Tpm,
    key_name: &Name,
    key_type: KeyType,
    digest: DigestAlgorithm,
) -> bool {
    let bufs: Vec<&[u8]> = ranges.iter().map(Vec::as_slice).collect();
    if key_type == KeyType::Hmac {
        // Symmetric: recompute the MAC inside the TPM and compare.
        return match tpm.sign(&bufs, key_name, key_type, digest) {
            Ok(Some(mac)) => mac.len() == signature.len() && memcmp::eq(&mac, signature),
            _ => false,
        };
    }
    match tpm.get_public_key(key_name) {
        Ok(Some(bits)) => verify_signature_with_bits(&bufs, signature, &bits, key_type, digest),
        _ => false,
    }
}

/// Verify a Data packet against key material held in a TPM.
pub fn verify_data_with_tpm(
    data: &Data,
    tpm: &Tpm,
    key_name: &Name,
    key_type: KeyType,
    digest: DigestAlgorithm,
) -> bool {
    match data_ranges(data) {
        Some((ranges, _)) => {
            verify_ranges_with_tpm(&ranges, data.signature_value(), tpm, key_name, key_type, digest)
        }
        None => false,
    }
}

/// Verify a signed Interest against key material held in a TPM.
pub fn verify_interest_with_tpm(
    interest: &Interest,
    tpm: &Tpm,
    key_name: &Name,
    key_type: KeyType,
    digest: DigestAlgorithm,
) -> bool {
    match interest_ranges(interest) {
        Some((ranges, _)) => verify_ranges_with_tpm(
            &ranges,
            interest.signature_value(),
            tpm,
            key_name,
            key_type,
            digest,
        ),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_chain::KeyChain;
    use crate::key_params::KeyParams;
    use crate::private_key::test_vectors::*;
    use crate::private_key::PrivateKey;
    use crate::signing_info::SigningInfo;

    const PAYLOAD: [u8; 4] = [0x01, 0x02, 0x03, 0x04];

    #[test]
    fn test_verify_signature_explicit_tuple() {
        let key = PrivateKey::from_pkcs1_base64(EC_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        let public = PublicKey::from_pkcs8_base64(EC_PUBLIC_PKCS8_BASE64.as_bytes()).unwrap();
        let sig = key.sign_buffers(&[&PAYLOAD], DigestAlgorithm::Sha256).unwrap();

        assert!(verify_signature(
            &[&PAYLOAD],
            &sig,
            &public,
            KeyType::Ec,
            DigestAlgorithm::Sha256
        ));
        assert!(!verify_signature(
            &[&[0x05u8, 0x06][..]],
            &sig,
            &public,
            KeyType::Ec,
            DigestAlgorithm::Sha256
        ));
    }

    #[test]
    fn test_verify_with_garbage_key_bits_is_false() {
        assert!(!verify_signature_with_bits(
            &[&PAYLOAD],
            &[0u8; 64],
            b"not a key",
            KeyType::Ec,
            DigestAlgorithm::Sha256
        ));
    }

    #[test]
    fn test_digest_sha256_packets_self_verify() {
        let mut key_chain = KeyChain::new("pib-memory:", "tpm-memory:", true).unwrap();
        let mut data = Data::new(Name::from_uri("/plain").unwrap());
        key_chain
            .sign_data(&mut data, &SigningInfo::with_sha256())
            .unwrap();
        // The key argument is irrelevant for digest packets.
        assert!(verify_data(&data, b""));

        data.set_signature_value(vec![0u8; 32]);
        assert!(!verify_data(&data, b""));
    }

    #[test]
    fn test_tampered_data_fails() {
        let mut key_chain = KeyChain::new("pib-memory:", "tpm-memory:", true).unwrap();
        let identity = key_chain
            .create_identity(&Name::from_uri("/alice").unwrap(), &KeyParams::default())
            .unwrap();
        let key = identity.default_key().unwrap();

        let mut data = Data::new(Name::from_uri("/alice/doc").unwrap());
        data.set_content(b"original".to_vec());
        key_chain.sign_data(&mut data, &SigningInfo::default()).unwrap();
        assert!(verify_data_with_key(&data, &key));

        data.set_content(b"tampered".to_vec());
        assert!(!verify_data_with_key(&data, &key));
    }

    #[test]
    fn test_verify_with_tpm_asymmetric_and_hmac() {
        let mut key_chain = KeyChain::new("pib-memory:", "tpm-memory:", true).unwrap();
        let identity = key_chain
            .create_identity(&Name::from_uri("/alice").unwrap(), &KeyParams::default())
            .unwrap();
        let key = identity.default_key().unwrap();

        let mut data = Data::new(Name::from_uri("/alice/doc").unwrap());
        key_chain.sign_data(&mut data, &SigningInfo::default()).unwrap();
        assert!(verify_data_with_tpm(
            &data,
            key_chain.tpm(),
            key.name(),
            KeyType::Ec,
            DigestAlgorithm::Sha256
        ));

        let hmac_key = PrivateKey::generate_hmac(256).unwrap();
        let hmac_name = Name::from_uri("/localhost/identity/hmac/unit").unwrap();
        let mut mac_data = Data::new(Name::from_uri("/alice/mac").unwrap());
        key_chain
            .sign_data(
                &mut mac_data,
                &SigningInfo::with_hmac(hmac_name.clone(), hmac_key),
            )
            .unwrap();
        assert!(verify_data_with_tpm(
            &mac_data,
            key_chain.tpm(),
            &hmac_name,
            KeyType::Hmac,
            DigestAlgorithm::Sha256
        ));
    }

    #[test]
    fn test_unsigned_data_is_false() {
        let data = Data::new(Name::from_uri("/no/signature").unwrap());
        assert!(!verify_data(&data, b""));
    }
}
