//! Private key abstraction over the OpenSSL EVP layer.
//!
//! A `PrivateKey` owns an EVP key handle together with its [`KeyType`] tag.
//! The tag is side-band metadata: SM2 and ECDSA P-256 keys are structurally
//! identical at the PKCS#8 level, so the loader's inference can be
//! overridden by [`PrivateKey::with_key_type`] when an authoritative source
//! (the signature type of an enclosing certificate) says otherwise.
//!
//! Loaders are constructors; a loaded key cannot be re-loaded, and dropping
//! the value releases the underlying handle.

use std::io::{Read, Write};

use openssl::ec::{EcGroup, EcKey};
use openssl::encrypt::Decrypter;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, PKeyRef, Private};
use openssl::rsa::{Padding, Rsa};
use openssl::sign::Signer;
use openssl::symm::Cipher;

use crate::error::{Error, Result};
use crate::key_params::{DigestAlgorithm, KeyParams, KeyType};
use crate::transform::{buffer_source, message_digest, stream_source, Base64Decode, Base64Encode, DigestFilter};

/// A private key usable for signing or decryption.
#[derive(Clone)]
pub struct PrivateKey {
    pkey: PKey<Private>,
    key_type: KeyType,
}

impl PrivateKey {
    fn wrap(pkey: PKey<Private>) -> Result<Self> {
        let key_type = evp_key_type(&pkey)?;
        Ok(PrivateKey { pkey, key_type })
    }

    /// Decode a PKCS#1 (or SEC1 EC/SM2) DER private key blob.
    pub fn from_pkcs1(der: &[u8]) -> Result<Self> {
        let pkey = PKey::private_key_from_der(der)
            .map_err(|e| Error::PrivateKey(format!("Failed to load private key: {}", e)))?;
        Self::wrap(pkey)
    }

    /// Decode a base64-encoded PKCS#1 private key blob.
    pub fn from_pkcs1_base64(buf: &[u8]) -> Result<Self> {
        let der = buffer_source(buf).push(Base64Decode::new()).into_vec()?;
        Self::from_pkcs1(&der)
    }

    /// Decode a base64-encoded PKCS#1 private key from a stream.
    pub fn from_pkcs1_base64_reader(reader: impl Read) -> Result<Self> {
        let der = stream_source(reader).push(Base64Decode::new()).into_vec()?;
        Self::from_pkcs1(&der)
    }

    /// Decode a PKCS#8 blob, decrypting with `password` when the blob is an
    /// EncryptedPrivateKeyInfo.
    pub fn from_pkcs8(der: &[u8], password: &[u8]) -> Result<Self> {
        let pkey = PKey::private_key_from_pkcs8_passphrase(der, password)
            .map_err(|e| Error::PrivateKey(format!("Failed to load private key: {}", e)))?;
        Self::wrap(pkey)
    }

    /// Decode a PKCS#8 blob; `password` is invoked lazily only if the blob
    /// requires one.
    pub fn from_pkcs8_callback<F>(der: &[u8], password: F) -> Result<Self>
    where
        F: FnOnce(&mut [u8]) -> std::result::Result<usize, openssl::error::ErrorStack>,
    {
        let pkey = PKey::private_key_from_pkcs8_callback(der, password)
            .map_err(|e| Error::PrivateKey(format!("Failed to load private key: {}", e)))?;
        Self::wrap(pkey)
    }

    /// Decode a base64-encoded PKCS#8 blob with a password.
    pub fn from_pkcs8_base64(buf: &[u8], password: &[u8]) -> Result<Self> {
        let der = buffer_source(buf).push(Base64Decode::new()).into_vec()?;
        Self::from_pkcs8(&der, password)
    }

    /// Wrap raw key bytes. Only HMAC keys have a raw form; other key types
    /// fail with `InvalidArgument`.
    pub fn from_raw(key_type: KeyType, bytes: &[u8]) -> Result<Self> {
        match key_type {
            KeyType::Hmac => {
                let pkey = PKey::hmac(bytes)
                    .map_err(|e| Error::PrivateKey(format!("Failed to load private key: {}", e)))?;
                Ok(PrivateKey {
                    pkey,
                    key_type: KeyType::Hmac,
                })
            }
            other => Err(Error::InvalidArgument(format!(
                "Unsupported key type {}",
                other
            ))),
        }
    }

    /// Replace the side-band key type tag.
    ///
    /// Used when an authoritative source (a certificate signature type)
    /// contradicts what the loader inferred from the blob alone.
    pub fn with_key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Key size in bits.
    pub fn key_size(&self) -> u32 {
        match self.key_type {
            KeyType::Hmac => self
                .pkey
                .raw_private_key()
                .map(|raw| raw.len() as u32 * 8)
                .unwrap_or(0),
            _ => self.pkey.bits(),
        }
    }

    /// Digest of the raw key bytes. Defined only for HMAC keys.
    pub fn key_digest(&self, algo: DigestAlgorithm) -> Result<Vec<u8>> {
        if self.key_type != KeyType::Hmac {
            return Err(Error::PrivateKey(format!(
                "Digest is not supported for key type {}",
                self.key_type
            )));
        }
        let raw = self.pkey.raw_private_key()?;
        buffer_source(&raw).push(DigestFilter::new(algo)?).into_vec()
    }

    /// The matching public key in PKCS#8 (SubjectPublicKeyInfo) form.
    pub fn derive_public_key(&self) -> Result<Vec<u8>> {
        if self.key_type == KeyType::Hmac {
            return Err(Error::PrivateKey(
                "Deriving a public key is not supported for HMAC keys".to_string(),
            ));
        }
        Ok(self.pkey.public_key_to_der()?)
    }

    /// Decrypt `cipher_text` with the scheme selected by the carried key
    /// type: RSA-OAEP for RSA, SM2 asymmetric decryption for SM2.
    pub fn decrypt(&self, cipher_text: &[u8]) -> Result<Vec<u8>> {
        match self.key_type {
            KeyType::Rsa => {
                let mut decrypter = Decrypter::new(&self.pkey)?;
                decrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
                let len = decrypter.decrypt_len(cipher_text)?;
                let mut out = vec![0u8; len];
                let n = decrypter.decrypt(cipher_text, &mut out)?;
                out.truncate(n);
                Ok(out)
            }
            KeyType::Sm2 => {
                let decrypter = Decrypter::new(&self.pkey)?;
                let len = decrypter.decrypt_len(cipher_text)?;
                let mut out = vec![0u8; len];
                let n = decrypter.decrypt(cipher_text, &mut out)?;
                out.truncate(n);
                Ok(out)
            }
            other => Err(Error::PrivateKey(format!(
                "Decryption is not supported for key type {}",
                other
            ))),
        }
    }

    /// Sign the concatenation of `bufs`.
    ///
    /// SM2 keys always digest with SM3 regardless of the requested
    /// algorithm; HMAC keys emit the raw MAC.
    pub fn sign_buffers(&self, bufs: &[&[u8]], digest: DigestAlgorithm) -> Result<Vec<u8>> {
        let digest = if self.key_type == KeyType::Sm2 {
            DigestAlgorithm::Sm3
        } else {
            digest
        };
        let md = message_digest(digest)?;
        let mut signer = Signer::new(md, &self.pkey)?;
        for buf in bufs {
            signer.update(buf)?;
        }
        Ok(signer.sign_to_vec()?)
    }

    /// Serialize to PKCS#1 DER (raw key bytes for HMAC).
    pub fn to_pkcs1(&self) -> Result<Vec<u8>> {
        match self.key_type {
            KeyType::Hmac => Ok(self.pkey.raw_private_key()?),
            _ => Ok(self.pkey.private_key_to_der()?),
        }
    }

    /// Serialize to PKCS#8 EncryptedPrivateKeyInfo DER under AES-256-CBC.
    pub fn to_encrypted_pkcs8(&self, password: &[u8]) -> Result<Vec<u8>> {
        if self.key_type == KeyType::Hmac {
            return Err(Error::PrivateKey(
                "PKCS#8 export is not supported for HMAC keys".to_string(),
            ));
        }
        Ok(self
            .pkey
            .private_key_to_pkcs8_passphrase(Cipher::aes_256_cbc(), password)?)
    }

    pub fn save_pkcs1(&self, writer: &mut dyn Write) -> Result<()> {
        buffer_source(&self.to_pkcs1()?).into_writer(writer)
    }

    pub fn save_pkcs1_base64(&self, writer: &mut dyn Write) -> Result<()> {
        buffer_source(&self.to_pkcs1()?)
            .push(Base64Encode::new())
            .into_writer(writer)
    }

    pub fn save_pkcs8(&self, writer: &mut dyn Write, password: &[u8]) -> Result<()> {
        buffer_source(&self.to_encrypted_pkcs8(password)?).into_writer(writer)
    }

    pub fn save_pkcs8_base64(&self, writer: &mut dyn Write, password: &[u8]) -> Result<()> {
        buffer_source(&self.to_encrypted_pkcs8(password)?)
            .push(Base64Encode::new())
            .into_writer(writer)
    }

    pub(crate) fn pkey(&self) -> &PKeyRef<Private> {
        &self.pkey
    }

    // Generation factories.

    pub fn generate_rsa(bits: u32) -> Result<Self> {
        let rsa = Rsa::generate(bits)
            .map_err(|e| Error::PrivateKey(format!("Failed to generate RSA key: {}", e)))?;
        let pkey = PKey::from_rsa(rsa)?;
        Ok(PrivateKey {
            pkey,
            key_type: KeyType::Rsa,
        })
    }

    pub fn generate_ec(bits: u32) -> Result<Self> {
        let nid = match bits {
            224 => Nid::SECP224R1,
            256 => Nid::X9_62_PRIME256V1,
            384 => Nid::SECP384R1,
            521 => Nid::SECP521R1,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "Unsupported EC key length {}",
                    other
                )))
            }
        };
        let group = EcGroup::from_curve_name(nid)?;
        let ec = EcKey::generate(&group)
            .map_err(|e| Error::PrivateKey(format!("Failed to generate EC key: {}", e)))?;
        let pkey = PKey::from_ec_key(ec)?;
        Ok(PrivateKey {
            pkey,
            key_type: KeyType::Ec,
        })
    }

    pub fn generate_sm2(bits: u32) -> Result<Self> {
        if bits != 256 {
            return Err(Error::InvalidArgument(format!(
                "Unsupported SM2 key length {}",
                bits
            )));
        }
        let group = EcGroup::from_curve_name(Nid::SM2)?;
        let ec = EcKey::generate(&group)
            .map_err(|e| Error::PrivateKey(format!("Failed to generate SM2 key: {}", e)))?;
        let pkey = PKey::from_ec_key(ec)?;
        Ok(PrivateKey {
            pkey,
            key_type: KeyType::Sm2,
        })
    }

    pub fn generate_hmac(bits: u32) -> Result<Self> {
        let mut raw = vec![0u8; (bits / 8) as usize];
        openssl::rand::rand_bytes(&mut raw)?;
        Self::from_raw(KeyType::Hmac, &raw)
            .map_err(|_| Error::PrivateKey("Failed to generate HMAC key".to_string()))
    }

    /// Dispatch on the params variant.
    pub fn generate(params: &KeyParams) -> Result<Self> {
        match *params {
            KeyParams::Rsa { bits } => Self::generate_rsa(bits),
            KeyParams::Ec { bits } => Self::generate_ec(bits),
            KeyParams::Sm2 { bits } => Self::generate_sm2(bits),
            KeyParams::Hmac { bits } => Self::generate_hmac(bits),
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key_type", &self.key_type)
            .field("bits", &self.key_size())
            .finish()
    }
}

/// Infer the key type from an EVP handle. SM2 keys are recognized either by
/// a distinct EVP type or by the SM2 curve on an EC-typed key, depending on
/// the OpenSSL version in use.
pub(crate) fn evp_key_type<T: openssl::pkey::HasParams>(pkey: &PKeyRef<T>) -> Result<KeyType> {
    match pkey.id() {
        Id::RSA => Ok(KeyType::Rsa),
        Id::HMAC => Ok(KeyType::Hmac),
        Id::EC => {
            let is_sm2 = pkey
                .ec_key()
                .ok()
                .and_then(|ec| ec.group().curve_name())
                .map(|nid| nid == Nid::SM2)
                .unwrap_or(false);
            Ok(if is_sm2 { KeyType::Sm2 } else { KeyType::Ec })
        }
        Id::SM2 => Ok(KeyType::Sm2),
        other => Err(Error::PrivateKey(format!(
            "Unsupported EVP key type {:?}",
            other
        ))),
    }
}

#[cfg(test)]
pub(crate) mod test_vectors {
    //! Key material shared by the codec and pipeline tests.

    pub const RSA_PRIVATE_PKCS1_BASE64: &str = "MIIEvgIBADANBgkqhkiG9w0BAQEFAASCBKgwggSkAgEAAoIBAQDDRYzX9aEDHIu0\n\
        SqyIAmBYNla7ORil5hV155lypFnPN9GAFBOw2jNLm3gefBNmHDBdsfuTdA3SRFNX\n\
        zbpehvCzeKKCiGcz3JMr4oqJrI+EgCb/7kcZPpKAUmFiGqjX+6lZ256iOKXpE/j8\n\
        CBq8eGinGUBVuTob1V1WeVBxDlm/Q5waLvdz4SdgP9iBRFgZKeBSL9ieyHvv2nZT\n\
        r3+172BnAgvk+4T0GI7ojf1wv3PsQrVJ9mE5a8N7+oftiEP8EfBxaK3wWNHDDWCX\n\
        BFVMmwD2sfnzKdoCLHS1xH+cExEtRf57etREeDpRtKMlt1v2qYozV9MYcpTMv/mk\n\
        wbq4FTTLAgMBAAECggEANCRyQ4iXghkxROdbwsW/rE52QnAwoLwbpuw9EVvJj4e8\n\
        LZMu3t6lK99L5/gBxhZo49wO7YTj2+3aw2twBKXLyGDCJFEAHd0cf29yxuiJOjxu\n\
        LZEW8yq+O/3De0rbIzFUO2ZlqbOuudpXdhVD7mfIqjYX88wONDh5QAoM7OOEG4oe\n\
        xkFMWcDUwU0j5QqPlfhinrgMWYqXFNf9TZvDNXLCjmHPHZSHDnWOaguWzhhS8wlc\n\
        PTBblm1hG4+iBe9dv+h/15//bT/BTXVYUqBdviB9HzNRdpdLWxdydWbf7bi8iz10\n\
        ClTDKS6jKM6rFapwdF5zZBPYXFUaQUStrN4I9riswQKBgQDljwLLCiYhxOB6sUYU\n\
        J4wcmvydAapjZX+jAVveT2ZpzM+cL2nhr1FzmzMvED0UxgXG6tBkwFZIQbYlLUdH\n\
        aaeOKDHxQqNgwv8D6u++Nk4x7gzpLLaCCHhKQtkqlZPONN7TsHIz+Pm/9KM1mFYA\n\
        buzDj8uY8ZFCTAm/4pmEaiO46QKBgQDZw4VPpwlG/qS/NPP1LQI5k5Wb564mH8Fe\n\
        nugCwCZs186lyQ8zOodfLz/Cl0qXoABwHns67O2U19XUPuq9vPsm5GVjBDRwR8GB\n\
        tk9zPWnXwccNeHCfntk9vwbfdiH06aDQc0AiZvguxW5KrEDo3BKPtylF6SBN52uE\n\
        sU8n5h1vkwKBgQCwzdDs6MgtwiDS3q6G316+uXBOzPWa0JXZyjYjpyvN2P0d4ja+\n\
        p/UoASUO3obs9QeGCVyv/KN3y4SqZZE8o1d12ed9VkHXSNh4//3elpzrP9mZzeJT\n\
        jIp5R7tTXRkV/QqSKJgNB3n0Kkt5//ZdJxIcHShGh+fFFCN+Mtzia41P4QKBgQCV\n\
        wOTTow45OXL4XyUJzVsDV2ACaDAV3a6wMF1jTtrd7QcacYs3cp+XsLmLS1mrrge/\n\
        Eucx3a+AtXFCVcY+l1CsLVMf5cteD6qeVk6K9IfuLT+DHvlse+Pvl4fVcrrlXykN\n\
        UMShI+i22WUAizbULEvDc3U5s5lYmbYR+ZFy4cgKawKBgC0UnWJ2oygfERLeaVGl\n\
        /YnHJC50/dIKbZakaapXOFFgiep5q1jmxR2U8seb+nvtFPsTLFAdOXCfwUk+4z/h\n\
        kfWtB3+8H5jyoC1gkJ7EMyxu8tb4mz5U6+SPB4QLSetwvfWP2YXS/PkTq19G7iGE\n\
        novjJ9azSBJ6OyR5UH/DxBji";

    pub const RSA_PUBLIC_PKCS8_BASE64: &str = "MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAw0WM1/WhAxyLtEqsiAJg\n\
        WDZWuzkYpeYVdeeZcqRZzzfRgBQTsNozS5t4HnwTZhwwXbH7k3QN0kRTV826Xobw\n\
        s3iigohnM9yTK+KKiayPhIAm/+5HGT6SgFJhYhqo1/upWdueojil6RP4/AgavHho\n\
        pxlAVbk6G9VdVnlQcQ5Zv0OcGi73c+EnYD/YgURYGSngUi/Ynsh779p2U69/te9g\n\
        ZwIL5PuE9BiO6I39cL9z7EK1SfZhOWvDe/qH7YhD/BHwcWit8FjRww1glwRVTJsA\n\
        9rH58ynaAix0tcR/nBMRLUX+e3rURHg6UbSjJbdb9qmKM1fTGHKUzL/5pMG6uBU0\n\
        ywIDAQAB";

    pub const EC_PRIVATE_PKCS1_BASE64: &str = "MIIBeQIBADCCAQMGByqGSM49AgEwgfcCAQEwLAYHKoZIzj0BAQIhAP////8AAAAB\n\
        AAAAAAAAAAAAAAAA////////////////MFsEIP////8AAAABAAAAAAAAAAAAAAAA\n\
        ///////////////8BCBaxjXYqjqT57PrvVV2mIa8ZR0GsMxTsPY7zjw+J9JgSwMV\n\
        AMSdNgiG5wSTamZ44ROdJreBn36QBEEEaxfR8uEsQkf4vOblY6RA8ncDfYEt6zOg\n\
        9KE5RdiYwpZP40Li/hp/m47n60p8D54WK84zV2sxXs7LtkBoN79R9QIhAP////8A\n\
        AAAA//////////+85vqtpxeehPO5ysL8YyVRAgEBBG0wawIBAQQgRxwcbzK9RV6A\n\
        HYFsDcykI86o3M/a1KlJn0z8PcLMBZOhRANCAARobhYm4MC3RCQQzi3b0oNR3ORC\n\
        Uw8aupbORaGC304afBzo7sBks9KsPKHDKspLtctFeaXkOKxD3dG8HKWXfbLw";

    pub const EC_PUBLIC_PKCS8_BASE64: &str = "MIIBSzCCAQMGByqGSM49AgEwgfcCAQEwLAYHKoZIzj0BAQIhAP////8AAAABAAAA\n\
        AAAAAAAAAAAA////////////////MFsEIP////8AAAABAAAAAAAAAAAAAAAA////\n\
        ///////////8BCBaxjXYqjqT57PrvVV2mIa8ZR0GsMxTsPY7zjw+J9JgSwMVAMSd\n\
        NgiG5wSTamZ44ROdJreBn36QBEEEaxfR8uEsQkf4vOblY6RA8ncDfYEt6zOg9KE5\n\
        RdiYwpZP40Li/hp/m47n60p8D54WK84zV2sxXs7LtkBoN79R9QIhAP////8AAAAA\n\
        //////////+85vqtpxeehPO5ysL8YyVRAgEBA0IABGhuFibgwLdEJBDOLdvSg1Hc\n\
        5EJTDxq6ls5FoYLfThp8HOjuwGSz0qw8ocMqyku1y0V5peQ4rEPd0bwcpZd9svA=";

    pub const SM2_PRIVATE_PKCS1_BASE64: &str = "MHcCAQEEIJqY+6mfM4btu3IWkmcZV6J3g+wih5QyrJ2jbWoh/nn5oAoGCCqBHM9V\n\
        AYItoUQDQgAEfyGr6PC52r9m4eY4ng8DFP7t+wsHNf1uFIWhVrKfe3wE+IWV957R\n\
        y1kB0/uBvJiDnNIxoBngRV/ErEDjl6rKJA==";

    pub const SM2_PUBLIC_PKCS8_BASE64: &str = "MFkwEwYHKoZIzj0CAQYIKoEcz1UBgi0DQgAEfyGr6PC52r9m4eY4ng8DFP7t+wsH\n\
        Nf1uFIWhVrKfe3wE+IWV957Ry1kB0/uBvJiDnNIxoBngRV/ErEDjl6rKJA==";
}

#[cfg(test)]
mod tests {
    use super::test_vectors::*;
    use super::*;

    #[test]
    fn test_load_ec_pkcs1_base64() {
        let key = PrivateKey::from_pkcs1_base64(EC_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        assert_eq!(key.key_type(), KeyType::Ec);
        assert_eq!(key.key_size(), 256);
    }

    #[test]
    fn test_load_rsa_pkcs1_base64() {
        let key = PrivateKey::from_pkcs1_base64(RSA_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        assert_eq!(key.key_type(), KeyType::Rsa);
        assert_eq!(key.key_size(), 2048);
    }

    #[test]
    fn test_load_sm2_tags_key_type() {
        let key = PrivateKey::from_pkcs1_base64(SM2_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        assert_eq!(key.key_type(), KeyType::Sm2);
    }

    #[test]
    fn test_derive_public_key_matches_vector() {
        let key = PrivateKey::from_pkcs1_base64(EC_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        let derived = key.derive_public_key().unwrap();
        let expected = buffer_source(EC_PUBLIC_PKCS8_BASE64.as_bytes())
            .push(Base64Decode::new())
            .into_vec()
            .unwrap();
        assert_eq!(derived, expected);
    }

    #[test]
    fn test_from_raw_rejects_non_hmac() {
        for kt in [KeyType::Rsa, KeyType::Ec, KeyType::Sm2, KeyType::None] {
            assert!(matches!(
                PrivateKey::from_raw(kt, &[0u8; 32]),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_key_digest_hmac_only() {
        let hmac = PrivateKey::generate_hmac(256).unwrap();
        let digest = hmac.key_digest(DigestAlgorithm::Sha256).unwrap();
        assert_eq!(digest.len(), 32);

        let ec = PrivateKey::generate_ec(256).unwrap();
        assert!(ec.key_digest(DigestAlgorithm::Sha256).is_err());
    }

    #[test]
    fn test_hmac_pkcs1_is_raw_bytes() {
        let raw = [0x42u8; 32];
        let key = PrivateKey::from_raw(KeyType::Hmac, &raw).unwrap();
        assert_eq!(key.to_pkcs1().unwrap(), raw);
        assert_eq!(key.key_size(), 256);
    }

    #[test]
    fn test_encrypted_pkcs8_round_trip() {
        let key = PrivateKey::generate_ec(256).unwrap();
        let pkcs8 = key.to_encrypted_pkcs8(b"secret").unwrap();
        let reloaded = PrivateKey::from_pkcs8(&pkcs8, b"secret").unwrap();
        assert_eq!(reloaded.key_type(), KeyType::Ec);
        assert_eq!(
            reloaded.derive_public_key().unwrap(),
            key.derive_public_key().unwrap()
        );
        assert!(PrivateKey::from_pkcs8(&pkcs8, b"wrong").is_err());
    }

    #[test]
    fn test_generate_dispatch() {
        assert_eq!(
            PrivateKey::generate(&KeyParams::ec()).unwrap().key_type(),
            KeyType::Ec
        );
        assert_eq!(
            PrivateKey::generate(&KeyParams::hmac()).unwrap().key_type(),
            KeyType::Hmac
        );
        assert!(PrivateKey::generate_ec(123).is_err());
        assert!(PrivateKey::generate_sm2(384).is_err());
    }

    #[test]
    fn test_rsa_oaep_decrypt_round_trip() {
        use crate::public_key::PublicKey;

        let key = PrivateKey::from_pkcs1_base64(RSA_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        let public =
            PublicKey::from_pkcs8_base64(RSA_PUBLIC_PKCS8_BASE64.as_bytes()).unwrap();
        let cipher = public.encrypt(b"attack at dawn").unwrap();
        assert_eq!(key.decrypt(&cipher).unwrap(), b"attack at dawn");
    }

    #[test]
    fn test_decrypt_rejects_ec() {
        let key = PrivateKey::generate_ec(256).unwrap();
        assert!(key.decrypt(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_sm2_forces_sm3() {
        let key = PrivateKey::from_pkcs1_base64(SM2_PRIVATE_PKCS1_BASE64.as_bytes()).unwrap();
        // Requesting SHA-256 must still produce an SM3-based signature that
        // verifies under SM3 (checked in the verifier tests); here we only
        // assert the call succeeds.
        let sig = key
            .sign_buffers(&[&[0x01, 0x02, 0x03, 0x04]], DigestAlgorithm::Sha256)
            .unwrap();
        assert!(!sig.is_empty());
    }
}
