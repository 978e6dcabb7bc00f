//! Public key abstraction over the OpenSSL EVP layer.
//!
//! Like [`PrivateKey`](crate::private_key::PrivateKey), a `PublicKey`
//! carries its [`KeyType`] side-band: an SM2 SubjectPublicKeyInfo is not
//! reliably distinguishable from ECDSA by inspection alone on every
//! provider, so callers holding better information (a certificate
//! signature type) can retag with [`PublicKey::with_key_type`].

use std::io::{Read, Write};

use openssl::encrypt::Encrypter;
use openssl::pkey::{PKey, PKeyRef, Public};
use openssl::rsa::Padding;

use crate::error::{Error, Result};
use crate::key_params::KeyType;
use crate::private_key::evp_key_type;
use crate::transform::{buffer_source, stream_source, Base64Decode, Base64Encode};

/// A public key usable for signature verification or encryption.
#[derive(Clone)]
pub struct PublicKey {
    pkey: PKey<Public>,
    key_type: KeyType,
}

impl PublicKey {
    /// Decode a PKCS#8 (SubjectPublicKeyInfo) DER blob.
    pub fn from_pkcs8(der: &[u8]) -> Result<Self> {
        let pkey = PKey::public_key_from_der(der)
            .map_err(|e| Error::PublicKey(format!("Failed to load public key: {}", e)))?;
        let key_type = evp_key_type(&pkey)?;
        Ok(PublicKey { pkey, key_type })
    }

    /// Decode a base64-encoded PKCS#8 blob.
    pub fn from_pkcs8_base64(buf: &[u8]) -> Result<Self> {
        let der = buffer_source(buf).push(Base64Decode::new()).into_vec()?;
        Self::from_pkcs8(&der)
    }

    /// Decode a PKCS#8 blob from a stream.
    pub fn from_pkcs8_reader(reader: impl Read) -> Result<Self> {
        let der = stream_source(reader).into_vec()?;
        Self::from_pkcs8(&der)
    }

    /// Decode a base64-encoded PKCS#8 blob from a stream.
    pub fn from_pkcs8_base64_reader(reader: impl Read) -> Result<Self> {
        let der = stream_source(reader).push(Base64Decode::new()).into_vec()?;
        Self::from_pkcs8(&der)
    }

    /// Replace the side-band key type tag (SM2 vs EC disambiguation).
    pub fn with_key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Serialize to PKCS#8 (SubjectPublicKeyInfo) DER.
    pub fn to_pkcs8(&self) -> Result<Vec<u8>> {
        Ok(self.pkey.public_key_to_der()?)
    }

    pub fn save_pkcs8(&self, writer: &mut dyn Write) -> Result<()> {
        buffer_source(&self.to_pkcs8()?).into_writer(writer)
    }

    pub fn save_pkcs8_base64(&self, writer: &mut dyn Write) -> Result<()> {
        buffer_source(&self.to_pkcs8()?)
            .push(Base64Encode::new())
            .into_writer(writer)
    }

    /// Encrypt `plain_text` with the scheme selected by the carried key
    /// type: RSA-OAEP for RSA, SM2 asymmetric encryption for SM2.
    pub fn encrypt(&self, plain_text: &[u8]) -> Result<Vec<u8>> {
        match self.key_type {
            KeyType::Rsa => {
                let mut encrypter = Encrypter::new(&self.pkey)?;
                encrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
                let len = encrypter.encrypt_len(plain_text)?;
                let mut out = vec![0u8; len];
                let n = encrypter.encrypt(plain_text, &mut out)?;
                out.truncate(n);
                Ok(out)
            }
            KeyType::Sm2 => {
                let encrypter = Encrypter::new(&self.pkey)?;
                let len = encrypter.encrypt_len(plain_text)?;
                let mut out = vec![0u8; len];
                let n = encrypter.encrypt(plain_text, &mut out)?;
                out.truncate(n);
                Ok(out)
            }
            other => Err(Error::PublicKey(format!(
                "Encryption is not supported for key type {}",
                other
            ))),
        }
    }

    pub(crate) fn pkey(&self) -> &PKeyRef<Public> {
        &self.pkey
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_type", &self.key_type)
            .finish()
    }
}
