//! NDN certificates.
//!
//! A certificate is a signed Data packet whose name has the form
//! `<identity>/KEY/<key-id>/<issuer-id>/<version>`, whose content is the
//! subject's public key in PKCS#8 form, and whose SignatureInfo carries a
//! ValidityPeriod and a KeyLocator.

use crate::data::{Data, SignatureInfo, ValidityPeriod};
use crate::error::{Error, Result};
use crate::name::{Component, Name};
use crate::tlv;

/// The name component separating an identity prefix from a key id.
pub const KEY_COMPONENT: &[u8] = b"KEY";

/// Offset of the `KEY` component from the end of a certificate name.
const KEY_COMPONENT_OFFSET: isize = -4;

/// Minimum number of components in a certificate name.
const MIN_CERT_NAME_LENGTH: usize = 4;

/// Issuer id used on self-signed certificates.
pub const SELF_ISSUER_ID: &[u8] = b"self";

#[derive(Debug, Clone)]
pub struct Certificate {
    data: Data,
}

impl Certificate {
    /// Whether `name` has the certificate form
    /// `<identity>/KEY/<key-id>/<issuer-id>/<version>`.
    pub fn is_valid_name(name: &Name) -> bool {
        name.size() >= MIN_CERT_NAME_LENGTH
            && name
                .at(KEY_COMPONENT_OFFSET)
                .map(|c| c.is_generic() && c.value() == KEY_COMPONENT)
                .unwrap_or(false)
    }

    pub fn name(&self) -> &Name {
        self.data.name()
    }

    /// The identity prefix: everything before the `KEY` component.
    pub fn identity(&self) -> Name {
        self.data.name().prefix(self.data.name().size() - 4)
    }

    pub fn key_id(&self) -> &Component {
        self.data.name().at(-3).expect("validated at construction")
    }

    /// `<identity>/KEY/<key-id>`.
    pub fn key_name(&self) -> Name {
        self.data.name().prefix(self.data.name().size() - 2)
    }

    pub fn issuer_id(&self) -> &Component {
        self.data.name().at(-2).expect("validated at construction")
    }

    pub fn is_self_signed(&self) -> bool {
        self.issuer_id().value() == SELF_ISSUER_ID
    }

    /// The subject's public key bits (PKCS#8 SubjectPublicKeyInfo).
    pub fn public_key_bits(&self) -> &[u8] {
        self.data.content()
    }

    pub fn signature_info(&self) -> &SignatureInfo {
        self.data
            .signature_info()
            .expect("validated at construction")
    }

    pub fn signature_type(&self) -> u64 {
        self.signature_info().signature_type()
    }

    pub fn validity_period(&self) -> Option<&ValidityPeriod> {
        self.signature_info().validity_period()
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    pub fn wire_encode(&self) -> Result<Vec<u8>> {
        self.data.wire_encode()
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self> {
        Certificate::try_from(Data::from_wire(buf)?)
    }
}

impl TryFrom<Data> for Certificate {
    type Error = Error;

    fn try_from(data: Data) -> Result<Self> {
        if !Certificate::is_valid_name(data.name()) {
            return Err(Error::InvalidArgument(format!(
                "Invalid certificate name `{}`",
                data.name()
            )));
        }
        if data.content().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Certificate `{}` is empty",
                data.name()
            )));
        }
        if data.signature_info().is_none() {
            return Err(Error::InvalidArgument(format!(
                "Certificate `{}` has no SignatureInfo",
                data.name()
            )));
        }
        if let Some(ct) = data.content_type() {
            if ct != tlv::CONTENT_TYPE_KEY {
                return Err(Error::InvalidArgument(format!(
                    "Certificate `{}` has content type {}",
                    data.name(),
                    ct
                )));
            }
        }
        Ok(Certificate { data })
    }
}

/// Whether `name` has the key form `<identity>/KEY/<key-id>`.
pub fn is_valid_key_name(name: &Name) -> bool {
    name.size() >= 2
        && name
            .at(-2)
            .map(|c| c.is_generic() && c.value() == KEY_COMPONENT)
            .unwrap_or(false)
}

/// `<identity>/KEY/<key-id>` from its parts.
pub fn construct_key_name(identity: &Name, key_id: Component) -> Name {
    let mut name = identity.clone();
    name.push(Component::generic(KEY_COMPONENT.to_vec()));
    name.push(key_id);
    name
}

/// The identity prefix of a key name; `InvalidArgument` if `key_name` is
/// not a well-formed key name.
pub fn extract_identity_from_key_name(key_name: &Name) -> Result<Name> {
    if !is_valid_key_name(key_name) {
        return Err(Error::InvalidArgument(format!(
            "Key name `{}` is invalid",
            key_name
        )));
    }
    Ok(key_name.prefix(key_name.size() - 2))
}

/// The key name embedded in a certificate name; `InvalidArgument` if
/// `cert_name` is not a well-formed certificate name.
pub fn extract_key_name_from_cert_name(cert_name: &Name) -> Result<Name> {
    if !Certificate::is_valid_name(cert_name) {
        return Err(Error::InvalidArgument(format!(
            "Certificate name `{}` is invalid",
            cert_name
        )));
    }
    Ok(cert_name.prefix(cert_name.size() - 2))
}
