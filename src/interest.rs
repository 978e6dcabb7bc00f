//! Interest packets with Packet Format v0.3 signed-Interest support.
//!
//! A signed Interest carries ApplicationParameters, an
//! InterestSignatureInfo, and an InterestSignatureValue; the name ends with
//! a ParametersSha256DigestComponent covering every parameters element.
//! The signature covers the name (minus the digest component), the
//! parameters, and the signature info.

use openssl::hash::{hash, MessageDigest};

use crate::data::SignatureInfo;
use crate::error::{Error, Result};
use crate::name::{Component, Name};
use crate::tlv;

#[derive(Debug, Clone, Default)]
pub struct Interest {
    name: Name,
    application_parameters: Option<Vec<u8>>,
    signature_info: Option<SignatureInfo>,
    signature_value: Vec<u8>,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Interest {
            name,
            ..Interest::default()
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn set_name(&mut self, name: Name) {
        self.name = name;
    }

    pub fn application_parameters(&self) -> Option<&[u8]> {
        self.application_parameters.as_deref()
    }

    pub fn set_application_parameters(&mut self, params: Vec<u8>) {
        self.application_parameters = Some(params);
    }

    pub fn signature_info(&self) -> Option<&SignatureInfo> {
        self.signature_info.as_ref()
    }

    /// Attach signature info; an Interest being signed must carry
    /// ApplicationParameters, so an empty element is added when absent.
    pub fn set_signature_info(&mut self, info: SignatureInfo) {
        if self.application_parameters.is_none() {
            self.application_parameters = Some(Vec::new());
        }
        self.signature_info = Some(info);
    }

    pub fn signature_value(&self) -> &[u8] {
        &self.signature_value
    }

    pub fn set_signature_value(&mut self, sig: Vec<u8>) {
        self.signature_value = sig;
    }

    fn name_without_parameters_digest(&self) -> Name {
        Name::from_components(
            self.name
                .components()
                .iter()
                .filter(|c| c.typ() != tlv::PARAMETERS_SHA256_DIGEST_COMPONENT)
                .cloned()
                .collect(),
        )
    }

    /// The byte ranges covered by a v0.3 Interest signature: the name
    /// components up to (excluding) the parameters digest, the
    /// ApplicationParameters element, and the InterestSignatureInfo element.
    pub fn signed_ranges(&self) -> Result<Vec<Vec<u8>>> {
        let info = self.signature_info.as_ref().ok_or_else(|| {
            Error::InvalidArgument("Interest has no InterestSignatureInfo".to_string())
        })?;
        let params = self.application_parameters.as_ref().ok_or_else(|| {
            Error::InvalidArgument("signed Interest has no ApplicationParameters".to_string())
        })?;

        let mut ranges = Vec::with_capacity(3);
        ranges.push(self.name_without_parameters_digest().encode_value());

        let mut params_elem = Vec::new();
        tlv::write_tlv(&mut params_elem, tlv::APPLICATION_PARAMETERS, params);
        ranges.push(params_elem);

        let mut info_elem = Vec::new();
        info.encode_as(tlv::INTEREST_SIGNATURE_INFO, &mut info_elem);
        ranges.push(info_elem);

        Ok(ranges)
    }

    /// Digest of every parameters element, appended to the name as the
    /// ParametersSha256DigestComponent.
    fn parameters_digest(&self) -> Result<Vec<u8>> {
        let mut covered = Vec::new();
        if let Some(params) = &self.application_parameters {
            tlv::write_tlv(&mut covered, tlv::APPLICATION_PARAMETERS, params);
        }
        if let Some(info) = &self.signature_info {
            info.encode_as(tlv::INTEREST_SIGNATURE_INFO, &mut covered);
            tlv::write_tlv(
                &mut covered,
                tlv::INTEREST_SIGNATURE_VALUE,
                &self.signature_value,
            );
        }
        Ok(hash(MessageDigest::sha256(), &covered)?.to_vec())
    }

    pub fn wire_encode(&self) -> Result<Vec<u8>> {
        let mut name = self.name_without_parameters_digest();
        if self.application_parameters.is_some() {
            name.push(Component::typed(
                tlv::PARAMETERS_SHA256_DIGEST_COMPONENT,
                self.parameters_digest()?,
            ));
        }

        let mut value = Vec::new();
        value.extend_from_slice(&name.wire_encode());
        if let Some(params) = &self.application_parameters {
            tlv::write_tlv(&mut value, tlv::APPLICATION_PARAMETERS, params);
        }
        if let Some(info) = &self.signature_info {
            info.encode_as(tlv::INTEREST_SIGNATURE_INFO, &mut value);
            tlv::write_tlv(
                &mut value,
                tlv::INTEREST_SIGNATURE_VALUE,
                &self.signature_value,
            );
        }

        let mut out = Vec::with_capacity(value.len() + 8);
        tlv::write_tlv(&mut out, tlv::INTEREST, &value);
        Ok(out)
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self> {
        let mut outer = tlv::Decoder::new(buf);
        let value = outer.expect(tlv::INTEREST)?;

        let mut dec = tlv::Decoder::new(value);
        let mut interest = Interest::default();
        let mut saw_name = false;
        while !dec.eof() {
            let (typ, v) = dec.read_tlv()?;
            match typ {
                tlv::NAME => {
                    interest.name = Name::from_wire_value(v)?;
                    saw_name = true;
                }
                tlv::APPLICATION_PARAMETERS => {
                    interest.application_parameters = Some(v.to_vec());
                }
                tlv::INTEREST_SIGNATURE_INFO => {
                    interest.signature_info = Some(SignatureInfo::decode(v)?);
                }
                tlv::INTEREST_SIGNATURE_VALUE => {
                    interest.signature_value = v.to_vec();
                }
                _ => {}
            }
        }
        if !saw_name {
            return Err(Error::Parse("Interest packet has no Name".to_string()));
        }
        Ok(interest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_signature_info_adds_empty_parameters() {
        let mut interest = Interest::new(Name::from_uri("/ping").unwrap());
        interest.set_signature_info(SignatureInfo::new(tlv::SIGNATURE_SHA256_WITH_ECDSA));
        assert_eq!(interest.application_parameters(), Some(&[][..]));
    }

    #[test]
    fn test_signed_ranges_exclude_parameters_digest() {
        let mut interest = Interest::new(Name::from_uri("/ping").unwrap());
        interest.set_signature_info(SignatureInfo::new(tlv::SIGNATURE_SHA256_WITH_ECDSA));
        interest.set_signature_value(vec![0xAA; 4]);

        let wire = interest.wire_encode().unwrap();
        let decoded = Interest::from_wire(&wire).unwrap();
        // The encoded name gained the digest component...
        assert_eq!(
            decoded
                .name()
                .at(-1)
                .unwrap()
                .typ(),
            tlv::PARAMETERS_SHA256_DIGEST_COMPONENT
        );
        // ...but the signed ranges on both sides agree.
        assert_eq!(
            decoded.signed_ranges().unwrap(),
            interest.signed_ranges().unwrap()
        );
    }

    #[test]
    fn test_wire_round_trip() {
        let mut interest = Interest::new(Name::from_uri("/cmd/run").unwrap());
        interest.set_application_parameters(vec![1, 2, 3]);
        interest.set_signature_info(SignatureInfo::new(tlv::SIGNATURE_SHA256_WITH_RSA));
        interest.set_signature_value(vec![9; 16]);

        let wire = interest.wire_encode().unwrap();
        let decoded = Interest::from_wire(&wire).unwrap();
        assert_eq!(decoded.application_parameters(), Some(&[1u8, 2, 3][..]));
        assert_eq!(decoded.signature_value(), interest.signature_value());
        assert_eq!(
            decoded.signature_info().unwrap().signature_type(),
            tlv::SIGNATURE_SHA256_WITH_RSA
        );
    }

    #[test]
    fn test_signed_ranges_require_signature_info() {
        let interest = Interest::new(Name::from_uri("/x").unwrap());
        assert!(interest.signed_ranges().is_err());
    }
}
