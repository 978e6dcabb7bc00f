//! SafeBag: a portable envelope of (certificate, encrypted private key).

use crate::data::Data;
use crate::error::Result;
use crate::tlv;

/// Certificate plus the matching private key as an encrypted PKCS#8 blob.
/// Used for export/import between key chains.
#[derive(Debug, Clone)]
pub struct SafeBag {
    certificate: Data,
    encrypted_key: Vec<u8>,
}

impl SafeBag {
    pub fn new(certificate: Data, encrypted_key: Vec<u8>) -> Self {
        SafeBag {
            certificate,
            encrypted_key,
        }
    }

    pub fn certificate(&self) -> &Data {
        &self.certificate
    }

    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    pub fn wire_encode(&self) -> Result<Vec<u8>> {
        let mut value = self.certificate.wire_encode()?;
        tlv::write_tlv(&mut value, tlv::ENCRYPTED_KEY, &self.encrypted_key);
        let mut out = Vec::with_capacity(value.len() + 8);
        tlv::write_tlv(&mut out, tlv::SAFE_BAG, &value);
        Ok(out)
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self> {
        let mut outer = tlv::Decoder::new(buf);
        let value = outer.expect(tlv::SAFE_BAG)?;

        // Measure the embedded Data element so it can be handed to the
        // packet decoder whole.
        let mut probe = tlv::Decoder::new(value);
        probe.expect(tlv::DATA)?;
        let cert_len = probe.position();
        let certificate = Data::from_wire(&value[..cert_len])?;

        let mut dec = tlv::Decoder::new(&value[cert_len..]);
        let encrypted_key = dec.expect(tlv::ENCRYPTED_KEY)?.to_vec();
        Ok(SafeBag {
            certificate,
            encrypted_key,
        })
    }
}
