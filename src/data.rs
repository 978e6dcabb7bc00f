//! Data packets, signature metadata, and validity periods.
//!
//! Only the surface the security core needs is modeled: name, the two
//! MetaInfo fields certificates use, content, and the signature elements.
//! The signed portion of a Data packet runs from the Name element through
//! the SignatureInfo element; a packet decoded from the wire keeps the
//! exact signed bytes so verification is independent of re-encoding.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{Error, Result};
use crate::name::Name;
use crate::tlv;

/// ISO-compact timestamp format used on the wire by validity periods.
const VALIDITY_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Inclusive time window during which a certificate is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityPeriod {
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl ValidityPeriod {
    pub fn new(not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        ValidityPeriod {
            not_before,
            not_after,
        }
    }

    /// Twenty years forward from the epoch of `now`, the window used for
    /// self-signed certificates.
    pub fn twenty_years_from_now() -> Self {
        let now = Utc::now();
        ValidityPeriod {
            not_before: Utc.timestamp_opt(0, 0).single().unwrap_or(now),
            not_after: now + chrono::Duration::days(20 * 365),
        }
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        let mut value = Vec::new();
        tlv::write_tlv(
            &mut value,
            tlv::NOT_BEFORE,
            self.not_before
                .format(VALIDITY_TIMESTAMP_FORMAT)
                .to_string()
                .as_bytes(),
        );
        tlv::write_tlv(
            &mut value,
            tlv::NOT_AFTER,
            self.not_after
                .format(VALIDITY_TIMESTAMP_FORMAT)
                .to_string()
                .as_bytes(),
        );
        tlv::write_tlv(out, tlv::VALIDITY_PERIOD, &value);
    }

    fn decode(value: &[u8]) -> Result<Self> {
        let mut dec = tlv::Decoder::new(value);
        let not_before = parse_timestamp(dec.expect(tlv::NOT_BEFORE)?)?;
        let not_after = parse_timestamp(dec.expect(tlv::NOT_AFTER)?)?;
        Ok(ValidityPeriod {
            not_before,
            not_after,
        })
    }
}

fn parse_timestamp(bytes: &[u8]) -> Result<DateTime<Utc>> {
    let s = std::str::from_utf8(bytes)
        .map_err(|_| Error::Parse("validity timestamp is not UTF-8".to_string()))?;
    let naive = NaiveDateTime::parse_from_str(s, VALIDITY_TIMESTAMP_FORMAT)
        .map_err(|e| Error::Parse(format!("invalid validity timestamp `{}`: {}", s, e)))?;
    Ok(naive.and_utc())
}

/// SignatureInfo element: signature type, key locator, optional validity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureInfo {
    signature_type: u64,
    key_locator: Option<Name>,
    validity_period: Option<ValidityPeriod>,
}

impl SignatureInfo {
    pub fn new(signature_type: u64) -> Self {
        SignatureInfo {
            signature_type,
            key_locator: None,
            validity_period: None,
        }
    }

    pub fn signature_type(&self) -> u64 {
        self.signature_type
    }

    pub fn set_signature_type(&mut self, signature_type: u64) {
        self.signature_type = signature_type;
    }

    pub fn key_locator(&self) -> Option<&Name> {
        self.key_locator.as_ref()
    }

    pub fn set_key_locator(&mut self, name: Name) {
        self.key_locator = Some(name);
    }

    pub fn validity_period(&self) -> Option<&ValidityPeriod> {
        self.validity_period.as_ref()
    }

    pub fn set_validity_period(&mut self, period: ValidityPeriod) {
        self.validity_period = Some(period);
    }

    /// Encode under the given element type (Data SignatureInfo or Interest
    /// InterestSignatureInfo).
    pub fn encode_as(&self, element_type: u64, out: &mut Vec<u8>) {
        let mut value = Vec::new();
        tlv::write_non_negative_integer(&mut value, tlv::SIGNATURE_TYPE, self.signature_type);
        if let Some(name) = &self.key_locator {
            tlv::write_tlv(&mut value, tlv::KEY_LOCATOR, &name.wire_encode());
        }
        if let Some(period) = &self.validity_period {
            period.encode_into(&mut value);
        }
        tlv::write_tlv(out, element_type, &value);
    }

    pub fn wire_encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_as(tlv::SIGNATURE_INFO, &mut out);
        out
    }

    /// Decode from the value of a SignatureInfo-family element.
    pub fn decode(value: &[u8]) -> Result<Self> {
        let mut dec = tlv::Decoder::new(value);
        let st_value = dec.expect(tlv::SIGNATURE_TYPE)?;
        let signature_type = tlv::read_non_negative_integer(st_value)?;
        let mut info = SignatureInfo::new(signature_type);
        while !dec.eof() {
            let (typ, v) = dec.read_tlv()?;
            match typ {
                tlv::KEY_LOCATOR => {
                    info.key_locator = Some(Name::from_wire(v)?);
                }
                tlv::VALIDITY_PERIOD => {
                    info.validity_period = Some(ValidityPeriod::decode(v)?);
                }
                // Unrecognized extensions are skipped, not rejected.
                _ => {}
            }
        }
        Ok(info)
    }
}

/// An NDN Data packet.
#[derive(Debug, Clone, Default)]
pub struct Data {
    name: Name,
    content_type: Option<u64>,
    freshness_period_ms: Option<u64>,
    content: Vec<u8>,
    signature_info: Option<SignatureInfo>,
    signature_value: Vec<u8>,
    /// Exact signed bytes captured at decode time, so verification does not
    /// depend on re-encoding.
    raw_signed_portion: Option<Vec<u8>>,
}

impl Data {
    pub fn new(name: Name) -> Self {
        Data {
            name,
            ..Data::default()
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn set_name(&mut self, name: Name) {
        self.name = name;
        self.raw_signed_portion = None;
    }

    pub fn content_type(&self) -> Option<u64> {
        self.content_type
    }

    pub fn set_content_type(&mut self, content_type: u64) {
        self.content_type = Some(content_type);
        self.raw_signed_portion = None;
    }

    pub fn freshness_period_ms(&self) -> Option<u64> {
        self.freshness_period_ms
    }

    pub fn set_freshness_period_ms(&mut self, ms: u64) {
        self.freshness_period_ms = Some(ms);
        self.raw_signed_portion = None;
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.raw_signed_portion = None;
    }

    pub fn signature_info(&self) -> Option<&SignatureInfo> {
        self.signature_info.as_ref()
    }

    pub fn set_signature_info(&mut self, info: SignatureInfo) {
        self.signature_info = Some(info);
        self.raw_signed_portion = None;
    }

    pub fn signature_value(&self) -> &[u8] {
        &self.signature_value
    }

    pub fn set_signature_value(&mut self, sig: Vec<u8>) {
        self.signature_value = sig;
    }

    fn encode_meta_info(&self, out: &mut Vec<u8>) {
        if self.content_type.is_none() && self.freshness_period_ms.is_none() {
            return;
        }
        let mut value = Vec::new();
        if let Some(ct) = self.content_type {
            tlv::write_non_negative_integer(&mut value, tlv::CONTENT_TYPE, ct);
        }
        if let Some(fp) = self.freshness_period_ms {
            tlv::write_non_negative_integer(&mut value, tlv::FRESHNESS_PERIOD, fp);
        }
        tlv::write_tlv(out, tlv::META_INFO, &value);
    }

    /// The bytes covered by the signature: Name through SignatureInfo.
    ///
    /// Fails if no SignatureInfo has been set.
    pub fn signed_portion(&self) -> Result<Vec<u8>> {
        if let Some(raw) = &self.raw_signed_portion {
            return Ok(raw.clone());
        }
        let info = self.signature_info.as_ref().ok_or_else(|| {
            Error::InvalidArgument("Data has no SignatureInfo to sign over".to_string())
        })?;
        let mut out = Vec::new();
        out.extend_from_slice(&self.name.wire_encode());
        self.encode_meta_info(&mut out);
        tlv::write_tlv(&mut out, tlv::CONTENT, &self.content);
        info.encode_as(tlv::SIGNATURE_INFO, &mut out);
        Ok(out)
    }

    /// Full Data TLV. Requires SignatureInfo to be present; an unsigned
    /// packet is not encodable.
    pub fn wire_encode(&self) -> Result<Vec<u8>> {
        let mut value = self.signed_portion()?;
        tlv::write_tlv(&mut value, tlv::SIGNATURE_VALUE, &self.signature_value);
        let mut out = Vec::with_capacity(value.len() + 8);
        tlv::write_tlv(&mut out, tlv::DATA, &value);
        Ok(out)
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self> {
        let mut outer = tlv::Decoder::new(buf);
        let value = outer.expect(tlv::DATA)?;

        let mut dec = tlv::Decoder::new(value);
        let mut data = Data::default();
        let signed_start = dec.position();
        let mut signed_end = signed_start;
        let mut saw_name = false;
        while !dec.eof() {
            let (typ, v) = dec.read_tlv()?;
            match typ {
                tlv::NAME => {
                    data.name = Name::from_wire_value(v)?;
                    saw_name = true;
                }
                tlv::META_INFO => {
                    let mut meta = tlv::Decoder::new(v);
                    while !meta.eof() {
                        let (mt, mv) = meta.read_tlv()?;
                        match mt {
                            tlv::CONTENT_TYPE => {
                                data.content_type = Some(tlv::read_non_negative_integer(mv)?);
                            }
                            tlv::FRESHNESS_PERIOD => {
                                data.freshness_period_ms =
                                    Some(tlv::read_non_negative_integer(mv)?);
                            }
                            _ => {}
                        }
                    }
                }
                tlv::CONTENT => {
                    data.content = v.to_vec();
                }
                tlv::SIGNATURE_INFO => {
                    data.signature_info = Some(SignatureInfo::decode(v)?);
                    signed_end = dec.position();
                }
                tlv::SIGNATURE_VALUE => {
                    data.signature_value = v.to_vec();
                }
                _ => {}
            }
        }
        if !saw_name {
            return Err(Error::Parse("Data packet has no Name".to_string()));
        }
        if data.signature_info.is_some() {
            data.raw_signed_portion = Some(value[signed_start..signed_end].to_vec());
        }
        Ok(data)
    }
}
