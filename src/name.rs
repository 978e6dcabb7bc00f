//! NDN names and name components.
//!
//! A name is an ordered sequence of typed, opaque byte components with an
//! unambiguous TLV wire form. Components print as percent-escaped URI
//! segments; non-generic components carry a `<type>=` prefix so that
//! `parse(format(n)) == n` holds for every name.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::tlv;

/// One name component: a TLV type plus an opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    typ: u64,
    value: Vec<u8>,
}

impl Component {
    pub fn generic(value: impl Into<Vec<u8>>) -> Self {
        Component {
            typ: tlv::GENERIC_NAME_COMPONENT,
            value: value.into(),
        }
    }

    pub fn typed(typ: u64, value: impl Into<Vec<u8>>) -> Self {
        Component {
            typ,
            value: value.into(),
        }
    }

    /// Version component holding a NonNegativeInteger.
    pub fn version(v: u64) -> Self {
        Component {
            typ: tlv::VERSION_NAME_COMPONENT,
            value: number_to_value(v),
        }
    }

    /// Segment component holding a NonNegativeInteger.
    pub fn segment(s: u64) -> Self {
        Component {
            typ: tlv::SEGMENT_NAME_COMPONENT,
            value: number_to_value(s),
        }
    }

    pub fn typ(&self) -> u64 {
        self.typ
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn is_generic(&self) -> bool {
        self.typ == tlv::GENERIC_NAME_COMPONENT
    }

    pub fn is_version(&self) -> bool {
        self.typ == tlv::VERSION_NAME_COMPONENT
    }

    /// Interpret the value as a NonNegativeInteger (version, segment).
    pub fn to_number(&self) -> Result<u64> {
        tlv::read_non_negative_integer(&self.value)
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        tlv::write_tlv(out, self.typ, &self.value);
    }

    fn escaped(&self) -> String {
        if self.value.is_empty() || self.value.iter().all(|&b| b == b'.') {
            // Periods-only values gain a "..." marker so the empty component
            // stays representable.
            let mut s = String::from("...");
            s.extend(self.value.iter().map(|_| '.'));
            return s;
        }
        let mut s = String::new();
        for &b in &self.value {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                s.push(b as char);
            } else {
                s.push_str(&format!("%{:02X}", b));
            }
        }
        s
    }

    fn from_escaped(typ: u64, s: &str) -> Result<Self> {
        // Only a periods-only segment carries the "..." marker.
        let s = if s.bytes().all(|b| b == b'.') {
            s.strip_prefix("...").ok_or_else(|| {
                Error::Parse(format!("illegal URI component `{}`", s))
            })?
        } else {
            s
        };
        let bytes = s.as_bytes();
        let mut value = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = s
                    .get(i + 1..i + 3)
                    .ok_or_else(|| Error::Parse(format!("truncated percent-escape in `{}`", s)))?;
                let b = u8::from_str_radix(hex, 16)
                    .map_err(|_| Error::Parse(format!("invalid percent-escape in `{}`", s)))?;
                value.push(b);
                i += 3;
            } else {
                value.push(bytes[i]);
                i += 1;
            }
        }
        Ok(Component { typ, value })
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Component {
    /// NDN canonical order: type, then length, then value bytes.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.typ
            .cmp(&other.typ)
            .then_with(|| self.value.len().cmp(&other.value.len()))
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.typ == tlv::GENERIC_NAME_COMPONENT {
            write!(f, "{}", self.escaped())
        } else {
            write!(f, "{}={}", self.typ, self.escaped())
        }
    }
}

fn number_to_value(n: u64) -> Vec<u8> {
    if n <= u64::from(u8::MAX) {
        vec![n as u8]
    } else if n <= u64::from(u16::MAX) {
        (n as u16).to_be_bytes().to_vec()
    } else if n <= u64::from(u32::MAX) {
        (n as u32).to_be_bytes().to_vec()
    } else {
        n.to_be_bytes().to_vec()
    }
}

/// Hierarchical NDN name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    components: Vec<Component>,
}

impl Name {
    pub fn new() -> Self {
        Name::default()
    }

    pub fn from_components(components: Vec<Component>) -> Self {
        Name { components }
    }

    /// Parse a URI such as `/alice/KEY/%9Fb%02` or `ndn:/alice`.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let uri = uri.strip_prefix("ndn:").unwrap_or(uri);
        let mut components = Vec::new();
        for seg in uri.split('/') {
            if seg.is_empty() {
                continue;
            }
            // Typed component syntax: `<decimal-type>=<escaped-value>`.
            let (typ, rest) = match seg.split_once('=') {
                Some((t, rest)) if t.chars().all(|c| c.is_ascii_digit()) && !t.is_empty() => {
                    let typ: u64 = t
                        .parse()
                        .map_err(|_| Error::Parse(format!("bad component type in `{}`", seg)))?;
                    (typ, rest)
                }
                _ => (tlv::GENERIC_NAME_COMPONENT, seg),
            };
            components.push(Component::from_escaped(typ, rest)?);
        }
        Ok(Name { components })
    }

    pub fn size(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component at `i`; negative indices count from the end.
    pub fn at(&self, i: isize) -> Option<&Component> {
        let idx = if i < 0 {
            self.components.len().checked_sub(i.unsigned_abs())?
        } else {
            i as usize
        };
        self.components.get(idx)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn push(&mut self, component: Component) -> &mut Self {
        self.components.push(component);
        self
    }

    pub fn append(&mut self, other: &Name) -> &mut Self {
        self.components.extend(other.components.iter().cloned());
        self
    }

    pub fn append_str(&mut self, s: &str) -> &mut Self {
        self.components.push(Component::generic(s.as_bytes()));
        self
    }

    /// Append a version component; `None` stamps the current time in
    /// milliseconds since the epoch.
    pub fn append_version(&mut self, v: Option<u64>) -> &mut Self {
        let v = v.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
        self.components.push(Component::version(v));
        self
    }

    pub fn append_segment(&mut self, s: u64) -> &mut Self {
        self.components.push(Component::segment(s));
        self
    }

    /// First `n` components as a new name.
    pub fn prefix(&self, n: usize) -> Name {
        Name {
            components: self.components.iter().take(n).cloned().collect(),
        }
    }

    /// Components `[start, start+count)` as a new name.
    pub fn sub_name(&self, start: usize, count: usize) -> Name {
        Name {
            components: self
                .components
                .iter()
                .skip(start)
                .take(count)
                .cloned()
                .collect(),
        }
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        other.components.len() >= self.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    /// Components encoded back to back, without the enclosing Name TLV.
    pub fn encode_value(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for c in &self.components {
            c.encode_into(&mut out);
        }
        out
    }

    /// Full `Name` TLV element.
    pub fn wire_encode(&self) -> Vec<u8> {
        let value = self.encode_value();
        let mut out = Vec::with_capacity(value.len() + 4);
        tlv::write_tlv(&mut out, tlv::NAME, &value);
        out
    }

    /// Parse a full `Name` TLV element.
    pub fn from_wire(buf: &[u8]) -> Result<Self> {
        let mut dec = tlv::Decoder::new(buf);
        let value = dec.expect(tlv::NAME)?;
        Name::from_wire_value(value)
    }

    /// Parse back-to-back components (the value of a Name TLV).
    pub fn from_wire_value(value: &[u8]) -> Result<Self> {
        let mut dec = tlv::Decoder::new(value);
        let mut components = Vec::new();
        while !dec.eof() {
            let (typ, v) = dec.read_tlv()?;
            components.push(Component::typed(typ, v.to_vec()));
        }
        Ok(Name { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for c in &self.components {
            write!(f, "/{}", c)?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Name::from_uri(s)
    }
}
