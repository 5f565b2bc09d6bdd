use std::fmt;

/// A 4-byte device address in network (most-significant-byte-first) order.
///
/// The radio carries it least-significant byte first; use [`DevAddr::from_wire`]
/// and [`DevAddr::to_wire`] at that boundary. Comparison, display and key
/// material all use the big-endian form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevAddr([u8; 4]);

impl DevAddr {
    /// Wrap big-endian address bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Build from the on-wire (little-endian) byte order.
    pub fn from_wire(wire: [u8; 4]) -> Self {
        let mut bytes = wire;
        bytes.reverse();
        Self(bytes)
    }

    /// Bytes in on-wire (little-endian) order.
    pub fn to_wire(self) -> [u8; 4] {
        let mut wire = self.0;
        wire.reverse();
        wire
    }

    /// Big-endian bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The 7-bit network identifier prefix (NwkID).
    pub fn nwk_id(self) -> u8 {
        self.0[0] >> 1
    }
}

impl From<[u8; 4]> for DevAddr {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for DevAddr {
    type Error = std::array::TryFromSliceError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        Ok(Self(bytes.try_into()?))
    }
}

impl fmt::Display for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevAddr({self})")
    }
}
