use byteorder::{BigEndian, ByteOrder};
use rand::distr::{Distribution, StandardUniform};
use rand::Rng;
use std::fmt;
use std::net::SocketAddr;
use std::ops::Deref;

pub(crate) const MAGIC_COOKIE_SIZE: usize = 4;
pub(crate) const TRANSACTION_ID_SIZE: usize = 12;

/// STUN message cookie
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cookie(u32);

impl Cookie {
    /// Returns the [`u32`] representation of the cookie
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl PartialEq<u32> for Cookie {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl PartialEq<&[u8; MAGIC_COOKIE_SIZE]> for Cookie {
    fn eq(&self, other: &&[u8; MAGIC_COOKIE_SIZE]) -> bool {
        self.0 == BigEndian::read_u32(other.deref())
    }
}

/// STUN magic cookie
pub const MAGIC_COOKIE: Cookie = Cookie(0x2112_A442);

/// The transaction ID is a 96-bit identifier used to correlate requests
/// with responses. A new random identifier is chosen for every request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId([u8; TRANSACTION_ID_SIZE]);

impl TransactionId {
    /// Returns a reference to the bytes that represents the identifier.
    pub fn as_bytes(&self) -> &[u8; TRANSACTION_ID_SIZE] {
        &self.0
    }
}

fn fmt_transaction_id(bytes: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02X}", byte)?;
    }
    write!(f, ")")
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TransactionId(0x")?;
        fmt_transaction_id(self.as_ref(), f)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "transaction id (0x")?;
        fmt_transaction_id(self.as_ref(), f)
    }
}

impl AsRef<[u8]> for TransactionId {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<&[u8; TRANSACTION_ID_SIZE]> for TransactionId {
    fn from(buff: &[u8; TRANSACTION_ID_SIZE]) -> Self {
        Self(*buff)
    }
}

impl From<[u8; TRANSACTION_ID_SIZE]> for TransactionId {
    fn from(buff: [u8; TRANSACTION_ID_SIZE]) -> Self {
        Self(buff)
    }
}

impl Distribution<TransactionId> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TransactionId {
        let mut buffer = [0u8; TRANSACTION_ID_SIZE];
        rng.fill_bytes(&mut buffer);
        TransactionId::from(buffer)
    }
}

impl Default for TransactionId {
    /// Creates a random transaction ID chosen from the interval 0 .. 2**96-1.
    fn default() -> Self {
        rand::rng().random()
    }
}

/// Address family of a transport address carried in a STUN attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IP version 4
    IPv4,
    /// IP version 6
    IPv6,
}

impl From<&SocketAddr> for AddressFamily {
    fn from(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddressFamily::IPv4,
            SocketAddr::V6(_) => AddressFamily::IPv6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn magic_cookie() {
        assert_eq!(MAGIC_COOKIE, 0x2112_A442);
        assert_eq!(MAGIC_COOKIE, &[0x21u8, 0x12, 0xA4, 0x42]);
        assert_ne!(MAGIC_COOKIE, &[0x21u8, 0x12, 0xA4, 0x43]);
    }

    #[test]
    fn transaction_id_fmt() {
        let id = TransactionId::from([
            0xb7, 0xe7, 0xa7, 0x01, 0xbc, 0x34, 0xd6, 0x86, 0xfa, 0x87, 0xdf, 0xae,
        ]);
        assert_eq!(format!("{:?}", id), "TransactionId(0xB7E7A701BC34D686FA87DFAE)");
        assert_eq!(
            format!("{}", id),
            "transaction id (0xB7E7A701BC34D686FA87DFAE)"
        );
    }

    #[test]
    fn transaction_id_random() {
        let first = TransactionId::default();
        let second = TransactionId::default();
        // 96 random bits, a collision here means the generator is broken
        assert_ne!(first, second);
    }

    #[test]
    fn address_family() {
        let addr = SocketAddr::from_str("1.2.3.4:5000").expect("Can not parse address");
        assert_eq!(AddressFamily::from(&addr), AddressFamily::IPv4);
        let addr = SocketAddr::from_str("[::1]:5000").expect("Can not parse address");
        assert_eq!(AddressFamily::from(&addr), AddressFamily::IPv6);
    }
}
