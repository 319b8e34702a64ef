//! Credentials and key derivation for the STUN authentication mechanisms.

use std::fmt;
use std::sync::Arc;

/// Authentication and message-integrity mechanisms.
/// STUN defines two mechanisms a client and server can use to provide
/// authentication and message integrity: the short-term credential
/// mechanism and the long-term credential mechanism. TURN uses the latter.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CredentialMechanism {
    /// [short-term credential mechanism](https://datatracker.ietf.org/doc/html/rfc5389#section-10.1)
    ShortTerm,
    /// [long-term credential mechanism](https://datatracker.ietf.org/doc/html/rfc5389#section-10.2)
    LongTerm,
}

impl CredentialMechanism {
    /// Returns true if this is a short-term-credential mechanism
    pub fn is_short_term(&self) -> bool {
        matches!(self, CredentialMechanism::ShortTerm)
    }

    /// Returns true if this is a long-term-credential mechanism
    pub fn is_long_term(&self) -> bool {
        matches!(self, CredentialMechanism::LongTerm)
    }
}

#[derive(PartialEq, Eq)]
struct HMACKeyPriv {
    mechanism: CredentialMechanism,
    key: Vec<u8>,
}

/// Key used for authentication and message integrity
///
/// # Examples:
///```rust
/// # use turn_rs::{CredentialMechanism, HMACKey};
/// let key = HMACKey::new_long_term("user", "realm", "pass");
/// assert_eq!(key.credential_mechanism(), CredentialMechanism::LongTerm);
///
/// let expected_hash = [
///     0x84, 0x93, 0xFB, 0xC5, 0x3B, 0xA5, 0x82, 0xFB,
///     0x4C, 0x04, 0x4C, 0x45, 0x6B, 0xDC, 0x40, 0xEB,
/// ];
/// assert_eq!(key.as_bytes(), expected_hash);
///```
#[derive(PartialEq, Eq, Clone)]
pub struct HMACKey(Arc<HMACKeyPriv>);

impl HMACKey {
    /// Creates a [`CredentialMechanism::ShortTerm`] key. The key is the
    /// password itself.
    pub fn new_short_term<S>(password: S) -> Self
    where
        S: AsRef<str>,
    {
        let key = password.as_ref().as_bytes().to_vec();
        let mechanism = CredentialMechanism::ShortTerm;
        HMACKey(Arc::new(HMACKeyPriv { mechanism, key }))
    }

    /// Creates a [`CredentialMechanism::LongTerm`] key. The key is the
    /// 16-byte MD5 digest of `username ":" realm ":" password`.
    pub fn new_long_term<A, B, C>(username: A, realm: B, password: C) -> Self
    where
        A: AsRef<str>,
        B: AsRef<str>,
        C: AsRef<str>,
    {
        let key_str = format!(
            "{}:{}:{}",
            username.as_ref(),
            realm.as_ref(),
            password.as_ref()
        );
        let key = md5::compute(key_str).0.to_vec();
        let mechanism = CredentialMechanism::LongTerm;
        HMACKey(Arc::new(HMACKeyPriv { mechanism, key }))
    }

    /// Gets the bytes representation of the key
    pub fn as_bytes(&self) -> &[u8] {
        &self.0.key
    }

    /// Gets the credential mechanism this key was created for
    pub fn credential_mechanism(&self) -> CredentialMechanism {
        self.0.mechanism
    }
}

impl fmt::Debug for HMACKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Never print key material
        f.debug_struct("HMACKey")
            .field("mechanism", &self.0.mechanism)
            .finish_non_exhaustive()
    }
}

/// Long-term credentials used by a TURN client.
///
/// A client starts with only the username and password. The realm and
/// nonce are learnt from the server's first error response and carried
/// unchanged on every authenticated request afterwards.
///
/// # Examples:
///```rust
/// # use turn_rs::Credentials;
/// let credentials = Credentials::new("alice", "secret");
/// assert!(!credentials.is_authenticated());
/// assert!(credentials.key().is_none());
///
/// let credentials = credentials.with_realm("example.org").with_nonce("abc123");
/// assert!(credentials.is_authenticated());
/// assert!(credentials.key().is_some());
///```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    username: String,
    password: String,
    realm: Option<String>,
    nonce: Option<String>,
}

impl Credentials {
    /// Creates a new set of credentials without realm or nonce
    pub fn new<U, P>(username: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            username: username.into(),
            password: password.into(),
            realm: None,
            nonce: None,
        }
    }

    /// Sets the realm
    pub fn with_realm<S>(mut self, realm: S) -> Self
    where
        S: Into<String>,
    {
        self.realm = Some(realm.into());
        self
    }

    /// Sets the nonce
    pub fn with_nonce<S>(mut self, nonce: S) -> Self
    where
        S: Into<String>,
    {
        self.nonce = Some(nonce.into());
        self
    }

    /// Returns the user name
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the realm, if it is already known
    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Returns the nonce, if it is already known
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// Returns true once both realm and nonce are known
    pub fn is_authenticated(&self) -> bool {
        self.realm.is_some() && self.nonce.is_some()
    }

    /// Returns the long-term key used to sign outgoing messages. There is
    /// no key while the user name or the realm is empty.
    pub fn key(&self) -> Option<HMACKey> {
        let realm = self.realm.as_deref().filter(|r| !r.is_empty())?;
        if self.username.is_empty() {
            return None;
        }
        Some(HMACKey::new_long_term(
            &self.username,
            realm,
            &self.password,
        ))
    }

    /// Returns the long-term key used to verify MESSAGE-INTEGRITY of
    /// received messages. There is no key while the password or the realm
    /// is empty, so an empty password disables verification.
    pub fn verification_key(&self) -> Option<HMACKey> {
        let realm = self.realm.as_deref().filter(|r| !r.is_empty())?;
        if self.password.is_empty() {
            return None;
        }
        Some(HMACKey::new_long_term(
            &self.username,
            realm,
            &self.password,
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("realm", &self.realm)
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}
