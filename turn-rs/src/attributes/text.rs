use crate::common::text_attribute;

const USERNAME: u16 = 0x0006;
const REALM: u16 = 0x0014;
const NONCE: u16 = 0x0015;

text_attribute!(
    /// The [`UserName`] attribute identifies the user and password
    /// combination used in the message-integrity check. The value is
    /// sent as given, it must be valid UTF-8.
    ///
    /// # Examples
    ///```rust
    /// # use turn_rs::attributes::UserName;
    /// let attr = UserName::new("alice");
    /// assert_eq!(attr, "alice");
    /// assert_eq!(attr.as_str(), "alice");
    ///```
    UserName,
    USERNAME,
);

text_attribute!(
    /// The [`Realm`] attribute is sent by the server in the challenge
    /// and echoed by the client in every authenticated request.
    Realm,
    REALM,
);

text_attribute!(
    /// The [`Nonce`] attribute is an opaque value issued by the server
    /// and echoed by the client until the server replaces it.
    Nonce,
    NONCE,
);
