//! Session configuration.

use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_MAX_MESSAGE_SIZE: usize = 2048;

/// Configuration handed to a [`TurnSession`](crate::TurnSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnClientConfig {
    credential_source_uri: Option<String>,
    server_address: Option<SocketAddr>,
    read_timeout: Duration,
    max_message_size: usize,
    lifetime: Option<u32>,
    fingerprint: bool,
}

impl Default for TurnClientConfig {
    fn default() -> Self {
        Self {
            credential_source_uri: None,
            server_address: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            lifetime: None,
            fingerprint: false,
        }
    }
}

impl TurnClientConfig {
    /// Where the caller fetched the username and password from. The
    /// session never contacts it.
    pub fn credential_source_uri(&self) -> Option<&str> {
        self.credential_source_uri.as_deref()
    }

    /// Server address that overrides the one the caller discovered
    pub fn server_address(&self) -> Option<SocketAddr> {
        self.server_address
    }

    /// Bound for every read performed by the session
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Largest datagram the session accepts
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// LIFETIME requested in both Allocate requests, if any
    pub fn lifetime(&self) -> Option<u32> {
        self.lifetime
    }

    /// Whether requests carry a FINGERPRINT attribute
    pub fn fingerprint(&self) -> bool {
        self.fingerprint
    }

    /// Returns the configured server address if there is one, otherwise
    /// `advertised`.
    /// # Examples
    ///```rust
    /// # use turn_agent::TurnClientConfigBuilder;
    /// # use std::net::SocketAddr;
    /// let advertised: SocketAddr = "192.0.2.1:3478".parse().unwrap();
    /// let config = TurnClientConfigBuilder::default().build();
    /// assert_eq!(config.resolve_server(advertised), advertised);
    ///
    /// let server: SocketAddr = "198.51.100.7:3478".parse().unwrap();
    /// let config = TurnClientConfigBuilder::default()
    ///     .with_server_address(server)
    ///     .build();
    /// assert_eq!(config.resolve_server(advertised), server);
    ///```
    pub fn resolve_server(&self, advertised: SocketAddr) -> SocketAddr {
        self.server_address.unwrap_or(advertised)
    }
}

/// Builder class used to construct [`TurnClientConfig`] objects
#[derive(Debug, Default)]
pub struct TurnClientConfigBuilder(TurnClientConfig);

impl TurnClientConfigBuilder {
    /// Records the credential service the username and password come from
    pub fn with_credential_source_uri<S>(mut self, uri: S) -> Self
    where
        S: Into<String>,
    {
        self.0.credential_source_uri = Some(uri.into());
        self
    }

    /// Overrides the server address
    pub fn with_server_address(mut self, addr: SocketAddr) -> Self {
        self.0.server_address = Some(addr);
        self
    }

    /// Sets the read timeout. Defaults to one second.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.0.read_timeout = timeout;
        self
    }

    /// Sets the maximum accepted datagram size. Defaults to 2048 bytes.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.0.max_message_size = size;
        self
    }

    /// Requests an allocation lifetime, in seconds
    pub fn with_lifetime(mut self, seconds: u32) -> Self {
        self.0.lifetime = Some(seconds);
        self
    }

    /// Appends FINGERPRINT to every request
    pub fn with_fingerprint(mut self) -> Self {
        self.0.fingerprint = true;
        self
    }

    /// Builds the [`TurnClientConfig`]
    pub fn build(self) -> TurnClientConfig {
        self.0
    }
}
