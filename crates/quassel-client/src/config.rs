//! Client and transport configuration.

use std::sync::Arc;
use std::time::Duration;

/// How (or whether) to wrap the TCP connection in TLS.
#[derive(Debug, Clone, Default)]
pub enum TlsPolicy {
    /// No TLS. Matches a core configured without `UseSsl`.
    #[default]
    Plain,
    /// Wrap in TLS but accept any server certificate, including
    /// self-signed ones. For local development and integration tests
    /// only — mirrors the teacher's `InsecureCertVerifier`.
    Insecure,
    /// Wrap in TLS and verify the server certificate against the
    /// platform/Mozilla root store.
    Webpki,
}

/// Transport-level connection settings, grounded on the teacher's
/// `TransportConfig`/`insecure_client_config` pattern.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// How long to wait for the TCP handshake before giving up.
    pub connect_timeout: Duration,
    /// TLS policy for the connection.
    pub tls: TlsPolicy,
    /// Whether to advertise zlib compression support during probing.
    pub advertise_compression: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            tls: TlsPolicy::Plain,
            advertise_compression: true,
        }
    }
}

impl TransportConfig {
    /// A convenience config for local development and integration tests:
    /// TLS disabled, a short connect timeout.
    #[must_use]
    pub fn development() -> Self {
        Self { connect_timeout: Duration::from_secs(2), tls: TlsPolicy::Plain, advertise_compression: false }
    }
}

/// Everything needed to connect and authenticate a [`crate::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Quassel core host name or address.
    pub host: Arc<str>,
    /// Quassel core port.
    pub port: u16,
    /// Quassel core user name.
    pub user: String,
    /// Quassel core password.
    pub password: String,
    /// Transport-level settings.
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Build a config with the given host/port/credentials and default
    /// transport settings.
    #[must_use]
    pub fn new(host: impl Into<Arc<str>>, port: u16, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { host: host.into(), port, user: user.into(), password: password.into(), transport: TransportConfig::default() }
    }
}
