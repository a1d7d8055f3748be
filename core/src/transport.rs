//! Transport variant selection by URL scheme.

use url::Url;

/// The two connection kinds a call can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportVariant {
    /// HTTP/1.1 over plain TCP.
    Plain,
    /// HTTP/1.1 over TLS.
    Encrypted,
}

impl TransportVariant {
    pub fn default_port(&self) -> u16 {
        match self {
            TransportVariant::Plain => 80,
            TransportVariant::Encrypted => 443,
        }
    }
}

/// Result of looking at a target's scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub variant: TransportVariant,
    pub default_port: u16,
}

impl Selection {
    /// Port to dial: the URL's explicit port, else the variant default.
    pub fn port_for(&self, url: &Url) -> u16 {
        url.port().unwrap_or(self.default_port)
    }
}

/// Pick the transport for `url`.
///
/// Only `https` selects TLS. Every other scheme, including ones this client
/// does not recognise, falls back to plain HTTP rather than failing.
pub fn select(url: &Url) -> Selection {
    let variant = match url.scheme() {
        "https" => TransportVariant::Encrypted,
        _ => TransportVariant::Plain,
    };
    Selection {
        variant,
        default_port: variant.default_port(),
    }
}
