//! Authentication-related types.

use std::fmt::{Display, Formatter};

use crate::types::core::Atom;

/// Authentication mechanism.
///
/// The engine treats SASL tokens as opaque byte strings; the mechanism name
/// only selects what goes after `AUTHENTICATE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AuthMechanism {
    /// The PLAIN SASL mechanism (RFC 4616).
    Plain,
    /// The (non-standardized) LOGIN SASL mechanism.
    Login,
    /// OAuth 2.0 bearer token mechanism (RFC 7628).
    OAuthBearer,
    /// Google's OAuth 2.0 mechanism.
    XOAuth2,
    /// SCRAM-SHA-1 (RFC 5802).
    ScramSha1,
    /// SCRAM-SHA-256 (RFC 7677).
    ScramSha256,
    /// GSSAPI (RFC 4752).
    Gssapi,
    /// External authentication, e.g., a TLS client certificate (RFC 4422).
    External,
    /// Some other mechanism.
    Other(Atom),
}

impl From<Atom> for AuthMechanism {
    fn from(atom: Atom) -> Self {
        match atom.inner().to_ascii_uppercase().as_str() {
            "PLAIN" => Self::Plain,
            "LOGIN" => Self::Login,
            "OAUTHBEARER" => Self::OAuthBearer,
            "XOAUTH2" => Self::XOAuth2,
            "SCRAM-SHA-1" => Self::ScramSha1,
            "SCRAM-SHA-256" => Self::ScramSha256,
            "GSSAPI" => Self::Gssapi,
            "EXTERNAL" => Self::External,
            _ => Self::Other(atom),
        }
    }
}

impl Display for AuthMechanism {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("PLAIN"),
            Self::Login => f.write_str("LOGIN"),
            Self::OAuthBearer => f.write_str("OAUTHBEARER"),
            Self::XOAuth2 => f.write_str("XOAUTH2"),
            Self::ScramSha1 => f.write_str("SCRAM-SHA-1"),
            Self::ScramSha256 => f.write_str("SCRAM-SHA-256"),
            Self::Gssapi => f.write_str("GSSAPI"),
            Self::External => f.write_str("EXTERNAL"),
            Self::Other(atom) => f.write_str(atom.inner()),
        }
    }
}
