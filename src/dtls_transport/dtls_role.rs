use std::fmt;

use serde::{Deserialize, Serialize};

/// DTLSRole is the `a=setup` value a media line advertises.
///
/// <https://tools.ietf.org/html/rfc4145#section-4>
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DTLSRole {
    #[default]
    Unspecified = 0,

    /// The endpoint is willing to act either way; offers always use it.
    #[serde(rename = "actpass")]
    Actpass = 1,

    /// The endpoint initiates the DTLS handshake.
    #[serde(rename = "active")]
    Active = 2,

    /// The endpoint waits for the DTLS handshake.
    #[serde(rename = "passive")]
    Passive = 3,
}

/// The endpoint that is the offerer MUST use the setup attribute
/// value of setup:actpass and be prepared to receive a client_hello
/// before it receives the answer.
pub(crate) const DEFAULT_DTLS_ROLE_OFFER: DTLSRole = DTLSRole::Actpass;

const DTLS_ROLE_ACTPASS_STR: &str = "actpass";
const DTLS_ROLE_ACTIVE_STR: &str = "active";
const DTLS_ROLE_PASSIVE_STR: &str = "passive";

impl From<&str> for DTLSRole {
    fn from(raw: &str) -> Self {
        match raw {
            DTLS_ROLE_ACTPASS_STR => DTLSRole::Actpass,
            DTLS_ROLE_ACTIVE_STR => DTLSRole::Active,
            DTLS_ROLE_PASSIVE_STR => DTLSRole::Passive,
            _ => DTLSRole::Unspecified,
        }
    }
}

impl fmt::Display for DTLSRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DTLSRole::Actpass => write!(f, "{DTLS_ROLE_ACTPASS_STR}"),
            DTLSRole::Active => write!(f, "{DTLS_ROLE_ACTIVE_STR}"),
            DTLSRole::Passive => write!(f, "{DTLS_ROLE_PASSIVE_STR}"),
            _ => write!(f, "{}", crate::UNSPECIFIED_STR),
        }
    }
}

impl DTLSRole {
    /// answer_role picks the local role that complements `remote`.
    /// A remote `passive` makes us `active`; anything else, `actpass`
    /// included, resolves to `passive`.
    pub(crate) fn answer_role(remote: DTLSRole) -> DTLSRole {
        if remote == DTLSRole::Passive {
            DTLSRole::Active
        } else {
            DTLSRole::Passive
        }
    }
}
