//! Recipient address classification
//!
//! A recipient string is tried against each scheme in [`CLASSIFIER_ORDER`] and
//! the first scheme that accepts it wins. The order is significant: a URL is
//! recognised before any key decoding is attempted, so an `http://` address
//! whose host happens to be a hidden service is reported as an onion URL
//! rather than a Tor address.

pub mod slatepack;
pub mod tor;

pub use slatepack::{public_key_to_slatepack_address, slatepack_address_to_public_key};
pub use tor::{is_onion_host, public_key_to_tor_address, tor_address_to_public_key};

use crate::{AddressFamily, Currency};
use serde::{Deserialize, Serialize};
use url::Url;

/// Address schemes a recipient may be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressScheme {
    /// `http://` or `https://` listener URL
    Url,
    /// Tor v3 address of the recipient wallet (MWC, Epic Cash)
    Tor,
    /// Slatepack address of the recipient wallet (Grin)
    Slatepack,
}

/// Order in which recipient classifiers are attempted
pub const CLASSIFIER_ORDER: [AddressScheme; 3] =
    [AddressScheme::Url, AddressScheme::Tor, AddressScheme::Slatepack];

/// Result of classifying a recipient string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientAddress {
    /// Nothing was entered
    Empty,
    /// Plain http(s) listener; cannot bind a payment proof
    Http(Url),
    /// http(s) URL whose host is a hidden service
    OnionUrl(Url),
    /// Tor address decoded to the recipient's public key
    Tor([u8; 32]),
    /// Slatepack address decoded to the recipient's public key
    Slatepack([u8; 32]),
    /// No classifier accepted the string
    Invalid,
}

impl RecipientAddress {
    /// Public key a payment proof can be bound to, if the address names one
    pub fn public_key(&self) -> Option<&[u8; 32]> {
        match self {
            RecipientAddress::Tor(key) | RecipientAddress::Slatepack(key) => Some(key),
            _ => None,
        }
    }

    /// Whether the address is a wallet key that needs Tor or file transport
    pub fn requires_indirect_transport(&self) -> bool {
        self.public_key().is_some()
    }

    pub fn scheme(&self) -> Option<AddressScheme> {
        match self {
            RecipientAddress::Http(_) | RecipientAddress::OnionUrl(_) => Some(AddressScheme::Url),
            RecipientAddress::Tor(_) => Some(AddressScheme::Tor),
            RecipientAddress::Slatepack(_) => Some(AddressScheme::Slatepack),
            RecipientAddress::Empty | RecipientAddress::Invalid => None,
        }
    }
}

impl AddressScheme {
    /// Attempts this scheme on an already trimmed, non-empty recipient
    pub fn attempt(self, currency: Currency, recipient: &str) -> Option<RecipientAddress> {
        match self {
            AddressScheme::Url => {
                let url = Url::parse(recipient).ok()?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return None;
                }
                if url.host_str().is_some_and(is_onion_host) {
                    Some(RecipientAddress::OnionUrl(url))
                } else {
                    Some(RecipientAddress::Http(url))
                }
            }
            AddressScheme::Tor => {
                if currency.address_family() != AddressFamily::Tor {
                    return None;
                }
                tor_address_to_public_key(recipient).ok().map(RecipientAddress::Tor)
            }
            AddressScheme::Slatepack => {
                if currency.address_family() != AddressFamily::Slatepack {
                    return None;
                }
                slatepack_address_to_public_key(recipient, currency)
                    .ok()
                    .map(RecipientAddress::Slatepack)
            }
        }
    }
}

/// Classifies a recipient as entered by the user.
///
/// Surrounding whitespace is ignored. An empty recipient is reported as
/// [`RecipientAddress::Empty`], distinct from [`RecipientAddress::Invalid`].
pub fn classify(currency: Currency, recipient: &str) -> RecipientAddress {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return RecipientAddress::Empty;
    }

    CLASSIFIER_ORDER
        .iter()
        .find_map(|scheme| scheme.attempt(currency, recipient))
        .unwrap_or(RecipientAddress::Invalid)
}
