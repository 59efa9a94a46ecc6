// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Security contract (RTPS §8.5, DDS-Security SEC_PREFIX/SEC_POSTFIX/
//! SEC_BODY and SRTPS_PREFIX/SRTPS_POSTFIX submessages): the framer
//! reserves the submessage kinds and gates outgoing/incoming transforms on
//! a [`SecurityTransform`], but no authentication, access-control, or
//! cryptographic plugin ships here.

use crate::types::Guid;

/// Applied to a fully-encoded RTPS message before it reaches the transport,
/// and to a received message before the framer parses its submessages.
pub trait SecurityTransform: Send + Sync {
    /// Wrap `message` for `destination`, typically producing a message
    /// whose body is an opaque SEC_BODY submessage.
    fn encode_message(&self, destination: Guid, message: &[u8]) -> crate::error::Result<Vec<u8>>;

    /// Reverse `encode_message`, recovering the plaintext RTPS message.
    fn decode_message(&self, source: Guid, message: &[u8]) -> crate::error::Result<Vec<u8>>;

    /// Whether `source` has completed authentication and may participate
    /// in discovery/data exchange at all.
    fn is_authenticated(&self, source: Guid) -> bool;
}

/// The do-nothing transform: plaintext RTPS, used when security is
/// disabled. This is the only `SecurityTransform` this crate provides.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSecurity;

impl SecurityTransform for NoSecurity {
    fn encode_message(&self, _destination: Guid, message: &[u8]) -> crate::error::Result<Vec<u8>> {
        Ok(message.to_vec())
    }

    fn decode_message(&self, _source: Guid, message: &[u8]) -> crate::error::Result<Vec<u8>> {
        Ok(message.to_vec())
    }

    fn is_authenticated(&self, _source: Guid) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, GuidPrefix};

    fn guid() -> Guid {
        Guid::new(GuidPrefix::new([1u8; 12]), EntityId::new([0, 0, 1, 2]))
    }

    #[test]
    fn no_security_passes_messages_through_unchanged() {
        let transform = NoSecurity;
        let encoded = transform.encode_message(guid(), b"hello").unwrap();
        assert_eq!(transform.decode_message(guid(), &encoded).unwrap(), b"hello");
    }

    #[test]
    fn no_security_treats_every_peer_as_authenticated() {
        assert!(NoSecurity.is_authenticated(guid()));
    }
}
