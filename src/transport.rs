// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transport contract: this crate frames and interprets RTPS messages but
//! never opens a socket itself. Anything that can move bytes between
//! [`Locator`]s implements [`Transport`] and is handed to a Participant.

use crate::types::Locator;
use std::io;

/// The locator kinds a concrete transport may claim to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Udpv4,
    Udpv6,
    /// Same-host zero-copy channel, addressed by a reserved locator kind.
    SharedMemory,
}

/// One inbound datagram plus the locator it arrived from, for reply routing
/// (e.g. an ACKNACK's destination is the source locator of the HEARTBEAT
/// that provoked it, not necessarily the writer's advertised locator).
#[derive(Debug, Clone)]
pub struct ReceivedDatagram {
    pub source: Locator,
    pub data: Vec<u8>,
}

/// A channel a Participant can poll for inbound datagrams on one locator
/// (typically one per metatraffic/userdata, unicast/multicast combination).
pub trait ReceiveChannel: Send {
    /// Block for up to `timeout`, returning the next datagram if one
    /// arrives, or `Ok(None)` on timeout.
    fn recv_timeout(&mut self, timeout: std::time::Duration) -> io::Result<Option<ReceivedDatagram>>;
}

/// The send/receive surface a Participant needs from a concrete transport.
/// Implementations own whatever sockets, shared-memory segments, or test
/// doubles actually move the bytes.
pub trait Transport: Send + Sync {
    /// Send `data` to `destination`. Best-effort: transports never retry —
    /// retransmission lives in the writer/reader state machines, not here.
    fn send(&self, destination: &Locator, data: &[u8]) -> io::Result<()>;

    /// Open a channel that receives datagrams addressed to `local`. Called
    /// once per locator the Participant needs to listen on.
    fn open_receive_channel(&self, local: &Locator) -> io::Result<Box<dyn ReceiveChannel>>;

    /// Whether this transport can originate or receive traffic on `locator`
    /// at all (e.g. a UDP-only transport rejects a `SharedMemory` locator).
    fn is_locator_supported(&self, locator: &Locator) -> bool;

    /// Rewrite a locator the transport received (e.g. replace an
    /// `INADDR_ANY`-style wildcard with the interface it actually bound) so
    /// downstream discovery announces addresses callable from outside.
    fn normalize(&self, locator: Locator) -> Locator {
        locator
    }

    fn kind(&self) -> TransportKind;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::{Arc, Mutex};

    struct LoopbackTransport {
        inbox: Arc<Mutex<Vec<ReceivedDatagram>>>,
    }

    struct LoopbackChannel {
        inbox: Arc<Mutex<Vec<ReceivedDatagram>>>,
    }

    impl ReceiveChannel for LoopbackChannel {
        fn recv_timeout(&mut self, _timeout: std::time::Duration) -> io::Result<Option<ReceivedDatagram>> {
            Ok(self.inbox.lock().unwrap().pop())
        }
    }

    impl Transport for LoopbackTransport {
        fn send(&self, destination: &Locator, data: &[u8]) -> io::Result<()> {
            self.inbox.lock().unwrap().push(ReceivedDatagram {
                source: *destination,
                data: data.to_vec(),
            });
            Ok(())
        }

        fn open_receive_channel(&self, _local: &Locator) -> io::Result<Box<dyn ReceiveChannel>> {
            Ok(Box::new(LoopbackChannel {
                inbox: Arc::clone(&self.inbox),
            }))
        }

        fn is_locator_supported(&self, locator: &Locator) -> bool {
            locator.kind == crate::types::locator::LOCATOR_KIND_UDPV4
        }

        fn kind(&self) -> TransportKind {
            TransportKind::Udpv4
        }
    }

    #[test]
    fn loopback_round_trips_a_datagram() {
        let transport = LoopbackTransport {
            inbox: Arc::new(Mutex::new(Vec::new())),
        };
        let locator = Locator::udpv4(Ipv4Addr::new(127, 0, 0, 1), 7400);
        transport.send(&locator, b"hello").unwrap();

        let mut channel = transport.open_receive_channel(&locator).unwrap();
        let received = channel.recv_timeout(std::time::Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(received.data, b"hello");
    }

    #[test]
    fn udp_transport_rejects_non_udp_locators() {
        let transport = LoopbackTransport {
            inbox: Arc::new(Mutex::new(Vec::new())),
        };
        assert!(transport.is_locator_supported(&Locator::udpv4(Ipv4Addr::new(127, 0, 0, 1), 7400)));
    }
}
