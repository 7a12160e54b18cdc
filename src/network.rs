//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::BytesMut;

// LDP well-known port, used by both the datagram and session transports.
pub const LDP_PORT: u16 = 646;

// "All routers on this subnet" multicast group.
pub const ALL_RTRS_MCAST_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 2);

// Datagram transport used by basic discovery.
//
// Hellos are sent to the LDP port of either the all-routers multicast group
// or a unicast peer address; delivery is best-effort.
pub trait DiscoveryTransport {
    fn send_pdu(&mut self, dst_addr: Ipv4Addr, data: BytesMut);
}

// Reliable, ordered, byte-oriented session transport (one stream per peer).
//
// Connection establishment and teardown are reported back through the
// `process_session_*` entry points. Framing of the inbound byte stream is
// the host's responsibility, using `packet::Pdu::get_pdu_size`; every
// `process_session_pdu` call must carry exactly one complete PDU.
pub trait SessionTransport {
    // Open a connection to the peer's LDP port. The local router-id is used
    // as the source address.
    fn connect(&mut self, local_addr: Ipv4Addr, peer_addr: Ipv4Addr);

    // Send an encoded PDU over the peer's established session.
    fn send_pdu(&mut self, peer_addr: Ipv4Addr, data: BytesMut);

    // Close (or refuse) the connection associated with the peer.
    fn close(&mut self, peer_addr: Ipv4Addr);
}
