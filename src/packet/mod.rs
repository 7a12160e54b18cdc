//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod error;
pub mod message;
pub mod messages;
pub mod pdu;
pub mod tlv;

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};

pub use error::*;
pub use message::*;
pub use messages::*;
pub use pdu::*;
pub use tlv::*;

// Information about a received packet.
#[derive(Clone, Debug)]
pub struct PacketInfo {
    pub src_addr: Ipv4Addr,
    pub multicast: Option<bool>,
}

// LDP packet decoding context.
#[derive(Clone, Debug)]
pub struct DecodeCxt {
    pub pkt_info: PacketInfo,
    pub pdu_max_len: u16,
}

// ===== helper functions =====

pub(crate) trait BytesExt {
    // Gets an IPv4 address from `self` in big-endian byte order, advancing
    // the current position by 4.
    fn get_ipv4(&mut self) -> Ipv4Addr;
}

pub(crate) trait BytesMutExt {
    // Writes an IPv4 address to `self` in big-endian byte order, advancing
    // the current position by 4.
    fn put_ipv4(&mut self, addr: &Ipv4Addr);
}

impl BytesExt for Bytes {
    fn get_ipv4(&mut self) -> Ipv4Addr {
        Ipv4Addr::from(self.get_u32())
    }
}

impl BytesMutExt for BytesMut {
    fn put_ipv4(&mut self, addr: &Ipv4Addr) {
        self.put_slice(&addr.octets());
    }
}
