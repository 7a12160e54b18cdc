//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod label;

use std::net::Ipv4Addr;

use bytes::{Bytes, BytesMut};
use ipnetwork::Ipv4Network;
use ldpd::packet::*;

const IPV4_CXT: DecodeCxt = DecodeCxt {
    pkt_info: PacketInfo {
        src_addr: Ipv4Addr::new(1, 1, 1, 1),
        multicast: None,
    },
    pdu_max_len: Pdu::DFLT_MAX_LEN,
};

//
// Helper functions.
//

fn net(s: &str) -> Ipv4Network {
    s.parse().unwrap()
}

fn test_encode_msg(bytes_expected: &[u8], msg: &Message) {
    let mut bytes_actual = BytesMut::with_capacity(1500);
    msg.encode(&mut bytes_actual);
    assert_eq!(bytes_expected, bytes_actual.as_ref());
}

fn test_decode_msg(cxt: &DecodeCxt, bytes: &[u8], msg_expected: &Message) {
    let mut buf = Bytes::copy_from_slice(bytes);

    // Create fake PDU decode information, required to decode LDP messages.
    let len = buf.len() as u16;
    let mut pdui = PduDecodeInfo {
        version: Pdu::VERSION,
        lsr_id: Ipv4Addr::new(1, 1, 1, 1),
        lspace_id: 0,
        pdu_raw: Bytes::new(),
        pdu_len: len,
        pdu_rlen: len,
    };

    let msg_actual = Message::decode(&mut buf, cxt, &mut pdui)
        .unwrap()
        .unwrap();
    assert_eq!(*msg_expected, msg_actual);
}
