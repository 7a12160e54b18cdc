//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use ldpd::mpls::Label;
use ldpd::packet::messages::label::{LabelMsg, TlvFec, TlvLabel};

use super::*;

static LABEL_MAPPING_MSG1: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x04, 0x00, 0x00, 0x18, 0x00, 0x00, 0x00, 0x39, 0x01, 0x00, 0x00,
            0x08, 0x02, 0x00, 0x01, 0x20, 0x01, 0x01, 0x01, 0x01, 0x02, 0x00,
            0x00, 0x04, 0x00, 0x00, 0x00, 0x10,
        ],
        LabelMsg {
            msg_id: 57,
            msg_type: LabelMessageType::LabelMapping,
            fec: TlvFec(vec![net("1.1.1.1/32")]),
            label: Some(TlvLabel(Label::new(16))),
        }
        .into(),
    )
});

static LABEL_MAPPING_MSG2: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x04, 0x00, 0x00, 0x17, 0x00, 0x00, 0x00, 0x41, 0x01, 0x00, 0x00,
            0x07, 0x02, 0x00, 0x01, 0x18, 0x0a, 0x00, 0x00, 0x02, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00, 0x12,
        ],
        LabelMsg {
            msg_id: 65,
            msg_type: LabelMessageType::LabelMapping,
            fec: TlvFec(vec![net("10.0.0.0/24")]),
            label: Some(TlvLabel(Label::new(18))),
        }
        .into(),
    )
});

static LABEL_REQUEST_MSG1: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x04, 0x01, 0x00, 0x10, 0x00, 0x00, 0x00, 0x46, 0x01, 0x00, 0x00,
            0x08, 0x02, 0x00, 0x01, 0x20, 0x02, 0x02, 0x02, 0x02,
        ],
        LabelMsg {
            msg_id: 70,
            msg_type: LabelMessageType::LabelRequest,
            fec: TlvFec(vec![net("2.2.2.2/32")]),
            label: None,
        }
        .into(),
    )
});

static LABEL_WITHDRAW_MSG1: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x04, 0x02, 0x00, 0x18, 0x00, 0x00, 0x00, 0x47, 0x01, 0x00, 0x00,
            0x08, 0x02, 0x00, 0x01, 0x20, 0x01, 0x01, 0x01, 0x01, 0x02, 0x00,
            0x00, 0x04, 0x00, 0x00, 0x00, 0x10,
        ],
        LabelMsg {
            msg_id: 71,
            msg_type: LabelMessageType::LabelWithdraw,
            fec: TlvFec(vec![net("1.1.1.1/32")]),
            label: Some(TlvLabel(Label::new(16))),
        }
        .into(),
    )
});

static LABEL_RELEASE_MSG1: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x04, 0x03, 0x00, 0x18, 0x00, 0x00, 0x00, 0x48, 0x01, 0x00, 0x00,
            0x08, 0x02, 0x00, 0x01, 0x20, 0x01, 0x01, 0x01, 0x01, 0x02, 0x00,
            0x00, 0x04, 0x00, 0x00, 0x00, 0x10,
        ],
        LabelMsg {
            msg_id: 72,
            msg_type: LabelMessageType::LabelRelease,
            fec: TlvFec(vec![net("1.1.1.1/32")]),
            label: Some(TlvLabel(Label::new(16))),
        }
        .into(),
    )
});

#[test]
fn test_encode_label_mapping1() {
    let (ref bytes, ref msg) = *LABEL_MAPPING_MSG1;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_label_mapping1() {
    let (ref bytes, ref msg) = *LABEL_MAPPING_MSG1;
    test_decode_msg(&IPV4_CXT, bytes, msg);
}

#[test]
fn test_encode_label_mapping2() {
    let (ref bytes, ref msg) = *LABEL_MAPPING_MSG2;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_label_mapping2() {
    let (ref bytes, ref msg) = *LABEL_MAPPING_MSG2;
    test_decode_msg(&IPV4_CXT, bytes, msg);
}

#[test]
fn test_encode_label_request1() {
    let (ref bytes, ref msg) = *LABEL_REQUEST_MSG1;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_label_request1() {
    let (ref bytes, ref msg) = *LABEL_REQUEST_MSG1;
    test_decode_msg(&IPV4_CXT, bytes, msg);
}

#[test]
fn test_encode_label_withdraw1() {
    let (ref bytes, ref msg) = *LABEL_WITHDRAW_MSG1;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_label_withdraw1() {
    let (ref bytes, ref msg) = *LABEL_WITHDRAW_MSG1;
    test_decode_msg(&IPV4_CXT, bytes, msg);
}

#[test]
fn test_encode_label_release1() {
    let (ref bytes, ref msg) = *LABEL_RELEASE_MSG1;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_label_release1() {
    let (ref bytes, ref msg) = *LABEL_RELEASE_MSG1;
    test_decode_msg(&IPV4_CXT, bytes, msg);
}

// A label mapping without a label TLV is malformed.
#[test]
fn test_decode_label_mapping_no_label() {
    let bytes = vec![
        0x04, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x39, 0x01, 0x00, 0x00,
        0x08, 0x02, 0x00, 0x01, 0x20, 0x01, 0x01, 0x01, 0x01,
    ];

    let mut buf = Bytes::copy_from_slice(&bytes);
    let len = buf.len() as u16;
    let mut pdui = PduDecodeInfo {
        version: Pdu::VERSION,
        lsr_id: std::net::Ipv4Addr::new(1, 1, 1, 1),
        lspace_id: 0,
        pdu_raw: Bytes::new(),
        pdu_len: len,
        pdu_rlen: len,
    };

    assert!(matches!(
        Message::decode(&mut buf, &IPV4_CXT, &mut pdui),
        Err(DecodeError::MissingMsgParams(_, TlvType::GenericLabel))
    ));
}

// IPv6 FEC elements aren't supported by this speaker.
#[test]
fn test_decode_label_request_ipv6_af() {
    let bytes = vec![
        0x04, 0x01, 0x00, 0x10, 0x00, 0x00, 0x00, 0x46, 0x01, 0x00, 0x00,
        0x08, 0x02, 0x00, 0x02, 0x20, 0x02, 0x02, 0x02, 0x02,
    ];

    let mut buf = Bytes::copy_from_slice(&bytes);
    let len = buf.len() as u16;
    let mut pdui = PduDecodeInfo {
        version: Pdu::VERSION,
        lsr_id: std::net::Ipv4Addr::new(1, 1, 1, 1),
        lspace_id: 0,
        pdu_raw: Bytes::new(),
        pdu_len: len,
        pdu_rlen: len,
    };

    assert!(matches!(
        Message::decode(&mut buf, &IPV4_CXT, &mut pdui),
        Err(DecodeError::UnsupportedAf(_, 2))
    ));
}
