//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::packet::DecodeCxt;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::message::MessageDecodeInfo;

//
// Message parameters share a common envelope:
//
//   U|F| type (14 bits) | value length (2) | value...
//
// The U bit makes an unrecognized TLV skippable instead of an error; the F
// bit asks for unrecognized TLVs to be forwarded. Neither is set on any TLV
// this speaker originates.
//
pub const TLV_HDR_SIZE: u16 = 4;
pub const TLV_UNKNOWN_FLAG: u16 = 0x8000;
pub const TLV_FORWARD_FLAG: u16 = 0x4000;
pub const TLV_TYPE_MASK: u16 = 0x3FFF;

// TLV types understood by this speaker.
//
// IANA registry:
// https://www.iana.org/assignments/ldp-namespaces/ldp-namespaces.xhtml#ldp-namespaces-4
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum TlvType {
    Fec = 0x0100,
    HopCount = 0x0103,
    PathVector = 0x0104,
    GenericLabel = 0x0200,
    Status = 0x0300,
    CommonHelloParams = 0x0400,
}

// One parsed TLV envelope: the raw bytes, the type word as received, the
// recognized type (if any) and the value length.
#[derive(Clone, Debug)]
pub struct TlvDecodeInfo {
    pub tlv_raw: Bytes,
    pub tlv_type: u16,
    pub tlv_etype: Option<TlvType>,
    pub tlv_len: u16,
}

// Codec shared by all TLVs.
//
// Implementors only deal with their value; the envelope, including the
// deferred length field, is handled here.
pub trait TlvKind: std::fmt::Debug {
    const TLV_TYPE: TlvType;
    const U_BIT: bool;
    const F_BIT: bool;

    fn encode_value(&self, buf: &mut BytesMut);

    fn decode_value(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        tlvi: &TlvDecodeInfo,
    ) -> DecodeResult<Self>
    where
        Self: Sized;

    fn encode(&self, buf: &mut BytesMut) {
        let mut word = Self::TLV_TYPE as u16;
        if Self::U_BIT {
            word |= TLV_UNKNOWN_FLAG;
        }
        if Self::F_BIT {
            word |= TLV_FORWARD_FLAG;
        }
        buf.put_u16(word);
        // Length placeholder, patched below.
        buf.put_u16(0);

        let value_start = buf.len();
        self.encode_value(buf);
        let value_len = (buf.len() - value_start) as u16;
        buf[value_start - 2..value_start]
            .copy_from_slice(&value_len.to_be_bytes());
    }
}

// ===== impl TlvType =====

impl TlvType {
    pub(crate) fn decode(value: u16) -> Option<Self> {
        TlvType::from_u16(value & TLV_TYPE_MASK)
    }
}

impl std::fmt::Display for TlvType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlvType::Fec => write!(f, "FEC"),
            TlvType::HopCount => write!(f, "Hop Count"),
            TlvType::PathVector => write!(f, "Path Vector"),
            TlvType::GenericLabel => write!(f, "Generic Label"),
            TlvType::Status => write!(f, "Status"),
            TlvType::CommonHelloParams => write!(f, "Common Hello Parameters"),
        }
    }
}

// ===== global functions =====

// Parses the next TLV envelope out of a message body, charging its full
// size against the message's remaining byte count.
pub(crate) fn decode_tlv_hdr(
    buf: &mut Bytes,
    msgi: &mut MessageDecodeInfo,
) -> DecodeResult<TlvDecodeInfo> {
    let raw = buf.clone();

    let tlv_type = buf.get_u16();
    let tlv_len = buf.get_u16();

    // The TLV must fit in what's left of the message.
    let tlv_size = tlv_len + TLV_HDR_SIZE;
    if tlv_size > msgi.msg_rlen {
        return Err(DecodeError::InvalidTlvLength(tlv_len));
    }
    msgi.msg_rlen -= tlv_size;

    Ok(TlvDecodeInfo {
        tlv_raw: raw.slice(..tlv_size as usize),
        tlv_type,
        tlv_etype: TlvType::decode(tlv_type),
        tlv_len,
    })
}
