//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ipnetwork::Ipv4Network;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::mpls::Label;
use crate::packet::DecodeCxt;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::message::{
    LabelMessageType, Message, MessageDecodeInfo, MessageKind, MessageType,
};
use crate::packet::tlv::{self, TlvDecodeInfo, TlvKind, TlvType};

//
// Label messages.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |0|   Label Mapping (0x0400)    |      Message Length           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Message ID                                |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     FEC TLV                                   |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Label TLV (mapping only)                  |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Optional Parameters                       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// The same layout is shared by the Label Request (0x0401), Label Withdraw
// (0x0402) and Label Release (0x0403) messages; the request carries no
// label TLV, withdraw and release carry it optionally.
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[skip_serializing_none]
#[derive(Deserialize, Serialize)]
pub struct LabelMsg {
    pub msg_id: u32,
    pub msg_type: LabelMessageType,
    pub fec: TlvFec,
    pub label: Option<TlvLabel>,
}

//
// FEC TLV.
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |0|0| FEC (0x0100)              |      Length                   |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        FEC Element 1                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                                                               |
// ~                                                               ~
// |                                                               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        FEC Element n                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// Only IPv4 Prefix FEC elements are supported:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Prefix (2)   |     Address Family            |     PreLen    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Prefix                                    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TlvFec(pub Vec<Ipv4Network>);

// Forwarding Equivalence Class (FEC) Type Name Space.
//
// IANA registry:
// https://www.iana.org/assignments/ldp-namespaces/ldp-namespaces.xhtml#fec-type
pub const TLV_FEC_ELEMENT_WILDCARD: u8 = 1;
pub const TLV_FEC_ELEMENT_PREFIX: u8 = 2;

// IPv4 address family (IANA-assigned number).
pub const AF_IPV4: u16 = 1;

// Generic Label TLV.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TlvLabel(pub Label);

// ===== impl LabelMsg =====

impl MessageKind for LabelMsg {
    const U_BIT: bool = false;

    fn msg_id(&self) -> u32 {
        self.msg_id
    }

    fn msg_type(&self) -> MessageType {
        self.msg_type.into()
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.fec.encode(buf);
        if let Some(tlv) = &self.label {
            tlv.encode(buf);
        }
    }

    fn decode_body(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        msgi: &mut MessageDecodeInfo,
    ) -> DecodeResult<Message> {
        // Decode mandatory FEC TLV (all label messages).
        let tlvi = tlv::decode_tlv_hdr(buf, msgi)?;
        if tlvi.tlv_type != TlvType::Fec as u16 {
            return Err(DecodeError::MissingMsgParams(
                msgi.clone(),
                TlvType::Fec,
            ));
        }
        let fec = TlvFec::decode_value(buf, cxt, &tlvi)?;

        // Create new message.
        let mut msg = LabelMsg {
            msg_type: LabelMessageType::from_u16(msgi.msg_type).unwrap(),
            msg_id: msgi.msg_id,
            fec,
            label: None,
        };

        // Decode optional TLV(s).
        msg.decode_opt_tlvs(buf, cxt, msgi)?;

        // Additional sanity checks.
        match msgi.msg_etype.unwrap() {
            // Check for missing message-specific mandatory parameters.
            MessageType::LabelMapping if msg.label.is_none() => {
                return Err(DecodeError::MissingMsgParams(
                    msgi.clone(),
                    TlvType::GenericLabel,
                ));
            }
            // RFC 5036 - Section 3.4.1:
            // "Note that this version of LDP supports the use of multiple
            // FEC Elements per FEC for the Label Mapping message only".
            MessageType::LabelRequest
            | MessageType::LabelWithdraw
            | MessageType::LabelRelease
                if msg.fec.0.len() > 1 =>
            {
                return Err(DecodeError::InvalidTlvValue(tlvi));
            }
            _ => (),
        }

        Ok(Message::Label(msg))
    }

    fn decode_opt_tlv(
        &mut self,
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        tlvi: &TlvDecodeInfo,
    ) -> DecodeResult<bool> {
        match tlvi.tlv_etype.unwrap() {
            TlvType::HopCount | TlvType::PathVector => {
                // Ignore - loop detection is unnecessary for frame-mode MPLS
                // networks.
                buf.advance(tlvi.tlv_len as usize);
            }
            TlvType::GenericLabel => {
                self.label = Some(TlvLabel::decode_value(buf, cxt, tlvi)?);
            }
            _ => {
                return Ok(true);
            }
        };

        Ok(false)
    }
}

impl LabelMsg {
    pub fn get_label(&self) -> Option<Label> {
        self.label.as_ref().map(|label| label.0)
    }
}

// ===== impl TlvFec =====

impl TlvKind for TlvFec {
    const TLV_TYPE: TlvType = TlvType::Fec;
    const U_BIT: bool = false;
    const F_BIT: bool = false;

    fn encode_value(&self, buf: &mut BytesMut) {
        for prefix in &self.0 {
            // FEC element type.
            buf.put_u8(TLV_FEC_ELEMENT_PREFIX);

            // FEC address family.
            buf.put_u16(AF_IPV4);

            // FEC prefix length.
            let plen = prefix.prefix();
            buf.put_u8(plen);

            // FEC prefix (variable length).
            let prefix_bytes = prefix.network().octets();
            let plen_wire = prefix_wire_len(plen);
            buf.put(&prefix_bytes[0..plen_wire]);
        }
    }

    fn decode_value(
        buf: &mut Bytes,
        _cxt: &DecodeCxt,
        tlvi: &TlvDecodeInfo,
    ) -> DecodeResult<Self> {
        // FEC list can't be empty.
        if tlvi.tlv_len < 1 {
            return Err(DecodeError::InvalidTlvLength(tlvi.tlv_len));
        }

        let mut prefixes = vec![];
        let mut tlv_rlen = tlvi.tlv_len;
        while tlv_rlen >= 1 {
            let prefix = decode_fec_elem(buf, tlvi, &mut tlv_rlen)?;

            prefixes.push(prefix);
        }

        Ok(Self(prefixes))
    }
}

// ===== impl TlvLabel =====

impl TlvKind for TlvLabel {
    const TLV_TYPE: TlvType = TlvType::GenericLabel;
    const U_BIT: bool = false;
    const F_BIT: bool = false;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u32(self.0.get());
    }

    fn decode_value(
        buf: &mut Bytes,
        _cxt: &DecodeCxt,
        tlvi: &TlvDecodeInfo,
    ) -> DecodeResult<Self> {
        if tlvi.tlv_len != 4 {
            return Err(DecodeError::InvalidTlvLength(tlvi.tlv_len));
        }

        let label = buf.get_u32();
        if label > *Label::UNRESERVED_RANGE.end()
            || (Label::RESERVED_RANGE.contains(&label)
                && label != Label::IPV4_EXPLICIT_NULL
                && label != Label::IMPLICIT_NULL)
        {
            return Err(DecodeError::InvalidTlvValue(tlvi.clone()));
        }

        Ok(Self(Label::new(label)))
    }
}

// ===== global functions =====

fn decode_fec_elem(
    buf: &mut Bytes,
    tlvi: &TlvDecodeInfo,
    tlv_rlen: &mut u16,
) -> DecodeResult<Ipv4Network> {
    // Parse FEC element type.
    let fec_elem_type = buf.get_u8();
    *tlv_rlen -= 1;

    if fec_elem_type != TLV_FEC_ELEMENT_PREFIX {
        return Err(DecodeError::UnknownFec(tlvi.clone(), fec_elem_type));
    }

    if *tlv_rlen < 3 {
        return Err(DecodeError::InvalidTlvValue(tlvi.clone()));
    }

    // Parse prefix address family.
    let af = buf.get_u16();
    *tlv_rlen -= 2;
    if af != AF_IPV4 {
        return Err(DecodeError::UnsupportedAf(tlvi.clone(), af));
    }

    // Parse prefix length.
    let plen = buf.get_u8();
    *tlv_rlen -= 1;
    let plen_wire = prefix_wire_len(plen);
    if *tlv_rlen < plen_wire as u16 || plen > 32 {
        return Err(DecodeError::InvalidTlvValue(tlvi.clone()));
    }

    // Parse prefix, applying the mask implied by the prefix length.
    let mut prefix_bytes = [0u8; 4];
    buf.copy_to_slice(&mut prefix_bytes[..plen_wire]);
    *tlv_rlen -= plen_wire as u16;
    let mask = if plen == 0 { 0 } else { u32::MAX << (32 - plen) };
    let addr = Ipv4Addr::from(u32::from(Ipv4Addr::from(prefix_bytes)) & mask);
    Ipv4Network::new(addr, plen)
        .map_err(|_| DecodeError::InvalidTlvValue(tlvi.clone()))
}

// Calculate the number of bytes required to encode a prefix.
fn prefix_wire_len(len: u8) -> usize {
    (len as usize + 7) / 8
}
