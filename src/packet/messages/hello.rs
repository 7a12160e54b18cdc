//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::packet::DecodeCxt;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::message::{
    Message, MessageDecodeInfo, MessageKind, MessageType,
};
use crate::packet::tlv::{self, TlvDecodeInfo, TlvKind, TlvType};

//
// Hello message (type 0x0100).
//
// Its single mandatory parameter is the Common Hello Parameters TLV, which
// carries the advertised hold time and the flag word below. The optional
// hello TLVs of RFC 5036/7552 (transport address, configuration sequence
// number, dual-stack) belong to features this speaker doesn't negotiate and
// fall through to the generic unknown-TLV handling.
//
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct HelloMsg {
    pub msg_id: u32,
    pub params: TlvCommonHelloParams,
}

// Common Hello Parameters TLV (type 0x0400): hold time plus flags.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TlvCommonHelloParams {
    pub holdtime: u16,
    pub flags: HelloFlags,
}

// Flag word of the Common Hello Parameters TLV. T marks a targeted hello,
// R requests targeted hellos back, and the GTSM bit is RFC 7552's TTL
// security negotiation.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct HelloFlags: u16 {
        const TARGETED = 0x8000;
        const REQ_TARGETED = 0x4000;
        const GTSM = 0x2000;
    }
}

// ===== impl HelloMsg =====

impl MessageKind for HelloMsg {
    const U_BIT: bool = false;

    fn msg_id(&self) -> u32 {
        self.msg_id
    }

    fn msg_type(&self) -> MessageType {
        MessageType::Hello
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.params.encode(buf);
    }

    fn decode_body(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        msgi: &mut MessageDecodeInfo,
    ) -> DecodeResult<Message> {
        // The Common Hello Parameters TLV always comes first.
        let tlvi = tlv::decode_tlv_hdr(buf, msgi)?;
        if tlvi.tlv_type != TlvType::CommonHelloParams as u16 {
            return Err(DecodeError::MissingMsgParams(
                msgi.clone(),
                TlvType::CommonHelloParams,
            ));
        }

        let mut msg = HelloMsg {
            msg_id: msgi.msg_id,
            params: TlvCommonHelloParams::decode_value(buf, cxt, &tlvi)?,
        };
        msg.decode_opt_tlvs(buf, cxt, msgi)?;

        Ok(msg.into())
    }
}

// ===== impl TlvCommonHelloParams =====

impl TlvKind for TlvCommonHelloParams {
    const TLV_TYPE: TlvType = TlvType::CommonHelloParams;
    const U_BIT: bool = false;
    const F_BIT: bool = false;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u16(self.holdtime);
        buf.put_u16(self.flags.bits());
    }

    fn decode_value(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        tlvi: &TlvDecodeInfo,
    ) -> DecodeResult<Self> {
        if tlvi.tlv_len != 4 {
            return Err(DecodeError::InvalidTlvLength(tlvi.tlv_len));
        }

        let holdtime = buf.get_u16();
        // Reserved flag bits are ignored rather than rejected.
        let flags = HelloFlags::from_bits_truncate(buf.get_u16());

        // A targeted hello arriving on the multicast path is bogus.
        if flags.contains(HelloFlags::TARGETED)
            && cxt.pkt_info.multicast == Some(true)
        {
            return Err(DecodeError::McastTHello(
                tlvi.clone(),
                cxt.pkt_info.src_addr,
            ));
        }

        Ok(Self { holdtime, flags })
    }
}
