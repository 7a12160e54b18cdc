//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::message::Message;
use crate::packet::{BytesExt, BytesMutExt, DecodeCxt};

//
// An LDP PDU is a fixed ten-byte header followed by messages packed back to
// back:
//
//   version (2) | PDU length (2) | LSR-ID (4) | label space (2)
//
// The length field counts everything after itself, so a PDU occupies
// `pdu_len + 4` bytes on the wire. Both transports carry this same
// envelope; on the session byte stream the host frames incoming data with
// `get_pdu_size` before handing complete PDUs to `decode`.
//
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pdu {
    // PDU header.
    pub version: u16,
    pub lsr_id: Ipv4Addr,
    pub lspace_id: u16,

    // Messages.
    pub messages: VecDeque<Message>,
}

// Header fields and byte-accounting carried through a decode run.
//
// `pdu_rlen` starts at the length advertised by the header (minus the
// header's own tail) and every decoded message subtracts its size from it;
// whatever is left when no full message header fits must be zero.
#[derive(Debug)]
pub struct PduDecodeInfo {
    pub version: u16,
    pub lsr_id: Ipv4Addr,
    pub lspace_id: u16,
    pub pdu_raw: Bytes,
    pub pdu_len: u16,
    pub pdu_rlen: u16,
}

// ===== impl Pdu =====

impl Pdu {
    pub const VERSION: u16 = 1;
    pub const HDR_SIZE: u16 = 10;
    pub const HDR_MIN_LEN: u16 = 6;
    pub const HDR_DEAD_LEN: u16 = 4;
    pub const DFLT_MAX_LEN: u16 = 4096;

    pub fn new(lsr_id: Ipv4Addr, lspace_id: u16) -> Pdu {
        Pdu {
            version: Pdu::VERSION,
            lsr_id,
            lspace_id,
            messages: VecDeque::new(),
        }
    }

    // Encodes the PDU, spilling messages over into additional PDUs whenever
    // the configured maximum length would be exceeded.
    //
    // A lone message larger than the limit can't be split and goes out
    // oversized.
    pub fn encode(&self, max_pdu_len: u16) -> BytesMut {
        let mut buf = BytesMut::new();
        if self.messages.is_empty() {
            return buf;
        }

        let mut pdu_start = 0;
        self.put_hdr(&mut buf);

        for msg in &self.messages {
            let msg_start = buf.len();
            msg.encode(&mut buf);

            // This message pushed the current PDU over the limit: unless it
            // is the PDU's only message, seal the PDU before it and carry
            // the message over into a fresh one.
            if buf.len() - pdu_start > max_pdu_len as usize
                && msg_start != pdu_start + Pdu::HDR_SIZE as usize
            {
                let tail = buf.split_off(msg_start);
                Pdu::patch_len(&mut buf, pdu_start);
                pdu_start = buf.len();
                self.put_hdr(&mut buf);
                buf.extend_from_slice(&tail);
            }
        }
        Pdu::patch_len(&mut buf, pdu_start);

        buf
    }

    fn put_hdr(&self, buf: &mut BytesMut) {
        buf.put_u16(self.version);
        // Patched by `patch_len` once the PDU's messages are in place.
        buf.put_u16(0);
        buf.put_ipv4(&self.lsr_id);
        buf.put_u16(self.lspace_id);
    }

    // Writes the final length of the PDU starting at `pdu_start`.
    fn patch_len(buf: &mut BytesMut, pdu_start: usize) {
        let pdu_len = (buf.len() - pdu_start) as u16 - Pdu::HDR_DEAD_LEN;
        buf[pdu_start + 2..pdu_start + 4]
            .copy_from_slice(&pdu_len.to_be_bytes());
    }

    // Decodes one PDU and all the messages in it.
    //
    // `data` must hold exactly the bytes reported by a prior successful
    // `get_pdu_size` call; this function doesn't re-validate the framing.
    pub fn decode(data: &[u8], cxt: &DecodeCxt) -> DecodeResult<Self> {
        let mut buf = Bytes::copy_from_slice(data);
        let mut pdui = Pdu::parse_hdr(&mut buf)?;

        let mut messages = VecDeque::new();
        while pdui.pdu_rlen >= Message::HDR_SIZE {
            // Skipped unknown messages decode to None.
            if let Some(msg) = Message::decode(&mut buf, cxt, &mut pdui)? {
                messages.push_back(msg);
            }
        }
        // Fewer bytes left than a message header means the advertised
        // length and the message sizes disagree.
        if pdui.pdu_rlen != 0 {
            return Err(DecodeError::InvalidPduLength(pdui.pdu_len));
        }

        Ok(Pdu {
            version: pdui.version,
            lsr_id: pdui.lsr_id,
            lspace_id: pdui.lspace_id,
            messages,
        })
    }

    fn parse_hdr(buf: &mut Bytes) -> DecodeResult<PduDecodeInfo> {
        let raw = buf.clone();

        let version = buf.get_u16();
        if version != Pdu::VERSION {
            return Err(DecodeError::InvalidVersion(version));
        }

        let pdu_len = buf.get_u16();
        let lsr_id = buf.get_ipv4();
        let lspace_id = buf.get_u16();

        Ok(PduDecodeInfo {
            version,
            lsr_id,
            lspace_id,
            pdu_raw: raw.slice(..(pdu_len + Pdu::HDR_DEAD_LEN) as usize),
            pdu_len,
            pdu_rlen: pdu_len - Pdu::HDR_MIN_LEN,
        })
    }

    // Checks whether `data` starts with one complete PDU, returning its
    // total size on the wire.
    //
    // This is the stream-framing primitive: the host accumulates session
    // bytes until this succeeds, then feeds that many bytes to `decode`.
    pub fn get_pdu_size(data: &[u8], cxt: &DecodeCxt) -> DecodeResult<usize> {
        // Too short to hold the PDU header plus one message header.
        if data.len() < (Pdu::HDR_SIZE + Message::HDR_SIZE) as usize {
            return Err(DecodeError::IncompletePdu);
        }

        // The advertised length must leave room for at least one message
        // and may not exceed what was negotiated.
        let pdu_len = u16::from_be_bytes([data[2], data[3]]);
        if pdu_len < Pdu::HDR_MIN_LEN + Message::HDR_SIZE
            || pdu_len > cxt.pdu_max_len
        {
            return Err(DecodeError::IncompletePdu);
        }

        // More bytes announced than received so far.
        let pdu_size = pdu_len as usize + Pdu::HDR_DEAD_LEN as usize;
        if pdu_size > data.len() {
            return Err(DecodeError::IncompletePdu);
        }

        Ok(pdu_size)
    }
}
