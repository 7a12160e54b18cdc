//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::packet::message::{MessageDecodeInfo, MessageType};
use crate::packet::tlv::{TlvDecodeInfo, TlvType};

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// LDP decode errors.
#[derive(Debug)]
pub enum DecodeError {
    // PDU header
    IncompletePdu,
    InvalidPduLength(u16),
    InvalidVersion(u16),
    // Message (general errors)
    InvalidMessageLength(u16),
    UnknownMessage(MessageDecodeInfo, u16),
    UnsupportedMessage(MessageDecodeInfo, MessageType),
    MissingMsgParams(MessageDecodeInfo, TlvType),
    // TLV (general errors)
    InvalidTlvLength(u16),
    UnknownTlv(MessageDecodeInfo, u16, Bytes),
    InvalidTlvValue(TlvDecodeInfo),
    // Message-specific errors
    UnsupportedAf(TlvDecodeInfo, u16),
    UnknownFec(TlvDecodeInfo, u8),
    McastTHello(TlvDecodeInfo, Ipv4Addr),
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::IncompletePdu => {
                write!(f, "Incomplete PDU")
            }
            DecodeError::InvalidPduLength(len) => {
                write!(f, "Invalid PDU length: {len}")
            }
            DecodeError::InvalidVersion(version) => {
                write!(f, "Invalid LDP version: {version}")
            }
            DecodeError::InvalidMessageLength(len) => {
                write!(f, "Invalid message length: {len}")
            }
            DecodeError::UnknownMessage(_msgi, msg_type) => {
                write!(f, "Unknown message: {msg_type}")
            }
            DecodeError::UnsupportedMessage(_msgi, msg_type) => {
                write!(f, "Unsupported message: {msg_type}")
            }
            DecodeError::MissingMsgParams(_msgi, tlv_type) => {
                write!(f, "Missing message parameters: {tlv_type}")
            }
            DecodeError::InvalidTlvLength(len) => {
                write!(f, "Invalid TLV length: {len}")
            }
            DecodeError::UnknownTlv(_msgi, tlv_type, _raw_tlv) => {
                write!(f, "Unknown TLV: {tlv_type}")
            }
            DecodeError::InvalidTlvValue(_tlvi) => {
                write!(f, "Invalid TLV value")
            }
            DecodeError::UnsupportedAf(_tlvi, af) => {
                write!(f, "Unsupported address family: {af}")
            }
            DecodeError::UnknownFec(_tlvi, fec) => {
                write!(f, "Unknown FEC type: {fec}")
            }
            DecodeError::McastTHello(_tlvi, addr) => {
                write!(f, "Multicast targeted hello from {addr}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
