//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use tracing::{warn, warn_span};

use crate::packet::error::DecodeError;
use crate::peer::fsm;
use crate::southbound::LibError;

// LDP errors.
#[derive(Debug)]
pub enum Error {
    // Discovery
    UdpPduDecodeError(DecodeError),
    UnknownInterface(u32),
    // Session transport
    SessionUnknownPeer(Ipv4Addr),
    SessionInvalidConnRequest(Ipv4Addr),
    SessionAdditionalConn(Ipv4Addr),
    SessionFsmUnexpectedEvent(Ipv4Addr, fsm::State, fsm::Event),
    // Message engine
    PeerPduDecodeError(Ipv4Addr, DecodeError),
    HelloOnSession(Ipv4Addr),
    UnexpectedMapping(Ipv4Addr, Ipv4Network),
    UnsupportedStatusCode(Ipv4Addr, u32),
    // LIB integration
    UnresolvedNexthop(Ipv4Addr),
    LabelAllocation(LibError),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::UdpPduDecodeError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            Error::UnknownInterface(ifindex) => {
                warn!(?ifindex, "{}", self);
            }
            Error::SessionUnknownPeer(addr) => {
                warn!(address = %addr, "{}", self);
            }
            Error::SessionInvalidConnRequest(lsr_id)
            | Error::SessionAdditionalConn(lsr_id)
            | Error::HelloOnSession(lsr_id) => {
                warn_span!("peer", %lsr_id).in_scope(|| {
                    warn!("{}", self);
                });
            }
            Error::SessionFsmUnexpectedEvent(lsr_id, state, event) => {
                warn_span!("peer", %lsr_id).in_scope(|| {
                    warn_span!("fsm").in_scope(|| {
                        warn!(?state, ?event, "{}", self);
                    });
                });
            }
            Error::PeerPduDecodeError(lsr_id, error) => {
                warn_span!("peer", %lsr_id).in_scope(|| {
                    warn!(error = %with_source(error), "{}", self);
                });
            }
            Error::UnexpectedMapping(lsr_id, prefix) => {
                warn_span!("peer", %lsr_id).in_scope(|| {
                    warn!(%prefix, "{}", self);
                });
            }
            Error::UnsupportedStatusCode(lsr_id, status) => {
                warn_span!("peer", %lsr_id).in_scope(|| {
                    warn!(?status, "{}", self);
                });
            }
            Error::UnresolvedNexthop(addr) => {
                warn!(address = %addr, "{}", self);
            }
            Error::LabelAllocation(error) => {
                warn!(error = %error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UdpPduDecodeError(..) => {
                write!(f, "failed to decode PDU")
            }
            Error::UnknownInterface(..) => {
                write!(f, "hello received on unknown interface")
            }
            Error::SessionUnknownPeer(..) => {
                write!(f, "connection request from unknown peer")
            }
            Error::SessionInvalidConnRequest(..) => {
                write!(f, "invalid connection request (active role)")
            }
            Error::SessionAdditionalConn(..) => {
                write!(f, "rejecting additional transport connection")
            }
            Error::SessionFsmUnexpectedEvent(..) => {
                write!(f, "unexpected session event")
            }
            Error::PeerPduDecodeError(..) => {
                write!(f, "failed to decode PDU")
            }
            Error::HelloOnSession(..) => {
                write!(f, "hello message received on session transport")
            }
            Error::UnexpectedMapping(..) => {
                write!(f, "unexpected label mapping")
            }
            Error::UnsupportedStatusCode(..) => {
                write!(f, "unsupported notification status code")
            }
            Error::UnresolvedNexthop(..) => {
                write!(f, "no interface toward next-hop")
            }
            Error::LabelAllocation(..) => {
                write!(f, "failed to allocate label")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UdpPduDecodeError(error) => Some(error),
            Error::PeerPduDecodeError(_, error) => Some(error),
            Error::LabelAllocation(error) => Some(error),
            _ => None,
        }
    }
}

impl From<LibError> for Error {
    fn from(error: LibError) -> Error {
        Error::LabelAllocation(error)
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
