//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use tracing::{debug, debug_span};

use crate::fec::Fec;
use crate::mpls::{Label, LabelOp};
use crate::packet::Message;
use crate::packet::messages::HelloMsg;
use crate::peer::{Role, fsm};

// LDP debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    InstanceCreate,
    InstanceStart,
    PeerCreate(&'a Ipv4Addr, &'a str, &'a Role),
    PeerDelete(&'a Ipv4Addr),
    PeerTimeout(&'a Ipv4Addr),
    HelloRx(&'a str, &'a Ipv4Addr, &'a HelloMsg),
    HelloTx(&'a Ipv4Addr, &'a HelloMsg),
    SessionConnect(&'a Ipv4Addr),
    SessionAccept(&'a Ipv4Addr),
    SessionUp(&'a Ipv4Addr),
    SessionClose(&'a Ipv4Addr),
    SessionFsmTransition(
        &'a Ipv4Addr,
        &'a fsm::Event,
        &'a fsm::State,
        &'a fsm::State,
    ),
    MsgRx(&'a Ipv4Addr, &'a Message),
    MsgTx(&'a Ipv4Addr, &'a Message),
    FecCreate(&'a Fec),
    FecDelete(&'a Fec),
    FecNexthopUpdate(&'a Fec, &'a Ipv4Addr),
    DsBindingCreate(&'a Ipv4Network, &'a Ipv4Addr, &'a Label),
    DsBindingDelete(&'a Ipv4Network, &'a Ipv4Addr, &'a Label),
    UsBindingCreate(&'a Ipv4Network, &'a Ipv4Addr, &'a Label),
    UsBindingDelete(&'a Ipv4Network, &'a Ipv4Addr, &'a Label),
    BindingPurge(&'a Ipv4Addr),
    PendingRequestCreate(&'a Ipv4Network, &'a Ipv4Addr),
    PendingRequestDelete(&'a Ipv4Network, &'a Ipv4Addr),
    LibInstall(&'a Label, &'a str, &'a LabelOp, &'a str),
    LibUninstall(&'a Label),
    NoRouteRetry(&'a Ipv4Addr, &'a Ipv4Network),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate | Debug::InstanceStart => {
                debug!("{}", self);
            }
            Debug::PeerCreate(lsr_id, ifname, role) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug!(%ifname, %role, "{}", self);
                });
            }
            Debug::PeerDelete(lsr_id) | Debug::PeerTimeout(lsr_id) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::HelloRx(ifname, lsr_id, msg) => {
                debug_span!("discovery").in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(%ifname, %lsr_id, %data, "{}", self);
                    })
                });
            }
            Debug::HelloTx(addr, msg) => {
                debug_span!("discovery").in_scope(|| {
                    debug_span!("output").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(address = %addr, %data, "{}", self);
                    })
                });
            }
            Debug::SessionConnect(lsr_id)
            | Debug::SessionAccept(lsr_id)
            | Debug::SessionUp(lsr_id)
            | Debug::SessionClose(lsr_id) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::SessionFsmTransition(lsr_id, event, old_state, new_state) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?event, ?old_state, ?new_state, "{}", self);
                    })
                });
            }
            Debug::MsgRx(lsr_id, msg) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(r#type = %msg.msg_type(), %data, "{}", self);
                    })
                });
            }
            Debug::MsgTx(lsr_id, msg) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug_span!("output").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(r#type = %msg.msg_type(), %data, "{}", self);
                    })
                });
            }
            Debug::FecCreate(fec) | Debug::FecDelete(fec) => {
                debug_span!("fec", prefix = %fec.prefix).in_scope(|| {
                    debug!(nexthop = %fec.nexthop, "{}", self);
                });
            }
            Debug::FecNexthopUpdate(fec, nexthop) => {
                debug_span!("fec", prefix = %fec.prefix).in_scope(|| {
                    debug!(old_nexthop = %fec.nexthop, new_nexthop = %nexthop,
                        "{}", self);
                });
            }
            Debug::DsBindingCreate(prefix, lsr_id, label)
            | Debug::DsBindingDelete(prefix, lsr_id, label)
            | Debug::UsBindingCreate(prefix, lsr_id, label)
            | Debug::UsBindingDelete(prefix, lsr_id, label) => {
                debug_span!("fec", %prefix).in_scope(|| {
                    debug!(%lsr_id, %label, "{}", self);
                });
            }
            Debug::BindingPurge(lsr_id) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::PendingRequestCreate(prefix, lsr_id)
            | Debug::PendingRequestDelete(prefix, lsr_id) => {
                debug_span!("fec", %prefix).in_scope(|| {
                    debug!(%lsr_id, "{}", self);
                });
            }
            Debug::LibInstall(label, ingress_ifname, label_op, egress_ifname) => {
                debug_span!("lib").in_scope(|| {
                    debug!(
                        ingress_label = %label,
                        %ingress_ifname,
                        %label_op,
                        %egress_ifname,
                        "{}", self
                    );
                });
            }
            Debug::LibUninstall(label) => {
                debug_span!("lib").in_scope(|| {
                    debug!(ingress_label = %label, "{}", self);
                });
            }
            Debug::NoRouteRetry(lsr_id, prefix) => {
                debug_span!("peer", %lsr_id).in_scope(|| {
                    debug!(%prefix, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate => {
                write!(f, "instance created")
            }
            Debug::InstanceStart => {
                write!(f, "starting instance")
            }
            Debug::PeerCreate(..) => {
                write!(f, "peer created")
            }
            Debug::PeerDelete(..) => {
                write!(f, "peer deleted")
            }
            Debug::PeerTimeout(..) => {
                write!(f, "peer hello hold time expired")
            }
            Debug::HelloRx(..) | Debug::HelloTx(..) => {
                write!(f, "hello message")
            }
            Debug::SessionConnect(..) => {
                write!(f, "connecting to peer")
            }
            Debug::SessionAccept(..) => {
                write!(f, "accepted connection from peer")
            }
            Debug::SessionUp(..) => {
                write!(f, "session established")
            }
            Debug::SessionClose(..) => {
                write!(f, "session closed")
            }
            Debug::SessionFsmTransition(..) => {
                write!(f, "state transition")
            }
            Debug::MsgRx(..) | Debug::MsgTx(..) => {
                write!(f, "message")
            }
            Debug::FecCreate(..) => {
                write!(f, "FEC created")
            }
            Debug::FecDelete(..) => {
                write!(f, "FEC deleted")
            }
            Debug::FecNexthopUpdate(..) => {
                write!(f, "FEC next-hop updated")
            }
            Debug::DsBindingCreate(..) => {
                write!(f, "downstream label binding created")
            }
            Debug::DsBindingDelete(..) => {
                write!(f, "downstream label binding deleted")
            }
            Debug::UsBindingCreate(..) => {
                write!(f, "upstream label binding created")
            }
            Debug::UsBindingDelete(..) => {
                write!(f, "upstream label binding deleted")
            }
            Debug::BindingPurge(..) => {
                write!(f, "purging label bindings for lost peer")
            }
            Debug::PendingRequestCreate(..) => {
                write!(f, "pending label request recorded")
            }
            Debug::PendingRequestDelete(..) => {
                write!(f, "pending label request removed")
            }
            Debug::LibInstall(..) => {
                write!(f, "cross-connect installed")
            }
            Debug::LibUninstall(..) => {
                write!(f, "cross-connect removed")
            }
            Debug::NoRouteRetry(..) => {
                write!(f, "scheduling label request retry")
            }
        }
    }
}
