//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use ipnetwork::Ipv4Network;

use crate::collections::PeerId;
use crate::debug::Debug;
use crate::error::Error;
use crate::mpls::Label;
use crate::network::SessionTransport;
use crate::packet::messages::label::{LabelMsg, TlvFec, TlvLabel};
use crate::packet::messages::notification::{NotifMsg, StatusCode, TlvStatus};
use crate::packet::pdu::Pdu;
use crate::packet::{LabelMessageType, Message};
use crate::tasks::TimerToken;

// LDP peer (adjacent LSR learned through discovery).
#[derive(Debug)]
pub struct Peer {
    pub id: PeerId,
    // Peer address (equal to the peer's router-id).
    pub addr: Ipv4Addr,
    // Link interface on which the peer's hellos were first seen.
    pub ifname: String,
    // Session establishment role.
    pub role: Role,
    // Session FSM state.
    pub state: fsm::State,
    // Hold time advertised by the peer.
    pub holdtime_adjacent: u16,
    // Hello hold timeout token.
    pub timeout_token: Option<TimerToken>,
    // Statistics.
    pub hello_rcvd: u64,
    pub msgs_rcvd: u64,
    pub msgs_sent: u64,
    pub discontinuity_time: DateTime<Utc>,
}

// Session establishment role.
//
// The peer with the numerically higher address opens the transport
// connection; the other side accepts it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Active,
    Passive,
}

// Session transport FSM.
pub mod fsm {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
    pub enum State {
        NonExistent,
        Connecting,
        Established,
        Closed,
    }

    #[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
    pub enum Event {
        ConnectRequest,
        ConnectionUp,
        ConnectionDown,
    }
}

// ===== impl Peer =====

impl Peer {
    pub(crate) fn new(
        id: PeerId,
        addr: Ipv4Addr,
        ifname: String,
        role: Role,
    ) -> Peer {
        Debug::PeerCreate(&addr, &ifname, &role).log();

        Peer {
            id,
            addr,
            ifname,
            role,
            state: fsm::State::NonExistent,
            holdtime_adjacent: 0,
            timeout_token: None,
            hello_rcvd: 0,
            msgs_rcvd: 0,
            msgs_sent: 0,
            discontinuity_time: Utc::now(),
        }
    }

    pub fn is_session_up(&self) -> bool {
        self.state == fsm::State::Established
    }

    pub(crate) fn fsm(&mut self, event: fsm::Event) -> Result<(), Error> {
        let new_state = match (self.state, event) {
            (fsm::State::NonExistent, fsm::Event::ConnectRequest) => {
                fsm::State::Connecting
            }
            (
                fsm::State::NonExistent | fsm::State::Connecting,
                fsm::Event::ConnectionUp,
            ) => fsm::State::Established,
            (
                fsm::State::Connecting | fsm::State::Established,
                fsm::Event::ConnectionDown,
            ) => fsm::State::Closed,
            _ => {
                return Err(Error::SessionFsmUnexpectedEvent(
                    self.addr, self.state, event,
                ));
            }
        };

        Debug::SessionFsmTransition(&self.addr, &event, &self.state, &new_state)
            .log();
        self.state = new_state;

        Ok(())
    }

    // Encode the message into a single-message PDU and hand it to the
    // session transport.
    pub(crate) fn send_message(
        &mut self,
        tcp: &mut dyn SessionTransport,
        router_id: Ipv4Addr,
        msg: Message,
    ) {
        Debug::MsgTx(&self.addr, &msg).log();

        self.msgs_sent += 1;
        self.discontinuity_time = Utc::now();

        let mut pdu = Pdu::new(router_id, 0);
        pdu.messages.push_back(msg);
        tcp.send_pdu(self.addr, pdu.encode(Pdu::DFLT_MAX_LEN));
    }

    pub(crate) fn send_label_mapping(
        &mut self,
        tcp: &mut dyn SessionTransport,
        router_id: Ipv4Addr,
        msg_id: u32,
        label: Label,
        prefix: Ipv4Network,
    ) {
        self.send_label_msg(
            tcp,
            router_id,
            msg_id,
            LabelMessageType::LabelMapping,
            Some(label),
            prefix,
        );
    }

    pub(crate) fn send_label_request(
        &mut self,
        tcp: &mut dyn SessionTransport,
        router_id: Ipv4Addr,
        msg_id: u32,
        prefix: Ipv4Network,
    ) {
        self.send_label_msg(
            tcp,
            router_id,
            msg_id,
            LabelMessageType::LabelRequest,
            None,
            prefix,
        );
    }

    pub(crate) fn send_label_withdraw(
        &mut self,
        tcp: &mut dyn SessionTransport,
        router_id: Ipv4Addr,
        msg_id: u32,
        label: Label,
        prefix: Ipv4Network,
    ) {
        self.send_label_msg(
            tcp,
            router_id,
            msg_id,
            LabelMessageType::LabelWithdraw,
            Some(label),
            prefix,
        );
    }

    pub(crate) fn send_label_release(
        &mut self,
        tcp: &mut dyn SessionTransport,
        router_id: Ipv4Addr,
        msg_id: u32,
        label: Label,
        prefix: Ipv4Network,
    ) {
        self.send_label_msg(
            tcp,
            router_id,
            msg_id,
            LabelMessageType::LabelRelease,
            Some(label),
            prefix,
        );
    }

    fn send_label_msg(
        &mut self,
        tcp: &mut dyn SessionTransport,
        router_id: Ipv4Addr,
        msg_id: u32,
        msg_type: LabelMessageType,
        label: Option<Label>,
        prefix: Ipv4Network,
    ) {
        let msg = LabelMsg {
            msg_id,
            msg_type,
            fec: TlvFec(vec![prefix]),
            label: label.map(TlvLabel),
        };
        self.send_message(tcp, router_id, msg.into());
    }

    pub(crate) fn send_notification(
        &mut self,
        tcp: &mut dyn SessionTransport,
        router_id: Ipv4Addr,
        msg_id: u32,
        status: StatusCode,
        prefix: Ipv4Network,
    ) {
        let msg = NotifMsg {
            msg_id,
            status: TlvStatus {
                status_code: status.encode(status.is_fatal_error()),
                msg_id: 0,
                msg_type: 0,
            },
            fec: Some(TlvFec(vec![prefix])),
        };
        self.send_message(tcp, router_id, msg.into());
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        Debug::PeerDelete(&self.addr).log();
    }
}

// ===== impl Role =====

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Active => write!(f, "active"),
            Role::Passive => write!(f, "passive"),
        }
    }
}
