//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::Utc;
use ipnetwork::Ipv4Network;

use crate::debug::Debug;
use crate::error::Error;
use crate::fec;
use crate::instance::{Instance, SystemView};
use crate::mpls::{Label, LabelOp};
use crate::network::ALL_RTRS_MCAST_ADDR;
use crate::packet::messages::hello::{HelloFlags, HelloMsg};
use crate::packet::messages::label::LabelMsg;
use crate::packet::messages::notification::{NotifMsg, StatusCode};
use crate::packet::{DecodeCxt, LabelMessageType, Message, PacketInfo, Pdu};
use crate::peer::{Peer, Role, fsm};
use crate::southbound::{self, USER_TRAFFIC_COLOR};
use crate::tasks::Timer;
use crate::discovery;

// ===== hello datagram receipt =====

pub fn process_hello_pdu(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    ifindex: u32,
    data: &[u8],
) -> Result<(), Error> {
    let cxt = DecodeCxt {
        pkt_info: PacketInfo {
            src_addr,
            multicast: Some(true),
        },
        pdu_max_len: Pdu::DFLT_MAX_LEN,
    };

    // Malformed discovery traffic is dropped, not fatal.
    let mut pdu = match Pdu::get_pdu_size(data, &cxt)
        .and_then(|_| Pdu::decode(data, &cxt))
    {
        Ok(pdu) => pdu,
        Err(error) => {
            Error::UdpPduDecodeError(error).log();
            return Ok(());
        }
    };

    // Process the first message only (if any), ignoring the others.
    if let Some(Message::Hello(hello)) = pdu.messages.pop_front() {
        // Targeted discovery isn't supported.
        if hello.params.flags.contains(HelloFlags::TARGETED) {
            return Ok(());
        }

        process_hello(instance, sys, pdu.lsr_id, ifindex, hello)?;
    }

    Ok(())
}

fn process_hello(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    lsr_id: Ipv4Addr,
    ifindex: u32,
    hello: HelloMsg,
) -> Result<(), Error> {
    // We're in the all-routers multicast group ourselves.
    if lsr_id.is_unspecified() || lsr_id == instance.state.router_id {
        return Ok(());
    }

    let router_id = instance.state.router_id;

    // Revive the TED link if it was marked down.
    if !sys.ted.link_is_up(router_id, lsr_id) {
        sys.ted.set_link_state(router_id, lsr_id, true);
        sys.ted.rebuild_routing_table();
        sys.ted.announce_link_change(router_id, lsr_id);
    }

    let holdtime = instance.config.hello_holdtime;

    // Known peer: refresh its hold timeout.
    if let Some((_, peer)) = instance.state.peers.get_mut_by_addr(&lsr_id) {
        Debug::HelloRx(peer.ifname.as_str(), &lsr_id, &hello).log();

        peer.hello_rcvd += 1;
        peer.holdtime_adjacent = hello.params.holdtime;
        peer.discontinuity_time = Utc::now();
        discovery::reset_hello_timeout(peer, holdtime, sys.timers);
        return Ok(());
    }

    // New peer.
    let iface = sys
        .interfaces
        .get_by_ifindex(ifindex)
        .ok_or(Error::UnknownInterface(ifindex))?;
    Debug::HelloRx(iface.name.as_str(), &lsr_id, &hello).log();

    let role = if lsr_id > router_id {
        Role::Active
    } else {
        Role::Passive
    };
    let id = instance.state.peers.next_id();
    let mut peer = Peer::new(id, lsr_id, iface.name, role);
    peer.hello_rcvd = 1;
    peer.holdtime_adjacent = hello.params.holdtime;
    discovery::reset_hello_timeout(&mut peer, holdtime, sys.timers);
    instance.state.peers.insert(peer);

    // Introduce ourselves with a hello, then connect when playing the
    // active role of session establishment.
    discovery::send_hello(instance, sys, lsr_id);
    if role == Role::Active {
        let (_, peer) =
            instance.state.peers.get_mut_by_addr(&lsr_id).unwrap();
        peer.fsm(fsm::Event::ConnectRequest)?;
        Debug::SessionConnect(&lsr_id).log();
        sys.tcp.connect(router_id, lsr_id);
    }

    Ok(())
}

// ===== timer dispatch =====

pub fn process_timer(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    timer: Timer,
) -> Result<(), Error> {
    match timer {
        Timer::SendHello => {
            discovery::send_hello(instance, sys, ALL_RTRS_MCAST_ADDR);

            // Schedule next hello.
            let interval =
                Duration::from_secs(instance.config.hello_interval.into());
            sys.timers.schedule(interval, Timer::SendHello);
            Ok(())
        }
        Timer::HelloTimeout(addr) => process_hello_timeout(instance, sys, addr),
        Timer::RequestRetry { lsr_id, prefix } => {
            process_request_retry(instance, sys, lsr_id, prefix)
        }
    }
}

// ===== hello hold timeout =====

fn process_hello_timeout(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    addr: Ipv4Addr,
) -> Result<(), Error> {
    // Ignore stale timers.
    let Some((peer_idx, peer)) = instance.state.peers.get_mut_by_addr(&addr)
    else {
        return Ok(());
    };

    Debug::PeerTimeout(&addr).log();

    peer.timeout_token = None;
    let session_open = matches!(
        peer.state,
        fsm::State::Connecting | fsm::State::Established
    );
    instance.state.peers.delete(peer_idx);
    if session_open {
        sys.tcp.close(addr);
    }

    // Stale bindings involving the lost peer are dropped without any
    // WITHDRAW/RELEASE exchange; the session is gone.
    Debug::BindingPurge(&addr).log();
    instance.state.downstream.purge_by_peer(addr);
    for (_, label) in instance.state.upstream.purge_by_peer(addr) {
        sys.lib.remove(label);
        Debug::LibUninstall(&label).log();
    }
    instance.state.pending.purge_by_peer(addr);

    fec::reconcile_nexthop(instance, sys, addr)?;

    // Propagate the loss to the TED and request a routing recomputation.
    let router_id = instance.state.router_id;
    sys.ted.set_link_state(router_id, addr, false);
    sys.ted.announce_link_change(router_id, addr);
    sys.ted.rebuild_routing_table();

    Ok(())
}

// ===== NO_ROUTE retry timer =====

fn process_request_retry(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    lsr_id: Ipv4Addr,
    prefix: Ipv4Network,
) -> Result<(), Error> {
    // Reissue the request only while the FEC is still routed through the
    // notifying peer.
    let Some(fec) = instance.state.fec_by_prefix(&prefix).copied() else {
        return Ok(());
    };
    if fec.nexthop != lsr_id {
        return Ok(());
    }

    let msg_id = instance.state.next_msg_id();
    let router_id = instance.state.router_id;
    if let Some((_, peer)) = instance.state.peers.get_mut_by_addr(&lsr_id) {
        if peer.is_session_up() {
            peer.send_label_request(sys.tcp, router_id, msg_id, fec.prefix);
        }
    }

    Ok(())
}

// ===== session connection request =====

pub fn process_session_accept(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
) -> Result<(), Error> {
    // Lookup peer.
    let Some((_, peer)) = instance.state.peers.get_mut_by_addr(&src_addr)
    else {
        Error::SessionUnknownPeer(src_addr).log();
        sys.tcp.close(src_addr);
        return Ok(());
    };

    // Sanity checks.
    if peer.role == Role::Active {
        Error::SessionInvalidConnRequest(src_addr).log();
        sys.tcp.close(src_addr);
        return Ok(());
    }
    if peer.state != fsm::State::NonExistent {
        Error::SessionAdditionalConn(src_addr).log();
        sys.tcp.close(src_addr);
        return Ok(());
    }

    Debug::SessionAccept(&src_addr).log();
    peer.fsm(fsm::Event::ConnectionUp)?;
    Debug::SessionUp(&src_addr).log();

    // Request mappings for the FECs whose downstream is now reachable.
    fec::reconcile_nexthop(instance, sys, src_addr)
}

// ===== session connection established =====

pub fn process_session_connect(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    peer_addr: Ipv4Addr,
) -> Result<(), Error> {
    // Lookup peer.
    let Some((_, peer)) = instance.state.peers.get_mut_by_addr(&peer_addr)
    else {
        Error::SessionUnknownPeer(peer_addr).log();
        return Ok(());
    };

    peer.fsm(fsm::Event::ConnectionUp)?;
    Debug::SessionUp(&peer_addr).log();

    // Request mappings for the FECs whose downstream is now reachable.
    fec::reconcile_nexthop(instance, sys, peer_addr)
}

// ===== session close =====

// Session loss is fatal for the session only: the peer entry is left to
// expire through the hello hold timeout, which purges its bindings.
pub fn process_session_closed(
    instance: &mut Instance,
    _sys: &mut SystemView<'_>,
    peer_addr: Ipv4Addr,
) -> Result<(), Error> {
    let Some((_, peer)) = instance.state.peers.get_mut_by_addr(&peer_addr)
    else {
        return Ok(());
    };

    Debug::SessionClose(&peer_addr).log();
    peer.fsm(fsm::Event::ConnectionDown)
}

// ===== session PDU receipt =====

pub fn process_session_pdu(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    data: &[u8],
) -> Result<(), Error> {
    if instance.state.peers.get_by_addr(&src_addr).is_none() {
        Error::SessionUnknownPeer(src_addr).log();
        return Ok(());
    }

    let cxt = DecodeCxt {
        pkt_info: PacketInfo {
            src_addr,
            multicast: None,
        },
        pdu_max_len: Pdu::DFLT_MAX_LEN,
    };
    let pdu = Pdu::get_pdu_size(data, &cxt)
        .and_then(|_| Pdu::decode(data, &cxt))
        .map_err(|error| Error::PeerPduDecodeError(src_addr, error))?;

    for msg in pdu.messages {
        process_peer_msg(instance, sys, src_addr, msg)?;
    }

    Ok(())
}

fn process_peer_msg(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    msg: Message,
) -> Result<(), Error> {
    // Update statistics.
    if let Some((_, peer)) = instance.state.peers.get_mut_by_addr(&src_addr) {
        Debug::MsgRx(&src_addr, &msg).log();
        peer.msgs_rcvd += 1;
        peer.discontinuity_time = Utc::now();
    }

    match msg {
        // Hellos belong on the datagram transport.
        Message::Hello(_) => Err(Error::HelloOnSession(src_addr)),
        Message::Label(msg) => process_label_msg(instance, sys, src_addr, msg),
        Message::Notification(msg) => {
            process_notification(instance, sys, src_addr, msg)
        }
    }
}

fn process_label_msg(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    msg: LabelMsg,
) -> Result<(), Error> {
    // Process each FEC element separately.
    for prefix in msg.fec.0.iter().copied() {
        match msg.msg_type {
            LabelMessageType::LabelMapping => {
                let label = msg.get_label().unwrap();
                process_label_mapping(instance, sys, src_addr, label, prefix)?;
            }
            LabelMessageType::LabelRequest => {
                process_label_request(instance, sys, src_addr, prefix)?;
            }
            LabelMessageType::LabelWithdraw => {
                process_label_withdraw(
                    instance,
                    sys,
                    src_addr,
                    msg.get_label(),
                    prefix,
                )?;
            }
            LabelMessageType::LabelRelease => {
                process_label_release(
                    instance,
                    sys,
                    src_addr,
                    msg.get_label(),
                    prefix,
                )?;
            }
        }
    }

    Ok(())
}

// ===== LABEL REQUEST =====

fn process_label_request(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    prefix: Ipv4Network,
) -> Result<(), Error> {
    // Unknown FEC: report the lack of a route back to the upstream.
    let Some(fec) = instance.state.fec_by_prefix(&prefix).copied() else {
        let msg_id = instance.state.next_msg_id();
        let router_id = instance.state.router_id;
        if let Some((_, peer)) =
            instance.state.peers.get_mut_by_addr(&src_addr)
        {
            peer.send_notification(
                sys.tcp,
                router_id,
                msg_id,
                StatusCode::NoRoute,
                prefix,
            );
        }
        return Ok(());
    };

    // A well-behaved peer doesn't re-request a mapping it already holds.
    debug_assert!(instance.state.upstream.get(fec.id, src_addr).is_none());

    let ds_label = instance.state.downstream.get(fec.id, fec.nexthop);
    let egress = instance
        .state
        .peers
        .get_by_addr(&fec.nexthop)
        .is_none_or(|(_, peer)| !peer.is_session_up());

    // Can't be egress and have a downstream mapping at the same time.
    debug_assert!(!(egress && ds_label.is_some()));

    if egress || ds_label.is_some() {
        // Either we pop as the egress LSR or we swap to the downstream
        // label; both allow answering with a mapping right away.
        let ingress_ifname =
            southbound::resolve_ifname(sys.rib, sys.interfaces, src_addr)?;
        let egress_ifname =
            southbound::resolve_ifname(sys.rib, sys.interfaces, fec.nexthop)?;
        let label_op = match ds_label {
            Some(ds_label) => LabelOp::swap(ds_label),
            None => LabelOp::pop(),
        };
        let label = sys.lib.install(
            None,
            &ingress_ifname,
            label_op,
            &egress_ifname,
            USER_TRAFFIC_COLOR,
        )?;
        Debug::LibInstall(&label, &ingress_ifname, &label_op, &egress_ifname)
            .log();
        instance.state.upstream.insert(fec.id, src_addr, label);
        Debug::UsBindingCreate(&fec.prefix, &src_addr, &label).log();

        let msg_id = instance.state.next_msg_id();
        let router_id = instance.state.router_id;
        let (_, peer) =
            instance.state.peers.get_mut_by_addr(&src_addr).unwrap();
        peer.send_label_mapping(sys.tcp, router_id, msg_id, label, fec.prefix);
    } else {
        // No mapping from downstream yet: park the request.
        instance.state.pending.insert(fec.id, src_addr);
        Debug::PendingRequestCreate(&fec.prefix, &src_addr).log();
    }

    Ok(())
}

// ===== LABEL MAPPING =====

fn process_label_mapping(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    label: Label,
    prefix: Ipv4Network,
) -> Result<(), Error> {
    // The mapping must answer a request for a known FEC, exactly once.
    let Some(fec) = instance.state.fec_by_prefix(&prefix).copied() else {
        return Err(Error::UnexpectedMapping(src_addr, prefix));
    };
    if instance.state.downstream.get(fec.id, src_addr).is_some() {
        return Err(Error::UnexpectedMapping(src_addr, prefix));
    }

    instance.state.downstream.insert(fec.id, src_addr, label);
    Debug::DsBindingCreate(&fec.prefix, &src_addr, &label).log();

    // Answer the upstream requests parked on this FEC.
    for peer_addr in instance.state.pending.purge_by_fec(fec.id) {
        Debug::PendingRequestDelete(&fec.prefix, &peer_addr).log();

        let ingress_ifname =
            southbound::resolve_ifname(sys.rib, sys.interfaces, peer_addr)?;
        let egress_ifname =
            southbound::resolve_ifname(sys.rib, sys.interfaces, src_addr)?;
        let label_op = LabelOp::swap(label);
        let new_label = sys.lib.install(
            None,
            &ingress_ifname,
            label_op,
            &egress_ifname,
            USER_TRAFFIC_COLOR,
        )?;
        Debug::LibInstall(
            &new_label,
            &ingress_ifname,
            &label_op,
            &egress_ifname,
        )
        .log();
        instance.state.upstream.insert(fec.id, peer_addr, new_label);
        Debug::UsBindingCreate(&fec.prefix, &peer_addr, &new_label).log();

        let msg_id = instance.state.next_msg_id();
        let router_id = instance.state.router_id;
        if let Some((_, peer)) =
            instance.state.peers.get_mut_by_addr(&peer_addr)
        {
            if peer.is_session_up() {
                peer.send_label_mapping(
                    sys.tcp, router_id, msg_id, new_label, fec.prefix,
                );
            }
        }
    }

    Ok(())
}

// ===== LABEL WITHDRAW =====

fn process_label_withdraw(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    label: Option<Label>,
    prefix: Ipv4Network,
) -> Result<(), Error> {
    // Withdraws for FECs or bindings we no longer know are stale; ignore.
    let Some(fec) = instance.state.fec_by_prefix(&prefix).copied() else {
        return Ok(());
    };
    let Some(ds_label) = instance.state.downstream.get(fec.id, src_addr)
    else {
        return Ok(());
    };
    if label.is_some() && label != Some(ds_label) {
        return Ok(());
    }

    instance.state.downstream.remove(fec.id, src_addr);
    Debug::DsBindingDelete(&fec.prefix, &src_addr, &ds_label).log();

    // Acknowledge with a release.
    let msg_id = instance.state.next_msg_id();
    let router_id = instance.state.router_id;
    if let Some((_, peer)) = instance.state.peers.get_mut_by_addr(&src_addr) {
        peer.send_label_release(
            sys.tcp, router_id, msg_id, ds_label, fec.prefix,
        );
    }

    // Typically withdraws our upstream mappings and reissues a request.
    fec::reconcile(instance, sys, fec)
}

// ===== LABEL RELEASE =====

fn process_label_release(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    label: Option<Label>,
    prefix: Ipv4Network,
) -> Result<(), Error> {
    // A release for an unknown binding is a legitimate race with a withdraw
    // we sent earlier; ignore.
    let Some(fec) = instance.state.fec_by_prefix(&prefix).copied() else {
        return Ok(());
    };
    let Some(us_label) = instance.state.upstream.get(fec.id, src_addr) else {
        return Ok(());
    };
    if label.is_some() && label != Some(us_label) {
        return Ok(());
    }

    sys.lib.remove(us_label);
    Debug::LibUninstall(&us_label).log();
    instance.state.upstream.remove(fec.id, src_addr);
    Debug::UsBindingDelete(&fec.prefix, &src_addr, &us_label).log();

    Ok(())
}

// ===== NOTIFICATION =====

fn process_notification(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    src_addr: Ipv4Addr,
    msg: NotifMsg,
) -> Result<(), Error> {
    // Only NO_ROUTE is handled by this core.
    if msg.status_code() != Some(StatusCode::NoRoute) {
        return Err(Error::UnsupportedStatusCode(
            src_addr,
            msg.status.status_code,
        ));
    }

    let Some(fec_tlv) = &msg.fec else {
        return Ok(());
    };

    for prefix in &fec_tlv.0 {
        // Retry later if we're still interested in the mapping.
        if let Some(fec) = instance.state.fec_by_prefix(prefix) {
            if fec.nexthop == src_addr {
                Debug::NoRouteRetry(&src_addr, prefix).log();
                sys.timers.schedule(
                    Duration::from_secs(1),
                    Timer::RequestRetry {
                        lsr_id: src_addr,
                        prefix: *prefix,
                    },
                );
            }
        }
    }

    Ok(())
}

// ===== routing table change =====

pub fn process_routing_table_change(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
) -> Result<(), Error> {
    fec::rebuild(instance, sys)
}
