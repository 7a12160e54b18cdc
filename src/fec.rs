//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Instance, SystemView};
use crate::mpls::{Label, LabelOp};
use crate::southbound::{self, RouteType, USER_TRAFFIC_COLOR};

pub type FecId = u32;

// LDP Forwarding Equivalence Class: a destination prefix plus its current
// next-hop as derived from the routing table.
//
// Identifiers are assigned monotonically starting at 1 and never reused
// within a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fec {
    pub id: FecId,
    pub prefix: Ipv4Network,
    pub nexthop: Ipv4Addr,
}

// ===== impl Fec =====

impl Fec {
    pub(crate) fn new(
        id: FecId,
        prefix: Ipv4Network,
        nexthop: Ipv4Addr,
    ) -> Fec {
        let fec = Fec { id, prefix, nexthop };

        Debug::FecCreate(&fec).log();

        fec
    }
}

// ===== global functions =====

// Recomputes the FEC list from the routing table and the local interface
// addresses.
//
// Carried-over entries keep their identifiers; entries whose next-hop
// changed and brand new entries are reconciled; entries that no longer
// correspond to a route are deprecated, releasing their downstream bindings
// and withdrawing their upstream ones.
pub(crate) fn rebuild(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
) -> Result<(), Error> {
    let mut old_list = std::mem::take(&mut instance.state.fecs);
    let mut new_list: Vec<Fec> = Vec::with_capacity(old_list.len());
    let mut changed: Vec<Fec> = vec![];

    for route in sys.rib.entries() {
        // Multicast destinations are never labeled.
        if route.prefix.ip().is_multicast() {
            continue;
        }

        // Find out the current next hop according to the routing table.
        let nexthop = match route.route_type {
            RouteType::Direct => route.prefix.ip(),
            RouteType::Remote => route.gateway,
        };
        debug_assert!(!nexthop.is_unspecified());

        // At most one FEC per (address, prefix length).
        if new_list.iter().any(|fec| fec.prefix == route.prefix) {
            continue;
        }

        match old_list.iter().position(|fec| fec.prefix == route.prefix) {
            None => {
                // FEC didn't exist, it was just created.
                let id = instance.state.next_fec_id();
                let fec = Fec::new(id, route.prefix, nexthop);
                changed.push(fec);
                new_list.push(fec);
            }
            Some(pos) => {
                let mut fec = old_list.remove(pos);
                if fec.nexthop != nexthop {
                    // Next hop for this FEC changed.
                    Debug::FecNexthopUpdate(&fec, &nexthop).log();
                    fec.nexthop = nexthop;
                    changed.push(fec);
                }
                new_list.push(fec);
            }
        }
    }

    // Host FECs for the router's own interface addresses. These are egress
    // by definition and never need reconciling.
    for iface in sys.interfaces.entries() {
        if iface.ifindex.is_none() {
            continue;
        }
        let Some(addr) = iface.addr else {
            continue;
        };

        let prefix = Ipv4Network::new(addr, 32).unwrap();
        if new_list.iter().any(|fec| fec.prefix == prefix) {
            continue;
        }

        match old_list.iter().position(|fec| fec.prefix == prefix) {
            None => {
                let id = instance.state.next_fec_id();
                new_list.push(Fec::new(id, prefix, addr));
            }
            Some(pos) => new_list.push(old_list.remove(pos)),
        }
    }

    // Whatever wasn't carried over is deprecated.
    for fec in old_list {
        Debug::FecDelete(&fec).log();
        deprecate(instance, sys, &fec);
    }

    instance.state.fecs = new_list;

    for fec in changed {
        reconcile(instance, sys, fec)?;
    }

    // Classification depends on the longest matching prefix coming first.
    instance
        .state
        .fecs
        .sort_by(|a, b| b.prefix.prefix().cmp(&a.prefix.prefix()));

    Ok(())
}

// Drops every binding of a FEC that no longer corresponds to a route.
fn deprecate(instance: &mut Instance, sys: &mut SystemView<'_>, fec: &Fec) {
    let router_id = instance.state.router_id;

    // Release every mapping received from downstream.
    for (peer_addr, label) in instance.state.downstream.purge_by_fec(fec.id) {
        Debug::DsBindingDelete(&fec.prefix, &peer_addr, &label).log();

        let msg_id = instance.state.next_msg_id();
        if let Some((_, peer)) =
            instance.state.peers.get_mut_by_addr(&peer_addr)
        {
            if peer.is_session_up() {
                peer.send_label_release(
                    sys.tcp, router_id, msg_id, label, fec.prefix,
                );
            }
        }
    }

    // Withdraw every mapping advertised upstream and drop its cross-connect.
    for (peer_addr, label) in instance.state.upstream.purge_by_fec(fec.id) {
        Debug::UsBindingDelete(&fec.prefix, &peer_addr, &label).log();

        let msg_id = instance.state.next_msg_id();
        if let Some((_, peer)) =
            instance.state.peers.get_mut_by_addr(&peer_addr)
        {
            if peer.is_session_up() {
                peer.send_label_withdraw(
                    sys.tcp, router_id, msg_id, label, fec.prefix,
                );
            }
        }

        sys.lib.remove(label);
        Debug::LibUninstall(&label).log();
    }

    // Forget requests parked on the FEC.
    for peer_addr in instance.state.pending.purge_by_fec(fec.id) {
        Debug::PendingRequestDelete(&fec.prefix, &peer_addr).log();
    }
}

// Brings the upstream bindings, LIB cross-connects and downstream requests
// of one FEC in line with its current next-hop and downstream binding.
pub(crate) fn reconcile(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    fec: Fec,
) -> Result<(), Error> {
    // Mapping received from the downstream next-hop, if any.
    let ds_label = instance.state.downstream.get(fec.id, fec.nexthop);

    // We are the egress LSR iff there is no established session to the
    // next-hop.
    let egress = instance
        .state
        .peers
        .get_by_addr(&fec.nexthop)
        .is_none_or(|(_, peer)| !peer.is_session_up());

    // Can't be egress and have a downstream mapping at the same time.
    debug_assert!(!(egress && ds_label.is_some()));

    // Adjust upstream bindings.
    let us_list: Vec<(Ipv4Addr, Label)> =
        instance.state.upstream.iter_by_fec(fec.id).collect();
    for (peer_addr, label) in us_list {
        if egress || ds_label.is_some() {
            let ingress_ifname = southbound::resolve_ifname(
                sys.rib,
                sys.interfaces,
                peer_addr,
            )?;
            let egress_ifname = southbound::resolve_ifname(
                sys.rib,
                sys.interfaces,
                fec.nexthop,
            )?;
            let label_op = match ds_label {
                Some(ds_label) => LabelOp::swap(ds_label),
                None => LabelOp::pop(),
            };
            let new_label = sys.lib.install(
                Some(label),
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
        } else {
            // No mapping from downstream: withdraw the mapping advertised
            // upstream and drop its cross-connect.
            let msg_id = instance.state.next_msg_id();
            let router_id = instance.state.router_id;
            if let Some((_, peer)) =
                instance.state.peers.get_mut_by_addr(&peer_addr)
            {
                if peer.is_session_up() {
                    peer.send_label_withdraw(
                        sys.tcp, router_id, msg_id, label, fec.prefix,
                    );
                }
            }
            sys.lib.remove(label);
            Debug::LibUninstall(&label).log();
            instance.state.upstream.remove(fec.id, peer_addr);
            Debug::UsBindingDelete(&fec.prefix, &peer_addr, &label).log();
        }
    }

    // Ask the downstream next-hop for a mapping. Duplicate in-flight
    // requests are idempotent at the protocol level.
    if !egress && ds_label.is_none() {
        let msg_id = instance.state.next_msg_id();
        let router_id = instance.state.router_id;
        if let Some((_, peer)) =
            instance.state.peers.get_mut_by_addr(&fec.nexthop)
        {
            peer.send_label_request(sys.tcp, router_id, msg_id, fec.prefix);
        }
    }

    Ok(())
}

// Runs `reconcile` on every FEC whose current next-hop is the given address.
pub(crate) fn reconcile_nexthop(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    nexthop: Ipv4Addr,
) -> Result<(), Error> {
    let fecs: Vec<Fec> = instance
        .state
        .fecs
        .iter()
        .filter(|fec| fec.nexthop == nexthop)
        .copied()
        .collect();

    for fec in fecs {
        reconcile(instance, sys, fec)?;
    }

    Ok(())
}
