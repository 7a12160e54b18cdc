//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

use crate::error::Error;
use crate::mpls::{Label, LabelOp};

// IP protocol numbers relevant to classification.
pub const IP_PROTO_TCP: u8 = 6;
pub const IP_PROTO_UDP: u8 = 17;
pub const IP_PROTO_OSPF: u8 = 89;

// Forwarding class assigned to label-switched user traffic.
pub const USER_TRAFFIC_COLOR: u32 = 1;

// Routing entry origin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteType {
    // Destination on an attached network.
    Direct,
    // Destination reached through a gateway.
    Remote,
}

// Single entry of the IP routing table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteEntry {
    pub prefix: Ipv4Network,
    pub gateway: Ipv4Addr,
    pub route_type: RouteType,
}

// Single entry of the interface table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterfaceEntry {
    pub name: String,
    // Missing ifindex means the interface has no valid output port.
    pub ifindex: Option<u32>,
    // Primary IPv4 address.
    pub addr: Option<Ipv4Addr>,
}

// View of the IP routing table.
//
// The routing table outlives the LDP speaker and is mutated only through the
// TED rebuild request; the core reads it.
pub trait RouteTable {
    // Local router-id.
    fn router_id(&self) -> Ipv4Addr;

    // Snapshot of all routing entries.
    fn entries(&self) -> Vec<RouteEntry>;

    // Output interface for the given destination (longest match).
    fn output_ifindex(&self, dest: Ipv4Addr) -> Option<u32>;
}

// View of the interface table.
pub trait InterfaceTable {
    // Snapshot of all interfaces.
    fn entries(&self) -> Vec<InterfaceEntry>;

    fn get_by_ifindex(&self, ifindex: u32) -> Option<InterfaceEntry>;
}

// The MPLS Label Information Base (cross-connect engine).
pub trait LibTable {
    // Create or replace a cross-connect. When `ingress_label` is None the
    // LIB allocates a fresh ingress label; the resulting ingress label is
    // returned either way.
    fn install(
        &mut self,
        ingress_label: Option<Label>,
        ingress_ifname: &str,
        label_op: LabelOp,
        egress_ifname: &str,
        color: u32,
    ) -> Result<Label, LibError>;

    // Delete the cross-connect keyed by the given ingress label.
    fn remove(&mut self, label: Label);
}

// The Traffic Engineering Database.
//
// Links are indexed by (advertising router, link id); discovery updates the
// state of the (local, peer) link and requests routing recomputations.
pub trait Ted {
    fn link_is_up(&self, advrouter: Ipv4Addr, linkid: Ipv4Addr) -> bool;

    fn set_link_state(
        &mut self,
        advrouter: Ipv4Addr,
        linkid: Ipv4Addr,
        up: bool,
    );

    // Point-to-point link-change announcement to the TED module.
    fn announce_link_change(&mut self, advrouter: Ipv4Addr, linkid: Ipv4Addr);

    fn rebuild_routing_table(&mut self);
}

// LIB errors.
#[derive(Debug)]
pub enum LibError {
    LabelSpaceExhausted,
}

// ===== impl LibError =====

impl std::fmt::Display for LibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibError::LabelSpaceExhausted => {
                write!(f, "label space has been exhausted")
            }
        }
    }
}

impl std::error::Error for LibError {}

// ===== global functions =====

// Maps an IP next-hop to the name of the interface used to reach it.
//
// Peers whose interface cannot be resolved through the routing table are
// rejected.
pub(crate) fn resolve_ifname(
    rib: &dyn RouteTable,
    interfaces: &dyn InterfaceTable,
    addr: Ipv4Addr,
) -> Result<String, Error> {
    rib.output_ifindex(addr)
        .and_then(|ifindex| interfaces.get_by_ifindex(ifindex))
        .map(|iface| iface.name)
        .ok_or(Error::UnresolvedNexthop(addr))
}
