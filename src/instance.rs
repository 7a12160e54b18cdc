//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

use crate::collections::{BindingTable, PendingRequests, Peers};
use crate::debug::Debug;
use crate::error::Error;
use crate::fec::{self, Fec, FecId};
use crate::mpls::LabelOp;
use crate::network::{DiscoveryTransport, LDP_PORT, SessionTransport};
use crate::southbound::{
    self, IP_PROTO_OSPF, IP_PROTO_TCP, IP_PROTO_UDP, InterfaceTable, LibTable,
    RouteTable, Ted, USER_TRAFFIC_COLOR,
};
use crate::tasks::{Timer, TimerScheduler};
use crate::discovery;

// LDP speaker instance.
#[derive(Debug)]
pub struct Instance {
    // Instance configuration data.
    pub config: InstanceCfg,
    // Instance state data.
    pub state: InstanceState,
}

// Instance configuration data.
#[derive(Clone, Debug)]
pub struct InstanceCfg {
    // Peer hold time advertised in hellos and applied to received ones (in
    // seconds).
    pub hello_holdtime: u16,
    // Interval between periodic hellos (in seconds).
    pub hello_interval: u16,
}

// Instance state data.
#[derive(Debug)]
pub struct InstanceState {
    // Router-ID in use.
    pub router_id: Ipv4Addr,
    // Global message ID.
    pub msg_id: u32,
    // Next available FEC ID.
    pub next_fec_id: FecId,
    // Discovered peers.
    pub peers: Peers,
    // Known FECs, sorted by prefix length descending.
    pub fecs: Vec<Fec>,
    // Label mappings received from downstream peers.
    pub downstream: BindingTable,
    // Label mappings advertised to upstream peers.
    pub upstream: BindingTable,
    // Label requests waiting for a downstream mapping.
    pub pending: PendingRequests,
}

// Borrowed views of the external modules the LDP speaker cooperates with.
//
// All of them outlive the instance; the core only holds them for the
// duration of a single entry point.
pub struct SystemView<'a> {
    pub rib: &'a dyn RouteTable,
    pub interfaces: &'a dyn InterfaceTable,
    pub lib: &'a mut dyn LibTable,
    pub ted: &'a mut dyn Ted,
    pub udp: &'a mut dyn DiscoveryTransport,
    pub tcp: &'a mut dyn SessionTransport,
    pub timers: &'a mut dyn TimerScheduler,
}

// Header fields of a data-plane packet submitted for classification.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IpPacketInfo {
    pub dst_addr: Ipv4Addr,
    pub protocol: u8,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
}

// Result of a successful classification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LabelLookup {
    pub label_op: LabelOp,
    pub egress_ifname: String,
    pub color: u32,
}

// ===== impl Instance =====

impl Instance {
    pub fn new(config: InstanceCfg) -> Instance {
        Debug::InstanceCreate.log();

        Instance {
            config,
            state: InstanceState {
                router_id: Ipv4Addr::UNSPECIFIED,
                msg_id: 0,
                next_fec_id: 1,
                peers: Default::default(),
                fecs: Default::default(),
                downstream: Default::default(),
                upstream: Default::default(),
                pending: Default::default(),
            },
        }
    }

    // Starts the instance: learns the local router-id, schedules the first
    // hello and builds the initial FEC list.
    pub fn start(&mut self, sys: &mut SystemView<'_>) -> Result<(), Error> {
        Debug::InstanceStart.log();

        self.state.router_id = sys.rib.router_id();
        sys.timers
            .schedule(discovery::initial_hello_jitter(), Timer::SendHello);
        fec::rebuild(self, sys)
    }

    // Data-plane classification.
    //
    // Walks the FEC list (longest prefix first) and returns the push
    // operation for the first entry matching the packet's destination, the
    // egress interface toward its next-hop, and the user-traffic color.
    pub fn lookup_label(
        &self,
        rib: &dyn RouteTable,
        interfaces: &dyn InterfaceTable,
        packet: &IpPacketInfo,
    ) -> Option<LabelLookup> {
        // Never label LDP's own signaling traffic or OSPF; those are
        // forwarded by plain IP.
        match packet.protocol {
            IP_PROTO_OSPF => return None,
            IP_PROTO_UDP if packet.dst_port == Some(LDP_PORT) => return None,
            IP_PROTO_TCP
                if packet.src_port == Some(LDP_PORT)
                    || packet.dst_port == Some(LDP_PORT) =>
            {
                return None;
            }
            _ => (),
        }

        let fec = self
            .state
            .fecs
            .iter()
            .find(|fec| fec.prefix.contains(packet.dst_addr))?;
        let label = self.state.downstream.get(fec.id, fec.nexthop)?;
        let egress_ifname =
            southbound::resolve_ifname(rib, interfaces, fec.nexthop).ok()?;

        Some(LabelLookup {
            label_op: LabelOp::push(label),
            egress_ifname,
            color: USER_TRAFFIC_COLOR,
        })
    }
}

// ===== impl InstanceCfg =====

impl InstanceCfg {
    pub const DFLT_HELLO_HOLDTIME: u16 = 15;
    pub const DFLT_HELLO_INTERVAL: u16 = 5;
}

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        InstanceCfg {
            hello_holdtime: Self::DFLT_HELLO_HOLDTIME,
            hello_interval: Self::DFLT_HELLO_INTERVAL,
        }
    }
}

// ===== impl InstanceState =====

impl InstanceState {
    pub(crate) fn next_msg_id(&mut self) -> u32 {
        let msg_id = self.msg_id;
        self.msg_id = self.msg_id.wrapping_add(1);
        msg_id
    }

    pub(crate) fn next_fec_id(&mut self) -> FecId {
        let fec_id = self.next_fec_id;
        self.next_fec_id += 1;
        fec_id
    }

    // Returns a reference to the FEC corresponding to the given prefix.
    pub fn fec_by_prefix(&self, prefix: &Ipv4Network) -> Option<&Fec> {
        self.fecs.iter().find(|fec| fec.prefix == *prefix)
    }
}
