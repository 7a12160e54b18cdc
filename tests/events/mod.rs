//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//


use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use bytes::BytesMut;
use ipnetwork::Ipv4Network;
use ldpd::error::Error;
use ldpd::events;
use ldpd::fec::Fec;
use ldpd::instance::{Instance, InstanceCfg, IpPacketInfo, LabelLookup};
use ldpd::mpls::{Label, LabelOp};
use ldpd::network::{ALL_RTRS_MCAST_ADDR, LDP_PORT};
use ldpd::packet::messages::hello::{
    HelloFlags, HelloMsg, TlvCommonHelloParams,
};
use ldpd::packet::messages::label::{LabelMsg, TlvFec, TlvLabel};
use ldpd::packet::{
    DecodeCxt, LabelMessageType, Message, PacketInfo, Pdu,
};
use ldpd::southbound::{
    IP_PROTO_OSPF, IP_PROTO_TCP, IP_PROTO_UDP, InterfaceEntry, RouteEntry,
    RouteType,
};
use ldpd::tasks::Timer;
use stub::*;

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;

// (i, j, ifindex at i toward j, ifindex at j toward i).
type Link = (usize, usize, u32, u32);

// One simulated LSR: an LDP instance plus its stubbed-out router.
struct Router {
    instance: Instance,
    host: Host,
}

impl Router {
    fn new(
        router_id: Ipv4Addr,
        routes: Vec<RouteEntry>,
        outputs: Vec<(Ipv4Network, u32)>,
        interfaces: Vec<InterfaceEntry>,
        base_label: u32,
    ) -> Router {
        let mut host = Host {
            rib: StubRib {
                router_id,
                routes,
                outputs,
            },
            interfaces: StubIft { interfaces },
            lib: StubLib::new(base_label),
            ted: Default::default(),
            udp: Default::default(),
            tcp: Default::default(),
            timers: Default::default(),
        };
        let mut instance = Instance::new(InstanceCfg::default());
        instance.start(&mut host.view()).unwrap();

        Router { instance, host }
    }

    fn router_id(&self) -> Ipv4Addr {
        self.host.rib.router_id
    }

    fn hello_rx(
        &mut self,
        src: Ipv4Addr,
        ifindex: u32,
        data: &[u8],
    ) -> Result<(), Error> {
        let Router { instance, host } = self;
        events::process_hello_pdu(instance, &mut host.view(), src, ifindex, data)
    }

    fn session_rx(&mut self, src: Ipv4Addr, data: &[u8]) -> Result<(), Error> {
        let Router { instance, host } = self;
        events::process_session_pdu(instance, &mut host.view(), src, data)
    }

    fn accept(&mut self, src: Ipv4Addr) {
        let Router { instance, host } = self;
        events::process_session_accept(instance, &mut host.view(), src)
            .unwrap();
    }

    fn connect_done(&mut self, peer: Ipv4Addr) {
        let Router { instance, host } = self;
        events::process_session_connect(instance, &mut host.view(), peer)
            .unwrap();
    }

    fn timer(&mut self, timer: Timer) {
        let Router { instance, host } = self;
        events::process_timer(instance, &mut host.view(), timer).unwrap();
    }

    fn fire_hello_timer(&mut self) {
        let (_, timer) = self
            .host
            .timers
            .take(|timer| matches!(timer, Timer::SendHello))
            .unwrap();
        self.timer(timer);
    }

    fn route_change(&mut self) {
        let Router { instance, host } = self;
        events::process_routing_table_change(instance, &mut host.view())
            .unwrap();
    }

    fn fec(&self, prefix: &str) -> Fec {
        *self.instance.state.fec_by_prefix(&net(prefix)).unwrap()
    }

    fn lookup(&self, packet: &IpPacketInfo) -> Option<LabelLookup> {
        self.instance
            .lookup_label(&self.host.rib, &self.host.interfaces, packet)
    }
}

//
// Helper functions.
//

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn net(s: &str) -> Ipv4Network {
    s.parse().unwrap()
}

fn route(prefix: &str, gateway: &str, route_type: RouteType) -> RouteEntry {
    RouteEntry {
        prefix: net(prefix),
        gateway: ip(gateway),
        route_type,
    }
}

fn iface(name: &str, ifindex: u32, addr: &str) -> InterfaceEntry {
    InterfaceEntry {
        name: name.to_owned(),
        ifindex: Some(ifindex),
        addr: Some(ip(addr)),
    }
}

fn tcp_pkt(dst_addr: &str, src_port: u16, dst_port: u16) -> IpPacketInfo {
    IpPacketInfo {
        dst_addr: ip(dst_addr),
        protocol: IP_PROTO_TCP,
        src_port: Some(src_port),
        dst_port: Some(dst_port),
    }
}

fn hello_pdu(lsr_id: Ipv4Addr, holdtime: u16) -> BytesMut {
    let mut pdu = Pdu::new(lsr_id, 0);
    pdu.messages.push_back(
        HelloMsg {
            msg_id: 1,
            params: TlvCommonHelloParams {
                holdtime,
                flags: HelloFlags::empty(),
            },
        }
        .into(),
    );
    pdu.encode(Pdu::DFLT_MAX_LEN)
}

fn label_pdu(
    lsr_id: Ipv4Addr,
    msg_type: LabelMessageType,
    label: Option<u32>,
    prefix: &str,
) -> BytesMut {
    let mut pdu = Pdu::new(lsr_id, 0);
    pdu.messages.push_back(
        LabelMsg {
            msg_id: 1,
            msg_type,
            fec: TlvFec(vec![net(prefix)]),
            label: label.map(|label| TlvLabel(Label::new(label))),
        }
        .into(),
    );
    pdu.encode(Pdu::DFLT_MAX_LEN)
}

fn decode(data: &[u8]) -> Vec<Message> {
    let cxt = DecodeCxt {
        pkt_info: PacketInfo {
            src_addr: Ipv4Addr::UNSPECIFIED,
            multicast: None,
        },
        pdu_max_len: Pdu::DFLT_MAX_LEN,
    };
    Pdu::decode(data, &cxt).unwrap().messages.into_iter().collect()
}

fn index_by_id(routers: &[Router], id: Ipv4Addr) -> Option<usize> {
    routers.iter().position(|router| router.router_id() == id)
}

// Shuttles queued hellos, connection attempts and (optionally) session PDUs
// between the routers until the network is quiet.
fn pump(routers: &mut Vec<Router>, links: &[Link], deliver_session: bool) {
    loop {
        let mut progressed = false;

        for i in 0..routers.len() {
            // Hello datagrams.
            let sent = std::mem::take(&mut routers[i].host.udp.sent);
            for (dst, data) in sent {
                progressed = true;
                let src = routers[i].router_id();
                for &(x, y, ifx, ify) in links {
                    if x == i
                        && (dst == ALL_RTRS_MCAST_ADDR
                            || dst == routers[y].router_id())
                    {
                        routers[y].hello_rx(src, ify, &data).unwrap();
                    }
                    if y == i
                        && (dst == ALL_RTRS_MCAST_ADDR
                            || dst == routers[x].router_id())
                    {
                        routers[x].hello_rx(src, ifx, &data).unwrap();
                    }
                }
            }

            // Session connection attempts: the passive side accepts, then
            // the active side learns the connection is up.
            let connects = std::mem::take(&mut routers[i].host.tcp.connects);
            for (local, peer) in connects {
                progressed = true;
                let Some(j) = index_by_id(routers, peer) else {
                    continue;
                };
                routers[j].accept(local);
                let accepted = routers[j]
                    .instance
                    .state
                    .peers
                    .get_by_addr(&local)
                    .is_some_and(|(_, peer)| peer.is_session_up());
                if accepted {
                    routers[i].connect_done(peer);
                }
            }

            // Session PDUs.
            if deliver_session {
                let sent = std::mem::take(&mut routers[i].host.tcp.sent);
                for (dst, data) in sent {
                    progressed = true;
                    let src = routers[i].router_id();
                    let Some(j) = index_by_id(routers, dst) else {
                        continue;
                    };
                    routers[j].session_rx(src, &data).unwrap();
                }
            }
        }

        if !progressed {
            break;
        }
    }
}

// A --- B --- C, with A routing to C's loopback through B and B directly
// connected to it. A carries a spare interface (eth1) used to splice in a
// fourth router.
fn topology() -> (Vec<Router>, Vec<Link>) {
    let a = Router::new(
        ip("1.1.1.1"),
        vec![route("3.3.3.3/32", "2.2.2.2", RouteType::Remote)],
        vec![
            (net("10.0.1.0/24"), 1),
            (net("2.2.2.2/32"), 1),
            (net("3.3.3.3/32"), 1),
            (net("10.0.3.0/24"), 2),
            (net("4.4.4.4/32"), 2),
        ],
        vec![iface("eth0", 1, "10.0.1.1"), iface("eth1", 2, "10.0.3.1")],
        300,
    );
    let b = Router::new(
        ip("2.2.2.2"),
        vec![route("3.3.3.3/32", "0.0.0.0", RouteType::Direct)],
        vec![
            (net("10.0.1.0/24"), 1),
            (net("1.1.1.1/32"), 1),
            (net("10.0.2.0/24"), 2),
            (net("3.3.3.3/32"), 2),
        ],
        vec![iface("eth0", 1, "10.0.1.2"), iface("eth1", 2, "10.0.2.2")],
        200,
    );
    let c = Router::new(
        ip("3.3.3.3"),
        vec![],
        vec![
            (net("10.0.2.0/24"), 1),
            (net("2.2.2.2/32"), 1),
            (net("3.3.3.3/32"), 2),
        ],
        vec![iface("eth0", 1, "10.0.2.3"), iface("lo0", 2, "3.3.3.3")],
        100,
    );

    (vec![a, b, c], vec![(A, B, 1, 1), (B, C, 2, 1)])
}

// Runs discovery and session establishment to completion, then label
// distribution.
fn converge() -> (Vec<Router>, Vec<Link>) {
    let (mut routers, links) = topology();
    for router in routers.iter_mut() {
        router.fire_hello_timer();
    }
    pump(&mut routers, &links, false);
    pump(&mut routers, &links, true);
    (routers, links)
}

// Invariants that must hold in any reachable state.
fn check_invariants(router: &Router) {
    let state = &router.instance.state;

    // FEC uniqueness.
    for (i, a) in state.fecs.iter().enumerate() {
        for b in &state.fecs[i + 1..] {
            assert_ne!(a.prefix, b.prefix);
        }
    }

    // The FEC list is sorted by prefix length descending.
    for pair in state.fecs.windows(2) {
        assert!(pair[0].prefix.prefix() >= pair[1].prefix.prefix());
    }

    // No FEC has a downstream binding via its next-hop without an
    // established session to that next-hop.
    for fec in &state.fecs {
        if state.downstream.get(fec.id, fec.nexthop).is_some() {
            assert!(
                state
                    .peers
                    .get_by_addr(&fec.nexthop)
                    .is_some_and(|(_, peer)| peer.is_session_up())
            );
        }
    }

    // Every upstream binding is backed by exactly one LIB cross-connect.
    let us_labels: BTreeSet<u32> =
        state.upstream.iter().map(|(_, _, label)| label.get()).collect();
    let lib_labels: BTreeSet<u32> =
        router.host.lib.entries.keys().copied().collect();
    assert_eq!(us_labels, lib_labels);
    assert_eq!(state.upstream.len(), router.host.lib.entries.len());

    // Signaling and OSPF traffic is never classified, regardless of the FEC
    // table contents.
    let ospf = IpPacketInfo {
        dst_addr: ip("3.3.3.3"),
        protocol: IP_PROTO_OSPF,
        src_port: None,
        dst_port: None,
    };
    let ldp_disc = IpPacketInfo {
        dst_addr: ip("3.3.3.3"),
        protocol: IP_PROTO_UDP,
        src_port: Some(LDP_PORT),
        dst_port: Some(LDP_PORT),
    };
    assert!(router.lookup(&ospf).is_none());
    assert!(router.lookup(&ldp_disc).is_none());
    assert!(router.lookup(&tcp_pkt("3.3.3.3", LDP_PORT, 33000)).is_none());
    assert!(router.lookup(&tcp_pkt("3.3.3.3", 33000, LDP_PORT)).is_none());
}

//
// Test scenarios.
//

// S1: three-router linear LSP. C is egress for its own loopback; B answers
// A's request only once C's mapping arrives; A ends up with a push toward B.
#[test]
fn s1_linear_lsp() {
    let (routers, _links) = converge();
    let (a, b, c) = (&routers[A], &routers[B], &routers[C]);

    // A: one downstream binding learned from B, nothing advertised.
    let fec_a = a.fec("3.3.3.3/32");
    assert_eq!(
        a.instance.state.downstream.get(fec_a.id, ip("2.2.2.2")),
        Some(Label::new(200))
    );
    assert!(a.instance.state.upstream.is_empty());
    assert!(a.instance.state.pending.is_empty());
    assert!(a.host.lib.entries.is_empty());

    // B: swap from A's traffic to C's label.
    let fec_b = b.fec("3.3.3.3/32");
    assert_eq!(
        b.instance.state.downstream.get(fec_b.id, ip("3.3.3.3")),
        Some(Label::new(100))
    );
    assert_eq!(
        b.instance.state.upstream.get(fec_b.id, ip("1.1.1.1")),
        Some(Label::new(200))
    );
    assert!(b.instance.state.pending.is_empty());
    let xc = b.host.lib.entries.get(&200).unwrap();
    assert_eq!(xc.ingress_ifname, "eth0");
    assert_eq!(xc.label_op, LabelOp::Swap(Label::new(100)));
    assert_eq!(xc.egress_ifname, "eth1");

    // C: egress pop for its own loopback.
    let fec_c = c.fec("3.3.3.3/32");
    assert!(c.instance.state.downstream.is_empty());
    assert_eq!(
        c.instance.state.upstream.get(fec_c.id, ip("2.2.2.2")),
        Some(Label::new(100))
    );
    let xc = c.host.lib.entries.get(&100).unwrap();
    assert_eq!(xc.ingress_ifname, "eth0");
    assert_eq!(xc.label_op, LabelOp::Pop);
    assert_eq!(xc.egress_ifname, "lo0");

    // Classification at the ingress yields a push toward B.
    let lookup = a.lookup(&tcp_pkt("3.3.3.3", 33000, 80)).unwrap();
    assert_eq!(lookup.label_op, LabelOp::Push(Label::new(200)));
    assert_eq!(lookup.egress_ifname, "eth0");

    // ...and at the transit LSR a push of C's label.
    let lookup = b.lookup(&tcp_pkt("3.3.3.3", 33000, 80)).unwrap();
    assert_eq!(lookup.label_op, LabelOp::Push(Label::new(100)));
    assert_eq!(lookup.egress_ifname, "eth1");

    // Exactly one hold timeout is armed per discovered peer.
    let timeouts = a
        .host
        .timers
        .armed
        .iter()
        .filter(|(_, _, timer)| matches!(timer, Timer::HelloTimeout(_)))
        .count();
    assert_eq!(timeouts, 1);

    for router in &routers {
        check_invariants(router);
    }
}

// S2: peer loss. After A's hold time expires all state involving B is
// purged without any WITHDRAW/RELEASE exchange, and classification fails.
#[test]
fn s2_peer_loss() {
    let (mut routers, _links) = converge();
    let a = &mut routers[A];

    a.timer(Timer::HelloTimeout(ip("2.2.2.2")));

    assert!(a.instance.state.peers.get_by_addr(&ip("2.2.2.2")).is_none());
    assert!(a.instance.state.downstream.is_empty());
    assert!(a.instance.state.upstream.is_empty());
    assert!(a.host.tcp.sent.is_empty());
    assert_eq!(a.host.tcp.closed, vec![ip("2.2.2.2")]);
    assert!(
        a.host
            .ted
            .down_links
            .contains(&(ip("1.1.1.1"), ip("2.2.2.2")))
    );
    assert!(
        a.host
            .ted
            .announcements
            .contains(&(ip("1.1.1.1"), ip("2.2.2.2")))
    );
    assert_eq!(a.host.ted.rebuild_requests, 1);
    assert!(a.lookup(&tcp_pkt("3.3.3.3", 33000, 80)).is_none());

    check_invariants(a);
}

// S3: next-hop change. The FEC is rerouted through a new peer; a fresh
// request goes downstream while the old binding via B is left to B's
// withdraw.
#[test]
fn s3_nexthop_change() {
    let (mut routers, _links) = converge();
    let a = &mut routers[A];

    // Splice in a fourth router, D, behind A's spare interface.
    let hello = hello_pdu(ip("4.4.4.4"), 15);
    a.hello_rx(ip("4.4.4.4"), 2, &hello).unwrap();
    assert_eq!(a.host.tcp.connects, vec![(ip("1.1.1.1"), ip("4.4.4.4"))]);
    a.connect_done(ip("4.4.4.4"));
    assert!(a.host.tcp.sent.is_empty());

    // Reroute C's loopback through D.
    a.host.rib.routes =
        vec![route("3.3.3.3/32", "4.4.4.4", RouteType::Remote)];
    a.route_change();

    let fec = a.fec("3.3.3.3/32");
    assert_eq!(fec.nexthop, ip("4.4.4.4"));

    // The orphaned downstream binding via B is kept.
    assert_eq!(
        a.instance.state.downstream.get(fec.id, ip("2.2.2.2")),
        Some(Label::new(200))
    );

    // A single label request went out, to D.
    let sent = std::mem::take(&mut a.host.tcp.sent);
    assert_eq!(sent.len(), 1);
    let (dst, data) = &sent[0];
    assert_eq!(*dst, ip("4.4.4.4"));
    let msgs = decode(data);
    assert_eq!(msgs.len(), 1);
    let Message::Label(msg) = &msgs[0] else {
        panic!("expected label message");
    };
    assert_eq!(msg.msg_type, LabelMessageType::LabelRequest);
    assert_eq!(msg.fec.0, vec![net("3.3.3.3/32")]);

    // No downstream binding via D yet.
    assert!(a.lookup(&tcp_pkt("3.3.3.3", 33000, 80)).is_none());

    check_invariants(a);
}

// S4: NO_ROUTE retry. B can't satisfy A's request; A schedules a retry one
// second later and reissues the request when it fires.
#[test]
fn s4_no_route_retry() {
    let a = Router::new(
        ip("1.1.1.1"),
        vec![route("9.9.9.9/32", "2.2.2.2", RouteType::Remote)],
        vec![
            (net("10.0.1.0/24"), 1),
            (net("2.2.2.2/32"), 1),
            (net("9.9.9.9/32"), 1),
        ],
        vec![iface("eth0", 1, "10.0.1.1")],
        300,
    );
    let b = Router::new(
        ip("2.2.2.2"),
        vec![],
        vec![(net("10.0.1.0/24"), 1), (net("1.1.1.1/32"), 1)],
        vec![iface("eth0", 1, "10.0.1.2")],
        200,
    );
    let mut routers = vec![a, b];
    let links = vec![(0, 1, 1, 1)];

    for router in routers.iter_mut() {
        router.fire_hello_timer();
    }
    pump(&mut routers, &links, false);
    pump(&mut routers, &links, true);

    let a = &mut routers[A];
    assert!(a.instance.state.downstream.is_empty());

    let (delay, timer) = a
        .host
        .timers
        .take(|timer| matches!(timer, Timer::RequestRetry { .. }))
        .unwrap();
    assert_eq!(delay, Duration::from_secs(1));
    assert_eq!(
        timer,
        Timer::RequestRetry {
            lsr_id: ip("2.2.2.2"),
            prefix: net("9.9.9.9/32"),
        }
    );

    a.timer(timer);
    let sent = std::mem::take(&mut a.host.tcp.sent);
    assert_eq!(sent.len(), 1);
    let msgs = decode(&sent[0].1);
    let Message::Label(msg) = &msgs[0] else {
        panic!("expected label message");
    };
    assert_eq!(msg.msg_type, LabelMessageType::LabelRequest);
    assert_eq!(msg.fec.0, vec![net("9.9.9.9/32")]);
}

// S5: duplicate RELEASE. The first release drops the binding and its
// cross-connect; the duplicate is a silent no-op.
#[test]
fn s5_release_race() {
    let (mut routers, _links) = converge();
    let c = &mut routers[C];
    let fec = c.fec("3.3.3.3/32");
    assert_eq!(
        c.instance.state.upstream.get(fec.id, ip("2.2.2.2")),
        Some(Label::new(100))
    );

    let release = label_pdu(
        ip("2.2.2.2"),
        LabelMessageType::LabelRelease,
        Some(100),
        "3.3.3.3/32",
    );
    c.session_rx(ip("2.2.2.2"), &release).unwrap();
    assert!(c.instance.state.upstream.is_empty());
    assert!(c.host.lib.entries.is_empty());

    let release = label_pdu(
        ip("2.2.2.2"),
        LabelMessageType::LabelRelease,
        Some(100),
        "3.3.3.3/32",
    );
    c.session_rx(ip("2.2.2.2"), &release).unwrap();
    assert!(c.instance.state.upstream.is_empty());
    assert!(c.host.tcp.sent.is_empty());

    check_invariants(c);
}

// A withdraw from the downstream removes the binding, is acknowledged with
// a release, and prompts a fresh request.
#[test]
fn withdraw_release_request() {
    let (mut routers, _links) = converge();
    let a = &mut routers[A];
    let fec = a.fec("3.3.3.3/32");

    let withdraw = label_pdu(
        ip("2.2.2.2"),
        LabelMessageType::LabelWithdraw,
        Some(200),
        "3.3.3.3/32",
    );
    a.session_rx(ip("2.2.2.2"), &withdraw).unwrap();

    assert!(a.instance.state.downstream.get(fec.id, ip("2.2.2.2")).is_none());

    let sent = std::mem::take(&mut a.host.tcp.sent);
    assert_eq!(sent.len(), 2);
    let msgs = decode(&sent[0].1);
    let Message::Label(msg) = &msgs[0] else {
        panic!("expected label message");
    };
    assert_eq!(msg.msg_type, LabelMessageType::LabelRelease);
    assert_eq!(msg.get_label(), Some(Label::new(200)));
    let msgs = decode(&sent[1].1);
    let Message::Label(msg) = &msgs[0] else {
        panic!("expected label message");
    };
    assert_eq!(msg.msg_type, LabelMessageType::LabelRequest);

    check_invariants(a);
}

// S6: hellos carrying our own router-id (multicast loopback) are ignored.
#[test]
fn s6_self_hello() {
    let (mut routers, _links) = topology();
    let a = &mut routers[A];
    a.host.udp.sent.clear();

    let hello = hello_pdu(ip("1.1.1.1"), 15);
    a.hello_rx(ip("1.1.1.1"), 1, &hello).unwrap();

    assert_eq!(a.instance.state.peers.iter().count(), 0);
    assert!(a.host.udp.sent.is_empty());
    assert!(
        !a.host
            .timers
            .armed
            .iter()
            .any(|(_, _, timer)| matches!(timer, Timer::HelloTimeout(_)))
    );
}

// Applying the same routing snapshot twice must not change any state or
// produce any traffic.
#[test]
fn rebuild_idempotence() {
    let (mut routers, _links) = converge();
    let b = &mut routers[B];

    let fecs: Vec<Fec> = b.instance.state.fecs.clone();
    let downstream: Vec<_> = b.instance.state.downstream.iter().collect();
    let upstream: Vec<_> = b.instance.state.upstream.iter().collect();
    let pending: Vec<_> = b.instance.state.pending.iter().collect();

    b.route_change();

    assert_eq!(fecs, b.instance.state.fecs);
    assert_eq!(downstream, b.instance.state.downstream.iter().collect::<Vec<_>>());
    assert_eq!(upstream, b.instance.state.upstream.iter().collect::<Vec<_>>());
    assert_eq!(pending, b.instance.state.pending.iter().collect::<Vec<_>>());
    assert!(b.host.tcp.sent.is_empty());
    assert!(b.host.udp.sent.is_empty());

    check_invariants(b);
}

// Hellos must never show up on the session transport.
#[test]
fn hello_on_session() {
    let (mut routers, _links) = converge();
    let a = &mut routers[A];

    let hello = hello_pdu(ip("2.2.2.2"), 15);
    assert!(matches!(
        a.session_rx(ip("2.2.2.2"), &hello),
        Err(Error::HelloOnSession(_))
    ));
}

// The ADDRESS message family is unsupported and fatal.
#[test]
fn address_msg_on_session() {
    let (mut routers, _links) = converge();
    let a = &mut routers[A];

    let bytes = vec![
        0x00, 0x01, 0x00, 0x0e, 0x02, 0x02, 0x02, 0x02, 0x00, 0x00, 0x03,
        0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01,
    ];
    assert!(matches!(
        a.session_rx(ip("2.2.2.2"), &bytes),
        Err(Error::PeerPduDecodeError(..))
    ));
}

// A mapping for a FEC we never requested is a protocol violation.
#[test]
fn unsolicited_mapping() {
    let (mut routers, _links) = converge();
    let a = &mut routers[A];

    let mapping = label_pdu(
        ip("2.2.2.2"),
        LabelMessageType::LabelMapping,
        Some(500),
        "7.7.7.7/32",
    );
    assert!(matches!(
        a.session_rx(ip("2.2.2.2"), &mapping),
        Err(Error::UnexpectedMapping(..))
    ));
}

// PDUs from addresses that were never discovered are dropped.
#[test]
fn session_pdu_unknown_peer() {
    let (mut routers, _links) = converge();
    let b = &mut routers[B];

    let request = label_pdu(
        ip("9.9.9.9"),
        LabelMessageType::LabelRequest,
        None,
        "3.3.3.3/32",
    );
    b.session_rx(ip("9.9.9.9"), &request).unwrap();
    assert!(b.host.tcp.sent.is_empty());
}
