//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use rand::Rng;

use crate::debug::Debug;
use crate::instance::{Instance, SystemView};
use crate::packet::Pdu;
use crate::packet::messages::hello::{HelloFlags, HelloMsg, TlvCommonHelloParams};
use crate::peer::Peer;
use crate::tasks::{Timer, TimerScheduler};

// Sends a hello carrying the local router-id and the advertised hold time.
//
// The destination is either the all-routers multicast group (periodic
// hellos) or the unicast address of a freshly discovered peer.
pub(crate) fn send_hello(
    instance: &mut Instance,
    sys: &mut SystemView<'_>,
    dst_addr: Ipv4Addr,
) {
    let msg_id = instance.state.next_msg_id();
    let hello = HelloMsg {
        msg_id,
        params: TlvCommonHelloParams {
            holdtime: instance.config.hello_holdtime,
            flags: HelloFlags::empty(),
        },
    };

    Debug::HelloTx(&dst_addr, &hello).log();

    let mut pdu = Pdu::new(instance.state.router_id, 0);
    pdu.messages.push_back(hello.into());
    sys.udp.send_pdu(dst_addr, pdu.encode(Pdu::DFLT_MAX_LEN));
}

// Delay of the first hello.
//
// Routers booting together would otherwise flood the subnet in lockstep.
pub(crate) fn initial_hello_jitter() -> Duration {
    Duration::from_millis(rand::rng().random_range(0..=200))
}

// Restarts the peer's hello hold timeout.
pub(crate) fn reset_hello_timeout(
    peer: &mut Peer,
    holdtime: u16,
    timers: &mut dyn TimerScheduler,
) {
    if let Some(token) = peer.timeout_token.take() {
        timers.cancel(token);
    }

    let token = timers.schedule(
        Duration::from_secs(holdtime.into()),
        Timer::HelloTimeout(peer.addr),
    );
    peer.timeout_token = Some(token);
}
