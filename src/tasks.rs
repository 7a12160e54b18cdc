//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use ipnetwork::Ipv4Network;

// Opaque handle of a scheduled timer.
pub type TimerToken = u64;

// Timer events understood by the core.
//
// The host's event loop owns the clock; the core asks for timers through
// `TimerScheduler` and receives them back via `events::process_timer`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Timer {
    // Periodic hello transmission.
    SendHello,
    // Per-peer hello hold timeout.
    HelloTimeout(Ipv4Addr),
    // Delayed retry of a label request after a NO_ROUTE notification.
    RequestRetry {
        lsr_id: Ipv4Addr,
        prefix: Ipv4Network,
    },
}

// Timer facility provided by the host runtime.
//
// A token becomes invalid once its timer fires or is cancelled.
pub trait TimerScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerToken;

    fn cancel(&mut self, token: TimerToken);
}
