//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod hello;
pub mod label;
pub mod notification;

pub use hello::HelloMsg;
pub use label::LabelMsg;
pub use notification::NotifMsg;
