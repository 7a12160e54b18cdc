//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::Ipv4Addr;

use generational_arena::{Arena, Index};

use crate::fec::FecId;
use crate::mpls::Label;
use crate::peer::Peer;

pub type PeerId = usize;
pub type PeerIndex = Index;

#[derive(Debug, Default)]
pub struct Peers {
    // Peer arena.
    arena: Arena<Peer>,
    // Peer hash table keyed by ID (1:1).
    id_tree: HashMap<PeerId, PeerIndex>,
    // Peer binary tree keyed by address (1:1).
    addr_tree: BTreeMap<Ipv4Addr, PeerIndex>,
    // Next available ID.
    next_id: PeerId,
}

// Label bindings of one direction (downstream-received or upstream-sent),
// keyed by FEC identifier and peer address.
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: BTreeMap<(FecId, Ipv4Addr), Label>,
}

// Label requests from upstream peers that can't be answered before a
// downstream mapping arrives.
#[derive(Debug, Default)]
pub struct PendingRequests {
    requests: BTreeSet<(FecId, Ipv4Addr)>,
}

// ===== impl Peers =====

impl Peers {
    pub(crate) fn insert(&mut self, peer: Peer) -> (PeerIndex, &mut Peer) {
        // Insert peer into the arena.
        let peer_idx = self.arena.insert(peer);

        // Link peer to different collections.
        let peer = &mut self.arena[peer_idx];
        self.id_tree.insert(peer.id, peer_idx);
        self.addr_tree.insert(peer.addr, peer_idx);

        // Return a mutable reference to the moved peer.
        (peer_idx, peer)
    }

    pub(crate) fn delete(&mut self, peer_idx: PeerIndex) {
        let peer = &mut self.arena[peer_idx];

        // Unlink peer from different collections.
        self.id_tree.remove(&peer.id);
        self.addr_tree.remove(&peer.addr);

        // Remove peer from the arena.
        self.arena.remove(peer_idx);
    }

    // Returns a reference to the peer corresponding to the given ID.
    #[allow(dead_code)]
    pub(crate) fn get_by_id(&self, id: PeerId) -> Option<(PeerIndex, &Peer)> {
        self.id_tree
            .get(&id)
            .copied()
            .map(|peer_idx| (peer_idx, &self.arena[peer_idx]))
    }

    // Returns a reference to the peer corresponding to the given address.
    pub fn get_by_addr(&self, addr: &Ipv4Addr) -> Option<(PeerIndex, &Peer)> {
        self.addr_tree
            .get(addr)
            .copied()
            .map(|peer_idx| (peer_idx, &self.arena[peer_idx]))
    }

    // Returns a mutable reference to the peer corresponding to the given
    // address.
    pub(crate) fn get_mut_by_addr(
        &mut self,
        addr: &Ipv4Addr,
    ) -> Option<(PeerIndex, &mut Peer)> {
        self.addr_tree
            .get(addr)
            .copied()
            .map(move |peer_idx| (peer_idx, &mut self.arena[peer_idx]))
    }

    // Returns an iterator visiting all peers.
    //
    // Peers are ordered by their addresses.
    pub fn iter(&self) -> impl Iterator<Item = &'_ Peer> + '_ {
        self.addr_tree
            .values()
            .map(|peer_idx| &self.arena[*peer_idx])
    }

    // Get next peer ID.
    pub(crate) fn next_id(&mut self) -> PeerId {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }
}

impl std::ops::Index<PeerIndex> for Peers {
    type Output = Peer;

    fn index(&self, index: PeerIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<PeerIndex> for Peers {
    fn index_mut(&mut self, index: PeerIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}

// ===== impl BindingTable =====

impl BindingTable {
    pub(crate) fn insert(
        &mut self,
        fec_id: FecId,
        peer_addr: Ipv4Addr,
        label: Label,
    ) {
        self.bindings.insert((fec_id, peer_addr), label);
    }

    pub(crate) fn remove(
        &mut self,
        fec_id: FecId,
        peer_addr: Ipv4Addr,
    ) -> Option<Label> {
        self.bindings.remove(&(fec_id, peer_addr))
    }

    pub fn get(&self, fec_id: FecId, peer_addr: Ipv4Addr) -> Option<Label> {
        self.bindings.get(&(fec_id, peer_addr)).copied()
    }

    // Returns an iterator over the bindings of the given FEC.
    pub fn iter_by_fec(
        &self,
        fec_id: FecId,
    ) -> impl Iterator<Item = (Ipv4Addr, Label)> + '_ {
        self.bindings
            .range(
                (fec_id, Ipv4Addr::UNSPECIFIED)..=(fec_id, Ipv4Addr::BROADCAST),
            )
            .map(|((_, peer_addr), label)| (*peer_addr, *label))
    }

    // Removes and returns all bindings of the given FEC.
    pub(crate) fn purge_by_fec(
        &mut self,
        fec_id: FecId,
    ) -> Vec<(Ipv4Addr, Label)> {
        let purged = self.iter_by_fec(fec_id).collect();
        self.bindings.retain(|(id, _), _| *id != fec_id);
        purged
    }

    // Removes and returns all bindings involving the given peer.
    pub(crate) fn purge_by_peer(
        &mut self,
        peer_addr: Ipv4Addr,
    ) -> Vec<(FecId, Label)> {
        let purged = self
            .bindings
            .iter()
            .filter(|((_, addr), _)| *addr == peer_addr)
            .map(|((fec_id, _), label)| (*fec_id, *label))
            .collect();
        self.bindings.retain(|(_, addr), _| *addr != peer_addr);
        purged
    }

    // Returns an iterator visiting all bindings.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (FecId, Ipv4Addr, Label)> + '_ {
        self.bindings
            .iter()
            .map(|((fec_id, peer_addr), label)| (*fec_id, *peer_addr, *label))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// ===== impl PendingRequests =====

impl PendingRequests {
    pub(crate) fn insert(&mut self, fec_id: FecId, peer_addr: Ipv4Addr) {
        self.requests.insert((fec_id, peer_addr));
    }

    // Removes and returns the requesting peers parked on the given FEC.
    pub(crate) fn purge_by_fec(&mut self, fec_id: FecId) -> Vec<Ipv4Addr> {
        let purged = self
            .requests
            .range(
                (fec_id, Ipv4Addr::UNSPECIFIED)..=(fec_id, Ipv4Addr::BROADCAST),
            )
            .map(|(_, peer_addr)| *peer_addr)
            .collect();
        self.requests.retain(|(id, _)| *id != fec_id);
        purged
    }

    // Removes all requests originated by the given peer.
    pub(crate) fn purge_by_peer(&mut self, peer_addr: Ipv4Addr) {
        self.requests.retain(|(_, addr)| *addr != peer_addr);
    }

    // Returns an iterator visiting all pending requests.
    pub fn iter(&self) -> impl Iterator<Item = (FecId, Ipv4Addr)> + '_ {
        self.requests
            .iter()
            .map(|(fec_id, peer_addr)| (*fec_id, *peer_addr))
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
