//! The sans-IO transport engine.
//!
//! A [`Host`] owns the peer table of one socket. Feed it datagrams with
//! [`Host::process_inbound`], drive timers with [`Host::sweep`] and drain
//! the encoded datagrams it queues with [`Host::pop_transmit`]. Nothing in
//! here blocks or awaits; every call finishes its work before returning.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;

use crate::{
    config::Config,
    error::{EnetError, Resource},
    protocol::{
        constants::MAXIMUM_PEER_ID,
        packet::{Command, CommandKind, Connect},
        state::{DisconnectReason, Event},
        types::{PeerId, Sequence16},
    },
    session::{Arrival, Peer, ReassemblyBudget, RetransmitStatus},
    transport::{Message, Transmit, datagram::Datagram},
};

pub struct Host {
    config: Config,
    peers: HashMap<SocketAddr, Peer>,
    ids: HashMap<PeerId, SocketAddr>,
    next_id: u16,
    budget: ReassemblyBudget,
    transmits: VecDeque<Transmit>,
    epoch: Instant,
}

impl Host {
    pub fn new(config: Config) -> Self {
        Self {
            budget: ReassemblyBudget::new(config.max_reassembly_bytes),
            config,
            peers: HashMap::new(),
            ids: HashMap::new(),
            next_id: 1,
            transmits: VecDeque::new(),
            epoch: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peer(&self, id: PeerId) -> Option<&Peer> {
        self.ids.get(&id).and_then(|addr| self.peers.get(addr))
    }

    pub fn peer_by_addr(&self, addr: SocketAddr) -> Option<&Peer> {
        self.peers.get(&addr)
    }

    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Bytes currently reserved for fragment reassembly across all peers.
    pub fn reassembly_bytes(&self) -> usize {
        self.budget.used()
    }

    /// Handle one datagram from `addr`, returning the events it produced.
    ///
    /// Malformed input is logged and dropped; it never affects other peers.
    pub fn process_inbound(&mut self, bytes: &[u8], addr: SocketAddr, now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        if let Err(e) = self.try_process_inbound(bytes, addr, now, &mut events) {
            tracing::debug!(peer = %addr, error = ?e, "inbound datagram rejected");
        }
        events
    }

    /// Like [`Host::process_inbound`], but reports the first error.
    ///
    /// Events produced before the error are still pushed to `events`, and
    /// acknowledgements for them are still queued.
    pub fn try_process_inbound(
        &mut self,
        bytes: &[u8],
        addr: SocketAddr,
        now: Instant,
        events: &mut Vec<Event>,
    ) -> Result<(), EnetError> {
        let (datagram, halted) = Datagram::decode(bytes)?;
        let header = datagram.header;

        match self.peers.get_mut(&addr) {
            Some(peer) => {
                if !peer.accepts_header(&header) {
                    tracing::debug!(
                        peer = %addr,
                        header_peer = header.peer_id,
                        session = header.session_id,
                        "header does not match peer"
                    );
                    return Ok(());
                }
                peer.touch(now);
            }
            None if header.peer_id != MAXIMUM_PEER_ID => {
                tracing::debug!(peer = %addr, header_peer = header.peer_id, "datagram from unknown peer");
                return Ok(());
            }
            None => {}
        }

        let mut first_error = None;
        for command in datagram.commands {
            if let Err(e) = self.dispatch_command(addr, header.sent_time, command, now, events) {
                tracing::debug!(peer = %addr, error = ?e, "command rejected");
                first_error.get_or_insert(e);
            }
        }
        self.flush_peer(addr, now);

        if let Some(e) = halted {
            return Err(e.into());
        }
        first_error.map_or(Ok(()), Err)
    }

    fn dispatch_command(
        &mut self,
        addr: SocketAddr,
        sent_time: u16,
        command: Command,
        now: Instant,
        events: &mut Vec<Event>,
    ) -> Result<(), EnetError> {
        let channel = command.channel_id;
        let seq = command.reliable_sequence;
        tracing::trace!(
            peer = %addr,
            command = command.kind.id(),
            channel,
            seq = seq.value(),
            "dispatch"
        );

        if let CommandKind::Connect(connect) = &command.kind {
            self.handle_connect(addr, connect, seq, now, events)?;
        }
        let Some(peer) = self.peers.get_mut(&addr) else {
            tracing::trace!(peer = %addr, "command without a connection");
            return Ok(());
        };
        if !peer.has_channel(channel) {
            return Err(EnetError::InvalidChannel(channel));
        }
        let reliable = command.wants_ack();
        if reliable {
            match peer.classify_reliable(channel, seq)? {
                Arrival::Fresh => {}
                Arrival::Duplicate => {
                    tracing::trace!(peer = %addr, channel, seq = seq.value(), "duplicate");
                    peer.queue_acknowledgement(channel, seq, sent_time);
                    return Ok(());
                }
                Arrival::OutOfWindow => {
                    tracing::debug!(peer = %addr, channel, seq = seq.value(), "reliable command out of window");
                    return Ok(());
                }
            }
        }

        let id = peer.id();
        let outcome = match command.kind {
            CommandKind::Connect(_) | CommandKind::VerifyConnect(_) | CommandKind::Ping(_) => Ok(None),
            CommandKind::Acknowledge(ack) => {
                peer.handle_acknowledge(channel, &ack);
                Ok(None)
            }
            CommandKind::Disconnect(_) => {
                if reliable {
                    peer.queue_acknowledgement(channel, seq, sent_time);
                }
                self.flush_peer(addr, now);
                self.remove_peer(addr);
                tracing::debug!(peer = %addr, id = %id, "peer closed the connection");
                events.push(Event::Disconnected {
                    peer: id,
                    addr,
                    reason: DisconnectReason::ClosedByRemotePeer,
                });
                return Ok(());
            }
            CommandKind::SendReliable(body) => Ok(Some(body.data)),
            CommandKind::SendUnreliable(body) => Ok(Some(body.data)),
            CommandKind::SendUnsequenced(body) => Ok(Some(body.data)),
            CommandKind::SendFragment(fragment) => {
                peer.handle_fragment(channel, &fragment, now, &mut self.budget)
            }
            CommandKind::SendUnreliableFragment(_) => {
                tracing::trace!(peer = %addr, "unreliable fragment discarded");
                Ok(None)
            }
            CommandKind::BandwidthLimit(limit) => {
                peer.handle_bandwidth_limit(&limit);
                Ok(None)
            }
            CommandKind::ThrottleConfigure(throttle) => {
                peer.handle_throttle_configure(&throttle);
                Ok(None)
            }
        };

        // A malformed fragment is consumed: acknowledged and recorded so the
        // sender stops resending it. Any other failure leaves the command
        // unacknowledged for a later retry.
        let (payload, discarded) = match outcome {
            Ok(payload) => (payload, None),
            Err(e @ EnetError::InvalidFragmentDescriptor(_)) => (None, Some(e)),
            Err(e) => return Err(e),
        };

        if reliable {
            peer.queue_acknowledgement(channel, seq, sent_time);
            for payload in peer.release_reliable(channel, seq, payload)? {
                events.push(Event::Received { peer: id, channel, payload });
            }
        } else if let Some(payload) = payload {
            events.push(Event::Received { peer: id, channel, payload });
        }
        discarded.map_or(Ok(()), Err)
    }

    fn handle_connect(
        &mut self,
        addr: SocketAddr,
        connect: &Connect,
        seq: Sequence16,
        now: Instant,
        events: &mut Vec<Event>,
    ) -> Result<(), EnetError> {
        if let Some(peer) = self.peers.get_mut(&addr) {
            if peer.connect_id() == connect.connect_id {
                tracing::trace!(peer = %addr, "repeated connect");
                return Ok(());
            }
            let id = peer.id();
            events.push(Event::Disconnected {
                peer: id,
                addr,
                reason: DisconnectReason::Reconnected,
            });
            peer.connect(connect, &self.config, now, &mut self.budget);
            peer.sync_control_sequence(seq);
            tracing::debug!(peer = %addr, id = %id, mtu = peer.mtu(), "peer reconnected");
            events.push(Event::Connected {
                peer: id,
                addr,
                data: connect.data,
            });
            return Ok(());
        }

        if self.peers.len() >= self.config.max_peers {
            tracing::warn!(peer = %addr, max = self.config.max_peers, "refusing connection: peer limit");
            return Err(EnetError::ResourceExhausted(Resource::Peers));
        }
        let id = self.allocate_id().inspect_err(|_| {
            tracing::warn!(peer = %addr, "refusing connection: peer id space exhausted");
        })?;

        let mut peer = Peer::new(id, addr, &self.config, now);
        peer.connect(connect, &self.config, now, &mut self.budget);
        peer.sync_control_sequence(seq);
        tracing::debug!(
            peer = %addr,
            id = %id,
            mtu = peer.mtu(),
            channels = peer.channel_count(),
            "peer connected"
        );
        self.ids.insert(id, addr);
        self.peers.insert(addr, peer);
        events.push(Event::Connected {
            peer: id,
            addr,
            data: connect.data,
        });
        Ok(())
    }

    /// Ids are handed out once, counting up from 1. Freed ids are not
    /// reused; the host refuses new peers once the counter would reach
    /// [`MAXIMUM_PEER_ID`].
    fn allocate_id(&mut self) -> Result<PeerId, EnetError> {
        if self.next_id >= MAXIMUM_PEER_ID {
            return Err(EnetError::IdSpaceExhausted);
        }
        let id = PeerId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn connected_addr(&self, id: PeerId) -> Result<SocketAddr, EnetError> {
        let addr = *self.ids.get(&id).ok_or(EnetError::UnknownPeer(id))?;
        match self.peers.get(&addr) {
            Some(peer) if peer.is_connected() => Ok(addr),
            Some(_) => Err(EnetError::NotConnected(id)),
            None => Err(EnetError::UnknownPeer(id)),
        }
    }

    /// Queue a reliable message to `peer`, fragmenting it when it exceeds
    /// the peer's MTU. Returns the number of commands queued.
    pub fn send(
        &mut self,
        peer: PeerId,
        message: impl Into<Message>,
        now: Instant,
    ) -> Result<usize, EnetError> {
        let message = message.into();
        let addr = self.connected_addr(peer)?;
        let fragment_size = self.config.fragment_size;
        let queued = self
            .peers
            .get_mut(&addr)
            .ok_or(EnetError::UnknownPeer(peer))?
            .queue_send(message.channel, message.buffer, fragment_size)?;
        self.flush_peer(addr, now);
        Ok(queued)
    }

    /// Reliable send on channel 0.
    pub fn send_reliable(
        &mut self,
        peer: PeerId,
        payload: impl Into<Bytes>,
        now: Instant,
    ) -> Result<usize, EnetError> {
        self.send(peer, Message::new(payload), now)
    }

    /// Send as SEND_FRAGMENT commands regardless of size.
    pub fn send_fragmented(
        &mut self,
        peer: PeerId,
        message: impl Into<Message>,
        now: Instant,
    ) -> Result<usize, EnetError> {
        let message = message.into();
        let addr = self.connected_addr(peer)?;
        let fragment_size = self.config.fragment_size;
        let queued = self
            .peers
            .get_mut(&addr)
            .ok_or(EnetError::UnknownPeer(peer))?
            .queue_fragmented(message.channel, message.buffer, fragment_size)?;
        self.flush_peer(addr, now);
        Ok(queued)
    }

    /// Send `message` to every connected peer. Returns how many were reached.
    pub fn broadcast(&mut self, message: impl Into<Message>, now: Instant) -> usize {
        let message = message.into();
        let fragment_size = self.config.fragment_size;
        let addrs: Vec<SocketAddr> = self
            .peers
            .values()
            .filter(|peer| peer.is_connected())
            .map(Peer::addr)
            .collect();

        let mut reached = 0;
        for addr in addrs {
            let Some(peer) = self.peers.get_mut(&addr) else {
                continue;
            };
            match peer.queue_send(message.channel, message.buffer.clone(), fragment_size) {
                Ok(_) => {
                    reached += 1;
                    self.flush_peer(addr, now);
                }
                Err(e) => tracing::warn!(peer = %addr, error = ?e, "broadcast skipped peer"),
            }
        }
        reached
    }

    /// Send DISCONNECT to `peer` and forget it.
    pub fn disconnect(&mut self, peer: PeerId, data: u32, now: Instant) -> Result<Event, EnetError> {
        let addr = *self.ids.get(&peer).ok_or(EnetError::UnknownPeer(peer))?;
        if let Some(state) = self.peers.get_mut(&addr) {
            state.queue_disconnect(data);
        }
        self.flush_peer(addr, now);
        self.remove_peer(addr);
        tracing::debug!(peer = %addr, id = %peer, "peer disconnected locally");
        Ok(Event::Disconnected {
            peer,
            addr,
            reason: DisconnectReason::ClosedLocally,
        })
    }

    /// Periodic maintenance: drop silent peers, resend unacknowledged
    /// commands, reap stale fragment groups and ping idle peers.
    pub fn sweep(&mut self, now: Instant) -> Vec<Event> {
        let peer_timeout = self.config.peer_timeout;
        let fragment_timeout = self.config.fragment_timeout;
        let ping_interval = self.config.ping_interval;
        let max_rto = self.config.max_rto;
        let max_retransmits = self.config.max_retransmits;

        let mut dead = Vec::new();
        for (addr, peer) in self.peers.iter_mut() {
            if now.saturating_duration_since(peer.last_receive()) >= peer_timeout {
                dead.push((*addr, DisconnectReason::TimedOut));
                continue;
            }
            if peer.collect_retransmits(now, max_rto, max_retransmits) == RetransmitStatus::Exhausted {
                dead.push((*addr, DisconnectReason::RetransmitLimit));
                continue;
            }
            let reaped = peer.reap_fragments(now, fragment_timeout, &mut self.budget);
            if reaped > 0 {
                tracing::debug!(peer = %addr, groups = reaped, "reaped stale fragment groups");
            }
            if peer.unacked_count() == 0
                && now.saturating_duration_since(peer.last_send()) >= ping_interval
            {
                peer.queue_ping();
            }
        }

        let mut events = Vec::with_capacity(dead.len());
        for (addr, reason) in dead {
            if let Some(peer) = self.remove_peer(addr) {
                tracing::debug!(peer = %addr, id = %peer.id(), reason = ?reason, "peer dropped");
                events.push(Event::Disconnected {
                    peer: peer.id(),
                    addr,
                    reason,
                });
            }
        }

        let addrs: Vec<SocketAddr> = self.peers.keys().copied().collect();
        for addr in addrs {
            self.flush_peer(addr, now);
        }
        events
    }

    pub fn pop_transmit(&mut self) -> Option<Transmit> {
        self.transmits.pop_front()
    }

    pub fn drain_transmits(&mut self) -> impl Iterator<Item = Transmit> + '_ {
        self.transmits.drain(..)
    }

    pub fn has_transmits(&self) -> bool {
        !self.transmits.is_empty()
    }

    fn flush_peer(&mut self, addr: SocketAddr, now: Instant) {
        let sent_time = self.sent_time(now);
        if let Some(peer) = self.peers.get_mut(&addr) {
            for payload in peer.flush(now, sent_time) {
                self.transmits.push_back(Transmit { addr, payload });
            }
        }
    }

    fn remove_peer(&mut self, addr: SocketAddr) -> Option<Peer> {
        let mut peer = self.peers.remove(&addr)?;
        self.ids.remove(&peer.id());
        peer.close(&mut self.budget);
        Some(peer)
    }

    /// Milliseconds since the host started, truncated to 16 bits.
    fn sent_time(&self, now: Instant) -> u16 {
        (now.saturating_duration_since(self.epoch).as_millis() & 0xFFFF) as u16
    }
}
