use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::{
    error::EnetError,
    protocol::{
        constants::MAXIMUM_PEER_ID,
        packet::{Acknowledge, BandwidthLimit, SendFragment, ThrottleConfigure},
        types::{DatagramHeader, Sequence16},
    },
};

use super::{Arrival, Peer, ReassemblyBudget, ReliableInbox, Throttle};

impl Peer {
    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_receive = now;
    }

    /// Whether a datagram header may belong to this peer. Headers still
    /// carrying the unassigned id are matched by address alone.
    pub fn accepts_header(&self, header: &DatagramHeader) -> bool {
        header.peer_id == MAXIMUM_PEER_ID
            || (header.peer_id == self.id.value()
                && header.session_id == self.incoming_session_id)
    }

    /// Classify an incoming reliable sequence without recording it.
    pub fn classify_reliable(&self, channel_id: u8, seq: Sequence16) -> Result<Arrival, EnetError> {
        self.channel(channel_id)
            .ok_or(EnetError::InvalidChannel(channel_id))?
            .incoming
            .classify(seq, self.max_held_reliable)
    }

    /// Record a processed reliable command and return the payloads that
    /// are now deliverable, in sequence order.
    pub fn release_reliable(
        &mut self,
        channel_id: u8,
        seq: Sequence16,
        payload: Option<Bytes>,
    ) -> Result<Vec<Bytes>, EnetError> {
        let channel = self
            .channel_mut(channel_id)
            .ok_or(EnetError::InvalidChannel(channel_id))?;
        Ok(channel.incoming.release(seq, payload))
    }

    /// Align the control channel with the sequence the remote's CONNECT
    /// carried, so that command counts as the first one received.
    pub(crate) fn sync_control_sequence(&mut self, seq: Sequence16) {
        self.control.incoming = ReliableInbox::starting_at(seq);
    }

    /// Retire the unacknowledged command an ACKNOWLEDGE refers to.
    pub fn handle_acknowledge(&mut self, channel_id: u8, ack: &Acknowledge) -> bool {
        let retired = self
            .unacked
            .remove(&(channel_id, ack.received_reliable_sequence))
            .is_some();
        if !retired {
            tracing::trace!(
                peer = %self.addr,
                channel = channel_id,
                seq = ack.received_reliable_sequence,
                "stale acknowledge"
            );
        }
        retired
    }

    /// Feed one fragment to the assembler; yields the payload once complete.
    pub fn handle_fragment(
        &mut self,
        channel_id: u8,
        fragment: &SendFragment,
        now: Instant,
        budget: &mut ReassemblyBudget,
    ) -> Result<Option<Bytes>, EnetError> {
        self.fragments.add(channel_id, fragment, now, budget)
    }

    pub fn handle_bandwidth_limit(&mut self, limit: &BandwidthLimit) {
        self.incoming_bandwidth = limit.incoming_bandwidth;
        self.outgoing_bandwidth = limit.outgoing_bandwidth;
    }

    pub fn handle_throttle_configure(&mut self, throttle: &ThrottleConfigure) {
        self.throttle = Throttle {
            interval: throttle.packet_throttle_interval,
            acceleration: throttle.packet_throttle_acceleration,
            deceleration: throttle.packet_throttle_deceleration,
        };
    }

    pub fn reap_fragments(
        &mut self,
        now: Instant,
        timeout: Duration,
        budget: &mut ReassemblyBudget,
    ) -> usize {
        self.fragments.reap(now, timeout, budget)
    }
}
