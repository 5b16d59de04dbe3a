use std::collections::BTreeMap;

use bytes::Bytes;

use crate::{
    error::{EnetError, Resource},
    protocol::{constants::RELIABLE_WINDOW, types::Sequence16},
};

/// How an incoming reliable sequence relates to what a channel already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Not seen before and within reach; process it.
    Fresh,
    /// Already delivered or already held. Acknowledge again, do nothing else.
    Duplicate,
    /// Too far ahead of the next expected sequence to be held.
    OutOfWindow,
}

/// Incoming half of a reliable channel.
///
/// Commands are released in sequence order. Anything that arrives ahead of
/// a gap is held, keyed by its wrapping [`Sequence16`], until the gap fills.
/// Every held key lies less than [`RELIABLE_WINDOW`] ahead of `next`, so
/// the wraparound ordering is consistent across the whole map.
#[derive(Debug)]
pub struct ReliableInbox {
    next: Sequence16,
    held: BTreeMap<Sequence16, Option<Bytes>>,
}

impl Default for ReliableInbox {
    fn default() -> Self {
        Self::starting_at(Sequence16::new(1))
    }
}

impl ReliableInbox {
    pub fn starting_at(next: Sequence16) -> Self {
        Self {
            next,
            held: BTreeMap::new(),
        }
    }

    /// The sequence whose arrival releases the next payload.
    pub fn expected(&self) -> Sequence16 {
        self.next
    }

    /// Commands waiting behind a gap.
    pub fn held(&self) -> usize {
        self.held.len()
    }

    /// Classify `seq` without recording it. A fresh sequence ahead of a gap
    /// fails with [`Resource::ReorderBuffer`] once `limit` commands are held.
    pub fn classify(&self, seq: Sequence16, limit: usize) -> Result<Arrival, EnetError> {
        let lead = seq.distance(self.next);
        if lead < 0 || self.held.contains_key(&seq) {
            return Ok(Arrival::Duplicate);
        }
        if lead as u16 >= RELIABLE_WINDOW {
            return Ok(Arrival::OutOfWindow);
        }
        if lead > 0 && self.held.len() >= limit {
            return Err(EnetError::ResourceExhausted(Resource::ReorderBuffer));
        }
        Ok(Arrival::Fresh)
    }

    /// Record a processed command and return every payload that is now in
    /// order. `payload` is `None` for commands that deliver nothing.
    pub fn release(&mut self, seq: Sequence16, payload: Option<Bytes>) -> Vec<Bytes> {
        self.held.insert(seq, payload);
        let mut ready = Vec::new();
        while let Some(payload) = self.held.remove(&self.next) {
            self.next = self.next.next();
            ready.extend(payload);
        }
        ready
    }
}

/// One reliable stream of a peer.
#[derive(Debug, Default)]
pub struct Channel {
    outgoing_reliable: Sequence16,
    pub(crate) incoming: ReliableInbox,
}

impl Channel {
    /// Take the next outgoing reliable sequence. The first call returns 1.
    pub fn next_outgoing(&mut self) -> Sequence16 {
        self.outgoing_reliable = self.outgoing_reliable.next();
        self.outgoing_reliable
    }

    /// Sequence the next call to [`Channel::next_outgoing`] will return.
    pub fn peek_outgoing(&self) -> Sequence16 {
        self.outgoing_reliable.next()
    }
}
