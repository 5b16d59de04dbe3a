use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use crate::{
    error::{EnetError, Resource},
    protocol::{constants::MAXIMUM_FRAGMENT_COUNT, packet::SendFragment},
};

/// Reassembly bytes shared by every peer of a host.
#[derive(Debug)]
pub struct ReassemblyBudget {
    limit: usize,
    used: usize,
}

impl ReassemblyBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    pub fn used(&self) -> usize {
        self.used
    }

    fn reserve(&mut self, bytes: usize) -> Result<(), EnetError> {
        if self.used + bytes > self.limit {
            return Err(EnetError::ResourceExhausted(Resource::ReassemblyMemory));
        }
        self.used += bytes;
        Ok(())
    }

    fn release(&mut self, bytes: usize) {
        self.used = self.used.saturating_sub(bytes);
    }
}

struct FragmentGroup {
    total_length: u32,
    fragment_count: u32,
    received: Vec<u64>,
    received_count: u32,
    buffer: BytesMut,
    last_update: Instant,
}

impl FragmentGroup {
    fn new(total_length: u32, fragment_count: u32, now: Instant) -> Self {
        Self {
            total_length,
            fragment_count,
            received: vec![0; (fragment_count as usize).div_ceil(64)],
            received_count: 0,
            buffer: BytesMut::zeroed(total_length as usize),
            last_update: now,
        }
    }

    fn insert(&mut self, fragment: &SendFragment, now: Instant) {
        let n = fragment.fragment_number as usize;
        let (word, bit) = (n / 64, 1u64 << (n % 64));
        if self.received[word] & bit == 0 {
            self.received[word] |= bit;
            self.received_count += 1;
        }
        let offset = fragment.fragment_offset as usize;
        self.buffer[offset..offset + fragment.data.len()].copy_from_slice(&fragment.data);
        self.last_update = now;
    }

    fn is_complete(&self) -> bool {
        self.received_count == self.fragment_count
    }
}

/// In-flight fragment groups of one peer, keyed by (channel, start sequence).
pub struct FragmentAssembler {
    groups: HashMap<(u8, u16), FragmentGroup>,
    max_groups: usize,
    max_packet_size: usize,
}

impl FragmentAssembler {
    pub fn new(max_groups: usize, max_packet_size: usize) -> Self {
        Self {
            groups: HashMap::new(),
            max_groups,
            max_packet_size,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn validate(&self, fragment: &SendFragment) -> Result<(), EnetError> {
        let count = fragment.fragment_count;
        let total = fragment.total_length;
        if count == 0 || count > MAXIMUM_FRAGMENT_COUNT {
            return Err(EnetError::InvalidFragmentDescriptor("fragment count out of range"));
        }
        if fragment.fragment_number >= count {
            return Err(EnetError::InvalidFragmentDescriptor("fragment number out of range"));
        }
        if total as usize > self.max_packet_size {
            return Err(EnetError::InvalidFragmentDescriptor("total length over limit"));
        }
        if count > total {
            return Err(EnetError::InvalidFragmentDescriptor("more fragments than bytes"));
        }
        if fragment.fragment_offset >= total
            || fragment.data.len() > (total - fragment.fragment_offset) as usize
        {
            return Err(EnetError::InvalidFragmentDescriptor("fragment exceeds total length"));
        }
        Ok(())
    }

    /// Add one fragment; returns the whole payload once the last missing
    /// fragment arrives. Completion removes the group.
    pub fn add(
        &mut self,
        channel: u8,
        fragment: &SendFragment,
        now: Instant,
        budget: &mut ReassemblyBudget,
    ) -> Result<Option<Bytes>, EnetError> {
        self.validate(fragment)?;
        let key = (channel, fragment.start_sequence);

        match self.groups.get(&key) {
            Some(group) => {
                if group.total_length != fragment.total_length
                    || group.fragment_count != fragment.fragment_count
                {
                    return Err(EnetError::InvalidFragmentDescriptor(
                        "descriptor disagrees with group",
                    ));
                }
            }
            None => {
                if self.groups.len() >= self.max_groups {
                    return Err(EnetError::ResourceExhausted(Resource::FragmentGroups));
                }
                budget.reserve(fragment.total_length as usize)?;
                self.groups.insert(
                    key,
                    FragmentGroup::new(fragment.total_length, fragment.fragment_count, now),
                );
            }
        }

        let Some(group) = self.groups.get_mut(&key) else {
            return Ok(None);
        };
        group.insert(fragment, now);
        if !group.is_complete() {
            return Ok(None);
        }

        let group = self.groups.remove(&key);
        Ok(group.map(|g| {
            budget.release(g.total_length as usize);
            g.buffer.freeze()
        }))
    }

    /// Drop groups idle for longer than `timeout`. Returns how many were dropped.
    pub fn reap(&mut self, now: Instant, timeout: Duration, budget: &mut ReassemblyBudget) -> usize {
        let before = self.groups.len();
        self.groups.retain(|_, group| {
            let keep = now.saturating_duration_since(group.last_update) < timeout;
            if !keep {
                budget.release(group.total_length as usize);
            }
            keep
        });
        before - self.groups.len()
    }

    /// Drop every group, returning its bytes to the budget.
    pub fn clear(&mut self, budget: &mut ReassemblyBudget) {
        for (_, group) in self.groups.drain() {
            budget.release(group.total_length as usize);
        }
    }
}
