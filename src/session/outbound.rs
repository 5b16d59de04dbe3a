use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::{
    error::EnetError,
    protocol::{
        constants::{
            CONTROL_CHANNEL, CommandFlags, DATAGRAM_HEADER_SIZE, FRAGMENT_OVERHEAD,
            HeaderFlags, MAXIMUM_FRAGMENT_COUNT, MAXIMUM_PACKET_COMMANDS, MAXIMUM_PEER_ID,
            RELIABLE_OVERHEAD,
        },
        packet::{
            Acknowledge, Command, CommandKind, Disconnect, EncodeError, Ping, SendFragment,
            SendReliable,
        },
        types::{DatagramHeader, Sequence16},
    },
    transport::datagram::encode_datagram,
};

use super::Peer;

/// A reliable command waiting for its acknowledgement.
#[derive(Debug)]
pub(crate) struct SentCommand {
    command: Command,
    sent_at: Instant,
    rto: Duration,
    attempts: u32,
}

/// Outcome of [`Peer::collect_retransmits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetransmitStatus {
    /// This many commands were queued again.
    Resent(usize),
    /// A command ran out of attempts; the peer should be dropped.
    Exhausted,
}

impl Peer {
    /// Queue `kind` as a reliable command on `channel_id`.
    pub fn queue_reliable(
        &mut self,
        kind: impl Into<CommandKind>,
        channel_id: u8,
    ) -> Result<Sequence16, EnetError> {
        let channel = self
            .channel_mut(channel_id)
            .ok_or(EnetError::InvalidChannel(channel_id))?;
        let seq = channel.next_outgoing();
        self.outgoing
            .push_back(Command::new(kind, channel_id, seq).acknowledged());
        Ok(seq)
    }

    /// Queue a reliable connection-control command.
    pub(crate) fn queue_control(&mut self, kind: impl Into<CommandKind>) -> Sequence16 {
        let seq = self.control.next_outgoing();
        self.outgoing
            .push_back(Command::new(kind, CONTROL_CHANNEL, seq).acknowledged());
        seq
    }

    pub fn queue_ping(&mut self) -> Sequence16 {
        self.queue_control(Ping)
    }

    /// Queue an unacknowledged DISCONNECT; the host forgets the peer right after.
    pub fn queue_disconnect(&mut self, data: u32) {
        let mut command = Command::new(Disconnect { data }, CONTROL_CHANNEL, Sequence16::default());
        command.flags |= CommandFlags::UNSEQUENCED;
        self.outgoing.push_back(command);
    }

    /// Queue an application payload, fragmenting it when a single
    /// SEND_RELIABLE would not fit the peer's MTU. Returns the number of
    /// commands queued.
    ///
    /// The control channel is reserved for connection management and is
    /// refused with [`EnetError::InvalidChannel`].
    pub fn queue_send(
        &mut self,
        channel_id: u8,
        payload: Bytes,
        fragment_size: usize,
    ) -> Result<usize, EnetError> {
        if channel_id == CONTROL_CHANNEL {
            return Err(EnetError::InvalidChannel(channel_id));
        }
        if payload.len() > (self.mtu as usize).saturating_sub(RELIABLE_OVERHEAD) {
            return self.queue_fragmented(channel_id, payload, fragment_size);
        }
        self.queue_reliable(SendReliable { data: payload }, channel_id)?;
        Ok(1)
    }

    /// Split `payload` into SEND_FRAGMENT commands.
    ///
    /// Chunks are `fragment_size` bytes (capped so one fragment fits the
    /// MTU), the last one shorter. Every fragment takes a fresh reliable
    /// sequence; the group's start sequence is the first fragment's.
    pub fn queue_fragmented(
        &mut self,
        channel_id: u8,
        payload: Bytes,
        fragment_size: usize,
    ) -> Result<usize, EnetError> {
        if channel_id == CONTROL_CHANNEL {
            return Err(EnetError::InvalidChannel(channel_id));
        }
        if payload.is_empty() {
            self.queue_reliable(SendReliable { data: payload }, channel_id)?;
            return Ok(1);
        }
        let chunk = fragment_size
            .min((self.mtu as usize).saturating_sub(FRAGMENT_OVERHEAD))
            .max(1);
        let count = payload.len().div_ceil(chunk);
        let total_length = u32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        if count > MAXIMUM_FRAGMENT_COUNT as usize {
            return Err(EncodeError::PayloadTooLarge {
                len: payload.len(),
                max: chunk * MAXIMUM_FRAGMENT_COUNT as usize,
            }
            .into());
        }

        let channel = self
            .channel_mut(channel_id)
            .ok_or(EnetError::InvalidChannel(channel_id))?;
        let start_sequence = channel.peek_outgoing().value();
        let mut sequences = Vec::with_capacity(count);
        for _ in 0..count {
            sequences.push(channel.next_outgoing());
        }

        for (number, seq) in sequences.into_iter().enumerate() {
            let offset = number * chunk;
            let end = (offset + chunk).min(payload.len());
            let fragment = SendFragment {
                start_sequence,
                fragment_count: count as u32,
                fragment_number: number as u32,
                total_length,
                fragment_offset: offset as u32,
                data: payload.slice(offset..end),
            };
            self.outgoing
                .push_back(Command::new(fragment, channel_id, seq).acknowledged());
        }
        Ok(count)
    }

    /// Queue an ACKNOWLEDGE for reliable sequence `seq` on `channel_id`,
    /// echoing the sent time of the datagram that carried it.
    pub fn queue_acknowledgement(&mut self, channel_id: u8, seq: Sequence16, sent_time: u16) {
        let ack = Acknowledge {
            received_reliable_sequence: seq.value(),
            received_sent_time: sent_time,
        };
        self.acknowledgements.push(Command::new(ack, channel_id, seq));
    }

    pub fn has_pending(&self) -> bool {
        !self.acknowledgements.is_empty() || !self.outgoing.is_empty()
    }

    /// Requeue reliable commands whose retransmission timeout elapsed,
    /// doubling each one's timeout up to `max_rto`.
    pub fn collect_retransmits(
        &mut self,
        now: Instant,
        max_rto: Duration,
        max_retransmits: u32,
    ) -> RetransmitStatus {
        let mut resent = 0;
        for sent in self.unacked.values_mut() {
            if now.saturating_duration_since(sent.sent_at) < sent.rto {
                continue;
            }
            if sent.attempts >= max_retransmits {
                return RetransmitStatus::Exhausted;
            }
            sent.attempts += 1;
            sent.rto = (sent.rto * 2).min(max_rto);
            sent.sent_at = now;
            self.outgoing.push_back(sent.command.clone());
            resent += 1;
        }
        RetransmitStatus::Resent(resent)
    }

    /// Pack queued acknowledgements, then queued commands, into datagrams no
    /// larger than the MTU. Reliable commands are recorded as unacknowledged.
    pub fn flush(&mut self, now: Instant, sent_time: u16) -> Vec<Bytes> {
        if !self.has_pending() {
            return Vec::new();
        }
        let header = DatagramHeader {
            peer_id: self.outgoing_peer_id,
            session_id: if self.outgoing_peer_id < MAXIMUM_PEER_ID {
                self.outgoing_session_id
            } else {
                0
            },
            flags: HeaderFlags::SENT_TIME,
            sent_time,
        };
        let mtu = self.mtu as usize;
        let initial_rto = self.initial_rto;

        let pending: Vec<Command> = self
            .acknowledgements
            .drain(..)
            .chain(self.outgoing.drain(..))
            .collect();

        let mut datagrams = Vec::new();
        let mut batch: Vec<Command> = Vec::new();
        let mut size = DATAGRAM_HEADER_SIZE;
        for command in pending {
            let len = command.encoded_len();
            if !batch.is_empty()
                && (size + len > mtu || batch.len() >= MAXIMUM_PACKET_COMMANDS)
            {
                datagrams.push(encode_datagram(&header, &batch));
                batch.clear();
                size = DATAGRAM_HEADER_SIZE;
            }
            if command.wants_ack() {
                self.unacked
                    .entry((command.channel_id, command.reliable_sequence.value()))
                    .and_modify(|sent| sent.sent_at = now)
                    .or_insert_with(|| SentCommand {
                        command: command.clone(),
                        sent_at: now,
                        rto: initial_rto,
                        attempts: 0,
                    });
            }
            size += len;
            batch.push(command);
        }
        if !batch.is_empty() {
            datagrams.push(encode_datagram(&header, &batch));
        }

        self.last_send = now;
        tracing::trace!(peer = %self.addr, id = %self.id, datagrams = datagrams.len(), "flush");
        datagrams
    }
}
