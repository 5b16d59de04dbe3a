use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio_enet::{
    Config, DisconnectReason, EnetError, Event, PeerId, Resource,
    protocol::{
        constants::{CONTROL_CHANNEL, HeaderFlags, MAXIMUM_PEER_ID},
        packet::{
            Acknowledge, Command, CommandKind, Connect, DecodeError, Disconnect, SendFragment,
            SendReliable, SendUnreliable, VerifyConnect,
        },
        types::{DatagramHeader, Sequence16},
    },
    transport::{Datagram, Host, Message, encode_datagram},
};

/// A scripted remote endpoint.
struct Client {
    addr: SocketAddr,
    id: PeerId,
    session: u8,
    sequences: [u16; 256],
}

impl Client {
    fn datagram(&self, commands: &[Command]) -> Bytes {
        header_datagram(self.id.value(), self.session, commands)
    }

    fn reliable(&mut self, channel: u8, kind: impl Into<CommandKind>) -> Command {
        let seq = &mut self.sequences[channel as usize];
        *seq = seq.wrapping_add(1);
        Command::new(kind, channel, Sequence16::new(*seq)).acknowledged()
    }
}

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn header_datagram(peer_id: u16, session_id: u8, commands: &[Command]) -> Bytes {
    let header = DatagramHeader {
        peer_id,
        session_id,
        flags: HeaderFlags::SENT_TIME,
        sent_time: 0x0102,
    };
    encode_datagram(&header, commands)
}

fn connect_command(mtu: u32, connect_id: u32) -> Command {
    let connect = Connect {
        outgoing_peer_id: 0,
        incoming_session_id: 0xFF,
        outgoing_session_id: 0xFF,
        mtu,
        window_size: 32768,
        channel_count: 2,
        incoming_bandwidth: 0,
        outgoing_bandwidth: 0,
        packet_throttle_interval: 5000,
        packet_throttle_acceleration: 2,
        packet_throttle_deceleration: 2,
        connect_id,
        data: 7,
    };
    Command::new(connect, CONTROL_CHANNEL, Sequence16::new(1)).acknowledged()
}

fn drain(host: &mut Host) -> Vec<(SocketAddr, Datagram)> {
    host.drain_transmits()
        .map(|t| {
            let (datagram, halted) = Datagram::decode(&t.payload).unwrap();
            assert!(halted.is_none());
            (t.addr, datagram)
        })
        .collect()
}

fn commands(host: &mut Host) -> Vec<Command> {
    drain(host)
        .into_iter()
        .flat_map(|(_, d)| d.commands)
        .collect()
}

/// CONNECT, read the VerifyConnect, acknowledge it.
fn handshake(host: &mut Host, addr: SocketAddr, mtu: u32, now: Instant) -> (Client, VerifyConnect) {
    let events = host.process_inbound(
        &header_datagram(MAXIMUM_PEER_ID, 0, &[connect_command(mtu, 0xAABBCCDD)]),
        addr,
        now,
    );
    let id = match events.as_slice() {
        [Event::Connected { peer, .. }] => *peer,
        other => panic!("unexpected events {other:?}"),
    };

    let (verify_seq, verify) = commands(host)
        .into_iter()
        .find_map(|c| match c.kind {
            CommandKind::VerifyConnect(v) => Some((c.reliable_sequence, v)),
            _ => None,
        })
        .expect("verify connect");

    let mut client = Client {
        addr,
        id,
        session: verify.outgoing_session_id,
        sequences: [0; 256],
    };
    // the CONNECT took the first control sequence
    client.sequences[CONTROL_CHANNEL as usize] = 1;
    let ack = Command::new(
        Acknowledge {
            received_reliable_sequence: verify_seq.value(),
            received_sent_time: 0,
        },
        CONTROL_CHANNEL,
        verify_seq,
    );
    assert!(host.process_inbound(&client.datagram(&[ack]), addr, now).is_empty());
    assert!(drain(host).is_empty());
    (client, verify)
}

fn fragments(payload: &[u8], chunk: usize, first_seq: u16, channel: u8) -> Vec<Command> {
    let count = payload.len().div_ceil(chunk);
    payload
        .chunks(chunk)
        .enumerate()
        .map(|(i, data)| {
            let fragment = SendFragment {
                start_sequence: first_seq,
                fragment_count: count as u32,
                fragment_number: i as u32,
                total_length: payload.len() as u32,
                fragment_offset: (i * chunk) as u32,
                data: Bytes::copy_from_slice(data),
            };
            Command::new(fragment, channel, Sequence16::new(first_seq + i as u16)).acknowledged()
        })
        .collect()
}

#[test]
fn connect_creates_peer_and_echoes_verify() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let a = addr(5000);

    let events = host.process_inbound(
        &header_datagram(MAXIMUM_PEER_ID, 0, &[connect_command(1200, 0xAABBCCDD)]),
        a,
        now,
    );
    assert_eq!(
        events,
        vec![Event::Connected {
            peer: PeerId(1),
            addr: a,
            data: 7
        }]
    );
    assert_eq!(host.peer(PeerId(1)).unwrap().mtu(), 1200);

    let sent = drain(&mut host);
    assert_eq!(sent.len(), 1);
    let (to, datagram) = &sent[0];
    assert_eq!(*to, a);
    assert_eq!(datagram.header.peer_id, 0);

    // the CONNECT is acknowledged ahead of the reply
    let CommandKind::Acknowledge(ack) = &datagram.commands[0].kind else {
        panic!("expected acknowledge first");
    };
    assert_eq!(ack.received_reliable_sequence, 1);
    assert_eq!(ack.received_sent_time, 0x0102);

    let CommandKind::VerifyConnect(verify) = &datagram.commands[1].kind else {
        panic!("expected verify connect");
    };
    assert!(datagram.commands[1].wants_ack());
    assert_eq!(verify.connect_id, 0xAABBCCDD);
    assert_eq!(verify.mtu, 1200);
    assert_eq!(verify.outgoing_peer_id, 1);
}

#[test]
fn verify_mtu_is_capped() {
    for (i, requested) in [576u32, 1200, 1400, 4096, 5000, 65535].into_iter().enumerate() {
        let mut host = Host::new(Config::default());
        let (_, verify) = handshake(&mut host, addr(6000 + i as u16), requested, Instant::now());
        assert_eq!(verify.mtu, requested.min(4096));
    }
}

#[test]
fn large_send_is_split_into_fragments() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5001), 1400, now);

    let payload: Vec<u8> = (0..5000u32).map(|i| i as u8).collect();
    assert_eq!(host.send_reliable(client.id, payload.clone(), now).unwrap(), 5);

    let sent = commands(&mut host);
    let mut sequences = Vec::new();
    let mut sizes = Vec::new();
    let mut rebuilt = Vec::new();
    for command in &sent {
        let CommandKind::SendFragment(fragment) = &command.kind else {
            panic!("expected only fragments");
        };
        assert_eq!(fragment.start_sequence, sent[0].reliable_sequence.value());
        assert_eq!(fragment.fragment_count, 5);
        sequences.push(command.reliable_sequence.value());
        sizes.push(fragment.data.len());
        rebuilt.extend_from_slice(&fragment.data);
    }
    assert_eq!(sizes, vec![1024, 1024, 1024, 1024, 904]);
    sequences.dedup();
    assert_eq!(sequences.len(), 5);
    assert_eq!(rebuilt, payload);
}

#[test]
fn reversed_and_duplicated_fragments_yield_one_payload() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5002), 1400, now);

    let payload: Vec<u8> = (0..5000u32).map(|i| (i * 7) as u8).collect();
    let mut sends = fragments(&payload, 1024, 1, 0);
    sends.reverse();
    let dup = sends[2].clone();
    sends.insert(1, dup);

    let mut received = Vec::new();
    for command in &sends {
        received.extend(host.process_inbound(&client.datagram(&[command.clone()]), client.addr, now));
    }
    assert_eq!(
        received,
        vec![Event::Received {
            peer: client.id,
            channel: 0,
            payload: Bytes::from(payload),
        }]
    );
    assert_eq!(host.reassembly_bytes(), 0);

    let acks = commands(&mut host)
        .into_iter()
        .filter(|c| matches!(c.kind, CommandKind::Acknowledge(_)))
        .count();
    assert_eq!(acks, sends.len());
}

#[test]
fn duplicate_reliable_is_acked_but_delivered_once() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (mut client, _) = handshake(&mut host, addr(5003), 1400, now);

    let command = client.reliable(1, SendReliable { data: Bytes::from_static(b"once") });
    let first = host.process_inbound(&client.datagram(&[command.clone()]), client.addr, now);
    let second = host.process_inbound(&client.datagram(&[command]), client.addr, now);
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());

    let acks: Vec<Command> = commands(&mut host);
    assert_eq!(acks.len(), 2);
    assert!(acks.iter().all(|c| c.channel_id == 1));
}

#[test]
fn truncated_datagram_keeps_prior_commands_and_other_peers() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (mut a, _) = handshake(&mut host, addr(5004), 1400, now);
    let (mut b, _) = handshake(&mut host, addr(5005), 1400, now);

    let good = a.reliable(0, SendReliable { data: Bytes::from_static(b"kept") });
    let cut = a.reliable(0, SendReliable { data: Bytes::from_static(b"lost payload") });
    let bytes = a.datagram(&[good, cut]);

    let mut events = Vec::new();
    let result = host.try_process_inbound(&bytes[..bytes.len() - 4], a.addr, now, &mut events);
    assert!(matches!(
        result,
        Err(EnetError::Decode(DecodeError::TruncatedCommand { command: 6 }))
    ));
    assert_eq!(events.len(), 1);
    assert_eq!(host.peer_count(), 2);

    let from_b = b.reliable(0, SendReliable { data: Bytes::from_static(b"fine") });
    let events = host.process_inbound(&b.datagram(&[from_b]), b.addr, now);
    assert_eq!(
        events,
        vec![Event::Received {
            peer: b.id,
            channel: 0,
            payload: Bytes::from_static(b"fine"),
        }]
    );
}

#[test]
fn malformed_and_mismatched_datagrams_are_dropped() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (mut client, _) = handshake(&mut host, addr(5006), 1400, now);

    let mut events = Vec::new();
    assert!(matches!(
        host.try_process_inbound(&[0x80, 0x00, 0x01], client.addr, now, &mut events),
        Err(EnetError::Decode(DecodeError::MalformedHeader))
    ));
    assert!(events.is_empty());

    let command = client.reliable(0, SendReliable { data: Bytes::from_static(b"x") });
    let wrong_session = header_datagram(client.id.value(), (client.session + 1) & 3, &[command.clone()]);
    assert!(host.process_inbound(&wrong_session, client.addr, now).is_empty());
    let wrong_id = header_datagram(client.id.value() + 1, client.session, &[command]);
    assert!(host.process_inbound(&wrong_id, client.addr, now).is_empty());

    // unknown address that already claims a peer id
    assert!(host.process_inbound(&wrong_id, addr(5999), now).is_empty());
    assert!(drain(&mut host).is_empty());
    assert_eq!(host.peer_count(), 1);
}

#[test]
fn unknown_channel_is_rejected() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (mut client, _) = handshake(&mut host, addr(5007), 1400, now);

    let command = client.reliable(5, SendReliable { data: Bytes::from_static(b"x") });
    let mut events = Vec::new();
    assert!(matches!(
        host.try_process_inbound(&client.datagram(&[command]), client.addr, now, &mut events),
        Err(EnetError::InvalidChannel(5))
    ));
    assert!(events.is_empty());
}

#[test]
fn unreliable_payloads_are_delivered() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5008), 1400, now);

    let command = Command::new(
        SendUnreliable {
            unreliable_sequence: 1,
            data: Bytes::from_static(b"fast"),
        },
        0,
        Sequence16::default(),
    );
    let events = host.process_inbound(&client.datagram(&[command]), client.addr, now);
    assert_eq!(events.len(), 1);
    assert!(drain(&mut host).is_empty());
}

#[test]
fn reconnect_replaces_session_and_keeps_id() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5009), 1400, now);

    let events = host.process_inbound(
        &header_datagram(MAXIMUM_PEER_ID, 0, &[connect_command(1400, 0x1234)]),
        client.addr,
        now,
    );
    assert_eq!(
        events,
        vec![
            Event::Disconnected {
                peer: client.id,
                addr: client.addr,
                reason: DisconnectReason::Reconnected,
            },
            Event::Connected {
                peer: client.id,
                addr: client.addr,
                data: 7,
            },
        ]
    );
    assert_eq!(host.peer_count(), 1);
    assert_ne!(host.peer(client.id).unwrap().incoming_session_id(), client.session);
}

#[test]
fn remote_disconnect_is_acked_and_removes_peer() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (mut client, _) = handshake(&mut host, addr(5010), 1400, now);

    let command = client.reliable(CONTROL_CHANNEL, Disconnect { data: 0 });
    let events = host.process_inbound(&client.datagram(&[command]), client.addr, now);
    assert_eq!(
        events,
        vec![Event::Disconnected {
            peer: client.id,
            addr: client.addr,
            reason: DisconnectReason::ClosedByRemotePeer,
        }]
    );
    assert_eq!(host.peer_count(), 0);
    assert!(matches!(commands(&mut host)[0].kind, CommandKind::Acknowledge(_)));
}

#[test]
fn local_disconnect_and_broadcast() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (a, _) = handshake(&mut host, addr(5011), 1400, now);
    let (b, _) = handshake(&mut host, addr(5012), 1400, now);

    assert_eq!(host.broadcast("hello all", now), 2);
    let mut targets: Vec<SocketAddr> = drain(&mut host).into_iter().map(|(to, _)| to).collect();
    targets.sort();
    assert_eq!(targets, vec![a.addr, b.addr]);

    let event = host.disconnect(a.id, 42, now).unwrap();
    assert_eq!(
        event,
        Event::Disconnected {
            peer: a.id,
            addr: a.addr,
            reason: DisconnectReason::ClosedLocally,
        }
    );
    let sent = commands(&mut host);
    assert!(matches!(sent[0].kind, CommandKind::Disconnect(Disconnect { data: 42 })));
    assert!(host.peer(a.id).is_none());
    assert!(matches!(
        host.send_reliable(a.id, "late", now),
        Err(EnetError::UnknownPeer(_))
    ));
}

#[test]
fn acknowledged_sends_are_not_retransmitted() {
    let config = Config::default().retransmission(Duration::from_millis(100), Duration::from_millis(400), 2);
    let mut host = Host::new(config);
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5013), 1400, now);

    host.send_reliable(client.id, "hello", now).unwrap();
    let sent = commands(&mut host);
    let seq = sent[0].reliable_sequence;
    let ack = Command::new(
        Acknowledge {
            received_reliable_sequence: seq.value(),
            received_sent_time: 0,
        },
        0,
        seq,
    );
    host.process_inbound(&client.datagram(&[ack]), client.addr, now);
    assert_eq!(host.peer(client.id).unwrap().unacked_count(), 0);

    assert!(host.sweep(now + Duration::from_millis(150)).is_empty());
    assert!(drain(&mut host).is_empty());
}

#[test]
fn unacknowledged_sends_retransmit_then_drop_peer() {
    let config = Config::default().retransmission(Duration::from_millis(100), Duration::from_millis(400), 2);
    let mut host = Host::new(config);
    let start = Instant::now();
    let (client, _) = handshake(&mut host, addr(5014), 1400, start);

    host.send_reliable(client.id, "hello", start).unwrap();
    let original = commands(&mut host);

    assert!(host.sweep(start + Duration::from_millis(100)).is_empty());
    assert_eq!(commands(&mut host), original);

    assert!(host.sweep(start + Duration::from_millis(300)).is_empty());
    assert_eq!(commands(&mut host), original);

    let events = host.sweep(start + Duration::from_secs(1));
    assert_eq!(
        events,
        vec![Event::Disconnected {
            peer: client.id,
            addr: client.addr,
            reason: DisconnectReason::RetransmitLimit,
        }]
    );
    assert_eq!(host.peer_count(), 0);
}

#[test]
fn idle_peers_are_pinged_then_timed_out() {
    let config = Config::default()
        .ping_interval(Duration::from_millis(500))
        .peer_timeout(Duration::from_secs(2));
    let mut host = Host::new(config);
    let start = Instant::now();
    let (client, _) = handshake(&mut host, addr(5015), 1400, start);

    assert!(host.sweep(start + Duration::from_millis(600)).is_empty());
    let sent = commands(&mut host);
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0].kind, CommandKind::Ping(_)));
    assert_eq!(sent[0].channel_id, CONTROL_CHANNEL);

    let events = host.sweep(start + Duration::from_secs(3));
    assert_eq!(
        events,
        vec![Event::Disconnected {
            peer: client.id,
            addr: client.addr,
            reason: DisconnectReason::TimedOut,
        }]
    );
}

#[test]
fn peer_limit_refuses_new_connections() {
    let mut host = Host::new(Config::default().max_peers(1));
    let now = Instant::now();
    handshake(&mut host, addr(5016), 1400, now);

    let mut events = Vec::new();
    let result = host.try_process_inbound(
        &header_datagram(MAXIMUM_PEER_ID, 0, &[connect_command(1400, 9)]),
        addr(5017),
        now,
        &mut events,
    );
    assert!(matches!(result, Err(EnetError::ResourceExhausted(Resource::Peers))));
    assert!(events.is_empty());
    assert!(drain(&mut host).is_empty());
    assert_eq!(host.peer_count(), 1);
}

#[test]
fn fragment_groups_and_memory_are_bounded() {
    let mut host = Host::new(Config::default().max_fragment_groups_per_peer(1));
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5018), 1400, now);

    let payload = vec![1u8; 2000];
    let first = fragments(&payload, 1000, 1, 0);
    let second = fragments(&payload, 1000, 3, 0);
    assert!(host.process_inbound(&client.datagram(&first[..1]), client.addr, now).is_empty());

    let mut events = Vec::new();
    let result = host.try_process_inbound(&client.datagram(&second[..1]), client.addr, now, &mut events);
    assert!(matches!(result, Err(EnetError::ResourceExhausted(Resource::FragmentGroups))));

    let mut host = Host::new(Config::default().max_reassembly_bytes(3000));
    let (client, _) = handshake(&mut host, addr(5019), 1400, now);
    assert!(host.process_inbound(&client.datagram(&first[..1]), client.addr, now).is_empty());
    let result = host.try_process_inbound(&client.datagram(&second[..1]), client.addr, now, &mut events);
    assert!(matches!(result, Err(EnetError::ResourceExhausted(Resource::ReassemblyMemory))));
    assert_eq!(host.reassembly_bytes(), 2000);
}

#[test]
fn invalid_fragment_is_discarded_and_stale_groups_reaped() {
    let config = Config::default().fragment_timeout(Duration::from_secs(1));
    let mut host = Host::new(config);
    let start = Instant::now();
    let (client, _) = handshake(&mut host, addr(5020), 1400, start);

    let payload = vec![9u8; 3000];
    let mut bad = fragments(&payload, 1000, 1, 0);
    if let CommandKind::SendFragment(fragment) = &mut bad[0].kind {
        fragment.fragment_offset = 2500;
    }
    let mut events = Vec::new();
    assert!(matches!(
        host.try_process_inbound(&client.datagram(&bad[..1]), client.addr, start, &mut events),
        Err(EnetError::InvalidFragmentDescriptor(_))
    ));
    assert_eq!(host.reassembly_bytes(), 0);

    let good = fragments(&payload, 1000, 2, 0);
    host.process_inbound(&client.datagram(&good[..1]), client.addr, start);
    assert_eq!(host.reassembly_bytes(), 3000);
    assert_eq!(host.peer(client.id).unwrap().pending_fragment_groups(), 1);

    // keep the peer alive past the fragment timeout
    let later = start + Duration::from_secs(2);
    host.process_inbound(&client.datagram(&[]), client.addr, later);
    host.sweep(later);
    assert_eq!(host.reassembly_bytes(), 0);
    assert_eq!(host.peer(client.id).unwrap().pending_fragment_groups(), 0);
}

fn acks(sent: &[Command]) -> Vec<u16> {
    sent.iter()
        .filter_map(|c| match &c.kind {
            CommandKind::Acknowledge(ack) => Some(ack.received_reliable_sequence),
            _ => None,
        })
        .collect()
}

#[test]
fn refused_fragment_is_not_acked_and_succeeds_on_retry() {
    let mut host = Host::new(Config::default().max_fragment_groups_per_peer(1));
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5021), 1400, now);

    let one = vec![1u8; 2000];
    let two = vec![2u8; 2000];
    let first = fragments(&one, 1000, 1, 0);
    let second = fragments(&two, 1000, 3, 0);

    assert!(host.process_inbound(&client.datagram(&first[..1]), client.addr, now).is_empty());
    assert_eq!(acks(&commands(&mut host)), vec![1]);

    let mut events = Vec::new();
    let result = host.try_process_inbound(&client.datagram(&second[..1]), client.addr, now, &mut events);
    assert!(matches!(result, Err(EnetError::ResourceExhausted(Resource::FragmentGroups))));
    assert!(events.is_empty());
    assert!(drain(&mut host).is_empty());

    let events = host.process_inbound(&client.datagram(&first[1..]), client.addr, now);
    assert_eq!(
        events,
        vec![Event::Received {
            peer: client.id,
            channel: 0,
            payload: Bytes::from(one),
        }]
    );

    // the sender resends the whole unacknowledged group
    let events = host.process_inbound(&client.datagram(&second), client.addr, now);
    assert_eq!(
        events,
        vec![Event::Received {
            peer: client.id,
            channel: 0,
            payload: Bytes::from(two),
        }]
    );
    assert_eq!(acks(&commands(&mut host)), vec![2, 3, 4]);
    assert_eq!(host.reassembly_bytes(), 0);
}

#[test]
fn reliable_payloads_are_delivered_in_sequence_order() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (mut client, _) = handshake(&mut host, addr(5022), 1400, now);

    let first = client.reliable(0, SendReliable { data: Bytes::from_static(b"first") });
    let second = client.reliable(0, SendReliable { data: Bytes::from_static(b"second") });
    let third = client.reliable(0, SendReliable { data: Bytes::from_static(b"third") });

    assert!(host.process_inbound(&client.datagram(&[third]), client.addr, now).is_empty());
    assert!(host.process_inbound(&client.datagram(&[second.clone()]), client.addr, now).is_empty());
    // already held: acknowledged again, still not delivered
    assert!(host.process_inbound(&client.datagram(&[second]), client.addr, now).is_empty());
    assert_eq!(acks(&commands(&mut host)), vec![3, 2, 2]);

    let events = host.process_inbound(&client.datagram(&[first]), client.addr, now);
    let delivered: Vec<Bytes> = events
        .into_iter()
        .map(|event| match event {
            Event::Received { payload, .. } => payload,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(
        delivered,
        vec![
            Bytes::from_static(b"first"),
            Bytes::from_static(b"second"),
            Bytes::from_static(b"third"),
        ]
    );
}

#[test]
fn reorder_buffer_is_bounded_per_channel() {
    let mut host = Host::new(Config::default().max_held_reliable(1));
    let now = Instant::now();
    let (mut client, _) = handshake(&mut host, addr(5023), 1400, now);

    let first = client.reliable(1, SendReliable { data: Bytes::from_static(b"a") });
    let second = client.reliable(1, SendReliable { data: Bytes::from_static(b"b") });
    let third = client.reliable(1, SendReliable { data: Bytes::from_static(b"c") });

    assert!(host.process_inbound(&client.datagram(&[second]), client.addr, now).is_empty());
    let mut events = Vec::new();
    let result = host.try_process_inbound(&client.datagram(&[third.clone()]), client.addr, now, &mut events);
    assert!(matches!(result, Err(EnetError::ResourceExhausted(Resource::ReorderBuffer))));
    assert_eq!(acks(&commands(&mut host)), vec![2]);

    // other channels are unaffected
    let other = client.reliable(0, SendReliable { data: Bytes::from_static(b"z") });
    assert_eq!(host.process_inbound(&client.datagram(&[other]), client.addr, now).len(), 1);

    assert_eq!(host.process_inbound(&client.datagram(&[first]), client.addr, now).len(), 2);
    assert_eq!(host.process_inbound(&client.datagram(&[third]), client.addr, now).len(), 1);
}

#[test]
fn peer_ids_are_never_reused() {
    let mut host = Host::new(Config::default().max_peers(1));
    let now = Instant::now();
    let a = addr(5024);
    let connect = header_datagram(MAXIMUM_PEER_ID, 0, &[connect_command(1400, 1)]);

    for expected in 1..MAXIMUM_PEER_ID {
        let events = host.process_inbound(&connect, a, now);
        let [Event::Connected { peer, .. }] = events.as_slice() else {
            panic!("unexpected events {events:?}");
        };
        assert_eq!(*peer, PeerId(expected));
        host.disconnect(*peer, 0, now).unwrap();
        host.drain_transmits().for_each(drop);
    }

    let mut events = Vec::new();
    let result = host.try_process_inbound(&connect, a, now, &mut events);
    assert!(matches!(result, Err(EnetError::IdSpaceExhausted)));
    assert!(events.is_empty());
    assert_eq!(host.peer_count(), 0);
    assert!(drain(&mut host).is_empty());
}

#[test]
fn control_channel_is_refused_for_sends() {
    let mut host = Host::new(Config::default());
    let now = Instant::now();
    let (client, _) = handshake(&mut host, addr(5025), 1400, now);

    assert!(matches!(
        host.send(client.id, Message::new("x").channel(CONTROL_CHANNEL), now),
        Err(EnetError::InvalidChannel(CONTROL_CHANNEL))
    ));
    assert!(matches!(
        host.send_fragmented(client.id, Message::new("x").channel(CONTROL_CHANNEL), now),
        Err(EnetError::InvalidChannel(CONTROL_CHANNEL))
    ));
    assert!(drain(&mut host).is_empty());
}
