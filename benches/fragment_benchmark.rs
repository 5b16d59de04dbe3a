use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use tokio_enet::protocol::{
    constants::CONTROL_CHANNEL,
    packet::{Command, Connect, SendFragment},
    types::{DatagramHeader, Sequence16},
};
use tokio_enet::session::{FragmentAssembler, ReassemblyBudget};
use tokio_enet::transport::{Host, encode_datagram};
use tokio_enet::{Config, Event, PeerId};

const PAYLOAD_SIZES: [usize; 3] = [4 * 1024, 64 * 1024, 512 * 1024];
const CHUNK: usize = 1024;

fn connected_host() -> (Host, PeerId) {
    let mut host = Host::new(Config::default());
    let connect = Connect {
        outgoing_peer_id: 0,
        incoming_session_id: 0xFF,
        outgoing_session_id: 0xFF,
        mtu: 1400,
        window_size: 32768,
        channel_count: 1,
        incoming_bandwidth: 0,
        outgoing_bandwidth: 0,
        packet_throttle_interval: 5000,
        packet_throttle_acceleration: 2,
        packet_throttle_deceleration: 2,
        connect_id: 1,
        data: 0,
    };
    let datagram = encode_datagram(
        &DatagramHeader::unassigned(0),
        &[Command::new(connect, CONTROL_CHANNEL, Sequence16::new(1)).acknowledged()],
    );
    let addr: SocketAddr = "127.0.0.1:17091".parse().unwrap();
    let events = host.process_inbound(&datagram, addr, Instant::now());
    let peer = match events.first() {
        Some(Event::Connected { peer, .. }) => *peer,
        other => panic!("handshake failed: {other:?}"),
    };
    host.drain_transmits().for_each(drop);
    (host, peer)
}

fn split(payload: &Bytes) -> Vec<SendFragment> {
    let count = payload.len().div_ceil(CHUNK) as u32;
    payload
        .chunks(CHUNK)
        .enumerate()
        .map(|(i, chunk)| SendFragment {
            start_sequence: 1,
            fragment_count: count,
            fragment_number: i as u32,
            total_length: payload.len() as u32,
            fragment_offset: (i * CHUNK) as u32,
            data: Bytes::copy_from_slice(chunk),
        })
        .collect()
}

fn bench_fragment_send(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_send");

    for &size in &PAYLOAD_SIZES {
        let payload = Bytes::from(vec![0x5A; size]);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("split_and_flush_{size}b"), |b| {
            b.iter_batched(
                connected_host,
                |(mut host, peer)| {
                    let queued = host.send(peer, payload.clone(), Instant::now()).unwrap();
                    assert!(queued > 1);
                    host.drain_transmits().count()
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_reassembly");

    for &size in &PAYLOAD_SIZES {
        let payload = Bytes::from(vec![0xA5; size]);
        let fragments = split(&payload);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("in_order_{size}b"), |b| {
            b.iter(|| {
                let mut budget = ReassemblyBudget::new(4 * 1024 * 1024);
                let mut assembler = FragmentAssembler::new(8, 1024 * 1024);
                let now = Instant::now();
                let mut done = None;
                for fragment in &fragments {
                    done = assembler.add(0, fragment, now, &mut budget).unwrap();
                }
                assert_eq!(done.map(|p| p.len()), Some(size));
            })
        });

        group.bench_function(format!("reversed_{size}b"), |b| {
            b.iter(|| {
                let mut budget = ReassemblyBudget::new(4 * 1024 * 1024);
                let mut assembler = FragmentAssembler::new(8, 1024 * 1024);
                let now = Instant::now();
                let mut done = None;
                for fragment in fragments.iter().rev() {
                    done = assembler.add(0, fragment, now, &mut budget).unwrap();
                }
                assert_eq!(done.map(|p| p.len()), Some(size));
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fragment_send, bench_reassembly);
criterion_main!(benches);
