use std::net::SocketAddr;
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::protocol::state::Event;
use crate::transport::{Host, OutboundMsg};

pub(super) fn dispatch_datagram(
    host: &mut Host,
    bytes: &[u8],
    peer: SocketAddr,
    events_tx: &mpsc::Sender<Event>,
) {
    let events = host.process_inbound(bytes, peer, Instant::now());
    if tracing::enabled!(tracing::Level::TRACE) {
        tracing::trace!(peer = %peer, len = bytes.len(), events = events.len(), "handle_datagram");
    }
    forward_events(events, events_tx);
}

pub(super) fn handle_outgoing_msg(
    host: &mut Host,
    msg: OutboundMsg,
    events_tx: &mpsc::Sender<Event>,
) {
    let now = Instant::now();
    match msg {
        OutboundMsg::Send { peer, message } => {
            let channel = message.channel;
            match host.send(peer, message, now) {
                Ok(commands) => {
                    tracing::trace!(id = %peer, channel, commands, "outbound queued");
                }
                Err(e) => tracing::warn!(id = %peer, error = ?e, "send failed"),
            }
        }
        OutboundMsg::Broadcast { message } => {
            let reached = host.broadcast(message, now);
            tracing::trace!(reached, "broadcast queued");
        }
        OutboundMsg::Disconnect { peer, data } => match host.disconnect(peer, data, now) {
            Ok(event) => forward_events(vec![event], events_tx),
            Err(e) => tracing::warn!(id = %peer, error = ?e, "disconnect failed"),
        },
    }
}

pub(super) fn tick_host(host: &mut Host, events_tx: &mpsc::Sender<Event>) {
    let events = host.sweep(Instant::now());
    forward_events(events, events_tx);
}

/// Write every queued datagram. A failed send is logged and skipped; the
/// peer it was meant for is left as it is.
pub(super) async fn flush_transmits(socket: &UdpSocket, host: &mut Host) {
    while let Some(transmit) = host.pop_transmit() {
        if let Err(e) = socket.send_to(&transmit.payload, transmit.addr).await {
            tracing::warn!(peer = %transmit.addr, error = %e, "UDP send failed");
        }
    }
}

/// Hand events to the application without waiting on it. When the queue
/// is full the event is logged and dropped; the muxer keeps serving the
/// socket.
fn forward_events(events: Vec<Event>, events_tx: &mpsc::Sender<Event>) {
    for event in events {
        match events_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(capacity = events_tx.max_capacity(), "event queue full, dropping event");
            }
            // listener dropped; nobody is listening
            Err(TrySendError::Closed(_)) => return,
        }
    }
}
