mod online;

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::protocol::state::Event;
use crate::transport::Host;

use online::{dispatch_datagram, flush_transmits, handle_outgoing_msg, tick_host};

use super::{HostHandle, OutboundMsg};

/// Largest datagram the muxer reads in one call.
const RECV_BUFFER_SIZE: usize = u16::MAX as usize;

/// Events buffered for [`EnetListener::recv`]. Past this, new events are
/// dropped.
const EVENT_QUEUE_DEPTH: usize = 1024;
const OUTBOUND_QUEUE_DEPTH: usize = 1024;

/// Server-side ENet endpoint.
///
/// Binding spawns one muxer task that owns the socket and the [`Host`];
/// every datagram, outbound request and sweep is handled on that task in
/// arrival order.
pub struct EnetListener {
    local_addr: SocketAddr,
    events: mpsc::Receiver<Event>,
    outbound_tx: mpsc::Sender<OutboundMsg>,
}

impl EnetListener {
    /// Binds a new listener to the specified address.
    pub async fn bind(addr: SocketAddr, config: Config) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);

        tracing::info!(addr = %local_addr, max_peers = config.max_peers, "listening");
        tokio::spawn(run_listener_muxer(socket, config, events_tx, outbound_rx));

        Ok(Self {
            local_addr,
            events: events_rx,
            outbound_tx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Next connection, disconnection or payload event.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// A cloneable handle for sending from other tasks.
    pub fn handle(&self) -> HostHandle {
        HostHandle::new(self.outbound_tx.clone())
    }
}

async fn run_listener_muxer(
    socket: UdpSocket,
    config: Config,
    events_tx: mpsc::Sender<Event>,
    mut outbound_rx: mpsc::Receiver<OutboundMsg>,
) {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    let mut tick = tokio::time::interval(config.tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut host = Host::new(config);

    loop {
        tokio::select! {
            res = socket.recv_from(&mut buf) => {
                match res {
                    Ok((len, peer)) => {
                        dispatch_datagram(&mut host, &buf[..len], peer, &events_tx);
                    }
                    Err(e) => {
                        if e.kind() == std::io::ErrorKind::ConnectionReset {
                            // ICMP port unreachable surfaces here on some platforms
                            continue;
                        }
                        tracing::error!(error = %e, "UDP socket error");
                        continue;
                    }
                }
            }

            Some(msg) = outbound_rx.recv() => {
                handle_outgoing_msg(&mut host, msg, &events_tx);
            }

            _ = tick.tick() => {
                tick_host(&mut host, &events_tx);
                if events_tx.is_closed() {
                    tracing::debug!("listener dropped, muxer exiting");
                    break;
                }
            }
        }

        flush_transmits(&socket, &mut host).await;
    }
}
