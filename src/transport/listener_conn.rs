use tokio::sync::mpsc;

use crate::error::EnetError;
use crate::protocol::types::PeerId;
use crate::transport::{Message, OutboundMsg};

/// Cloneable sender into a listener's muxer task.
///
/// Requests are queued in order and applied on the muxer, so sends from
/// many tasks never race each other's sequence numbers.
#[derive(Debug, Clone)]
pub struct HostHandle {
    outbound_tx: mpsc::Sender<OutboundMsg>,
}

impl HostHandle {
    pub(crate) fn new(outbound_tx: mpsc::Sender<OutboundMsg>) -> Self {
        Self { outbound_tx }
    }

    pub async fn send(&self, peer: PeerId, msg: impl Into<Message>) -> Result<(), EnetError> {
        self.request(OutboundMsg::Send {
            peer,
            message: msg.into(),
        })
        .await
    }

    pub async fn broadcast(&self, msg: impl Into<Message>) -> Result<(), EnetError> {
        self.request(OutboundMsg::Broadcast {
            message: msg.into(),
        })
        .await
    }

    pub async fn disconnect(&self, peer: PeerId, data: u32) -> Result<(), EnetError> {
        self.request(OutboundMsg::Disconnect { peer, data }).await
    }

    async fn request(&self, msg: OutboundMsg) -> Result<(), EnetError> {
        self.outbound_tx
            .send(msg)
            .await
            .map_err(|_| EnetError::ConnectionClosed)
    }
}
