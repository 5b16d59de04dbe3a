use std::collections::HashMap;
use std::error::Error;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio_enet::game::{GameMessage, GamePacket, TextFields, VariantList, mask::DEFAULT_MASK_KEY};
use tokio_enet::transport::{EnetListener, HostHandle};
use tokio_enet::{Config, Event, PeerId};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let bind_addr: SocketAddr = "0.0.0.0:17091".parse()?;
    let mut listener = EnetListener::bind(bind_addr, Config::default().max_peers(100)).await?;
    let handle = listener.handle();
    println!("Game server listening on {}", listener.local_addr());

    let mut names: HashMap<PeerId, String> = HashMap::new();

    while let Some(event) = listener.recv().await {
        match event {
            Event::Connected { peer, addr, .. } => {
                println!("[{peer}] connected from {addr}");
                handle
                    .send(peer, GameMessage::Hello.encode(DEFAULT_MASK_KEY))
                    .await?;
            }
            Event::Disconnected { peer, reason, .. } => {
                let name = names.remove(&peer).unwrap_or_else(|| "Guest".into());
                println!("[{peer}] {name} left ({reason:?})");
            }
            Event::Received { peer, payload, .. } => {
                if let Err(e) = handle_payload(&handle, &mut names, peer, payload).await {
                    tracing::warn!(%peer, error = %e, "dropping message");
                }
            }
        }
    }

    Ok(())
}

async fn handle_payload(
    handle: &HostHandle,
    names: &mut HashMap<PeerId, String>,
    peer: PeerId,
    payload: Bytes,
) -> Result<(), Box<dyn Error>> {
    let text = match GameMessage::decode(&payload, DEFAULT_MASK_KEY)? {
        GameMessage::Text(text) | GameMessage::Action(text) => text,
        other => {
            tracing::debug!(%peer, message = ?other.message_type(), "ignored");
            return Ok(());
        }
    };
    let fields = TextFields::parse(&text);

    if let Some(name) = fields.get("requestedName") {
        let name = if name.is_empty() { "Guest" } else { name };
        names.insert(peer, name.to_owned());
        println!("[{peer}] logged in as {name}");

        let start = VariantList::call("OnSuperMainStart")
            .with(12345u32)
            .with("cdn.example.invalid")
            .with("Welcome!")
            .with(name)
            .with(0u32);
        return send_call(handle, peer, &start).await;
    }

    match fields.get("action") {
        Some("input") => {
            let Some(message) = fields.get("text").filter(|m| !m.is_empty()) else {
                return Ok(());
            };
            let sender = names.get(&peer).map_or("Guest", String::as_str);
            let line = format!("<{sender}> {message}");
            println!("{line}");
            let call = VariantList::call("OnConsoleMessage").with(line);
            let packet = GamePacket::call_function(&call)?;
            handle
                .broadcast(GameMessage::Game(packet).encode(DEFAULT_MASK_KEY))
                .await?;
            Ok(())
        }
        Some("quit") => Ok(handle.disconnect(peer, 0).await?),
        Some(other) => {
            let call = VariantList::call("OnConsoleMessage")
                .with(format!("`4Unknown action `o{other}"));
            send_call(handle, peer, &call).await
        }
        None => Ok(()),
    }
}

async fn send_call(
    handle: &HostHandle,
    peer: PeerId,
    call: &VariantList,
) -> Result<(), Box<dyn Error>> {
    let packet = GamePacket::call_function(call)?;
    handle
        .send(peer, GameMessage::Game(packet).encode(DEFAULT_MASK_KEY))
        .await?;
    Ok(())
}
