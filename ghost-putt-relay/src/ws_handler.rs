use crate::relay_service::RelayService;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use ghost_putt_core::{PeerId, RelayFrame};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

fn frame_text(frame: &RelayFrame) -> Option<Message> {
    serde_json::to_string(frame)
        .ok()
        .map(|json| Message::Text(json.into()))
}

/// Waits for the client's `Register` frame. Anything else first is a
/// protocol error.
async fn await_register(socket: &mut WebSocket) -> Option<Option<PeerId>> {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                return match serde_json::from_str::<RelayFrame>(&text) {
                    Ok(RelayFrame::Register { peer_id }) => Some(peer_id),
                    Ok(other) => {
                        warn!("Expected register, got {:?}", other);
                        None
                    }
                    Err(e) => {
                        warn!("Invalid relay frame before register: {}", e);
                        None
                    }
                };
            }
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

async fn handle_socket(mut socket: WebSocket, service: RelayService) {
    let Some(requested) = await_register(&mut socket).await else {
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let peer_id = match service.register(requested, tx) {
        Ok(peer_id) => peer_id,
        Err(e) => {
            warn!("Refusing registration: {}", e);
            let refusal = RelayFrame::Error {
                reason: e.to_string(),
            };
            if let Some(msg) = frame_text(&refusal) {
                let _ = socket.send(msg).await;
            }
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    info!("Peer {} connected to relay", peer_id);
    service.send_frame(
        &peer_id,
        &RelayFrame::Welcome {
            peer_id: peer_id.clone(),
        },
    );

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayFrame>(&text) {
                        Ok(RelayFrame::Signal(signal)) => service.forward(&peer_id, signal),
                        Ok(other) => warn!("Unexpected {:?} from {}", other, peer_id),
                        Err(e) => warn!("Invalid relay frame from {}: {}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.unregister(&peer_id);
    info!("Peer {} left the relay", peer_id);
}
