use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{Stream, StreamExt};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

pub type BroadcastSender = broadcast::Sender<String>;

pub fn message_bus() -> (BroadcastSender, broadcast::Receiver<String>) {
    broadcast::channel(256)
}

pub fn encode_message(event: &str, payload: Value) -> String {
    json!({
        "event": event,
        "payload": payload,
    })
    .to_string()
}

pub fn broadcast_json(sender: &BroadcastSender, event: &str, payload: Value) {
    let message = encode_message(event, payload);
    // No subscribers is not an error.
    let _ = sender.send(message);
}

/// SSE stream of every message published on the bus. Lagging clients skip
/// the messages they missed.
pub fn event_stream(
    broadcaster: &BroadcastSender,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>> + use<>> {
    let rx = broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(message) => Some(Ok(Event::default().data(message))),
            Err(err) => {
                debug!(target: "sse", error = %err, "subscriber lagged behind the bus");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
