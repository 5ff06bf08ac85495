//! SSE (Server-Sent Events) streaming for Level 2.
//!
//! Two producers share one wire format, `data: <payload>\n\n`:
//! - simulation: a fixed sentence, one word per event, ending in `[DONE]`
//! - live: provider deltas relayed one fragment at a time, no terminator
//!
//! Both are pull-driven. Nothing is produced until axum polls for the next
//! event, so a dropped connection stops production at the next event.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::Event;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::providers::openai::{DeltaStream, OpenAiClient};
use crate::providers::ProviderError;

/// Sentence streamed (three times) when no server key is configured.
pub const SIMULATED_SENTENCE: &str =
    "This is a simulated streaming response because the Server API Key is missing... ";

pub const DONE_SENTINEL: &str = "[DONE]";

/// Pieces emitted by the simulated stream, in order.
///
/// Splitting on single spaces keeps the empty piece after the final space.
pub fn simulated_words() -> Vec<String> {
    SIMULATED_SENTENCE
        .repeat(3)
        .split(' ')
        .map(str::to_string)
        .collect()
}

/// Make a provider fragment safe for a single SSE `data:` line.
///
/// Newlines become the two characters `\n`; carriage returns are dropped
/// because SSE cannot carry them inside a field.
pub fn escape_fragment(fragment: &str) -> String {
    fragment.replace('\n', "\\n").replace('\r', "")
}

/// Simulated stream: each word followed by a space, then `[DONE]`.
///
/// Every event after the first waits `interval` before it is produced.
pub fn simulated_stream(interval: Duration) -> impl Stream<Item = Result<Event, Infallible>> {
    let payloads = simulated_words()
        .into_iter()
        .map(|word| format!("{word} "))
        .chain(std::iter::once(DONE_SENTINEL.to_string()));

    stream::iter(payloads.enumerate()).then(move |(i, payload)| async move {
        if i > 0 {
            tokio::time::sleep(interval).await;
        }
        Ok(Event::default().data(payload))
    })
}

enum LiveState {
    Opening { client: OpenAiClient, message: String },
    Relaying(DeltaStream),
    Finished,
}

/// Live stream relayed from the chat provider.
///
/// Failure to open the stream, or an error mid-stream, becomes a single
/// `Error: <message>` event after which the stream ends.
pub fn live_stream(
    client: OpenAiClient,
    message: String,
    request_id: String,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let initial = LiveState::Opening { client, message };

    stream::unfold(initial, move |state| {
        let request_id = request_id.clone();
        async move {
            let mut deltas = match state {
                LiveState::Opening { client, message } => match client.stream(&message).await {
                    Ok(deltas) => deltas,
                    Err(e) => return Some((error_event(&request_id, &e), LiveState::Finished)),
                },
                LiveState::Relaying(deltas) => deltas,
                LiveState::Finished => return None,
            };

            loop {
                match deltas.next().await {
                    Some(Ok(fragment)) => {
                        // An empty payload would serialize as a bare blank line, not an event.
                        let payload = escape_fragment(&fragment);
                        if payload.is_empty() {
                            continue;
                        }
                        let event = Event::default().data(payload);
                        return Some((Ok(event), LiveState::Relaying(deltas)));
                    }
                    Some(Err(e)) => {
                        return Some((error_event(&request_id, &e), LiveState::Finished))
                    }
                    None => {
                        debug!(request_id, "Live stream finished");
                        return None;
                    }
                }
            }
        }
    })
}

fn error_event(request_id: &str, error: &ProviderError) -> Result<Event, Infallible> {
    warn!(request_id, error = %error, "Live stream failed");
    Ok(Event::default().data(escape_fragment(&format!("Error: {error}"))))
}
