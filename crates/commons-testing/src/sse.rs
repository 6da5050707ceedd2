//! Event-stream parsing for sync progress tests.

use commons_domain::sync::SyncMessage;

/// Split a `text/event-stream` body into the JSON payloads of its `data:` lines.
///
/// Comment lines (keep-alives) and other fields are ignored. Multi-line data
/// fields are joined with `\n` as the browser `EventSource` does.
pub fn data_frames(body: &str) -> Vec<String> {
    let mut frames = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in body.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                frames.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        if let Some(data) = line.strip_prefix("data:") {
            current.push(data.strip_prefix(' ').unwrap_or(data));
        }
    }
    if !current.is_empty() {
        frames.push(current.join("\n"));
    }
    frames
}

/// Parse every data frame of a sync event stream.
///
/// Panics on frames that are not sync messages.
pub fn sync_messages(body: &str) -> Vec<SyncMessage> {
    data_frames(body)
        .iter()
        .map(|frame| {
            serde_json::from_str(frame)
                .unwrap_or_else(|e| panic!("invalid sync frame {frame:?}: {e}"))
        })
        .collect()
}
