//! Parse inbound payloads into [`DetectionEvent`]s.

use serde_json::Value;

use watchpost_core::event::{BoundingBox, DetectionEvent, Point};

use crate::consumer::QueueMessage;
use crate::error::QueueError;

/// Parse a detection payload published on `topic`.
///
/// The payload must be a JSON object with a string `label`, a numeric
/// `confidence` and a `bounding_box` holding `top_left` and `bottom_right`
/// as two-element numeric arrays. Extra fields are ignored. The topic
/// becomes the event identifier.
pub fn parse_event(topic: &str, payload: &[u8]) -> Result<DetectionEvent, QueueError> {
    let json: Value =
        serde_json::from_slice(payload).map_err(|e| QueueError::Parse(e.to_string()))?;

    let obj = json
        .as_object()
        .ok_or_else(|| QueueError::Parse("not an object".to_string()))?;

    let label = obj
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| QueueError::Parse("label is not a string".to_string()))?;

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| QueueError::Parse("confidence is not a number".to_string()))?;

    let bbox = obj
        .get("bounding_box")
        .and_then(Value::as_object)
        .ok_or_else(|| QueueError::Parse("bounding_box is not an object".to_string()))?;

    let top_left = parse_point(bbox.get("top_left"), "bounding_box.top_left")?;
    let bottom_right = parse_point(bbox.get("bottom_right"), "bounding_box.bottom_right")?;

    Ok(DetectionEvent::new(
        topic,
        label,
        confidence,
        BoundingBox::new(top_left, bottom_right),
    ))
}

/// Parse the body of a received message.
pub fn parse_message(msg: &QueueMessage) -> Result<DetectionEvent, QueueError> {
    parse_event(&msg.topic, &msg.payload)
}

fn parse_point(value: Option<&Value>, path: &str) -> Result<Point, QueueError> {
    let arr = value
        .and_then(Value::as_array)
        .ok_or_else(|| QueueError::Parse(format!("{path} is not an array")))?;
    if arr.len() != 2 {
        return Err(QueueError::Parse(format!(
            "{path} is not an array of length 2"
        )));
    }
    match (arr[0].as_f64(), arr[1].as_f64()) {
        (Some(x), Some(y)) => Ok([x, y]),
        _ => Err(QueueError::Parse(format!("{path} is not an array of numbers"))),
    }
}
