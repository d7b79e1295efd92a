//! Recursive validation of the raw JSON configuration tree.
//!
//! Walks Config → Detector → Rule → Timeframe → TimeframeEntry → BoundingBox
//! and collects every problem instead of stopping at the first one. Errors
//! block startup; warnings describe configurations that are legal but can
//! never (or will rarely) match and are only logged.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::BoundingBox;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location of the offending object, e.g.
    /// `"detectors[0].rules[2]"`. Empty for top-level fields.
    pub path: String,
    pub message: String,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Look up a field, treating an explicit `null` the same as a missing key.
fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Non-negative integer that fits the `u32` fields of the typed config.
fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn is_string(obj: &Map<String, Value>, key: &str) -> bool {
    matches!(field(obj, key), Some(Value::String(_)))
}

fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

const VALID_ACTIONS: &[&str] = &["ignore", "log", "report"];

// ── Public API ──────────────────────────────────────────────────────

/// Validate a raw configuration document.
pub fn validate_config(input: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();

    let Some(obj) = input.as_object() else {
        result.error("", "Input must be an object.");
        return result;
    };

    if field(obj, "retainLogsForDays").and_then(as_u32).is_none() {
        result.error("", "retainLogsForDays must be a non-negative integer.");
    }

    if !matches!(field(obj, "debug"), Some(Value::Bool(_))) {
        result.error("", "debug must be a boolean.");
    }

    // Defaulted but not optional: an explicit null is a type error.
    if let Some(v) = obj.get("enforceMinFrameCount") {
        if !v.is_boolean() {
            result.error("", "enforceMinFrameCount must be a boolean if provided.");
        }
    }

    validate_mqtt(field(obj, "mqtt"), &mut result);
    validate_db(field(obj, "db"), &mut result);

    if let Some(report) = field(obj, "reportServer") {
        validate_report_server(report, &mut result);
    }

    match field(obj, "globalRules") {
        Some(Value::Array(rules)) => {
            for (i, rule) in rules.iter().enumerate() {
                validate_rule(rule, &format!("globalRules[{i}]"), &mut result);
            }
        }
        _ => result.error("", "globalRules must be an array."),
    }

    match field(obj, "detectors") {
        Some(Value::Array(detectors)) => {
            let mut seen = HashSet::new();
            for (i, detector) in detectors.iter().enumerate() {
                let path = format!("detectors[{i}]");
                validate_detector(detector, &path, &mut result);

                let identifier = detector
                    .as_object()
                    .and_then(|d| field(d, "identifier"))
                    .and_then(Value::as_str);
                if let Some(identifier) = identifier {
                    if !seen.insert(identifier) {
                        result.warn(
                            path,
                            format!(
                                "Detector identifier '{identifier}' is declared more than once; rules of every declaration apply."
                            ),
                        );
                    }
                }
            }
        }
        _ => result.error("", "detectors must be an array."),
    }

    result
}

fn validate_mqtt(mqtt: Option<&Value>, result: &mut ValidationResult) {
    let obj = mqtt.and_then(Value::as_object);
    if !obj.is_some_and(|m| is_string(m, "host")) {
        result.error("", "mqtt.host is required and must be a string.");
    }
    if let Some(m) = obj {
        if m.contains_key("clientId") && !is_string(m, "clientId") {
            result.error("", "mqtt.clientId must be a string if provided.");
        }
    }
}

fn validate_db(db: Option<&Value>, result: &mut ValidationResult) {
    let obj = db.and_then(Value::as_object);
    for key in ["host", "user", "password", "database"] {
        if !obj.is_some_and(|d| is_string(d, key)) {
            result.error("", format!("db.{key} is required and must be a string."));
        }
    }
    if let Some(port) = obj.and_then(|d| d.get("port")) {
        if port.as_u64().and_then(|p| u16::try_from(p).ok()).is_none() {
            result.error("", "db.port must be a valid port number if provided.");
        }
    }
}

fn validate_report_server(report: &Value, result: &mut ValidationResult) {
    let Some(obj) = report.as_object() else {
        result.error("", "reportServer must be an object if provided.");
        return;
    };

    if !is_string(obj, "host") {
        result.error("", "reportServer.host is required and must be a string.");
    }
    if !is_string(obj, "apiKey") {
        result.error("", "reportServer.apiKey is required and must be a string.");
    }
    if let Some(priority) = obj.get("priority") {
        if as_u32(priority).is_none() {
            result.error("", "reportServer.priority must be a non-negative integer if provided.");
        }
    }
    for key in ["titleTemplate", "messageTemplate"] {
        if field(obj, key).is_some() && !is_string(obj, key) {
            result.error("", format!("reportServer.{key} must be a string if provided."));
        }
    }
}

fn validate_detector(detector: &Value, path: &str, result: &mut ValidationResult) {
    let Some(obj) = detector.as_object() else {
        result.error(path, "Detector must be an object.");
        return;
    };

    if !is_string(obj, "identifier") {
        result.error(path, "Detector.identifier is required and must be a string.");
    }

    match field(obj, "rules") {
        Some(Value::Array(rules)) => {
            for (i, rule) in rules.iter().enumerate() {
                validate_rule(rule, &format!("{path}.rules[{i}]"), result);
            }
        }
        _ => result.error(path, "Detector.rules must be an array."),
    }
}

fn validate_rule(rule: &Value, path: &str, result: &mut ValidationResult) {
    let Some(obj) = rule.as_object() else {
        result.error(path, "Rule must be an object.");
        return;
    };

    let action_ok = field(obj, "action")
        .and_then(Value::as_str)
        .is_some_and(|a| VALID_ACTIONS.contains(&a));
    if !action_ok {
        result.error(
            path,
            "Rule.action is required and must be one of: ignore, log, report.",
        );
    }

    if let Some(labels) = field(obj, "labels") {
        match labels.as_array() {
            Some(items) => {
                if !items.iter().all(Value::is_string) {
                    result.error(path, "Rule.labels entries must be strings.");
                }
            }
            None => result.error(path, "Rule.labels must be an array if provided."),
        }
    }

    if let Some(priority) = field(obj, "priority") {
        if priority.as_i64().is_none() {
            result.error(path, "Rule.priority must be an integer if provided.");
        }
    }

    let below = field(obj, "confidenceBelow");
    if below.is_some_and(|v| !v.is_number()) {
        result.error(path, "Rule.confidenceBelow must be a number if provided.");
    }
    let above = field(obj, "confidenceAbove");
    if above.is_some_and(|v| !v.is_number()) {
        result.error(path, "Rule.confidenceAbove must be a number if provided.");
    }
    if let (Some(b), Some(a)) = (
        below.and_then(Value::as_f64),
        above.and_then(Value::as_f64),
    ) {
        if b <= a {
            result.warn(
                path,
                format!("Empty confidence band (below {b} <= above {a}); this rule never matches."),
            );
        }
    }

    if let Some(min) = field(obj, "minFrameCount") {
        if as_u32(min).is_none() {
            result.error(path, "Rule.minFrameCount must be a non-negative integer if provided.");
        }
    }

    if let Some(timeframe) = field(obj, "timeframe") {
        match timeframe.as_array() {
            Some(windows) => {
                for (i, window) in windows.iter().enumerate() {
                    validate_timeframe(window, &format!("{path}.timeframe[{i}]"), result);
                }
            }
            None => result.error(path, "Rule.timeframe must be an array if provided."),
        }
    }

    if let Some(bbox) = field(obj, "boundingBox") {
        validate_bounding_box(bbox, &join(path, "boundingBox"), result);
    }
}

fn validate_bounding_box(bbox: &Value, path: &str, result: &mut ValidationResult) {
    let Some(obj) = bbox.as_object() else {
        result.error(path, "BoundingBox must be an object.");
        return;
    };

    let mut corners = Vec::with_capacity(2);
    for key in ["topLeft", "bottomRight"] {
        match field(obj, key).and_then(Value::as_array) {
            Some(coords) if coords.len() == 2 => {
                match (coords[0].as_f64(), coords[1].as_f64()) {
                    (Some(x), Some(y)) => corners.push([x, y]),
                    _ => result.error(
                        path,
                        format!("BoundingBox.{key} coordinates must be numbers."),
                    ),
                }
            }
            _ => result.error(
                path,
                format!("BoundingBox.{key} must be an array of two numbers."),
            ),
        }
    }

    if let [tl, br] = corners.as_slice() {
        if BoundingBox::new(*tl, *br).is_inverted() {
            result.warn(
                path,
                "topLeft is greater than bottomRight on at least one axis; no detection can fit inside.",
            );
        }
    }
}

fn validate_timeframe(timeframe: &Value, path: &str, result: &mut ValidationResult) {
    let Some(obj) = timeframe.as_object() else {
        result.error(path, "Timeframe must be an object.");
        return;
    };

    validate_timeframe_entry(obj.get("from"), &join(path, "from"), result);
    validate_timeframe_entry(obj.get("to"), &join(path, "to"), result);
}

fn validate_timeframe_entry(entry: Option<&Value>, path: &str, result: &mut ValidationResult) {
    let Some(obj) = entry.and_then(Value::as_object) else {
        result.error(path, "TimeframeEntry must be an object.");
        return;
    };

    for (key, max) in [("dayOfWeek", 6), ("hour", 23), ("minute", 59)] {
        let Some(value) = field(obj, key) else {
            continue;
        };
        match as_u32(value) {
            Some(n) if n > max => result.warn(
                path,
                format!("TimeframeEntry.{key} is {n}, outside 0..={max}."),
            ),
            Some(_) => {}
            None => result.error(
                path,
                format!("TimeframeEntry.{key} must be a non-negative integer if provided."),
            ),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
