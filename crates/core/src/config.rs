use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::event::BoundingBox;
use crate::validation::{validate_config, ValidationWarning};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Resolve `${VAR_NAME}` references using the process environment.
///
/// Returns an error if a referenced variable is not set or a reference
/// is never closed.
pub fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                var_name.push(c);
            }
            if !closed {
                return Err(ConfigError::Env(format!(
                    "unclosed env var reference in: {input}"
                )));
            }
            let value = std::env::var(&var_name)
                .map_err(|_| ConfigError::Env(format!("env var not found: {var_name}")))?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn default_client_id() -> String {
    "watchpost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_report_priority() -> u32 {
    5
}

// ── Top-level config ──────────────────────────────────────────

/// Validated rule configuration. Loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub debug: bool,
    pub retain_logs_for_days: u32,
    pub mqtt: MqttSettings,
    pub db: DbSettings,
    #[serde(default)]
    pub report_server: Option<ReportServerSettings>,
    /// Apply `minFrameCount` to matched rules. Off unless explicitly enabled.
    #[serde(default)]
    pub enforce_min_frame_count: bool,
    pub global_rules: Vec<Rule>,
    pub detectors: Vec<Detector>,
}

impl Config {
    /// Read, validate and deserialize a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Loaded, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validate and deserialize a JSON document.
    ///
    /// Every validation error is collected before failing, so the caller
    /// sees the full defect list from a single attempt.
    pub fn from_json_str(raw: &str) -> Result<Loaded, ConfigError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Loaded, ConfigError> {
        let result = validate_config(&value);
        if !result.valid {
            return Err(ConfigError::Invalid(result.errors));
        }
        let config: Config = serde_json::from_value(value)?;
        Ok(Loaded {
            config,
            warnings: result.warnings,
        })
    }

    /// Rules scoped to `identifier`, in declaration order. Detectors that
    /// repeat an identifier all contribute; none yields nothing.
    pub fn detector_rules<'a: 'b, 'b>(
        &'a self,
        identifier: &'b str,
    ) -> impl Iterator<Item = &'a Rule> + 'b {
        self.detectors
            .iter()
            .filter(move |d| d.identifier == identifier)
            .flat_map(|d| d.rules.iter())
    }

    /// Distinct detector identifiers in declaration order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.detectors.len());
        for d in &self.detectors {
            if !out.contains(&d.identifier.as_str()) {
                out.push(&d.identifier);
            }
        }
        out
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        let rule_count: usize = self.detectors.iter().map(|d| d.rules.len()).sum();
        tracing::info!("Config loaded:");
        tracing::info!("  debug:       {}", self.debug);
        tracing::info!("  retention:   {} days", self.retain_logs_for_days);
        tracing::info!("  mqtt:        host={}, client_id={}", self.mqtt.host, self.mqtt.client_id);
        tracing::info!("  db:          host={}:{}, db={}", self.db.host, self.db.port, self.db.database);
        tracing::info!(
            "  report:      {}",
            self.report_server.as_ref().map(|r| r.host.as_str()).unwrap_or("(disabled)")
        );
        tracing::info!(
            "  rules:       {} global, {} detector-scoped across {} detector(s)",
            self.global_rules.len(),
            rule_count,
            self.detectors.len()
        );
        if self.enforce_min_frame_count {
            tracing::info!("  frame gating: minFrameCount enforced");
        }
    }

    /// Return a redacted view with no secrets.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "debug": self.debug,
            "retainLogsForDays": self.retain_logs_for_days,
            "mqtt": { "host": self.mqtt.host, "clientId": self.mqtt.client_id },
            "db": {
                "host": self.db.host,
                "port": self.db.port,
                "user": self.db.user,
                "database": self.db.database,
            },
            "reportServer": self.report_server.as_ref().map(|r| serde_json::json!({
                "host": r.host,
                "priority": r.priority,
            })),
            "enforceMinFrameCount": self.enforce_min_frame_count,
            "globalRules": self.global_rules.len(),
            "detectors": self.identifiers(),
        })
    }
}

/// A successfully loaded config along with its non-blocking warnings.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub config: Config,
    pub warnings: Vec<ValidationWarning>,
}

// ── Endpoints ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttSettings {
    /// Broker URL, e.g. `mqtt://broker:1883`.
    pub host: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbSettings {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportServerSettings {
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_report_priority")]
    pub priority: u32,
    #[serde(default)]
    pub title_template: Option<String>,
    #[serde(default)]
    pub message_template: Option<String>,
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detector {
    pub identifier: String,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Ignore,
    Log,
    Report,
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RuleAction::Ignore => "ignore",
            RuleAction::Log => "log",
            RuleAction::Report => "report",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<i64>,
    /// Exclusive upper bound on confidence.
    #[serde(default)]
    pub confidence_below: Option<f64>,
    /// Exclusive lower bound on confidence.
    #[serde(default)]
    pub confidence_above: Option<f64>,
    #[serde(default)]
    pub min_frame_count: Option<u32>,
    #[serde(default)]
    pub timeframe: Option<Vec<Timeframe>>,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl Rule {
    pub const DEFAULT_PRIORITY: i64 = 1;

    /// A rule with only an action set; matches every event in its scope.
    pub fn new(action: RuleAction) -> Self {
        Self {
            action,
            labels: None,
            priority: None,
            confidence_below: None,
            confidence_above: None,
            min_frame_count: None,
            timeframe: None,
            bounding_box: None,
        }
    }

    /// Effective priority, `1` when unset.
    pub fn priority(&self) -> i64 {
        self.priority.unwrap_or(Self::DEFAULT_PRIORITY)
    }
}

/// A recurring window within the week. See [`TimeframeEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeframe {
    pub from: TimeframeEntry,
    pub to: TimeframeEntry,
}

/// One side of a [`Timeframe`]. A component is only checked when both
/// `from` and `to` specify it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeEntry {
    /// 0 = Sunday … 6 = Saturday.
    #[serde(default)]
    pub day_of_week: Option<u32>,
    #[serde(default)]
    pub hour: Option<u32>,
    #[serde(default)]
    pub minute: Option<u32>,
}
