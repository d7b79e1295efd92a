//! Minijinja template rendering for notification titles and messages.
//!
//! Templates are arbitrary strings from the config (not pre-registered),
//! so a fresh [`minijinja::Environment`] is created per render call.

use chrono::{DateTime, Local};
use watchpost_core::event::DetectionEvent;

use crate::traits::NotifyError;

/// Default title: `front: person (0.87)`.
pub const DEFAULT_TITLE_TEMPLATE: &str =
    "{{ identifier }}: {{ label }} ({{ confidence | fixed(2) }})";

/// Default message: the title followed by the local time of the report.
pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "{{ identifier }}: {{ label }} ({{ confidence | fixed(2) }}) at {{ timestamp }}";

/// Context data available to notification templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    pub identifier: String,
    pub label: String,
    pub confidence: f64,
    /// Local time of the report, e.g. `19/10/2026, 2:05:07 pm`.
    pub timestamp: String,
    /// Bounding box corners as `[x, y]` pairs.
    pub top_left: [f64; 2],
    pub bottom_right: [f64; 2],
}

impl TemplateContext {
    pub fn from_event(event: &DetectionEvent, at: DateTime<Local>) -> Self {
        Self {
            identifier: event.identifier.clone(),
            label: event.label.clone(),
            confidence: event.confidence,
            timestamp: at.format("%d/%m/%Y, %-I:%M:%S %P").to_string(),
            top_left: event.bounding_box.top_left,
            bottom_right: event.bounding_box.bottom_right,
        }
    }
}

/// Renders notification templates using minijinja.
#[derive(Debug)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("fixed", fixed_filter);
        env
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &TemplateContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check template syntax without rendering.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a float with a fixed number of decimals (default 2).
fn fixed_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(2);
    format!("{:.prec$}", value, prec = n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use watchpost_core::event::BoundingBox;

    fn sample_context() -> TemplateContext {
        let event = DetectionEvent::new(
            "frigate/front",
            "person",
            0.87654,
            BoundingBox::new([10.0, 20.0], [110.0, 220.0]),
        );
        let at = Local.with_ymd_and_hms(2026, 10, 19, 14, 5, 7).unwrap();
        TemplateContext::from_event(&event, at)
    }

    #[test]
    fn default_title() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render(DEFAULT_TITLE_TEMPLATE, &sample_context()).unwrap();
        assert_eq!(result, "frigate/front: person (0.88)");
    }

    #[test]
    fn default_message_includes_timestamp() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render(DEFAULT_MESSAGE_TEMPLATE, &sample_context()).unwrap();
        assert_eq!(result, "frigate/front: person (0.88) at 19/10/2026, 2:05:07 pm");
    }

    #[test]
    fn fixed_filter_precision() {
        let renderer = TemplateRenderer::new();
        let ctx = sample_context();
        assert_eq!(renderer.render("{{ confidence | fixed(0) }}", &ctx).unwrap(), "1");
        assert_eq!(renderer.render("{{ confidence | fixed }}", &ctx).unwrap(), "0.88");
    }

    #[test]
    fn box_corners_available() {
        let renderer = TemplateRenderer::new();
        let result = renderer
            .render("{{ top_left[0] }},{{ bottom_right[1] }}", &sample_context())
            .unwrap();
        assert_eq!(result, "10.0,220.0");
    }

    #[test]
    fn invalid_template_produces_error() {
        let renderer = TemplateRenderer::new();
        match renderer.render("{{ unclosed", &sample_context()) {
            Err(NotifyError::Template(msg)) => assert!(!msg.is_empty()),
            other => panic!("Expected Template error, got: {other:?}"),
        }
        assert!(renderer.validate("{{ unclosed").is_err());
        assert!(renderer.validate(DEFAULT_MESSAGE_TEMPLATE).is_ok());
    }
}
