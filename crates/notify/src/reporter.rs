//! Turns a reported detection into a delivered notification.

use chrono::Local;
use watchpost_core::config::ReportServerSettings;
use watchpost_core::event::DetectionEvent;

use crate::dispatcher::Dispatcher;
use crate::templating::{
    TemplateContext, TemplateRenderer, DEFAULT_MESSAGE_TEMPLATE, DEFAULT_TITLE_TEMPLATE,
};
use crate::traits::{DispatchResult, Notification, Notifier, NotifyError};
use crate::webhook::WebhookNotifier;

const DEFAULT_PRIORITY: u32 = 5;

pub struct EventReporter {
    renderer: TemplateRenderer,
    dispatcher: Dispatcher,
    title_template: String,
    message_template: String,
    priority: u32,
}

impl EventReporter {
    /// Reporter using the default templates and the given channels.
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            renderer: TemplateRenderer::new(),
            dispatcher: Dispatcher::new(channels),
            title_template: DEFAULT_TITLE_TEMPLATE.to_string(),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Reporter with no channels. Reports are rendered and then dropped.
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    /// Build the webhook reporter described by `settings`.
    ///
    /// Custom templates are syntax-checked here so a bad template fails
    /// startup instead of every report.
    pub fn from_settings(settings: &ReportServerSettings) -> Result<Self, NotifyError> {
        let webhook = WebhookNotifier::from_settings(settings)?;
        let mut reporter = Self::new(vec![Box::new(webhook)]);
        reporter.priority = settings.priority;

        if let Some(tmpl) = &settings.title_template {
            reporter.set_title_template(tmpl)?;
        }
        if let Some(tmpl) = &settings.message_template {
            reporter.set_message_template(tmpl)?;
        }
        Ok(reporter)
    }

    pub fn set_title_template(&mut self, template: &str) -> Result<(), NotifyError> {
        self.renderer
            .validate(template)
            .map_err(|e| NotifyError::Config(format!("invalid title template: {e}")))?;
        self.title_template = template.to_string();
        Ok(())
    }

    pub fn set_message_template(&mut self, template: &str) -> Result<(), NotifyError> {
        self.renderer
            .validate(template)
            .map_err(|e| NotifyError::Config(format!("invalid message template: {e}")))?;
        self.message_template = template.to_string();
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        !self.dispatcher.is_empty()
    }

    /// Render the notification for `event` without sending it.
    pub fn render(&self, event: &DetectionEvent) -> Result<Notification, NotifyError> {
        let ctx = TemplateContext::from_event(event, Local::now());
        Ok(Notification {
            title: self.renderer.render(&self.title_template, &ctx)?,
            message: self.renderer.render(&self.message_template, &ctx)?,
            priority: self.priority,
        })
    }

    /// Render and deliver a notification for `event` to every channel.
    ///
    /// Fails only when rendering fails; per-channel outcomes are returned.
    pub async fn report(&self, event: &DetectionEvent) -> Result<Vec<DispatchResult>, NotifyError> {
        let notification = self.render(event)?;
        Ok(self.dispatcher.dispatch(&notification).await)
    }
}
