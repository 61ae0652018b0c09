//! TestFlight access requests
//!
//! A request is validated against the catalog, rendered into an email for
//! the operator and handed to a [`Mailer`]. Delivery problems never reach
//! the requester: a slow or failing mailer degrades to a logged fallback.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument, warn};

use stagehand_remote::{MailMessage, Mailer};

use crate::catalog::{AppEntry, AppsConfig, Settings};
use crate::error::{ConfigError, Result, WorkflowError};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex")
});

const DEFAULT_SENDER_NAME: &str = "Stagehand";

/// A tester asking to join an app's TestFlight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestFlightRequest {
    /// App id or name
    pub app: String,
    pub email: String,
    pub name: Option<String>,
    pub message: Option<String>,
}

impl TestFlightRequest {
    /// Check the request and return the app it targets
    pub fn validate<'a>(&self, catalog: &'a AppsConfig) -> Result<&'a AppEntry> {
        if !EMAIL_REGEX.is_match(self.email.trim()) {
            return Err(WorkflowError::ValidationFailed(format!(
                "'{}' is not a valid email address",
                self.email.trim()
            ))
            .into());
        }
        Ok(catalog.app(&self.app)?)
    }
}

/// Whether the operator was actually notified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Sent,
    Fallback(String),
}

impl NotifyOutcome {
    /// Delivered through the mailer
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build the operator email
pub fn render_notification(
    settings: &Settings,
    app: &AppEntry,
    request: &TestFlightRequest,
) -> Result<MailMessage> {
    let to = settings.email.trim();
    if to.is_empty() {
        return Err(ConfigError::MissingField("settings.email".to_string()).into());
    }

    let sender_email = settings
        .sender_email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(to);
    let sender_name = settings
        .sender_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SENDER_NAME);

    let email = request.email.trim();
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(not given)");
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(none)");

    let subject = format!("TestFlight request: {} from {}", app.name, email);
    let text = format!(
        "New TestFlight access request\n\nApp: {} ({})\nEmail: {}\nName: {}\nMessage: {}\n",
        app.name, app.id, email, name, message
    );
    let html = format!(
        "<h2>New TestFlight access request</h2>\
         <table>\
         <tr><td>App</td><td>{} ({})</td></tr>\
         <tr><td>Email</td><td>{}</td></tr>\
         <tr><td>Name</td><td>{}</td></tr>\
         <tr><td>Message</td><td>{}</td></tr>\
         </table>",
        escape_html(&app.name),
        escape_html(&app.id),
        escape_html(email),
        escape_html(name),
        escape_html(message).replace('\n', "<br>")
    );

    Ok(MailMessage {
        from: format!("{} <{}>", sender_name, sender_email),
        to: to.to_string(),
        subject,
        html,
        text,
    })
}

/// Send the notification within `timeout`, falling back on any problem
#[instrument(skip_all, fields(mailer = mailer.name(), to = %message.to))]
pub async fn notify_operator(
    mailer: &dyn Mailer,
    message: &MailMessage,
    timeout: Duration,
) -> NotifyOutcome {
    match tokio::time::timeout(timeout, mailer.send(message)).await {
        Ok(Ok(())) => {
            info!(subject = %message.subject, "operator notified");
            NotifyOutcome::Sent
        }
        Ok(Err(e)) => {
            warn!(error = %e, subject = %message.subject, "notification failed, request logged only");
            NotifyOutcome::Fallback(e.to_string())
        }
        Err(_) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                subject = %message.subject,
                "notification timed out, request logged only"
            );
            NotifyOutcome::Fallback(format!("timed out after {:?}", timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StagehandError;
    use stagehand_remote::{RemoteError, RepoRef};
    use std::sync::Mutex;

    enum Behavior {
        Accept,
        Reject,
        Hang,
    }

    struct FakeMailer {
        behavior: Behavior,
        sent: Mutex<Vec<MailMessage>>,
    }

    impl FakeMailer {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Mailer for FakeMailer {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send(&self, message: &MailMessage) -> stagehand_remote::Result<()> {
            match self.behavior {
                Behavior::Accept => {
                    self.sent.lock().unwrap().push(message.clone());
                    Ok(())
                }
                Behavior::Reject => Err(RemoteError::ApiError {
                    status: 422,
                    message: "invalid sender".to_string(),
                }),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    fn catalog() -> AppsConfig {
        let mut catalog = AppsConfig {
            apps: vec![AppEntry::new("boochat", "BooChat", RepoRef::new("octo", "boochat"))],
            ..Default::default()
        };
        catalog.settings.email = "ops@example.com".to_string();
        catalog.settings.sender_email = Some("noreply@example.com".to_string());
        catalog
    }

    fn request() -> TestFlightRequest {
        TestFlightRequest {
            app: "BooChat".to_string(),
            email: "tester@example.org".to_string(),
            name: Some("Ada".to_string()),
            message: Some("<b>please</b>".to_string()),
        }
    }

    #[test]
    fn test_validate() {
        let catalog = catalog();
        assert_eq!(request().validate(&catalog).unwrap().id, "boochat");

        let mut bad = request();
        bad.email = "not-an-email".to_string();
        assert!(matches!(
            bad.validate(&catalog),
            Err(StagehandError::Workflow(WorkflowError::ValidationFailed(_)))
        ));

        let mut unknown = request();
        unknown.app = "nope".to_string();
        assert!(unknown.validate(&catalog).is_err());
    }

    #[test]
    fn test_render_notification() {
        let catalog = catalog();
        let message =
            render_notification(&catalog.settings, &catalog.apps[0], &request()).unwrap();
        assert_eq!(message.from, "Stagehand <noreply@example.com>");
        assert_eq!(message.to, "ops@example.com");
        assert!(message.subject.contains("BooChat"));
        assert!(message.text.contains("Name: Ada"));
        assert!(message.html.contains("&lt;b&gt;please&lt;/b&gt;"));
    }

    #[test]
    fn test_render_requires_operator_email() {
        let mut catalog = catalog();
        catalog.settings.email.clear();
        assert!(matches!(
            render_notification(&catalog.settings, &catalog.apps[0], &request()),
            Err(StagehandError::Config(ConfigError::MissingField(_)))
        ));
    }

    #[tokio::test]
    async fn test_notify_sent() {
        let catalog = catalog();
        let message =
            render_notification(&catalog.settings, &catalog.apps[0], &request()).unwrap();
        let mailer = FakeMailer::new(Behavior::Accept);

        let outcome = notify_operator(&mailer, &message, Duration::from_secs(1)).await;
        assert!(outcome.is_sent());
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notify_degrades_on_error() {
        let catalog = catalog();
        let message =
            render_notification(&catalog.settings, &catalog.apps[0], &request()).unwrap();
        let mailer = FakeMailer::new(Behavior::Reject);

        let outcome = notify_operator(&mailer, &message, Duration::from_secs(1)).await;
        assert!(matches!(outcome, NotifyOutcome::Fallback(reason) if reason.contains("422")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_degrades_on_timeout() {
        let catalog = catalog();
        let message =
            render_notification(&catalog.settings, &catalog.apps[0], &request()).unwrap();
        let mailer = FakeMailer::new(Behavior::Hang);

        let outcome = notify_operator(&mailer, &message, Duration::from_secs(10)).await;
        assert!(matches!(outcome, NotifyOutcome::Fallback(reason) if reason.contains("timed out")));
    }
}
