//! Intake command

use clap::Args;
use tracing::{info, warn};

use stagehand_core::catalog::load_catalog;
use stagehand_core::intake::{notify_operator, render_notification, NotifyOutcome, TestFlightRequest};
use stagehand_remote::HttpMailer;

use crate::cli::{output, Cli, OutputFormat};

/// Forward a TestFlight access request to the operator
#[derive(Debug, Args)]
pub struct IntakeCommand {
    /// App id or name
    #[arg(short, long)]
    pub app: String,

    /// Requester's email address
    #[arg(short, long)]
    pub email: String,

    /// Requester's name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Free-form message
    #[arg(short, long)]
    pub message: Option<String>,
}

impl IntakeCommand {
    /// Execute the intake command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(app = %self.app, dry_run = cli.dry_run, "executing intake command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = cli.tool_config()?;
        let catalog = load_catalog(&cli.catalog_path(&config)?)?;

        let request = TestFlightRequest {
            app: self.app.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            message: self.message.clone(),
        };
        let app = request.validate(&catalog)?;
        let message = render_notification(&catalog.settings, app, &request)?;

        let outcome = if cli.dry_run {
            NotifyOutcome::Fallback("dry run, not sent".to_string())
        } else {
            match HttpMailer::new(config.mail.to_mail_config()) {
                Ok(mailer) => notify_operator(&mailer, &message, config.mail.timeout()).await,
                Err(e) => {
                    warn!(error = %e, request = ?request, "mailer unavailable, request logged only");
                    NotifyOutcome::Fallback(e.to_string())
                }
            }
        };

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "request": request,
                "notification": outcome,
            }))?,
            OutputFormat::Text if !cli.quiet => {
                output::success(&format!(
                    "Request for {} received from {}",
                    app.name,
                    request.email.trim()
                ));
                if let NotifyOutcome::Fallback(reason) = &outcome {
                    output::warning(&format!("Operator not emailed ({})", reason));
                }
            }
            OutputFormat::Text => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_intake() {
        let cli = Cli::try_parse_from([
            "stagehand",
            "intake",
            "--app",
            "boochat",
            "--email",
            "tester@example.org",
            "-m",
            "hello",
        ])
        .unwrap();
        let crate::cli::Commands::Intake(cmd) = cli.command else {
            panic!("expected intake");
        };
        assert_eq!(cmd.email, "tester@example.org");
        assert_eq!(cmd.message.as_deref(), Some("hello"));
        assert!(cmd.name.is_none());
    }
}
