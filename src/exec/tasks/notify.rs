// src/exec/tasks/notify.rs

//! `send_notification`: plain-text status mail over SMTP.
//!
//! The message is handed to `curl`, which speaks SMTP with STARTTLS
//! (`--ssl-reqd`) and authenticates as the sender.

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::engine::TaskOutcome;
use crate::errors::Result;
use crate::exec::process::{CommandSpec, ProcessRunner};
use crate::exec::tasks::{Step, run_steps};
use crate::exec::{HandlerFuture, TaskContext, TaskHandler};

/// SMTP connection details from the `email_config` table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SmtpConfig {
    server: String,
    port: String,
    sender: String,
    password: String,
}

impl SmtpConfig {
    /// `None` when any of the four fields is missing.
    fn from_settings(settings: &Settings<'_>) -> Result<Option<Self>> {
        let Some(table) = settings.table("email_config")? else {
            return Ok(None);
        };
        let (Some(server), Some(port), Some(sender), Some(password)) = (
            table.str("smtp_server")?,
            table.scalar("smtp_port")?,
            table.str("sender_email")?,
            table.str("sender_password")?,
        ) else {
            return Ok(None);
        };
        Ok(Some(Self {
            server: server.to_string(),
            port,
            sender: sender.to_string(),
            password: password.to_string(),
        }))
    }

    fn url(&self) -> String {
        // 465 is implicit TLS; everything else upgrades with STARTTLS.
        let scheme = if self.port == "465" { "smtps" } else { "smtp" };
        format!("{scheme}://{}:{}", self.server, self.port)
    }
}

pub struct EmailNotificationHandler {
    runner: Arc<dyn ProcessRunner>,
}

impl EmailNotificationHandler {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

impl TaskHandler for EmailNotificationHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let settings = ctx.config.settings();

            let recipients = settings.string_list("recipients")?.unwrap_or_default();
            let smtp = SmtpConfig::from_settings(&settings)?;
            let (false, Some(smtp)) = (recipients.is_empty(), smtp) else {
                return Ok(TaskOutcome::failure(
                    "email configuration or recipients are missing (recipients, email_config with smtp_server, smtp_port, sender_email, sender_password)",
                ));
            };

            let task_name = settings.str_or("task_name", ctx.stage)?;
            let default_status = if ctx.state.has_failures() {
                "failure"
            } else {
                "success"
            };
            let status = settings.str_or("status", default_status)?;

            info!(task_name, status, recipients = recipients.len(), "sending notification");

            let message = compose_message(&smtp.sender, &recipients, task_name, status);
            let spec = mail_command(&smtp, &recipients, &message);
            let outcome = run_steps(
                self.runner.as_ref(),
                vec![Step::new(format!("mail to {}", recipients.join(", ")), spec)],
            )
            .await?;

            if outcome == TaskOutcome::Success {
                info!(recipients = %recipients.join(", "), "notification sent");
            }
            Ok(outcome)
        })
    }
}

fn compose_message(sender: &str, recipients: &[String], task_name: &str, status: &str) -> String {
    format!(
        "From: {sender}\r\n\
         To: {to}\r\n\
         Subject: Task {task_name} - {status}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         The task '{task_name}' has completed with status: {status}.\r\n",
        to = recipients.join(", "),
    )
}

fn mail_command(smtp: &SmtpConfig, recipients: &[String], message: &str) -> CommandSpec {
    let mut spec = CommandSpec::new("curl")
        .args(["--silent", "--show-error", "--url"])
        .arg(smtp.url())
        .args(["--ssl-reqd", "--mail-from", smtp.sender.as_str()]);
    for rcpt in recipients {
        spec = spec.args(["--mail-rcpt", rcpt.as_str()]);
    }
    spec.arg("--user")
        .arg(format!("{}:{}", smtp.sender, smtp.password))
        .args(["--upload-file", "-"])
        .stdin(message)
        .secret(smtp.password.as_str())
}
