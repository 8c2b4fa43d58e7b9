//! Report delivery.
//!
//! `MailSink` is the only interface the run pipeline talks to. Sinks are
//! single-shot: a failed send is reported and never retried.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::info;

use crate::constants::mail::{
    MAX_LINE_OCTETS, OUTBOX_EXTENSION, SENDMAIL_ARGS, SENDMAIL_PASSWORD_ENV, SUBJECT_DATE_FORMAT,
    WEEK_START_OFFSET_DAYS,
};
use crate::errors::MenuError;
use crate::types::MailAddress;

/// A composed HTML message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailMessage {
    /// Sender address.
    pub from: MailAddress,
    /// Recipient address.
    pub to: MailAddress,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

impl MailMessage {
    /// Render as an RFC 5322 message with CRLF line endings.
    pub fn to_rfc5322<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let headers = [
            format!("From: {}", self.from),
            format!("To: {}", self.to),
            format!("Subject: {}", self.subject),
            format!("Date: {}", date.to_rfc2822()),
            "MIME-Version: 1.0".to_string(),
            "Content-Type: text/html; charset=\"UTF-8\"".to_string(),
        ];
        let mut message = headers.join("\r\n");
        message.push_str("\r\n\r\n");
        for line in self.html_body.lines() {
            for chunk in fold_line(line) {
                message.push_str(chunk);
                message.push_str("\r\n");
            }
        }
        message
    }
}

/// Split `line` into pieces of at most `MAX_LINE_OCTETS`, preferring to
/// break before a space. Falls back to the nearest char boundary.
fn fold_line(mut line: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    while line.len() > MAX_LINE_OCTETS {
        let mut cut = MAX_LINE_OCTETS;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        if let Some(space) = line[..cut].rfind(' ').filter(|&idx| idx > 0) {
            cut = space;
        }
        pieces.push(&line[..cut]);
        line = &line[cut..];
    }
    pieces.push(line);
    pieces
}

/// Subject line for the week starting the day after `now`.
pub fn weekly_subject(prefix: &str, now: &DateTime<Local>) -> String {
    let week_start = *now + Duration::days(WEEK_START_OFFSET_DAYS);
    format!("{} {}", prefix, week_start.format(SUBJECT_DATE_FORMAT))
}

/// Outbound mail sink.
pub trait MailSink {
    /// Deliver one HTML message. Not retried on failure.
    fn send(&mut self, recipient: &str, subject: &str, html_body: &str) -> Result<(), MenuError>;
}

/// Writes each message as an `.eml` file into a spool directory.
pub struct OutboxSink {
    dir: PathBuf,
    from: MailAddress,
    written: Vec<PathBuf>,
}

impl OutboxSink {
    /// Spool into `dir`, created on first send.
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<MailAddress>) -> Self {
        Self {
            dir: dir.into(),
            from: from.into(),
            written: Vec::new(),
        }
    }

    /// Paths of the messages written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn next_path(&self, now: &DateTime<Utc>) -> PathBuf {
        let stamp = now.format("%Y%m%dT%H%M%S%.6f");
        let mut attempt = 0usize;
        loop {
            let name = if attempt == 0 {
                format!("{stamp}.{OUTBOX_EXTENSION}")
            } else {
                format!("{stamp}-{attempt}.{OUTBOX_EXTENSION}")
            };
            let path = self.dir.join(name);
            if !path.exists() {
                return path;
            }
            attempt += 1;
        }
    }
}

impl MailSink for OutboxSink {
    fn send(&mut self, recipient: &str, subject: &str, html_body: &str) -> Result<(), MenuError> {
        let message = MailMessage {
            from: self.from.clone(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        };
        let now = Utc::now();
        fs::create_dir_all(&self.dir).map_err(|err| {
            MenuError::Delivery(format!(
                "cannot create outbox {}: {err}",
                self.dir.display()
            ))
        })?;
        let path = self.next_path(&now);
        fs::write(&path, message.to_rfc5322(&now)).map_err(|err| {
            MenuError::Delivery(format!("cannot write {}: {err}", path.display()))
        })?;
        info!(
            "[weekly_menu:mail] spooled report for {} to {}",
            recipient,
            path.display()
        );
        self.written.push(path);
        Ok(())
    }
}

/// Pipes each message into a sendmail-compatible binary (`sendmail -t -i`).
///
/// The sender password, when present, is exported to the child as
/// `WEEKLY_MENU_SMTP_PASSWORD` for relays configured to read it.
pub struct SendmailSink {
    program: PathBuf,
    from: MailAddress,
    password: Option<String>,
}

impl SendmailSink {
    /// Deliver through `program`.
    pub fn new(program: impl Into<PathBuf>, from: impl Into<MailAddress>) -> Self {
        Self {
            program: program.into(),
            from: from.into(),
            password: None,
        }
    }

    /// Export `password` to the child process.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl MailSink for SendmailSink {
    fn send(&mut self, recipient: &str, subject: &str, html_body: &str) -> Result<(), MenuError> {
        let message = MailMessage {
            from: self.from.clone(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        };
        let mut command = Command::new(&self.program);
        command
            .args(SENDMAIL_ARGS)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(password) = &self.password {
            command.env(SENDMAIL_PASSWORD_ENV, password);
        }
        let mut child = command.spawn().map_err(|err| {
            MenuError::Delivery(format!(
                "failed to start {}: {err}",
                self.program.display()
            ))
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(message.to_rfc5322(&Local::now()).as_bytes())
                .map_err(|err| MenuError::Delivery(format!("failed to pipe message: {err}")))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|err| MenuError::Delivery(format!("sendmail did not finish: {err}")))?;
        if !output.status.success() {
            return Err(MenuError::Delivery(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        info!("[weekly_menu:mail] handed report for {} to sendmail", recipient);
        Ok(())
    }
}

/// Keeps messages in memory instead of sending them.
#[derive(Debug, Default)]
pub struct DryRunSink {
    from: MailAddress,
    sent: Vec<MailMessage>,
}

impl DryRunSink {
    /// Sink recording messages from `from`.
    pub fn new(from: impl Into<MailAddress>) -> Self {
        Self {
            from: from.into(),
            sent: Vec::new(),
        }
    }

    /// Messages captured so far.
    pub fn sent(&self) -> &[MailMessage] {
        &self.sent
    }
}

impl MailSink for DryRunSink {
    fn send(&mut self, recipient: &str, subject: &str, html_body: &str) -> Result<(), MenuError> {
        self.sent.push(MailMessage {
            from: self.from.clone(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}
