//! New-issue email notifications.
//!
//! [`compose`] renders the announcement, [`send_all`] pushes it through a
//! [`Mailer`] to every subscriber, and [`notify`] ties both to a watermark in
//! `notify-state.json` so a scheduled run only mails each issue once.
//!
//! Delivery is behind the [`Mailer`] trait. The stock implementation,
//! [`OutboxMailer`], writes one `.eml` file per message for an external
//! relay to pick up.

use crate::config::SiteConfig;
use crate::naming;
use crate::sidetable::{self, SideTableError};
use crate::subscribers::{self, Subscriber};
use crate::types::Catalog;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error(transparent)]
    SideTable(#[from] SideTableError),
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// A composed announcement, shared by every recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub number: u32,
    pub subject: String,
    pub html: String,
}

/// One outgoing email.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    pub to: &'a str,
    pub from_name: &'a str,
    pub subject: &'a str,
    pub html: &'a str,
}

pub trait Mailer {
    fn send(&mut self, message: &Message<'_>) -> Result<(), MailError>;
}

/// Writes each message to `<dir>/<seq>-<recipient>.eml`.
///
/// Sequence numbers continue past files already in the outbox, so a later
/// run never overwrites messages the relay has not picked up yet.
#[derive(Debug)]
pub struct OutboxMailer {
    dir: PathBuf,
    seq: usize,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Mailer for OutboxMailer {
    fn send(&mut self, message: &Message<'_>) -> Result<(), MailError> {
        fs::create_dir_all(&self.dir).map_err(|source| MailError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let body = format!(
            "To: {}\r\nFrom: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}",
            message.to, message.from_name, message.subject, message.html
        );
        let slug = naming::slugify(message.to);
        loop {
            self.seq += 1;
            let path = self.dir.join(format!("{:04}-{slug}.eml", self.seq));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    return file
                        .write_all(body.as_bytes())
                        .map_err(|source| MailError::Io { path, source });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(MailError::Io { path, source }),
            }
        }
    }
}

/// Counts from one mailing run. Invalid addresses count as failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub sent: usize,
    pub failed: usize,
}

impl fmt::Display for SendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Email campaign complete: {} sent successfully, {} failed",
            self.sent, self.failed
        )
    }
}

/// Build the announcement for issue `number`.
pub fn compose(config: &SiteConfig, number: u32, year: i32) -> Notice {
    let subject = config
        .notify
        .subject
        .replace("{title}", &config.site.title)
        .replace("{number}", &number.to_string());
    Notice {
        number,
        subject,
        html: render_notice(config, number, year).into_string(),
    }
}

fn render_notice(config: &SiteConfig, number: u32, year: i32) -> Markup {
    let site = &config.site;
    let accent = &config.colors.light.accent;
    let highlight = &config.colors.light.highlight;
    let para = "font-size: 16px; line-height: 1.5;";
    html! {
        div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; color: #333;" {
            div style={ "background-color: " (accent) "; padding: 15px; text-align: center; color: white;" } {
                h1 style="margin: 0; color: white;" { (site.title) }
                p style="margin: 5px 0 0; font-style: italic;" { (site.tagline) }
            }
            div style="padding: 20px; background-color: #f9f9f9; border: 1px solid #ddd; border-top: none;" {
                p style=(para) { "Hello " (site.title) " Reader!" }
                p style=(para) {
                    "We're excited to announce that the newest issue of our newspaper, "
                    strong { "Issue #" (number) }
                    ", is now available."
                }
                p style=(para) { "Check out the latest stories, updates, and campus news by visiting our website." }
                div style="text-align: center; margin: 30px 0;" {
                    a href=(site.home_url)
                        style={ "background-color: " (accent) "; color: white; padding: 12px 25px; text-decoration: none; border-radius: 4px; font-weight: bold; display: inline-block;" } {
                        "Read Now"
                    }
                }
                @if let Some(locations) = &site.print_locations {
                    p style="font-size: 14px; color: #666;" { "Physical copies are available in " (locations) "." }
                }
            }
            div style={ "padding: 15px; background-color: #f0f0f0; font-size: 12px; text-align: center; color: #666; border-top: 3px solid " (highlight) ";" } {
                p { "You're receiving this email because you subscribed to " (site.title) " updates." }
                p { "To unsubscribe, please visit our website and click the \"Unsubscribe\" button in the footer." }
                p { "© " (year) " " (site.title) }
            }
        }
    }
}

/// Send `notice` to every subscriber with a valid address.
pub fn send_all(
    mailer: &mut dyn Mailer,
    notice: &Notice,
    from_name: &str,
    recipients: &[Subscriber],
) -> SendReport {
    let mut report = SendReport::default();
    for recipient in recipients {
        let email = recipient.email.as_str();
        if !subscribers::is_valid_email(email) {
            tracing::warn!(email, "skipped invalid email");
            report.failed += 1;
            continue;
        }
        let message = Message {
            to: email,
            from_name,
            subject: &notice.subject,
            html: &notice.html,
        };
        match mailer.send(&message) {
            Ok(()) => report.sent += 1,
            Err(err) => {
                tracing::warn!(email, error = %err, "failed to send");
                report.failed += 1;
            }
        }
    }
    tracing::info!(sent = report.sent, failed = report.failed, "{report}");
    report
}

/// Highest issue number in the catalog, or its length when no record
/// carries a number.
pub fn latest_issue_number(catalog: &Catalog) -> u32 {
    catalog
        .issues
        .iter()
        .filter_map(|issue| issue.number.or_else(|| naming::issue_number(&issue.title)))
        .max()
        .unwrap_or_else(|| u32::try_from(catalog.len()).unwrap_or(u32::MAX))
}

/// Last issue number that was mailed out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyState {
    pub last_announced: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Nothing newer than the last announcement.
    UpToDate { current: u32, last: u32 },
    Sent { number: u32, report: SendReport },
}

/// Announce the latest issue if it is newer than the last announced one.
///
/// `force` sends regardless of the watermark. Either way a send moves the
/// watermark to the announced number.
pub fn notify(
    catalog: &Catalog,
    config: &SiteConfig,
    recipients: &[Subscriber],
    mailer: &mut dyn Mailer,
    state_dir: &Path,
    year: i32,
    force: bool,
) -> Result<NotifyOutcome, NotifyError> {
    let state_path = state_dir.join(sidetable::NOTIFY_STATE_FILENAME);
    let state: NotifyState = sidetable::load(&state_path)?;
    let current = latest_issue_number(catalog);

    if !force && current <= state.last_announced {
        return Ok(NotifyOutcome::UpToDate {
            current,
            last: state.last_announced,
        });
    }

    let notice = compose(config, current, year);
    let report = send_all(mailer, &notice, &config.notify.sender_name, recipients);
    sidetable::save(
        &state_path,
        &NotifyState {
            last_announced: current,
        },
    )?;
    Ok(NotifyOutcome::Sent {
        number: current,
        report,
    })
}
