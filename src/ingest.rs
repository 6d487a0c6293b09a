//! Raw export produced by the messaging-platform scraper.
//!
//! The network client lives outside this crate. Anything that can resolve a
//! channel title and list its messages implements [`MessageSource`], and
//! [`export_channels`] turns it into the six-column CSV the cleaning stage
//! reads.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::model::RAW_COLUMNS;
use crate::text::log_safe;

/// Per-channel cap on fetched messages.
pub const MESSAGE_LIMIT: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedMessage {
    pub id: i64,
    pub text: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Local path of downloaded photo media, when the message carried any.
    pub media_path: Option<PathBuf>,
}

pub trait MessageSource {
    fn channel_title(&mut self, channel: &str) -> Result<String>;

    /// Up to `limit` messages of `channel`, newest first. Photo media is
    /// downloaded into `media_dir` under [`media_file_name`].
    fn fetch_messages(
        &mut self,
        channel: &str,
        limit: usize,
        media_dir: &Path,
    ) -> Result<Vec<ScrapedMessage>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelExport {
    pub channel: String,
    pub title: String,
    pub messages: usize,
}

pub fn media_file_name(channel_username: &str, message_id: i64) -> String {
    format!("{channel_username}_{message_id}.jpg")
}

pub fn export_channels<S, W>(
    source: &mut S,
    channels: &[String],
    limit: usize,
    media_dir: &Path,
    writer: W,
) -> Result<Vec<ChannelExport>>
where
    S: MessageSource,
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(RAW_COLUMNS)
        .context("failed to write raw export header")?;

    let mut exports = Vec::with_capacity(channels.len());
    for channel in channels {
        let title = source
            .channel_title(channel)
            .with_context(|| format!("failed to resolve channel {channel}"))?;
        let messages = source
            .fetch_messages(channel, limit, media_dir)
            .with_context(|| format!("failed to fetch messages from {channel}"))?;

        for message in &messages {
            let id = message.id.to_string();
            let date = message
                .date
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%:z").to_string())
                .unwrap_or_default();
            let media_path = message
                .media_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default();

            csv_writer
                .write_record([
                    title.as_str(),
                    channel.as_str(),
                    id.as_str(),
                    message.text.as_deref().unwrap_or_default(),
                    date.as_str(),
                    media_path.as_str(),
                ])
                .with_context(|| format!("failed to write message {} of {channel}", message.id))?;
        }

        info!(
            channel = %log_safe(channel),
            messages = messages.len(),
            "scraped data from channel"
        );
        exports.push(ChannelExport {
            channel: channel.clone(),
            title,
            messages: messages.len(),
        });
    }

    csv_writer.flush().context("failed to flush raw export")?;
    Ok(exports)
}
