use std::path::Path;

use super::TranscriptSegment;
use crate::error::{PodwiseError, Result};

/// Format whole seconds as `HH:MM:SS`. Hours widen past two digits when needed.
pub fn format_timestamp(offset_seconds: u64) -> String {
    let hours = offset_seconds / 3600;
    let minutes = (offset_seconds % 3600) / 60;
    let seconds = offset_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parse `HH:MM:SS` back into whole seconds
pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
    let parts: Vec<&str> = timestamp.split(':').collect();
    if parts.len() != 3 {
        return Err(PodwiseError::Extraction(format!(
            "Invalid timestamp format: {}",
            timestamp
        )));
    }

    let mut fields = [0u64; 3];
    for (field, part) in fields.iter_mut().zip(&parts) {
        *field = part.parse().map_err(|_| {
            PodwiseError::Extraction(format!("Invalid timestamp field '{}' in {}", part, timestamp))
        })?;
    }

    let [hours, minutes, seconds] = fields;
    if minutes >= 60 || seconds >= 60 {
        return Err(PodwiseError::Extraction(format!(
            "Timestamp out of range: {}",
            timestamp
        )));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Turn line breaks into spaces so a segment stays on one line
fn clean_text(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Render segments as transcript file content, one line per segment
pub fn render_transcript(segments: &[TranscriptSegment]) -> String {
    let mut content = String::new();

    for segment in segments {
        content.push_str(&format_timestamp(segment.offset_seconds));
        content.push(' ');
        content.push_str(&clean_text(&segment.text));
        content.push('\n');
    }

    content
}

/// Parse transcript file content back into segments
pub fn parse_transcript(content: &str) -> Result<Vec<TranscriptSegment>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let (timestamp, text) = line.split_once(' ').unwrap_or((line, ""));
            let offset_seconds = parse_timestamp(timestamp).map_err(|e| {
                PodwiseError::Extraction(format!("line {}: {}", i + 1, e))
            })?;
            Ok(TranscriptSegment::new(offset_seconds, text))
        })
        .collect()
}

/// Transcript file on disk
pub struct TranscriptFile;

impl TranscriptFile {
    /// Write rendered segments to `path`, replacing any previous file
    pub async fn write<P: AsRef<Path>>(path: P, segments: &[TranscriptSegment]) -> Result<()> {
        tokio::fs::write(path.as_ref(), render_transcript(segments)).await?;
        Ok(())
    }

    /// Read the raw transcript text used as extraction input
    pub async fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
        Ok(tokio::fs::read_to_string(path.as_ref()).await?)
    }

    /// Read and parse a transcript file
    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Vec<TranscriptSegment>> {
        let content = Self::read_text(path).await?;
        parse_transcript(&content)
    }
}
