//! Probe error types and media descriptors.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while probing a media file.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The probe executable is not on PATH.
    #[error("'{tool}' was not found. Is FFmpeg installed and on PATH?")]
    ToolNotFound { tool: String },

    /// The probe process could not be started for a reason other than
    /// a missing executable.
    #[error("Failed to launch '{tool}': {source}")]
    LaunchFailed {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe ran but exited with a non-zero status.
    #[error("'{tool}' failed with exit code {exit_code}: {stderr}")]
    ProbeFailed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    /// The probe produced output we could not parse.
    #[error("Failed to parse '{tool}' output: {message}")]
    MalformedOutput { tool: String, message: String },

    /// The file has neither a video nor an audio stream.
    #[error("No video or audio stream found in {0}")]
    NoMediaStream(PathBuf),

    /// I/O failure while talking to the probe process.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn launch_failed(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self::LaunchFailed {
            tool: tool.into(),
            source,
        }
    }

    pub fn probe_failed(tool: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProbeFailed {
            tool: tool.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn malformed_output(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// The kind of stream a bitrate profile is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// Map an ffprobe `codec_type` value. Subtitle, data and attachment
    /// streams have no packet-size profile and map to None.
    pub fn from_codec_type(codec_type: &str) -> Option<Self> {
        match codec_type {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    /// The `-select_streams` specifier for the first stream of this kind.
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Video => "v:0",
            Self::Audio => "a:0",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stream as reported by the metadata probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream index within the container.
    pub index: usize,
    pub kind: StreamKind,
    pub codec_name: String,
    /// Video only.
    pub width: Option<u32>,
    /// Video only.
    pub height: Option<u32>,
    /// Audio only, in Hz.
    pub sample_rate: Option<u32>,
    /// Audio only.
    pub channels: Option<u32>,
    /// Audio only, e.g. "stereo".
    pub channel_layout: Option<String>,
    /// Declared stream bitrate in bits per second, when the container
    /// reports one.
    pub bit_rate: Option<u64>,
}

/// Container-level metadata plus the stream the analysis will target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub source_path: PathBuf,
    /// Container duration in seconds; 0.0 when the container does not
    /// report one.
    pub duration_secs: f64,
    pub size_bytes: u64,
    /// Overall container bitrate in bits per second.
    pub bit_rate: Option<u64>,
    pub streams: Vec<StreamDescriptor>,
    /// Index into `streams` of the stream selected for analysis.
    target: usize,
}

impl MediaDescriptor {
    /// Build a descriptor, selecting the target stream: the first video
    /// stream in declaration order, else the first audio stream.
    pub fn new(
        source_path: PathBuf,
        duration_secs: f64,
        size_bytes: u64,
        bit_rate: Option<u64>,
        streams: Vec<StreamDescriptor>,
    ) -> ProbeResult<Self> {
        let target = select_target(&streams)
            .ok_or_else(|| ProbeError::NoMediaStream(source_path.clone()))?;
        Ok(Self {
            source_path,
            duration_secs,
            size_bytes,
            bit_rate,
            streams,
            target,
        })
    }

    /// The stream the bitrate profile is built from.
    pub fn target_stream(&self) -> &StreamDescriptor {
        &self.streams[self.target]
    }

    pub fn target_kind(&self) -> StreamKind {
        self.target_stream().kind
    }

    fn first_stream(&self, kind: StreamKind) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.kind == kind)
    }

    /// Three-line summary used as the chart annotation: container
    /// totals, then the first video stream, then the first audio stream.
    pub fn details_summary(&self) -> String {
        let size_mb = self.size_bytes as f64 / (1024.0 * 1024.0);
        let overall = match self.bit_rate {
            Some(bits) => format!("{:.0} kbps", bits as f64 / 1000.0),
            None => "N/A".to_string(),
        };
        let mut lines = vec![format!(
            "Duration: {:.2}s  |  Size: {:.2} MB  |  Overall Bitrate: {}",
            self.duration_secs, size_mb, overall
        )];

        match self.first_stream(StreamKind::Video) {
            Some(v) => {
                let resolution = match (v.width, v.height) {
                    (Some(w), Some(h)) => format!("{}x{}", w, h),
                    _ => "unknown resolution".to_string(),
                };
                lines.push(format!(
                    "Video: {}, {}, {}",
                    v.codec_name.to_uppercase(),
                    resolution,
                    describe_stream_rate(v.bit_rate)
                ));
            }
            None => lines.push("Video: N/A".to_string()),
        }

        match self.first_stream(StreamKind::Audio) {
            Some(a) => {
                let rate = match a.sample_rate {
                    Some(hz) => format!("{:.1} kHz", hz as f64 / 1000.0),
                    None => "unknown rate".to_string(),
                };
                let layout = a
                    .channel_layout
                    .clone()
                    .or_else(|| a.channels.map(|c| format!("{} ch", c)))
                    .unwrap_or_else(|| "unknown layout".to_string());
                lines.push(format!(
                    "Audio: {}, {}, {}, {}",
                    a.codec_name.to_uppercase(),
                    rate,
                    layout,
                    describe_stream_rate(a.bit_rate)
                ));
            }
            None => lines.push("Audio: N/A".to_string()),
        }

        lines.join("\n")
    }
}

fn describe_stream_rate(bit_rate: Option<u64>) -> String {
    match bit_rate {
        Some(bits) => format!("~{:.0} kbps", bits as f64 / 1000.0),
        None => "bitrate N/A".to_string(),
    }
}

/// First video stream in declaration order, else first audio stream.
fn select_target(streams: &[StreamDescriptor]) -> Option<usize> {
    streams
        .iter()
        .position(|s| s.kind == StreamKind::Video)
        .or_else(|| streams.iter().position(|s| s.kind == StreamKind::Audio))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_stream(index: usize) -> StreamDescriptor {
        StreamDescriptor {
            index,
            kind: StreamKind::Video,
            codec_name: "h264".to_string(),
            width: Some(1920),
            height: Some(1080),
            sample_rate: None,
            channels: None,
            channel_layout: None,
            bit_rate: Some(5_000_000),
        }
    }

    fn audio_stream(index: usize) -> StreamDescriptor {
        StreamDescriptor {
            index,
            kind: StreamKind::Audio,
            codec_name: "aac".to_string(),
            width: None,
            height: None,
            sample_rate: Some(48_000),
            channels: Some(2),
            channel_layout: Some("stereo".to_string()),
            bit_rate: Some(128_000),
        }
    }

    fn descriptor(streams: Vec<StreamDescriptor>) -> ProbeResult<MediaDescriptor> {
        MediaDescriptor::new(
            PathBuf::from("/media/sample.mkv"),
            120.5,
            52_428_800,
            Some(3_500_000),
            streams,
        )
    }

    #[test]
    fn video_wins_over_earlier_audio() {
        let d = descriptor(vec![audio_stream(0), video_stream(1), audio_stream(2)]).unwrap();
        assert_eq!(d.target_kind(), StreamKind::Video);
        assert_eq!(d.target_stream().index, 1);
    }

    #[test]
    fn first_audio_when_no_video() {
        let mut second = audio_stream(1);
        second.codec_name = "opus".to_string();
        let d = descriptor(vec![audio_stream(0), second]).unwrap();
        assert_eq!(d.target_kind(), StreamKind::Audio);
        assert_eq!(d.target_stream().codec_name, "aac");
    }

    #[test]
    fn no_streams_is_an_error() {
        let result = descriptor(vec![]);
        assert!(matches!(result, Err(ProbeError::NoMediaStream(_))));
    }

    #[test]
    fn codec_type_mapping_skips_subtitles() {
        assert_eq!(StreamKind::from_codec_type("video"), Some(StreamKind::Video));
        assert_eq!(StreamKind::from_codec_type("audio"), Some(StreamKind::Audio));
        assert_eq!(StreamKind::from_codec_type("subtitle"), None);
        assert_eq!(StreamKind::from_codec_type("data"), None);
    }

    #[test]
    fn selector_targets_first_of_kind() {
        assert_eq!(StreamKind::Video.selector(), "v:0");
        assert_eq!(StreamKind::Audio.selector(), "a:0");
    }

    #[test]
    fn details_summary_lists_all_three_lines() {
        let d = descriptor(vec![video_stream(0), audio_stream(1)]).unwrap();
        let summary = d.details_summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Duration: 120.50s"));
        assert!(lines[0].contains("Size: 50.00 MB"));
        assert!(lines[0].contains("3500 kbps"));
        assert!(lines[1].contains("H264"));
        assert!(lines[1].contains("1920x1080"));
        assert!(lines[2].contains("AAC"));
        assert!(lines[2].contains("48.0 kHz"));
        assert!(lines[2].contains("stereo"));
    }

    #[test]
    fn details_summary_audio_only() {
        let d = descriptor(vec![audio_stream(0)]).unwrap();
        let summary = d.details_summary();
        assert!(summary.contains("Video: N/A"));
        assert!(summary.contains("Audio: AAC"));
    }
}
