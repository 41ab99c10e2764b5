//! Container and stream metadata via the JSON probe.

use std::ffi::OsStr;
use std::path::Path;

use serde_json::Value;

use crate::probe::launcher::{ProbeStream, PROBE_TOOL};
use crate::probe::types::{
    MediaDescriptor, ProbeError, ProbeResult, StreamDescriptor, StreamKind,
};

/// Probe a media file and build its descriptor.
///
/// Runs `ffprobe -v quiet -print_format json -show_format -show_streams`
/// and parses the format block plus every video/audio stream entry.
pub fn read_metadata(path: &Path) -> ProbeResult<MediaDescriptor> {
    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    let args: Vec<&OsStr> = vec![
        "-v".as_ref(),
        "quiet".as_ref(),
        "-print_format".as_ref(),
        "json".as_ref(),
        "-show_format".as_ref(),
        "-show_streams".as_ref(),
        path.as_os_str(),
    ];
    let mut probe = ProbeStream::spawn(args)?;
    let payload = probe.read_to_string()?;
    probe.wait()?.into_result()?;

    let json: Value = serde_json::from_str(&payload)
        .map_err(|e| ProbeError::malformed_output(PROBE_TOOL, e.to_string()))?;

    let descriptor = parse_metadata(&json, path)?;
    tracing::debug!(
        "Probed {}: {:.2}s, {} streams, target {}",
        path.display(),
        descriptor.duration_secs,
        descriptor.streams.len(),
        descriptor.target_kind()
    );
    Ok(descriptor)
}

/// ffprobe reports most numeric format fields as strings.
fn field_as_f64(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn field_as_u64(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn parse_metadata(json: &Value, path: &Path) -> ProbeResult<MediaDescriptor> {
    let format = json.get("format");
    let duration_secs =
        field_as_f64(format.and_then(|f| f.get("duration"))).unwrap_or(0.0);
    let size_bytes = field_as_u64(format.and_then(|f| f.get("size"))).unwrap_or(0);
    let bit_rate = field_as_u64(format.and_then(|f| f.get("bit_rate")));

    let mut streams = Vec::new();
    if let Some(entries) = json.get("streams").and_then(|s| s.as_array()) {
        for (position, entry) in entries.iter().enumerate() {
            if let Some(descriptor) = parse_stream(position, entry) {
                streams.push(descriptor);
            }
        }
    }

    MediaDescriptor::new(path.to_path_buf(), duration_secs, size_bytes, bit_rate, streams)
}

fn parse_stream(position: usize, entry: &Value) -> Option<StreamDescriptor> {
    let kind = StreamKind::from_codec_type(entry.get("codec_type")?.as_str()?)?;
    let index = field_as_u64(entry.get("index"))
        .map(|i| i as usize)
        .unwrap_or(position);
    let codec_name = entry
        .get("codec_name")
        .and_then(|c| c.as_str())
        .unwrap_or("unknown")
        .to_string();
    Some(StreamDescriptor {
        index,
        kind,
        codec_name,
        width: field_as_u64(entry.get("width")).map(|w| w as u32),
        height: field_as_u64(entry.get("height")).map(|h| h as u32),
        sample_rate: field_as_u64(entry.get("sample_rate")).map(|r| r as u32),
        channels: field_as_u64(entry.get("channels")).map(|c| c as u32),
        channel_layout: entry
            .get("channel_layout")
            .and_then(|l| l.as_str())
            .map(|l| l.to_string()),
        bit_rate: field_as_u64(entry.get("bit_rate")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_format_and_streams() {
        let payload = json!({
            "format": {
                "duration": "120.500000",
                "size": "52428800",
                "bit_rate": "3500000"
            },
            "streams": [
                {
                    "index": 0,
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "bit_rate": "5000000"
                },
                {
                    "index": 1,
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "sample_rate": "48000",
                    "channels": 2,
                    "channel_layout": "stereo",
                    "bit_rate": "128000"
                },
                {
                    "index": 2,
                    "codec_type": "subtitle",
                    "codec_name": "subrip"
                }
            ]
        });

        let d = parse_metadata(&payload, Path::new("/media/sample.mkv")).unwrap();
        assert!((d.duration_secs - 120.5).abs() < 1e-9);
        assert_eq!(d.size_bytes, 52_428_800);
        assert_eq!(d.bit_rate, Some(3_500_000));
        // Subtitle stream dropped.
        assert_eq!(d.streams.len(), 2);
        assert_eq!(d.target_kind(), StreamKind::Video);
        assert_eq!(d.target_stream().width, Some(1920));
    }

    #[test]
    fn audio_only_file_targets_audio() {
        let payload = json!({
            "format": { "duration": "30.0", "size": "1000000" },
            "streams": [
                { "index": 0, "codec_type": "audio", "codec_name": "flac",
                  "sample_rate": "44100", "channels": 2 }
            ]
        });
        let d = parse_metadata(&payload, Path::new("/media/song.flac")).unwrap();
        assert_eq!(d.target_kind(), StreamKind::Audio);
        assert_eq!(d.bit_rate, None);
    }

    #[test]
    fn subtitle_only_file_has_no_media_stream() {
        let payload = json!({
            "format": { "duration": "30.0" },
            "streams": [
                { "index": 0, "codec_type": "subtitle", "codec_name": "ass" }
            ]
        });
        let result = parse_metadata(&payload, Path::new("/media/subs.mks"));
        assert!(matches!(result, Err(ProbeError::NoMediaStream(_))));
    }

    #[test]
    fn missing_duration_defaults_to_zero() {
        let payload = json!({
            "format": {},
            "streams": [
                { "index": 0, "codec_type": "video", "codec_name": "mjpeg" }
            ]
        });
        let d = parse_metadata(&payload, Path::new("/media/still.jpg")).unwrap();
        assert_eq!(d.duration_secs, 0.0);
    }

    #[test]
    fn read_metadata_rejects_missing_file() {
        let result = read_metadata(Path::new("/nonexistent/file.mkv"));
        assert!(matches!(result, Err(ProbeError::FileNotFound(_))));
    }
}
