//! Streaming aggregation of packet sizes into bitrate buckets.

use std::ffi::OsStr;
use std::path::Path;

use crate::analysis::types::{BitrateSeries, PacketRecord};
use crate::probe::launcher::ProbeStream;
use crate::probe::types::{ProbeError, ProbeResult, StreamKind};

/// Build a bitrate profile for the first stream of `target` kind.
///
/// Streams `pts_time,size` rows from ffprobe and folds them into
/// `interval_secs`-wide buckets in a single pass; packet rows that fail
/// to parse are skipped. `on_progress` receives whole percentages in
/// non-decreasing order, and always receives a final `100` exactly once,
/// even for a file with no usable duration (which yields an empty
/// series without invoking the probe at all).
pub fn sample_bitrate(
    path: &Path,
    target: StreamKind,
    total_duration_secs: f64,
    interval_secs: f64,
    mut on_progress: impl FnMut(u32),
) -> ProbeResult<BitrateSeries> {
    if total_duration_secs <= 0.0 {
        tracing::warn!(
            "No usable duration for {}; producing an empty profile",
            path.display()
        );
        on_progress(100);
        return Ok(BitrateSeries::new(interval_secs));
    }
    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    let selector = target.selector();
    let args: Vec<&OsStr> = vec![
        "-v".as_ref(),
        "quiet".as_ref(),
        "-select_streams".as_ref(),
        selector.as_ref(),
        "-show_entries".as_ref(),
        "packet=pts_time,size".as_ref(),
        "-of".as_ref(),
        "csv=p=0".as_ref(),
        path.as_os_str(),
    ];
    let mut probe = ProbeStream::spawn(args)?;

    let packets = probe
        .lines()
        .filter_map(|line| PacketRecord::parse_line(&line));
    let series = fold_packets(packets, total_duration_secs, interval_secs, &mut on_progress);

    probe.wait()?.into_result()?;

    on_progress(100);
    tracing::debug!(
        "Sampled {} buckets ({}s interval) from {}",
        series.len(),
        interval_secs,
        path.display()
    );
    Ok(series)
}

/// The bucket fold, separated from process I/O.
///
/// A packet at or past the current bucket boundary closes exactly one
/// bucket and advances the boundary by one interval; a packet that jumps
/// several intervals ahead does not synthesize empty buckets in between.
/// Whatever accumulated after the last boundary becomes a trailing
/// partial bucket, converted with the full-interval divisor.
fn fold_packets(
    packets: impl Iterator<Item = PacketRecord>,
    total_duration_secs: f64,
    interval_secs: f64,
    on_progress: &mut impl FnMut(u32),
) -> BitrateSeries {
    let mut series = BitrateSeries::new(interval_secs);
    let mut bucket_end = interval_secs;
    let mut bucket_bytes: u64 = 0;
    let mut last_percent: i64 = -1;

    for packet in packets {
        if packet.pts_secs >= bucket_end {
            series.push_bucket(bucket_bytes);
            bucket_bytes = 0;
            bucket_end += interval_secs;
        }
        bucket_bytes += packet.size_bytes;

        // Container durations are approximate; a packet pts can land
        // past the reported end, so the percentage is clamped.
        let percent = ((packet.pts_secs / total_duration_secs * 100.0).floor() as i64).clamp(0, 100);
        if percent > last_percent {
            on_progress(percent as u32);
            last_percent = percent;
        }
    }

    if bucket_bytes > 0 {
        series.push_bucket(bucket_bytes);
    }
    series
}
