//! Packet records and the bucketed bitrate series.

use serde::{Deserialize, Serialize};

/// Default bucket width in seconds.
pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;

/// One packet row from the flat `pts_time,size` probe listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketRecord {
    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
    pub size_bytes: u64,
}

impl PacketRecord {
    /// Parse one CSV row. Rows with the wrong field count or
    /// non-numeric fields (ffprobe emits `N/A` for packets without a
    /// pts) return None and are skipped by the caller.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim().split(',');
        let (Some(pts), Some(size), None) = (fields.next(), fields.next(), fields.next()) else {
            return None;
        };
        let pts_secs = pts.trim().parse::<f64>().ok()?;
        let size_bytes = size.trim().parse::<u64>().ok()?;
        Some(Self {
            pts_secs,
            size_bytes,
        })
    }
}

/// Ordered bucket bitrates in kbps: one value per completed interval in
/// timeline order, plus at most one trailing partial interval.
///
/// Intervals that no packet crossed are absent rather than zero, so the
/// series length for a file of duration D is about `ceil(D / interval)`
/// but can be shorter when the stream has gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitrateSeries {
    interval_secs: f64,
    values: Vec<f64>,
}

impl BitrateSeries {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval_secs,
            values: Vec::new(),
        }
    }

    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    /// Bucket values in kbps.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest bucket value, 0.0 for an empty series.
    pub fn max_kbps(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Close a bucket: convert its byte total to kbps and append it.
    pub(crate) fn push_bucket(&mut self, bucket_bytes: u64) {
        let kbps = bucket_bytes as f64 * 8.0 / (self.interval_secs * 1000.0);
        self.values.push(kbps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_rows() {
        assert_eq!(
            PacketRecord::parse_line("0.200000,100"),
            Some(PacketRecord {
                pts_secs: 0.2,
                size_bytes: 100
            })
        );
        assert_eq!(
            PacketRecord::parse_line("  1.5 , 2048 \n"),
            Some(PacketRecord {
                pts_secs: 1.5,
                size_bytes: 2048
            })
        );
    }

    #[test]
    fn rejects_malformed_rows() {
        assert_eq!(PacketRecord::parse_line(""), None);
        assert_eq!(PacketRecord::parse_line("0.5"), None);
        assert_eq!(PacketRecord::parse_line("0.5,100,extra"), None);
        assert_eq!(PacketRecord::parse_line("N/A,100"), None);
        assert_eq!(PacketRecord::parse_line("0.5,N/A"), None);
        assert_eq!(PacketRecord::parse_line("0.5,-3"), None);
        assert_eq!(PacketRecord::parse_line("garbage"), None);
    }

    #[test]
    fn bucket_conversion_is_kbps() {
        let mut series = BitrateSeries::new(1.0);
        // 300 bytes over one second is 2.4 kbps.
        series.push_bucket(300);
        assert_eq!(series.values(), &[2.4]);
    }

    #[test]
    fn conversion_scales_with_interval() {
        let mut series = BitrateSeries::new(2.0);
        series.push_bucket(1000);
        assert!((series.values()[0] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn max_of_empty_series_is_zero() {
        let series = BitrateSeries::new(1.0);
        assert!(series.is_empty());
        assert_eq!(series.max_kbps(), 0.0);
    }
}
