//! PNG line-chart rendering of a bitrate series.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use thiserror::Error;

use crate::analysis::BitrateSeries;

/// Errors from chart rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No bitrate data was generated to plot")]
    EmptySeries,
    #[error("Failed to write chart image: {0}")]
    Image(#[from] image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Renders a completed bitrate series into a persisted artifact.
///
/// `details` is the annotation text describing the source file; a
/// renderer may embed, log or ignore it.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, series: &BitrateSeries, details: &str, source: &Path) -> RenderResult<PathBuf>;
}

const MARGIN: u32 = 60;
const GRID_LINES: u32 = 4;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
const LINE: Rgb<u8> = Rgb([31, 119, 180]);

/// Draws the bucket polyline with an axis frame and horizontal
/// gridlines, and writes `bitrate_chart_<stem>.png` into the configured
/// output directory. The annotation text is logged rather than drawn;
/// nothing in the stack rasterizes fonts.
pub struct PngChartRenderer {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl PngChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            width: 1500,
            height: 800,
        }
    }

    pub fn from_settings(settings: &crate::config::ChartSettings) -> Self {
        Self {
            output_dir: PathBuf::from(&settings.output_folder),
            width: settings.width,
            height: settings.height,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Deterministic artifact path from the source file's stem.
    pub fn artifact_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.output_dir.join(format!("bitrate_chart_{}.png", stem))
    }

    fn plot(&self, series: &BitrateSeries) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);

        let left = MARGIN;
        let right = self.width.saturating_sub(MARGIN).max(left + 1);
        let top = MARGIN;
        let bottom = self.height.saturating_sub(MARGIN).max(top + 1);

        for y in [top, bottom] {
            draw_segment(&mut img, left as f64, y as f64, right as f64, y as f64, FRAME);
        }
        for x in [left, right] {
            draw_segment(&mut img, x as f64, top as f64, x as f64, bottom as f64, FRAME);
        }
        for i in 1..=GRID_LINES {
            let y = top as f64 + (bottom - top) as f64 * i as f64 / (GRID_LINES + 1) as f64;
            draw_segment(&mut img, (left + 1) as f64, y, (right - 1) as f64, y, GRID);
        }

        let values = series.values();
        let max = series.max_kbps().max(f64::MIN_POSITIVE);
        let plot_w = (right - left) as f64;
        let plot_h = (bottom - top) as f64;
        let point = |i: usize, v: f64| {
            let x = if values.len() < 2 {
                left as f64 + plot_w / 2.0
            } else {
                left as f64 + plot_w * i as f64 / (values.len() - 1) as f64
            };
            let y = bottom as f64 - plot_h * (v / max).clamp(0.0, 1.0);
            (x, y)
        };

        if values.len() == 1 {
            let (x, y) = point(0, values[0]);
            draw_segment(&mut img, x, bottom as f64, x, y, LINE);
        } else {
            for i in 1..values.len() {
                let (x0, y0) = point(i - 1, values[i - 1]);
                let (x1, y1) = point(i, values[i]);
                draw_segment(&mut img, x0, y0, x1, y1, LINE);
            }
        }
        img
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render(&self, series: &BitrateSeries, details: &str, source: &Path) -> RenderResult<PathBuf> {
        if series.is_empty() {
            return Err(RenderError::EmptySeries);
        }
        let target = self.artifact_path(source);
        let img = self.plot(series);
        img.save(&target)?;
        tracing::info!(
            "Rendered {} buckets to {} [{}]",
            series.len(),
            target.display(),
            details.replace('\n', " | ")
        );
        Ok(target)
    }
}

/// Straightforward sampled line interpolation; good enough for a chart
/// polyline at these resolutions.
fn draw_segment(img: &mut RgbImage, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb<u8>) {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = (x0 + dx * t).round();
        let y = (y0 + dy * t).round();
        if x >= 0.0 && y >= 0.0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(values: &[u64]) -> BitrateSeries {
        let mut series = BitrateSeries::new(1.0);
        for &bytes in values {
            series.push_bucket(bytes);
        }
        series
    }

    #[test]
    fn artifact_name_uses_source_stem() {
        let renderer = PngChartRenderer::new("/tmp/charts");
        let path = renderer.artifact_path(Path::new("/media/My Movie.mkv"));
        assert_eq!(
            path,
            PathBuf::from("/tmp/charts/bitrate_chart_My Movie.png")
        );
    }

    #[test]
    fn empty_series_is_rejected_before_any_io() {
        let renderer = PngChartRenderer::new("/definitely/not/writable");
        let result = renderer.render(
            &BitrateSeries::new(1.0),
            "details",
            Path::new("/media/clip.mkv"),
        );
        assert!(matches!(result, Err(RenderError::EmptySeries)));
    }

    #[test]
    fn writes_a_png_for_a_real_series() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PngChartRenderer::new(dir.path()).with_dimensions(300, 200);
        let series = series_of(&[1000, 4000, 2000, 8000, 500]);
        let path = renderer
            .render(&series, "Duration: 5.00s", Path::new("/media/clip.mkv"))
            .unwrap();
        assert_eq!(path, dir.path().join("bitrate_chart_clip.png"));
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn single_bucket_series_renders() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PngChartRenderer::new(dir.path()).with_dimensions(300, 200);
        let series = series_of(&[1000]);
        let path = renderer
            .render(&series, "", Path::new("/media/one.mkv"))
            .unwrap();
        assert!(path.exists());
    }
}
