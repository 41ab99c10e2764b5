//! Chart rendering for completed bitrate profiles.

pub mod chart;

pub use chart::{ChartRenderer, PngChartRenderer, RenderError, RenderResult};
