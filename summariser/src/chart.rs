use anyhow::Context;
use cema_summary_model::TimeSeries;
use log::debug;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const FONT_FAMILY: &str = "sans-serif";
const CHART_SIZE: (u32, u32) = (1200, 1000);
const TITLE: &str = "CEMAFoam - Chemical Explosive Mode Analysis";
const BAND_COLOR: RGBColor = RGBColor(255, 165, 0);

/// Fonts tried, in order, when no font file is configured
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED_FONT: OnceLock<PathBuf> = OnceLock::new();

/// Locate a usable font, preferring `configured` over the built-in candidate list
pub fn find_font(configured: Option<&Path>) -> Option<PathBuf> {
    match configured {
        Some(path) => path.is_file().then(|| path.to_path_buf()),
        None => FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file()),
    }
}

/// Register the font used for all chart text. Only the first registration takes effect.
fn register_font(font: &Path) -> anyhow::Result<()> {
    if let Some(registered) = REGISTERED_FONT.get() {
        debug!("Chart font already registered from {}", registered.display());
        return Ok(());
    }

    let bytes = std::fs::read(font)
        .with_context(|| format!("Failed to read font {}", font.display()))?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| anyhow::anyhow!("Invalid font file {}", font.display()))?;
    let _ = REGISTERED_FONT.set(font.to_path_buf());

    debug!("Registered chart font {}", font.display());
    Ok(())
}

/// Draw the four-panel CEM chart for a series and save it as a PNG at `path`.
///
/// Panels: extremes on a symmetric log axis, mean, positive fraction, and the min-max band.
pub fn render_chart(series: &TimeSeries, path: &Path, font: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(!series.is_empty(), "Cannot chart an empty time series");
    register_font(font)?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(TITLE, (FONT_FAMILY, 26))?;
    let panels = root.split_evenly((2, 2));

    let times = series.times();
    let x_range = time_axis(&times);

    draw_extremes(&panels[0], series, x_range).context("Extremes panel")?;
    draw_mean(&panels[1], series, x_range).context("Mean panel")?;
    draw_positive_fraction(&panels[2], series, x_range).context("Positive fraction panel")?;
    draw_band(&panels[3], series, x_range).context("Range panel")?;

    root.present()
        .with_context(|| format!("Failed to write chart {}", path.display()))?;
    Ok(())
}

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn draw_extremes(area: &Panel<'_>, series: &TimeSeries, x: (f64, f64)) -> anyhow::Result<()> {
    let maxs = series.iter().map(|s| (s.time, symlog(s.max))).collect::<Vec<_>>();
    let mins = series.iter().map(|s| (s.time, symlog(s.min))).collect::<Vec<_>>();
    let y = value_axis(maxs.iter().chain(mins.iter()).map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(area)
        .caption("CEM extremes over time", (FONT_FAMILY, 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x.0..x.1, y.0..y.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("CEM (1/s, symlog)")
        .x_label_formatter(&|t| format!("{t:.1e}"))
        .y_label_formatter(&|v| format!("{:.0e}", symlog_inverse(*v)))
        .draw()?;

    zero_line(&mut chart, x)?;
    chart
        .draw_series(LineSeries::new(maxs, RED.stroke_width(2)))?
        .label("Max CEM")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart
        .draw_series(LineSeries::new(mins, BLUE.stroke_width(2)))?
        .label("Min CEM")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_mean(area: &Panel<'_>, series: &TimeSeries, x: (f64, f64)) -> anyhow::Result<()> {
    let means = series.iter().map(|s| (s.time, s.mean)).collect::<Vec<_>>();
    let y = value_axis(means.iter().map(|(_, v)| *v).chain(std::iter::once(0.0)));

    let mut chart = ChartBuilder::on(area)
        .caption("Mean CEM over time", (FONT_FAMILY, 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x.0..x.1, y.0..y.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Mean CEM (1/s)")
        .x_label_formatter(&|t| format!("{t:.1e}"))
        .y_label_formatter(&|v| format!("{v:.1e}"))
        .draw()?;

    zero_line(&mut chart, x)?;
    chart.draw_series(LineSeries::new(means, GREEN.stroke_width(2)))?;
    Ok(())
}

fn draw_positive_fraction(area: &Panel<'_>, series: &TimeSeries, x: (f64, f64)) -> anyhow::Result<()> {
    let fractions = series
        .iter()
        .map(|s| (s.time, s.positive_fraction))
        .collect::<Vec<_>>();

    let mut chart = ChartBuilder::on(area)
        .caption("Explosive region fraction", (FONT_FAMILY, 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x.0..x.1, 0.0..100.0)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Positive CEM (%)")
        .x_label_formatter(&|t| format!("{t:.1e}"))
        .draw()?;

    chart.draw_series(LineSeries::new(fractions, MAGENTA.stroke_width(2)))?;
    Ok(())
}

fn draw_band(area: &Panel<'_>, series: &TimeSeries, x: (f64, f64)) -> anyhow::Result<()> {
    let upper = series.iter().map(|s| (s.time, symlog(s.max)));
    let lower = series.iter().rev().map(|s| (s.time, symlog(s.min)));
    let outline = upper.chain(lower).collect::<Vec<_>>();
    let y = value_axis(outline.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(area)
        .caption("CEM range", (FONT_FAMILY, 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x.0..x.1, y.0..y.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("CEM (1/s, symlog)")
        .x_label_formatter(&|t| format!("{t:.1e}"))
        .y_label_formatter(&|v| format!("{:.0e}", symlog_inverse(*v)))
        .draw()?;

    chart.draw_series(std::iter::once(Polygon::new(
        outline,
        BAND_COLOR.mix(0.3).filled(),
    )))?;
    zero_line(&mut chart, x)?;
    Ok(())
}

fn zero_line(
    chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    x: (f64, f64),
) -> anyhow::Result<()> {
    chart.draw_series(LineSeries::new(vec![(x.0, 0.0), (x.1, 0.0)], BLACK.mix(0.4)))?;
    Ok(())
}

/// Symmetric log transform, linear around zero and logarithmic in both tails
fn symlog(v: f64) -> f64 {
    v.signum() * v.abs().ln_1p() / std::f64::consts::LN_10
}

fn symlog_inverse(v: f64) -> f64 {
    v.signum() * (v.abs() * std::f64::consts::LN_10).exp_m1()
}

fn time_axis(times: &[f64]) -> (f64, f64) {
    let start = times.iter().copied().fold(f64::INFINITY, f64::min);
    let end = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if end > start {
        (start, end)
    } else {
        let pad = (start.abs() * 0.5).max(1e-9);
        (start - pad, end + pad)
    }
}

fn value_axis(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.5 };
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cema_summary_model::SnapshotStatistic;

    const FONT_ENV: &str = "CEMA_CHART_FONT";

    #[test]
    fn symlog_is_invertible_and_odd() {
        for v in [-2e7, -3.5, 0.0, 1e-3, 42.0, 1e9] {
            let back = symlog_inverse(symlog(v));
            assert!((back - v).abs() <= 1e-9 * v.abs().max(1.0), "{v} -> {back}");
            assert_eq!(symlog(-v), -symlog(v));
        }
        assert!((symlog(9.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_time_axis_is_widened() {
        let (lo, hi) = time_axis(&[2e-4]);
        assert!(lo < 2e-4 && hi > 2e-4);
        assert_eq!(time_axis(&[0.0, 1.0]), (0.0, 1.0));
    }

    #[test]
    fn flat_value_axis_is_widened() {
        let (lo, hi) = value_axis([3.0, 3.0].into_iter());
        assert!(lo < 3.0 && hi > 3.0);
        assert_eq!(value_axis(std::iter::empty()), (-1.0, 1.0));
    }

    #[test]
    fn configured_font_must_exist() {
        assert_eq!(find_font(Some(Path::new("/no/such/font.ttf"))), None);
    }

    #[test]
    fn empty_series_is_not_charted() {
        let dir = tempfile::tempdir().unwrap();
        let result = render_chart(
            &TimeSeries::new(),
            &dir.path().join("cem.png"),
            Path::new("/no/font.ttf"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn renders_png() -> anyhow::Result<()> {
        env_logger::try_init().ok();

        let configured = std::env::var_os(FONT_ENV).map(PathBuf::from);
        let Some(font) = find_font(configured.as_deref()) else {
            log::warn!("No chart font found, set {FONT_ENV} to render the chart in this test");
            eprintln!("renders_png skipped: no chart font, set {FONT_ENV} to a TrueType file");
            return Ok(());
        };

        let series: TimeSeries = [(0.0, -5.0, -80.0), (1e-4, -2.0, -60.0), (2e-4, 3e6, -40.0)]
            .into_iter()
            .map(|(time, max, min)| SnapshotStatistic {
                time,
                max,
                min,
                mean: (max + min) / 2.0,
                positive_fraction: if max > 0.0 { 12.5 } else { 0.0 },
            })
            .collect();

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cem_analysis.png");
        render_chart(&series, &path, &font)?;

        assert!(std::fs::metadata(&path)?.len() > 0);
        Ok(())
    }
}
