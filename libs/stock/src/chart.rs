use charming::{
    Chart, ImageFormat, ImageRenderer,
    component::{Axis, Title},
    element::{AxisLabel, AxisType, LineStyle, SplitLine, Symbol, TextStyle},
    series::Line,
};
use chrono_tz::Tz;
use image::{
    Delay, Frame, ImageFormat as RasterFormat,
    codecs::gif::{GifEncoder, Repeat},
};
use tracing::debug;

use crate::{
    error::{Result, StockError},
    format::display2,
    indicators::Bollinger,
    models::{Period, PriceHistory, PricePoint},
};

const BACKGROUND: &str = "#0b0c17";
const GRID: &str = "#2d2f45";
const LABEL: &str = "#a0a0a0";
const BULL: &str = "#00d084";
const BEAR: &str = "#ff4d4f";

const BANDS_WIDTH: u32 = 1200;
const BANDS_HEIGHT: u32 = 600;

const ANIM_WIDTH: u32 = 800;
const ANIM_HEIGHT: u32 = 400;
const MAX_FRAMES: usize = 40;
const FRAME_MS: u32 = 100;
const HOLD_MS: u32 = 2000;
const X_LABELS: usize = 8;

fn dates(points: impl Iterator<Item = chrono::DateTime<chrono::Utc>>, tz: Tz) -> Vec<String> {
    points
        .map(|t| t.with_timezone(&tz).format("%Y-%m-%d").to_string())
        .collect()
}

fn label_interval(n: usize) -> u32 {
    (n / X_LABELS).saturating_sub(1) as u32
}

fn base_chart(title: String, dates: Vec<String>) -> Chart {
    let interval = label_interval(dates.len());

    Chart::new()
        .background_color(BACKGROUND)
        .title(
            Title::new()
                .text(title)
                .left("center")
                .top("2%")
                .text_style(TextStyle::new().color("#ffffff").font_size(14)),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(dates)
                .axis_label(AxisLabel::new().rotate(45).interval(interval).color(LABEL))
                .split_line(SplitLine::new().line_style(LineStyle::new().color(GRID))),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .scale(true)
                .axis_label(AxisLabel::new().color(LABEL))
                .split_line(SplitLine::new().line_style(LineStyle::new().color(GRID))),
        )
}

fn line(name: &str, data: Vec<f64>, width: u32, color: &str) -> Line {
    Line::new()
        .name(name)
        .data(data)
        .symbol(Symbol::None)
        .line_style(LineStyle::new().width(width).color(color))
}

fn render_png(renderer: &mut ImageRenderer, chart: &Chart) -> Result<Vec<u8>> {
    renderer
        .render_format(ImageFormat::Png, chart)
        .map_err(|e| StockError::render(format!("{e:?}")))
}

/// PNG of close, moving average and both bands over the trailing slice.
pub fn render_bollinger_chart(symbol: &str, bands: &Bollinger, tz: Tz) -> Result<Vec<u8>> {
    if bands.trailing.is_empty() {
        return Err(StockError::render("no band values to plot"));
    }

    let pts = &bands.trailing;
    let title = format!(
        "{} | ${} | BB({}, {})",
        symbol.to_uppercase(),
        display2(bands.latest.price),
        bands.window,
        bands.k
    );

    let chart = base_chart(title, dates(pts.iter().map(|p| p.timestamp), tz))
        .series(line("Close", pts.iter().map(|p| p.price).collect(), 2, "#ffffff"))
        .series(line("Moving Average", pts.iter().map(|p| p.mean).collect(), 1, "#f5a623"))
        .series(line("Upper Band", pts.iter().map(|p| p.upper).collect(), 1, BULL))
        .series(line("Lower Band", pts.iter().map(|p| p.lower).collect(), 1, BEAR));

    let mut renderer = ImageRenderer::new(BANDS_WIDTH, BANDS_HEIGHT);
    let png = render_png(&mut renderer, &chart)?;
    debug!(bytes = png.len(), "rendered bollinger chart");
    Ok(png)
}

/// Prefix lengths to draw, one per frame, always ending with the full series.
pub fn frame_cutoffs(len: usize, max_frames: usize) -> Vec<usize> {
    if len == 0 || max_frames == 0 {
        return Vec::new();
    }
    if len <= max_frames {
        return (1..=len).collect();
    }

    let mut cutoffs: Vec<usize> = (1..=max_frames)
        .map(|f| (f * len).div_ceil(max_frames))
        .collect();
    cutoffs.dedup();
    cutoffs
}

/// Line colour for the whole animation: green when the period closed higher.
pub fn trend_color(points: &[PricePoint]) -> &'static str {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if last.close > first.close => BULL,
        _ => BEAR,
    }
}

/// GIF drawing the close line left to right over `period`.
pub fn render_price_animation(symbol: &str, period: Period, history: &PriceHistory) -> Result<Vec<u8>> {
    let points = &history.points;
    if points.is_empty() {
        return Err(StockError::render("no prices to animate"));
    }

    let closes = history.closes();
    let labels = dates(points.iter().map(|p| p.timestamp), history.timezone);
    let color = trend_color(points);
    let title = format!("{} Price ({period})", symbol.to_uppercase());

    let cutoffs = frame_cutoffs(closes.len(), MAX_FRAMES);
    let mut renderer = ImageRenderer::new(ANIM_WIDTH, ANIM_HEIGHT);
    let mut frames = Vec::with_capacity(cutoffs.len());

    for (i, &cut) in cutoffs.iter().enumerate() {
        let mut visible = vec![f64::NAN; closes.len()];
        visible[..cut].copy_from_slice(&closes[..cut]);

        let chart = base_chart(title.clone(), labels.clone())
            .series(line("Close Price", visible, 2, color));
        let png = render_png(&mut renderer, &chart)?;

        let rgba = image::load_from_memory_with_format(&png, RasterFormat::Png)
            .map_err(|e| StockError::render(format!("decode frame: {e}")))?
            .to_rgba8();

        let delay = if i + 1 == cutoffs.len() { HOLD_MS } else { FRAME_MS };
        frames.push(Frame::from_parts(
            rgba,
            0,
            0,
            Delay::from_numer_denom_ms(delay, 1),
        ));
    }

    let mut gif = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut gif, 10);
        encoder
            .set_repeat(Repeat::Finite(0))
            .map_err(|e| StockError::render(format!("gif: {e}")))?;
        encoder
            .encode_frames(frames)
            .map_err(|e| StockError::render(format!("gif: {e}")))?;
    }

    debug!(frames = cutoffs.len(), bytes = gif.len(), "rendered price animation");
    Ok(gif)
}
