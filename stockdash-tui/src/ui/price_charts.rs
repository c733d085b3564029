//! Chart builders shared by the Overview and Analysis panels.
//!
//! X coordinates are trading-day indices; the axis labels carry the first,
//! middle and last dates of the series.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Sparkline,
};

use stockdash_core::PriceSeries;

use crate::theme;

/// Close series as chart points, skipping NaN closes.
pub fn close_points(series: &PriceSeries) -> Vec<(f64, f64)> {
    series
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.close.is_finite())
        .map(|(i, r)| (i as f64, r.close))
        .collect()
}

/// Derived column as chart points. Undefined entries leave a gap.
pub fn column_points(column: Option<&[Option<f64>]>) -> Vec<(f64, f64)> {
    column
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i as f64, x)))
        .collect()
}

/// `[min, max]` of the y values padded by 5%, or `None` with no points.
pub fn padded_bounds<'a>(sets: impl IntoIterator<Item = &'a [(f64, f64)]>) -> Option<[f64; 2]> {
    let (lo, hi) = sets
        .into_iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let padding = ((hi - lo).abs() * 0.05).max(0.01);
    Some([lo - padding, hi + padding])
}

/// Average `values` into at most `width` buckets.
pub fn downsample(values: &[u64], width: usize) -> Vec<u64> {
    if width == 0 || values.is_empty() {
        return Vec::new();
    }
    if values.len() <= width {
        return values.to_vec();
    }
    let chunk = values.len().div_ceil(width);
    values
        .chunks(chunk)
        .map(|c| c.iter().sum::<u64>() / c.len() as u64)
        .collect()
}

fn date_labels(series: &PriceSeries) -> Vec<Span<'static>> {
    let records = series.records();
    let fmt = |i: usize| {
        records
            .get(i)
            .map(|r| r.date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    let last = records.len().saturating_sub(1);
    vec![
        Span::styled(fmt(0), theme::muted()),
        Span::styled(fmt(last / 2), theme::muted()),
        Span::styled(fmt(last), theme::muted()),
    ]
}

fn price_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    vec![
        Span::styled(format!("{:.2}", bounds[0]), theme::muted()),
        Span::styled(format!("{:.2}", mid), theme::muted()),
        Span::styled(format!("{:.2}", bounds[1]), theme::muted()),
    ]
}

fn line<'a>(name: &'static str, color: Color, data: &'a [(f64, f64)]) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .style(Style::default().fg(color))
        .graph_type(GraphType::Line)
        .data(data)
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme::muted())
        .title(format!(" {title} "))
        .title_style(theme::accent_bold())
}

/// Close over time with the given marker and graph type.
pub fn render_close(
    f: &mut Frame,
    area: Rect,
    series: &PriceSeries,
    title: &str,
    marker: Marker,
    graph_type: GraphType,
) {
    let data = close_points(series);
    let Some(bounds) = padded_bounds([data.as_slice()]) else {
        f.render_widget(titled(title), area);
        return;
    };

    let dataset = Dataset::default()
        .name("Close")
        .marker(marker)
        .style(Style::default().fg(theme::ACCENT))
        .graph_type(graph_type)
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(titled(title))
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, (series.len().saturating_sub(1) as f64).max(1.0)])
                .labels(date_labels(series)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("USD", theme::muted()))
                .style(theme::muted())
                .bounds(bounds)
                .labels(price_labels(bounds)),
        );

    f.render_widget(chart, area);
}

/// Close as a sparkline, offset so the period low sits on the baseline.
pub fn render_close_sparkline(f: &mut Frame, area: Rect, series: &PriceSeries, title: &str) {
    let closes: Vec<f64> = series.closes().into_iter().filter(|c| c.is_finite()).collect();
    let low = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let cents: Vec<u64> = closes
        .iter()
        .map(|c| ((c - low) * 100.0).round() as u64)
        .collect();
    let inner_width = area.width.saturating_sub(2) as usize;
    let data = downsample(&cents, inner_width);

    let sparkline = Sparkline::default()
        .block(titled(title))
        .data(&data)
        .style(Style::default().fg(theme::ACCENT));
    f.render_widget(sparkline, area);
}

/// Close with MA20 and MA50 overlaid.
pub fn render_moving_averages(f: &mut Frame, area: Rect, series: &PriceSeries) {
    let close = close_points(series);
    let ma20 = column_points(series.ma20());
    let ma50 = column_points(series.ma50());
    let title = "Close with MA20 / MA50";
    let Some(bounds) = padded_bounds([close.as_slice(), ma20.as_slice(), ma50.as_slice()]) else {
        f.render_widget(titled(title), area);
        return;
    };

    let datasets = vec![
        line("Close", theme::ACCENT, &close),
        line("MA20", theme::NEUTRAL, &ma20),
        line("MA50", theme::WARNING, &ma50),
    ];

    let chart = Chart::new(datasets)
        .block(titled(title))
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, (series.len().saturating_sub(1) as f64).max(1.0)])
                .labels(date_labels(series)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("USD", theme::muted()))
                .style(theme::muted())
                .bounds(bounds)
                .labels(price_labels(bounds)),
        );

    f.render_widget(chart, area);
}

/// Daily volume bars, averaged down to the available width.
pub fn render_volume(f: &mut Frame, area: Rect, series: &PriceSeries) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let volumes = downsample(&series.volumes(), inner_width);
    let bars: Vec<Bar> = volumes
        .iter()
        .map(|&v| Bar::default().value(v).text_value(String::new()))
        .collect();

    let chart = BarChart::default()
        .block(titled("Volume"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .bar_style(theme::neutral());
    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockdash_core::{compute_moving_averages, PriceRecord};

    fn series(closes: &[f64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PriceRecord::new(base + chrono::Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 100)
            })
            .collect();
        PriceSeries::new("TEST", records)
    }

    #[test]
    fn close_points_skip_nan() {
        let s = series(&[1.0, f64::NAN, 3.0]);
        assert_eq!(close_points(&s), vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn column_points_leave_gaps() {
        let s = compute_moving_averages(&series(&vec![10.0; 25]));
        let ma20 = column_points(s.ma20());
        assert_eq!(ma20.len(), 6);
        assert_eq!(ma20[0], (19.0, 10.0));
        assert!(column_points(s.ma50()).is_empty());
        assert!(column_points(None).is_empty());
    }

    #[test]
    fn bounds_are_padded() {
        let pts = [(0.0, 100.0), (1.0, 200.0)];
        let [lo, hi] = padded_bounds([&pts[..]]).unwrap();
        assert!((lo - 95.0).abs() < 1e-9);
        assert!((hi - 205.0).abs() < 1e-9);
        assert!(padded_bounds([&[][..]]).is_none());
    }

    #[test]
    fn flat_series_still_has_height() {
        let pts = [(0.0, 5.0), (1.0, 5.0)];
        let [lo, hi] = padded_bounds([&pts[..]]).unwrap();
        assert!(hi > lo);
    }

    #[test]
    fn downsample_averages_buckets() {
        assert_eq!(downsample(&[1, 2, 3], 10), vec![1, 2, 3]);
        assert_eq!(downsample(&[2, 4, 6, 8], 2), vec![3, 7]);
        assert!(downsample(&[1, 2], 0).is_empty());
        assert_eq!(downsample(&[1, 2, 3, 4, 5], 2).len(), 2);
    }
}
