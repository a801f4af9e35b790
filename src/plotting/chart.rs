use plotters::prelude::*;
use std::collections::BTreeMap;

use super::styles::{ChartStyle, ChartTheme};
use crate::error::{Error, Result};
use crate::utils::{fold_tail, ranked_languages};

/// Bars drawn before the remaining languages fold into "Other".
pub const MAX_BARS: usize = 8;

const FONT: &str = "sans-serif";

fn chart_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Chart(e.to_string())
}

/// Draw the language histogram as a standalone SVG document.
pub fn language_chart_svg(languages: &BTreeMap<String, usize>) -> Result<String> {
    language_chart_svg_with(languages, &ChartTheme::default(), &ChartStyle::default())
}

pub fn language_chart_svg_with(
    languages: &BTreeMap<String, usize>,
    theme: &ChartTheme,
    style: &ChartStyle,
) -> Result<String> {
    let bars = fold_tail(&ranked_languages(languages), MAX_BARS);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&theme.background_color).map_err(chart_err)?;

        if bars.is_empty() {
            root.draw(&Text::new(
                "No language data",
                (style.margin as i32, (style.height / 2) as i32),
                (FONT, style.font_size).into_font().color(&theme.text_color),
            ))
            .map_err(chart_err)?;
        } else {
            draw_bars(&root, &bars, theme, style)?;
        }

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

fn draw_bars(
    root: &DrawingArea<SVGBackend, plotters::coord::Shift>,
    bars: &[(String, usize)],
    theme: &ChartTheme,
    style: &ChartStyle,
) -> Result<()> {
    let y_max = bars.iter().map(|(_, count)| *count as u32).max().unwrap_or(0) + 1;
    let labels: Vec<&str> = bars.iter().map(|(name, _)| name.as_str()).collect();

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Languages",
            (FONT, style.caption_size).into_font().color(&theme.text_color),
        )
        .margin(style.margin)
        .x_label_area_size(style.label_area_size)
        .y_label_area_size(style.label_area_size)
        .build_cartesian_2d((0..bars.len()).into_segmented(), 0u32..y_max)
        .map_err(chart_err)?;

    let x_label_formatter = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => {
            labels.get(*idx).map(|label| label.to_string()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(theme.grid_color)
        .light_line_style(TRANSPARENT)
        .axis_style(theme.axis_color)
        .y_desc("Repositories")
        .x_labels(bars.len() + 1)
        .x_label_formatter(&x_label_formatter)
        .y_label_formatter(&|y| format!("{}", y))
        .label_style((FONT, style.font_size).into_font().color(&theme.text_color))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(theme.bar_color.filled())
                .margin(style.bar_margin)
                .data(bars.iter().enumerate().map(|(idx, (_, count))| (idx, *count as u32))),
        )
        .map_err(chart_err)?;

    Ok(())
}
