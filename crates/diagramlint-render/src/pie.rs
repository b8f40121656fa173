//! Pie layout and drawing, §4.8.

use std::f64::consts::PI;

use diagramlint_core::frontmatter::{Config, ConfigValue, Frontmatter};
use diagramlint_core::model::pie::Pie;
use indexmap::IndexMap;

use crate::svg::{self, escape_xml};

const DEFAULT_WIDTH: f64 = 450.0;
const DEFAULT_HEIGHT: f64 = 450.0;
const OUTER_PADDING: f64 = 24.0;
const TITLE_BAND: f64 = 30.0;
const SMALL_SLICE_THRESHOLD: f64 = 0.35;
const LEGEND_SWATCH: f64 = 14.0;
const LEGEND_GAP: f64 = 8.0;

const DEFAULT_PALETTE: [&str; 12] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7", "#9c755f",
    "#bab0ac", "#86bcb6", "#d37295",
];

pub struct Slice {
    pub label: String,
    pub value: f64,
    pub color: String,
    pub start_angle: f64,
    pub end_angle: f64,
}

pub struct PieLayout {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub total: f64,
    pub slices: Vec<Slice>,
    pub width: f64,
    pub height: f64,
    pub legend_x: Option<f64>,
}

pub fn layout(pie: &Pie, width: f64, height: f64) -> PieLayout {
    let positive: Vec<&diagramlint_core::model::pie::Slice> = pie.slices.iter().filter(|s| s.value > 0.0).collect();
    let total: f64 = positive.iter().map(|s| s.value).sum();

    let legend_width = positive
        .iter()
        .map(|s| s.label.chars().count() as f64 * svg::PER_CHAR_WIDTH)
        .fold(0.0_f64, f64::max)
        + LEGEND_SWATCH
        + LEGEND_GAP * 2.0;
    let has_legend = !positive.is_empty();
    let available_width = if has_legend { width.max(legend_width + DEFAULT_WIDTH) } else { width };

    let title_band = if pie.title.is_some() { TITLE_BAND } else { 0.0 };
    let diagram_width = if has_legend { available_width - legend_width } else { available_width };
    let r = ((diagram_width.min(height - title_band)) / 2.0 - OUTER_PADDING).max(10.0);
    let cx = diagram_width / 2.0;
    let cy = title_band + (height - title_band) / 2.0;

    let mut angle = -PI / 2.0;
    let mut slices = Vec::new();
    for (i, s) in positive.iter().enumerate() {
        let sweep = if total > 0.0 { 2.0 * PI * (s.value / total) } else { 0.0 };
        let color = s.color.clone().unwrap_or_else(|| DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()].to_string());
        slices.push(Slice { label: s.label.clone(), value: s.value, color, start_angle: angle, end_angle: angle + sweep });
        angle += sweep;
    }

    PieLayout {
        cx,
        cy,
        r,
        total,
        slices,
        width: available_width,
        height,
        legend_x: has_legend.then_some(diagram_width + LEGEND_GAP),
    }
}

fn arc_point(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}

pub fn draw(pie: &Pie, layout_result: &PieLayout, frontmatter: Option<&Frontmatter>) -> String {
    let theme = frontmatter.and_then(|f| f.theme_variables.as_ref());
    let stroke = theme_color(theme, "pieStrokeColor").unwrap_or_else(|| "#ffffff".to_string());
    let label_radius_fraction = text_position(frontmatter.and_then(|f| f.config.as_ref()));

    let mut body = String::new();

    for slice in &layout_result.slices {
        let sweep = slice.end_angle - slice.start_angle;
        let (sx, sy) = arc_point(layout_result.cx, layout_result.cy, layout_result.r, slice.start_angle);
        let (ex, ey) = arc_point(layout_result.cx, layout_result.cy, layout_result.r, slice.end_angle);
        let large_arc = if sweep > PI { 1 } else { 0 };
        body.push_str(&format!(
            "<path d=\"M{:.1},{:.1} L{sx:.1},{sy:.1} A{:.1},{:.1} 0 {large_arc} 1 {ex:.1},{ey:.1} Z\" fill=\"{}\" stroke=\"{stroke}\"/>",
            layout_result.cx, layout_result.cy, layout_result.r, layout_result.r, slice.color
        ));

        let percent = if layout_result.total > 0.0 { (slice.value / layout_result.total) * 100.0 } else { 0.0 };
        let label_text = format!("{:.0}%", percent);
        let mid_angle = (slice.start_angle + slice.end_angle) / 2.0;

        if sweep < SMALL_SLICE_THRESHOLD {
            let (leader_x, leader_y) = arc_point(layout_result.cx, layout_result.cy, layout_result.r, mid_angle);
            let (out_x, out_y) =
                arc_point(layout_result.cx, layout_result.cy, layout_result.r + 20.0, mid_angle);
            body.push_str(&format!(
                "<line x1=\"{leader_x:.1}\" y1=\"{leader_y:.1}\" x2=\"{out_x:.1}\" y2=\"{out_y:.1}\" stroke=\"#888888\"/>"
            ));
            let anchor = if mid_angle.cos() >= 0.0 { "start" } else { "end" };
            body.push_str(&svg::text_lines(out_x, out_y, &[label_text], anchor));
        } else {
            let (ix, iy) =
                arc_point(layout_result.cx, layout_result.cy, layout_result.r * label_radius_fraction, mid_angle);
            let anchor = quadrant_anchor(mid_angle);
            body.push_str(&svg::text_lines(ix, iy, &[label_text], anchor));
        }
    }

    if let Some(title) = &pie.title {
        body.push_str(&format!(
            "<text x=\"{:.1}\" y=\"16\" text-anchor=\"middle\" font-size=\"14\" font-weight=\"bold\">{}</text>",
            layout_result.cx,
            escape_xml(title)
        ));
    }

    if let Some(legend_x) = layout_result.legend_x {
        for (i, slice) in layout_result.slices.iter().enumerate() {
            let y = 20.0 + i as f64 * (LEGEND_SWATCH + LEGEND_GAP);
            body.push_str(&format!(
                "<rect x=\"{legend_x:.1}\" y=\"{y:.1}\" width=\"{LEGEND_SWATCH}\" height=\"{LEGEND_SWATCH}\" fill=\"{}\"/>",
                slice.color
            ));
            let text = if pie.show_data {
                format!("{} ({})", slice.label, slice.value)
            } else {
                slice.label.clone()
            };
            body.push_str(&svg::text_lines(legend_x + LEGEND_SWATCH + 4.0, y + LEGEND_SWATCH / 2.0, &[text], "start"));
        }
    }

    svg::svg_document(layout_result.width, layout_result.height, &body)
}

fn quadrant_anchor(angle: f64) -> &'static str {
    let cos = angle.cos();
    if cos.abs() < 0.3 {
        "middle"
    } else if cos > 0.0 {
        "start"
    } else {
        "end"
    }
}

fn theme_color(theme: Option<&IndexMap<String, ConfigValue>>, key: &str) -> Option<String> {
    match theme?.get(key)? {
        ConfigValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub fn default_dimensions() -> (f64, f64) {
    (DEFAULT_WIDTH, DEFAULT_HEIGHT)
}

pub fn text_position(config: Option<&Config>) -> f64 {
    config.and_then(|c| c.pie.text_position).unwrap_or(0.62)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlint_core::model::pie::Slice;

    #[test]
    fn zero_value_slices_are_excluded() {
        let pie = Pie {
            title: None,
            show_data: false,
            slices: vec![
                Slice { label: "A".into(), value: 10.0, color: None },
                Slice { label: "B".into(), value: 0.0, color: None },
            ],
        };
        let layout_result = layout(&pie, DEFAULT_WIDTH, DEFAULT_HEIGHT);
        assert_eq!(layout_result.slices.len(), 1);
        assert_eq!(layout_result.slices[0].label, "A");
    }

    #[test]
    fn slices_sweep_sums_to_full_circle() {
        let pie = Pie {
            title: None,
            show_data: false,
            slices: vec![
                Slice { label: "A".into(), value: 1.0, color: None },
                Slice { label: "B".into(), value: 3.0, color: None },
            ],
        };
        let layout_result = layout(&pie, DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let total_sweep: f64 =
            layout_result.slices.iter().map(|s| s.end_angle - s.start_angle).sum();
        assert!((total_sweep - 2.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn draw_emits_svg() {
        let pie = Pie { title: Some("Pets".into()), show_data: true, slices: vec![Slice { label: "Dogs".into(), value: 10.0, color: None }] };
        let layout_result = layout(&pie, DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let svg = draw(&pie, &layout_result, None);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Pets"));
    }

    #[test]
    fn text_position_falls_back_without_config() {
        assert!((text_position(None) - 0.62).abs() < 1e-9);
    }

    #[test]
    fn text_position_honors_frontmatter_override() {
        let config = Config { pie: diagramlint_core::frontmatter::PieConfig { text_position: Some(0.9) } };
        assert!((text_position(Some(&config)) - 0.9).abs() < 1e-9);
    }
}
