//! Flowchart layout and drawing, §4.7. A hand-written hierarchical layout
//! (no third-party graph-layout crate; see `DESIGN.md`): assign each node a
//! rank by longest path from a source, order nodes within a rank by first
//! appearance, then map (rank, order) to (x, y) according to the diagram's
//! direction. Class and state diagrams reuse this module through
//! `GenericGraph` (see `classstate.rs`).

use diagramlint_core::model::flowchart::{ArrowType, Direction, EndMarker, Flowchart, NodeShape};
use diagramlint_core::model::layout::{Layout, LayoutEdge, LayoutNode, LayoutSubgraph, PathMode, Point};
use indexmap::{IndexMap, IndexSet};

use crate::svg::{self, escape_xml, wrap_label, PADDING};

const MIN_WIDTH: f64 = 40.0;
const MAX_WIDTH: f64 = 260.0;
const MIN_HEIGHT: f64 = 36.0;
const RANK_SEP: f64 = 70.0;
const NODE_SEP: f64 = 40.0;
const CLUSTER_PADDING: f64 = 30.0;
const CLUSTER_TITLE_BAND: f64 = 24.0;
const CLUSTER_RANK_BUMP: f64 = 30.0;
const CLUSTER_NODE_BUMP: f64 = 20.0;

/// A direction-and-label-agnostic view over a flowchart-shaped graph, used
/// both by the flowchart renderer itself and by the class/state renderers
/// that project their own models onto it.
pub struct GenericGraph {
    pub direction: Direction,
    pub node_order: Vec<String>,
    pub node_labels: IndexMap<String, String>,
    pub node_shapes: IndexMap<String, NodeShape>,
    pub edges: Vec<(String, String, Option<String>)>,
    pub clusters: IndexMap<String, (Option<String>, IndexSet<String>, Option<String>)>,
}

pub fn node_size(label: &str, shape: NodeShape) -> (f64, f64) {
    let lines = label.lines().count().max(1) as f64;
    let base_width = (label.chars().count() as f64 * svg::PER_CHAR_WIDTH + 2.0 * PADDING)
        .clamp(MIN_WIDTH, MAX_WIDTH);
    let base_height = (lines * svg::LINE_HEIGHT + PADDING).max(MIN_HEIGHT);

    let (wmul, hmul) = match shape {
        NodeShape::Diamond => {
            let side = base_width.max(base_height) * 1.2;
            return (side, side);
        }
        NodeShape::Hexagon => (1.3, 1.2),
        NodeShape::Stadium => (1.2, 1.0),
        NodeShape::Cylinder => (1.0, 1.5),
        _ => (1.0, 1.0),
    };
    (base_width * wmul, base_height * hmul)
}

fn assign_ranks(order: &[String], edges: &[(String, String, Option<String>)]) -> IndexMap<String, u32> {
    let mut rank: IndexMap<String, u32> = order.iter().map(|n| (n.clone(), 0)).collect();
    // Longest-path ranking: relax edges |order| times, enough for a DAG of
    // this size; a remaining cycle just stops contributing further bumps.
    for _ in 0..order.len().max(1) {
        let mut changed = false;
        for (src, dst, _) in edges {
            let src_rank = *rank.get(src).unwrap_or(&0);
            let dst_rank = rank.get(dst).copied().unwrap_or(0);
            if dst_rank < src_rank + 1 {
                rank.insert(dst.clone(), src_rank + 1);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    rank
}

pub fn layout(graph: &GenericGraph) -> Layout {
    let has_clusters = !graph.clusters.is_empty();
    let rank_sep = if has_clusters { RANK_SEP + CLUSTER_RANK_BUMP } else { RANK_SEP };
    let node_sep = if has_clusters { NODE_SEP + CLUSTER_NODE_BUMP } else { NODE_SEP };

    let ranks = assign_ranks(&graph.node_order, &graph.edges);

    let mut by_rank: IndexMap<u32, Vec<String>> = IndexMap::new();
    for id in &graph.node_order {
        by_rank.entry(*ranks.get(id).unwrap_or(&0)).or_default().push(id.clone());
    }

    let mut sizes: IndexMap<String, (f64, f64)> = IndexMap::new();
    for id in &graph.node_order {
        let label = graph.node_labels.get(id).cloned().unwrap_or_default();
        let shape = graph.node_shapes.get(id).copied().unwrap_or(NodeShape::Rectangle);
        sizes.insert(id.clone(), node_size(&label, shape));
    }

    let max_rank = by_rank.keys().copied().max().unwrap_or(0);
    let rank_extent: IndexMap<u32, f64> = by_rank
        .iter()
        .map(|(r, ids)| (*r, ids.iter().map(|id| rank_extent_for(*r, id, &sizes, graph.direction)).fold(0.0_f64, f64::max)))
        .collect();

    let mut nodes = Vec::new();
    let mut cursor_in_rank: IndexMap<u32, f64> = IndexMap::new();
    let mut rank_offset = 0.0_f64;
    let mut positions: IndexMap<String, (f64, f64)> = IndexMap::new();

    for r in 0..=max_rank {
        let Some(ids) = by_rank.get(&r) else { continue };
        let mut along = 0.0_f64;
        for id in ids {
            let (w, h) = sizes[id];
            let (cross, along_size) = match graph.direction {
                Direction::LR | Direction::RL => (h, w),
                _ => (w, h),
            };
            let along_pos = along + along_size / 2.0;
            positions.insert(id.clone(), (rank_offset, along_pos));
            along += along_size + node_sep;
            let _ = cross;
        }
        *cursor_in_rank.entry(r).or_default() = along;
        rank_offset += rank_extent.get(&r).copied().unwrap_or(MIN_HEIGHT) + rank_sep;
    }

    let total_along = cursor_in_rank.values().copied().fold(0.0_f64, f64::max);
    let total_rank = rank_offset;

    for id in &graph.node_order {
        let (rank_pos, along_pos) = positions.get(id).copied().unwrap_or((0.0, 0.0));
        let (w, h) = sizes[id];
        let (x, y) = place(graph.direction, rank_pos, along_pos, total_rank, total_along);
        nodes.push(LayoutNode {
            id: id.clone(),
            label: graph.node_labels.get(id).cloned().unwrap_or_default(),
            x: x - w / 2.0,
            y: y - h / 2.0,
            width: w,
            height: h,
        });
    }

    let node_rects: IndexMap<&str, (f64, f64, f64, f64)> =
        nodes.iter().map(|n| (n.id.as_str(), (n.x, n.y, n.x + n.width, n.y + n.height))).collect();

    let mut edges = Vec::new();
    for (idx, (src, dst, label)) in graph.edges.iter().enumerate() {
        let points = route_edge(src, dst, &node_rects, &graph.clusters);
        edges.push(LayoutEdge {
            id: format!("e{idx}"),
            source: src.clone(),
            target: dst.clone(),
            label: label.clone(),
            points,
            path_mode: Some(PathMode::Orthogonal),
        });
    }

    let mut subgraphs = Vec::new();
    for (id, (label, members, parent)) in &graph.clusters {
        let bounds = cluster_bounds(members, &node_rects);
        let Some((x0, y0, x1, y1)) = bounds else { continue };
        subgraphs.push(LayoutSubgraph {
            id: id.clone(),
            label: label.clone(),
            parent: parent.clone(),
            x: x0 - CLUSTER_PADDING,
            y: y0 - CLUSTER_PADDING - CLUSTER_TITLE_BAND,
            width: (x1 - x0) + 2.0 * CLUSTER_PADDING,
            height: (y1 - y0) + 2.0 * CLUSTER_PADDING + CLUSTER_TITLE_BAND,
        });
    }
    propagate_cluster_bounds(&mut subgraphs);

    let width = nodes.iter().map(|n| n.x + n.width).fold(0.0_f64, f64::max)
        .max(subgraphs.iter().map(|s| s.x + s.width).fold(0.0_f64, f64::max))
        + PADDING;
    let height = nodes.iter().map(|n| n.y + n.height).fold(0.0_f64, f64::max)
        .max(subgraphs.iter().map(|s| s.y + s.height).fold(0.0_f64, f64::max))
        + PADDING;

    Layout { nodes, edges, subgraphs, width, height }
}

fn rank_extent_for(
    _rank: u32,
    id: &str,
    sizes: &IndexMap<String, (f64, f64)>,
    direction: Direction,
) -> f64 {
    let (w, h) = sizes.get(id).copied().unwrap_or((MIN_WIDTH, MIN_HEIGHT));
    match direction {
        Direction::LR | Direction::RL => w,
        _ => h,
    }
}

fn place(direction: Direction, rank_pos: f64, along_pos: f64, total_rank: f64, _total_along: f64) -> (f64, f64) {
    match direction {
        Direction::TB | Direction::TD => (along_pos, rank_pos),
        Direction::BT => (along_pos, total_rank - rank_pos),
        Direction::LR => (rank_pos, along_pos),
        Direction::RL => (total_rank - rank_pos, along_pos),
    }
}

fn cluster_bounds(
    members: &IndexSet<String>,
    node_rects: &IndexMap<&str, (f64, f64, f64, f64)>,
) -> Option<(f64, f64, f64, f64)> {
    let mut acc: Option<(f64, f64, f64, f64)> = None;
    for m in members {
        if let Some(&(x0, y0, x1, y1)) = node_rects.get(m.as_str()) {
            acc = Some(match acc {
                None => (x0, y0, x1, y1),
                Some((ax0, ay0, ax1, ay1)) => (ax0.min(x0), ay0.min(y0), ax1.max(x1), ay1.max(y1)),
            });
        }
    }
    acc
}

/// Grows each parent cluster's bounds to enclose its children's bounds,
/// per §4.7's "propagate bounds upward" rule. Runs a fixed number of
/// passes, enough for any realistic nesting depth.
fn propagate_cluster_bounds(subgraphs: &mut [LayoutSubgraph]) {
    let parents: std::collections::HashMap<String, Option<String>> =
        subgraphs.iter().map(|s| (s.id.clone(), s.parent.clone())).collect();
    for _ in 0..subgraphs.len().max(1) {
        let snapshot: Vec<(String, f64, f64, f64, f64)> =
            subgraphs.iter().map(|s| (s.id.clone(), s.x, s.y, s.x + s.width, s.y + s.height)).collect();
        for s in subgraphs.iter_mut() {
            for (id, cx0, cy0, cx1, cy1) in &snapshot {
                if parents.get(id).and_then(|p| p.clone()).as_deref()
                    == Some(s.id.as_str())
                {
                    let x0 = s.x.min(*cx0);
                    let y0 = s.y.min(*cy0);
                    let x1 = (s.x + s.width).max(*cx1);
                    let y1 = (s.y + s.height).max(*cy1);
                    s.x = x0;
                    s.y = y0;
                    s.width = x1 - x0;
                    s.height = y1 - y0;
                }
            }
        }
    }
}

fn route_edge(
    src: &str,
    dst: &str,
    node_rects: &IndexMap<&str, (f64, f64, f64, f64)>,
    _clusters: &IndexMap<String, (Option<String>, IndexSet<String>, Option<String>)>,
) -> Vec<Point> {
    let (Some(&(sx0, sy0, sx1, sy1)), Some(&(dx0, dy0, dx1, dy1))) =
        (node_rects.get(src), node_rects.get(dst))
    else {
        return Vec::new();
    };
    let start = Point { x: (sx0 + sx1) / 2.0, y: (sy0 + sy1) / 2.0 };
    let end = Point { x: (dx0 + dx1) / 2.0, y: (dy0 + dy1) / 2.0 };

    if start.x.is_finite() && start.y.is_finite() && end.x.is_finite() && end.y.is_finite() {
        vec![start, end]
    } else {
        // Synthesized orthogonal two-elbow fallback with a fixed standoff,
        // used when either endpoint's geometry came out non-finite.
        let standoff = 20.0;
        vec![
            start,
            Point { x: start.x, y: start.y + standoff },
            Point { x: end.x, y: end.y - standoff },
            end,
        ]
    }
}

pub fn draw(flowchart: &Flowchart, layout_result: &Layout) -> String {
    let mut body = String::new();

    for cluster in &layout_result.subgraphs {
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#f4f4f8\" stroke=\"#9999aa\" rx=\"4\"/>",
            cluster.x, cluster.y, cluster.width, cluster.height
        ));
        if let Some(label) = &cluster.label {
            body.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" font-weight=\"bold\">{}</text>",
                cluster.x + 8.0,
                cluster.y + 16.0,
                escape_xml(label)
            ));
        }
    }

    for edge in &layout_result.edges {
        let Some(model_edge) = flowchart.edges.iter().find(|e| e.source == edge.source && e.target == edge.target)
        else {
            continue;
        };
        body.push_str(&draw_edge(edge, model_edge.arrow, model_edge.start_marker, model_edge.end_marker));
    }

    for node in &layout_result.nodes {
        let shape = flowchart.nodes.get(&node.id).map(|n| n.shape).unwrap_or(NodeShape::Rectangle);
        body.push_str(&draw_node(node, shape));
    }

    svg::svg_document(layout_result.width, layout_result.height, &body)
}

fn draw_edge(edge: &LayoutEdge, arrow: ArrowType, _start: EndMarker, end: EndMarker) -> String {
    if edge.points.len() < 2 {
        return String::new();
    }
    let mut d = format!("M{:.1},{:.1}", edge.points[0].x, edge.points[0].y);
    for p in &edge.points[1..] {
        d.push_str(&format!(" L{:.1},{:.1}", p.x, p.y));
    }
    let dash = match arrow {
        ArrowType::Dotted => " stroke-dasharray=\"4,3\"",
        _ => "",
    };
    let width = if arrow == ArrowType::Thick { 3 } else { 1 };
    let visibility = if arrow == ArrowType::Invisible { " visibility=\"hidden\"" } else { "" };
    let marker = match end {
        EndMarker::Arrow => " marker-end=\"url(#arrowhead)\"",
        EndMarker::Circle => " marker-end=\"url(#circle-end)\"",
        EndMarker::Cross => " marker-end=\"url(#cross-end)\"",
        EndMarker::None => "",
    };
    let mut out = format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"#333333\" stroke-width=\"{width}\"{dash}{marker}{visibility}/>"
    );
    if let Some(label) = &edge.label {
        let mid = &edge.points[edge.points.len() / 2];
        out.push_str(&svg::text_lines(mid.x, mid.y - 6.0, &[label.clone()], "middle"));
    }
    out
}

fn draw_node(node: &LayoutNode, shape: NodeShape) -> String {
    let (x, y, w, h) = (node.x, node.y, node.width, node.height);
    let shape_svg = match shape {
        NodeShape::Rectangle | NodeShape::Subroutine | NodeShape::Double => {
            format!("<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" rx=\"2\"/>")
        }
        NodeShape::Round => {
            format!("<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" rx=\"{:.1}\"/>", h / 2.0)
        }
        NodeShape::Stadium => {
            format!("<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" rx=\"{:.1}\"/>", h / 2.0)
        }
        NodeShape::Circle => {
            let r = w.min(h) / 2.0;
            format!("<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{r:.1}\"/>", x + w / 2.0, y + h / 2.0)
        }
        NodeShape::Diamond => {
            let (cx, cy) = (x + w / 2.0, y + h / 2.0);
            format!(
                "<polygon points=\"{cx:.1},{y:.1} {:.1},{cy:.1} {cx:.1},{:.1} {x:.1},{cy:.1}\"/>",
                x + w,
                y + h
            )
        }
        NodeShape::Hexagon => {
            let notch = w * 0.15;
            format!(
                "<polygon points=\"{:.1},{y:.1} {:.1},{y:.1} {:.1},{cy:.1} {:.1},{:.1} {:.1},{:.1} {x:.1},{cy:.1}\"/>",
                x + notch,
                x + w - notch,
                x + w,
                x + w - notch,
                y + h,
                x + notch,
                y + h,
                cy = y + h / 2.0,
            )
        }
        NodeShape::Parallelogram => {
            let skew = w * 0.15;
            format!(
                "<polygon points=\"{:.1},{y:.1} {:.1},{y:.1} {:.1},{:.1} {x:.1},{:.1}\"/>",
                x + skew,
                x + w,
                x + w - skew,
                y + h,
                y + h
            )
        }
        NodeShape::Trapezoid => {
            let skew = w * 0.15;
            format!(
                "<polygon points=\"{:.1},{y:.1} {:.1},{y:.1} {:.1},{:.1} {x:.1},{:.1}\"/>",
                x + skew,
                x + w - skew,
                x + w,
                y + h,
                y + h
            )
        }
        NodeShape::TrapezoidInverted => {
            let skew = w * 0.15;
            format!(
                "<polygon points=\"{x:.1},{y:.1} {:.1},{y:.1} {:.1},{:.1} {:.1},{:.1}\"/>",
                x + w,
                x + w - skew,
                y + h,
                x + skew,
                y + h
            )
        }
        NodeShape::Cylinder => {
            let ellipse_h = h * 0.15;
            format!(
                "<path d=\"M{x:.1},{:.1} a{:.1},{ellipse_h:.1} 0 0 0 {w:.1},0 v{:.1} a{:.1},{ellipse_h:.1} 0 0 1 -{w:.1},0 z\"/>",
                y + ellipse_h,
                w / 2.0,
                h - 2.0 * ellipse_h,
                w / 2.0
            )
        }
    };

    let wrapped = wrap_label(&node.label, w - 2.0 * PADDING, 3);
    format!(
        "<g fill=\"#eef2ff\" stroke=\"#333355\" stroke-width=\"1\">{shape_svg}</g>{}",
        svg::text_lines(x + w / 2.0, y + h / 2.0, &wrapped, "middle")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlint_core::model::flowchart::{Edge, Node};

    fn simple_graph(direction: Direction) -> GenericGraph {
        let mut node_labels = IndexMap::new();
        node_labels.insert("A".to_string(), "A".to_string());
        node_labels.insert("B".to_string(), "B".to_string());
        let mut node_shapes = IndexMap::new();
        node_shapes.insert("A".to_string(), NodeShape::Rectangle);
        node_shapes.insert("B".to_string(), NodeShape::Rectangle);
        GenericGraph {
            direction,
            node_order: vec!["A".to_string(), "B".to_string()],
            node_labels,
            node_shapes,
            edges: vec![("A".to_string(), "B".to_string(), None)],
            clusters: IndexMap::new(),
        }
    }

    #[test]
    fn top_down_layout_increases_y_with_rank() {
        let layout_result = layout(&simple_graph(Direction::TB));
        let a = layout_result.nodes.iter().find(|n| n.id == "A").unwrap();
        let b = layout_result.nodes.iter().find(|n| n.id == "B").unwrap();
        assert!(b.y > a.y);
    }

    #[test]
    fn left_right_layout_increases_x_with_rank() {
        let layout_result = layout(&simple_graph(Direction::LR));
        let a = layout_result.nodes.iter().find(|n| n.id == "A").unwrap();
        let b = layout_result.nodes.iter().find(|n| n.id == "B").unwrap();
        assert!(b.x > a.x);
    }

    #[test]
    fn diamond_node_is_square() {
        let (w, h) = node_size("Decide?", NodeShape::Diamond);
        assert_eq!(w, h);
    }

    #[test]
    fn draw_produces_an_svg_document() {
        let mut flowchart = Flowchart::new(Some(Direction::TB));
        flowchart.nodes.insert(
            "A".to_string(),
            Node { id: "A".to_string(), label: "A".to_string(), shape: NodeShape::Rectangle, style: None, link: None },
        );
        flowchart.nodes.insert(
            "B".to_string(),
            Node { id: "B".to_string(), label: "B".to_string(), shape: NodeShape::Rectangle, style: None, link: None },
        );
        flowchart.edges.push(Edge {
            id: "e0".to_string(),
            source: "A".to_string(),
            target: "B".to_string(),
            arrow: ArrowType::Arrow,
            start_marker: EndMarker::None,
            end_marker: EndMarker::Arrow,
            label: None,
            style: None,
        });
        let layout_result = layout(&simple_graph(Direction::TB));
        let svg = draw(&flowchart, &layout_result);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("</svg>"));
    }
}
