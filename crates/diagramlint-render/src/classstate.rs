//! Projects class and state diagrams onto [`crate::flowchart::GenericGraph`]
//! so both reuse the flowchart layout engine, per §4.10. Each projection
//! maps its own shapes/markers onto the generic node/edge vocabulary, then
//! a small per-family finishing pass draws the bits the generic vocabulary
//! can't express (relation-kind arrowheads, pseudo-state glyphs).

use diagramlint_core::model::class::{ClassDiagram, RelationKind};
use diagramlint_core::model::flowchart::{Direction, NodeShape};
use diagramlint_core::model::layout::Layout;
use diagramlint_core::model::state::{StateDiagram, StateNodeKind};
use indexmap::IndexMap;

use crate::flowchart::{self, GenericGraph};
use crate::svg::{self, escape_xml};

pub fn class_to_graph(diagram: &ClassDiagram) -> GenericGraph {
    let mut node_order = Vec::new();
    let mut node_labels = IndexMap::new();
    let mut node_shapes = IndexMap::new();

    for (id, class) in &diagram.classes {
        node_order.push(id.clone());
        let mut label = class.display.clone();
        if let Some(stereotype) = &class.stereotype {
            label = format!("«{stereotype}»\n{label}");
        }
        if !class.attributes.is_empty() {
            label.push('\n');
            label.push_str(&class.attributes.join("\n"));
        }
        if !class.methods.is_empty() {
            label.push('\n');
            label.push_str(&class.methods.join("\n"));
        }
        node_labels.insert(id.clone(), label);
        node_shapes.insert(id.clone(), NodeShape::Rectangle);
    }

    let edges = diagram
        .relations
        .iter()
        .map(|r| (r.source.clone(), r.target.clone(), r.label.clone()))
        .collect();

    GenericGraph {
        direction: diagram.direction.unwrap_or(Direction::TB),
        node_order,
        node_labels,
        node_shapes,
        edges,
        clusters: IndexMap::new(),
    }
}

pub fn draw_class(diagram: &ClassDiagram, layout_result: &Layout) -> String {
    let mut body = String::new();

    for node in &layout_result.nodes {
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#fbfbfe\" stroke=\"#333355\"/>",
            node.x, node.y, node.width, node.height
        ));
        let lines: Vec<String> = node.label.lines().map(|l| l.to_string()).collect();
        body.push_str(&svg::text_lines(node.x + node.width / 2.0, node.y + node.height / 2.0, &lines, "middle"));
    }

    for edge in &layout_result.edges {
        let Some(relation) = diagram.relations.iter().find(|r| r.source == edge.source && r.target == edge.target)
        else {
            continue;
        };
        body.push_str(&draw_relation_edge(edge, relation.kind));
        if let Some(label) = &edge.label {
            if let Some(mid) = edge.points.get(edge.points.len() / 2) {
                body.push_str(&svg::text_lines(mid.x, mid.y - 6.0, &[escape_xml(label)], "middle"));
            }
        }
    }

    svg::svg_document(layout_result.width, layout_result.height, &body)
}

fn draw_relation_edge(edge: &diagramlint_core::model::layout::LayoutEdge, kind: RelationKind) -> String {
    if edge.points.len() < 2 {
        return String::new();
    }
    let mut d = format!("M{:.1},{:.1}", edge.points[0].x, edge.points[0].y);
    for p in &edge.points[1..] {
        d.push_str(&format!(" L{:.1},{:.1}", p.x, p.y));
    }
    let dash = if kind == RelationKind::Dependency || kind == RelationKind::Realization {
        " stroke-dasharray=\"4,3\""
    } else {
        ""
    };
    let marker = match kind {
        RelationKind::Extends | RelationKind::Realization => " marker-end=\"url(#arrowhead)\"",
        RelationKind::Aggregation | RelationKind::Composition => " marker-end=\"url(#circle-end)\"",
        RelationKind::Dependency => " marker-end=\"url(#arrowhead)\"",
        RelationKind::Association => "",
    };
    format!("<path d=\"{d}\" fill=\"none\" stroke=\"#333333\"{dash}{marker}/>")
}

pub fn state_to_graph(diagram: &StateDiagram) -> GenericGraph {
    let mut node_order = Vec::new();
    let mut node_labels = IndexMap::new();
    let mut node_shapes = IndexMap::new();

    for (id, node) in &diagram.nodes {
        node_order.push(id.clone());
        let label = node.label.clone().unwrap_or_else(|| pseudo_glyph(node.kind).unwrap_or_else(|| id.clone()));
        node_labels.insert(id.clone(), label);
        node_shapes.insert(id.clone(), shape_for_kind(node.kind));
    }

    let edges = diagram
        .transitions
        .iter()
        .map(|t| (t.source.clone(), t.target.clone(), t.label.clone()))
        .collect();

    let mut clusters = IndexMap::new();
    for (id, composite) in &diagram.composites {
        clusters.insert(
            id.clone(),
            (composite.label.clone(), composite.members.clone(), composite.parent.clone()),
        );
    }
    for lane in &diagram.lanes {
        clusters.insert(lane.qualified_id(), (None, lane.members.clone(), Some(lane.parent.clone())));
    }

    GenericGraph {
        direction: diagram.direction.unwrap_or(Direction::TB),
        node_order,
        node_labels,
        node_shapes,
        edges,
        clusters,
    }
}

fn shape_for_kind(kind: StateNodeKind) -> NodeShape {
    match kind {
        StateNodeKind::Start | StateNodeKind::End | StateNodeKind::History | StateNodeKind::HistoryDeep => {
            NodeShape::Circle
        }
        StateNodeKind::Choice => NodeShape::Diamond,
        StateNodeKind::Fork | StateNodeKind::Join => NodeShape::Subroutine,
        StateNodeKind::Composite => NodeShape::Rectangle,
        StateNodeKind::Simple => NodeShape::Round,
    }
}

fn pseudo_glyph(kind: StateNodeKind) -> Option<String> {
    match kind {
        StateNodeKind::History => Some("H".to_string()),
        StateNodeKind::HistoryDeep => Some("H*".to_string()),
        _ => None,
    }
}

pub fn draw_state(diagram: &StateDiagram, layout_result: &Layout) -> String {
    let mut body = String::new();

    for cluster in &layout_result.subgraphs {
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"#666677\" stroke-dasharray=\"5,3\" rx=\"6\"/>",
            cluster.x, cluster.y, cluster.width, cluster.height
        ));
        if let Some(label) = &cluster.label {
            body.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">{}</text>",
                cluster.x + 6.0,
                cluster.y + 14.0,
                escape_xml(label)
            ));
        }
    }

    for edge in &layout_result.edges {
        let mut d = String::new();
        if let Some(first) = edge.points.first() {
            d.push_str(&format!("M{:.1},{:.1}", first.x, first.y));
            for p in &edge.points[1..] {
                d.push_str(&format!(" L{:.1},{:.1}", p.x, p.y));
            }
        }
        body.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"#333333\" marker-end=\"url(#arrowhead)\"/>"
        ));
        if let Some(label) = &edge.label {
            if let Some(mid) = edge.points.get(edge.points.len() / 2) {
                body.push_str(&svg::text_lines(mid.x, mid.y - 6.0, &[escape_xml(label)], "middle"));
            }
        }
    }

    for node in &layout_result.nodes {
        let kind = diagram.nodes.get(&node.id).map(|n| n.kind).unwrap_or(StateNodeKind::Simple);
        body.push_str(&draw_state_node(node, kind));
    }

    svg::svg_document(layout_result.width, layout_result.height, &body)
}

fn draw_state_node(node: &diagramlint_core::model::layout::LayoutNode, kind: StateNodeKind) -> String {
    let (x, y, w, h) = (node.x, node.y, node.width, node.height);
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    match kind {
        StateNodeKind::Start => format!("<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"8\" fill=\"#333355\"/>"),
        StateNodeKind::End => format!(
            "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"9\" fill=\"none\" stroke=\"#333355\"/><circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"5\" fill=\"#333355\"/>"
        ),
        StateNodeKind::History | StateNodeKind::HistoryDeep => format!(
            "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"10\" fill=\"none\" stroke=\"#333355\"/>{}",
            svg::text_lines(cx, cy, &[node.label.clone()], "middle")
        ),
        StateNodeKind::Choice => format!(
            "<polygon points=\"{cx:.1},{y:.1} {:.1},{cy:.1} {cx:.1},{:.1} {x:.1},{cy:.1}\" fill=\"#eef2ff\" stroke=\"#333355\"/>",
            x + w,
            y + h
        ),
        StateNodeKind::Fork | StateNodeKind::Join => {
            format!("<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"8\" fill=\"#333355\"/>")
        }
        StateNodeKind::Composite => format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" rx=\"6\" fill=\"#fbfbfe\" stroke=\"#333355\"/>{}",
            svg::text_lines(cx, y + 14.0, &[node.label.clone()], "middle")
        ),
        StateNodeKind::Simple => format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" rx=\"{:.1}\" fill=\"#eef2ff\" stroke=\"#333355\"/>{}",
            h / 2.0,
            svg::text_lines(cx, cy, &[node.label.clone()], "middle")
        ),
    }
}

pub fn layout_class(diagram: &ClassDiagram) -> Layout {
    flowchart::layout(&class_to_graph(diagram))
}

pub fn layout_state(diagram: &StateDiagram) -> Layout {
    flowchart::layout(&state_to_graph(diagram))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlint_core::model::class::Class;
    use diagramlint_core::model::state::{StateNode, synthetic_pseudo_id};

    #[test]
    fn class_projection_includes_attributes_in_label() {
        let mut diagram = ClassDiagram::default();
        let mut class = Class::new("Animal");
        class.attributes.push("+name: String".to_string());
        diagram.classes.insert("Animal".to_string(), class);
        let graph = class_to_graph(&diagram);
        assert!(graph.node_labels["Animal"].contains("+name: String"));
    }

    #[test]
    fn state_projection_gives_start_a_circle_shape() {
        let mut diagram = StateDiagram::default();
        let id = synthetic_pseudo_id(StateNodeKind::Start, 0);
        diagram.nodes.insert(id.clone(), StateNode { id: id.clone(), label: None, kind: StateNodeKind::Start, parent: None });
        let graph = state_to_graph(&diagram);
        assert_eq!(graph.node_shapes[&id], NodeShape::Circle);
    }

    #[test]
    fn draw_class_emits_svg() {
        let mut diagram = ClassDiagram::default();
        diagram.classes.insert("A".to_string(), Class::new("A"));
        let layout_result = layout_class(&diagram);
        let svg = draw_class(&diagram, &layout_result);
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn draw_state_emits_svg() {
        let mut diagram = StateDiagram::default();
        diagram.nodes.insert(
            "Idle".to_string(),
            StateNode { id: "Idle".to_string(), label: Some("Idle".to_string()), kind: StateNodeKind::Simple, parent: None },
        );
        let layout_result = layout_state(&diagram);
        let svg = draw_state(&diagram, &layout_result);
        assert!(svg.contains("<svg"));
    }
}
