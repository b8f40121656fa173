//! Layout and vector-output rendering, §4.7-§4.10. One module per diagram
//! family for layout/drawing; [`render`] dispatches on the parsed model and
//! returns the final SVG document plus the generic [`Layout`] geometry a
//! caller may want for its own purposes (e.g. golden-file snapshotting).

pub mod classstate;
pub mod flowchart;
pub mod pie;
pub mod sequence;
pub mod svg;

use diagramlint_core::frontmatter::Frontmatter;
use diagramlint_core::model::layout::Layout;
use diagramlint_core::model::Diagram;

pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { width: 800.0, height: 600.0 }
    }
}

pub enum RenderGeometry {
    Graph(Layout),
    Pie(pie::PieLayout),
    Sequence(sequence::SequenceLayout),
}

pub struct RenderOutput {
    pub vector: String,
    pub geometry: RenderGeometry,
}

/// Lays out and draws `diagram` to an SVG document, dispatching on its
/// family. Class and state diagrams project onto the flowchart layout
/// engine first (`classstate.rs`); flowchart, pie, and sequence each carry
/// their own layout.
pub fn render(diagram: &Diagram, frontmatter: Option<&Frontmatter>, options: &RenderOptions) -> RenderOutput {
    match diagram {
        Diagram::Flowchart(flow) => {
            let graph = flowchart_graph(flow);
            let layout_result = flowchart::layout(&graph);
            let vector = flowchart::draw(flow, &layout_result);
            RenderOutput { vector, geometry: RenderGeometry::Graph(layout_result) }
        }
        Diagram::Pie(pie_model) => {
            let layout_result = pie::layout(pie_model, options.width, options.height);
            let vector = pie::draw(pie_model, &layout_result, frontmatter);
            RenderOutput { vector, geometry: RenderGeometry::Pie(layout_result) }
        }
        Diagram::Sequence(seq) => {
            let layout_result = sequence::layout(seq);
            let vector = sequence::draw(seq, &layout_result);
            RenderOutput { vector, geometry: RenderGeometry::Sequence(layout_result) }
        }
        Diagram::Class(class_diagram) => {
            let layout_result = classstate::layout_class(class_diagram);
            let vector = classstate::draw_class(class_diagram, &layout_result);
            RenderOutput { vector, geometry: RenderGeometry::Graph(layout_result) }
        }
        Diagram::State(state_diagram) => {
            let layout_result = classstate::layout_state(state_diagram);
            let vector = classstate::draw_state(state_diagram, &layout_result);
            RenderOutput { vector, geometry: RenderGeometry::Graph(layout_result) }
        }
    }
}

fn flowchart_graph(flow: &diagramlint_core::model::flowchart::Flowchart) -> flowchart::GenericGraph {
    use indexmap::{IndexMap, IndexSet};

    let node_order: Vec<String> = flow.nodes.keys().cloned().collect();
    let node_labels: IndexMap<String, String> = flow.nodes.iter().map(|(id, n)| (id.clone(), n.label.clone())).collect();
    let node_shapes: IndexMap<String, diagramlint_core::model::flowchart::NodeShape> =
        flow.nodes.iter().map(|(id, n)| (id.clone(), n.shape)).collect();
    let edges = flow.edges.iter().map(|e| (e.source.clone(), e.target.clone(), e.label.clone())).collect();

    let mut clusters = IndexMap::new();
    for (id, sub) in &flow.subgraphs {
        clusters.insert(id.clone(), (sub.label.clone(), sub.members.clone() as IndexSet<String>, sub.parent.clone()));
    }

    flowchart::GenericGraph {
        direction: flow.direction.unwrap_or(diagramlint_core::model::flowchart::Direction::TB),
        node_order,
        node_labels,
        node_shapes,
        edges,
        clusters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlint_core::model::flowchart::{Direction, Flowchart, Node, NodeShape};

    #[test]
    fn render_dispatches_flowchart_to_svg() {
        let mut flow = Flowchart::new(Some(Direction::TB));
        flow.nodes.insert(
            "A".to_string(),
            Node { id: "A".to_string(), label: "A".to_string(), shape: NodeShape::Rectangle, style: None, link: None },
        );
        let diagram = Diagram::Flowchart(flow);
        let output = render(&diagram, None, &RenderOptions::default());
        assert!(output.vector.contains("<svg"));
    }
}
