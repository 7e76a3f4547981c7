use crate::{Graph, ParseError, apply_color_coding, parse, serialize};

/// An in-place pass over a parsed graph.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, graph: &mut Graph);
}

#[derive(Clone, Debug, Default)]
pub struct ColorCodingTransform;

impl Transform for ColorCodingTransform {
    fn name(&self) -> &str {
        "color_coding"
    }

    fn apply(&self, graph: &mut Graph) {
        apply_color_coding(graph);
    }
}

#[derive(Clone, Debug, Default)]
pub struct EdgeIdTransform;

impl Transform for EdgeIdTransform {
    fn name(&self) -> &str {
        "edge_ids"
    }

    fn apply(&self, graph: &mut Graph) {
        graph.assign_edge_ids();
    }
}

pub fn apply_transforms(graph: &mut Graph, transforms: &[&dyn Transform]) {
    for transform in transforms {
        tracing::debug!(transform = transform.name(), graph = %graph.name, "applying transform");
        transform.apply(graph);
    }
}

/// Parses `source` and renders it back in canonical form, optionally
/// color-coded.
pub fn normalize(source: &str, colorize: bool) -> Result<String, ParseError> {
    let mut graph = parse(source)?;
    if colorize {
        apply_transforms(&mut graph, &[&ColorCodingTransform]);
    }
    Ok(serialize(&graph))
}
