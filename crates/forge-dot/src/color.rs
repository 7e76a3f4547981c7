use crate::Graph;

/// Fill color per node shape for pipeline visualization.
pub const SHAPE_COLORS: [(&str, &str); 6] = [
    ("Mdiamond", "#90EE90"),
    ("Msquare", "#FFB6C1"),
    ("box", "#ADD8E6"),
    ("diamond", "#FFFFE0"),
    ("hexagon", "#DDA0DD"),
    ("parallelogram", "#FFA500"),
];

pub fn shape_color(shape: &str) -> Option<&'static str> {
    SHAPE_COLORS
        .iter()
        .find(|(known, _)| *known == shape)
        .map(|(_, color)| *color)
}

/// Fills nodes by shape and colors edges whose label mentions success or
/// failure. Safe to run repeatedly.
pub fn apply_color_coding(graph: &mut Graph) {
    for node in graph.nodes.values_mut() {
        let Some(color) = node.attr("shape").and_then(shape_color) else {
            continue;
        };
        node.attrs.insert("fillcolor".to_string(), color.to_string());
        node.attrs.insert("style".to_string(), "filled".to_string());
    }

    for edge in &mut graph.edges {
        let Some(label) = edge.attr("label").map(str::to_lowercase) else {
            continue;
        };
        if label.contains("success") {
            edge.attrs.insert("color".to_string(), "green".to_string());
        } else if label.contains("fail") {
            edge.attrs.insert("color".to_string(), "red".to_string());
            edge.attrs.insert("style".to_string(), "dashed".to_string());
        }
    }
}
