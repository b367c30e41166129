//! Visualization formats: JSON, Graphviz DOT, GraphML, Cytoscape.js.

use super::{GraphError, KnowledgeGraph, Properties};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{json, Map, Value};

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

impl KnowledgeGraph {
    /// Pretty-printed [`KnowledgeGraph::to_dict`].
    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// Graphviz DOT; anything below full confidence is drawn dashed, in a
    /// lighter gray the less certain it is.
    pub fn to_dot(&self) -> String {
        let mut lines = vec![
            "digraph KnowledgeGraph {".to_string(),
            "  rankdir=LR;".to_string(),
            "  node [shape=box];".to_string(),
        ];

        for node in self.nodes.values() {
            lines.push(format!(
                "  \"{}\" [label=\"{}\"{}];",
                escape_dot(&node.id),
                escape_dot(&node.label),
                uncertainty_style(node.confidence)
            ));
        }
        for edge in &self.edges {
            lines.push(format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"{}];",
                escape_dot(&edge.source_id),
                escape_dot(&edge.target_id),
                escape_dot(&edge.edge_type),
                uncertainty_style(edge.confidence)
            ));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }

    /// GraphML document with `label`/`confidence` node keys and a `type` edge key.
    pub fn to_graphml(&self) -> Result<String, GraphError> {
        let bytes = self
            .write_graphml()
            .map_err(|e| GraphError::Serialization(format!("graphml: {e}")))?;
        String::from_utf8(bytes).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    fn write_graphml(&self) -> Result<Vec<u8>, quick_xml::Error> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("graphml").with_attributes([("xmlns", GRAPHML_NS)]),
        ))?;

        for (id, domain, ty) in [
            ("label", "node", "string"),
            ("confidence", "node", "double"),
            ("type", "edge", "string"),
        ] {
            writer.write_event(Event::Empty(BytesStart::new("key").with_attributes([
                ("id", id),
                ("for", domain),
                ("attr.name", id),
                ("attr.type", ty),
            ])))?;
        }

        writer.write_event(Event::Start(
            BytesStart::new("graph")
                .with_attributes([("id", "KnowledgeGraph"), ("edgedefault", "directed")]),
        ))?;

        for node in self.nodes.values() {
            writer.write_event(Event::Start(
                BytesStart::new("node").with_attributes([("id", node.id.as_str())]),
            ))?;
            write_data(&mut writer, "label", &node.label)?;
            write_data(&mut writer, "confidence", &node.confidence.to_string())?;
            writer.write_event(Event::End(BytesEnd::new("node")))?;
        }

        for (i, edge) in self.edges.iter().enumerate() {
            let id = format!("e{i}");
            writer.write_event(Event::Start(BytesStart::new("edge").with_attributes([
                ("id", id.as_str()),
                ("source", edge.source_id.as_str()),
                ("target", edge.target_id.as_str()),
            ])))?;
            write_data(&mut writer, "type", &edge.edge_type)?;
            writer.write_event(Event::End(BytesEnd::new("edge")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("graph")))?;
        writer.write_event(Event::End(BytesEnd::new("graphml")))?;

        Ok(writer.into_inner())
    }

    /// Cytoscape.js elements; node and edge properties are flattened into `data`.
    pub fn to_cytoscape(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .values()
            .map(|node| {
                let mut data = Map::new();
                data.insert("id".into(), json!(node.id));
                data.insert("label".into(), json!(node.label));
                data.insert("type".into(), json!(node.node_type));
                data.insert("confidence".into(), json!(node.confidence));
                flatten_into(&mut data, &node.properties);
                json!({ "data": data })
            })
            .collect();

        let edges: Vec<Value> = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let mut data = Map::new();
                data.insert("id".into(), json!(format!("e{i}")));
                data.insert("source".into(), json!(edge.source_id));
                data.insert("target".into(), json!(edge.target_id));
                data.insert("type".into(), json!(edge.edge_type));
                data.insert("confidence".into(), json!(edge.confidence));
                flatten_into(&mut data, &edge.properties);
                json!({ "data": data })
            })
            .collect();

        json!({ "nodes": nodes, "edges": edges })
    }
}

fn write_data(writer: &mut Writer<Vec<u8>>, key: &str, text: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new("data").with_attributes([("key", key)])))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("data")))?;
    Ok(())
}

// Properties win over the fixed keys, as Cytoscape consumers expect.
fn flatten_into(data: &mut Map<String, Value>, properties: &Properties) {
    for (key, value) in properties {
        data.insert(key.clone(), value.clone());
    }
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn uncertainty_style(confidence: f32) -> String {
    if confidence < 1.0 {
        let gray = ((1.0 - confidence.clamp(0.0, 1.0)) * 100.0) as u32;
        format!(", style=\"dashed\", color=\"gray{gray}\"")
    } else {
        String::new()
    }
}
