//! Graphviz DOT rendering of a run report
//!
//! Nodes are grouped into one cluster per `scheme://host`. The root's host
//! is further split into one sub-cluster per directory, and its nodes are
//! labelled with the file name only; everything else is labelled with its
//! full path. Dependency edges point from the resource to the page that
//! needs it, link edges from the page to the target.

use crate::output::report::{ReportNode, RunReport};
use crate::output::status::NodeStatus;
use crate::output::OutputResult;
use crate::storage::EdgeKind;
use crate::url::CanonicalId;
use std::collections::BTreeMap;
use std::io::Write;

/// Escapes a string for use inside a double-quoted DOT attribute
pub fn escape_label(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Turns arbitrary text into a DOT identifier fragment
pub fn cluster_id(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Key nodes are clustered by
fn cluster_key(url: &CanonicalId) -> String {
    match (url.scheme.is_empty(), url.host.is_empty()) {
        (false, false) => url.origin(),
        (false, true) => format!("{}:", url.scheme),
        (true, _) => "(unparsed)".to_string(),
    }
}

/// Splits a path into its directory (with trailing slash) and file name
fn split_dir(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    }
}

fn node_line(node: &ReportNode, label: &str, indent: &str) -> String {
    let color = node
        .status
        .color()
        .map(|c| format!(" color={}", c))
        .unwrap_or_default();
    format!(
        "{}\"{}\" [label=\"{}\" URL=\"{}\"{}]\n",
        indent,
        node.url_id,
        escape_label(label),
        escape_label(&node.url.to_string()),
        color
    )
}

fn legend() -> String {
    let mut rows = String::new();
    for status in NodeStatus::ALL {
        match status.color() {
            Some(color) => rows.push_str(&format!(
                "     <tr><td bgcolor=\"{}\">{}</td></tr>\n",
                color,
                status.label()
            )),
            None => rows.push_str(&format!("     <tr><td>{}</td></tr>\n", status.label())),
        }
    }

    format!(
        "\t{{ rank = min;\n\
         \tLegend [shape=none, margin=0, label=<\n\
         \t<table border=\"0\" cellborder=\"0\" cellspacing=\"0\" cellpadding=\"4\">\n\
         \t <tr><td bgcolor=\"white\">Legend</td></tr>\n\
         {}\
         \t</table>\n\
         \t>];\n\
         \t}}\n",
        rows
    )
}

/// Formats a report as a DOT digraph
pub fn format_dot(report: &RunReport) -> String {
    let run = &report.run;
    let root_cluster = cluster_key(&run.root);

    let mut dot = String::new();
    dot.push_str(&format!("# Run_Id={}\n", run.id));
    dot.push_str("digraph {\n");
    dot.push_str("\tfontname=\"Arial\" fontsize=11\n");
    dot.push_str("\tnode [fontname=\"Arial\",fontsize=9,color=green3,style=filled]\n");
    dot.push_str("\tedge [arrowsize=0.7,color=gray40]\n");
    dot.push_str("\tratio=compress\n");
    dot.push_str(&format!(
        "\tlabel=\"Root URL: {}\\nHosts: {}\\nTimeout: {} sec\"\n",
        escape_label(&run.root.to_string()),
        escape_label(&run.hosts_allowed),
        run.url_max_sec
    ));
    dot.push_str(&legend());

    // cluster -> directory -> nodes; only the root cluster uses directories
    let mut clusters: BTreeMap<String, BTreeMap<String, Vec<(String, &ReportNode)>>> =
        BTreeMap::new();
    for node in &report.nodes {
        let key = cluster_key(&node.url);
        let path = node.url.path_and_rest();
        let (dir, label) = if key == root_cluster {
            let (dir, file) = split_dir(&path);
            let label = if file.is_empty() { dir } else { file };
            (dir.to_string(), label.to_string())
        } else if node.url.host.is_empty() {
            (String::new(), node.url.to_string())
        } else {
            (String::new(), path.clone())
        };
        clusters
            .entry(key)
            .or_default()
            .entry(dir)
            .or_default()
            .push((label, node));
    }

    for (key, dirs) in &clusters {
        let host_id = cluster_id(key);
        dot.push_str(&format!("\tsubgraph cluster_{} {{\n", host_id));
        dot.push_str("\tpenwidth=0.5\n");
        dot.push_str(&format!("\tlabel=\"{}\"\n", escape_label(key)));

        for (dir, nodes) in dirs {
            let nested = *key == root_cluster;
            if nested {
                dot.push_str(&format!(
                    "\t\tsubgraph cluster_{}_{} {{\n",
                    host_id,
                    cluster_id(dir)
                ));
                dot.push_str("\t\tpenwidth=0.2\n");
                dot.push_str(&format!("\t\tlabel=\"{}\"\n", escape_label(dir)));
            }
            let mut nodes = nodes.clone();
            nodes.sort_by(|a, b| a.1.url.cmp(&b.1.url));
            for (label, node) in nodes {
                dot.push_str(&node_line(node, &label, "\t\t"));
            }
            if nested {
                dot.push_str("\t\t}\n");
            }
        }

        dot.push_str("\t}\n");
    }

    for edge in &report.edges {
        match edge.kind {
            EdgeKind::Dependency(_) => dot.push_str(&format!(
                "\t\"{}\" -> \"{}\"\n",
                edge.target_url_id, edge.source_url_id
            )),
            EdgeKind::Link => dot.push_str(&format!(
                "\t\"{}\" -> \"{}\"\n",
                edge.source_url_id, edge.target_url_id
            )),
        }
    }

    dot.push_str("}\n");
    dot
}

/// Writes a report as DOT
///
/// # Arguments
///
/// * `report` - The run report to render
/// * `out` - Destination (a file or stdout)
///
/// # Returns
///
/// * `Ok(())` - Successfully written
/// * `Err(OutputError)` - Failed to write
pub fn write_dot<W: Write>(report: &RunReport, out: &mut W) -> OutputResult<()> {
    out.write_all(format_dot(report).as_bytes())?;
    out.flush()?;
    Ok(())
}
