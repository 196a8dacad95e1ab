//! Mesh containers and the structured text input format
//!
//! The text format has three section kinds, each introduced by a `#` header:
//!
//! ```text
//! #Nodes
//! 1  0.0 0.0 0.0        <- id x y z, one node per line
//! -1                    <- sentinel ends the section
//! #Elements
//! 1  1 2 5 4  0 0       <- id then 4 node ids; trailing fields are ignored
//! -1
//! #NamedSelection
//! fixed_edge NODE 3     <- group name, kind token, id count
//! 1 2 3                 <- ids, free to span lines
//! #End
//! ```
//!
//! `#End` (or `#end`) terminates the stream. Meshes can also be built
//! programmatically with the `add_*` methods; either way [`Mesh::validate`]
//! must pass before the mesh is used for assembly, which is what makes the
//! `(id-1)*2` DOF numbering total.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FeaError, FeaResult};

/// A mesh node; `z` is carried from the input format but unused in 2D
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Element topology, a closed set dispatched by tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    /// 4-node bilinear quadrilateral
    Quad4,
}

/// One element: topology tag plus counter-clockwise connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: usize,
    pub kind: ElementKind,
    pub nodes: [usize; 4],
}

/// A named selection of node ids, bound to a boundary condition by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub name: String,
    pub nodes: Vec<usize>,
}

/// Node/element/group containers, immutable once validated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    nodes: Vec<Node>,
    elements: Vec<Element>,
    groups: Vec<NodeGroup>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate a mesh from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> FeaResult<Self> {
        fs::read_to_string(path)?.parse()
    }

    pub fn add_node(&mut self, id: usize, x: f64, y: f64, z: f64) {
        self.nodes.push(Node { id, x, y, z });
    }

    pub fn add_quad(&mut self, id: usize, nodes: [usize; 4]) {
        self.elements.push(Element {
            id,
            kind: ElementKind::Quad4,
            nodes,
        });
    }

    pub fn add_group(&mut self, name: impl Into<String>, nodes: Vec<usize>) {
        self.groups.push(NodeGroup {
            name: name.into(),
            nodes,
        });
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn groups(&self) -> &[NodeGroup] {
        &self.groups
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Look up a node by 1-based id (valid after [`Mesh::validate`])
    pub fn node(&self, id: usize) -> FeaResult<&Node> {
        id.checked_sub(1)
            .and_then(|idx| self.nodes.get(idx))
            .filter(|n| n.id == id)
            .ok_or(FeaError::NodeNotFound(id))
    }

    /// Look up a named selection
    pub fn group(&self, name: &str) -> FeaResult<&NodeGroup> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| FeaError::GroupNotFound(name.to_string()))
    }

    /// Corner coordinates of an element in local node order
    pub fn element_coords(&self, element: &Element) -> FeaResult<[[f64; 2]; 4]> {
        let mut coords = [[0.0; 2]; 4];
        for (k, &id) in element.nodes.iter().enumerate() {
            let node = self.node(id)?;
            coords[k] = [node.x, node.y];
        }
        Ok(coords)
    }

    /// Check structural invariants and normalize node storage order
    ///
    /// After this returns Ok: node ids are exactly 1..=N in storage order,
    /// every element references existing nodes with no two cyclically
    /// consecutive ids equal, and every group is non-empty, uniquely named,
    /// and references existing nodes.
    pub fn validate(&mut self) -> FeaResult<()> {
        if self.nodes.is_empty() {
            return Err(FeaError::InvalidMesh("mesh has no nodes".into()));
        }

        self.nodes.sort_by_key(|n| n.id);
        for (idx, node) in self.nodes.iter().enumerate() {
            let expected = idx + 1;
            if node.id != expected {
                let reason = if idx > 0 && self.nodes[idx - 1].id == node.id {
                    format!("duplicate node id {}", node.id)
                } else {
                    format!("node ids must be contiguous from 1, expected {expected} found {}", node.id)
                };
                return Err(FeaError::InvalidMesh(reason));
            }
        }

        let n = self.nodes.len();
        for element in &self.elements {
            for &id in &element.nodes {
                if id == 0 || id > n {
                    return Err(FeaError::InvalidMesh(format!(
                        "element {} references unknown node {id}",
                        element.id
                    )));
                }
            }
            for k in 0..4 {
                if element.nodes[k] == element.nodes[(k + 1) % 4] {
                    return Err(FeaError::InvalidMesh(format!(
                        "element {} repeats node {} on consecutive corners",
                        element.id, element.nodes[k]
                    )));
                }
            }
        }

        for (gi, group) in self.groups.iter().enumerate() {
            if group.nodes.is_empty() {
                return Err(FeaError::InvalidMesh(format!(
                    "group '{}' has no nodes",
                    group.name
                )));
            }
            if self.groups[..gi].iter().any(|g| g.name == group.name) {
                return Err(FeaError::InvalidMesh(format!(
                    "duplicate group name '{}'",
                    group.name
                )));
            }
            for &id in &group.nodes {
                if id == 0 || id > n {
                    return Err(FeaError::InvalidMesh(format!(
                        "group '{}' references unknown node {id}",
                        group.name
                    )));
                }
            }
        }

        Ok(())
    }
}

impl FromStr for Mesh {
    type Err = FeaError;

    fn from_str(text: &str) -> FeaResult<Self> {
        let mut mesh = parse_sections(text)?;
        mesh.validate()?;
        Ok(mesh)
    }
}

fn bad_line(line: usize, message: impl Into<String>) -> FeaError {
    FeaError::MeshFormat {
        line,
        message: message.into(),
    }
}

fn parse_field<T: FromStr>(tok: Option<&str>, line: usize, what: &str) -> FeaResult<T> {
    let tok = tok.ok_or_else(|| bad_line(line, format!("missing {what}")))?;
    tok.parse()
        .map_err(|_| bad_line(line, format!("cannot parse {what} from '{tok}'")))
}

fn parse_sections(text: &str) -> FeaResult<Mesh> {
    let lines: Vec<&str> = text.lines().collect();
    let mut mesh = Mesh::new();
    let mut i = 0;
    let mut ended = false;

    while i < lines.len() {
        let line_no = i + 1;
        let raw = lines[i].trim();
        i += 1;

        if raw.is_empty() {
            continue;
        }

        match raw {
            "#Nodes" => parse_nodes(&lines, &mut i, &mut mesh)?,
            "#Elements" => parse_elements(&lines, &mut i, &mut mesh)?,
            "#NamedSelection" => parse_selection(&lines, &mut i, &mut mesh)?,
            "#End" | "#end" => {
                ended = true;
                break;
            }
            other => {
                return Err(bad_line(line_no, format!("unexpected content '{other}'")));
            }
        }
    }

    if !ended {
        return Err(bad_line(lines.len(), "missing #End terminator"));
    }

    Ok(mesh)
}

fn parse_nodes(lines: &[&str], i: &mut usize, mesh: &mut Mesh) -> FeaResult<()> {
    loop {
        let line_no = *i + 1;
        let raw = lines
            .get(*i)
            .ok_or_else(|| bad_line(line_no, "unterminated #Nodes section"))?
            .trim();
        *i += 1;

        if raw.is_empty() {
            continue;
        }

        let mut tok = raw.split_whitespace();
        let id: i64 = parse_field(tok.next(), line_no, "node id")?;
        if id == -1 {
            return Ok(());
        }
        if id <= 0 {
            return Err(bad_line(line_no, format!("node id must be positive, got {id}")));
        }

        let x: f64 = parse_field(tok.next(), line_no, "x coordinate")?;
        let y: f64 = parse_field(tok.next(), line_no, "y coordinate")?;
        let z: f64 = parse_field(tok.next(), line_no, "z coordinate")?;
        if tok.next().is_some() {
            return Err(bad_line(line_no, "unexpected trailing fields on node line"));
        }

        mesh.add_node(id as usize, x, y, z);
    }
}

fn parse_elements(lines: &[&str], i: &mut usize, mesh: &mut Mesh) -> FeaResult<()> {
    loop {
        let line_no = *i + 1;
        let raw = lines
            .get(*i)
            .ok_or_else(|| bad_line(line_no, "unterminated #Elements section"))?
            .trim();
        *i += 1;

        if raw.is_empty() {
            continue;
        }

        let mut tok = raw.split_whitespace();
        let id: i64 = parse_field(tok.next(), line_no, "element id")?;
        if id == -1 {
            return Ok(());
        }
        if id <= 0 {
            return Err(bad_line(line_no, format!("element id must be positive, got {id}")));
        }

        let mut nodes = [0usize; 4];
        for (k, slot) in nodes.iter_mut().enumerate() {
            let nid: i64 = parse_field(tok.next(), line_no, &format!("node id {}", k + 1))?;
            if nid <= 0 {
                return Err(bad_line(
                    line_no,
                    format!("element {id} has non-positive node id {nid}"),
                ));
            }
            *slot = nid as usize;
        }
        // Remaining fields on the line are exporter metadata, skipped

        mesh.add_quad(id as usize, nodes);
    }
}

fn parse_selection(lines: &[&str], i: &mut usize, mesh: &mut Mesh) -> FeaResult<()> {
    // Header line: name, kind token, id count
    let (header_no, header) = loop {
        let line_no = *i + 1;
        let raw = lines
            .get(*i)
            .ok_or_else(|| bad_line(line_no, "missing named selection header"))?
            .trim();
        *i += 1;
        if !raw.is_empty() {
            break (line_no, raw);
        }
    };

    let mut tok = header.split_whitespace();
    let name = tok
        .next()
        .ok_or_else(|| bad_line(header_no, "missing group name"))?
        .to_string();
    let kind: String = parse_field(tok.next(), header_no, "selection kind")?;
    if kind != "NODE" {
        return Err(bad_line(
            header_no,
            format!("unsupported selection kind '{kind}' for group '{name}'"),
        ));
    }
    let count: usize = parse_field(tok.next(), header_no, "node count")?;

    // Ids may continue on the header line and span any number of lines
    let mut nodes = Vec::with_capacity(count);
    let mut rest: Vec<&str> = tok.collect();
    let mut line_no = header_no;
    loop {
        for t in rest.drain(..) {
            if nodes.len() == count {
                return Err(bad_line(
                    line_no,
                    format!("group '{name}' lists more than {count} node ids"),
                ));
            }
            let id: i64 = parse_field(Some(t), line_no, "group node id")?;
            if id <= 0 {
                return Err(bad_line(
                    line_no,
                    format!("group '{name}' has non-positive node id {id}"),
                ));
            }
            nodes.push(id as usize);
        }

        if nodes.len() == count {
            break;
        }

        line_no = *i + 1;
        let raw = lines
            .get(*i)
            .ok_or_else(|| {
                bad_line(
                    line_no,
                    format!("group '{name}' ends before listing {count} node ids"),
                )
            })?
            .trim();
        *i += 1;
        rest = raw.split_whitespace().collect();
    }

    mesh.add_group(name, nodes);
    Ok(())
}
