use std::fmt;

use crate::Error;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Index of a node inside its [`SvgTree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, Default)]
struct Node {
    tag: String,
    // insertion order kept so serialization stays stable
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable SVG element tree backed by an arena.
///
/// Replaced nodes stay allocated but unreachable; ids handed out earlier
/// remain valid for lookup, which keeps replacement during traversal simple.
#[derive(Clone, Debug)]
pub struct SvgTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SvgTree {
    /// Parse SVG text into a tree of elements and their attributes. Text
    /// content, comments and processing instructions are dropped; the game
    /// only ever looks at element structure.
    pub fn parse(text: &str) -> Result<SvgTree, Error> {
        let doc = roxmltree::Document::parse(text)?;
        let mut tree = SvgTree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = tree.copy_from(doc.root_element(), None);
        tree.root = root;
        Ok(tree)
    }

    fn copy_from(&mut self, source: roxmltree::Node<'_, '_>, parent: Option<NodeId>) -> NodeId {
        let id = self.push(Node {
            tag: source.tag_name().name().to_string(),
            attrs: source
                .attributes()
                .map(|a| {
                    let name = if a.namespace() == Some(XLINK_NS) {
                        format!("xlink:{}", a.name())
                    } else {
                        a.name().to_string()
                    };
                    (name, a.value().to_string())
                })
                .collect(),
            parent,
            children: Vec::new(),
        });
        for child in source.children().filter(|c| c.is_element()) {
            let child_id = self.copy_from(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element; attach it with [`SvgTree::replace`] or
    /// [`SvgTree::append_child`].
    pub fn new_node(&mut self, tag: &str) -> NodeId {
        self.push(Node {
            tag: tag.to_string(),
            ..Node::default()
        })
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        &self.nodes[id.0].attrs
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[id.0].attrs;
        if let Some(slot) = attrs.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value.to_string();
        } else {
            attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.nodes[id.0].attrs.retain(|(n, _)| n != name);
    }

    /// Reference target of a `<use>` element: the namespaced attribute wins,
    /// plain `href` (SVG 2) is the fallback.
    pub fn href(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "xlink:href").or_else(|| self.attr(id, "href"))
    }

    /// Pre-order traversal starting at `id`; parents are visited before any
    /// of their descendants. Returns a snapshot so the tree can be mutated
    /// while walking.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev());
        }
        out
    }

    pub fn find_by_id_attr(&self, id_value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id_value))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Swap `new` into `old`'s slot in the parent's child list. `old` is
    /// detached but keeps its attributes, so it can still serve as the
    /// attribute source for the replacement.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let parent = self.nodes[old.0].parent;
        self.nodes[new.0].parent = parent;
        if let Some(p) = parent {
            for slot in &mut self.nodes[p.0].children {
                if *slot == old {
                    *slot = new;
                }
            }
        } else if self.root == old {
            self.root = new;
        }
        self.nodes[old.0].parent = None;
    }

    /// Detach all children of `id` and return them.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let clone = self.push(Node {
            tag: self.nodes[id.0].tag.clone(),
            attrs: self.nodes[id.0].attrs.clone(),
            parent: None,
            children: Vec::new(),
        });
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_clone = self.deep_clone(child);
            self.append_child(clone, child_clone);
        }
        clone
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        let node = &self.nodes[id.0];
        write!(f, "<{}", node.tag)?;
        if id == self.root {
            // roxmltree strips namespace declarations, so re-emit them
            write!(f, " xmlns=\"{}\" xmlns:xlink=\"{}\"", SVG_NS, XLINK_NS)?;
        }
        for (name, value) in &node.attrs {
            write!(f, " {}=\"{}\"", name, escape(value))?;
        }
        if node.children.is_empty() {
            f.write_str("/>")
        } else {
            f.write_str(">")?;
            for &child in &node.children {
                self.write_node(f, child)?;
            }
            write!(f, "</{}>", node.tag)
        }
    }
}

impl fmt::Display for SvgTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root)
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::SvgTree;

    const DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg"
        xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 10 10">
        <defs><circle id="dot" cx="5" cy="5" r="2"/></defs>
        <g fill="red"><use xlink:href="#dot"/></g>
    </svg>"##;

    #[test]
    fn parse_keeps_elements_and_attributes() {
        let tree = SvgTree::parse(DOC).unwrap();
        let root = tree.root();
        assert_eq!(tree.tag(root), "svg");
        assert_eq!(tree.attr(root, "viewBox"), Some("0 0 10 10"));
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn namespaced_href_is_found() {
        let tree = SvgTree::parse(DOC).unwrap();
        let use_node = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&n| tree.tag(n) == "use")
            .unwrap();
        assert_eq!(tree.href(use_node), Some("#dot"));
    }

    #[test]
    fn descendants_visit_parents_first() {
        let tree = SvgTree::parse(DOC).unwrap();
        let order = tree.descendants(tree.root());
        for &id in &order {
            if let Some(parent) = tree.parent(id) {
                let pi = order.iter().position(|&n| n == parent).unwrap();
                let ci = order.iter().position(|&n| n == id).unwrap();
                assert!(pi < ci);
            }
        }
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut tree = SvgTree::parse(DOC).unwrap();
        let circle = tree.find_by_id_attr("dot").unwrap();
        let clone = tree.deep_clone(circle);
        tree.set_attr(clone, "cx", "9");
        assert_eq!(tree.attr(circle, "cx"), Some("5"));
        assert_eq!(tree.attr(clone, "cx"), Some("9"));
    }

    #[test]
    fn replace_swaps_child_slot() {
        let mut tree = SvgTree::parse(DOC).unwrap();
        let circle = tree.find_by_id_attr("dot").unwrap();
        let path = tree.new_node("path");
        tree.replace(circle, path);
        let defs = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&n| tree.tag(n) == "defs")
            .unwrap();
        assert_eq!(tree.children(defs), &[path]);
        assert!(tree.parent(circle).is_none());
    }

    #[test]
    fn serialization_round_trips() {
        let tree = SvgTree::parse(DOC).unwrap();
        let text = tree.to_string();
        let reparsed = SvgTree::parse(&text).unwrap();
        assert_eq!(
            tree.descendants(tree.root()).len(),
            reparsed.descendants(reparsed.root()).len()
        );
    }
}
