//! Rewrites an arbitrary SVG icon into the restricted form the game plays
//! on: presentation styling lives in attributes, every drawable is a `path`
//! element, references and transforms are resolved away.

use log::warn;

use crate::Error;
use crate::consts::NEUTRAL_COLOR;
use crate::matrix::Matrix;
use crate::path::PathData;
use crate::shapes::{self, Options};
use crate::tree::{NodeId, SvgTree};

// https://developer.mozilla.org/en-US/docs/Web/SVG/Element/svg
// "d" is deliberately absent: it must stay tied to path elements.
const PRESENTATION_ATTRIBUTES: &[&str] = &[
    "alignment-baseline",
    "baseline-shift",
    "clip",
    "clip-path",
    "clip-rule",
    "color",
    "color-interpolation",
    "color-interpolation-filters",
    "color-profile",
    "color-rendering",
    "cursor",
    "direction",
    "display",
    "dominant-baseline",
    "enable-background",
    "fill",
    "fill-opacity",
    "fill-rule",
    "filter",
    "flood-color",
    "flood-opacity",
    "font-family",
    "font-size",
    "font-size-adjust",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-weight",
    "glyph-orientation-horizontal",
    "glyph-orientation-vertical",
    "image-rendering",
    "kerning",
    "letter-spacing",
    "lighting-color",
    "marker-end",
    "marker-mid",
    "marker-start",
    "mask",
    "opacity",
    "overflow",
    "pointer-events",
    "shape-rendering",
    "solid-color",
    "solid-opacity",
    "stop-color",
    "stop-opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-anchor",
    "text-decoration",
    "text-rendering",
    "transform",
    "unicode-bidi",
    "vector-effect",
    "visibility",
    "word-spacing",
    "writing-mode",
];

fn is_presentation_attribute(name: &str) -> bool {
    PRESENTATION_ATTRIBUTES.contains(&name)
}

/// Run every normalization pass in order. Pass order matters: styles must
/// become attributes before color resolution reads them, shapes must become
/// paths before `use` expansion can clone them, and transforms are folded
/// into the path data only once nothing but paths remain.
pub fn normalize(tree: &mut SvgTree, options: &Options) -> Result<(), Error> {
    style_to_attributes(tree);
    let root = tree.root();
    if tree.attr(root, "fill").is_none() {
        tree.set_attr(root, "fill", NEUTRAL_COLOR);
    }
    resolve_current_color(tree);
    hoist_root_attributes(tree);
    shapes::convert_shapes(tree, options);
    resolve_use(tree);
    flatten_transforms(tree)?;
    Ok(())
}

/// Split each `style` attribute into individual presentation attributes.
/// Properties outside the known set stay behind in the style attribute.
fn style_to_attributes(tree: &mut SvgTree) {
    for node in tree.descendants(tree.root()) {
        let Some(style) = tree.attr(node, "style") else {
            continue;
        };
        let mut kept = Vec::new();
        let mut promoted = Vec::new();
        for declaration in style.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let (property, value) = (property.trim(), value.trim());
            if is_presentation_attribute(property) {
                promoted.push((property.to_string(), value.to_string()));
            } else if !property.is_empty() {
                kept.push(format!("{property}:{value}"));
            }
        }
        for (name, value) in promoted {
            tree.set_attr(node, &name, &value);
        }
        if kept.is_empty() {
            tree.remove_attr(node, "style");
        } else {
            tree.set_attr(node, "style", &kept.join(";"));
        }
    }
}

/// Value an attribute resolves to at `node`: its own value, else the nearest
/// ancestor's.
fn computed_attr<'a>(tree: &'a SvgTree, node: NodeId, name: &str) -> Option<&'a str> {
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(value) = tree.attr(id, name) {
            return Some(value);
        }
        current = tree.parent(id);
    }
    None
}

/// `currentColor` depends on CSS the game never evaluates, so pin any node
/// that would inherit it to the neutral color instead.
fn resolve_current_color(tree: &mut SvgTree) {
    // scan first, apply after: rewriting an ancestor mid-walk would hide
    // the inherited `currentColor` from its descendants
    let mut pinned = Vec::new();
    for node in tree.descendants(tree.root()) {
        for name in ["fill", "stroke"] {
            let inherited = computed_attr(tree, node, name)
                .is_some_and(|v| v.eq_ignore_ascii_case("currentcolor"));
            if inherited {
                pinned.push((node, name));
            }
        }
    }
    for (node, name) in pinned {
        tree.set_attr(node, name, NEUTRAL_COLOR);
    }
}

/// Presentation attributes on the root would be lost when the root's
/// attributes are later rewritten, so move them onto a group wrapping the
/// original content.
fn hoist_root_attributes(tree: &mut SvgTree) {
    let root = tree.root();
    let hoisted: Vec<(String, String)> = tree
        .attrs(root)
        .iter()
        .filter(|(name, _)| is_presentation_attribute(name))
        .cloned()
        .collect();
    if hoisted.is_empty() {
        return;
    }
    for (name, _) in &hoisted {
        tree.remove_attr(root, name);
    }
    let group = tree.new_node("g");
    for (name, value) in &hoisted {
        tree.set_attr(group, name, value);
    }
    for child in tree.take_children(root) {
        tree.append_child(group, child);
    }
    tree.append_child(root, group);
}

/// Expand `<use>` references by cloning their targets in place. The clone
/// takes the use element's attributes (minus the reference itself) and loses
/// its id so the document keeps unique ids.
fn resolve_use(tree: &mut SvgTree) {
    let uses: Vec<NodeId> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|&n| tree.tag(n) == "use")
        .collect();
    for use_node in uses {
        let Some(id) = tree.href(use_node).and_then(|h| h.strip_prefix('#')) else {
            warn!("use element without a fragment reference");
            continue;
        };
        let Some(target) = tree.find_by_id_attr(id) else {
            warn!("use element references missing id {id:?}");
            continue;
        };
        let clone = tree.deep_clone(target);
        let carried: Vec<(String, String)> = tree
            .attrs(use_node)
            .iter()
            .filter(|(name, _)| name != "href" && name != "xlink:href")
            .cloned()
            .collect();
        for (name, value) in carried {
            tree.set_attr(clone, &name, &value);
        }
        tree.remove_attr(clone, "id");
        tree.replace(use_node, clone);
    }
}

/// Fold every ancestor transform into each path's coordinates, then strip
/// the transform attributes. Outermost transforms apply last to a point, so
/// the composition runs root-to-leaf.
fn flatten_transforms(tree: &mut SvgTree) -> Result<(), Error> {
    let nodes = tree.descendants(tree.root());
    for &node in &nodes {
        if tree.tag(node) != "path" {
            continue;
        }
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(value) = tree.attr(id, "transform") {
                chain.push(Matrix::parse_list(value)?);
            }
            current = tree.parent(id);
        }
        let matrix = chain
            .into_iter()
            .rev()
            .fold(Matrix::IDENTITY, |acc, m| acc.mul(&m));
        if matrix.is_identity() {
            continue;
        }
        let mut data = PathData::parse(tree.attr(node, "d").unwrap_or(""))?;
        data.transform(&matrix);
        tree.set_attr(node, "d", &data.to_string());
    }
    for node in nodes {
        tree.remove_attr(node, "transform");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler;

    fn normalized(svg: &str) -> SvgTree {
        let mut tree = SvgTree::parse(svg).unwrap();
        normalize(&mut tree, &Options::default()).unwrap();
        tree
    }

    fn find_tag(tree: &SvgTree, tag: &str) -> Option<NodeId> {
        tree.descendants(tree.root())
            .into_iter()
            .find(|&n| tree.tag(n) == tag)
    }

    #[test]
    fn style_declarations_become_attributes() {
        let tree = normalized(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                <path style="fill: red; stroke:blue; --custom: 1" d="M 0 0 L 1 1"/>
            </svg>"#,
        );
        let path = find_tag(&tree, "path").unwrap();
        assert_eq!(tree.attr(path, "fill"), Some("red"));
        assert_eq!(tree.attr(path, "stroke"), Some("blue"));
        assert_eq!(tree.attr(path, "style"), Some("--custom:1"));
    }

    #[test]
    fn current_color_becomes_neutral() {
        let tree = normalized(
            r#"<svg xmlns="http://www.w3.org/2000/svg" fill="currentColor" viewBox="0 0 10 10">
                <path d="M 0 0 L 1 1"/>
            </svg>"#,
        );
        let path = find_tag(&tree, "path").unwrap();
        assert_eq!(tree.attr(path, "fill"), Some("gray"));
    }

    #[test]
    fn missing_root_fill_defaults_to_neutral() {
        let tree = normalized(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                <path d="M 0 0 L 1 1"/>
            </svg>"#,
        );
        // the default lands on the root, then hoisting re-homes it onto
        // the wrapping group
        assert_eq!(tree.attr(tree.root(), "fill"), None);
        let group = find_tag(&tree, "g").unwrap();
        assert_eq!(tree.attr(group, "fill"), Some("gray"));
    }

    #[test]
    fn current_color_pins_inheriting_descendants() {
        let tree = normalized(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                <g fill="currentColor">
                    <path d="M 0 0 L 1 1"/>
                    <path fill="red" d="M 0 0 L 2 2"/>
                </g>
            </svg>"#,
        );
        let paths: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&n| tree.tag(n) == "path")
            .collect();
        assert_eq!(tree.attr(paths[0], "fill"), Some("gray"));
        assert_eq!(tree.attr(paths[1], "fill"), Some("red"));
    }

    #[test]
    fn root_presentation_attrs_move_onto_group() {
        let tree = normalized(
            r#"<svg xmlns="http://www.w3.org/2000/svg" stroke="red" viewBox="0 0 10 10">
                <path d="M 0 0 L 1 1"/>
            </svg>"#,
        );
        assert_eq!(tree.attr(tree.root(), "stroke"), None);
        let group = find_tag(&tree, "g").unwrap();
        assert_eq!(tree.attr(group, "stroke"), Some("red"));
        assert_eq!(tree.children(group).len(), 1);
    }

    #[test]
    fn use_reference_is_expanded() {
        let tree = normalized(
            r##"<svg xmlns="http://www.w3.org/2000/svg"
                xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 20 20">
                <defs><path id="stem" d="M 0 0 L 5 5"/></defs>
                <use xlink:href="#stem" fill="red"/>
            </svg>"##,
        );
        assert!(find_tag(&tree, "use").is_none());
        let expanded = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&n| tree.tag(n) == "path" && tree.attr(n, "fill") == Some("red"))
            .count();
        assert_eq!(expanded, 1);
    }

    #[test]
    fn dangling_use_is_left_alone() {
        let tree = normalized(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                <use href="#nothing"/>
            </svg>"##,
        );
        assert!(find_tag(&tree, "use").is_some());
    }

    #[test]
    fn nested_transforms_fold_into_coordinates() {
        let tree = normalized(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <g transform="translate(10 0)">
                    <path transform="scale(2)" d="M 1 1 L 2 3"/>
                </g>
            </svg>"#,
        );
        let path = find_tag(&tree, "path").unwrap();
        assert_eq!(tree.attr(path, "transform"), None);
        let data = PathData::parse(tree.attr(path, "d").unwrap()).unwrap();
        let samples = sampler::sample(&data);
        assert_eq!((samples[0].x, samples[0].y), (14.0, 6.0));
    }

    #[test]
    fn shapes_are_converted_before_use_expansion() {
        let tree = normalized(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 20">
                <defs><rect id="box" width="4" height="4"/></defs>
                <use href="#box" transform="translate(10 10)"/>
            </svg>"##,
        );
        assert!(find_tag(&tree, "rect").is_none());
        // the expanded copy lost its id; the defs template keeps it
        let expanded = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&n| tree.tag(n) == "path" && tree.attr(n, "id").is_none())
            .unwrap();
        let data = PathData::parse(tree.attr(expanded, "d").unwrap()).unwrap();
        let samples = sampler::sample(&data);
        assert!(samples.iter().all(|s| s.x >= 10.0 && s.y >= 10.0));
    }
}
