use crate::classify::{leading_whitespace, tree_marker};
use crate::types::{Document, Node, Tree, TreeItem};

const POINTER: char = '←';
const EMPHASIS: &str = "**";

fn item(line: &str, indent: usize) -> Option<TreeItem> {
    let text = tree_marker(line)?.trim();
    if text.is_empty() {
        return None;
    }
    let highlight = text.contains(POINTER) || text.contains(EMPHASIS);
    let text = text
        .split(POINTER)
        .next()
        .unwrap_or_default()
        .replace(EMPHASIS, "")
        .trim()
        .to_string();
    Some(TreeItem {
        text,
        depth: leading_whitespace(line) / indent.max(1),
        highlight,
    })
}

pub fn parse(text: &str, indent: usize) -> Option<Document> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let title = lines.next()?.trim();

    let items: Vec<TreeItem> = lines.filter_map(|l| item(l, indent)).collect();
    if items.is_empty() {
        return None;
    }

    let mut doc = Document::new(title);
    doc.nodes.push(Node::Tree(Tree { items }));
    Some(doc)
}
