use crate::classify::{has_tree_marker, DOWN_ARROW};
use crate::config::ParseOptions;
use crate::types::Document;
use crate::{generic, hierarchy, sequence, table, tree};
use tracing::debug;

/// Input shapes with a dedicated parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Tree,
    Table,
    Sequence,
    Hierarchy,
    Generic,
}

/// `┌ ... ┐` on a single line.
fn has_closed_top(line: &str) -> bool {
    line.find('┌')
        .is_some_and(|open| line[open..].contains('┐'))
}

/// A box top followed on the same line by another box top.
fn has_sibling_tops(line: &str) -> bool {
    let t = line.trim();
    if !t.starts_with('┌') {
        return false;
    }
    t.match_indices('┐').any(|(at, _)| {
        let rest = &t[at + '┐'.len_utf8()..];
        rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with('┌')
    })
}

fn looks_like_tree(text: &str) -> bool {
    has_tree_marker(text) && !text.trim().starts_with('┌')
}

fn looks_like_table(text: &str) -> bool {
    text.contains('┬') || text.contains('┴')
}

fn looks_like_sequence(text: &str) -> bool {
    text.lines().any(sequence::is_message_line) && !text.lines().any(has_closed_top)
}

fn looks_like_hierarchy(text: &str) -> bool {
    text.contains(DOWN_ARROW) && text.lines().any(has_sibling_tops)
}

fn attempt(dialect: Dialect, text: &str, opts: &ParseOptions) -> Option<Document> {
    let doc = match dialect {
        Dialect::Tree => tree::parse(text, opts.tree_indent),
        Dialect::Table => table::parse(text),
        Dialect::Sequence => sequence::parse(text),
        Dialect::Hierarchy => hierarchy::parse(text),
        Dialect::Generic => return Some(generic::parse(text, opts)),
    };
    match doc {
        Some(doc) if !doc.is_empty() => Some(doc),
        _ => {
            debug!(?dialect, "dialect declined");
            None
        }
    }
}

/// Candidate dialects for `text`, most specific first. Always ends with
/// [`Dialect::Generic`].
pub fn candidates(text: &str) -> Vec<Dialect> {
    let checks: [(Dialect, fn(&str) -> bool); 4] = [
        (Dialect::Tree, looks_like_tree),
        (Dialect::Table, looks_like_table),
        (Dialect::Sequence, looks_like_sequence),
        (Dialect::Hierarchy, looks_like_hierarchy),
    ];
    checks
        .into_iter()
        .filter(|(_, looks)| looks(text))
        .map(|(dialect, _)| dialect)
        .chain([Dialect::Generic])
        .collect()
}

pub fn parse_with(text: &str, opts: &ParseOptions) -> Document {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Document::default();
    }
    candidates(text)
        .into_iter()
        .find_map(|dialect| {
            let doc = attempt(dialect, text, opts)?;
            debug!(?dialect, nodes = doc.nodes.len(), "parsed");
            Some(doc)
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Node;
    use proptest::prelude::*;

    fn kinds(doc: &Document) -> Vec<&str> {
        doc.nodes.iter().map(Node::kind).collect()
    }

    #[test]
    fn blank_input_is_an_empty_document() {
        for text in ["", "   ", "\n\t\n"] {
            assert_eq!(parse_with(text, &ParseOptions::default()), Document::default());
        }
    }

    #[test]
    fn leading_bom_is_ignored() {
        let opts = ParseOptions::default();
        let plain = parse_with("root\n└─ a", &opts);
        assert_eq!(parse_with("\u{feff}root\n└─ a", &opts), plain);
        assert_eq!(plain.title, "root");
    }

    #[test]
    fn tree_wins_over_boxes_when_not_framed() {
        let text = "root\n├─ a\n└─ b";
        assert_eq!(candidates(text), vec![Dialect::Tree, Dialect::Generic]);
        let doc = parse_with(text, &ParseOptions::default());
        assert_eq!(kinds(&doc), vec!["tree"]);
    }

    #[test]
    fn framed_text_is_never_a_tree() {
        let text = "┌────┐\n│ a  │\n├────┤\n│ b  │\n└────┘";
        assert!(!candidates(text).contains(&Dialect::Tree));
    }

    #[test]
    fn table_dispatch() {
        let text = "┌─────┬─────┐\n│ A   │ B   │\n├─────┼─────┤\n│ 1   │ 2   │\n└─────┴─────┘";
        let doc = parse_with(text, &ParseOptions::default());
        assert_eq!(kinds(&doc), vec!["table"]);
    }

    #[test]
    fn sequence_needs_unboxed_arrows() {
        let text = "A        B\n│── GO ──>│\n│<─ OK ───│";
        assert_eq!(candidates(text), vec![Dialect::Sequence, Dialect::Generic]);
        assert_eq!(kinds(&parse_with(text, &ParseOptions::default())), vec!["sequence"]);

        let boxed = "┌──────────┐\n│── GO ──>│\n└──────────┘";
        assert!(!candidates(boxed).contains(&Dialect::Sequence));
    }

    #[test]
    fn sibling_tops_need_whitespace_between() {
        assert!(has_sibling_tops("  ┌──┐   ┌──┐"));
        assert!(!has_sibling_tops("┌──┐┌──┐"));
        assert!(!has_sibling_tops("│ ┌──┐   ┌──┐"));
    }

    #[test]
    fn declining_parser_falls_through_to_generic() {
        // Has a `┬` but only one column, so the table parser declines.
        let text = "┌──────┐\n│ 요약 │\n└──┬───┘\n※ 참고";
        let doc = parse_with(text, &ParseOptions::default());
        assert_eq!(doc.title, "요약");
        assert_eq!(kinds(&doc), vec!["note"]);
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "제목\n✅ 장점\n• 하나\n1. 첫째\n-> 세부\n키: 값";
        let opts = ParseOptions::default();
        assert_eq!(parse_with(text, &opts), parse_with(text, &opts));
    }

    const GLYPHS: &[&str] = &[
        "┌──┐", "└──┘", "├─", "└─", "┬", "┴", "┼", "┤", "│", "──", "──>│", "│<──", "▼", "※",
        "[", "]", "→", "->", ":", "•", "✅", "❌", "🏡", "1.", "1월:", "vs", "...", "₩9,900/월",
        "가", "요약", "a", "  ", " ", "\t", "\n", "\u{feff}",
    ];

    fn glyph_soup() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(GLYPHS), 0..80).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn parse_is_total_and_deterministic(text in glyph_soup()) {
            let opts = ParseOptions::default();
            let first = parse_with(&text, &opts);
            prop_assert_eq!(&first, &parse_with(&text, &opts));

            let json = crate::to_json(&first).unwrap();
            prop_assert_eq!(crate::from_json(&json).unwrap(), first);
        }
    }
}
