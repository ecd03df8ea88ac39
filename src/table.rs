use crate::classify::{is_table_border, GridLine, VBAR};
use crate::types::{Document, Node, Table};

/// Column boundaries taken from the first rule line carrying a `┬`.
fn boundaries(rule: &str) -> Vec<usize> {
    let grid = GridLine::new(rule);
    let mut out: Vec<usize> = ['┌', '├', '┬', '┼']
        .into_iter()
        .flat_map(|glyph| grid.columns_of(glyph))
        .collect();
    out.sort_unstable();
    let end = ['┐', '┤']
        .into_iter()
        .flat_map(|glyph| grid.columns_of(glyph))
        .max();
    out.extend(end);
    out
}

fn split_row(line: &str, bounds: &[usize]) -> Vec<String> {
    let grid = GridLine::new(line);
    bounds
        .windows(2)
        .map(|w| {
            let cell: String = grid
                .slice(w[0] + 1, w[1])
                .chars()
                .filter(|&c| c != VBAR)
                .collect();
            cell.trim().to_string()
        })
        .collect()
}

pub fn parse(text: &str) -> Option<Document> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let rule = lines.iter().find(|l| l.contains('┬'))?;
    let bounds = boundaries(rule);
    if bounds.len() < 3 {
        return None;
    }

    let mut rows: Vec<Vec<String>> = lines
        .iter()
        .filter(|l| {
            let t = l.trim();
            t.starts_with(VBAR) && !is_table_border(t)
        })
        .map(|l| split_row(l, &bounds))
        .collect();
    if rows.is_empty() {
        return None;
    }

    let headers = rows.remove(0);
    let has_header_separator = lines.iter().any(|l| l.contains('┼'));

    let mut doc = Document::new(headers.join(" / "));
    doc.nodes.push(Node::Table(Table {
        headers,
        rows,
        has_header_separator,
    }));
    Some(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(doc: &Document) -> &Table {
        match &doc.nodes[0] {
            Node::Table(t) => t,
            other => panic!("expected table, got {}", other.kind()),
        }
    }

    #[test]
    fn two_column_table_with_separator() {
        let text = "┌─────┬─────┐\n│ A   │ B   │\n├─────┼─────┤\n│ 1   │ 2   │\n│ 3   │ 4   │\n└─────┴─────┘";
        let doc = parse(text).unwrap();
        let t = table(&doc);
        assert_eq!(t.headers, vec!["A", "B"]);
        assert_eq!(t.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
        assert!(t.has_header_separator);
        assert_eq!(doc.title, "A / B");
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let text = "┌───┬───┬───┐\n│ a │ b │ c │\n│ x │\n└───┴───┴───┘";
        let doc = parse(text).unwrap();
        let t = table(&doc);
        assert_eq!(t.rows, vec![vec!["x", "", ""]]);
        assert!(t.rows.iter().all(|r| r.len() == t.headers.len()));
        assert!(!t.has_header_separator);
    }

    #[test]
    fn hangul_cells_keep_column_alignment() {
        let text = "┌──────┬──────┐\n│ 항목 │ 값   │\n│ 용량 │ 5kW  │\n└──────┴──────┘";
        let doc = parse(text).unwrap();
        assert_eq!(table(&doc).rows, vec![vec!["용량", "5kW"]]);
    }

    #[test]
    fn declines_single_column_rule() {
        let text = "┌──────┐\n│ a    │\n└──┬───┘\n   │";
        assert!(parse(text).is_none());
    }

    #[test]
    fn declines_without_rows() {
        assert!(parse("┌───┬───┐\n└───┴───┘").is_none());
    }

    #[test]
    fn tab_inside_a_row_keeps_later_cells_aligned() {
        let text = "┌───┬──┐\n│\tab│cd│";
        let doc = parse(text).unwrap();
        assert_eq!(table(&doc).headers, vec!["ab", "cd"]);
    }

    fn rule_line(widths: &[usize]) -> String {
        let runs: Vec<String> = widths.iter().map(|&w| "─".repeat(w)).collect();
        format!("┌{}┐", runs.join("┬"))
    }

    proptest! {
        #[test]
        fn every_row_has_one_cell_per_header(
            widths in prop::collection::vec(2usize..8, 2..6),
            rows in prop::collection::vec("[a가 │\t─✅\\[\\]]{0,30}", 0..6),
        ) {
            let mut lines = vec![rule_line(&widths), "│ head".to_string()];
            lines.extend(rows.iter().map(|r| format!("│{r}")));
            let doc = parse(&lines.join("\n")).unwrap();
            let t = table(&doc);
            prop_assert_eq!(t.headers.len(), widths.len());
            for row in &t.rows {
                prop_assert_eq!(row.len(), t.headers.len());
            }
        }
    }
}
