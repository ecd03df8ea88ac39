use crate::classify::{count_char, only_chars, strip_borders, GridLine, HBAR, NOTE_MARK, VBAR};
use crate::types::{Document, Hierarchy, HierarchyChild, HierarchyRoot, Module, Node};

const VBAR_LEN: usize = VBAR.len_utf8();

/// The band of side-by-side boxes the root fans out to.
#[derive(Debug, PartialEq)]
struct SiblingBlock {
    start: usize,
    end: usize,
    origins: Vec<usize>,
}

fn sibling_block(lines: &[&str]) -> Option<SiblingBlock> {
    let (start, origins) = lines.iter().enumerate().find_map(|(i, line)| {
        let cols = GridLine::new(line).columns_of('┌');
        (cols.len() >= 2).then_some((i, cols))
    })?;
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| count_char(line, '└') >= 2)
        .map(|(i, _)| i)?;
    Some(SiblingBlock {
        start,
        end,
        origins,
    })
}

#[derive(Debug, Default)]
struct RootBox {
    lines: Vec<String>,
    notes: Vec<String>,
    closed_at: Option<usize>,
}

fn root_box(lines: &[&str]) -> RootBox {
    let mut root = RootBox::default();
    let mut inside = false;
    for (i, line) in lines.iter().enumerate() {
        let t = line.trim();
        if t.starts_with(NOTE_MARK) {
            root.notes.push(t.to_string());
            continue;
        }
        if t.starts_with('┌') {
            inside = true;
            continue;
        }
        if t.starts_with('└') {
            inside = false;
            root.closed_at.get_or_insert(i);
            continue;
        }
        if t.starts_with('├') {
            continue;
        }
        if inside && t.starts_with(VBAR) {
            let content = strip_borders(t).trim();
            if !content.is_empty() && !only_chars(content, "─┬┼") {
                root.lines.push(content.to_string());
            }
        }
    }
    root.lines.retain(|l| !only_chars(l, "│┬┼─▼"));
    root
}

/// Text hanging off the last `│` of a connector row, e.g. a bus name.
fn connector_label(line: &str) -> Option<&str> {
    let t = line.trim();
    if t.starts_with('┌') || t.starts_with('└') {
        return None;
    }
    let pos = t.rfind(VBAR)?;
    let tail = &t[pos + VBAR_LEN..];
    if tail.is_empty() || tail.contains(['┬', '┼', HBAR]) {
        return None;
    }
    let label = tail.trim();
    (!label.is_empty() && !only_chars(label, "─┬┼▼│├┤└┌┐┘")).then_some(label)
}

/// `│ <open>───<close> │` somewhere in the segment.
fn framed_rule(seg: &str, open: char, close: char) -> bool {
    seg.match_indices(VBAR).any(|(at, _)| {
        let rest = seg[at + VBAR_LEN..].trim_start();
        let Some(rest) = rest.strip_prefix(open) else {
            return false;
        };
        let after_rule = rest.trim_start_matches(HBAR);
        if after_rule.len() == rest.len() {
            return false;
        }
        after_rule
            .strip_prefix(close)
            .is_some_and(|r| r.trim_start().starts_with(VBAR))
    })
}

/// Inner text of a `│ │ text │ │` row, possibly blank.
fn nested_row(seg: &str) -> Option<&str> {
    let bars: Vec<usize> = seg.match_indices(VBAR).map(|(i, _)| i).collect();
    for (n, &outer) in bars.iter().enumerate() {
        let Some(&inner) = bars.get(n + 1) else {
            break;
        };
        if !seg[outer + VBAR_LEN..inner].trim().is_empty() {
            continue;
        }
        let text_start = inner + VBAR_LEN;
        for pair in bars[n + 2..].windows(2) {
            let (close, outer_close) = (pair[0], pair[1]);
            if close > text_start && seg[close + VBAR_LEN..outer_close].trim().is_empty() {
                return Some(seg[text_start..close].trim());
            }
        }
    }
    None
}

/// Inner text of the first `│ text │` pair with something between the bars.
fn plain_row(seg: &str) -> Option<&str> {
    let bars: Vec<usize> = seg.match_indices(VBAR).map(|(i, _)| i).collect();
    bars.windows(2)
        .find(|w| w[1] > w[0] + VBAR_LEN)
        .map(|w| &seg[w[0] + VBAR_LEN..w[1]])
}

#[derive(Debug, Default)]
struct SiblingBox {
    lines: Vec<String>,
    modules: Vec<Vec<String>>,
    current: Option<Vec<String>>,
}

impl SiblingBox {
    fn close_module(&mut self) {
        if let Some(module) = self.current.take() {
            if !module.is_empty() {
                self.modules.push(module);
            }
        }
    }

    fn feed(&mut self, seg: &str) {
        if let Some(text) = nested_row(seg) {
            if !text.is_empty() && !only_chars(text, "─├┤┌┐└┘") {
                if let Some(module) = self.current.as_mut() {
                    module.push(text.to_string());
                }
            }
            return;
        }
        if framed_rule(seg, '┌', '┐') {
            self.current = Some(Vec::new());
            return;
        }
        if framed_rule(seg, '└', '┘') {
            self.close_module();
            return;
        }
        if framed_rule(seg, '├', '┤') {
            self.close_module();
            self.current = Some(Vec::new());
            return;
        }
        if let Some(text) = plain_row(seg) {
            let text = text.trim();
            if !text.is_empty() && !only_chars(text, "─├┤┌┐└┘") {
                self.lines.push(text.to_string());
            }
        }
    }

    fn into_child(mut self) -> HierarchyChild {
        self.close_module();
        let mut lines = self.lines.into_iter();
        let title = lines.next().unwrap_or_default();
        let info = lines
            .filter(|l| !(l.starts_with('┌') || l.starts_with('└') || l.starts_with('├')))
            .collect();
        let modules = self
            .modules
            .into_iter()
            .map(|m| {
                let mut m = m.into_iter();
                Module {
                    title: m.next().unwrap_or_default(),
                    info: m.collect(),
                }
            })
            .collect();
        HierarchyChild {
            title,
            info,
            modules,
        }
    }
}

fn split_root(lines: Vec<String>) -> HierarchyRoot {
    let mut root = HierarchyRoot::default();
    for line in lines {
        if root.title.is_empty() && !line.starts_with('-') && !line.starts_with('(') {
            root.title = line;
        } else {
            root.info.push(line);
        }
    }
    root
}

pub fn parse(text: &str) -> Option<Document> {
    let lines: Vec<&str> = text.lines().collect();
    let block = sibling_block(&lines)?;

    let root = root_box(&lines[..block.start]);
    let connection = lines[root.closed_at.map_or(0, |i| i + 1)..block.start]
        .iter()
        .find_map(|l| connector_label(l))
        .map(str::to_string);

    let mut boxes: Vec<SiblingBox> = block.origins.iter().map(|_| SiblingBox::default()).collect();
    for line in &lines[block.start + 1..block.end] {
        let grid = GridLine::new(line);
        for (i, sibling) in boxes.iter_mut().enumerate() {
            let from = block.origins[i];
            let to = block.origins.get(i + 1).copied().unwrap_or(grid.width());
            sibling.feed(&grid.slice(from, to));
        }
    }

    let children: Vec<HierarchyChild> = boxes.into_iter().map(SiblingBox::into_child).collect();
    if children.iter().filter(|c| !c.title.is_empty()).count() < 2 {
        return None;
    }

    let notes = root.notes;
    let root = split_root(root.lines);
    let title = if root.title.is_empty() {
        "Hierarchy".to_string()
    } else {
        root.title.clone()
    };

    let mut doc = Document::new(title);
    doc.nodes.push(Node::Hierarchy(Hierarchy {
        root,
        connection,
        children,
    }));
    doc.nodes
        .extend(notes.into_iter().map(|n| Node::note(n, Some("※"))));
    Some(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAN_OUT: &str = "┌─────────────────────────────────────────────────────────────────────┐
│                        System BMS (STM32G474)                       │
│  - 전체 배터리 팩 상태 모니터링                                      │
│  - Main BMS 통합 관리                                               │
└───────────────────────────┬─────────────────────────────────────────┘
                            │ BCAN (Extended CAN ID)
        ┌───────────────────┼───────────────────┐
        │                   │                   │
        ▼                   ▼                   ▼
┌───────────────┐   ┌───────────────┐   ┌───────────────┐
│  Main BMS #0  │   │  Main BMS #1  │   │  Main BMS #2  │
│   (96 cells)  │   │   (96 cells)  │   │   (96 cells)  │
│               │   │               │   │               │
│  6x LTC6813   │   │  6x LTC6813   │   │  6x LTC6813   │
└───────────────┘   └───────────────┘   └───────────────┘
※ 셀 밸런싱은 Main BMS 담당";

    const NESTED: &str = "┌──────────────────────────────────┐
│            SystemBMS             │
│       (Master Controller)        │
└────────────────┬─────────────────┘
                 │ BCAN Bus
        ┌────────┼──────────┐
        ▼        ▼          ▼
┌───────────────┐   ┌───────────────┐
│   MainBMS 00  │   │   MainBMS 01  │
│ ┌───────────┐ │   │ ┌───────────┐ │
│ │ Module 0  │ │   │ │ Module 0  │ │
│ │ Cell 1~24 │ │   │ │ Cell 1~24 │ │
│ ├───────────┤ │   │ ├───────────┤ │
│ │ Module 1  │ │   │ │ Module 1  │ │
│ └───────────┘ │   │ └───────────┘ │
└───────────────┘   └───────────────┘";

    fn hierarchy(doc: &Document) -> &Hierarchy {
        match &doc.nodes[0] {
            Node::Hierarchy(h) => h,
            other => panic!("expected hierarchy, got {}", other.kind()),
        }
    }

    #[test]
    fn root_children_and_connection() {
        let doc = parse(FAN_OUT).unwrap();
        let h = hierarchy(&doc);
        assert_eq!(doc.title, "System BMS (STM32G474)");
        assert_eq!(h.root.title, "System BMS (STM32G474)");
        assert_eq!(
            h.root.info,
            vec!["- 전체 배터리 팩 상태 모니터링", "- Main BMS 통합 관리"]
        );
        assert_eq!(h.connection.as_deref(), Some("BCAN (Extended CAN ID)"));
        assert_eq!(h.children.len(), 3);
        assert_eq!(h.children[2].title, "Main BMS #2");
        assert_eq!(h.children[0].info, vec!["(96 cells)", "6x LTC6813"]);
        assert!(h.children[0].modules.is_empty());
    }

    #[test]
    fn note_below_the_block_is_not_captured() {
        let doc = parse(FAN_OUT).unwrap();
        assert_eq!(doc.nodes.len(), 1);
    }

    #[test]
    fn note_above_the_block_trails_the_hierarchy() {
        let text = FAN_OUT.replacen("        ▼", "※ 상위 연동\n        ▼", 1);
        let doc = parse(&text).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[1], Node::note("※ 상위 연동", Some("※")));
    }

    #[test]
    fn nested_modules_split_on_separators() {
        let doc = parse(NESTED).unwrap();
        let h = hierarchy(&doc);
        assert_eq!(h.root.title, "SystemBMS");
        assert_eq!(h.root.info, vec!["(Master Controller)"]);
        assert_eq!(h.connection.as_deref(), Some("BCAN Bus"));
        assert_eq!(h.children.len(), 2);
        for child in &h.children {
            assert_eq!(child.modules.len(), 2);
            assert_eq!(child.modules[0].title, "Module 0");
            assert_eq!(child.modules[0].info, vec!["Cell 1~24"]);
            assert_eq!(child.modules[1].title, "Module 1");
            assert!(child.info.is_empty());
        }
        assert_eq!(h.children[1].title, "MainBMS 01");
    }

    #[test]
    fn declines_without_sibling_block() {
        assert!(parse("┌───┐\n│ a │\n└───┘\n  ▼").is_none());
    }

    #[test]
    fn declines_with_one_filled_sibling() {
        let text = "┌──┐ ┌──┐\n│a │ │  │\n└──┘ └──┘";
        assert!(parse(text).is_none());
    }

    #[test]
    fn segment_recognizers() {
        assert!(framed_rule("│ ┌───────────┐ │   ", '┌', '┐'));
        assert!(framed_rule("│ ├───────────┤ │", '├', '┤'));
        assert!(!framed_rule("│ ┌┐ │", '┌', '┐'));
        assert_eq!(nested_row("│ │ Module 0  │ │   "), Some("Module 0"));
        assert_eq!(nested_row("│ │           │ │"), Some(""));
        assert_eq!(nested_row("│  Main BMS #0  │   "), None);
        assert_eq!(plain_row("│  Main BMS #0  │   "), Some("  Main BMS #0  "));
        assert_eq!(plain_row("││ x │"), Some(" x "));
        assert_eq!(connector_label("      │ BCAN Bus"), Some("BCAN Bus"));
        assert_eq!(connector_label("  │       │       │"), None);
        assert_eq!(connector_label("──┼── x"), None);
    }
}
