//! Fallback parser for free-form card diagrams.
//!
//! Lines are scanned once, top to bottom. Several nodes can be under
//! construction at the same time (a section, a numbered list, key/value
//! pairs, two-column cards, a comparison, a timeline); [`ParserState`]
//! holds them and [`ParserState::flush`] commits them. Each line is offered
//! to [`RULES`] in order and the first rule that accepts it wins.

use crate::classify::{
    bracket_tokens, compare_arrow, continuation, find_cost, flow_label, is_compare_style,
    is_hbar_run, is_long_rule, is_rule_only, label_value, month_entry, only_chars, ordinal_item,
    section_icon, spaced_pair, starts_with_box_edge, strip_borders, strip_title_icon,
    two_columns, word_pair, GridLine, BULLET, FIELD_ICON, HOUSE_ICON, NOTE_MARK, RIGHT_ARROW,
    VBAR,
};
use crate::config::ParseOptions;
use crate::types::{
    Branch, Card, Color, Columns, Compare, CompareColumn, Document, KeyValue, KeyValueGroup, List,
    ListItem, Node, Panel, Section, Timeline, TimelineItem,
};
use std::mem;
use tracing::trace;

const SECTION_ICON: &str = "📋";
const FREE_KEYWORD: &str = "무료";
const ELLIPSIS: &str = "...";
/// Non-bullet lines at least this long are never used as a box subtitle.
const SUBTITLE_MAX: usize = 40;

/// In-progress nodes that can be committed to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    /// Only the open section.
    Section,
    /// Section, list and key/value pairs, committed in that order.
    Pending,
    Columns,
    Compare,
    Timeline,
}

impl Accumulator {
    pub const ALL: [Accumulator; 4] = [
        Accumulator::Pending,
        Accumulator::Columns,
        Accumulator::Compare,
        Accumulator::Timeline,
    ];
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ColumnCard {
    icon: String,
    title: String,
    items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct CompareDraft {
    columns: [CompareColumn; 2],
    flow: Option<String>,
}

/// A box drawn inside the outer frame, captured until its bottom edge.
#[derive(Debug, Clone, Default, PartialEq)]
struct InnerBox {
    origins: Vec<usize>,
    lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserState {
    section: Option<Section>,
    list: Option<List>,
    kv: Vec<KeyValue>,
    columns: Vec<ColumnCard>,
    compare: Option<CompareDraft>,
    timeline: Vec<TimelineItem>,
    inner_box: Option<InnerBox>,
}

impl ParserState {
    /// Commit one accumulator, returning the nodes it produced. The
    /// accumulator is always left empty, even when it had nothing to emit.
    pub fn flush(&mut self, which: Accumulator) -> Vec<Node> {
        let mut out = Vec::new();
        match which {
            Accumulator::Section => out.extend(self.section.take().map(Node::Section)),
            Accumulator::Pending => {
                out.extend(self.section.take().map(Node::Section));
                out.extend(self.list.take().map(Node::List));
                if !self.kv.is_empty() {
                    out.push(Node::KeyValue(KeyValueGroup {
                        items: mem::take(&mut self.kv),
                    }));
                }
            }
            Accumulator::Columns => {
                let cards = mem::take(&mut self.columns);
                if cards.len() >= 2 && cards.iter().any(|c| !c.items.is_empty()) {
                    let children = cards
                        .into_iter()
                        .enumerate()
                        .map(|(i, c)| {
                            Panel::Card(Card {
                                icon: (!c.icon.is_empty()).then_some(c.icon),
                                title: c.title,
                                items: c.items,
                                color: if i == 0 { Color::Blue } else { Color::Green },
                                ..Card::default()
                            })
                        })
                        .collect();
                    out.push(Node::Columns(Columns { children }));
                }
            }
            Accumulator::Compare => {
                out.extend(self.compare.take().map(|c| {
                    Node::Compare(Compare {
                        columns: Vec::from(c.columns),
                        flow: c.flow,
                    })
                }));
            }
            Accumulator::Timeline => {
                if !self.timeline.is_empty() {
                    out.push(Node::Timeline(Timeline {
                        items: mem::take(&mut self.timeline),
                    }));
                }
            }
        }
        if !out.is_empty() {
            trace!(accumulator = ?which, nodes = out.len(), "flushed");
        }
        out
    }

    pub fn flush_all(&mut self) -> Vec<Node> {
        Accumulator::ALL
            .into_iter()
            .flat_map(|which| self.flush(which))
            .collect()
    }
}

/// One source line after the outer frame has been peeled off.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    /// Text between the outer borders, untrimmed.
    pub content: &'a str,
    pub trimmed: &'a str,
}

pub(crate) type Rule = fn(&mut Scanner, &Line) -> bool;

/// Line rules in priority order.
pub(crate) const RULES: &[(&str, Rule)] = &[
    ("compare_rule_row", Scanner::compare_rule_row),
    ("compare_result", Scanner::compare_result),
    ("compare_flow", Scanner::compare_flow),
    ("compare_filler", Scanner::compare_filler),
    ("inner_box_open", Scanner::inner_box_open),
    ("inner_box_capture", Scanner::inner_box_capture),
    ("compare_columns", Scanner::compare_columns),
    ("dual_icon", Scanner::dual_icon),
    ("title", Scanner::title),
    ("timeline", Scanner::timeline),
    ("ellipsis", Scanner::ellipsis),
    ("section_header", Scanner::section_header),
    ("dash_bullet", Scanner::dash_bullet),
    ("note", Scanner::note),
    ("highlight", Scanner::highlight),
    ("column_bullets", Scanner::column_bullets),
    ("branch", Scanner::branch),
    ("pin_note", Scanner::pin_note),
    ("emoji_section", Scanner::emoji_section),
    ("label_value", Scanner::label_value),
    ("section_bullet", Scanner::section_bullet),
    ("ordinal", Scanner::ordinal),
    ("sub_item", Scanner::sub_item),
    ("spaced_kv", Scanner::spaced_kv),
    ("compare_tail", Scanner::compare_tail),
];

pub(crate) struct Scanner {
    opts: ParseOptions,
    compare_style: bool,
    state: ParserState,
    doc: Document,
}

impl Scanner {
    pub(crate) fn new(text: &str, opts: &ParseOptions) -> Self {
        Self {
            opts: opts.clone(),
            compare_style: is_compare_style(text),
            state: ParserState::default(),
            doc: Document::default(),
        }
    }

    pub(crate) fn finish(mut self) -> Document {
        if let Some(open) = self.state.inner_box.take() {
            trace!(lines = open.lines.len(), "closing unterminated inner box");
            self.emit_inner_box(open);
        }
        let rest = self.state.flush_all();
        self.doc.nodes.extend(rest);
        self.doc
    }

    fn flush(&mut self, which: &[Accumulator]) {
        for &acc in which {
            let nodes = self.state.flush(acc);
            self.doc.nodes.extend(nodes);
        }
    }

    fn flush_all(&mut self) {
        self.flush(&Accumulator::ALL);
    }

    fn push(&mut self, node: Node) {
        self.doc.nodes.push(node);
    }

    pub(crate) fn scan_line(&mut self, raw: &str) {
        if starts_with_box_edge(raw.trim()) {
            return;
        }
        let content = strip_borders(raw);
        let trimmed = content.trim();
        if trimmed.is_empty() || is_hbar_run(trimmed) || is_rule_only(trimmed) {
            return;
        }
        let line = Line { content, trimmed };
        for (name, rule) in RULES {
            if rule(self, &line) {
                trace!(rule = name, line = trimmed, "matched");
                return;
            }
        }
        trace!(line = trimmed, "no rule matched");
    }

    fn compare_rule_row(&mut self, line: &Line) -> bool {
        self.compare_style
            && is_long_rule(line.trimmed)
            && !line.trimmed.contains(RIGHT_ARROW)
            && !line.trimmed.contains('┘')
    }

    fn compare_result(&mut self, line: &Line) -> bool {
        if !self.compare_style {
            return false;
        }
        let Some(cmp) = self.state.compare.as_mut() else {
            return false;
        };
        let Some((left, right)) = compare_arrow(line.trimmed) else {
            return false;
        };
        let signs = &self.opts.sign_keywords;
        let [l, r] = &mut cmp.columns;
        l.positive = Some(signs.left_positive(left));
        l.result = Some(left.to_string());
        r.positive = Some(signs.right_positive(right));
        r.result = Some(right.to_string());
        true
    }

    fn compare_flow(&mut self, line: &Line) -> bool {
        if !self.compare_style {
            return false;
        }
        let Some(cmp) = self.state.compare.as_mut() else {
            return false;
        };
        match flow_label(line.trimmed) {
            Some(label) => {
                cmp.flow = Some(label.to_string());
                true
            }
            None => false,
        }
    }

    fn compare_filler(&mut self, line: &Line) -> bool {
        self.compare_style && only_chars(line.trimmed, "│↑↓")
    }

    fn inner_box_open(&mut self, line: &Line) -> bool {
        if !line.trimmed.contains('┌') {
            return false;
        }
        self.flush_all();
        self.state.inner_box = Some(InnerBox {
            origins: GridLine::new(line.content).columns_of('┌'),
            lines: Vec::new(),
        });
        true
    }

    fn inner_box_capture(&mut self, line: &Line) -> bool {
        let Some(open) = self.state.inner_box.as_mut() else {
            return false;
        };
        if !line.trimmed.contains('└') {
            open.lines.push(line.content.to_string());
            return true;
        }
        if let Some(open) = self.state.inner_box.take() {
            self.emit_inner_box(open);
        }
        true
    }

    fn emit_inner_box(&mut self, open: InnerBox) {
        let mut boxes = if open.origins.len() <= 1 {
            annotated_box(&open.lines).into_iter().collect::<Vec<_>>()
        } else {
            sliced_boxes(&open)
        };
        match boxes.len() {
            0 => {}
            1 => {
                if let Some(card) = boxes.pop() {
                    self.push(Node::Box(card));
                }
            }
            _ => self.push(Node::Columns(Columns {
                children: boxes.into_iter().map(Panel::Box).collect(),
            })),
        }
    }

    fn compare_columns(&mut self, line: &Line) -> bool {
        if !self.compare_style {
            return false;
        }
        let Some((left, right)) = two_columns(line.content) else {
            return false;
        };
        match self.state.compare.as_mut() {
            Some(cmp) => {
                if let (Some((lk, lv)), Some((rk, rv))) = (word_pair(left), word_pair(right)) {
                    cmp.columns[0].items.push(KeyValue::new(lk, lv));
                    cmp.columns[1].items.push(KeyValue::new(rk, rv));
                }
            }
            None if word_pair(left).is_none() => {
                self.state.compare = Some(CompareDraft {
                    columns: [CompareColumn::new(left), CompareColumn::new(right)],
                    flow: None,
                });
                if self.doc.title.is_empty() {
                    self.doc.title = format!("{left} vs {right}");
                }
            }
            None => {}
        }
        true
    }

    fn dual_icon(&mut self, line: &Line) -> bool {
        let t = line.trimmed;
        if !(t.contains(HOUSE_ICON) && t.contains(FIELD_ICON)) {
            return false;
        }
        let parts: Vec<&str> = split_before_icons(t)
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.len() < 2 {
            return false;
        }
        if self.doc.title.is_empty() {
            self.doc.title = t.to_string();
        }
        self.flush(&[Accumulator::Pending, Accumulator::Columns]);
        self.state.columns = parts
            .into_iter()
            .map(|part| {
                let icon = [HOUSE_ICON, FIELD_ICON]
                    .into_iter()
                    .find(|icon| part.starts_with(icon))
                    .unwrap_or_default();
                ColumnCard {
                    icon: icon.to_string(),
                    title: part[icon.len()..].trim().to_string(),
                    items: Vec::new(),
                }
            })
            .collect();
        true
    }

    /// Lines that belong to a timeline never become the title.
    fn is_timeline_line(&self, trimmed: &str) -> bool {
        month_entry(trimmed).is_some() || (trimmed == ELLIPSIS && !self.state.timeline.is_empty())
    }

    fn title(&mut self, line: &Line) -> bool {
        if !self.doc.title.is_empty()
            || self.state.compare.is_some()
            || self.is_timeline_line(line.trimmed)
        {
            return false;
        }
        self.doc.title = strip_title_icon(line.trimmed).to_string();
        true
    }

    fn timeline(&mut self, line: &Line) -> bool {
        let Some((label, text)) = month_entry(line.trimmed) else {
            return false;
        };
        self.flush(&[
            Accumulator::Pending,
            Accumulator::Columns,
            Accumulator::Compare,
        ]);
        self.state.timeline.push(TimelineItem {
            label: label.to_string(),
            text: text.to_string(),
            ellipsis: false,
        });
        true
    }

    fn ellipsis(&mut self, line: &Line) -> bool {
        if line.trimmed != ELLIPSIS || self.state.timeline.is_empty() {
            return false;
        }
        self.state.timeline.push(TimelineItem {
            label: ELLIPSIS.to_string(),
            text: String::new(),
            ellipsis: true,
        });
        true
    }

    fn section_header(&mut self, line: &Line) -> bool {
        let Some(title) = line.trimmed.strip_suffix(':') else {
            return false;
        };
        if line.trimmed.starts_with(NOTE_MARK) {
            return false;
        }
        self.flush_all();
        self.state.section = Some(Section::new(SECTION_ICON, title.trim(), Color::Blue));
        true
    }

    fn dash_bullet(&mut self, line: &Line) -> bool {
        let Some(text) = line.trimmed.strip_prefix('-') else {
            return false;
        };
        if text.starts_with('>') {
            return false;
        }
        if let Some(section) = self.state.section.as_mut() {
            section.items.push(text.trim_start().to_string());
        }
        true
    }

    fn note(&mut self, line: &Line) -> bool {
        if !line.trimmed.starts_with(NOTE_MARK) {
            return false;
        }
        self.flush_all();
        self.push(Node::note(line.trimmed, Some("※")));
        true
    }

    fn highlight(&mut self, line: &Line) -> bool {
        if !line.trimmed.starts_with(RIGHT_ARROW) || line.trimmed.contains(':') {
            return false;
        }
        self.flush_all();
        self.push(Node::highlight(line.trimmed));
        true
    }

    /// Bullets on a two-card row go left or right of the line's midpoint.
    fn column_bullets(&mut self, line: &Line) -> bool {
        if !line.trimmed.contains(BULLET) || self.state.columns.len() < 2 {
            return false;
        }
        let content = line.content;
        let width = content.chars().count();
        for (at, _) in content.match_indices(BULLET) {
            let body = &content[at + BULLET.len_utf8()..];
            let text = body.split(BULLET).next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }
            let offset = content[..at].chars().count();
            let side = if offset * 2 < width { 0 } else { 1 };
            self.state.columns[side].items.push(text.to_string());
        }
        true
    }

    fn branch(&mut self, line: &Line) -> bool {
        let items = bracket_tokens(line.trimmed);
        if items.len() < 2 {
            return false;
        }
        self.flush_all();
        self.push(Node::Branch(Branch {
            items: items.into_iter().map(str::to_string).collect(),
        }));
        true
    }

    fn pin_note(&mut self, line: &Line) -> bool {
        if !line.trimmed.starts_with('📌') || !line.trimmed.contains(':') {
            return false;
        }
        self.flush_all();
        self.push(Node::note(line.trimmed, None));
        true
    }

    fn emoji_section(&mut self, line: &Line) -> bool {
        if line.trimmed.starts_with(BULLET) {
            return false;
        }
        let Some((icon, color, title)) = section_icon(line.trimmed) else {
            return false;
        };
        self.flush_all();
        self.state.section = Some(Section::new(icon, title, color));
        true
    }

    fn label_value(&mut self, line: &Line) -> bool {
        if line.trimmed.starts_with(BULLET)
            || !self.state.columns.is_empty()
            || self.state.compare.is_some()
        {
            return false;
        }
        let Some((key, value)) = label_value(line.trimmed) else {
            return false;
        };
        let long = value.chars().count() > self.opts.kv_value_limit;
        if long {
            if self.state.section.is_some() {
                return false;
            }
            self.flush(&[Accumulator::Pending, Accumulator::Timeline]);
            self.state.section = Some(Section::new(
                SECTION_ICON,
                format!("{key}: {value}"),
                Color::Blue,
            ));
        } else {
            self.flush(&[Accumulator::Section, Accumulator::Timeline]);
            self.state.kv.push(KeyValue::new(key, value));
        }
        true
    }

    fn section_bullet(&mut self, line: &Line) -> bool {
        let Some(text) = line.trimmed.strip_prefix(BULLET) else {
            return false;
        };
        if !self.state.columns.is_empty() {
            return false;
        }
        if let Some(section) = self.state.section.as_mut() {
            section.items.push(text.trim_start().to_string());
        }
        true
    }

    fn ordinal(&mut self, line: &Line) -> bool {
        let Some((n, text)) = ordinal_item(line.trimmed) else {
            return false;
        };
        self.flush(&[
            Accumulator::Section,
            Accumulator::Columns,
            Accumulator::Compare,
            Accumulator::Timeline,
        ]);
        self.state
            .list
            .get_or_insert_with(List::default)
            .items
            .push(ListItem {
                n,
                text: text.to_string(),
                subs: Vec::new(),
            });
        true
    }

    fn sub_item(&mut self, line: &Line) -> bool {
        let Some(text) = continuation(line.trimmed) else {
            return false;
        };
        let Some(last) = self.state.list.as_mut().and_then(|l| l.items.last_mut()) else {
            return false;
        };
        last.subs.push(text.to_string());
        true
    }

    fn spaced_kv(&mut self, line: &Line) -> bool {
        let st = &self.state;
        if st.section.is_some()
            || !st.columns.is_empty()
            || st.list.is_some()
            || st.compare.is_some()
            || !st.timeline.is_empty()
        {
            return false;
        }
        let Some((k, v)) = spaced_pair(line.trimmed) else {
            return false;
        };
        self.state.kv.push(KeyValue::new(k, v));
        true
    }

    fn compare_tail(&mut self, line: &Line) -> bool {
        let resolved = self
            .state
            .compare
            .as_ref()
            .is_some_and(|c| c.columns[0].result.is_some());
        if !resolved {
            return false;
        }
        self.flush(&[Accumulator::Compare]);
        self.push(Node::note(line.trimmed, None));
        true
    }
}

/// Split so that every house/field icon starts a new piece.
fn split_before_icons(s: &str) -> Vec<&str> {
    let mut cuts: Vec<usize> = [HOUSE_ICON, FIELD_ICON]
        .into_iter()
        .flat_map(|icon| s.match_indices(icon).map(|(i, _)| i))
        .filter(|&i| i > 0)
        .collect();
    cuts.sort_unstable();
    let mut parts = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        parts.push(&s[start..cut]);
        start = cut;
    }
    parts.push(&s[start..]);
    parts
}

fn strip_bullet(s: &str) -> Option<&str> {
    s.strip_prefix(BULLET)
        .or_else(|| s.strip_prefix('-'))
        .map(str::trim)
}

/// A lone inner box: title line, bullets, optional subtitle and price.
fn annotated_box(lines: &[String]) -> Option<Card> {
    let contents: Vec<String> = lines
        .iter()
        .map(|l| l.replace(VBAR, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    let (title, rest) = contents.split_first()?;

    let items: Vec<String> = rest
        .iter()
        .filter_map(|l| strip_bullet(l))
        .map(str::to_string)
        .collect();
    let subtitle = if items.is_empty() {
        rest.iter()
            .find(|l| strip_bullet(l).is_none() && l.chars().count() < SUBTITLE_MAX)
            .cloned()
    } else {
        None
    };
    let cost = contents
        .iter()
        .filter_map(|l| find_cost(l, true))
        .last()
        .map(str::to_string);

    let color = if title.contains(FREE_KEYWORD) {
        Color::Green
    } else if !items.is_empty() {
        Color::Orange
    } else if cost.is_some() {
        Color::Purple
    } else {
        Color::Blue
    };

    Some(Card {
        title: title.clone(),
        subtitle,
        items,
        cost,
        color,
        ..Card::default()
    })
}

/// Side-by-side inner boxes, sliced at the columns of their top corners.
fn sliced_boxes(open: &InnerBox) -> Vec<Card> {
    let mut contents: Vec<Vec<String>> = vec![Vec::new(); open.origins.len()];
    for line in &open.lines {
        let grid = GridLine::new(line);
        for (i, from) in open.origins.iter().enumerate() {
            let to = open.origins.get(i + 1).copied().unwrap_or(grid.width());
            let clean = grid.slice(*from, to).replace(VBAR, "");
            let clean = clean.trim();
            if !clean.is_empty() {
                contents[i].push(clean.to_string());
            }
        }
    }

    contents
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|c| {
            let mut title = c.join(" ").trim().to_string();
            let cost = find_cost(&title, false).map(str::to_string);
            if let Some(cost) = &cost {
                title = title.replacen(cost.as_str(), "", 1).trim().to_string();
            }
            let color = if title.contains(FREE_KEYWORD) {
                Color::Green
            } else if cost.is_some() {
                Color::Purple
            } else {
                Color::Gray
            };
            Card {
                title,
                cost,
                color,
                ..Card::default()
            }
        })
        .collect()
}

pub fn parse(text: &str, opts: &ParseOptions) -> Document {
    let mut scanner = Scanner::new(text, opts);
    for raw in text.lines() {
        scanner.scan_line(raw);
    }
    scanner.finish()
}
