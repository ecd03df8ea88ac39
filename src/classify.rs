//! Line-level predicates shared by every dialect parser.
//!
//! Column positions are display columns, never bytes, so that box-drawing
//! glyphs and Hangul line up the way they do on screen.

use crate::types::Color;
use unicode_width::UnicodeWidthChar;
use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited, opt, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

pub const VBAR: char = '│';
pub const HBAR: char = '─';
pub const NOTE_MARK: char = '※';
pub const BULLET: char = '•';
pub const RIGHT_ARROW: char = '→';
pub const DOWN_ARROW: char = '▼';

const RULE_GLYPHS: &str = "│┼┬┴▼▲←→─";
const TABLE_BORDER_GLYPHS: &str = "│┼┬┴─┌┐└┘├┤";

/// Icons that may decorate a title line and are dropped from it.
const TITLE_ICONS: &[&str] = &["📌", "💡", "🔥", "✨", "⚡", "🏗️", "🏗"];

/// Emoji that open a section, with the color each one implies.
const SECTION_ICONS: &[(&str, &str, Color)] = &[
    ("✅", "✅", Color::Green),
    ("❌", "❌", Color::Red),
    ("⚠️", "⚠️", Color::Orange),
    ("⚠", "⚠️", Color::Orange),
    ("💡", "💡", Color::Blue),
    ("🔥", "🔥", Color::Red),
    ("⭐", "⭐", Color::Orange),
];

pub const HOUSE_ICON: &str = "🏡";
pub const FIELD_ICON: &str = "🌾";

pub fn has_tree_marker(text: &str) -> bool {
    text.contains("├─") || text.contains("└─")
}

/// Rows that open, close, or split a box.
pub fn starts_with_box_edge(trimmed: &str) -> bool {
    trimmed.starts_with('┌') || trimmed.starts_with('└') || trimmed.starts_with('├')
}

/// Drop one leading and one trailing vertical border.
pub fn strip_borders(line: &str) -> &str {
    let line = line.strip_prefix(VBAR).unwrap_or(line);
    line.strip_suffix(VBAR).unwrap_or(line)
}

pub fn is_hbar_run(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c == HBAR)
}

/// Content made only of connector, rule and arrow glyphs.
pub fn is_rule_only(s: &str) -> bool {
    only_chars(s, RULE_GLYPHS)
}

pub fn is_table_border(s: &str) -> bool {
    only_chars(s, TABLE_BORDER_GLYPHS)
}

/// True when `s` is non-empty and every char is whitespace or in `set`.
pub fn only_chars(s: &str, set: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_whitespace() || set.contains(c))
}

pub fn count_char(s: &str, needle: char) -> usize {
    s.chars().filter(|&c| c == needle).count()
}

/// A line laid out on the terminal grid: every char paired with the display
/// column it starts at. Wide chars (Hangul, emoji) take two columns.
#[derive(Debug, Clone)]
pub struct GridLine {
    cells: Vec<Cell>,
    width: usize,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    col: usize,
    ch: char,
}

impl GridLine {
    pub fn new(line: &str) -> Self {
        let mut cells = Vec::with_capacity(line.len());
        let mut col = 0;
        for ch in line.chars() {
            cells.push(Cell { col, ch });
            // Control chars such as `\t` have no display width; count them as one.
            col += ch.width().unwrap_or(1);
        }
        Self { cells, width: col }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Display columns at which `needle` occurs.
    pub fn columns_of(&self, needle: char) -> Vec<usize> {
        self.cells
            .iter()
            .filter(|c| c.ch == needle)
            .map(|c| c.col)
            .collect()
    }

    /// Chars starting in display columns `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.cells
            .iter()
            .filter(|c| c.col >= start && c.col < end)
            .map(|c| c.ch)
            .collect()
    }
}

pub fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Split on runs of at least `min` whitespace chars, dropping empty pieces.
pub fn split_wide(s: &str, min: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut run_start = None;
    let mut run_len = 0;
    for (idx, ch) in s.char_indices() {
        if ch.is_whitespace() {
            if run_start.is_none() {
                run_start = Some(idx);
            }
            run_len += 1;
            continue;
        }
        if let Some(rs) = run_start.take() {
            if run_len >= min {
                parts.push(&s[start..rs]);
                start = idx;
            }
        }
        run_len = 0;
    }
    parts.push(&s[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Byte ranges `(start, end)` of whitespace runs at least `min` chars long.
fn wide_gaps(s: &str, min: usize) -> Vec<(usize, usize)> {
    let mut gaps = Vec::new();
    let mut run: Option<(usize, usize)> = None;
    for (idx, ch) in s.char_indices() {
        if ch.is_whitespace() {
            run = match run {
                Some((start, n)) => Some((start, n + 1)),
                None => Some((idx, 1)),
            };
        } else if let Some((start, n)) = run.take() {
            if n >= min {
                gaps.push((start, idx));
            }
        }
    }
    if let Some((start, n)) = run {
        if n >= min {
            gaps.push((start, s.len()));
        }
    }
    gaps
}

/// `key  value` split at the first gap of two or more spaces.
pub fn spaced_pair(trimmed: &str) -> Option<(&str, &str)> {
    let (start, end) = wide_gaps(trimmed, 2).into_iter().find(|&(s, _)| s > 0)?;
    let value = &trimmed[end..];
    if value.is_empty() {
        return None;
    }
    Some((&trimmed[..start], value))
}

/// Two phrases separated by a gap of six or more spaces, each at least two
/// chars long.
pub fn two_columns(content: &str) -> Option<(&str, &str)> {
    let t = content.trim();
    wide_gaps(t, 6).into_iter().find_map(|(start, end)| {
        let left = &t[..start];
        let right = &t[end..];
        (left.chars().count() >= 2 && right.chars().count() >= 2).then_some((left, right))
    })
}

/// Exactly two whitespace-separated words.
pub fn word_pair(s: &str) -> Option<(&str, &str)> {
    let mut words = s.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(k), Some(v), None) => Some((k, v)),
        _ => None,
    }
}

/// Contents of every non-empty `[...]` token, left to right.
pub fn bracket_tokens(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = s;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(0) => rest = &after[1..],
            Some(close) => {
                out.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    out
}

/// First `[ ... ]` annotation, trimmed.
pub fn first_bracket(s: &str) -> Option<&str> {
    bracket_tokens(s)
        .into_iter()
        .map(str::trim)
        .find(|t| !t.is_empty())
}

/// Text after the first `├─`/`└─` marker.
pub fn tree_marker(line: &str) -> Option<&str> {
    let pos = [line.find("├─"), line.find("└─")]
        .into_iter()
        .flatten()
        .min()?;
    let marker_len = "├─".len();
    Some(&line[pos + marker_len..])
}

pub fn strip_title_icon(s: &str) -> &str {
    for icon in TITLE_ICONS {
        if let Some(rest) = s.strip_prefix(icon) {
            return rest.trim_start();
        }
    }
    s
}

/// A section-opening emoji: `(icon, color, title)`.
pub fn section_icon(trimmed: &str) -> Option<(&'static str, Color, &str)> {
    SECTION_ICONS.iter().find_map(|&(prefix, icon, color)| {
        let rest = trimmed.strip_prefix(prefix)?.trim();
        (!rest.is_empty()).then_some((icon, color, rest))
    })
}

/// Input drawn as a two-sided comparison: a long `──→` arrow and a
/// `└── label ──┘` connector.
pub fn is_compare_style(text: &str) -> bool {
    text.contains("──→") && has_bottom_connector(text)
}

fn has_bottom_connector(text: &str) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find("└──") {
        let after = &rest[pos + "└──".len()..];
        let region = after.split('┌').next().unwrap_or("");
        // At least one char must sit between the opening and the closing run.
        if let Some(first) = region.chars().next() {
            if region[first.len_utf8()..].contains("──┘") {
                return true;
            }
        }
        rest = after;
    }
    false
}

/// Rows made of two long `─────` runs, used to underline compare columns.
pub fn is_long_rule(s: &str) -> bool {
    let run = "─────";
    match s.find(run) {
        Some(pos) => s[pos + run.len()..].contains(run),
        None => false,
    }
}

/// `<left> ──→ <right>`.
pub fn compare_arrow(s: &str) -> Option<(&str, &str)> {
    let arrow = s.find("─→")?;
    let run_start = s[..arrow]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| c == HBAR)
        .last()
        .map_or(arrow, |(i, _)| i);
    // Need at least two dashes before the arrow head.
    if arrow == run_start {
        return None;
    }
    let left = s[..run_start].trim();
    let right = s[arrow + "─→".len()..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left, right))
}

/// `└── label ──┘`.
pub fn flow_label(s: &str) -> Option<&str> {
    let start = s.find("└──")? + "└──".len();
    let body = &s[start..];
    let close = body.find("─┘")?;
    let run_start = body[..close]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| c == HBAR)
        .last()
        .map_or(close, |(i, _)| i);
    if run_start == close {
        return None;
    }
    let label = body[..run_start].trim();
    (!label.is_empty()).then_some(label)
}

fn month_label<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    terminated((digit1, "월").take(), ':').parse_next(input)
}

/// `7월: text` timeline entry.
pub fn month_entry(trimmed: &str) -> Option<(&str, &str)> {
    let mut input = trimmed;
    let label = month_label.parse_next(&mut input).ok()?;
    let text = input.trim();
    (!text.is_empty()).then_some((label, text))
}

fn ordinal(input: &mut &str) -> ModalResult<u32> {
    alt((
        delimited('[', digit1, ']'),
        terminated(digit1, '.'),
        terminated(
            one_of(|c: char| c.is_ascii_digit()).take(),
            (opt('\u{FE0F}'), '\u{20E3}'),
        ),
    ))
    .try_map(str::parse::<u32>)
    .parse_next(input)
}

/// `[3] text`, `3. text` or keycap `3️⃣ text`.
pub fn ordinal_item(trimmed: &str) -> Option<(u32, &str)> {
    let mut input = trimmed;
    let n = ordinal.parse_next(&mut input).ok()?;
    let text = input.trim();
    (!text.is_empty()).then_some((n, text))
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_whitespace() || ('가'..='힣').contains(&c)
}

fn label<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    terminated(take_while(1.., is_label_char), ':').parse_next(input)
}

/// `label: value` where the label is letters and spaces only.
pub fn label_value(trimmed: &str) -> Option<(&str, &str)> {
    let mut input = trimmed;
    let key = label.parse_next(&mut input).ok()?;
    let value = input.trim_start();
    let key = key.trim();
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

/// Leading `->` or `→` continuation marker.
pub fn continuation(trimmed: &str) -> Option<&str> {
    let rest = trimmed
        .strip_prefix("->")
        .or_else(|| trimmed.strip_prefix(RIGHT_ARROW))?
        .trim();
    (!rest.is_empty()).then_some(rest)
}

fn currency_amount<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(['$', '₩']),
        take_while(1.., |c: char| c.is_ascii_digit() || c == ','),
        opt("/월"),
    )
        .take()
        .parse_next(input)
}

fn labelled_cost<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        "비용:",
        take_while(0.., char::is_whitespace),
        opt(one_of(['$', '₩'])),
        take_while(1.., |c: char| c.is_ascii_digit() || c == ','),
    )
        .take()
        .parse_next(input)
}

fn manwon<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (digit1, "만원").take().parse_next(input)
}

/// Leftmost price-like substring: `$300`, `₩1,000/월`, `50만원`, and with
/// `labelled` also `비용: 300` (returned without the label).
pub fn find_cost(s: &str, labelled: bool) -> Option<&str> {
    for (idx, _) in s.char_indices() {
        let mut input = &s[idx..];
        let hit = if labelled {
            alt((currency_amount, labelled_cost, manwon)).parse_next(&mut input)
        } else {
            alt((currency_amount, manwon)).parse_next(&mut input)
        };
        if let Ok(found) = hit {
            let found = found
                .strip_prefix("비용:")
                .map_or(found, |rest| rest.trim_start());
            return Some(found);
        }
    }
    None
}
