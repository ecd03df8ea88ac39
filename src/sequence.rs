use crate::classify::{first_bracket, split_wide, HBAR, VBAR};
use crate::types::{Direction, Document, Message, Node, Sequence};

/// `│──── NAME ────>│ (note)`
fn right_arrow(line: &str) -> Option<(String, String)> {
    let mut from = 0;
    while let Some(pos) = line[from..].find(VBAR) {
        let open = from + pos + VBAR.len_utf8();
        let body = &line[open..];
        if body.starts_with(HBAR) {
            if let Some(close) = body.find(">│") {
                let caption = body[..close].trim_matches(|c: char| c == HBAR || c.is_whitespace());
                if !caption.is_empty() {
                    let rest = &body[close + ">│".len()..];
                    return Some((caption.to_string(), clean_note(rest)));
                }
            }
        }
        from = open;
    }
    None
}

/// `│<─── NAME ─────│ (note)`
fn left_arrow(line: &str) -> Option<(String, String)> {
    let mut from = 0;
    while let Some(pos) = line[from..].find("│<") {
        let open = from + pos + "│<".len();
        let body = &line[open..];
        if body.starts_with(HBAR) {
            let shaft = body.trim_start_matches(HBAR);
            let offset = body.len() - shaft.len();
            // The caption needs at least one char before the closing border.
            let mut search = shaft.char_indices().skip(1);
            if let Some((close, _)) = search.find(|&(_, c)| c == VBAR) {
                let caption = shaft[..close].trim_matches(|c: char| c == HBAR || c.is_whitespace());
                if !caption.is_empty() {
                    let rest = &body[offset + close + VBAR.len_utf8()..];
                    return Some((caption.to_string(), clean_note(rest)));
                }
            }
        }
        from = open;
    }
    None
}

/// True for a line carrying a message arrow in either direction.
pub fn is_message_line(line: &str) -> bool {
    right_arrow(line).is_some() || left_arrow(line).is_some()
}

fn clean_note(rest: &str) -> String {
    rest.chars()
        .filter(|&c| c != '(' && c != ')')
        .collect::<String>()
        .trim()
        .to_string()
}

fn message(direction: Direction, (name, note): (String, String)) -> Message {
    Message {
        direction,
        name,
        note: (!note.is_empty()).then_some(note),
        detail: None,
    }
}

pub fn parse(text: &str) -> Option<Document> {
    let mut lines = text.lines();
    let header = lines.next()?;
    let participants: Vec<String> = split_wide(header, 2)
        .into_iter()
        .map(str::to_string)
        .collect();
    if participants.len() < 2 {
        return None;
    }

    let mut messages: Vec<Message> = Vec::new();
    for line in lines {
        if let Some(found) = right_arrow(line) {
            messages.push(message(Direction::Right, found));
            continue;
        }
        if let Some(found) = left_arrow(line) {
            messages.push(message(Direction::Left, found));
            continue;
        }
        if let (Some(detail), Some(last)) = (first_bracket(line), messages.last_mut()) {
            last.detail = Some(detail.to_string());
        }
    }

    let mut doc = Document::new(participants[0].clone());
    doc.nodes.push(Node::Sequence(Sequence {
        participants,
        messages,
    }));
    Some(doc)
}
