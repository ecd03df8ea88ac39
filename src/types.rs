use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            nodes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Semantic color keys understood by the theme layer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Blue,
    Green,
    Red,
    Orange,
    Purple,
    Gray,
    Cyan,
    Teal,
    Emerald,
    Lime,
    Yellow,
    Amber,
    Pink,
    Rose,
    Indigo,
    Violet,
    Sky,
    Slate,
    Zinc,
    Stone,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(remote = "Self", tag = "type", rename_all = "lowercase")]
pub enum Node {
    Section(Section),
    List(List),
    #[serde(rename = "kv")]
    KeyValue(KeyValueGroup),
    Note(Note),
    Highlight(Highlight),
    Branch(Branch),
    Columns(Columns),
    Box(Card),
    Card(Card),
    Table(Table),
    Sequence(Sequence),
    Hierarchy(Hierarchy),
    Tree(Tree),
    Timeline(Timeline),
    Compare(Compare),
    /// Any other `type`. Only produced by deserialization.
    #[serde(skip)]
    Unknown(UnknownNode),
}

const NODE_KINDS: &[&str] = &[
    "section", "list", "kv", "note", "highlight", "branch", "columns", "box", "card", "table",
    "sequence", "hierarchy", "tree", "timeline", "compare",
];

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Unknown(raw) => raw.serialize(serializer),
            known => Node::serialize(known, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_open(
            deserializer,
            NODE_KINDS,
            |value| Node::deserialize(value),
            Node::Unknown,
        )
    }
}

impl Node {
    pub fn kind(&self) -> &str {
        match self {
            Node::Section(_) => "section",
            Node::List(_) => "list",
            Node::KeyValue(_) => "kv",
            Node::Note(_) => "note",
            Node::Highlight(_) => "highlight",
            Node::Branch(_) => "branch",
            Node::Columns(_) => "columns",
            Node::Box(_) => "box",
            Node::Card(_) => "card",
            Node::Table(_) => "table",
            Node::Sequence(_) => "sequence",
            Node::Hierarchy(_) => "hierarchy",
            Node::Tree(_) => "tree",
            Node::Timeline(_) => "timeline",
            Node::Compare(_) => "compare",
            Node::Unknown(raw) => raw.kind(),
        }
    }

    pub fn note(text: impl Into<String>, icon: Option<&str>) -> Self {
        Node::Note(Note {
            text: text.into(),
            icon: icon.map(str::to_string),
        })
    }

    pub fn highlight(text: impl Into<String>) -> Self {
        Node::Highlight(Highlight { text: text.into() })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Section {
    #[serde(default)]
    pub icon: String,
    pub title: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub items: Vec<String>,
}

impl Section {
    pub fn new(icon: &str, title: impl Into<String>, color: Color) -> Self {
        Self {
            icon: icon.to_string(),
            title: title.into(),
            color,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct List {
    #[serde(default)]
    pub items: Vec<ListItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ListItem {
    pub n: u32,
    pub text: String,
    #[serde(default)]
    pub subs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct KeyValueGroup {
    #[serde(default)]
    pub items: Vec<KeyValue>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KeyValue {
    pub k: String,
    pub v: String,
}

impl KeyValue {
    pub fn new(k: impl Into<String>, v: impl Into<String>) -> Self {
        Self {
            k: k.into(),
            v: v.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Note {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Highlight {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Branch {
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Columns {
    #[serde(default)]
    pub children: Vec<Panel>,
}

/// A child of a [`Columns`] node.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(remote = "Self", tag = "type", rename_all = "lowercase")]
pub enum Panel {
    Card(Card),
    Box(Card),
    #[serde(skip)]
    Unknown(UnknownNode),
}

impl Serialize for Panel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Panel::Unknown(raw) => raw.serialize(serializer),
            known => Panel::serialize(known, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Panel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_open(
            deserializer,
            &["card", "box"],
            |value| Panel::deserialize(value),
            Panel::Unknown,
        )
    }
}

/// A node whose `type` is not modelled here. The object is kept as received
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNode(Map<String, Value>);

impl UnknownNode {
    pub fn kind(&self) -> &str {
        self.0.get("type").and_then(Value::as_str).unwrap_or("unknown")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Serialize for UnknownNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Objects tagged with one of `known` go through `tagged`, so shape errors in
/// known kinds still surface. Any other string tag becomes an [`UnknownNode`].
fn deserialize_open<'de, D, T>(
    deserializer: D,
    known: &[&str],
    tagged: fn(Value) -> serde_json::Result<T>,
    unknown: fn(UnknownNode) -> T,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let open = value
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|kind| !known.contains(&kind));
    match value {
        Value::Object(fields) if open => Ok(unknown(UnknownNode(fields))),
        value => tagged(value).map_err(D::Error::custom),
    }
}

/// Shared shape of `box` and `card` nodes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub color: Color,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Table {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(rename = "hasHeaderSeparator", alias = "hasHeaderSep", default)]
    pub has_header_separator: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Sequence {
    pub participants: Vec<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub direction: Direction,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Hierarchy {
    pub root: HierarchyRoot,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub children: Vec<HierarchyChild>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct HierarchyRoot {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub info: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct HierarchyChild {
    pub title: String,
    #[serde(default)]
    pub info: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Module {
    pub title: String,
    #[serde(default)]
    pub info: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Tree {
    #[serde(default)]
    pub items: Vec<TreeItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TreeItem {
    pub text: String,
    pub depth: usize,
    #[serde(default)]
    pub highlight: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Timeline {
    #[serde(default)]
    pub items: Vec<TimelineItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimelineItem {
    pub label: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ellipsis: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Compare {
    #[serde(default)]
    pub columns: Vec<CompareColumn>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub flow: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompareColumn {
    pub title: String,
    #[serde(default)]
    pub items: Vec<KeyValue>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub positive: Option<bool>,
}

impl CompareColumn {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            result: None,
            positive: None,
        }
    }
}
