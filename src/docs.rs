//! Field documentation extracted from schema docstrings.
//!
//! A docstring documents a schema with an indented definition list:
//!
//! ```text
//! A service object.
//!
//!     [$name]: str
//!         Name of the service.
//!     logging: dict
//!         Logging settings
//!
//!         stdout: bool
//!             Whether stdout is logged.
//!     environment: dict
//!         {key}: str
//!             Value of the environment variable.
//! ```
//!
//! Each term's first word (with `[`, `]` and `:` trimmed) becomes a key. A
//! definition holding a paragraph becomes [`DocEntry::Text`]; one holding a
//! nested definition list becomes [`DocEntry::Nested`], keeping its paragraph
//! (if any) as the entry's own description.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DocError;

/// Key holding a nested entry's own description in the JSON form of a tree.
pub const SELF_DESCRIPTION_KEY: &str = "<<text>>";

/// Term documenting the values of a string-keyed mapping.
pub const MAP_KEY_TERM: &str = "{key}";

const TAB_WIDTH: usize = 8;

/// Documentation for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocEntry {
    Text(String),
    Nested {
        /// Description of the field itself.
        text: Option<String>,
        fields: DocTree,
    },
}

impl DocEntry {
    /// Description of the documented field itself.
    pub fn description(&self) -> Option<&str> {
        match self {
            DocEntry::Text(text) => Some(text),
            DocEntry::Nested { text, .. } => text.as_deref(),
        }
    }
}

/// Field name to documentation, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTree(IndexMap<String, DocEntry>);

impl DocTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&DocEntry> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, entry: DocEntry) {
        self.0.insert(field.into(), entry);
    }

    /// Builder form of [`DocTree::insert`] for plain descriptions.
    pub fn text(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(field, DocEntry::Text(text.into()));
        self
    }

    /// Builder form of [`DocTree::insert`] for nested documentation.
    pub fn nested(mut self, field: impl Into<String>, text: Option<&str>, fields: DocTree) -> Self {
        self.insert(
            field,
            DocEntry::Nested {
                text: text.map(str::to_owned),
                fields,
            },
        );
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DocEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for DocTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::deserialize(deserializer).map(DocTree)
    }
}

impl Serialize for DocEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocEntry::Text(text) => serializer.serialize_str(text),
            DocEntry::Nested { text, fields } => {
                let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
                for (key, entry) in fields.iter() {
                    map.serialize_entry(key, entry)?;
                }
                if let Some(text) = text {
                    map.serialize_entry(SELF_DESCRIPTION_KEY, text)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for DocEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Nested(IndexMap<String, DocEntry>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Ok(DocEntry::Text(text)),
            Raw::Nested(mut fields) => {
                let text = match fields.shift_remove(SELF_DESCRIPTION_KEY) {
                    None => None,
                    Some(DocEntry::Text(text)) => Some(text),
                    Some(DocEntry::Nested { .. }) => {
                        return Err(D::Error::custom(format!(
                            "{SELF_DESCRIPTION_KEY} must be a string"
                        )))
                    }
                };
                Ok(DocEntry::Nested {
                    text,
                    fields: DocTree(fields),
                })
            }
        }
    }
}

/// Extract field documentation from a docstring.
///
/// Uses the first definition list in the text, searching indented blocks
/// in document order.
///
/// # Errors
///
/// Returns `DocError::MissingDefinitionList` if the text has no definition
/// list, or `DocError::EmptyTerm` if a term has neither a paragraph nor a
/// nested definition list.
pub fn extract_docs(docstring: &str) -> Result<DocTree, DocError> {
    let expanded: Vec<String> = docstring
        .lines()
        .map(|line| line.replace('\t', &" ".repeat(TAB_WIDTH)))
        .collect();
    let lines: Vec<Option<Line<'_>>> = expanded.iter().map(|l| Line::parse(l)).collect();

    let blocks = parse_blocks(&lines);
    let items = first_definition_list(&blocks).ok_or(DocError::MissingDefinitionList)?;
    extract_items(items)
}

// --- Internal implementation ---

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    indent: usize,
    text: &'a str,
}

impl<'a> Line<'a> {
    /// `None` for blank lines.
    fn parse(raw: &'a str) -> Option<Self> {
        let text = raw.trim_start();
        if text.trim_end().is_empty() {
            return None;
        }
        Some(Line {
            indent: raw.len() - text.len(),
            text: text.trim_end(),
        })
    }
}

#[derive(Debug)]
enum Block<'a> {
    Paragraph(Vec<&'a str>),
    Bullets,
    DefinitionList(Vec<Item<'a>>),
    Quote(Vec<Block<'a>>),
}

#[derive(Debug)]
struct Item<'a> {
    term: &'a str,
    body: Vec<Block<'a>>,
}

fn parse_blocks<'a>(lines: &[Option<Line<'a>>]) -> Vec<Block<'a>> {
    let Some(base) = lines.iter().flatten().map(|l| l.indent).min() else {
        return Vec::new();
    };

    let deeper = |i: usize| matches!(lines.get(i), Some(Some(l)) if l.indent > base);
    // End of the indented region starting at `from`; blank lines belong to it.
    let region_end = |from: usize| {
        let mut end = from;
        while end < lines.len() && lines[end].map_or(true, |l| l.indent > base) {
            end += 1;
        }
        end
    };

    let mut blocks: Vec<Block<'a>> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(line) = lines[i] else {
            i += 1;
            continue;
        };

        if line.indent > base {
            let end = region_end(i);
            blocks.push(Block::Quote(parse_blocks(&lines[i..end])));
            i = end;
        } else if is_bullet(line.text) {
            i += 1;
            while let Some(Some(l)) = lines.get(i) {
                if l.indent == base && !is_bullet(l.text) {
                    break;
                }
                i += 1;
            }
            blocks.push(Block::Bullets);
        } else if deeper(i + 1) {
            let end = region_end(i + 1);
            let item = Item {
                term: line.text,
                body: parse_blocks(&lines[i + 1..end]),
            };
            match blocks.last_mut() {
                Some(Block::DefinitionList(items)) => items.push(item),
                _ => blocks.push(Block::DefinitionList(vec![item])),
            }
            i = end;
        } else {
            let mut text = Vec::new();
            while let Some(Some(l)) = lines.get(i) {
                if l.indent != base || (!text.is_empty() && deeper(i + 1)) {
                    break;
                }
                text.push(l.text);
                i += 1;
            }
            blocks.push(Block::Paragraph(text));
        }
    }
    blocks
}

fn first_definition_list<'b, 'a>(blocks: &'b [Block<'a>]) -> Option<&'b [Item<'a>]> {
    blocks.iter().find_map(|block| match block {
        Block::DefinitionList(items) => Some(items.as_slice()),
        Block::Quote(inner) => first_definition_list(inner),
        Block::Paragraph(_) | Block::Bullets => None,
    })
}

fn is_bullet(text: &str) -> bool {
    ["- ", "* ", "+ "].iter().any(|marker| text.starts_with(marker)) || matches!(text, "-" | "*" | "+")
}

fn term_name(term: &str) -> &str {
    term.split(' ')
        .next()
        .unwrap_or_default()
        .trim_end_matches([':', ']'])
        .trim_start_matches('[')
}

fn extract_items(items: &[Item<'_>]) -> Result<DocTree, DocError> {
    let mut tree = DocTree::new();
    for item in items {
        let name = term_name(item.term);
        let paragraph = item.body.iter().find_map(|b| match b {
            Block::Paragraph(lines) => Some(lines.join("\n")),
            _ => None,
        });
        let nested = item.body.iter().find_map(|b| match b {
            Block::DefinitionList(items) => Some(items),
            _ => None,
        });

        let entry = match (paragraph, nested) {
            (text, Some(nested)) => DocEntry::Nested {
                text,
                fields: extract_items(nested)?,
            },
            (Some(text), None) => DocEntry::Text(text),
            (None, None) => {
                return Err(DocError::EmptyTerm {
                    term: name.to_string(),
                })
            }
        };
        tree.insert(name, entry);
    }
    Ok(tree)
}
