//! The document tree
//!
//! A parsed document is a [`Table`]: an insertion-ordered map from key
//! segment to [`Node`]. Lookup is O(1) through a hash index; iteration
//! follows insertion order, which is what makes emission deterministic.
//!
//! [`Node`] is the sum over the five structural roles a name can play.
//! The role decides which redefinitions the document builder accepts, so
//! the distinction between, say, a table opened by a header
//! (`TableLeaf`) and one created in passing (`TableBranch`) is carried
//! in the variant rather than in a separate kind field.

use ahash::RandomState;
use hashbrown::HashMap;

use crate::value::Value;

/// The structural role of a name in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An intermediate segment of a dotted key: `a` in `a.b = 1`.
    KeyBranch(Table),
    /// The terminal segment of `key = value`. An inline table arrives
    /// here as [`Value::Table`].
    KeyLeaf(Value),
    /// A table created implicitly as an ancestor of a header path: `a`
    /// after `[a.b]`.
    TableBranch(Table),
    /// A table opened explicitly by a `[header]`.
    TableLeaf(Table),
    /// An `[[header]]` array of tables with its elements.
    ArrayTable(Vec<Table>),
}

impl Node {
    /// Human-readable role name used in duplicate-key diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::KeyBranch(_) => "dotted key",
            Node::KeyLeaf(_) => "key",
            Node::TableBranch(_) => "implicit table",
            Node::TableLeaf(_) => "table",
            Node::ArrayTable(_) => "array of tables",
        }
    }

    /// The table this node carries: branch and header tables directly,
    /// an inline table through its value. `None` for plain values and
    /// arrays of tables.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Node::KeyBranch(table) | Node::TableBranch(table) | Node::TableLeaf(table) => {
                Some(table)
            }
            Node::KeyLeaf(Value::Table(table)) => Some(table),
            _ => None,
        }
    }

    /// The value of a `key = value` leaf, `None` otherwise.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::KeyLeaf(value) => Some(value),
            _ => None,
        }
    }

    /// The elements of an array of tables, `None` otherwise.
    pub fn as_array_of_tables(&self) -> Option<&[Table]> {
        match self {
            Node::ArrayTable(elements) => Some(elements.as_slice()),
            _ => None,
        }
    }

    /// True for `key = value` leaves.
    pub fn is_value(&self) -> bool {
        matches!(self, Node::KeyLeaf(_))
    }

    /// True for arrays of tables.
    pub fn is_array_of_tables(&self) -> bool {
        matches!(self, Node::ArrayTable(_))
    }
}

/// An insertion-ordered table of named nodes.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Entries in insertion order.
    entries: Vec<(String, Node)>,
    /// Segment -> entry index.
    index: HashMap<String, usize, RandomState>,
}

impl Table {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct children.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no children.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when a direct child with this segment exists.
    pub fn contains_key(&self, segment: &str) -> bool {
        self.index.contains_key(segment)
    }

    /// The direct child with this segment.
    pub fn get(&self, segment: &str) -> Option<&Node> {
        self.index.get(segment).map(|&i| &self.entries[i].1)
    }

    /// Mutable access to the direct child with this segment.
    pub(crate) fn get_mut(&mut self, segment: &str) -> Option<&mut Node> {
        match self.index.get(segment) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Insert a new child. The segment must not already be present;
    /// redefinition decisions belong to the document builder.
    pub(crate) fn insert(&mut self, segment: String, node: Node) -> &mut Node {
        debug_assert!(
            !self.index.contains_key(&segment),
            "insert over an existing segment"
        );
        let at = self.entries.len();
        self.index.insert(segment.clone(), at);
        self.entries.push((segment, node));
        &mut self.entries[at].1
    }

    /// Iterate children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate child segments in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Walk a path of segments, descending through every table-carrying
    /// node (dotted keys, headers, inline tables). `None` as soon as a
    /// segment is missing or a non-table stands in the way.
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let node = self.get(first)?;
        if rest.is_empty() {
            return Some(node);
        }
        node.as_table()?.get_path(rest)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
