//! Document assembly and redefinition rules
//!
//! The builder owns the tree while a parse is running. The parser hands
//! it resolved key paths and values; the builder decides whether each
//! attach is legal under the TOML 1.0.0 redefinition rules and where in
//! the tree it lands.
//!
//! The compatibility rules, existing node role x incoming role:
//!
//! | existing \ incoming | KeyBranch | KeyLeaf | TableBranch | TableLeaf | ArrayTable |
//! |---|---|---|---|---|---|
//! | KeyBranch   | descend | reject | descend | reject  | reject |
//! | KeyLeaf     | reject  | reject | reject  | reject  | reject |
//! | TableBranch | reject  | reject | descend | promote | reject |
//! | TableLeaf   | reject  | reject | descend | reject  | reject |
//! | ArrayTable  | reject  | reject | descend | reject  | element |
//! | (absent)    | create  | create | create  | create  | create |
//!
//! "Promote" rewraps an implicitly created table as the header table it
//! turned out to be; a second header for the same path then rejects.
//! "Element" appends a fresh table to the array; descending through an
//! array of tables always lands in its last element. Rejecting dotted
//! keys under header tables (`TableBranch`/`TableLeaf` x `KeyBranch`)
//! is what stops `[a]` from being extended with `a.b = 1` later. The
//! same protection covers the relative spelling: a dotted key written
//! inside a header table that retraces the header's own path, such as
//! `a.b.c = 1` under `[a.b]`, rejects instead of nesting a second
//! `a.b` inside the first.
//!
//! The active table is tracked as a path of segments and re-resolved
//! per insertion, so array-of-tables indices stay implicit in the tree.

use log::{debug, trace};

use crate::error::{ErrorKind, ParseError};
use crate::options::ParserOptions;
use crate::table::{Node, Table};
use crate::value::Value;

/// One segment of a parsed key path, with the position its text started
/// at for diagnostics.
#[derive(Debug, Clone)]
pub(crate) struct KeySegment {
    pub(crate) name: String,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl KeySegment {
    #[cfg(test)]
    pub(crate) fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            line: 1,
            column: 1,
        }
    }
}

/// The flavor of branch an intermediate path segment creates: the
/// `a` of a dotted key `a.b = 1`, or the `a` of a header `[a.b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    Key,
    Table,
}

/// Tree owner for the duration of a parse.
pub(crate) struct DocumentBuilder {
    root: Table,
    /// Segments of the active table; empty means the root.
    active: Vec<String>,
    max_table_entries: usize,
}

impl DocumentBuilder {
    pub(crate) fn new(options: &ParserOptions) -> Self {
        Self {
            root: Table::new(),
            active: Vec::new(),
            max_table_entries: options.max_table_entries,
        }
    }

    /// Consume the builder and hand the finished tree to the caller.
    pub(crate) fn into_root(self) -> Table {
        self.root
    }

    /// `[a.b]`: declare a table and make it the active one.
    pub(crate) fn open_table(&mut self, path: &[KeySegment]) -> Result<(), ParseError> {
        debug!("opening table [{}]", join_path(path));
        let (last, branches) = split_path(path)?;
        let mut current = &mut self.root;
        for seg in branches {
            current = descend(current, seg, BranchKind::Table, self.max_table_entries)?;
        }
        attach_table_leaf(current, last, self.max_table_entries)?;
        self.active = path.iter().map(|s| s.name.clone()).collect();
        Ok(())
    }

    /// `[[a.b]]`: append an element to an array of tables and make that
    /// element the active table.
    pub(crate) fn open_array_table(&mut self, path: &[KeySegment]) -> Result<(), ParseError> {
        debug!("opening array of tables [[{}]]", join_path(path));
        let (last, branches) = split_path(path)?;
        let mut current = &mut self.root;
        for seg in branches {
            current = descend(current, seg, BranchKind::Table, self.max_table_entries)?;
        }
        attach_array_element(current, last, self.max_table_entries)?;
        self.active = path.iter().map(|s| s.name.clone()).collect();
        Ok(())
    }

    /// `a.b = value`: insert a value under the active table.
    pub(crate) fn insert(&mut self, path: &[KeySegment], value: Value) -> Result<(), ParseError> {
        trace!("inserting key {}", join_path(path));
        self.reject_active_retrace(path)?;
        let max = self.max_table_entries;
        let table = self.resolve_active(path)?;
        insert_dotted(table, path, value, max)
    }

    /// A read-only view of the tree built so far.
    #[cfg(test)]
    pub(crate) fn root(&self) -> &Table {
        &self.root
    }

    /// A dotted key that spells out the active header's own full path
    /// and keeps going (`a.b.c = 1` inside `[a.b]`) is an attempt to
    /// extend the header table through a dotted key; the header already
    /// defined it. Checked against the full resolved path, not just the
    /// children of the active table.
    fn reject_active_retrace(&self, path: &[KeySegment]) -> Result<(), ParseError> {
        if self.active.is_empty() || path.len() <= self.active.len() {
            return Ok(());
        }
        let retraces = self
            .active
            .iter()
            .zip(path.iter())
            .all(|(open, seg)| open == &seg.name);
        if retraces {
            let seg = &path[0];
            return Err(ParseError::at(
                ErrorKind::DuplicateKey,
                format!(
                    "`{}` is already defined as a table",
                    self.active.join(".")
                ),
                seg.line,
                seg.column,
            ));
        }
        Ok(())
    }

    /// Walk the active path down from the root, landing in the last
    /// element of any array of tables on the way. The path was stored by
    /// a successful `open_*`, so every step resolves.
    fn resolve_active(&mut self, at: &[KeySegment]) -> Result<&mut Table, ParseError> {
        let max = self.max_table_entries;
        let mut current = &mut self.root;
        for name in &self.active {
            let seg = KeySegment {
                name: name.clone(),
                line: at.first().map_or(0, |s| s.line),
                column: at.first().map_or(0, |s| s.column),
            };
            current = descend(current, &seg, BranchKind::Table, max)?;
        }
        Ok(current)
    }
}

/// Insert `path = value` into `table`, creating dotted-key branches on
/// the way. Shared between the builder and inline-table assembly.
pub(crate) fn insert_dotted(
    table: &mut Table,
    path: &[KeySegment],
    value: Value,
    max_table_entries: usize,
) -> Result<(), ParseError> {
    let (last, branches) = split_path(path)?;
    let mut current = table;
    for seg in branches {
        current = descend(current, seg, BranchKind::Key, max_table_entries)?;
    }
    if current.contains_key(&last.name) {
        return Err(duplicate(current, last));
    }
    check_capacity(current, last, max_table_entries)?;
    current.insert(last.name.clone(), Node::KeyLeaf(value));
    Ok(())
}

fn split_path(path: &[KeySegment]) -> Result<(&KeySegment, &[KeySegment]), ParseError> {
    match path.split_last() {
        Some((last, branches)) => Ok((last, branches)),
        None => Err(ParseError::new(ErrorKind::Decode, "empty key path")),
    }
}

fn join_path(path: &[KeySegment]) -> String {
    path.iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

fn duplicate(table: &Table, seg: &KeySegment) -> ParseError {
    let existing = table
        .get(&seg.name)
        .map_or("key", |node| node.kind_name());
    ParseError::at(
        ErrorKind::DuplicateKey,
        format!("`{}` is already defined as a {}", seg.name, existing),
        seg.line,
        seg.column,
    )
}

fn check_capacity(table: &Table, seg: &KeySegment, max: usize) -> Result<(), ParseError> {
    if table.len() >= max {
        return Err(ParseError::at(
            ErrorKind::BufferOverflow,
            format!("table exceeds {} entries", max),
            seg.line,
            seg.column,
        ));
    }
    Ok(())
}

/// Attach a branch-position segment and return the table to keep
/// walking in.
fn descend<'t>(
    table: &'t mut Table,
    seg: &KeySegment,
    incoming: BranchKind,
    max: usize,
) -> Result<&'t mut Table, ParseError> {
    if !table.contains_key(&seg.name) {
        check_capacity(table, seg, max)?;
        let node = match incoming {
            BranchKind::Key => Node::KeyBranch(Table::new()),
            BranchKind::Table => Node::TableBranch(Table::new()),
        };
        table.insert(seg.name.clone(), node);
    } else {
        let compatible = match (table.get(&seg.name), incoming) {
            (Some(Node::KeyBranch(_)), BranchKind::Key) => true,
            (Some(Node::KeyBranch(_)), BranchKind::Table) => true,
            (Some(Node::TableBranch(_)), BranchKind::Table) => true,
            (Some(Node::TableLeaf(_)), BranchKind::Table) => true,
            (Some(Node::ArrayTable(_)), BranchKind::Table) => true,
            _ => false,
        };
        if !compatible {
            return Err(duplicate(table, seg));
        }
    }

    // The segment now names a table-carrying node.
    match table.get_mut(&seg.name) {
        Some(Node::KeyBranch(t)) | Some(Node::TableBranch(t)) | Some(Node::TableLeaf(t)) => Ok(t),
        Some(Node::ArrayTable(elements)) => {
            if elements.is_empty() {
                elements.push(Table::new());
            }
            let last = elements.len() - 1;
            Ok(&mut elements[last])
        }
        _ => Err(ParseError::at(
            ErrorKind::DuplicateKey,
            format!("`{}` cannot be extended", seg.name),
            seg.line,
            seg.column,
        )),
    }
}

/// Attach the terminal segment of a `[header]`.
fn attach_table_leaf(table: &mut Table, seg: &KeySegment, max: usize) -> Result<(), ParseError> {
    if !table.contains_key(&seg.name) {
        check_capacity(table, seg, max)?;
        table.insert(seg.name.clone(), Node::TableLeaf(Table::new()));
        return Ok(());
    }
    // An implicitly created ancestor is promoted, exactly once.
    if let Some(node) = table.get_mut(&seg.name) {
        if let Node::TableBranch(children) = node {
            let children = std::mem::take(children);
            *node = Node::TableLeaf(children);
            return Ok(());
        }
    }
    Err(duplicate(table, seg))
}

/// Attach the terminal segment of a `[[header]]`.
fn attach_array_element(table: &mut Table, seg: &KeySegment, max: usize) -> Result<(), ParseError> {
    if !table.contains_key(&seg.name) {
        check_capacity(table, seg, max)?;
        table.insert(seg.name.clone(), Node::ArrayTable(vec![Table::new()]));
        return Ok(());
    }
    if let Some(Node::ArrayTable(elements)) = table.get_mut(&seg.name) {
        if elements.len() >= max {
            return Err(ParseError::at(
                ErrorKind::BufferOverflow,
                format!("array of tables exceeds {} elements", max),
                seg.line,
                seg.column,
            ));
        }
        elements.push(Table::new());
        return Ok(());
    }
    Err(duplicate(table, seg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &[&str]) -> Vec<KeySegment> {
        path.iter().map(|s| KeySegment::bare(s)).collect()
    }

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(&ParserOptions::default())
    }

    #[test]
    fn test_simple_key_value() {
        let mut b = builder();
        b.insert(&segs(&["key"]), Value::Integer(1)).unwrap();
        let root = b.into_root();
        assert_eq!(
            root.get("key").and_then(Node::as_value),
            Some(&Value::Integer(1))
        );
    }

    #[test]
    fn test_table_header_then_key() {
        let mut b = builder();
        b.open_table(&segs(&["a", "b"])).unwrap();
        b.insert(&segs(&["k"]), Value::Integer(1)).unwrap();
        let root = b.into_root();

        assert!(matches!(root.get("a"), Some(Node::TableBranch(_))));
        let node = root.get_path(&["a", "b"]).unwrap();
        assert!(matches!(node, Node::TableLeaf(_)));
        let k = root.get_path(&["a", "b", "k"]).unwrap();
        assert_eq!(k.as_value(), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_array_of_tables_elements() {
        let mut b = builder();
        b.open_array_table(&segs(&["fruits"])).unwrap();
        b.insert(&segs(&["name"]), Value::String("apple".into()))
            .unwrap();
        b.open_array_table(&segs(&["fruits"])).unwrap();
        b.insert(&segs(&["name"]), Value::String("banana".into()))
            .unwrap();

        let root = b.into_root();
        let elements = root.get("fruits").unwrap().as_array_of_tables().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(
            elements[0].get("name").and_then(Node::as_value),
            Some(&Value::String("apple".into()))
        );
        assert_eq!(
            elements[1].get("name").and_then(Node::as_value),
            Some(&Value::String("banana".into()))
        );
    }

    #[test]
    fn test_subtable_of_array_element() {
        let mut b = builder();
        b.open_array_table(&segs(&["fruits"])).unwrap();
        b.open_table(&segs(&["fruits", "physical"])).unwrap();
        b.insert(&segs(&["color"]), Value::String("red".into()))
            .unwrap();

        let root = b.into_root();
        let elements = root.get("fruits").unwrap().as_array_of_tables().unwrap();
        let physical = elements[0].get_path(&["physical", "color"]).unwrap();
        assert_eq!(physical.as_value(), Some(&Value::String("red".into())));
    }

    #[test]
    fn test_key_then_table_header_rejected() {
        let mut b = builder();
        b.insert(&segs(&["a"]), Value::Integer(1)).unwrap();
        let err = b.open_table(&segs(&["a"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_table_redefinition_rejected() {
        let mut b = builder();
        b.open_table(&segs(&["a"])).unwrap();
        let err = b.open_table(&segs(&["a"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_promote_implicit_table_once() {
        let mut b = builder();
        b.open_table(&segs(&["a", "b"])).unwrap();
        // [a] promotes the implicit branch created for a.b.
        b.open_table(&segs(&["a"])).unwrap();
        // A second [a] rejects.
        let err = b.open_table(&segs(&["a"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        let root = b.root();
        assert!(matches!(root.get("a"), Some(Node::TableLeaf(_))));
        assert!(matches!(
            root.get_path(&["a", "b"]),
            Some(Node::TableLeaf(_))
        ));
    }

    #[test]
    fn test_dotted_key_under_header_table_rejected() {
        let mut b = builder();
        b.open_table(&segs(&["a"])).unwrap();
        b.open_table(&segs(&["a", "b"])).unwrap();
        // Active table is [a.b]; a dotted key reaching through the
        // header-opened `b` from [a] must reject.
        b.open_table(&segs(&["a"])).unwrap_err();

        let mut b = builder();
        b.open_table(&segs(&["t"])).unwrap();
        b.insert(&segs(&["x"]), Value::Integer(1)).unwrap();
        // t.x exists as a key; a dotted path through x rejects.
        let err = b.insert(&segs(&["x", "y"]), Value::Integer(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_dotted_key_cannot_extend_header_table() {
        let mut b = builder();
        b.open_table(&segs(&["a", "b"])).unwrap();
        b.open_table(&segs(&["c"])).unwrap();
        // Active is [c]; `a` at root is an implicit branch, but writing
        // c.a... only touches [c]. Reach the root case directly: a
        // dotted key whose first segment is a header table.
        let err = insert_dotted(
            &mut b.root,
            &segs(&["a", "b", "z"]),
            Value::Integer(1),
            131_072,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_dotted_key_retracing_active_header_rejected() {
        let mut b = builder();
        b.open_table(&segs(&["a"])).unwrap();
        b.open_table(&segs(&["a", "b"])).unwrap();
        let err = b
            .insert(&segs(&["a", "b", "c"]), Value::Integer(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        // A shorter retrace rejects as well.
        let mut b = builder();
        b.open_table(&segs(&["a"])).unwrap();
        let err = b.insert(&segs(&["a", "x"]), Value::Integer(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        // Paths that merely share a first segment are not retraces.
        let mut b = builder();
        b.open_table(&segs(&["a", "b"])).unwrap();
        b.insert(&segs(&["a", "x"]), Value::Integer(1)).unwrap();
        let root = b.into_root();
        assert!(root
            .get_path(&["a", "b", "a", "x"])
            .and_then(Node::as_value)
            .is_some());
    }

    #[test]
    fn test_dotted_branches_shared() {
        let mut b = builder();
        b.insert(&segs(&["site", "name"]), Value::String("x".into()))
            .unwrap();
        b.insert(&segs(&["site", "port"]), Value::Integer(80))
            .unwrap();
        let root = b.into_root();
        assert!(matches!(root.get("site"), Some(Node::KeyBranch(_))));
        assert!(root.get_path(&["site", "name"]).is_some());
        assert!(root.get_path(&["site", "port"]).is_some());
    }

    #[test]
    fn test_duplicate_key_value_rejected() {
        let mut b = builder();
        b.insert(&segs(&["k"]), Value::Integer(1)).unwrap();
        let err = b.insert(&segs(&["k"]), Value::Integer(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_array_table_then_table_header_rejected() {
        let mut b = builder();
        b.open_array_table(&segs(&["fruits"])).unwrap();
        let err = b.open_table(&segs(&["fruits"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_table_then_array_table_rejected() {
        let mut b = builder();
        b.open_table(&segs(&["a"])).unwrap();
        let err = b.open_array_table(&segs(&["a"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_inline_table_closed_to_headers() {
        let mut b = builder();
        let mut inline = Table::new();
        insert_dotted(
            &mut inline,
            &segs(&["x"]),
            Value::Integer(1),
            131_072,
        )
        .unwrap();
        b.insert(&segs(&["point"]), Value::Table(inline)).unwrap();

        let err = b.open_table(&segs(&["point", "y"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_table_entry_limit() {
        let options = ParserOptions::default().with_max_table_entries(2);
        let mut b = DocumentBuilder::new(&options);
        b.insert(&segs(&["a"]), Value::Integer(1)).unwrap();
        b.insert(&segs(&["b"]), Value::Integer(2)).unwrap();
        let err = b.insert(&segs(&["c"]), Value::Integer(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferOverflow);
    }

    #[test]
    fn test_error_position_comes_from_segment() {
        let mut b = builder();
        b.insert(&segs(&["a"]), Value::Integer(1)).unwrap();
        let seg = KeySegment {
            name: "a".into(),
            line: 7,
            column: 2,
        };
        let err = b.open_table(&[seg]).unwrap_err();
        assert_eq!(err.line(), 7);
        assert_eq!(err.column(), 2);
    }
}
