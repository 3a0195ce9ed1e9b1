//! Edge-list ingest.
//!
//! One edge per line, two whitespace-separated vertex names. Blank lines and
//! lines starting with `#` are skipped; tokens after the second are ignored.
//! Names are interned in first-seen order, so the first name read gets id 0.

use hashbrown::HashMap;
use std::io::BufRead;

use crate::quad_error::QuadError;
use crate::topology::adjacency::{GraphSnapshot, VertexId};

/// An id-mapped graph plus the names its ids stand for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamedGraph {
    /// `names[id]` is the original name of vertex `id`.
    pub names: Vec<String>,
    pub snapshot: GraphSnapshot,
}

impl NamedGraph {
    pub fn name_of(&self, v: VertexId) -> Option<&str> {
        self.names.get(v as usize).map(String::as_str)
    }
}

#[derive(Default)]
struct Interner {
    ids: HashMap<String, VertexId>,
    names: Vec<String>,
}

impl Interner {
    fn intern(&mut self, name: &str, line: usize) -> Result<VertexId, QuadError> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let id = VertexId::try_from(self.names.len()).map_err(|_| QuadError::Parse {
            line,
            reason: "too many distinct vertices for a 32-bit id".into(),
        })?;
        self.ids.insert(name.to_owned(), id);
        self.names.push(name.to_owned());
        Ok(id)
    }
}

/// Read an edge list from `reader`.
///
/// # Errors
/// - [`QuadError::Parse`] for a non-comment line with fewer than two tokens
///   (line numbers are 1-based).
/// - [`QuadError::Io`] if reading fails.
pub fn read_edge_list<R: BufRead>(reader: R) -> Result<NamedGraph, QuadError> {
    let mut interner = Interner::default();
    let mut edges = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let (Some(u), Some(v)) = (tokens.next(), tokens.next()) else {
            return Err(QuadError::Parse {
                line: lineno,
                reason: format!("expected two vertex names, found {trimmed:?}"),
            });
        };
        let u = interner.intern(u, lineno)?;
        let v = interner.intern(v, lineno)?;
        edges.push((u, v));
    }

    log::debug!(
        "read {} edges over {} vertices",
        edges.len(),
        interner.names.len()
    );
    Ok(NamedGraph {
        snapshot: GraphSnapshot::new(interner.names.len(), edges),
        names: interner.names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_interned_in_first_seen_order() {
        let text = "# comment\nb a\n\na c extra\n  c b\n";
        let g = read_edge_list(text.as_bytes()).unwrap();
        assert_eq!(g.names, vec!["b", "a", "c"]);
        assert_eq!(g.snapshot.vertex_count, 3);
        assert_eq!(g.snapshot.edges, vec![(0, 1), (1, 2), (2, 0)]);
        assert_eq!(g.name_of(2), Some("c"));
        assert_eq!(g.name_of(3), None);
    }

    #[test]
    fn short_line_is_a_parse_error() {
        let err = read_edge_list("1 2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, QuadError::Parse { line: 2, .. }));
    }

    #[test]
    fn empty_input_is_an_empty_graph() {
        let g = read_edge_list("".as_bytes()).unwrap();
        assert!(g.names.is_empty());
        assert_eq!(g.snapshot, GraphSnapshot::default());
    }
}
