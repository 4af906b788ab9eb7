//! Owned control-flow graph and its textual format.
//!
//! [`ControlFlowGraph`] is the bundled [`CfgAdaptor`] implementation used by
//! the `trace-cfg` driver and the tests. Graphs can be built through the API
//! or parsed from text:
//!
//! ```text
//! ; Comments start with semicolon
//! entry 1.0: ^loop
//! loop 0.9: ^body ^exit
//! body 0.8: ^loop
//! exit 0.1:
//! ```
//!
//! Each line defines a block: its name, an optional probability (default
//! `1.0`), a colon, and the successor blocks in order. The first block is the
//! entry unless an `entry ^name` line says otherwise. Predecessor lists are
//! derived from the successor lists, so the two always agree.

use crate::core::{BlockId, CfgAdaptor, CfgParseError};
use std::fmt;

pub mod parser;

/// A basic block: name, probability and edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub probability: f64,
    pub preds: Vec<BlockId>,
    pub succs: Vec<BlockId>,
}

/// Control-flow graph with dense block ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFlowGraph {
    blocks: Vec<Block>,
    entry: BlockId,
}

impl ControlFlowGraph {
    /// Empty graph. The first block added becomes the entry.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            entry: BlockId(0),
        }
    }

    pub fn parse(text: &str) -> Result<Self, CfgParseError> {
        parser::parse_cfg(text)
    }

    /// Add a block and return its id.
    pub fn add_block(&mut self, name: impl Into<String>, probability: f64) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(Block {
            name: name.into(),
            probability,
            preds: Vec::new(),
            succs: Vec::new(),
        });
        id
    }

    /// Add an edge, updating both the successor and predecessor lists.
    ///
    /// # Panics
    ///
    /// Panics if either block does not exist.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        assert!(to.index() < self.blocks.len(), "edge target {to} does not exist");
        self.blocks[from.index()].succs.push(to);
        self.blocks[to.index()].preds.push(from);
    }

    pub fn set_entry(&mut self, entry: BlockId) {
        self.entry = entry;
    }

    /// Mutable block access. Edits to the edge lists bypass the consistency
    /// that `add_edge` maintains.
    pub fn block_mut(&mut self, block: BlockId) -> &mut Block {
        &mut self.blocks[block.index()]
    }

    pub fn block_list(&self) -> &[Block] {
        &self.blocks
    }

    /// Look up a block by name.
    pub fn find_block(&self, name: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|b| b.name == name)
            .map(BlockId::new)
    }

    /// Build a graph from `(from, to)` pairs over `probabilities.len()` blocks
    /// named `B0`, `B1`, ... with entry `B0`.
    pub fn from_edges(probabilities: &[f64], edges: &[(u32, u32)]) -> Self {
        let mut cfg = Self::new();
        for (idx, &p) in probabilities.iter().enumerate() {
            cfg.add_block(format!("B{idx}"), p);
        }
        for &(from, to) in edges {
            cfg.add_edge(BlockId(from), BlockId(to));
        }
        cfg
    }
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CfgAdaptor for ControlFlowGraph {
    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn entry_block(&self) -> BlockId {
        self.entry
    }

    fn block_preds(&self, block: BlockId) -> &[BlockId] {
        &self.blocks[block.index()].preds
    }

    fn block_succs(&self, block: BlockId) -> &[BlockId] {
        &self.blocks[block.index()].succs
    }

    fn block_probability(&self, block: BlockId) -> f64 {
        self.blocks[block.index()].probability
    }

    fn block_name(&self, block: BlockId) -> &str {
        &self.blocks[block.index()].name
    }
}

/// Prints the graph back in the textual format, entry first.
impl fmt::Display for ControlFlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entry.index() != 0 && self.entry.index() < self.blocks.len() {
            writeln!(f, "entry ^{}", self.blocks[self.entry.index()].name)?;
        }
        for block in &self.blocks {
            write!(f, "{} {}:", block.name, block.probability)?;
            for succ in &block.succs {
                write!(f, " ^{}", self.blocks[succ.index()].name)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_keeps_lists_consistent() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block("a", 1.0);
        let b = cfg.add_block("b", 0.5);
        cfg.add_edge(a, b);
        cfg.add_edge(b, a);

        assert_eq!(cfg.block_succs(a), &[b]);
        assert_eq!(cfg.block_preds(b), &[a]);
        assert_eq!(cfg.block_preds(a), &[b]);
        assert_eq!(cfg.edge_count(), 2);
        assert_eq!(cfg.entry_block(), a);
    }

    #[test]
    fn test_from_edges() {
        let cfg = ControlFlowGraph::from_edges(&[1.0, 0.9, 0.1], &[(0, 1), (0, 2)]);
        assert_eq!(cfg.block_count(), 3);
        assert_eq!(cfg.block_name(BlockId(2)), "B2");
        assert_eq!(cfg.block_succs(BlockId(0)), &[BlockId(1), BlockId(2)]);
        assert_eq!(cfg.find_block("B1"), Some(BlockId(1)));
        assert_eq!(cfg.find_block("B7"), None);
    }

    #[test]
    fn test_display_round_trips() {
        let text = "entry ^b\na 0.5: ^b\nb 1: ^a ^a\n";
        let cfg = ControlFlowGraph::parse(text).unwrap();
        assert_eq!(cfg.to_string(), text);
        assert_eq!(ControlFlowGraph::parse(&cfg.to_string()).unwrap(), cfg);
    }
}
