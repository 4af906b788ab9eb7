//! Textual CFG parser implementation.

use super::ControlFlowGraph;
use crate::core::{BlockId, CfgParseError};
use hashbrown::HashMap;

pub fn parse_cfg(text: &str) -> Result<ControlFlowGraph, CfgParseError> {
    Parser::new().parse(text)
}

struct Parser<'a> {
    cfg: ControlFlowGraph,
    blocks: HashMap<&'a str, BlockId>,
    edge_resolves: Vec<Resolve<'a>>,
    entry: Option<Resolve<'a>>,
}

/// Forward reference to a block by name.
#[derive(Debug)]
struct Resolve<'a> {
    from: BlockId,
    name: &'a str,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new() -> Self {
        Self {
            cfg: ControlFlowGraph::new(),
            blocks: HashMap::new(),
            edge_resolves: Vec::new(),
            entry: None,
        }
    }

    fn parse(mut self, text: &'a str) -> Result<ControlFlowGraph, CfgParseError> {
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = match raw.find(';') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if content.is_empty() {
                continue;
            }

            match content.split_once(':') {
                Some((head, tail)) => self.parse_block(head, tail, line)?,
                None => self.parse_directive(content, line)?,
            }
        }

        if self.cfg.block_list().is_empty() {
            return Err(CfgParseError::Empty);
        }
        self.resolve_all_references()?;
        Ok(self.cfg)
    }

    fn parse_directive(&mut self, content: &'a str, line: usize) -> Result<(), CfgParseError> {
        let mut tokens = content.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some("entry"), Some(target), None) => {
                let name = read_block_ref(target, line)?;
                if self.entry.is_some() {
                    return Err(CfgParseError::Syntax {
                        line,
                        reason: "entry declared twice".to_string(),
                    });
                }
                self.entry = Some(Resolve {
                    from: BlockId(0),
                    name,
                    line,
                });
                Ok(())
            }
            _ => Err(CfgParseError::Syntax {
                line,
                reason: format!("expected 'name [probability]: ^succ...' but found '{content}'"),
            }),
        }
    }

    fn parse_block(
        &mut self,
        head: &'a str,
        tail: &'a str,
        line: usize,
    ) -> Result<(), CfgParseError> {
        let mut tokens = head.split_whitespace();
        let name = match tokens.next() {
            Some(name) => read_identifier(name, line)?,
            None => {
                return Err(CfgParseError::Syntax {
                    line,
                    reason: "missing block name".to_string(),
                })
            }
        };
        let probability = match tokens.next() {
            Some(text) => read_probability(text, line)?,
            None => 1.0,
        };
        if let Some(extra) = tokens.next() {
            return Err(CfgParseError::Syntax {
                line,
                reason: format!("unexpected '{extra}' before ':'"),
            });
        }

        if self.blocks.contains_key(name) {
            return Err(CfgParseError::DuplicateBlock {
                line,
                name: name.to_string(),
            });
        }
        let id = self.cfg.add_block(name, probability);
        self.blocks.insert(name, id);

        for target in tail.split(|c: char| c.is_whitespace() || c == ',') {
            if target.is_empty() {
                continue;
            }
            let succ = read_block_ref(target, line)?;
            self.edge_resolves.push(Resolve {
                from: id,
                name: succ,
                line,
            });
        }
        Ok(())
    }

    fn lookup(&self, resolve: &Resolve<'a>) -> Result<BlockId, CfgParseError> {
        self.blocks
            .get(resolve.name)
            .copied()
            .ok_or_else(|| CfgParseError::UnknownBlock {
                line: resolve.line,
                name: resolve.name.to_string(),
            })
    }

    fn resolve_all_references(&mut self) -> Result<(), CfgParseError> {
        let resolves = std::mem::take(&mut self.edge_resolves);
        for resolve in &resolves {
            let to = self.lookup(resolve)?;
            self.cfg.add_edge(resolve.from, to);
        }

        if let Some(entry) = self.entry.take() {
            let block = self.lookup(&entry)?;
            self.cfg.set_entry(block);
        }
        Ok(())
    }
}

fn read_identifier(text: &str, line: usize) -> Result<&str, CfgParseError> {
    let mut chars = text.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if valid_start && valid_rest {
        Ok(text)
    } else {
        Err(CfgParseError::Syntax {
            line,
            reason: format!("invalid block name '{text}'"),
        })
    }
}

fn read_block_ref(text: &str, line: usize) -> Result<&str, CfgParseError> {
    match text.strip_prefix('^') {
        Some(name) => read_identifier(name, line),
        None => Err(CfgParseError::Syntax {
            line,
            reason: format!("expected block reference '^name' but found '{text}'"),
        }),
    }
}

fn read_probability(text: &str, line: usize) -> Result<f64, CfgParseError> {
    match text.parse::<f64>() {
        Ok(p) if p.is_finite() && p >= 0.0 => Ok(p),
        _ => Err(CfgParseError::InvalidProbability {
            line,
            text: text.to_string(),
        }),
    }
}
