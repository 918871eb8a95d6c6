//! Interpreter for the statement subset this crate emits.
//!
//! Supported: `MERGE` and `MATCH` over single-hop patterns, `WHERE` as a
//! conjunction of `=`, `<>` and `CONTAINS`, and `RETURN` of properties,
//! `id()`, `labels()` and `count()`. Queries are separated by `;`.

mod ast;
mod eval;
mod lexer;
mod parser;

use crate::error::Result;
use crate::graph::PropertyGraph;
use ast::{Clause, Query};
use eval::GraphRef;

pub(crate) use eval::{QueryOutput, QueryStats};
pub(crate) use lexer::is_plain_identifier;

/// A parsed statement: one or more queries run in order.
#[derive(Debug, Clone)]
pub(crate) struct Script {
    queries: Vec<Query>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            queries: parser::parse(text)?,
        })
    }

    /// True when no query contains a `MERGE`.
    pub fn is_read_only(&self) -> bool {
        self.queries
            .iter()
            .flat_map(|q| &q.clauses)
            .all(|c| !matches!(c, Clause::Merge(_)))
    }

    pub fn run_read(&self, graph: &PropertyGraph) -> Result<QueryOutput> {
        self.run(|query| eval::evaluate(GraphRef::Read(graph), query))
    }

    pub fn run_write(&self, graph: &mut PropertyGraph) -> Result<QueryOutput> {
        self.run(|query| eval::evaluate(GraphRef::Write(&mut *graph), query))
    }

    /// The last query's table, with counters summed over all queries.
    fn run<F>(&self, mut evaluate: F) -> Result<QueryOutput>
    where
        F: FnMut(&Query) -> Result<QueryOutput>,
    {
        let mut stats = QueryStats::default();
        let mut last = QueryOutput::default();
        for query in &self.queries {
            last = evaluate(query)?;
            stats.absorb(last.stats);
        }
        last.stats = stats;
        Ok(last)
    }
}
