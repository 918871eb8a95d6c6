//! Row-at-a-time evaluation of parsed queries against a [`PropertyGraph`].
//!
//! Every query starts from one empty row. `MATCH` expands each row with the
//! pattern's matches and drops rows failing `WHERE`; `MERGE` does the same
//! but creates the pattern when a row has no match; `RETURN` projects the
//! rows into the result table and must come last.

use super::ast::*;
use crate::error::{GraphError, Result};
use crate::graph::{Direction, EdgeId, NodeId, PropertyGraph, PropertyMap, PropertyValue};
use log::trace;
use std::collections::BTreeMap;

/// Graph access for one query; writes are only possible through `Write`.
pub(crate) enum GraphRef<'g> {
    Read(&'g PropertyGraph),
    Write(&'g mut PropertyGraph),
}

impl GraphRef<'_> {
    fn get(&self) -> &PropertyGraph {
        match self {
            GraphRef::Read(graph) => graph,
            GraphRef::Write(graph) => graph,
        }
    }

    fn get_mut(&mut self) -> Result<&mut PropertyGraph> {
        match self {
            GraphRef::Read(_) => Err(invalid("MERGE requires write access to the graph")),
            GraphRef::Write(graph) => Ok(graph),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Node(NodeId),
    Edge(EdgeId),
}

type Row = BTreeMap<String, Binding>;

/// Mutation counters reported alongside a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct QueryStats {
    pub nodes_created: usize,
    pub properties_set: usize,
    pub relationships_created: usize,
}

impl QueryStats {
    pub fn absorb(&mut self, other: QueryStats) {
        self.nodes_created += other.nodes_created;
        self.properties_set += other.properties_set;
        self.relationships_created += other.relationships_created;
    }

    /// Non-zero counters as `Name: value` lines.
    pub fn lines(&self) -> Vec<String> {
        [
            ("Nodes created", self.nodes_created),
            ("Properties set", self.properties_set),
            ("Relationships created", self.relationships_created),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| format!("{name}: {count}"))
        .collect()
    }
}

/// Result table of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<PropertyValue>>,
    pub stats: QueryStats,
}

pub(crate) fn evaluate(mut graph: GraphRef<'_>, query: &Query) -> Result<QueryOutput> {
    if let Some(i) = query
        .clauses
        .iter()
        .position(|c| matches!(c, Clause::Return(_)))
    {
        if i + 1 != query.clauses.len() {
            return Err(invalid("RETURN must be the last clause"));
        }
    }

    let mut rows: Vec<Row> = vec![Row::new()];
    let mut output = QueryOutput::default();

    for clause in &query.clauses {
        match clause {
            Clause::Match { pattern, filter } => {
                let g = graph.get();
                let mut matched = Vec::new();
                for row in &rows {
                    for candidate in match_pattern(g, pattern, row)? {
                        if passes(g, filter, &candidate)? {
                            matched.push(candidate);
                        }
                    }
                }
                trace!("MATCH expanded {} rows into {}", rows.len(), matched.len());
                rows = matched;
            }
            Clause::Merge(pattern) => {
                let mut merged = Vec::new();
                for row in &rows {
                    let found = match_pattern(graph.get(), pattern, row)?;
                    if found.is_empty() {
                        let g = graph.get_mut()?;
                        merged.push(create_pattern(g, pattern, row.clone(), &mut output.stats)?);
                    } else {
                        merged.extend(found);
                    }
                }
                rows = merged;
            }
            Clause::Return(items) => {
                output.columns = items.iter().map(|item| item.name.clone()).collect();
                output.rows = project(graph.get(), items, &rows)?;
            }
        }
    }

    Ok(output)
}

fn match_pattern(graph: &PropertyGraph, pattern: &Pattern, row: &Row) -> Result<Vec<Row>> {
    let mut matches = Vec::new();

    for start in candidates(graph, &pattern.start, row)? {
        let mut bound = row.clone();
        bind(&mut bound, &pattern.start.variable, Binding::Node(start));

        let Some((rel, end)) = &pattern.hop else {
            matches.push(bound);
            continue;
        };

        for (edge_id, neighbor) in graph.neighbors(start, rel.direction, rel.rel_type.as_deref()) {
            let existing = rel.variable.as_ref().and_then(|v| bound.get(v));
            if let Some(Binding::Edge(existing)) = existing {
                if *existing != edge_id {
                    continue;
                }
            }
            if !node_fits(graph, end, neighbor, &bound)? {
                continue;
            }
            let mut extended = bound.clone();
            bind(&mut extended, &end.variable, Binding::Node(neighbor));
            bind(&mut extended, &rel.variable, Binding::Edge(edge_id));
            matches.push(extended);
        }
    }

    Ok(matches)
}

fn candidates(graph: &PropertyGraph, node: &NodePattern, row: &Row) -> Result<Vec<NodeId>> {
    match bound_node(node, row)? {
        Some(id) => Ok(if node_fits(graph, node, id, row)? {
            vec![id]
        } else {
            Vec::new()
        }),
        None => {
            let properties = property_map(node);
            let found = graph
                .find_nodes(node.label.as_deref(), &properties)
                .collect();
            Ok(found)
        }
    }
}

fn node_fits(graph: &PropertyGraph, pattern: &NodePattern, id: NodeId, row: &Row) -> Result<bool> {
    if let Some(bound) = bound_node(pattern, row)? {
        if bound != id {
            return Ok(false);
        }
    }
    let Some(node) = graph.node(id) else {
        return Ok(false);
    };
    let label_ok = pattern.label.as_deref().map_or(true, |l| node.has_label(l));
    Ok(label_ok && node.properties.contains_all(&property_map(pattern)))
}

fn bound_node(pattern: &NodePattern, row: &Row) -> Result<Option<NodeId>> {
    match pattern.variable.as_ref().and_then(|v| row.get(v).map(|b| (v, b))) {
        Some((_, Binding::Node(id))) => Ok(Some(*id)),
        Some((name, Binding::Edge(_))) => Err(invalid(format!(
            "variable `{name}` is a relationship, not a node"
        ))),
        None => Ok(None),
    }
}

fn create_pattern(
    graph: &mut PropertyGraph,
    pattern: &Pattern,
    mut row: Row,
    stats: &mut QueryStats,
) -> Result<Row> {
    let start = create_or_bind(graph, &pattern.start, &mut row, stats)?;

    if let Some((rel, end)) = &pattern.hop {
        let rel_type = rel
            .rel_type
            .as_deref()
            .ok_or_else(|| invalid("MERGE needs a relationship type"))?;
        let end = create_or_bind(graph, end, &mut row, stats)?;

        let (source, target) = match rel.direction {
            Direction::Incoming => (end, start),
            Direction::Outgoing | Direction::Both => (start, end),
        };
        let edge_id = graph.add_edge(source, target, rel_type)?;
        stats.relationships_created += 1;
        bind(&mut row, &rel.variable, Binding::Edge(edge_id));
    }

    Ok(row)
}

fn create_or_bind(
    graph: &mut PropertyGraph,
    node: &NodePattern,
    row: &mut Row,
    stats: &mut QueryStats,
) -> Result<NodeId> {
    if let Some(id) = bound_node(node, row)? {
        if !node.is_unconstrained() {
            let name = node.variable.as_deref().unwrap_or_default();
            return Err(invalid(format!(
                "variable `{name}` is already bound and cannot take a new label or properties"
            )));
        }
        return Ok(id);
    }

    let properties = property_map(node);
    stats.nodes_created += 1;
    stats.properties_set += properties.len();
    let id = graph.add_node(node.label.clone(), properties);
    bind(row, &node.variable, Binding::Node(id));
    Ok(id)
}

fn passes(graph: &PropertyGraph, filter: &[Comparison], row: &Row) -> Result<bool> {
    for comparison in filter {
        let left = eval_operand(graph, &comparison.left, row)?;
        let right = eval_operand(graph, &comparison.right, row)?;
        if !compare(comparison.op, &left, &right) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Null on either side never satisfies a comparison.
fn compare(op: CompareOp, left: &PropertyValue, right: &PropertyValue) -> bool {
    if left.is_null() || right.is_null() {
        return false;
    }
    match op {
        CompareOp::Equals => values_equal(left, right),
        CompareOp::NotEquals => !values_equal(left, right),
        CompareOp::Contains => match (left, right) {
            (PropertyValue::String(haystack), PropertyValue::String(needle)) => {
                haystack.contains(needle.as_str())
            }
            _ => left.to_string().contains(&right.to_string()),
        },
    }
}

fn values_equal(left: &PropertyValue, right: &PropertyValue) -> bool {
    match (left, right) {
        (PropertyValue::Int(a), PropertyValue::Float(b))
        | (PropertyValue::Float(b), PropertyValue::Int(a)) => (*a as f64) == *b,
        _ => left == right,
    }
}

fn eval_operand(graph: &PropertyGraph, operand: &Operand, row: &Row) -> Result<PropertyValue> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Id(variable) => Ok(match lookup(row, variable)? {
            Binding::Node(id) | Binding::Edge(id) => PropertyValue::Int(id as i64),
        }),
        Operand::Property { variable, key } => match lookup(row, variable)? {
            Binding::Node(id) => Ok(graph
                .node(id)
                .and_then(|node| node.get_property(key))
                .cloned()
                .unwrap_or(PropertyValue::Null)),
            Binding::Edge(_) => Ok(PropertyValue::Null),
        },
        Operand::Labels(variable) => match lookup(row, variable)? {
            Binding::Node(id) => Ok(PropertyValue::List(
                graph
                    .node(id)
                    .and_then(|node| node.label.clone())
                    .map(PropertyValue::String)
                    .into_iter()
                    .collect(),
            )),
            Binding::Edge(_) => Err(invalid(format!(
                "labels() expects a node, `{variable}` is a relationship"
            ))),
        },
    }
}

fn project(
    graph: &PropertyGraph,
    items: &[ReturnItem],
    rows: &[Row],
) -> Result<Vec<Vec<PropertyValue>>> {
    let aggregating = items
        .iter()
        .any(|item| matches!(item.projection, Projection::Count(_)));

    if !aggregating {
        return rows
            .iter()
            .map(|row| {
                items
                    .iter()
                    .map(|item| match &item.projection {
                        Projection::Value(operand) => eval_operand(graph, operand, row),
                        Projection::Count(_) => Ok(PropertyValue::Null),
                    })
                    .collect()
            })
            .collect();
    }

    // Group by the non-aggregate items, counting per group in first-seen order.
    let mut groups: Vec<(Vec<PropertyValue>, Vec<i64>)> = Vec::new();
    for row in rows {
        let mut key = Vec::new();
        let mut counts = Vec::new();
        for item in items {
            match &item.projection {
                Projection::Value(operand) => key.push(eval_operand(graph, operand, row)?),
                Projection::Count(variable) => {
                    lookup(row, variable)?;
                    counts.push(1);
                }
            }
        }
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, totals)) => totals.iter_mut().zip(&counts).for_each(|(t, c)| *t += c),
            None => groups.push((key, counts)),
        }
    }

    let grouped = items
        .iter()
        .any(|item| matches!(item.projection, Projection::Value(_)));
    if groups.is_empty() && !grouped {
        let zeros = items.iter().map(|_| 0).collect();
        groups.push((Vec::new(), zeros));
    }

    Ok(groups
        .into_iter()
        .map(|(key, counts)| {
            let mut key = key.into_iter();
            let mut counts = counts.into_iter();
            items
                .iter()
                .map(|item| match item.projection {
                    Projection::Value(_) => key.next().unwrap_or(PropertyValue::Null),
                    Projection::Count(_) => PropertyValue::Int(counts.next().unwrap_or(0)),
                })
                .collect()
        })
        .collect())
}

fn lookup(row: &Row, variable: &str) -> Result<Binding> {
    row.get(variable)
        .copied()
        .ok_or_else(|| invalid(format!("variable `{variable}` is not defined")))
}

fn bind(row: &mut Row, variable: &Option<String>, binding: Binding) {
    if let Some(name) = variable {
        row.insert(name.clone(), binding);
    }
}

fn property_map(node: &NodePattern) -> PropertyMap {
    node.properties.iter().cloned().collect()
}

fn invalid(message: impl Into<String>) -> GraphError {
    GraphError::InvalidOperation {
        message: message.into(),
    }
}
