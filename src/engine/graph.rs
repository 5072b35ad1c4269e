//! Turns result rows into a textual artifact.
//!
//! Which graph runs is picked by the `type` string in the markfile's graph
//! config; no config at all means a plain table. All the shape checking
//! (column counts, axis and partition names) happens when the graph is
//! constructed, before the query ever runs, so a misconfigured spec fails
//! fast instead of after an expensive query.
mod sparkline;

use crate::engine::rendering::render_grid;
use crate::engine::{Row, Value};
use crate::markfile::GraphConfig;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

use sparkline::sparkify;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("`{kind}` is not a valid graph type for query `{query}`.")]
    UnknownType { query: String, kind: String },
    #[error("{graph} graphs can only process {expected}-column queries; query `{query}` selects {found}.")]
    WrongColumnCount {
        query: String,
        graph: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Query `{query}` declares a {graph} graph but no `axis` column.")]
    MissingAxis { query: String, graph: &'static str },
    #[error("Query `{query}` declares a multispark graph but no `partition` column.")]
    MissingPartition { query: String },
    #[error("Axis `{axis}` is not one of query `{query}` columns: {columns:?}.")]
    AxisNotFound {
        query: String,
        axis: String,
        columns: Vec<String>,
    },
    #[error("Partition `{partition}` is not one of query `{query}` columns: {columns:?}.")]
    PartitionNotFound {
        query: String,
        partition: String,
        columns: Vec<String>,
    },
    #[error("Query `{query}` uses `{column}` for both axis and partition; they must differ.")]
    RolesOverlap { query: String, column: String },
    #[error("Column `{column}` holds non-numeric value `{value}`; cannot graph it.")]
    NonNumericValue { column: String, value: String },
    #[error("hist graphs are not implemented yet (query `{query}`).")]
    HistUnimplemented { query: String },
}

/// The closed set of graph renderers.
#[derive(Debug)]
pub enum Graph {
    Table(TableGraph),
    Spark(SparkGraph),
    MultiSpark(MultiSparkGraph),
    Hist(HistGraph),
}

impl Graph {
    /// Picks and validates a graph for the query's declared columns. No
    /// config means a table; an unrecognized type string is an error naming
    /// both the query and the offending value.
    pub fn from_config(
        query: &str,
        config: Option<&GraphConfig>,
        columns: &[String],
    ) -> Result<Graph, GraphError> {
        let Some(config) = config else {
            return Ok(Graph::Table(TableGraph::new(columns)));
        };

        match config.kind.as_str() {
            "table" => Ok(Graph::Table(TableGraph::new(columns))),
            "spark" => Ok(Graph::Spark(SparkGraph::new(query, columns, config)?)),
            "multispark" => Ok(Graph::MultiSpark(MultiSparkGraph::new(
                query, columns, config,
            )?)),
            "hist" => Ok(Graph::Hist(HistGraph::new(query, columns, config)?)),
            unknown => Err(GraphError::UnknownType {
                query: query.to_owned(),
                kind: unknown.to_owned(),
            }),
        }
    }

    pub fn render(&self, rows: &[Row]) -> Result<String, GraphError> {
        match self {
            Graph::Table(graph) => Ok(graph.render(rows)),
            Graph::Spark(graph) => graph.render(rows),
            Graph::MultiSpark(graph) => graph.render(rows),
            Graph::Hist(graph) => graph.render(rows),
        }
    }
}

/// Every row as-is, with the column list as headers and a row count trailer.
#[derive(Debug)]
pub struct TableGraph {
    columns: Vec<String>,
}

impl TableGraph {
    fn new(columns: &[String]) -> TableGraph {
        TableGraph {
            columns: columns.to_vec(),
        }
    }

    fn render(&self, rows: &[Row]) -> String {
        let columns = self.header_columns(rows);
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| columns.iter().map(|column| cell(row, column)).collect())
            .collect();

        format!("{}\n{} rows", render_grid(&columns, &cells), rows.len())
    }

    /// A `select *` declares columns the rows never carry, so whenever a
    /// declared column is missing from the results the headers fall back to
    /// the first row's own keys.
    fn header_columns(&self, rows: &[Row]) -> Vec<String> {
        match rows.first() {
            Some(first) if self.columns.iter().any(|column| !first.contains_key(column)) => {
                first.keys().cloned().collect()
            }
            _ => self.columns.clone(),
        }
    }
}

/// One sparkline over the axis column, labeled by the other column.
///
/// Renders as a two-row grid headed by the label values: the glyphs, then the
/// raw values they were quantized from.
#[derive(Debug)]
pub struct SparkGraph {
    axis: String,
    label: String,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl SparkGraph {
    fn new(query: &str, columns: &[String], config: &GraphConfig) -> Result<SparkGraph, GraphError> {
        let axis = declared_axis(query, columns, config, "spark", 2)?;
        let label = columns
            .iter()
            .find(|column| **column != axis)
            .expect("two distinct columns, one of which is the axis")
            .clone();

        Ok(SparkGraph {
            axis,
            label,
            minimum: config.minimum,
            maximum: config.maximum,
        })
    }

    fn render(&self, rows: &[Row]) -> Result<String, GraphError> {
        let values = axis_values(rows, &self.axis)?;
        let series = sparkify(&values, self.minimum, self.maximum);

        let labels: Vec<String> = rows.iter().map(|row| cell(row, &self.label)).collect();
        let glyphs: Vec<String> = series.chars().map(String::from).collect();
        let raw: Vec<String> = rows.iter().map(|row| cell(row, &self.axis)).collect();

        Ok(render_grid(&labels, &[glyphs, raw]))
    }
}

/// One sparkline per partition, all aligned to the same label superset.
///
/// Uneven series can't be compared glyph by glyph, so every partition is
/// densified against the sorted union of all labels, missing labels filling
/// with zero. Output is one line per partition with its peak and total,
/// quietest partitions first.
#[derive(Debug)]
pub struct MultiSparkGraph {
    axis: String,
    partition: String,
    label: String,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl MultiSparkGraph {
    fn new(
        query: &str,
        columns: &[String],
        config: &GraphConfig,
    ) -> Result<MultiSparkGraph, GraphError> {
        let axis = declared_axis(query, columns, config, "multispark", 3)?;
        let partition = config
            .partition
            .clone()
            .ok_or_else(|| GraphError::MissingPartition {
                query: query.to_owned(),
            })?;
        if !columns.contains(&partition) {
            return Err(GraphError::PartitionNotFound {
                query: query.to_owned(),
                partition,
                columns: columns.to_vec(),
            });
        }
        if partition == axis {
            return Err(GraphError::RolesOverlap {
                query: query.to_owned(),
                column: axis,
            });
        }

        let label = columns
            .iter()
            .find(|column| **column != axis && **column != partition)
            .expect("three distinct columns minus the axis and the partition")
            .clone();

        Ok(MultiSparkGraph {
            axis,
            partition,
            label,
            minimum: config.minimum,
            maximum: config.maximum,
        })
    }

    fn render(&self, rows: &[Row]) -> Result<String, GraphError> {
        let (superset, partitions) = self.build_partitions(rows)?;

        let mut results: Vec<(String, String, f64, f64)> = Vec::with_capacity(partitions.len());
        for (name, dataset) in partitions {
            let values: Vec<f64> = superset
                .iter()
                .map(|label| dataset.get(label).copied().unwrap_or(0.0))
                .collect();

            let series = sparkify(&values, self.minimum, self.maximum);
            let peak = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let total: f64 = values.iter().sum();

            results.push((name, series, peak, total));
        }

        results.sort_by(|a, b| a.3.total_cmp(&b.3));

        let headers = vec![
            self.partition.clone(),
            self.axis.clone(),
            "peak".to_owned(),
            "total".to_owned(),
        ];
        let cells: Vec<Vec<String>> = results
            .into_iter()
            .map(|(name, series, peak, total)| {
                vec![name, series, peak.to_string(), total.to_string()]
            })
            .collect();

        Ok(render_grid(&headers, &cells))
    }

    /// Groups rows into one label->value series per partition, and collects
    /// the sorted union of all labels. Duplicate labels within a partition
    /// keep the last value seen.
    #[allow(clippy::type_complexity)]
    fn build_partitions(
        &self,
        rows: &[Row],
    ) -> Result<(Vec<String>, IndexMap<String, IndexMap<String, f64>>), GraphError> {
        let mut partitions: IndexMap<String, IndexMap<String, f64>> = IndexMap::new();

        for row in rows {
            let partition = strip_markup(&cell(row, &self.partition));
            let label = strip_markup(&cell(row, &self.label));
            let value = axis_value(row, &self.axis)?;

            partitions.entry(partition).or_default().insert(label, value);
        }

        let superset: BTreeSet<String> = partitions
            .values()
            .flat_map(|dataset| dataset.keys().cloned())
            .collect();

        Ok((superset.into_iter().collect(), partitions))
    }
}

/// Validated like [`SparkGraph`]; rendering is not implemented yet, and
/// [`HistGraph::render`] says so with a typed error.
#[derive(Debug)]
pub struct HistGraph {
    query: String,
}

impl HistGraph {
    fn new(query: &str, columns: &[String], config: &GraphConfig) -> Result<HistGraph, GraphError> {
        declared_axis(query, columns, config, "hist", 2)?;

        Ok(HistGraph {
            query: query.to_owned(),
        })
    }

    fn render(&self, _rows: &[Row]) -> Result<String, GraphError> {
        Err(GraphError::HistUnimplemented {
            query: self.query.clone(),
        })
    }
}

/// Shared validation for the axis-driven graphs: the column count must match
/// and the configured axis must name one of the columns.
fn declared_axis(
    query: &str,
    columns: &[String],
    config: &GraphConfig,
    graph: &'static str,
    expected: usize,
) -> Result<String, GraphError> {
    if columns.len() != expected {
        return Err(GraphError::WrongColumnCount {
            query: query.to_owned(),
            graph,
            expected,
            found: columns.len(),
        });
    }

    let axis = config.axis.clone().ok_or_else(|| GraphError::MissingAxis {
        query: query.to_owned(),
        graph,
    })?;

    if !columns.contains(&axis) {
        return Err(GraphError::AxisNotFound {
            query: query.to_owned(),
            axis,
            columns: columns.to_vec(),
        });
    }

    Ok(axis)
}

fn cell(row: &Row, column: &str) -> String {
    row.get(column).map(Value::to_string).unwrap_or_default()
}

fn axis_value(row: &Row, axis: &str) -> Result<f64, GraphError> {
    let value = row.get(axis).cloned().unwrap_or(Value::Null);

    value.as_f64().ok_or_else(|| GraphError::NonNumericValue {
        column: axis.to_owned(),
        value: value.to_string(),
    })
}

fn axis_values(rows: &[Row], axis: &str) -> Result<Vec<f64>, GraphError> {
    rows.iter().map(|row| axis_value(row, axis)).collect()
}

// Colored labels would break both grouping and alignment, so any terminal
// escapes (plus tabs and newlines) are stripped before partitioning.
static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\x1b[^m]*m)|\n|\t").expect("the markup pattern is valid"));

fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, "").into_owned()
}
