//! The query pipeline: template rendering, call binding, select-list
//! validation, and graphing.
pub mod call;
pub mod graph;
mod rendering;
mod select;
pub mod template;

use crate::engine::call::ArgumentCall;
use crate::engine::template::{bind, TemplateEngine, TemplateError};
use crate::markfile::{Markfile, QuerySpec};
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The fully rendered SQL for one invocation, plus the columns it selects.
///
/// The column list is what the graphs are built against, so it has to come out
/// of the *rendered* text, after every `[variable]` has been substituted.
#[derive(Debug)]
pub struct CompiledQuery {
    pub sql: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Query `{query}` requires missing `{variable}` parameter.")]
    MissingParameter { query: String, variable: String },
    #[error("Query `{query}` is not a select query; only select queries are allowed.")]
    NotASelect { query: String },
    #[error("Query `{query}` must begin with the column names to select.")]
    MissingColumns { query: String },
    #[error("No columns are selected in query `{query}`.")]
    NoColumns { query: String },
}

/// Renders a query spec against a command-line call and validates the result.
///
/// Binding never fails on its own: leftover call values are ignored, and holes
/// only surface once rendering hits the first unresolved `[variable]` in the
/// template. That failure is reported against the query, since from the user's
/// point of view it's the query that is missing a parameter.
pub fn compile(
    name: &str,
    spec: &QuerySpec,
    call: &ArgumentCall,
) -> Result<CompiledQuery, crate::Error> {
    let engine = TemplateEngine::new();

    let variables = engine.extract_variables(&spec.query)?;

    let mut positional = call.positional.clone();
    let mut keyword = call.keyword.clone();
    let context = bind(&variables, &mut positional, &mut keyword);

    let sql = match engine.render(&spec.query, &context) {
        Ok(sql) => sql,
        Err(TemplateError::MissingVariable { name: variable }) => {
            return Err(QueryError::MissingParameter {
                query: name.to_owned(),
                variable,
            }
            .into())
        }
        Err(other) => return Err(other.into()),
    };

    let columns = select::parse_query_columns(name, &sql)?;

    Ok(CompiledQuery { sql, columns })
}

/// Lists every query in the markfile by name and parameters, one per line,
/// sorted so the queries taking the fewest parameters come first.
///
/// The name column is right-aligned and each parameter cell is centered, with
/// all cells at a given index sharing a width. Laborious, but readable.
pub fn query_listing(markfile: &Markfile) -> Result<String, crate::Error> {
    let engine = TemplateEngine::new();

    let mut listing: Vec<Vec<String>> = Vec::new();
    for (name, spec) in &markfile.queries {
        let variables = engine.extract_variables(&spec.query)?;

        let mut row = vec![name.clone()];
        row.extend(variables.into_iter().map(|variable| variable.name));
        listing.push(row);
    }

    listing.sort_by_key(Vec::len);

    let widths = rendering::indexed_maximums(&listing);

    let mut out = String::new();
    for row in listing {
        let (name, parameters) = row
            .split_first()
            .expect("every listing row starts with the query name");

        out.push_str(&rendering::pad(name, widths[0], rendering::Alignment::Right));
        for (idx, parameter) in parameters.iter().enumerate() {
            out.push(' ');
            out.push('[');
            out.push_str(&rendering::pad(
                parameter,
                widths[idx + 1],
                rendering::Alignment::Center,
            ));
            out.push(']');
        }
        out.push('\n');
    }

    Ok(out)
}

/// One result row: column name to value, in the order the query declared them.
pub type Row = IndexMap<String, Value>;

/// A scalar cell value as it comes back from the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value, used by the sparkline graphs.
    ///
    /// Text is included because drivers hand decimal and computed columns back
    /// as strings more often than not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Integer(number) => Some(*number as f64),
            Value::Float(number) => Some(*number),
            Value::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            // NULL cells render as empty table cells
            Value::Null => Ok(()),
            Value::Integer(number) => write!(f, "{}", number),
            Value::Float(number) => write!(f, "{}", number),
            Value::Text(text) => write!(f, "{}", text),
        }
    }
}
