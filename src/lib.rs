//! Runs named, parameterized SQL queries from a "markfile" and graphs the results
//! in your terminal.
//!
//! A markfile holds a bunch of query templates like `select day, count(1) as count
//! from errors where day > [days]`. You then run them from the command line as
//! `mark errors:7` and get back a table or a sparkline, depending on what the
//! markfile says about each query.
//!
//! The pipeline is: parse the call string, extract the template's variables, bind
//! the call's values to them, render the final SQL, check it's a select and pull
//! out its column list, run it, and hand the rows to a graph.
pub mod db;
mod engine;
mod error;
pub mod markfile;

pub use engine::call::ArgumentCall;
pub use engine::graph::{Graph, GraphError};
pub use engine::template::{bind, Filter, TemplateEngine, TemplateError, TemplateVariable};
pub use engine::{compile, query_listing, CompiledQuery, QueryError, Row, Value};
pub use error::{Error, ErrorKind};
