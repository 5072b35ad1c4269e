//! Loading and navigating the markfile.
//!
//! A markfile is a JSON document with one `config` block describing the
//! database connection, and one entry per query:
//!
//! ```json
//! {
//!     "config": {"host": "db.local", "port": 3306, "user": "me", "name": "app"},
//!     "errors": {
//!         "query": "select day, count(1) as count from errors where day > [days] group by day",
//!         "graph": {"type": "spark", "axis": "count"}
//!     }
//! }
//! ```
//!
//! Like git does with its repositories, the markfile is looked up in the
//! current directory and then every parent, so `mark` works from anywhere
//! inside a project.
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkfileError {
    #[error("Markfile `{name}` could not be found in `{start}` or any parent directory.")]
    NotFound { name: String, start: String },
    #[error("Error reading markfile `{path}`:\n{source}")]
    Unreadable {
        path: String,
        source: serde_json::Error,
    },
    #[error("Query `{name}` was not found in markfile.")]
    UnknownQuery { name: String },
}

#[derive(Debug, Deserialize)]
pub struct Markfile {
    pub config: DbConfig,
    /// Every top-level key other than `config` is a query spec. IndexMap
    /// keeps them in file order, which is the order listings fall back to.
    #[serde(flatten)]
    pub queries: IndexMap<String, QuerySpec>,
}

#[derive(Debug, Deserialize)]
pub struct QuerySpec {
    pub query: String,
    pub graph: Option<GraphConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub axis: Option<String>,
    pub partition: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Optional on purpose; markfiles get committed, passwords shouldn't be.
    /// The binary prompts when this is absent.
    pub pass: Option<String>,
    /// The database name.
    pub name: String,
}

impl Markfile {
    /// Searches the current directory and its parents for the named markfile.
    pub fn find(name: &str) -> Result<PathBuf, crate::Error> {
        let start = std::env::current_dir()?;

        find_from(name, &start)
    }

    pub fn load(path: &Path) -> Result<Markfile, crate::Error> {
        let raw = fs::read_to_string(path)?;

        let markfile =
            serde_json::from_str(&raw).map_err(|source| MarkfileError::Unreadable {
                path: path.display().to_string(),
                source,
            })?;

        Ok(markfile)
    }

    pub fn spec(&self, name: &str) -> Result<&QuerySpec, crate::Error> {
        self.queries
            .get(name)
            .ok_or_else(|| {
                MarkfileError::UnknownQuery {
                    name: name.to_owned(),
                }
                .into()
            })
    }
}

fn find_from(name: &str, start: &Path) -> Result<PathBuf, crate::Error> {
    let mut dir = start;

    loop {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(MarkfileError::NotFound {
                    name: name.to_owned(),
                    start: start.display().to_string(),
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE: &str = r#"{
        "config": {"host": "db.local", "port": 3306, "user": "me", "pass": "s3cret", "name": "app"},
        "errors": {
            "query": "select day, count from errors where day > [days]",
            "graph": {"type": "spark", "axis": "count", "minimum": 0}
        },
        "users": {"query": "select id, name from users"}
    }"#;

    #[test]
    fn markfiles_parse_config_and_queries() {
        let markfile: Markfile = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(markfile.config.host, "db.local");
        assert_eq!(markfile.config.pass.as_deref(), Some("s3cret"));
        assert_eq!(markfile.queries.len(), 2);

        let graph = markfile.queries["errors"].graph.as_ref().unwrap();
        assert_eq!(graph.kind, "spark");
        assert_eq!(graph.axis.as_deref(), Some("count"));
        assert_eq!(graph.minimum, Some(0.0));
        assert!(markfile.queries["users"].graph.is_none());
    }

    #[test]
    fn missing_queries_are_reported_by_name() {
        let markfile: Markfile = serde_json::from_str(SAMPLE).unwrap();

        let error = markfile.spec("nope").unwrap_err();

        assert!(matches!(
            error.into_inner(),
            ErrorKind::Markfile(MarkfileError::UnknownQuery { name }) if name == "nope"
        ));
    }

    #[test]
    fn the_search_walks_up_to_parent_directories() {
        let root = std::env::temp_dir().join("rusty-mark-find-test");
        let nested = root.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join("markfile.json"), "{}").unwrap();

        let found = find_from("markfile.json", &nested).unwrap();

        assert_eq!(found, root.join("markfile.json"));
    }

    #[test]
    fn a_missing_markfile_is_an_error() {
        let error = find_from("no-such-markfile-zzz.json", Path::new("/")).unwrap_err();

        assert!(matches!(
            error.into_inner(),
            ErrorKind::Markfile(MarkfileError::NotFound { .. })
        ));
    }
}
