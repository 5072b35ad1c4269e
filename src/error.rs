use crate::engine::graph::GraphError;
use crate::engine::template::TemplateError;
use crate::engine::QueryError;
use crate::markfile::MarkfileError;
use mysql::Error as MySqlError;
use thiserror::Error;

/// Boxing the error kind keeps Result<T, Error> small; some of the variants
/// (notably the Pest ones) are pretty hefty.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(value: E) -> Self {
        Error(Box::new(value.into()))
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{0}")]
    Template(#[from] TemplateError),
    #[error("{0}")]
    Query(#[from] QueryError),
    #[error("{0}")]
    Graph(#[from] GraphError),
    #[error("{0}")]
    Markfile(#[from] MarkfileError),
    /// Errors originating from the MySQL library
    #[error("Error trying to query database:\n{0}")]
    MySql(#[from] MySqlError),
    #[error("IO error:\n{0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error:\n{0}")]
    Json(#[from] serde_json::Error),
    #[error("Error reading data from stdin")]
    Dialogue(#[from] dialoguer::Error),
}

impl Error {
    pub fn into_inner(self) -> ErrorKind {
        *self.0
    }
}
