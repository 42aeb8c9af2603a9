//! Network-subsystem error types.
//!
//! Loading and querying fail for unrelated reasons, so they get separate
//! enums: a `LoadError` aborts a load and leaves the previous snapshot in
//! place, while a `QueryError` is an invalid argument to a single query.
//! "No path" is not an error at all; it is an empty [`Route`](crate::Route).

use std::path::PathBuf;

use thiserror::Error;

use rn_core::{CoreError, NodeId, RoadId};

/// Errors that abort a load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: {source}")]
    Csv {
        file:   &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{file} line {line}: {message}")]
    Parse {
        file:    &'static str,
        line:    u64,
        message: String,
    },

    #[error("duplicate node {0}")]
    DuplicateNode(NodeId),

    #[error("segment of {road} references unknown node {node}")]
    MissingNode { road: RoadId, node: NodeId },

    #[error("segment references {0}, which has no road info")]
    MissingRoad(RoadId),

    #[error(transparent)]
    Config(#[from] CoreError),
}

/// Errors returned by individual queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("node {0} not found in network")]
    UnknownNode(NodeId),
}

pub type LoadResult<T> = Result<T, LoadError>;
pub type QueryResult<T> = Result<T, QueryError>;
