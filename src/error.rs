//! Error types for the layout editor
//!
//! Nothing in here is fatal to the process. Asset failures become user notices,
//! a missing spatial context is swallowed by the public handlers, and a blocked
//! placement is not an error at all (see [`crate::editor::PlacementOutcome`]).

use std::path::PathBuf;
use thiserror::Error;

use crate::store::PrototypeKind;

/// Failure of the asynchronous prototype load capability
#[derive(Error, Debug)]
pub enum AssetLoadError {
    #[error("no model configured for prototype '{0}'")]
    MissingModel(PrototypeKind),

    #[error("failed to load OBJ model {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ model {0} contains no meshes")]
    EmptyModel(PathBuf),

    #[error("prototype load was abandoned before it completed")]
    Abandoned,
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("asset load failed: {0}")]
    AssetLoad(#[from] AssetLoadError),

    /// Scene, camera or ground not initialised yet (mount/unmount window)
    #[error("spatial context is not available")]
    MissingSpatialContext,

    #[error("layout file {path}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("layout format error: {0}")]
    LayoutFormat(#[from] serde_json::Error),

    #[error("surface error: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
