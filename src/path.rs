//! Hierarchical addressing of nested workflow instances.
//!
//! A [`WorkflowPath`] is a chain of node ids, written `id>id>...>id` on the
//! wire, tracing a descent from the outermost workflow through zero or more
//! nested sub-workflow instances to the node being addressed. Two paths that
//! end in the same node id but differ in ancestry address *different*
//! run-state entries: the same sub-workflow definition invoked from two call
//! sites has independent execution state at each site.
//!
//! # Examples
//!
//! ```rust
//! use flowsync::path::WorkflowPath;
//! use flowsync::types::ServiceId;
//!
//! let path: WorkflowPath = "12>45>7".parse().unwrap();
//! assert_eq!(path.tip(), ServiceId(7));
//! assert_eq!(path.parent().unwrap().to_string(), "12>45");
//! assert_eq!(path.depth(), 2);
//! assert!(WorkflowPath::root(ServiceId(12)).is_ancestor_of(&path));
//! ```

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::ServiceId;

/// Separator between node ids in the wire form of a path.
pub const PATH_SEPARATOR: char = '>';

/// Errors raised while decoding a path string.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    /// The path string contained no segments.
    #[error("empty workflow path")]
    #[diagnostic(
        code(flowsync::path::empty),
        help("A path needs at least the outermost workflow's node id.")
    )]
    Empty,

    /// A segment was not a valid node id.
    #[error("invalid path segment {segment:?}")]
    #[diagnostic(
        code(flowsync::path::invalid_segment),
        help("Path segments are the numeric ids of the traversed nodes.")
    )]
    InvalidSegment { segment: String },
}

/// A `>`-delimited chain of node ids addressing a nested display/run context.
///
/// The first segment is the outermost workflow; the last segment
/// ([`tip`](Self::tip)) is the node currently addressed. A path always has
/// at least one segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct WorkflowPath {
    segments: Vec<ServiceId>,
}

impl WorkflowPath {
    /// Path addressing a top-level workflow with no nesting.
    #[must_use]
    pub fn root(workflow_node: ServiceId) -> Self {
        WorkflowPath {
            segments: vec![workflow_node],
        }
    }

    /// Build a path from explicit segments.
    ///
    /// Returns [`PathError::Empty`] when `segments` is empty.
    pub fn from_segments(segments: Vec<ServiceId>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(WorkflowPath { segments })
    }

    /// The traversed node ids, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[ServiceId] {
        &self.segments
    }

    /// The trailing node id: the node this path addresses.
    #[must_use]
    pub fn tip(&self) -> ServiceId {
        *self.segments.last().expect("path is never empty")
    }

    /// Nesting depth below the outermost workflow (0 for a root path).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    /// The enclosing context, or `None` for a root path.
    #[must_use]
    pub fn parent(&self) -> Option<WorkflowPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(WorkflowPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Descend into the node `child`, producing the nested path.
    #[must_use]
    pub fn child(&self, child: ServiceId) -> WorkflowPath {
        let mut segments = self.segments.clone();
        segments.push(child);
        WorkflowPath { segments }
    }

    /// Whether `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &WorkflowPath) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for WorkflowPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

impl FromStr for WorkflowPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = s
            .split(PATH_SEPARATOR)
            .map(|seg| {
                seg.parse::<i64>()
                    .map(ServiceId)
                    .map_err(|_| PathError::InvalidSegment {
                        segment: seg.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        WorkflowPath::from_segments(segments)
    }
}

impl From<WorkflowPath> for String {
    fn from(path: WorkflowPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for WorkflowPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
