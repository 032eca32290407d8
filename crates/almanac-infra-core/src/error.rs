use thiserror::Error;

/// Errors raised while assembling a resource topology.
///
/// Any of these aborts construction of the whole assembly: a stack is never
/// emitted from a partially wired graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Duplicate resource id in stack {stack}: {id}")]
    DuplicateResource { stack: String, id: String },

    #[error("Edge in stack {stack} points at an undeclared resource: {id}")]
    UnknownResource { stack: String, id: String },

    #[error("Dependency cycle in stack {stack} between: {}", .resources.join(", "))]
    CycleDetected {
        stack: String,
        resources: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, TopologyError>;
