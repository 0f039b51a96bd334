use crate::model::ElementKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Inspection failed: {0}")]
    InspectionFailed(String),

    #[error("Inspection timed out")]
    Timeout,

    #[error("Inspection cancelled")]
    Cancelled,

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{} cannot be placed under {}", .child.display_name(), parent_label(.parent))]
    InvalidHierarchy {
        parent: Option<ElementKind>,
        child: ElementKind,
    },

    #[error("Invalid element: {0}")]
    InvalidElement(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DbError {
    pub fn inspection_failed(message: impl Into<String>) -> Self {
        DbError::InspectionFailed(message.into())
    }
}

fn parent_label(parent: &Option<ElementKind>) -> &'static str {
    parent.map(|kind| kind.display_name()).unwrap_or("Root")
}
