use crate::capabilities::PlacementMode;
use crate::filter::BuildStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something the builder skipped on purpose during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A qualified filter pair loaded no entities and contributed no nodes.
    EmptyResult {
        catalog: Option<String>,
        schema: Option<String>,
    },

    /// A procedure arrived while neither catalogs nor schemas are supported.
    UnplaceableProcedure { name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyResult { catalog, schema } => write!(
                f,
                "no entities loaded for catalog {} / schema {}",
                catalog.as_deref().unwrap_or("<none>"),
                schema.as_deref().unwrap_or("<none>")
            ),
            Diagnostic::UnplaceableProcedure { name } => write!(
                f,
                "procedure {} dropped: dialect supports neither catalogs nor schemas",
                name
            ),
        }
    }
}

/// Summary of one reverse-engineering run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub strategy: Option<BuildStrategy>,
    pub placement: PlacementMode,

    /// Entity nodes created.
    pub entities: usize,

    /// Column nodes created.
    pub columns: usize,

    /// Procedure leaves created.
    pub procedures: usize,

    /// Catalog and schema nodes created.
    pub namespaces: usize,

    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    pub fn new(placement: PlacementMode) -> Self {
        Self {
            strategy: None,
            placement,
            entities: 0,
            columns: 0,
            procedures: 0,
            namespaces: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("[REVERSE] {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn dropped_procedures(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnplaceableProcedure { .. }))
            .count()
    }

    pub fn empty_results(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::EmptyResult { .. }))
            .count()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities, {} columns, {} procedures, {} namespaces ({} placement",
            self.entities,
            self.columns,
            self.procedures,
            self.namespaces,
            self.placement.display_name()
        )?;

        if let Some(strategy) = self.strategy {
            write!(f, ", {} build", strategy.display_name())?;
        }

        write!(f, ")")?;

        if !self.diagnostics.is_empty() {
            write!(f, ", {} diagnostics", self.diagnostics.len())?;
        }

        Ok(())
    }
}
