//! IR Handles
//!
//! Identifiers and shared cells used to link operations and expressions across phases.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{PipelineError, Result};

/// Cross-reference ID. Minted once per logical entity (element, view, variable, i18n context,
/// temporary) by the owning job, and used in place of pointers between operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XrefId(pub usize);

impl XrefId {
    pub fn new(id: usize) -> Self {
        XrefId(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// Index into a component's consts array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstIndex(pub usize);

impl ConstIndex {
    pub fn new(index: usize) -> Self {
        ConstIndex(index)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// A write-once slot index shared by every operation and expression that refers to the same
/// declaration. Cloning a handle shares the cell, so the assignment made by slot allocation is
/// visible through all clones.
#[derive(Clone, Default)]
pub struct SlotHandle {
    cell: Arc<OnceCell<usize>>,
}

impl SlotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The assigned slot, or `None` before slot allocation.
    pub fn slot(&self) -> Option<usize> {
        self.cell.get().copied()
    }

    /// The assigned slot. Reading before assignment is an invariant violation.
    pub fn get(&self) -> Result<usize> {
        self.slot().ok_or(PipelineError::SlotUnset)
    }

    pub fn assign(&self, slot: usize) -> Result<()> {
        self.cell.set(slot).map_err(|attempted| PipelineError::SlotReassigned {
            existing: self.slot().unwrap_or(attempted),
            attempted,
        })
    }

    /// Whether both handles share one cell.
    pub fn same_as(&self, other: &SlotHandle) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot() {
            Some(slot) => write!(f, "SlotHandle({})", slot),
            None => write!(f, "SlotHandle(unset)"),
        }
    }
}
