//! # heapscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the heapscope library. Import this module to get quick access to the essential
//! types for heap dump analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all heapscope operations
pub use crate::Error;

/// The result type used throughout heapscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for heap dump analysis
pub use crate::{HeapDump, HeapSummary};

/// Low-level file and buffer backends
pub use crate::file::{Backend, Memory, Physical};

// ================================================================================================
// Index and Build Control
// ================================================================================================

/// The frozen, query-ready index and its tables
pub use crate::index::{ClassInfo, ClassTable, HeapIndex, ObjectEntry, ObjectKind, ObjectTable};

/// Build options, progress reporting, and cancellation
pub use crate::index::{CancelToken, LoadOptions, NullProgress, Progress};

/// A directed edge in query results
pub use crate::index::ReferenceEdge;

// ================================================================================================
// Format Types
// ================================================================================================

/// GC root declarations and their provenance
pub use crate::format::{GcRoot, GcRootKind};

/// Header and version information
pub use crate::format::{DumpHeader, HprofVersion};

// ================================================================================================
// Graph Analyses
// ================================================================================================

/// Dominator tree with retained sizes
pub use crate::graph::DominatorTree;

// ================================================================================================
// Fragments and Environment
// ================================================================================================

/// Guest-language projections of polyglot heaps
pub use crate::fragment::HeapFragment;

/// Source-model inspection SPI
pub use crate::inspection::{NullSourceInspection, SourceInspection};

/// Load-time diagnostics
pub use crate::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
