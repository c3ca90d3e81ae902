//! Core IR and control-flow structuring for the resurface decompiler.
//!
//! Front-ends lift disassembled procedures into the block-based IR in
//! [`ir`]; the [`structure`] pass then recovers loops, multi-way and
//! two-way selection and compound boolean conditions from each procedure's
//! CFG and derived interval sequence, annotating blocks in place for the
//! back-end to emit structured source.

pub mod entity;
pub mod error;
pub mod ir;
pub mod pipeline;
pub mod structure;

pub use error::CoreError;
pub use ir::{Procedure, Program};
pub use structure::{structure, StructurePass};
