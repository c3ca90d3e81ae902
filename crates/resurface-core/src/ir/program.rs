use serde::{Deserialize, Serialize};

use crate::define_entity;
use crate::entity::Arena;
use crate::error::CoreError;

use super::proc::Procedure;

define_entity! {
    /// Arena id of a procedure within a program.
    ProcId
}

/// A whole lifted program: an arena of procedures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub procs: Arena<ProcId, Procedure>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Program {
            name: name.into(),
            procs: Arena::new(),
        }
    }

    pub fn add_proc(&mut self, proc: Procedure) -> ProcId {
        self.procs.push(proc)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}
