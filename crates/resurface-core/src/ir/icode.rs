use serde::{Deserialize, Serialize};

use super::expr::{Cond, Operand};

/// Low-level flag bit marking the conditional jump that closes a structured
/// loop: the header's jump for a pre-test loop, the latch's for a post-test
/// loop. The two-way structurer uses it to leave loop branches alone.
pub const JX_LOOP: u32 = 0x0020_0000;

/// High-level statement lifted onto a low-level instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HlIcode {
    /// `dst = src`.
    Asgn { dst: Operand, src: Operand },
    /// Conditional jump on a boolean expression. The expression slot is
    /// emptied and refilled when compound conditions are merged.
    Jcond(Cond),
    /// Return, with an optional value.
    Ret(Option<Operand>),
}

/// One disassembled instruction: its low-level flag word plus the high-level
/// statement lifted onto it, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Icode {
    pub ll_flags: u32,
    pub hl: Option<HlIcode>,
}

impl Icode {
    pub fn jcond(cond: Cond) -> Self {
        Icode {
            ll_flags: 0,
            hl: Some(HlIcode::Jcond(cond)),
        }
    }
}

/// The per-procedure instruction store. Basic blocks address it through
/// their `start`/`len` window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IcodeStore {
    icodes: Vec<Icode>,
}

impl IcodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.icodes.len()
    }

    pub fn push(&mut self, icode: Icode) -> usize {
        self.icodes.push(icode);
        self.icodes.len() - 1
    }

    pub fn set_ll_flag(&mut self, idx: usize, flag: u32) {
        self.icodes[idx].ll_flags |= flag;
    }

    pub fn ll_flag(&self, idx: usize) -> u32 {
        self.icodes[idx].ll_flags
    }

    /// Number of instructions in `start..start + len` carrying a lifted
    /// high-level statement.
    pub fn hl_count(&self, start: usize, len: usize) -> usize {
        self.icodes[start..start + len]
            .iter()
            .filter(|ic| ic.hl.is_some())
            .count()
    }

    /// The boolean expression of the conditional jump at `idx`, if any.
    pub fn cond(&self, idx: usize) -> Option<&Cond> {
        match &self.icodes[idx].hl {
            Some(HlIcode::Jcond(c)) => Some(c),
            _ => None,
        }
    }

    /// Take the boolean expression out of a conditional jump, leaving the
    /// slot empty. Panics if the instruction is not a `Jcond`.
    pub fn take_cond(&mut self, idx: usize) -> Cond {
        match self.icodes[idx].hl.take() {
            Some(HlIcode::Jcond(c)) => c,
            other => panic!("expected a conditional jump at icode {idx}, found {other:?}"),
        }
    }

    /// Fill an empty slot with a conditional jump expression. Panics if the
    /// slot is already occupied.
    pub fn put_cond(&mut self, idx: usize, cond: Cond) {
        let slot = &mut self.icodes[idx].hl;
        assert!(
            slot.is_none(),
            "expression slot at icode {idx} already occupied"
        );
        *slot = Some(HlIcode::Jcond(cond));
    }
}
