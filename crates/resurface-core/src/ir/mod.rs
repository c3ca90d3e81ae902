pub mod block;
pub mod builder;
pub mod expr;
pub mod icode;
pub mod interval;
pub mod printer;
pub mod proc;
pub mod program;

pub use block::{BasicBlock, BlockId, LoopType, NodeType, Traversed, ELSE, THEN};
pub use builder::CfgBuilder;
pub use expr::{BoolOp, CmpKind, Cond, Operand};
pub use icode::{HlIcode, Icode, IcodeStore, JX_LOOP};
pub use interval::{DerivedSeq, Interval, IntervalId, IntervalNode};
pub use printer::ProcPrinter;
pub use proc::Procedure;
pub use program::{ProcId, Program};
