//! Entity references for the operation graph and the interning context.
//!
//! Each ref type is a thin `u32` wrapper providing type-safe indexing
//! into `PrimaryMap` storage. Graph refs index into an `IrContext`,
//! attribute and type refs index into an `InternContext`.

use cranelift_entity::entity_impl;
use std::fmt;

/// Reference to an operation in the graph arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpRef(u32);
entity_impl!(OpRef, "op");

/// Reference to a value (an operation result or a block argument).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueRef(u32);
entity_impl!(ValueRef, "v");

/// Reference to an operand record: one edge in a value's use-chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperandRef(u32);
entity_impl!(OperandRef, "use");

/// Reference to a block (an operation container that owns block arguments).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(u32);
entity_impl!(BlockRef, "block");

/// Reference to an interned attribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrRef(u32);
entity_impl!(AttrRef, "attr");

/// Reference to an interned type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(u32);
entity_impl!(TypeRef, "ty");

/// Where a value is defined: either an operation result or a block argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueDef {
    /// Result of an operation at the given index.
    OpResult(OpRef, u32),
    /// Block argument at the given index.
    BlockArg(BlockRef, u32),
}

impl fmt::Display for ValueDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDef::OpResult(op, idx) => write!(f, "{}#{}", op, idx),
            ValueDef::BlockArg(block, idx) => write!(f, "{}#{}", block, idx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn entity_ref_display() {
        assert_eq!(format!("{}", OpRef::new(0)), "op0");
        assert_eq!(format!("{}", ValueRef::new(5)), "v5");
        assert_eq!(format!("{}", OperandRef::new(2)), "use2");
        assert_eq!(format!("{}", BlockRef::new(2)), "block2");
        assert_eq!(format!("{}", AttrRef::new(1)), "attr1");
        assert_eq!(format!("{}", TypeRef::new(3)), "ty3");
    }

    #[test]
    fn value_def_display() {
        let def = ValueDef::OpResult(OpRef::new(3), 6);
        assert_eq!(def.to_string(), "op3#6");
        let arg = ValueDef::BlockArg(BlockRef::new(0), 1);
        assert_eq!(arg.to_string(), "block0#1");
    }
}
