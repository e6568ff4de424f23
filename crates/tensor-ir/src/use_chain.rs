//! Use-chains: for every value, the list of operand records consuming it.
//!
//! Each value keeps the head of an intrusive doubly-linked list threaded
//! through its [`OperandData`] records. New uses are prepended, so a
//! traversal visits the most recently created consumer first. Unlinking a
//! record is an O(1) splice that needs no search.

use std::iter::FusedIterator;

use cranelift_entity::PrimaryMap;
use cranelift_entity::packed_option::PackedOption;
use smallvec::SmallVec;

use crate::context::{IrContext, OperandData};
use crate::refs::{OpRef, OperandRef, ValueRef};

/// One consumer of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Use {
    pub operand: OperandRef,
    pub user: OpRef,
    pub operand_index: u32,
}

/// Iterator over the uses of a value, most recent first.
#[derive(Clone)]
pub struct Uses<'a> {
    operands: &'a PrimaryMap<OperandRef, OperandData>,
    next: Option<OperandRef>,
}

impl Iterator for Uses<'_> {
    type Item = Use;

    fn next(&mut self) -> Option<Use> {
        let current = self.next?;
        let data = &self.operands[current];
        self.next = data.next_use.expand();
        Some(Use {
            operand: current,
            user: data.owner,
            operand_index: data.index,
        })
    }
}

impl FusedIterator for Uses<'_> {}

impl IrContext {
    // ========================================================================
    // Linking
    // ========================================================================

    /// Prepend `operand` to the use-chain of the value it refers to.
    pub(crate) fn link_use(&mut self, operand: OperandRef) {
        let value = self.operands[operand].value;
        let old_head = self.values[value].first_use;

        let data = &mut self.operands[operand];
        debug_assert!(!data.linked, "link_use: {operand} is already linked");
        data.prev_use = PackedOption::default();
        data.next_use = old_head;
        data.linked = true;

        if let Some(head) = old_head.expand() {
            self.operands[head].prev_use = operand.into();
        }
        self.values[value].first_use = operand.into();
    }

    /// Splice `operand` out of its value's use-chain.
    pub(crate) fn unlink_use(&mut self, operand: OperandRef) {
        let data = &self.operands[operand];
        assert!(
            data.linked,
            "unlink_use: {operand} is not linked into a use-chain"
        );
        let (value, prev, next) = (data.value, data.prev_use, data.next_use);

        match prev.expand() {
            Some(prev) => self.operands[prev].next_use = next,
            None => {
                debug_assert_eq!(self.values[value].first_use.expand(), Some(operand));
                self.values[value].first_use = next;
            }
        }
        if let Some(next) = next.expand() {
            self.operands[next].prev_use = prev;
        }

        let data = &mut self.operands[operand];
        data.prev_use = PackedOption::default();
        data.next_use = PackedOption::default();
        data.linked = false;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get immutable reference to an operand record.
    pub fn operand(&self, operand: OperandRef) -> &OperandData {
        &self.operands[operand]
    }

    /// Head of the use-chain of `v`, i.e. its most recent use.
    pub fn first_use(&self, v: ValueRef) -> Option<OperandRef> {
        self.values[v].first_use.expand()
    }

    /// The use following `operand` in its value's chain.
    pub fn next_use(&self, operand: OperandRef) -> Option<OperandRef> {
        self.operands[operand].next_use.expand()
    }

    pub fn operand_owner(&self, operand: OperandRef) -> OpRef {
        self.operands[operand].owner
    }

    pub fn operand_index(&self, operand: OperandRef) -> u32 {
        self.operands[operand].index
    }

    pub fn operand_value(&self, operand: OperandRef) -> ValueRef {
        self.operands[operand].value
    }

    /// Iterate over the uses of `v`, most recent first.
    pub fn uses(&self, v: ValueRef) -> Uses<'_> {
        Uses {
            operands: &self.operands,
            next: self.first_use(v),
        }
    }

    /// Operations consuming `v`. An operation consuming `v` twice is yielded twice.
    pub fn users(&self, v: ValueRef) -> impl Iterator<Item = OpRef> + '_ {
        self.uses(v).map(|u| u.user)
    }

    pub fn has_uses(&self, v: ValueRef) -> bool {
        self.first_use(v).is_some()
    }

    pub fn has_one_use(&self, v: ValueRef) -> bool {
        let mut uses = self.uses(v);
        uses.next().is_some() && uses.next().is_none()
    }

    /// Number of uses of `v`. Walks the whole chain.
    pub fn use_count(&self, v: ValueRef) -> usize {
        self.uses(v).count()
    }

    // ========================================================================
    // Rewiring
    // ========================================================================

    /// Make operand `index` of `op` consume `value` instead.
    ///
    /// # Panics
    ///
    /// Panics if `op` is destroyed, `index` is out of range, or the defining
    /// operation of `value` was destroyed.
    pub fn set_operand(&mut self, op: OpRef, index: u32, value: ValueRef) {
        let operand = self.op_operand(op, index);
        assert!(
            self.is_value_live(value),
            "set_operand: {value} belongs to a destroyed operation"
        );
        if self.operands[operand].value == value {
            return;
        }

        self.unlink_use(operand);
        self.operands[operand].value = value;
        self.link_use(operand);

        tracing::trace!("set_operand: {op} operand #{index} now uses {value}");
        self.run_expensive_checks("set_operand");
    }

    /// Redirect every use of `old` to `new`.
    ///
    /// The moved uses keep their relative order and end up in front of the
    /// uses `new` already had. Afterwards `old` has no uses.
    ///
    /// # Panics
    ///
    /// Panics if the defining operation of `new` was destroyed.
    pub fn replace_all_uses(&mut self, old: ValueRef, new: ValueRef) {
        if old == new {
            return;
        }
        assert!(
            self.is_value_live(new),
            "replace_all_uses: replacement {new} belongs to a destroyed operation"
        );

        let moved: SmallVec<[OperandRef; 8]> = self.uses(old).map(|u| u.operand).collect();
        // Prepending in reverse keeps their relative order at the new head.
        for &operand in moved.iter().rev() {
            self.unlink_use(operand);
            self.operands[operand].value = new;
            self.link_use(operand);
        }

        tracing::debug!(
            "replace_all_uses: moved {} use(s) from {old} to {new}",
            moved.len()
        );
        self.run_expensive_checks("replace_all_uses");
    }
}
