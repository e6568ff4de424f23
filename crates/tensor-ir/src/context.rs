//! IrContext: arena storage for the operation graph.
//!
//! Operations, values, operand records and blocks live in `PrimaryMap`s
//! owned by `IrContext`. Per-operation lists (operands, results, result
//! types) use `EntityList + ListPool` for compact 4-byte per-field storage.
//!
//! Graph edits take `&mut self`; callers serialize mutation of one graph.
//! Attributes and types are not stored here but in the shared
//! [`InternContext`] the graph was created with.
//!
//! Slots are never reused: a destroyed operation stays in the arena marked
//! [`OpState::Destroyed`], so a stale `OpRef` is caught on its next use
//! instead of aliasing a newer operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use cranelift_entity::packed_option::PackedOption;
use cranelift_entity::{EntityList, ListPool, PrimaryMap};
use smallvec::SmallVec;

use crate::attribute::AttrKind;
use crate::error::{IrError, IrResult};
use crate::intern::InternContext;
use crate::refs::*;
use crate::symbol::Symbol;

// ============================================================================
// Entity data types
// ============================================================================

/// Lifecycle of an operation. `Destroyed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpState {
    Live,
    Destroyed,
}

/// Data for a single operation in the arena.
pub struct OperationData {
    pub dialect: Symbol,
    pub name: Symbol,
    pub attributes: BTreeMap<Symbol, AttrRef>,
    pub parent_block: Option<BlockRef>,
    pub state: OpState,
    pub(crate) operands: EntityList<OperandRef>,
    pub(crate) results: EntityList<ValueRef>,
    pub(crate) result_types: EntityList<TypeRef>,
}

/// Data for a single value.
pub struct ValueData {
    pub def: ValueDef,
    pub ty: TypeRef,
    /// Head of the use-chain (most recently added use).
    pub(crate) first_use: PackedOption<OperandRef>,
}

/// One edge "`owner` consumes `value` at operand position `index`".
///
/// The record is owned by `owner`; `prev_use`/`next_use` thread it into the
/// doubly-linked use-chain of `value`.
pub struct OperandData {
    pub owner: OpRef,
    pub index: u32,
    pub value: ValueRef,
    pub(crate) prev_use: PackedOption<OperandRef>,
    pub(crate) next_use: PackedOption<OperandRef>,
    /// False once the owning operation has been destroyed.
    pub(crate) linked: bool,
}

/// Data for a block: an ordered container of operations with arguments.
pub struct BlockData {
    pub ops: SmallVec<[OpRef; 4]>,
    pub(crate) args: EntityList<ValueRef>,
}

// ============================================================================
// OperationBuilder
// ============================================================================

/// Everything needed to create an operation: inputs, attributes, output
/// types and an optional parent block.
pub struct OperationBuilder {
    dialect: Symbol,
    name: Symbol,
    operands: SmallVec<[ValueRef; 4]>,
    results: SmallVec<[TypeRef; 4]>,
    attributes: BTreeMap<Symbol, AttrRef>,
    parent: Option<BlockRef>,
}

impl OperationBuilder {
    pub fn new(dialect: impl Into<Symbol>, name: impl Into<Symbol>) -> Self {
        Self {
            dialect: dialect.into(),
            name: name.into(),
            operands: SmallVec::new(),
            results: SmallVec::new(),
            attributes: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn operand(mut self, v: ValueRef) -> Self {
        self.operands.push(v);
        self
    }

    pub fn operands(mut self, vs: impl IntoIterator<Item = ValueRef>) -> Self {
        self.operands.extend(vs);
        self
    }

    pub fn result(mut self, ty: impl Into<TypeRef>) -> Self {
        self.results.push(ty.into());
        self
    }

    pub fn results(mut self, tys: impl IntoIterator<Item = TypeRef>) -> Self {
        self.results.extend(tys);
        self
    }

    pub fn attr(mut self, key: impl Into<Symbol>, val: impl Into<AttrRef>) -> Self {
        self.attributes.insert(key.into(), val.into());
        self
    }

    pub fn attrs(mut self, attrs: impl IntoIterator<Item = (Symbol, AttrRef)>) -> Self {
        self.attributes.extend(attrs);
        self
    }

    /// Append the new operation to `block` once it is created.
    pub fn parent(mut self, block: BlockRef) -> Self {
        self.parent = Some(block);
        self
    }
}

// ============================================================================
// IrContext
// ============================================================================

/// Arena-based mutable operation graph.
///
/// Owns all graph entities and provides methods for creating, querying,
/// and mutating them. Use-chains are maintained on every edit.
pub struct IrContext {
    pub(crate) ops: PrimaryMap<OpRef, OperationData>,
    pub(crate) values: PrimaryMap<ValueRef, ValueData>,
    pub(crate) operands: PrimaryMap<OperandRef, OperandData>,
    pub(crate) blocks: PrimaryMap<BlockRef, BlockData>,

    interner: Arc<InternContext>,

    /// Backing pools for EntityList storage.
    operand_pool: ListPool<OperandRef>,
    value_pool: ListPool<ValueRef>,
    type_pool: ListPool<TypeRef>,
}

impl IrContext {
    /// Create an empty graph that interns into the process-wide registry.
    pub fn new() -> Self {
        Self::with_interner(InternContext::global())
    }

    /// Create an empty graph bound to a specific interning registry.
    pub fn with_interner(interner: Arc<InternContext>) -> Self {
        Self {
            ops: PrimaryMap::new(),
            values: PrimaryMap::new(),
            operands: PrimaryMap::new(),
            blocks: PrimaryMap::new(),
            interner,
            operand_pool: ListPool::new(),
            value_pool: ListPool::new(),
            type_pool: ListPool::new(),
        }
    }

    /// The registry holding this graph's attributes and types.
    pub fn interner(&self) -> &InternContext {
        &self.interner
    }

    // ========================================================================
    // Operation
    // ========================================================================

    /// Create a new operation, allocating one result value per output type
    /// and prepending one use to each input's use-chain.
    ///
    /// # Panics
    ///
    /// Panics if an operand refers to a value whose defining operation was
    /// destroyed, if a result type or attribute was not interned by this
    /// graph's interner, or if the parent block does not exist. These checks run
    /// before anything is allocated, so a failed call leaves the graph as it
    /// was.
    pub fn create_op(&mut self, builder: OperationBuilder) -> OpRef {
        for (idx, &v) in builder.operands.iter().enumerate() {
            assert!(
                self.values.is_valid(v),
                "create_op: operand #{idx} of {}.{} refers to unknown value {v}",
                builder.dialect,
                builder.name,
            );
            assert!(
                self.is_value_live(v),
                "create_op: operand #{idx} of {}.{} uses {v}, whose defining operation \
                 was destroyed",
                builder.dialect,
                builder.name,
            );
        }
        for (idx, &ty) in builder.results.iter().enumerate() {
            assert!(
                self.interner.owns_type(ty),
                "create_op: result #{idx} type {ty} of {}.{} does not belong to this graph's interner",
                builder.dialect,
                builder.name,
            );
        }
        for (key, &attr) in &builder.attributes {
            assert!(
                self.interner.owns_attr(attr),
                "create_op: attribute `{key}` ({attr}) of {}.{} does not belong to this graph's interner",
                builder.dialect,
                builder.name,
            );
        }
        if let Some(block) = builder.parent {
            assert!(
                self.blocks.is_valid(block),
                "create_op: parent {block} does not exist"
            );
        }

        let mut result_types = EntityList::new();
        for &ty in &builder.results {
            result_types.push(ty, &mut self.type_pool);
        }

        let op = self.ops.push(OperationData {
            dialect: builder.dialect,
            name: builder.name,
            attributes: builder.attributes,
            parent_block: None,
            state: OpState::Live,
            operands: EntityList::new(),
            results: EntityList::new(),
            result_types,
        });

        // Allocate result values
        let mut results = EntityList::new();
        for (idx, &ty) in builder.results.iter().enumerate() {
            let v = self.values.push(ValueData {
                def: ValueDef::OpResult(op, idx as u32),
                ty,
                first_use: PackedOption::default(),
            });
            results.push(v, &mut self.value_pool);
        }

        // Register operand uses
        let mut operands = EntityList::new();
        for (idx, &v) in builder.operands.iter().enumerate() {
            let operand = self.operands.push(OperandData {
                owner: op,
                index: idx as u32,
                value: v,
                prev_use: PackedOption::default(),
                next_use: PackedOption::default(),
                linked: false,
            });
            self.link_use(operand);
            operands.push(operand, &mut self.operand_pool);
        }

        let data = &mut self.ops[op];
        data.results = results;
        data.operands = operands;

        if let Some(block) = builder.parent {
            self.push_op(block, op);
        }

        tracing::trace!(
            "create_op: {op} = {} with {} operand(s), {} result(s)",
            self.describe_op(op),
            builder.operands.len(),
            builder.results.len(),
        );
        self.run_expensive_checks("create_op");
        op
    }

    /// Destroy an operation, unlinking its operands from their use-chains.
    ///
    /// # Panics
    ///
    /// Panics if the operation was already destroyed, or if any of its
    /// results still has a use. Consumers must be destroyed (or rewired)
    /// before their producers.
    pub fn destroy_op(&mut self, op: OpRef) {
        let data = &self.ops[op];
        assert!(
            data.state == OpState::Live,
            "destroy_op: {op} ({}.{}) was already destroyed",
            data.dialect,
            data.name,
        );

        for &v in data.results.as_slice(&self.value_pool) {
            if let Some(first) = self.values[v].first_use.expand() {
                let user = &self.operands[first];
                panic!(
                    "destroy_op: result {v} of {} still has {} use(s), first used by operand \
                     #{} of {}; destroy or rewire its consumers first",
                    self.describe_op(op),
                    self.use_count(v),
                    user.index,
                    self.describe_op(user.owner),
                );
            }
        }

        let operands: SmallVec<[OperandRef; 8]> =
            data.operands.as_slice(&self.operand_pool).into();
        for operand in operands {
            self.unlink_use(operand);
        }

        if let Some(block) = self.ops[op].parent_block {
            self.blocks[block].ops.retain(|o| *o != op);
        }

        tracing::trace!("destroy_op: {op} ({})", self.describe_op(op));

        let data = &mut self.ops[op];
        data.parent_block = None;
        data.attributes.clear();
        data.state = OpState::Destroyed;

        self.run_expensive_checks("destroy_op");
    }

    /// Get immutable reference to operation data.
    ///
    /// # Panics
    ///
    /// Panics if the operation was destroyed.
    pub fn op(&self, op: OpRef) -> &OperationData {
        let data = &self.ops[op];
        assert!(
            data.state == OpState::Live,
            "use of destroyed operation {op} ({}.{})",
            data.dialect,
            data.name,
        );
        data
    }

    pub fn is_op_live(&self, op: OpRef) -> bool {
        self.ops.is_valid(op) && self.ops[op].state == OpState::Live
    }

    /// All live operations, in creation order.
    pub fn ops(&self) -> impl Iterator<Item = OpRef> + '_ {
        self.ops
            .iter()
            .filter(|(_, data)| data.state == OpState::Live)
            .map(|(op, _)| op)
    }

    /// Fully qualified operation name, e.g. `test.op1`.
    pub fn op_name(&self, op: OpRef) -> String {
        let data = &self.ops[op];
        format!("{}.{}", data.dialect, data.name)
    }

    pub(crate) fn describe_op(&self, op: OpRef) -> String {
        format!("{} ({op})", self.op_name(op))
    }

    pub fn num_operands(&self, op: OpRef) -> usize {
        self.op(op).operands.len(&self.operand_pool)
    }

    pub fn num_results(&self, op: OpRef) -> usize {
        self.op(op).results.len(&self.value_pool)
    }

    /// Get the operand records of an operation as a slice.
    pub fn op_operands(&self, op: OpRef) -> &[OperandRef] {
        self.op(op).operands.as_slice(&self.operand_pool)
    }

    /// Get the i-th operand record of an operation.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn op_operand(&self, op: OpRef, index: u32) -> OperandRef {
        let operands = self.op_operands(op);
        assert!(
            (index as usize) < operands.len(),
            "operand index {index} out of range for {} with {} operand(s)",
            self.describe_op(op),
            operands.len(),
        );
        operands[index as usize]
    }

    /// Values consumed by an operation, in operand order.
    pub fn op_operand_values(&self, op: OpRef) -> SmallVec<[ValueRef; 4]> {
        self.op_operands(op)
            .iter()
            .map(|&o| self.operands[o].value)
            .collect()
    }

    /// Get all result values of an operation.
    pub fn op_results(&self, op: OpRef) -> &[ValueRef] {
        self.op(op).results.as_slice(&self.value_pool)
    }

    /// Get the i-th result value of an operation.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn op_result(&self, op: OpRef, index: u32) -> ValueRef {
        let results = self.op_results(op);
        assert!(
            (index as usize) < results.len(),
            "result index {index} out of range for {} with {} result(s)",
            self.describe_op(op),
            results.len(),
        );
        results[index as usize]
    }

    /// Get the output types of an operation as a slice.
    pub fn op_result_types(&self, op: OpRef) -> &[TypeRef] {
        self.op(op).result_types.as_slice(&self.type_pool)
    }

    pub fn op_attrs(&self, op: OpRef) -> &BTreeMap<Symbol, AttrRef> {
        &self.op(op).attributes
    }

    /// Look up an attribute by name.
    pub fn op_attr(&self, op: OpRef, name: impl Into<Symbol>) -> IrResult<AttrRef> {
        let name = name.into();
        self.op(op)
            .attributes
            .get(&name)
            .copied()
            .ok_or_else(|| IrError::attribute_not_found(self.describe_op(op), name))
    }

    /// Look up an attribute by name and downcast it to kind `K`.
    pub fn op_attr_as<K: AttrKind>(&self, op: OpRef, name: impl Into<Symbol>) -> IrResult<K> {
        let name = name.into();
        let attr = self.op_attr(op, name)?;
        K::cast(&self.interner, attr).ok_or_else(|| {
            let found = self.interner.with_attr(attr, |data| data.kind_name());
            IrError::attribute_kind_mismatch(name, K::KIND, found)
        })
    }

    /// Insert or overwrite an attribute.
    pub fn set_attr(&mut self, op: OpRef, name: impl Into<Symbol>, attr: impl Into<AttrRef>) {
        assert!(self.is_op_live(op), "set_attr: use of destroyed operation {op}");
        self.ops[op].attributes.insert(name.into(), attr.into());
    }

    // ========================================================================
    // Value
    // ========================================================================

    /// Get immutable reference to value data.
    pub fn value(&self, v: ValueRef) -> &ValueData {
        &self.values[v]
    }

    /// Get the type of a value.
    pub fn value_ty(&self, v: ValueRef) -> TypeRef {
        self.values[v].ty
    }

    /// Get the definition of a value.
    pub fn value_def(&self, v: ValueRef) -> ValueDef {
        self.values[v].def
    }

    /// The operation producing `v`, or `None` for block arguments.
    pub fn defining_op(&self, v: ValueRef) -> Option<OpRef> {
        match self.values[v].def {
            ValueDef::OpResult(op, _) => Some(op),
            ValueDef::BlockArg(..) => None,
        }
    }

    /// Result position of `v` in its defining operation.
    pub fn result_index(&self, v: ValueRef) -> Option<u32> {
        match self.values[v].def {
            ValueDef::OpResult(_, idx) => Some(idx),
            ValueDef::BlockArg(..) => None,
        }
    }

    /// False once the defining operation of `v` has been destroyed.
    pub fn is_value_live(&self, v: ValueRef) -> bool {
        match self.values[v].def {
            ValueDef::OpResult(op, _) => self.ops[op].state == OpState::Live,
            ValueDef::BlockArg(..) => true,
        }
    }

    // ========================================================================
    // Block
    // ========================================================================

    /// Create a new block and allocate argument values for it.
    pub fn create_block(&mut self, arg_types: impl IntoIterator<Item = TypeRef>) -> BlockRef {
        let block = self.blocks.push(BlockData {
            ops: SmallVec::new(),
            args: EntityList::new(),
        });

        let mut args = EntityList::new();
        for (idx, ty) in arg_types.into_iter().enumerate() {
            let v = self.values.push(ValueData {
                def: ValueDef::BlockArg(block, idx as u32),
                ty,
                first_use: PackedOption::default(),
            });
            args.push(v, &mut self.value_pool);
        }
        self.blocks[block].args = args;

        block
    }

    /// Get immutable reference to block data.
    pub fn block(&self, b: BlockRef) -> &BlockData {
        &self.blocks[b]
    }

    /// Get all block argument values.
    pub fn block_args(&self, b: BlockRef) -> &[ValueRef] {
        self.blocks[b].args.as_slice(&self.value_pool)
    }

    /// Get the i-th block argument value.
    pub fn block_arg(&self, b: BlockRef, index: u32) -> ValueRef {
        let args = self.block_args(b);
        assert!(
            (index as usize) < args.len(),
            "block argument index {index} out of range for {b} with {} argument(s)",
            args.len(),
        );
        args[index as usize]
    }

    pub fn block_ops(&self, b: BlockRef) -> &[OpRef] {
        &self.blocks[b].ops
    }

    /// Append an operation to the end of a block.
    ///
    /// # Panics
    ///
    /// Panics if the operation is destroyed or already belongs to a block.
    pub fn push_op(&mut self, block: BlockRef, op: OpRef) {
        if let Some(existing) = self.op(op).parent_block {
            panic!(
                "push_op: operation {op} already belongs to {existing}; \
                 a block owns each operation at most once",
            );
        }
        self.ops[op].parent_block = Some(block);
        self.blocks[block].ops.push(op);
    }

    // ========================================================================
    // Debug checks
    // ========================================================================

    #[cfg(feature = "expensive-checks")]
    pub(crate) fn run_expensive_checks(&self, after: &str) {
        let result = crate::validation::validate(self);
        assert!(result.is_ok(), "graph corrupted after {after}:\n{result}");
    }

    #[cfg(not(feature = "expensive-checks"))]
    #[inline(always)]
    pub(crate) fn run_expensive_checks(&self, _after: &str) {}
}

impl Default for IrContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Int32Attr, StrAttr};
    use crate::error::IrErrorKind;
    use crate::types::{Float32Type, Int64Type};

    fn isolated() -> IrContext {
        IrContext::with_interner(Arc::new(InternContext::new()))
    }

    #[test]
    fn create_op_and_read_back() {
        let mut ctx = isolated();
        let f32_ty = Float32Type::get(ctx.interner());
        let attr = StrAttr::get(ctx.interner(), "op1_attr");

        let op = ctx.create_op(
            OperationBuilder::new("test", "op1")
                .result(f32_ty)
                .attr("op1_name", attr),
        );

        assert_eq!(ctx.op(op).dialect, Symbol::new("test"));
        assert_eq!(ctx.op_name(op), "test.op1");
        assert_eq!(ctx.op_result_types(op), &[TypeRef::from(f32_ty)]);
        assert_eq!(ctx.op_attr(op, "op1_name"), Ok(AttrRef::from(attr)));
        assert_eq!(ctx.num_operands(op), 0);
        assert_eq!(ctx.num_results(op), 1);
    }

    #[test]
    fn op_result_values() {
        let mut ctx = isolated();
        let f32_ty = Float32Type::get(ctx.interner());
        let i64_ty = Int64Type::get(ctx.interner());

        let op = ctx.create_op(
            OperationBuilder::new("test", "multi")
                .result(f32_ty)
                .result(i64_ty),
        );

        let r0 = ctx.op_result(op, 0);
        let r1 = ctx.op_result(op, 1);
        assert_ne!(r0, r1);
        assert_eq!(ctx.op_results(op), &[r0, r1]);
        assert_eq!(ctx.value_ty(r1), TypeRef::from(i64_ty));
        assert_eq!(ctx.value_def(r0), ValueDef::OpResult(op, 0));
        assert_eq!(ctx.defining_op(r1), Some(op));
        assert_eq!(ctx.result_index(r1), Some(1));
    }

    #[test]
    fn block_args_have_no_defining_op() {
        let mut ctx = isolated();
        let f32_ty: TypeRef = Float32Type::get(ctx.interner()).into();

        let block = ctx.create_block([f32_ty, f32_ty]);
        let a0 = ctx.block_arg(block, 0);
        let a1 = ctx.block_arg(block, 1);
        assert_ne!(a0, a1);
        assert_eq!(ctx.block_args(block), &[a0, a1]);
        assert_eq!(ctx.value_def(a1), ValueDef::BlockArg(block, 1));
        assert_eq!(ctx.defining_op(a0), None);
        assert_eq!(ctx.result_index(a0), None);

        let op = ctx.create_op(
            OperationBuilder::new("test", "consume")
                .operands([a0, a1])
                .parent(block),
        );
        assert_eq!(ctx.block_ops(block), &[op]);
        assert_eq!(ctx.op(op).parent_block, Some(block));
    }

    #[test]
    fn destroy_detaches_from_block() {
        let mut ctx = isolated();
        let block = ctx.create_block([]);
        let a = ctx.create_op(OperationBuilder::new("test", "a").parent(block));
        let b = ctx.create_op(OperationBuilder::new("test", "b").parent(block));
        assert_eq!(ctx.block_ops(block), &[a, b]);

        ctx.destroy_op(a);
        assert_eq!(ctx.block_ops(block), &[b]);
        assert!(!ctx.is_op_live(a));
        assert_eq!(ctx.ops().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn attr_lookup_errors() {
        let mut ctx = isolated();
        let axis = Int32Attr::get(ctx.interner(), 1i32);
        let op = ctx.create_op(OperationBuilder::new("test", "cum").attr("axis", axis));

        assert_eq!(ctx.op_attr_as::<Int32Attr>(op, "axis"), Ok(axis));

        let err = ctx.op_attr(op, "reverse").unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::AttributeNotFound { .. }));
        assert_eq!(err.to_string(), "Attribute `reverse` not found on test.cum (op0)");

        let err = ctx.op_attr_as::<StrAttr>(op, "axis").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attribute `axis` has kind int32, expected str"
        );
    }

    #[test]
    fn set_attr_overwrites() {
        let mut ctx = isolated();
        let op = ctx.create_op(OperationBuilder::new("test", "cum"));
        let one = Int32Attr::get(ctx.interner(), 1i32);
        let two = Int32Attr::get(ctx.interner(), 2i32);
        ctx.set_attr(op, "axis", one);
        ctx.set_attr(op, "axis", two);
        assert_eq!(ctx.op_attr_as::<Int32Attr>(op, "axis"), Ok(two));
        assert_eq!(ctx.op_attrs(op).len(), 1);
    }

    #[test]
    #[should_panic(expected = "result index 1 out of range")]
    fn op_result_out_of_range_panics() {
        let mut ctx = isolated();
        let f32_ty = Float32Type::get(ctx.interner());
        let op = ctx.create_op(OperationBuilder::new("test", "a").result(f32_ty));
        ctx.op_result(op, 1);
    }

    #[test]
    #[should_panic(expected = "operand index 0 out of range")]
    fn op_operand_out_of_range_panics() {
        let mut ctx = isolated();
        let op = ctx.create_op(OperationBuilder::new("test", "a"));
        ctx.op_operand(op, 0);
    }

    #[test]
    #[should_panic(expected = "still has 1 use(s)")]
    fn destroy_panics_when_result_has_uses() {
        let mut ctx = isolated();
        let f32_ty = Float32Type::get(ctx.interner());
        let op1 = ctx.create_op(OperationBuilder::new("test", "a").result(f32_ty));
        let v1 = ctx.op_result(op1, 0);
        ctx.create_op(OperationBuilder::new("test", "b").operand(v1));

        ctx.destroy_op(op1);
    }

    #[test]
    #[should_panic(expected = "was already destroyed")]
    fn double_destroy_panics() {
        let mut ctx = isolated();
        let op = ctx.create_op(OperationBuilder::new("test", "a"));
        ctx.destroy_op(op);
        ctx.destroy_op(op);
    }

    #[test]
    #[should_panic(expected = "does not belong to this graph's interner")]
    fn create_op_rejects_foreign_result_type() {
        let other = InternContext::new();
        let foreign = Float32Type::get(&other);
        let mut ctx = isolated();
        ctx.create_op(OperationBuilder::new("test", "a").result(foreign));
    }

    #[test]
    fn create_op_rejects_foreign_attr_before_allocating() {
        let other = InternContext::new();
        let foreign = Int32Attr::get(&other, 7i32);
        let mut ctx = isolated();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ctx.create_op(OperationBuilder::new("test", "a").attr("k", foreign))
        }));
        assert!(outcome.is_err());
        assert_eq!(ctx.ops().count(), 0);
        assert_eq!(ctx.interner().attr_count(), 0);
    }

    #[test]
    #[should_panic(expected = "use of destroyed operation")]
    fn access_after_destroy_panics() {
        let mut ctx = isolated();
        let op = ctx.create_op(OperationBuilder::new("test", "a"));
        ctx.destroy_op(op);
        ctx.op_results(op);
    }

    #[test]
    fn create_with_dead_operand_leaves_graph_untouched() {
        let mut ctx = isolated();
        let f32_ty = Float32Type::get(ctx.interner());
        let op1 = ctx.create_op(OperationBuilder::new("test", "a").result(f32_ty));
        let v1 = ctx.op_result(op1, 0);
        ctx.destroy_op(op1);

        let live = ctx.create_op(OperationBuilder::new("test", "b").result(f32_ty));
        let v2 = ctx.op_result(live, 0);

        let attempt = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ctx.create_op(OperationBuilder::new("test", "c").operands([v2, v1]));
        }));
        assert!(attempt.is_err());
        assert!(!ctx.has_uses(v2), "no operand may be linked by a rejected create");
        assert_eq!(ctx.ops().count(), 1);
    }
}
