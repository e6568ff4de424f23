//! Graph integrity checks.
//!
//! Two kinds of validation:
//!
//! 1. **Use-chain consistency**: every operand record of a live operation is
//!    reachable from the use-chain of the value it consumes, and every entry
//!    of every use-chain is such a record. Links must be symmetric.
//!
//! 2. **Value integrity**: no live operation consumes a value whose
//!    defining operation has been destroyed.
//!
//! Both are O(graph size). `IrContext` runs them after every mutation when
//! the `expensive-checks` feature is enabled.

use std::collections::HashSet;
use std::fmt;

use crate::context::IrContext;
use crate::refs::{OperandRef, ValueDef};

// ============================================================================
// Error types
// ============================================================================

/// Describes a value consumed after its producer was destroyed.
pub struct StaleValueError {
    /// Full name of the consuming operation (e.g., "pd.relu (op3)").
    pub consumer_op: String,
    /// Index of the stale operand within the consuming operation.
    pub operand_index: usize,
    /// Human-readable description of the stale value.
    pub stale_value_description: String,
}

impl fmt::Display for StaleValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stale value: operand #{} of {} references {}",
            self.operand_index, self.consumer_op, self.stale_value_description,
        )
    }
}

impl fmt::Debug for StaleValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Describes a use-chain inconsistency.
pub struct UseChainError {
    pub message: String,
}

impl fmt::Display for UseChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for UseChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Result of validation.
pub struct ValidationResult {
    pub stale_errors: Vec<StaleValueError>,
    pub use_chain_errors: Vec<UseChainError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.stale_errors.is_empty() && self.use_chain_errors.is_empty()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "validation passed");
        }
        if !self.stale_errors.is_empty() {
            writeln!(f, "{} stale value(s) found:", self.stale_errors.len())?;
            for err in &self.stale_errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        if !self.use_chain_errors.is_empty() {
            writeln!(
                f,
                "{} use-chain error(s) found:",
                self.use_chain_errors.len()
            )?;
            for err in &self.use_chain_errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Run every check.
pub fn validate(ctx: &IrContext) -> ValidationResult {
    ValidationResult {
        stale_errors: collect_stale_errors(ctx),
        use_chain_errors: collect_use_chain_errors(ctx),
    }
}

/// Validate that use-chains exactly mirror the operands of live operations.
pub fn validate_use_chains(ctx: &IrContext) -> ValidationResult {
    ValidationResult {
        stale_errors: vec![],
        use_chain_errors: collect_use_chain_errors(ctx),
    }
}

/// Validate that no live operation consumes a value of a destroyed operation.
pub fn validate_value_integrity(ctx: &IrContext) -> ValidationResult {
    ValidationResult {
        stale_errors: collect_stale_errors(ctx),
        use_chain_errors: vec![],
    }
}

// ============================================================================
// Use-chain consistency
// ============================================================================

fn collect_use_chain_errors(ctx: &IrContext) -> Vec<UseChainError> {
    let mut errors = Vec::new();
    let mut reachable: HashSet<OperandRef> = HashSet::new();
    let limit = ctx.operands.len();

    // Direction 1: use-chain entry → live operand record
    for (val, data) in ctx.values.iter() {
        let mut prev: Option<OperandRef> = None;
        let mut cursor = data.first_use.expand();
        let mut steps = 0usize;
        while let Some(operand) = cursor {
            steps += 1;
            if steps > limit || !reachable.insert(operand) {
                errors.push(UseChainError {
                    message: format!("use-chain of {val} is cyclic or shared at {operand}"),
                });
                break;
            }

            let record = &ctx.operands[operand];
            if !record.linked {
                errors.push(UseChainError {
                    message: format!("use-chain of {val} contains unlinked record {operand}"),
                });
            }
            if record.value != val {
                errors.push(UseChainError {
                    message: format!(
                        "use-chain of {val} contains {operand}, which refers to {}",
                        record.value
                    ),
                });
            }
            if !ctx.is_op_live(record.owner) {
                errors.push(UseChainError {
                    message: format!(
                        "use-chain of {val} contains {operand} owned by destroyed {}",
                        ctx.describe_op(record.owner)
                    ),
                });
            }
            if record.prev_use.expand() != prev {
                errors.push(UseChainError {
                    message: format!(
                        "{operand} in use-chain of {val} has prev {:?}, expected {:?}",
                        record.prev_use.expand(),
                        prev
                    ),
                });
            }

            prev = Some(operand);
            cursor = record.next_use.expand();
        }
    }

    // Direction 2: live operand record → use-chain entry
    for op in ctx.ops() {
        for (idx, &operand) in ctx.op_operands(op).iter().enumerate() {
            let record = &ctx.operands[operand];
            if record.owner != op || record.index as usize != idx {
                errors.push(UseChainError {
                    message: format!(
                        "operand #{idx} of {} is {operand}, which claims to be operand #{} of {}",
                        ctx.describe_op(op),
                        record.index,
                        record.owner
                    ),
                });
            }
            if !reachable.contains(&operand) {
                errors.push(UseChainError {
                    message: format!(
                        "operand #{idx} of {} uses {} but no use-chain entry exists",
                        ctx.describe_op(op),
                        record.value
                    ),
                });
            }
        }
    }

    errors
}

// ============================================================================
// Value integrity
// ============================================================================

fn collect_stale_errors(ctx: &IrContext) -> Vec<StaleValueError> {
    let mut errors = Vec::new();
    for op in ctx.ops() {
        for (idx, &operand) in ctx.op_operands(op).iter().enumerate() {
            let value = ctx.operands[operand].value;
            if ctx.is_value_live(value) {
                continue;
            }
            let stale_value_description = match ctx.value_def(value) {
                ValueDef::OpResult(producer, result) => format!(
                    "{value} (result #{result} of destroyed {})",
                    ctx.op_name(producer)
                ),
                ValueDef::BlockArg(block, arg) => format!("{value} (argument #{arg} of {block})"),
            };
            errors.push(StaleValueError {
                consumer_op: ctx.describe_op(op),
                operand_index: idx,
                stale_value_description,
            });
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cranelift_entity::packed_option::PackedOption;

    use super::*;
    use crate::context::{OpState, OperationBuilder};
    use crate::intern::InternContext;
    use crate::refs::{OpRef, ValueRef};
    use crate::types::Float32Type;

    fn diamond() -> (IrContext, ValueRef, OpRef) {
        let mut ctx = IrContext::with_interner(Arc::new(InternContext::new()));
        let f32_ty = Float32Type::get(ctx.interner());
        let src = ctx.create_op(OperationBuilder::new("test", "src").result(f32_ty));
        let v = ctx.op_result(src, 0);
        let lhs = ctx.create_op(OperationBuilder::new("test", "lhs").operand(v).result(f32_ty));
        let rhs = ctx.create_op(OperationBuilder::new("test", "rhs").operand(v).result(f32_ty));
        let l = ctx.op_result(lhs, 0);
        let r = ctx.op_result(rhs, 0);
        let sink = ctx.create_op(OperationBuilder::new("test", "sink").operands([l, r]));
        (ctx, v, sink)
    }

    #[test]
    fn consistent_graph_passes() {
        let (mut ctx, v, sink) = diamond();
        assert!(validate(&ctx).is_ok());

        ctx.destroy_op(sink);
        let users: Vec<_> = ctx.users(v).collect();
        for user in users {
            ctx.destroy_op(user);
        }
        let result = validate(&ctx);
        assert!(result.is_ok(), "{result}");
        assert_eq!(result.to_string(), "validation passed");
    }

    #[test]
    fn detects_missing_chain_entry() {
        let (mut ctx, v, _) = diamond();
        ctx.values[v].first_use = PackedOption::default();

        let result = validate_use_chains(&ctx);
        assert_eq!(result.use_chain_errors.len(), 2);
        assert!(
            result.use_chain_errors[0]
                .message
                .contains("but no use-chain entry exists"),
            "{result}"
        );
    }

    #[test]
    fn detects_asymmetric_links() {
        let (mut ctx, v, _) = diamond();
        let head = ctx.first_use(v).unwrap();
        let second = ctx.next_use(head).unwrap();
        ctx.operands[second].prev_use = PackedOption::default();

        let result = validate_use_chains(&ctx);
        assert!(!result.is_ok());
        assert!(result.to_string().contains("1 use-chain error(s) found:"), "{result}");
    }

    #[test]
    fn detects_stale_operand() {
        let (mut ctx, v, _) = diamond();
        // Simulate a producer destroyed behind the context's back.
        let src = ctx.defining_op(v).unwrap();
        ctx.ops[src].state = OpState::Destroyed;

        let result = validate_value_integrity(&ctx);
        assert_eq!(result.stale_errors.len(), 2);
        assert!(
            result.stale_errors[0]
                .to_string()
                .contains("references v0 (result #0 of destroyed test.src)"),
            "{result}"
        );
    }
}
