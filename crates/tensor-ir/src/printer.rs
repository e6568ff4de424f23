//! Text format printer for the operation graph.
//!
//! Values are named after their arena index, so a printed operation can be
//! matched against any other printout of the same graph:
//!
//! ```text
//! %0 = test.op1 {op1_name = "op1_attr"} : builtin.f32
//! %2 = test.op3 %0, %1 {op3_name = "op3_attr"} : builtin.f32
//! ```

use std::fmt;
use std::fmt::Write;

use crate::attribute::AttributeData;
use crate::context::IrContext;
use crate::intern::InternContext;
use crate::refs::*;
use crate::types::{BUILTIN_DIALECT, PD_DIALECT, TypeData};
use crate::tensor_meta::DataLayout;

// ============================================================================
// Public API
// ============================================================================

/// Print one operation as a single line of IR text.
pub fn print_op(ctx: &IrContext, op: OpRef) -> String {
    let mut out = String::new();
    write_operation(ctx, &mut out, op).expect("fmt::Write to String never fails");
    out
}

/// Print every live operation in creation order.
pub fn print_ops(ctx: &IrContext) -> String {
    let mut out = String::new();
    for op in ctx.ops() {
        write_operation(ctx, &mut out, op).expect("fmt::Write to String never fails");
    }
    out
}

/// Print a block header followed by its operations.
pub fn print_block(ctx: &IrContext, block: BlockRef) -> String {
    let mut out = String::new();
    write_block(ctx, &mut out, block).expect("fmt::Write to String never fails");
    out
}

/// Print a type as IR text.
pub fn print_type(ctx: &InternContext, ty: TypeRef) -> String {
    let mut out = String::new();
    write_type(ctx, &mut out, ty).expect("fmt::Write to String never fails");
    out
}

/// Print an attribute as IR text.
pub fn print_attr(ctx: &InternContext, attr: AttrRef) -> String {
    let mut out = String::new();
    write_attribute(ctx, &mut out, attr).expect("fmt::Write to String never fails");
    out
}

/// Print the use-chain of a value, most recent use first:
/// `%0 -> op3#0 -> op2#0 -> end`.
pub fn print_use_chain(ctx: &IrContext, v: ValueRef) -> String {
    let mut out = String::new();
    write_value(&mut out, v).expect("fmt::Write to String never fails");
    for u in ctx.uses(v) {
        write!(out, " -> {}#{}", u.user, u.operand_index)
            .expect("fmt::Write to String never fails");
    }
    out.push_str(" -> end");
    out
}

// ============================================================================
// Operation printing
// ============================================================================

fn write_value(f: &mut impl Write, v: ValueRef) -> fmt::Result {
    write!(f, "%{}", v.as_u32())
}

fn write_value_list(f: &mut impl Write, values: &[ValueRef]) -> fmt::Result {
    for (i, &v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_value(f, v)?;
    }
    Ok(())
}

fn write_operation(ctx: &IrContext, f: &mut impl Write, op: OpRef) -> fmt::Result {
    let results = ctx.op_results(op);
    if !results.is_empty() {
        write_value_list(f, results)?;
        f.write_str(" = ")?;
    }

    f.write_str(&ctx.op_name(op))?;

    let operands = ctx.op_operand_values(op);
    if !operands.is_empty() {
        f.write_char(' ')?;
        write_value_list(f, &operands)?;
    }

    // Attributes are printed sorted by name so output does not depend on
    // interning order of the key symbols.
    let attrs = ctx.op_attrs(op);
    if !attrs.is_empty() {
        let mut sorted: Vec<(String, AttrRef)> = attrs
            .iter()
            .map(|(key, &attr)| (key.to_string(), attr))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        f.write_str(" {")?;
        for (i, (key, attr)) in sorted.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} = ")?;
            write_attribute(ctx.interner(), f, attr)?;
        }
        f.write_char('}')?;
    }

    let result_types = ctx.op_result_types(op);
    if !result_types.is_empty() {
        f.write_str(" : ")?;
        for (i, &ty) in result_types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_type(ctx.interner(), f, ty)?;
        }
    }

    f.write_char('\n')
}

fn write_block(ctx: &IrContext, f: &mut impl Write, block: BlockRef) -> fmt::Result {
    write!(f, "^{block}")?;
    let args = ctx.block_args(block);
    if !args.is_empty() {
        f.write_char('(')?;
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_value(f, arg)?;
            f.write_str(": ")?;
            write_type(ctx.interner(), f, ctx.value_ty(arg))?;
        }
        f.write_char(')')?;
    }
    f.write_str(":\n")?;
    for &op in ctx.block_ops(block) {
        f.write_str("  ")?;
        write_operation(ctx, f, op)?;
    }
    Ok(())
}

// ============================================================================
// Type printing
// ============================================================================

fn write_type(ctx: &InternContext, f: &mut impl Write, ty: TypeRef) -> fmt::Result {
    match ctx.type_data(ty) {
        TypeData::Builtin(b) => write!(f, "{}.{}", BUILTIN_DIALECT(), b.name()),
        TypeData::Vector(elems) => {
            write!(f, "{}.vec[", BUILTIN_DIALECT())?;
            for (i, &elem) in elems.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_type(ctx, f, elem)?;
            }
            f.write_char(']')
        }
        TypeData::DenseTensor(tensor) => {
            write!(f, "{}.tensor<", PD_DIALECT())?;
            for &dim in &tensor.dims {
                if dim < 0 {
                    f.write_char('?')?;
                } else {
                    write!(f, "{dim}")?;
                }
                f.write_char('x')?;
            }
            match ctx.type_data(tensor.dtype) {
                TypeData::Builtin(b) => f.write_str(b.name())?,
                _ => write_type(ctx, f, tensor.dtype)?,
            }
            if tensor.layout != DataLayout::Nchw {
                write!(f, ", {}", tensor.layout)?;
            }
            if !tensor.lod.is_empty() {
                write!(f, ", lod={:?}", tensor.lod)?;
            }
            if tensor.offset != 0 {
                write!(f, ", offset={}", tensor.offset)?;
            }
            f.write_char('>')
        }
    }
}

// ============================================================================
// Attribute printing
// ============================================================================

fn write_attribute(ctx: &InternContext, f: &mut impl Write, attr: AttrRef) -> fmt::Result {
    match ctx.attr_data(attr) {
        AttributeData::Bool(b) => write!(f, "{b}"),
        AttributeData::Int32(v) => write!(f, "{v} : i32"),
        AttributeData::Int64(v) => write!(f, "{v} : i64"),
        AttributeData::Float(bits) => {
            let v = f32::from_bits(bits);
            write_float(f, format!("{v}"), v.is_finite())?;
            f.write_str(" : f32")
        }
        AttributeData::Double(bits) => {
            let v = f64::from_bits(bits);
            write_float(f, format!("{v}"), v.is_finite())?;
            f.write_str(" : f64")
        }
        AttributeData::Str(s) => {
            f.write_char('"')?;
            write_escaped_string(f, &s)?;
            f.write_char('"')
        }
        AttributeData::Array(elems) => {
            f.write_char('[')?;
            for (i, &elem) in elems.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_attribute(ctx, f, elem)?;
            }
            f.write_char(']')
        }
        AttributeData::Type(ty) => write_type(ctx, f, ty),
        AttributeData::IntArray(array) => write!(f, "int_array{array}"),
        AttributeData::Scalar(scalar) => write!(f, "scalar({scalar})"),
        AttributeData::DataType(dtype) => write!(f, "dtype({dtype})"),
        AttributeData::DataLayout(layout) => write!(f, "layout({layout})"),
        AttributeData::Place(place) => write!(f, "place({place})"),
    }
}

fn write_float(f: &mut impl Write, s: String, finite: bool) -> fmt::Result {
    f.write_str(&s)?;
    // Ensure decimal point for finite whole numbers (don't corrupt inf/NaN)
    if finite && !s.contains('.') && !s.contains('e') && !s.contains('E') {
        f.write_str(".0")?;
    }
    Ok(())
}

fn write_escaped_string(f: &mut impl Write, s: &str) -> fmt::Result {
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}
