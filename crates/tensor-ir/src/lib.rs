//! Tensor IR core.
//!
//! A mutable operation graph for tensor programs: operations consume and
//! produce typed values, every value tracks its consumers through a use-chain,
//! and attributes and types are interned so equality is a handle comparison.

// === Names and handles ===
pub mod error;
pub mod refs;
pub mod symbol;

// === Interned payloads ===
pub mod attribute;
pub mod intern;
pub mod tensor_meta;
pub mod types;

// === Operation graph ===
pub mod context;
pub mod use_chain;

// === Diagnostics ===
pub mod printer;
pub mod validation;

pub use attribute::{
    ArrayAttr, AttrKind, AttributeData, BoolAttr, DataLayoutAttr, DataTypeAttr, DoubleAttr,
    FloatAttr, Int32Attr, Int64Attr, IntArrayAttr, PlaceAttr, ScalarAttr, StrAttr, TypeAttr,
};
pub use context::{
    BlockData, IrContext, OpState, OperandData, OperationBuilder, OperationData, ValueData,
};
pub use error::{IrError, IrErrorKind, IrResult};
pub use intern::InternContext;
pub use refs::{AttrRef, BlockRef, OpRef, OperandRef, TypeRef, ValueDef, ValueRef};
pub use symbol::Symbol;
pub use tensor_meta::{CustomPlace, DataLayout, DataType, IntArray, Place, Scalar};
pub use types::{
    BFloat16Type, BoolType, BuiltinType, DenseTensorData, DenseTensorType, Float16Type,
    Float32Type, Float64Type, IndexType, Int8Type, Int16Type, Int32Type, Int64Type, TypeData,
    TypeKind, UInt8Type, VectorType, builtin_type,
};
pub use use_chain::{Use, Uses};

// Re-export smallvec for callers building operand and dimension lists
pub use smallvec;
