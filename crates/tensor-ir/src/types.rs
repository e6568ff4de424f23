//! Type values.
//!
//! Types are interned in an [`InternContext`] just like attributes. The
//! builtin scalar types are payload-free singletons per context; vector and
//! dense tensor types carry parameters. `DenseTensorType::get` is the one
//! validating constructor: a malformed shape or element type is rejected
//! before anything is interned.

use smallvec::SmallVec;

use crate::error::{IrError, IrResult};
use crate::intern::InternContext;
use crate::printer::print_type;
use crate::refs::TypeRef;
use crate::symbols;
use crate::tensor_meta::{DataLayout, DataType};

symbols! {
    BUILTIN_DIALECT => "builtin",
    PD_DIALECT => "pd",
}

/// Payload-free scalar types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinType {
    BFloat16,
    Float16,
    Float32,
    Float64,
    Int8,
    UInt8,
    Int16,
    Int32,
    Int64,
    Bool,
    Index,
}

impl BuiltinType {
    pub const fn name(self) -> &'static str {
        match self {
            BuiltinType::BFloat16 => "bf16",
            BuiltinType::Float16 => "f16",
            BuiltinType::Float32 => "f32",
            BuiltinType::Float64 => "f64",
            BuiltinType::Int8 => "i8",
            BuiltinType::UInt8 => "u8",
            BuiltinType::Int16 => "i16",
            BuiltinType::Int32 => "i32",
            BuiltinType::Int64 => "i64",
            BuiltinType::Bool => "bool",
            BuiltinType::Index => "index",
        }
    }

    /// Tensor element data type, if this type can be a tensor element.
    pub fn data_type(self) -> Option<DataType> {
        Some(match self {
            BuiltinType::BFloat16 => DataType::BFloat16,
            BuiltinType::Float16 => DataType::Float16,
            BuiltinType::Float32 => DataType::Float32,
            BuiltinType::Float64 => DataType::Float64,
            BuiltinType::Int8 => DataType::Int8,
            BuiltinType::UInt8 => DataType::UInt8,
            BuiltinType::Int16 => DataType::Int16,
            BuiltinType::Int32 => DataType::Int32,
            BuiltinType::Int64 => DataType::Int64,
            BuiltinType::Bool => DataType::Bool,
            BuiltinType::Index => return None,
        })
    }
}

/// Interned type payload. The variant is the type kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Builtin(BuiltinType),
    /// Ordered tuple of element types.
    Vector(SmallVec<[TypeRef; 4]>),
    DenseTensor(DenseTensorData),
}

impl TypeData {
    /// Kind name, as reported in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeData::Builtin(b) => b.name(),
            TypeData::Vector(_) => VectorType::KIND,
            TypeData::DenseTensor(_) => DenseTensorType::KIND,
        }
    }
}

/// Shape and element type of a dense tensor.
///
/// A dimension of `-1` is dynamic. `lod` holds level-of-detail offsets for
/// ragged batches; each level starts at 0 and never decreases.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DenseTensorData {
    pub dtype: TypeRef,
    pub dims: SmallVec<[i64; 4]>,
    pub layout: DataLayout,
    pub lod: Vec<Vec<u64>>,
    pub offset: u64,
}

impl DenseTensorData {
    /// Dense tensor with default layout (`NCHW`), no LoD and zero offset.
    pub fn new(dtype: impl Into<TypeRef>, dims: impl IntoIterator<Item = i64>) -> Self {
        Self {
            dtype: dtype.into(),
            dims: dims.into_iter().collect(),
            layout: DataLayout::Nchw,
            lod: Vec::new(),
            offset: 0,
        }
    }

    pub fn layout(mut self, layout: DataLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn lod(mut self, lod: Vec<Vec<u64>>) -> Self {
        self.lod = lod;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Number of elements, or `None` if any dimension is dynamic or the
    /// product does not fit in `i64`.
    pub fn numel(&self) -> Option<i64> {
        self.dims
            .iter()
            .try_fold(1i64, |acc, &d| if d >= 0 { acc.checked_mul(d) } else { None })
    }

    fn validate(&self, ctx: &InternContext) -> IrResult<()> {
        let element_ok = ctx.with_type(self.dtype, |data| {
            matches!(data, TypeData::Builtin(b) if b.data_type().is_some())
        });
        if !element_ok {
            return Err(IrError::invalid_argument(format!(
                "dense tensor element type must be a builtin scalar type, got {}",
                print_type(ctx, self.dtype)
            )));
        }

        if let Some((axis, &dim)) = self.dims.iter().enumerate().find(|(_, d)| **d < -1) {
            return Err(IrError::invalid_argument(format!(
                "dimension {dim} at axis {axis} is below -1 in dims {:?}",
                self.dims.as_slice()
            )));
        }

        for (level, offsets) in self.lod.iter().enumerate() {
            if let Some(&first) = offsets.first()
                && first != 0
            {
                return Err(IrError::invalid_argument(format!(
                    "lod level {level} must start at 0, got {first}"
                )));
            }
            if let Some(pos) = offsets.windows(2).position(|w| w[0] > w[1]) {
                return Err(IrError::invalid_argument(format!(
                    "lod level {level} decreases at position {} ({} > {})",
                    pos + 1,
                    offsets[pos],
                    offsets[pos + 1]
                )));
            }
        }

        Ok(())
    }
}

/// A typed handle to one type kind.
pub trait TypeKind: Copy + Into<TypeRef> {
    const KIND: &'static str;

    /// Downcast an untyped ref, if it holds this kind.
    fn cast(ctx: &InternContext, ty: TypeRef) -> Option<Self>;
}

macro_rules! builtin_types {
    ($($name:ident => $variant:ident;)*) => {
        $(
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
            pub struct $name(TypeRef);

            impl $name {
                pub fn get(ctx: &InternContext) -> Self {
                    $name(ctx.intern_type(TypeData::Builtin(BuiltinType::$variant)))
                }
            }

            impl TypeKind for $name {
                const KIND: &'static str = BuiltinType::$variant.name();

                fn cast(ctx: &InternContext, ty: TypeRef) -> Option<Self> {
                    ctx.with_type(ty, |data| {
                        matches!(data, TypeData::Builtin(BuiltinType::$variant))
                    })
                    .then_some($name(ty))
                }
            }

            impl From<$name> for TypeRef {
                fn from(ty: $name) -> TypeRef {
                    ty.0
                }
            }
        )*
    };
}

builtin_types! {
    BFloat16Type => BFloat16;
    Float16Type => Float16;
    Float32Type => Float32;
    Float64Type => Float64;
    Int8Type => Int8;
    UInt8Type => UInt8;
    Int16Type => Int16;
    Int32Type => Int32;
    Int64Type => Int64;
    BoolType => Bool;
    IndexType => Index;
}

/// Builtin type by enum value, for callers that pick the type at run time.
pub fn builtin_type(ctx: &InternContext, ty: BuiltinType) -> TypeRef {
    ctx.intern_type(TypeData::Builtin(ty))
}

/// Ordered tuple of types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VectorType(TypeRef);

impl VectorType {
    pub fn get(ctx: &InternContext, elems: impl IntoIterator<Item = TypeRef>) -> Self {
        VectorType(ctx.intern_type(TypeData::Vector(elems.into_iter().collect())))
    }

    pub fn data(self, ctx: &InternContext) -> SmallVec<[TypeRef; 4]> {
        ctx.with_type(self.0, |data| match data {
            TypeData::Vector(elems) => elems.clone(),
            other => unreachable!("vector handle {} points at {}", self.0, other.kind_name()),
        })
    }

    pub fn len(self, ctx: &InternContext) -> usize {
        ctx.with_type(self.0, |data| match data {
            TypeData::Vector(elems) => elems.len(),
            _ => 0,
        })
    }

    pub fn is_empty(self, ctx: &InternContext) -> bool {
        self.len(ctx) == 0
    }
}

impl TypeKind for VectorType {
    const KIND: &'static str = "vec";

    fn cast(ctx: &InternContext, ty: TypeRef) -> Option<Self> {
        ctx.with_type(ty, |data| matches!(data, TypeData::Vector(_)))
            .then_some(VectorType(ty))
    }
}

impl From<VectorType> for TypeRef {
    fn from(ty: VectorType) -> TypeRef {
        ty.0
    }
}

/// Dense tensor type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DenseTensorType(TypeRef);

impl DenseTensorType {
    /// Validate and intern a dense tensor type.
    ///
    /// Fails with `InvalidArgument` if the element type is not a builtin
    /// scalar, a dimension is below `-1`, or a LoD level is malformed.
    pub fn get(ctx: &InternContext, data: DenseTensorData) -> IrResult<Self> {
        data.validate(ctx)?;
        Ok(DenseTensorType(ctx.intern_type(TypeData::DenseTensor(data))))
    }

    pub fn data(self, ctx: &InternContext) -> DenseTensorData {
        ctx.with_type(self.0, |data| match data {
            TypeData::DenseTensor(tensor) => tensor.clone(),
            other => unreachable!("dense tensor handle {} points at {}", self.0, other.kind_name()),
        })
    }

    pub fn dtype(self, ctx: &InternContext) -> TypeRef {
        ctx.with_type(self.0, |data| match data {
            TypeData::DenseTensor(tensor) => tensor.dtype,
            other => unreachable!("dense tensor handle {} points at {}", self.0, other.kind_name()),
        })
    }

    pub fn dims(self, ctx: &InternContext) -> SmallVec<[i64; 4]> {
        self.data(ctx).dims
    }
}

impl TypeKind for DenseTensorType {
    const KIND: &'static str = "dense_tensor";

    fn cast(ctx: &InternContext, ty: TypeRef) -> Option<Self> {
        ctx.with_type(ty, |data| matches!(data, TypeData::DenseTensor(_)))
            .then_some(DenseTensorType(ty))
    }
}

impl From<DenseTensorType> for TypeRef {
    fn from(ty: DenseTensorType) -> TypeRef {
        ty.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrErrorKind;

    #[test]
    fn builtin_types_are_singletons() {
        let ctx = InternContext::new();
        assert_eq!(Float32Type::get(&ctx), Float32Type::get(&ctx));
        let f32_ty: TypeRef = Float32Type::get(&ctx).into();
        let i64_ty: TypeRef = Int64Type::get(&ctx).into();
        assert_ne!(f32_ty, i64_ty);
        assert_eq!(builtin_type(&ctx, BuiltinType::Float32), f32_ty);
        assert_eq!(ctx.type_count(), 2);
    }

    #[test]
    fn cast_checks_kind() {
        let ctx = InternContext::new();
        let f32_ty: TypeRef = Float32Type::get(&ctx).into();
        assert!(Float32Type::cast(&ctx, f32_ty).is_some());
        assert!(Float64Type::cast(&ctx, f32_ty).is_none());
        assert!(VectorType::cast(&ctx, f32_ty).is_none());
    }

    #[test]
    fn vector_type_round_trip() {
        let ctx = InternContext::new();
        let f32_ty: TypeRef = Float32Type::get(&ctx).into();
        let i32_ty: TypeRef = Int32Type::get(&ctx).into();
        let v = VectorType::get(&ctx, [f32_ty, i32_ty]);
        assert_eq!(v, VectorType::get(&ctx, vec![f32_ty, i32_ty]));
        assert_eq!(v.data(&ctx).as_slice(), &[f32_ty, i32_ty]);
        assert_eq!(v.len(&ctx), 2);
    }

    #[test]
    fn dense_tensor_dedup_and_accessors() {
        let ctx = InternContext::new();
        let f32_ty = Float32Type::get(&ctx);
        let data = DenseTensorData::new(f32_ty, [2, -1, 3]).layout(DataLayout::Nhwc);
        let t1 = DenseTensorType::get(&ctx, data.clone()).unwrap();
        let t2 = DenseTensorType::get(&ctx, data.clone()).unwrap();
        assert_eq!(t1, t2);
        assert_eq!(t1.data(&ctx), data);
        assert_eq!(t1.dims(&ctx).as_slice(), &[2, -1, 3]);
        assert_eq!(t1.dtype(&ctx), TypeRef::from(f32_ty));
        assert_eq!(data.numel(), None);
        assert_eq!(DenseTensorData::new(f32_ty, [2, 3]).numel(), Some(6));
    }

    #[test]
    fn numel_of_huge_shape_is_none() {
        let ctx = InternContext::new();
        let f32_ty = Float32Type::get(&ctx);
        let huge = DenseTensorType::get(&ctx, DenseTensorData::new(f32_ty, [i64::MAX, 2])).unwrap();
        assert_eq!(huge.data(&ctx).numel(), None);
        assert_eq!(DenseTensorData::new(f32_ty, [i64::MAX, 1]).numel(), Some(i64::MAX));
        assert_eq!(DenseTensorData::new(f32_ty, [0, -1]).numel(), None);
    }

    #[test]
    fn dense_tensor_rejects_bad_dims() {
        let ctx = InternContext::new();
        let f32_ty = Float32Type::get(&ctx);
        let before = ctx.type_count();
        let err = DenseTensorType::get(&ctx, DenseTensorData::new(f32_ty, [4, -3])).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::InvalidArgument(_)));
        assert_eq!(
            err.to_string(),
            "Invalid argument: dimension -3 at axis 1 is below -1 in dims [4, -3]"
        );
        assert_eq!(ctx.type_count(), before, "rejected payload must not be interned");
    }

    #[test]
    fn dense_tensor_rejects_non_scalar_element() {
        let ctx = InternContext::new();
        let f32_ty: TypeRef = Float32Type::get(&ctx).into();
        let vec_ty = VectorType::get(&ctx, [f32_ty]);
        let err = DenseTensorType::get(&ctx, DenseTensorData::new(vec_ty, [1])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: dense tensor element type must be a builtin scalar type, \
             got builtin.vec[builtin.f32]"
        );

        let index_ty = IndexType::get(&ctx);
        assert!(DenseTensorType::get(&ctx, DenseTensorData::new(index_ty, [1])).is_err());
    }

    #[test]
    fn dense_tensor_rejects_bad_lod() {
        let ctx = InternContext::new();
        let f32_ty = Float32Type::get(&ctx);

        let err = DenseTensorType::get(
            &ctx,
            DenseTensorData::new(f32_ty, [5]).lod(vec![vec![1, 5]]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("lod level 0 must start at 0, got 1"));

        let err = DenseTensorType::get(
            &ctx,
            DenseTensorData::new(f32_ty, [5]).lod(vec![vec![0, 2, 5], vec![0, 3, 1]]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("lod level 1 decreases at position 2 (3 > 1)"));

        assert!(
            DenseTensorType::get(
                &ctx,
                DenseTensorData::new(f32_ty, [5]).lod(vec![vec![0, 2, 5]])
            )
            .is_ok()
        );
    }
}
