//! Attribute values.
//!
//! An attribute is an immutable payload interned in an [`InternContext`] and
//! referred to by [`AttrRef`]. Each concrete kind has a typed handle
//! (`StrAttr`, `IntArrayAttr`, ...) implementing [`AttrKind`], which offers an
//! interning constructor and a pure accessor:
//!
//! ```
//! use tensor_ir::{AttrKind, InternContext, StrAttr};
//!
//! let ctx = InternContext::new();
//! let a = StrAttr::get(&ctx, "op1_attr");
//! let b = StrAttr::get(&ctx, String::from("op1_attr"));
//! assert_eq!(a, b);
//! assert_eq!(a.data(&ctx), "op1_attr");
//! ```

use crate::intern::InternContext;
use crate::refs::{AttrRef, TypeRef};
use crate::tensor_meta::{DataLayout, DataType, IntArray, Place, Scalar};

/// Interned attribute payload. The variant is the attribute kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeData {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    /// `f32` stored as raw bits.
    Float(u32),
    /// `f64` stored as raw bits.
    Double(u64),
    Str(String),
    /// Ordered list of other interned attributes.
    Array(Vec<AttrRef>),
    Type(TypeRef),
    IntArray(IntArray),
    Scalar(Scalar),
    DataType(DataType),
    DataLayout(DataLayout),
    Place(Place),
}

impl AttributeData {
    /// Kind name, as reported in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeData::Bool(_) => BoolAttr::KIND,
            AttributeData::Int32(_) => Int32Attr::KIND,
            AttributeData::Int64(_) => Int64Attr::KIND,
            AttributeData::Float(_) => FloatAttr::KIND,
            AttributeData::Double(_) => DoubleAttr::KIND,
            AttributeData::Str(_) => StrAttr::KIND,
            AttributeData::Array(_) => ArrayAttr::KIND,
            AttributeData::Type(_) => TypeAttr::KIND,
            AttributeData::IntArray(_) => IntArrayAttr::KIND,
            AttributeData::Scalar(_) => ScalarAttr::KIND,
            AttributeData::DataType(_) => DataTypeAttr::KIND,
            AttributeData::DataLayout(_) => DataLayoutAttr::KIND,
            AttributeData::Place(_) => PlaceAttr::KIND,
        }
    }
}

/// A typed handle to one attribute kind.
pub trait AttrKind: Copy + Into<AttrRef> {
    /// Value returned by [`AttrKind::data`].
    type Payload;

    const KIND: &'static str;

    /// Intern `payload`, returning the canonical handle.
    fn get(ctx: &InternContext, payload: impl Into<Self::Payload>) -> Self;

    /// The stored payload, by value.
    fn data(self, ctx: &InternContext) -> Self::Payload;

    /// Downcast an untyped ref, if it holds this kind.
    fn cast(ctx: &InternContext, attr: AttrRef) -> Option<Self>;
}

macro_rules! attribute_kinds {
    ($($(#[$meta:meta])* $name:ident($variant:ident: $payload:ty) => $kind:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
            pub struct $name(AttrRef);

            impl AttrKind for $name {
                type Payload = $payload;

                const KIND: &'static str = $kind;

                fn get(ctx: &InternContext, payload: impl Into<$payload>) -> Self {
                    $name(ctx.intern_attr(AttributeData::$variant(payload.into())))
                }

                fn data(self, ctx: &InternContext) -> $payload {
                    ctx.with_attr(self.0, |data| match data {
                        AttributeData::$variant(payload) => payload.clone(),
                        other => unreachable!(
                            "{} handle {} points at {} data",
                            $kind,
                            self.0,
                            other.kind_name()
                        ),
                    })
                }

                fn cast(ctx: &InternContext, attr: AttrRef) -> Option<Self> {
                    ctx.with_attr(attr, |data| matches!(data, AttributeData::$variant(_)))
                        .then_some($name(attr))
                }
            }

            impl From<$name> for AttrRef {
                fn from(attr: $name) -> AttrRef {
                    attr.0
                }
            }
        )*
    };
}

attribute_kinds! {
    BoolAttr(Bool: bool) => "bool";
    Int32Attr(Int32: i32) => "int32";
    Int64Attr(Int64: i64) => "int64";
    StrAttr(Str: String) => "str";
    /// Ordered list of attributes; elements may be of mixed kinds.
    ArrayAttr(Array: Vec<AttrRef>) => "array";
    TypeAttr(Type: TypeRef) => "type";
    IntArrayAttr(IntArray: IntArray) => "int_array";
    ScalarAttr(Scalar: Scalar) => "scalar";
    DataTypeAttr(DataType: DataType) => "data_type";
    DataLayoutAttr(DataLayout: DataLayout) => "data_layout";
    PlaceAttr(Place: Place) => "place";
}

/// `f32` constant. Equality is bitwise on the stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloatAttr(AttrRef);

impl AttrKind for FloatAttr {
    type Payload = f32;

    const KIND: &'static str = "float";

    fn get(ctx: &InternContext, payload: impl Into<f32>) -> Self {
        FloatAttr(ctx.intern_attr(AttributeData::Float(payload.into().to_bits())))
    }

    fn data(self, ctx: &InternContext) -> f32 {
        ctx.with_attr(self.0, |data| match data {
            AttributeData::Float(bits) => f32::from_bits(*bits),
            other => unreachable!("float handle {} points at {} data", self.0, other.kind_name()),
        })
    }

    fn cast(ctx: &InternContext, attr: AttrRef) -> Option<Self> {
        ctx.with_attr(attr, |data| matches!(data, AttributeData::Float(_)))
            .then_some(FloatAttr(attr))
    }
}

impl From<FloatAttr> for AttrRef {
    fn from(attr: FloatAttr) -> AttrRef {
        attr.0
    }
}

/// `f64` constant. Equality is bitwise on the stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DoubleAttr(AttrRef);

impl AttrKind for DoubleAttr {
    type Payload = f64;

    const KIND: &'static str = "double";

    fn get(ctx: &InternContext, payload: impl Into<f64>) -> Self {
        DoubleAttr(ctx.intern_attr(AttributeData::Double(payload.into().to_bits())))
    }

    fn data(self, ctx: &InternContext) -> f64 {
        ctx.with_attr(self.0, |data| match data {
            AttributeData::Double(bits) => f64::from_bits(*bits),
            other => unreachable!("double handle {} points at {} data", self.0, other.kind_name()),
        })
    }

    fn cast(ctx: &InternContext, attr: AttrRef) -> Option<Self> {
        ctx.with_attr(attr, |data| matches!(data, AttributeData::Double(_)))
            .then_some(DoubleAttr(attr))
    }
}

impl From<DoubleAttr> for AttrRef {
    fn from(attr: DoubleAttr) -> AttrRef {
        attr.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Float32Type;

    #[test]
    fn independently_built_handles_compare_equal() {
        let ctx = InternContext::new();
        let a = IntArrayAttr::get(&ctx, IntArray::new([1, 2, 3]));
        let b = IntArrayAttr::get(&ctx, vec![1i64, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, IntArrayAttr::get(&ctx, vec![1i64, 2]));
    }

    #[test]
    fn payload_round_trip() {
        let ctx = InternContext::new();
        let f32_ty: TypeRef = Float32Type::get(&ctx).into();

        assert!(BoolAttr::get(&ctx, true).data(&ctx));
        assert_eq!(Int32Attr::get(&ctx, -7i32).data(&ctx), -7);
        assert_eq!(Int64Attr::get(&ctx, 1i64 << 40).data(&ctx), 1i64 << 40);
        assert_eq!(FloatAttr::get(&ctx, 0.25f32).data(&ctx), 0.25);
        assert_eq!(DoubleAttr::get(&ctx, -1.5f64).data(&ctx), -1.5);
        assert_eq!(StrAttr::get(&ctx, "axis").data(&ctx), "axis");
        assert_eq!(TypeAttr::get(&ctx, f32_ty).data(&ctx), f32_ty);

        let shape = IntArray::from_tensor([4, -1]);
        assert_eq!(IntArrayAttr::get(&ctx, shape.clone()).data(&ctx), shape);
        assert_eq!(
            ScalarAttr::get(&ctx, Scalar::from(2.0f32)).data(&ctx),
            Scalar::from(2.0f32)
        );
        assert_eq!(
            DataTypeAttr::get(&ctx, DataType::BFloat16).data(&ctx),
            DataType::BFloat16
        );
        assert_eq!(
            DataLayoutAttr::get(&ctx, DataLayout::Nhwc).data(&ctx),
            DataLayout::Nhwc
        );
        assert_eq!(PlaceAttr::get(&ctx, Place::Gpu(1)).data(&ctx), Place::Gpu(1));

        let elems: Vec<AttrRef> = vec![
            Int32Attr::get(&ctx, 1i32).into(),
            StrAttr::get(&ctx, "x").into(),
        ];
        assert_eq!(ArrayAttr::get(&ctx, elems.clone()).data(&ctx), elems);
    }

    #[test]
    fn cast_checks_kind() {
        let ctx = InternContext::new();
        let attr: AttrRef = PlaceAttr::get(&ctx, Place::Cpu).into();
        assert!(PlaceAttr::cast(&ctx, attr).is_some());
        assert!(StrAttr::cast(&ctx, attr).is_none());
        assert_eq!(ctx.attr_data(attr).kind_name(), "place");
    }

    #[test]
    fn custom_place_attr_goes_through_checked_constructor() {
        let ctx = InternContext::new();
        assert!(Place::custom("", 2).is_err());
        assert_eq!(ctx.attr_count(), 0);

        let npu = Place::custom("npu", 2).unwrap();
        let attr = PlaceAttr::get(&ctx, npu.clone());
        match attr.data(&ctx) {
            Place::Custom(custom) => {
                assert_eq!(custom.device_type(), "npu");
                assert_eq!(custom.device_id(), 2);
            }
            other => panic!("expected custom place, got {other:?}"),
        }
        assert_eq!(attr, PlaceAttr::get(&ctx, npu));
    }

    #[test]
    fn float_kinds_do_not_collide() {
        let ctx = InternContext::new();
        let f: AttrRef = FloatAttr::get(&ctx, 1.0f32).into();
        let d: AttrRef = DoubleAttr::get(&ctx, 1.0f64).into();
        let s: AttrRef = ScalarAttr::get(&ctx, Scalar::from(1.0f32)).into();
        assert_ne!(f, d);
        assert_ne!(f, s);
        assert_eq!(ctx.attr_count(), 3);
    }
}
