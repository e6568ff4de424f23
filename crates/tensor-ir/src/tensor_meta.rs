//! Tensor metadata payloads carried by attributes.
//!
//! These are plain value types; interning happens one level up in
//! [`crate::attribute`]. Every payload is `Eq + Hash` so it can serve as an
//! interning key directly.

use std::fmt;

use derive_more::Display;
use smallvec::SmallVec;

use crate::error::{IrError, IrResult};

/// Element data type of a tensor.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    #[display("undefined")]
    Undefined,
    #[display("bool")]
    Bool,
    #[display("uint8")]
    UInt8,
    #[display("int8")]
    Int8,
    #[display("uint16")]
    UInt16,
    #[display("int16")]
    Int16,
    #[display("uint32")]
    UInt32,
    #[display("int32")]
    Int32,
    #[display("uint64")]
    UInt64,
    #[display("int64")]
    Int64,
    #[display("float32")]
    Float32,
    #[display("float64")]
    Float64,
    #[display("complex64")]
    Complex64,
    #[display("complex128")]
    Complex128,
    #[display("float16")]
    Float16,
    #[display("bfloat16")]
    BFloat16,
    #[display("pstring")]
    PString,
}

impl DataType {
    /// Size of one element in bytes. `Undefined` and `PString` have no fixed size.
    pub fn size_of(self) -> Option<usize> {
        match self {
            DataType::Undefined | DataType::PString => None,
            DataType::Bool | DataType::UInt8 | DataType::Int8 => Some(1),
            DataType::UInt16 | DataType::Int16 | DataType::Float16 | DataType::BFloat16 => Some(2),
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => Some(4),
            DataType::UInt64 | DataType::Int64 | DataType::Float64 | DataType::Complex64 => {
                Some(8)
            }
            DataType::Complex128 => Some(16),
        }
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            DataType::Float16 | DataType::BFloat16 | DataType::Float32 | DataType::Float64
        )
    }
}

/// Memory layout of a tensor.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataLayout {
    #[display("UNDEFINED")]
    Undefined,
    #[display("ANY")]
    Any,
    #[display("NHWC")]
    Nhwc,
    #[display("NCHW")]
    Nchw,
    #[display("NCDHW")]
    Ncdhw,
    #[display("NDHWC")]
    Ndhwc,
    #[display("ONEDNN")]
    OneDnn,
    #[display("SPARSE_COO")]
    SparseCoo,
    #[display("SPARSE_CSR")]
    SparseCsr,
    #[display("STRINGS")]
    Strings,
}

/// Device placement of a tensor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Place {
    Undefined,
    Cpu,
    Gpu(u32),
    GpuPinned,
    Xpu(u32),
    /// Built only through [`Place::custom`], which rejects an empty type name.
    Custom(CustomPlace),
}

/// A plugged-in device: type name plus device id.
///
/// Fields are private so an unchecked empty type name cannot reach an
/// interned [`Place`]:
///
/// ```compile_fail
/// use tensor_ir::{CustomPlace, Place};
///
/// let place = Place::Custom(CustomPlace {
///     device_type: String::new(),
///     device_id: 2,
/// });
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomPlace {
    device_type: String,
    device_id: u32,
}

impl CustomPlace {
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }
}

impl Place {
    /// Place on a plugged-in device type.
    ///
    /// Fails if `device_type` is empty, since the type name is what selects
    /// the device backend.
    pub fn custom(device_type: impl Into<String>, device_id: u32) -> IrResult<Self> {
        let device_type = device_type.into();
        if device_type.is_empty() {
            return Err(IrError::invalid_argument(format!(
                "custom place requires a device type name (device id {device_id})"
            )));
        }
        Ok(Place::Custom(CustomPlace {
            device_type,
            device_id,
        }))
    }

    pub fn device_id(&self) -> Option<u32> {
        match self {
            Place::Gpu(id) | Place::Xpu(id) => Some(*id),
            Place::Custom(custom) => Some(custom.device_id),
            Place::Undefined | Place::Cpu | Place::GpuPinned => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Undefined => f.write_str("undefined"),
            Place::Cpu => f.write_str("cpu"),
            Place::Gpu(id) => write!(f, "gpu:{id}"),
            Place::GpuPinned => f.write_str("gpu_pinned"),
            Place::Xpu(id) => write!(f, "xpu:{id}"),
            Place::Custom(custom) => write!(f, "{}:{}", custom.device_type, custom.device_id),
        }
    }
}

/// A single typed constant.
///
/// Floating-point values are stored as raw bits so the payload can be hashed;
/// two float scalars are equal iff their bit patterns are equal (so `0.0` and
/// `-0.0` differ, and a NaN equals itself).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(u32),
    Float64(u64),
}

impl Scalar {
    pub fn dtype(self) -> DataType {
        match self {
            Scalar::Bool(_) => DataType::Bool,
            Scalar::Int32(_) => DataType::Int32,
            Scalar::Int64(_) => DataType::Int64,
            Scalar::Float32(_) => DataType::Float32,
            Scalar::Float64(_) => DataType::Float64,
        }
    }

    /// Value widened to `f64`.
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => f64::from(u8::from(b)),
            Scalar::Int32(v) => f64::from(v),
            Scalar::Int64(v) => v as f64,
            Scalar::Float32(bits) => f64::from(f32::from_bits(bits)),
            Scalar::Float64(bits) => f64::from_bits(bits),
        }
    }

    /// Value as `i64`, if the scalar holds an integer or a bool.
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Scalar::Bool(b) => Some(i64::from(b)),
            Scalar::Int32(v) => Some(i64::from(v)),
            Scalar::Int64(v) => Some(v),
            Scalar::Float32(_) | Scalar::Float64(_) => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int32(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int64(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float32(value.to_bits())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float64(value.to_bits())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Scalar::Bool(b) => write!(f, "{b} : bool"),
            Scalar::Int32(v) => write!(f, "{v} : int32"),
            Scalar::Int64(v) => write!(f, "{v} : int64"),
            Scalar::Float32(bits) => write!(f, "{:?} : float32", f32::from_bits(bits)),
            Scalar::Float64(bits) => write!(f, "{:?} : float64", f64::from_bits(bits)),
        }
    }
}

/// A list of integers used for shapes, axes and similar operator arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntArray {
    values: SmallVec<[i64; 4]>,
    /// Set when the values come from a tensor evaluated at run time rather
    /// than from a compile-time constant.
    from_tensor: bool,
}

impl IntArray {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            from_tensor: false,
        }
    }

    pub fn from_tensor(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            from_tensor: true,
        }
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn is_from_tensor(&self) -> bool {
        self.from_tensor
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<i64>> for IntArray {
    fn from(values: Vec<i64>) -> Self {
        IntArray::new(values)
    }
}

impl From<&[i64]> for IntArray {
    fn from(values: &[i64]) -> Self {
        IntArray::new(values.iter().copied())
    }
}

impl fmt::Display for IntArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")?;
        if self.from_tensor {
            f.write_str(" from_tensor")?;
        }
        Ok(())
    }
}
