//! Recoverable errors surfaced by the IR core.
//!
//! Only payload validation and attribute lookups produce `IrError`s.
//! Broken graph invariants (destroying a used operation, double destroy,
//! out-of-range operand/result indices) are programmer errors and panic.

use derive_more::Display;

use crate::Symbol;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Clone, Display, Debug, PartialEq)]
#[display("{kind}")]
pub struct IrError {
    kind: Box<IrErrorKind>,
}

impl<E> From<E> for IrError
where
    IrErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        IrError {
            kind: Box::new(IrErrorKind::from(error)),
        }
    }
}

impl IrError {
    pub fn invalid_argument(msg: impl std::fmt::Display) -> Self {
        IrErrorKind::InvalidArgument(msg.to_string()).into()
    }

    pub fn attribute_not_found(op: impl std::fmt::Display, name: Symbol) -> Self {
        IrErrorKind::AttributeNotFound {
            op: op.to_string(),
            name,
        }
        .into()
    }

    pub fn attribute_kind_mismatch(
        name: Symbol,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        IrErrorKind::AttributeKindMismatch {
            name,
            expected,
            found,
        }
        .into()
    }

    pub fn kind(&self) -> &IrErrorKind {
        &self.kind
    }
}

#[derive(Clone, Display, Debug, PartialEq)]
pub enum IrErrorKind {
    #[display("Invalid argument: {_0}")]
    InvalidArgument(String),

    #[display("Attribute `{name}` not found on {op}")]
    AttributeNotFound { op: String, name: Symbol },

    #[display("Attribute `{name}` has kind {found}, expected {expected}")]
    AttributeKindMismatch {
        name: Symbol,
        expected: &'static str,
        found: &'static str,
    },
}

impl std::error::Error for IrError {}
