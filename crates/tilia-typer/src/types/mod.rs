use serde::{Deserialize, Serialize};
use std::fmt;

mod builtin;
mod content;
mod descriptor;
mod var;

pub use builtin::*;
pub use content::*;
pub use descriptor::*;
pub use var::*;

/// A built-in ad-hoc constraint on a flexible or rigid variable.
///
/// The four values form a small lattice: `Number` and `Appendable` sit on
/// incomparable branches, `Comparable` overlaps both numbers and strings,
/// and `CompAppend` is the meet of `Comparable` and `Appendable`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Super {
    Number,
    Comparable,
    Appendable,
    CompAppend,
}

impl Super {
    /// Combines the constraints of two flexible variables.
    ///
    /// `None` means the constraints are incompatible and the variables can
    /// never denote the same type.
    pub fn combine(self, other: Self) -> Option<Self> {
        use Super::*;

        match (self, other) {
            (Number, Number) => Some(Number),
            (Number, Comparable) => Some(Number),
            (Number, Appendable) => None,
            (Number, CompAppend) => None,
            (Comparable, Number) => Some(Number),
            (Comparable, Comparable) => Some(Comparable),
            (Comparable, Appendable) => Some(CompAppend),
            (Comparable, CompAppend) => Some(CompAppend),
            (Appendable, Number) => None,
            (Appendable, Comparable) => Some(CompAppend),
            (Appendable, Appendable) => Some(Appendable),
            (Appendable, CompAppend) => Some(CompAppend),
            (CompAppend, Number) => None,
            (CompAppend, Comparable) => Some(CompAppend),
            (CompAppend, Appendable) => Some(CompAppend),
            (CompAppend, CompAppend) => Some(CompAppend),
        }
    }

    /// True when a rigid variable constrained to `rigid` satisfies a flexible
    /// variable constrained to `flex`.
    ///
    /// The rigid constraint must dominate the flexible one; a rigid may never
    /// become more specific to accommodate the flex side.
    pub fn rigid_absorbs(rigid: Self, flex: Self) -> bool {
        use Super::*;

        rigid == flex
            || matches!(
                (rigid, flex),
                (Number, Comparable) | (CompAppend, Comparable) | (CompAppend, Appendable)
            )
    }

    /// Membership of an atomic (nullary) constructor in this class.
    pub fn admits_atom(self, ctor: &TypeCtor) -> bool {
        use BuiltinType::*;

        match self {
            Super::Number => matches!(ctor, TypeCtor::Builtin(Int | Float)),
            Super::Comparable => matches!(ctor, TypeCtor::Builtin(Int | Float | Str | Char)),
            Super::Appendable => matches!(ctor, TypeCtor::Builtin(Str)),
            Super::CompAppend => matches!(ctor, TypeCtor::Builtin(Str)),
        }
    }
}

impl fmt::Display for Super {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Super::Number => write!(f, "number"),
            Super::Comparable => write!(f, "comparable"),
            Super::Appendable => write!(f, "appendable"),
            Super::CompAppend => write!(f, "compappend"),
        }
    }
}
