use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};
use std::fmt;

use tilia_utils::interner::{DisplayWithInterner, StrInterner, StrKey};

/// The canonical constructors the unifier must recognize by name.
///
/// `Int` and `Float` are kept apart so that confusing one for the other can
/// be reported as its own mismatch instead of a generic clash.
#[derive(
    Debug,
    Display,
    FromStr,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum BuiltinType {
    Int,
    Float,
    Bool,
    Char,
    Str,
    List,
}

impl BuiltinType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Int" => Some(Self::Int),
            "Float" => Some(Self::Float),
            "Bool" => Some(Self::Bool),
            "Char" => Some(Self::Char),
            "Str" => Some(Self::Str),
            "List" => Some(Self::List),
            _ => None,
        }
    }
}

#[inline]
pub fn is_builtin_type(s: &str) -> bool {
    matches!(s, "Int" | "Float" | "Bool" | "Char" | "Str" | "List")
}

/// A type-constructor name as it appears in a constructor application.
///
/// Tuples carry their arity; everything that is not canonical is a `Custom`
/// constructor interned by the outer canonicalization pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TypeCtor {
    Builtin(BuiltinType),
    Tuple(usize),
    Custom(StrKey),
}

impl TypeCtor {
    pub const INT: Self = Self::Builtin(BuiltinType::Int);
    pub const FLOAT: Self = Self::Builtin(BuiltinType::Float);
    pub const BOOL: Self = Self::Builtin(BuiltinType::Bool);
    pub const CHAR: Self = Self::Builtin(BuiltinType::Char);
    pub const STR: Self = Self::Builtin(BuiltinType::Str);
    pub const LIST: Self = Self::Builtin(BuiltinType::List);

    pub fn is_tuple(&self) -> bool {
        matches!(self, Self::Tuple(_))
    }

    pub fn tuple_arity(&self) -> Option<usize> {
        match self {
            Self::Tuple(arity) => Some(*arity),
            _ => None,
        }
    }
}

impl From<BuiltinType> for TypeCtor {
    fn from(builtin: BuiltinType) -> Self {
        Self::Builtin(builtin)
    }
}

impl fmt::Display for TypeCtor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => write!(f, "{builtin}"),
            Self::Tuple(arity) => write!(f, "Tuple{arity}"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl DisplayWithInterner for TypeCtor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>, interner: &StrInterner) -> fmt::Result {
        match self {
            Self::Custom(name) => write!(f, "{}", &interner[*name]),
            other => write!(f, "{other}"),
        }
    }
}
