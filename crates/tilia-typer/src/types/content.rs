use std::collections::BTreeMap;

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use tilia_utils::interner::StrKey;

use super::{BuiltinType, Super, TypeCtor, Variable};

/// The semantic shape of an equivalence class.
///
/// `Error` is the one absorbing shape: it is installed when a mismatch has
/// already been reported and silently unifies with everything afterwards,
/// which is what keeps one bad constraint from producing a cascade.
#[derive(Debug, EnumAsInner, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    /// An unconstrained inference variable, possibly carrying the name the
    /// user wrote for it.
    FlexVar(Option<StrKey>),
    /// An inference variable constrained to membership in a super class.
    FlexSuper(Super, Option<StrKey>),
    /// A user-introduced variable; unifies only with itself or a compatible
    /// flexible variable.
    RigidVar(StrKey),
    /// A rigid variable additionally constrained to a super class.
    RigidSuper(Super, StrKey),
    /// A named alias. Transparent for equality, but the name and arguments
    /// are preserved so error messages can show what the user wrote.
    Alias {
        name: StrKey,
        args: Vec<(StrKey, Variable)>,
        real: Variable,
    },
    /// A concrete type constructor application.
    Structure(FlatType),
    /// The absorbing shape installed after an error has been reported.
    Error,
}

impl From<FlatType> for Content {
    fn from(flat: FlatType) -> Self {
        Self::Structure(flat)
    }
}

/// One level of concrete type structure.
#[derive(Debug, EnumAsInner, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlatType {
    /// A constructor applied to arguments; tuples and `List` use their
    /// canonical [`TypeCtor`]s.
    App(TypeCtor, Vec<Variable>),
    /// A curried function arrow. Arity is recovered by walking the result
    /// spine.
    Func(Variable, Variable),
    /// The closed empty row.
    EmptyRecord,
    /// A row with known fields and a tail that may resolve to more fields,
    /// to the closed empty row, or to a flexible variable.
    Record(BTreeMap<StrKey, Variable>, Variable),
}

impl FlatType {
    pub fn atom(builtin: BuiltinType) -> Self {
        Self::App(TypeCtor::Builtin(builtin), Vec::new())
    }

    pub fn list(elem: Variable) -> Self {
        Self::App(TypeCtor::LIST, vec![elem])
    }

    pub fn tuple(elems: Vec<Variable>) -> Self {
        Self::App(TypeCtor::Tuple(elems.len()), elems)
    }
}
