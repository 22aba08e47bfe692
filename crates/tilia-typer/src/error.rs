use serde::{Deserialize, Serialize};
use thiserror::Error;

use tilia_span::Located;
use tilia_utils::{interner::StrKey, Errors};

use crate::{
    print::SourceType,
    types::{FlatType, Super, TypeCtor},
};

pub type TypeErrors = Errors<Located<TypeError>>;

/// Opaque origin tag for a constraint, prepared by the constraint generator
/// and threaded through to the reporter unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hint(pub StrKey);

/// A structured unification failure.
///
/// These carry no prose beyond their `Display` fallback; turning them into
/// full messages is the reporter's job.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeError {
    #[error("Cannot Unify: expected `{expected}` but got `{actual}`")]
    Mismatch {
        hint: Hint,
        expected: SourceType,
        actual: SourceType,
        reason: Option<Reason>,
    },
    #[error("Infinite Type: `{ty}`")]
    InfiniteType { hint: Hint, ty: SourceType },
}

/// The specific cause of a mismatch, when one can be named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    /// Individual record fields failed to unify; the field set itself was
    /// fine.
    BadFields(Vec<(StrKey, Option<Reason>)>),
    /// A closed row is missing fields the other side requires.
    MessyFields {
        shared: Vec<StrKey>,
        only_left: Vec<StrKey>,
        only_right: Vec<StrKey>,
    },
    /// One side is `Int` where the other is `Float`.
    IntFloat,
    /// A tuple wider than the comparable cap. The cap is a language design
    /// limit, not an implementation artifact.
    TooLongComparableTuple(usize),
    /// The function spines have different lengths.
    MissingArgs(usize),
    /// Two rigid variables with different names.
    RigidClash(StrKey, StrKey),
    /// A concrete type outside the membership of a super class.
    NotPartOfSuper(Super),
    /// A rigid variable asked to become something more specific.
    RigidVarTooGeneric { name: StrKey, typed_as: Specific },
    /// A constrained rigid variable asked to become something more specific.
    RigidSuperTooGeneric {
        class: Super,
        name: StrKey,
        typed_as: Specific,
    },
}

impl Reason {
    /// Restates the reason from the other side of the constraint.
    ///
    /// Applied at report time when the context was in actual-before-expected
    /// orientation so messages always read expected-first.
    pub fn flip(self) -> Self {
        match self {
            Self::BadFields(fields) => Self::BadFields(
                fields
                    .into_iter()
                    .map(|(field, reason)| (field, reason.map(Self::flip)))
                    .collect(),
            ),
            Self::MessyFields {
                shared,
                only_left,
                only_right,
            } => Self::MessyFields {
                shared,
                only_left: only_right,
                only_right: only_left,
            },
            Self::RigidClash(left, right) => Self::RigidClash(right, left),
            other => other,
        }
    }
}

/// What a rigid variable was asked to become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specific {
    Super(Super),
    Type(TypeCtor),
    Function,
    Record,
}

impl From<&FlatType> for Specific {
    fn from(flat: &FlatType) -> Self {
        match flat {
            FlatType::App(ctor, _) => Self::Type(*ctor),
            FlatType::Func(_, _) => Self::Function,
            FlatType::EmptyRecord | FlatType::Record(_, _) => Self::Record,
        }
    }
}
