use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Content, Variable};

/// Generalization rank of an equivalence class.
///
/// The outer solver raises the rank as it enters let-scopes and reads it
/// back when deciding which variables generalize. Unification only ever
/// combines ranks with [`Rank::min`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Rank(u16);

impl Rank {
    /// The sentinel rank of healed error variables.
    pub const NONE: Rank = Rank(0);

    /// The rank of the outermost scope of a solver session.
    pub const OUTERMOST: Rank = Rank(1);

    pub fn new(rank: u16) -> Self {
        Self(rank)
    }

    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// The rank of the next inner scope.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation counter used by external traversals to tag visited classes.
///
/// Unification never interprets marks; it only resets them to [`Mark::NONE`]
/// whenever two classes merge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Mark(u32);

impl Mark {
    /// The "not visited" sentinel.
    pub const NONE: Mark = Mark(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// The payload stored at each representative of the union-find forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// The semantic shape of the equivalence class.
    pub content: Content,
    /// Generalization rank; `min` of both sides after a merge.
    pub rank: Rank,
    /// Traversal mark; reset to the sentinel after a merge.
    pub mark: Mark,
    /// Scratch slot for the instantiation pass; cleared after a merge.
    pub copy: Option<Variable>,
}

impl Descriptor {
    /// A descriptor with no mark and an empty copy slot.
    pub fn new(content: Content, rank: Rank) -> Self {
        Self {
            content,
            rank,
            mark: Mark::NONE,
            copy: None,
        }
    }
}
