//! Destructive unification over a shared union-find type graph.
//! https://en.wikipedia.org/wiki/Hindley%e2%80%93Milner_type_system
//!
//! The outer solver generates equality constraints and hands them to
//! [`unify::Unifier::unify`] one at a time. Each call either merges the two
//! sides in the graph or records a structured mismatch and heals both sides
//! so the rest of inference keeps going.

pub mod error;
pub mod occurs;
pub mod print;
pub mod state;
pub mod types;
pub mod unify;
pub mod unionfind;

pub mod prelude {
    pub use crate::error::{Hint, Reason, Specific, TypeError, TypeErrors};
    pub use crate::occurs::occurs;
    pub use crate::print::{source_type, SourceType};
    pub use crate::state::{fresh, SolverState};
    pub use crate::types::*;
    pub use crate::unify::Unifier;
    pub use crate::unionfind::UnionFind;
}
