//! Source positions and related helper functions.
//!
//! The unification engine never computes positions itself; the outer solver
//! hands every constraint a pre-computed [`Loc`] which is carried through to
//! the error sink unchanged.

mod loc;
mod span;

pub use loc::{Loc, Located, SourceId};
pub use span::{Span, Spanned};
