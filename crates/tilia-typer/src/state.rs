use tilia_span::Loc;

use crate::{
    error::{TypeError, TypeErrors},
    types::{Content, Descriptor, Rank, Variable},
    unionfind::UnionFind,
};

/// Session-wide bookkeeping: every live variable and every reported error.
///
/// The registry is what the later generalization and instantiation passes
/// walk, so every `fresh` must be followed by `register` before the variable
/// shows up in any structural position. The error sink is append-only within
/// a session.
#[derive(Debug, Default)]
pub struct SolverState {
    vars: Vec<Variable>,
    errors: TypeErrors,
}

impl SolverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, var: Variable) {
        self.vars.push(var);
    }

    pub fn add_error(&mut self, loc: Loc, error: TypeError) {
        self.errors.push((error, loc));
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn errors(&self) -> &TypeErrors {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    pub fn take_errors(&mut self) -> TypeErrors {
        self.errors.take()
    }
}

/// Allocates a new variable and registers it with the solver state.
pub fn fresh(
    uf: &mut UnionFind,
    state: &mut SolverState,
    content: Content,
    rank: Rank,
) -> Variable {
    let var = uf.fresh(Descriptor::new(content, rank));
    state.register(var);
    var
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;

    #[test]
    fn fresh_registers_the_variable() {
        let mut uf = UnionFind::new();
        let mut state = SolverState::new();

        let var = fresh(&mut uf, &mut state, Content::FlexVar(None), Rank::OUTERMOST);

        assert_eq!(state.vars(), &[var]);
        assert!(!state.has_errors());
    }
}
