use std::collections::BTreeMap;

use log::trace;

use tilia_span::Loc;
use tilia_utils::interner::StrKey;

use crate::{
    error::{Hint, Reason, Specific, TypeError},
    occurs::occurs,
    print::source_type,
    state::{fresh, SolverState},
    types::{BuiltinType, Content, Descriptor, FlatType, Rank, Super, TypeCtor, Variable},
    unionfind::UnionFind,
};

/// Tuples wider than this are never comparable. A language design limit, not
/// an implementation artifact.
const MAX_COMPARABLE_TUPLE: usize = 6;

/// Which side of the constraint each context slot came from.
///
/// Orientation only matters for messages: reasons are stated expected-first,
/// so a reason produced under `ActualExpected` is flipped at the report
/// site. Structural recursion passes orientation through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    ExpectedActual,
    ActualExpected,
}

impl Orientation {
    fn flip(self) -> Self {
        match self {
            Self::ExpectedActual => Self::ActualExpected,
            Self::ActualExpected => Self::ExpectedActual,
        }
    }
}

/// Local failure channel of the unifier.
///
/// Caught only at the top frame of [`Unifier::unify`] and at the two partial
/// recovery points: the per-field loop of record unification and the
/// argument-spine fallback of [`Unifier::mismatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Problem {
    Typical,
    Special(Reason),
    Infinite,
}

type Answer = Result<(), Problem>;

/// The two sides of the constraint currently being unified, with their
/// descriptors as read at dispatch time.
#[derive(Debug, Clone)]
struct Context {
    orientation: Orientation,
    first: Variable,
    first_desc: Descriptor,
    second: Variable,
    second_desc: Descriptor,
}

impl Context {
    fn reorient(&self) -> Self {
        Self {
            orientation: self.orientation.flip(),
            first: self.second,
            first_desc: self.second_desc.clone(),
            second: self.first,
            second_desc: self.first_desc.clone(),
        }
    }

    fn rank(&self) -> Rank {
        self.first_desc.rank.min(self.second_desc.rank)
    }
}

/// The shape a row's tail resolved to while gathering fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowShape {
    Empty,
    Extension,
}

/// A record flattened across its chain of extensions.
#[derive(Debug)]
struct Row {
    fields: BTreeMap<StrKey, Variable>,
    ext: Variable,
    shape: RowShape,
}

/// Destructive unification over a shared union-find graph.
///
/// One `Unifier` lives for one constraint at a time; the graph and the
/// solver state outlive it for the whole session.
pub struct Unifier<'a> {
    uf: &'a mut UnionFind,
    state: &'a mut SolverState,
}

impl<'a> Unifier<'a> {
    pub fn new(uf: &'a mut UnionFind, state: &'a mut SolverState) -> Self {
        Self { uf, state }
    }

    /// Unifies the expected and actual sides of a constraint.
    ///
    /// On success the two variables share one representative. On failure a
    /// structured error is appended to the solver state and both variables
    /// are healed to [`Content::Error`], so later constraints touching
    /// either side succeed silently instead of cascading.
    pub fn unify(&mut self, hint: Hint, loc: Loc, expected: Variable, actual: Variable) {
        trace!("UNIFY: {} ≈ {}", expected, actual);

        if let Err(problem) = self.guarded_unify(Orientation::ExpectedActual, expected, actual) {
            let expected_type = source_type(self.uf, expected);
            let actual_type = source_type(self.uf, actual);

            self.uf.union(
                expected,
                actual,
                Descriptor::new(Content::Error, Rank::NONE),
            );

            let error = match problem {
                Problem::Typical => TypeError::Mismatch {
                    hint,
                    expected: expected_type,
                    actual: actual_type,
                    reason: None,
                },
                Problem::Special(reason) => TypeError::Mismatch {
                    hint,
                    expected: expected_type,
                    actual: actual_type,
                    reason: Some(reason),
                },
                Problem::Infinite => TypeError::InfiniteType {
                    hint,
                    ty: actual_type,
                },
            };

            trace!("UNIFY FAILED: {error}");
            self.state.add_error(loc, error);
        }
    }

    fn guarded_unify(
        &mut self,
        orientation: Orientation,
        first: Variable,
        second: Variable,
    ) -> Answer {
        if self.uf.equivalent(first, second) {
            return Ok(());
        }

        let first_desc = self.uf.descriptor(first).clone();
        let second_desc = self.uf.descriptor(second).clone();

        self.actually_unify(Context {
            orientation,
            first,
            first_desc,
            second,
            second_desc,
        })
    }

    fn sub_unify(&mut self, ctx: &Context, first: Variable, second: Variable) -> Answer {
        self.guarded_unify(ctx.orientation, first, second)
    }

    fn actually_unify(&mut self, ctx: Context) -> Answer {
        match ctx.first_desc.content.clone() {
            Content::FlexVar(_) => self.unify_flex(ctx),
            Content::FlexSuper(class, _) => self.unify_flex_super(ctx, class),
            Content::RigidVar(name) => self.unify_rigid(ctx, None, name),
            Content::RigidSuper(class, name) => self.unify_rigid(ctx, Some(class), name),
            Content::Alias { name, args, real } => self.unify_alias(ctx, name, args, real),
            Content::Structure(flat) => self.unify_structure(ctx, flat),
            Content::Error => Ok(()),
        }
    }

    /// Writes `content` into the shared root of both context variables.
    fn merge(&mut self, ctx: &Context, content: Content) -> Answer {
        self.uf
            .union(ctx.first, ctx.second, Descriptor::new(content, ctx.rank()));
        Ok(())
    }

    /// Allocates and registers a helper variable at the context's rank.
    fn fresh(&mut self, ctx: &Context, content: Content) -> Variable {
        fresh(self.uf, self.state, content, ctx.rank())
    }

    /// A flexible variable absorbs whatever sits on the other side.
    fn unify_flex(&mut self, ctx: Context) -> Answer {
        let content = match (&ctx.first_desc.content, &ctx.second_desc.content) {
            (_, Content::Error) => return Ok(()),
            // an unnamed flex on the other side must not erase our name
            (Content::FlexVar(name @ Some(_)), Content::FlexVar(None)) => Content::FlexVar(*name),
            _ => ctx.second_desc.content.clone(),
        };
        self.merge(&ctx, content)
    }

    fn unify_flex_super(&mut self, ctx: Context, class: Super) -> Answer {
        match ctx.second_desc.content.clone() {
            Content::Error => Ok(()),
            Content::FlexVar(_) => {
                let content = ctx.first_desc.content.clone();
                self.merge(&ctx, content)
            }
            Content::FlexSuper(other_class, _) => match class.combine(other_class) {
                None => self.mismatch(&ctx, None),
                Some(combined) if combined == class => {
                    let content = ctx.first_desc.content.clone();
                    self.merge(&ctx, content)
                }
                Some(combined) if combined == other_class => {
                    let content = ctx.second_desc.content.clone();
                    self.merge(&ctx, content)
                }
                Some(combined) => self.merge(&ctx, Content::FlexSuper(combined, None)),
            },
            Content::RigidVar(name) => self.mismatch(
                &ctx,
                Some(Reason::RigidVarTooGeneric {
                    name,
                    typed_as: Specific::Super(class),
                }),
            ),
            Content::RigidSuper(rigid_class, name) => {
                if Super::rigid_absorbs(rigid_class, class) {
                    let content = ctx.second_desc.content.clone();
                    self.merge(&ctx, content)
                } else {
                    self.mismatch(
                        &ctx,
                        Some(Reason::RigidSuperTooGeneric {
                            class: rigid_class,
                            name,
                            typed_as: Specific::Super(class),
                        }),
                    )
                }
            }
            Content::Alias { real, .. } => self.sub_unify(&ctx, ctx.first, real),
            Content::Structure(flat) => self.unify_flex_super_structure(ctx, class, flat),
        }
    }

    /// A rigid variable never becomes more specific; at most it absorbs a
    /// compatible flexible variable.
    fn unify_rigid(&mut self, ctx: Context, class: Option<Super>, name: StrKey) -> Answer {
        match ctx.second_desc.content.clone() {
            Content::FlexVar(_) => {
                let content = ctx.first_desc.content.clone();
                self.merge(&ctx, content)
            }
            Content::FlexSuper(other_class, _) => match class {
                Some(rigid_class) if Super::rigid_absorbs(rigid_class, other_class) => {
                    let content = ctx.first_desc.content.clone();
                    self.merge(&ctx, content)
                }
                _ => self.mismatch(
                    &ctx,
                    Some(rigid_too_generic(class, name, Specific::Super(other_class))),
                ),
            },
            Content::RigidVar(other_name) | Content::RigidSuper(_, other_name) => {
                self.mismatch(&ctx, Some(Reason::RigidClash(name, other_name)))
            }
            Content::Alias {
                name: other_name, ..
            } => self.mismatch(
                &ctx,
                Some(rigid_too_generic(
                    class,
                    name,
                    Specific::Type(TypeCtor::Custom(other_name)),
                )),
            ),
            Content::Structure(flat) => self.mismatch(
                &ctx,
                Some(rigid_too_generic(class, name, Specific::from(&flat))),
            ),
            Content::Error => Ok(()),
        }
    }

    fn unify_alias(
        &mut self,
        ctx: Context,
        name: StrKey,
        args: Vec<(StrKey, Variable)>,
        real: Variable,
    ) -> Answer {
        match ctx.second_desc.content.clone() {
            Content::FlexVar(_) => self.merge(&ctx, Content::Alias { name, args, real }),
            Content::Alias {
                name: other_name,
                args: other_args,
                real: other_real,
            } => {
                if name == other_name {
                    // argument-by-argument localizes errors better than
                    // jumping straight to the expansions
                    let vars: Vec<Variable> = args.iter().map(|(_, var)| *var).collect();
                    let other_vars: Vec<Variable> =
                        other_args.iter().map(|(_, var)| *var).collect();
                    self.unify_args(&ctx, &vars, &other_vars)?;
                    let content = ctx.second_desc.content.clone();
                    self.merge(&ctx, content)
                } else {
                    self.sub_unify(&ctx, real, other_real)
                }
            }
            Content::Error => Ok(()),
            _ => self.sub_unify(&ctx, real, ctx.second),
        }
    }

    fn unify_structure(&mut self, ctx: Context, flat: FlatType) -> Answer {
        match ctx.second_desc.content.clone() {
            Content::FlexVar(_) => self.merge(&ctx, Content::Structure(flat)),
            Content::FlexSuper(class, _) => {
                self.unify_flex_super_structure(ctx.reorient(), class, flat)
            }
            Content::RigidVar(name) => self.mismatch(
                &ctx,
                Some(rigid_too_generic(None, name, Specific::from(&flat))),
            ),
            Content::RigidSuper(class, name) => self.mismatch(
                &ctx,
                Some(rigid_too_generic(Some(class), name, Specific::from(&flat))),
            ),
            Content::Alias { real, .. } => self.sub_unify(&ctx, ctx.first, real),
            Content::Structure(other_flat) => self.unify_flat_types(&ctx, flat, other_flat),
            Content::Error => Ok(()),
        }
    }

    fn unify_flat_types(&mut self, ctx: &Context, flat1: FlatType, flat2: FlatType) -> Answer {
        match (flat1, flat2) {
            (FlatType::App(ctor1, args1), FlatType::App(ctor2, args2)) => {
                if ctor1 == ctor2 {
                    self.unify_args(ctx, &args1, &args2)?;
                    self.merge(ctx, Content::Structure(FlatType::App(ctor2, args2)))
                } else if clashes_int_float(&ctor1, &ctor2) {
                    self.mismatch(ctx, Some(Reason::IntFloat))
                } else {
                    self.mismatch(ctx, None)
                }
            }
            (FlatType::Func(arg1, result1), FlatType::Func(arg2, result2)) => {
                self.sub_unify(ctx, arg1, arg2)?;
                self.sub_unify(ctx, result1, result2)?;
                self.merge(ctx, Content::Structure(FlatType::Func(arg2, result2)))
            }
            (FlatType::EmptyRecord, FlatType::EmptyRecord) => {
                self.merge(ctx, Content::Structure(FlatType::EmptyRecord))
            }
            (FlatType::EmptyRecord, FlatType::Record(fields, ext)) if fields.is_empty() => {
                self.sub_unify(ctx, ctx.first, ext)
            }
            (FlatType::Record(fields, ext), FlatType::EmptyRecord) if fields.is_empty() => {
                self.sub_unify(ctx, ext, ctx.second)
            }
            (FlatType::Record(fields1, ext1), FlatType::Record(fields2, ext2)) => {
                self.unify_record(ctx, fields1, ext1, fields2, ext2)
            }
            _ => self.mismatch(ctx, None),
        }
    }

    fn unify_args(&mut self, ctx: &Context, args1: &[Variable], args2: &[Variable]) -> Answer {
        if args1.len() != args2.len() {
            return self.mismatch(ctx, None);
        }

        for (first, second) in args1.iter().zip(args2) {
            self.sub_unify(ctx, *first, *second)?;
        }

        Ok(())
    }

    /// Membership of a concrete type in a super class; `ctx.first` is the
    /// constrained variable and `ctx.second` the structure.
    fn unify_flex_super_structure(
        &mut self,
        ctx: Context,
        class: Super,
        flat: FlatType,
    ) -> Answer {
        match flat {
            FlatType::App(ctor, args) if args.is_empty() => {
                if class.admits_atom(&ctor) {
                    self.merge(&ctx, Content::Structure(FlatType::App(ctor, args)))
                } else {
                    self.mismatch(&ctx, Some(Reason::NotPartOfSuper(class)))
                }
            }
            FlatType::App(TypeCtor::Builtin(BuiltinType::List), args) if args.len() == 1 => {
                let elem = args[0];
                match class {
                    Super::Number => self.mismatch(&ctx, Some(Reason::NotPartOfSuper(class))),
                    Super::Appendable => {
                        self.merge(&ctx, Content::Structure(FlatType::list(elem)))
                    }
                    Super::Comparable | Super::CompAppend => {
                        if occurs(self.uf, ctx.second) {
                            return Err(Problem::Infinite);
                        }
                        self.merge(&ctx, Content::Structure(FlatType::list(elem)))?;
                        self.unify_comparable_recursive(ctx.orientation, elem)
                    }
                }
            }
            FlatType::App(ctor @ TypeCtor::Tuple(_), args) => match class {
                Super::Comparable => {
                    if args.len() > MAX_COMPARABLE_TUPLE {
                        self.mismatch(&ctx, Some(Reason::TooLongComparableTuple(args.len())))
                    } else {
                        if occurs(self.uf, ctx.second) {
                            return Err(Problem::Infinite);
                        }
                        self.merge(&ctx, Content::Structure(FlatType::App(ctor, args.clone())))?;
                        for elem in args {
                            self.unify_comparable_recursive(ctx.orientation, elem)?;
                        }
                        Ok(())
                    }
                }
                _ => self.mismatch(&ctx, Some(Reason::NotPartOfSuper(class))),
            },
            _ => self.mismatch(&ctx, Some(Reason::NotPartOfSuper(class))),
        }
    }

    /// Forces `var` to satisfy `Comparable` by unifying it with a fresh
    /// comparable variable at its own rank.
    fn unify_comparable_recursive(&mut self, orientation: Orientation, var: Variable) -> Answer {
        let rank = self.uf.descriptor(var).rank;
        let comparable = fresh(
            self.uf,
            self.state,
            Content::FlexSuper(Super::Comparable, None),
            rank,
        );
        self.guarded_unify(orientation, comparable, var)
    }

    /// Follows a row's chain of record tails, collecting every field.
    ///
    /// Outer fields win over tail fields with the same name. Aliases in tail
    /// position are followed through their expansion.
    fn gather_fields(&mut self, mut fields: BTreeMap<StrKey, Variable>, ext: Variable) -> Row {
        match self.uf.descriptor(ext).content.clone() {
            Content::Structure(FlatType::Record(sub_fields, sub_ext)) => {
                for (name, var) in sub_fields {
                    fields.entry(name).or_insert(var);
                }
                self.gather_fields(fields, sub_ext)
            }
            Content::Structure(FlatType::EmptyRecord) => Row {
                fields,
                ext,
                shape: RowShape::Empty,
            },
            Content::Alias { real, .. } => self.gather_fields(fields, real),
            _ => Row {
                fields,
                ext,
                shape: RowShape::Extension,
            },
        }
    }

    fn unify_record(
        &mut self,
        ctx: &Context,
        fields1: BTreeMap<StrKey, Variable>,
        ext1: Variable,
        fields2: BTreeMap<StrKey, Variable>,
        ext2: Variable,
    ) -> Answer {
        let row1 = self.gather_fields(fields1, ext1);
        let row2 = self.gather_fields(fields2, ext2);

        let mut shared = Vec::new();
        let mut only_left = BTreeMap::new();
        let mut only_right = row2.fields;
        for (name, left) in row1.fields {
            match only_right.remove(&name) {
                Some(right) => shared.push((name, left, right)),
                None => {
                    only_left.insert(name, left);
                }
            }
        }

        match (
            row1.shape,
            only_left.is_empty(),
            row2.shape,
            only_right.is_empty(),
        ) {
            // identical field sets; the tails carry whatever is left
            (_, true, _, true) => {
                self.sub_unify(ctx, row1.ext, row2.ext)?;
                self.unify_shared_fields(ctx, shared, BTreeMap::new(), row1.ext)
            }
            // a closed row cannot supply the missing fields
            (RowShape::Empty, _, _, false) | (_, false, RowShape::Empty, _) => {
                let shared_names = shared.iter().map(|(name, _, _)| *name).collect();
                self.mismatch(
                    ctx,
                    Some(Reason::MessyFields {
                        shared: shared_names,
                        only_left: only_left.keys().copied().collect(),
                        only_right: only_right.keys().copied().collect(),
                    }),
                )
            }
            // our extras must flow into the other side's tail
            (_, false, _, true) => {
                let sub_record =
                    self.fresh(ctx, Content::Structure(FlatType::Record(only_left, row1.ext)));
                self.sub_unify(ctx, sub_record, row2.ext)?;
                self.unify_shared_fields(ctx, shared, BTreeMap::new(), sub_record)
            }
            (_, true, _, false) => {
                let sub_record = self.fresh(
                    ctx,
                    Content::Structure(FlatType::Record(only_right, row2.ext)),
                );
                self.sub_unify(ctx, row1.ext, sub_record)?;
                self.unify_shared_fields(ctx, shared, BTreeMap::new(), sub_record)
            }
            // both sides have extras; split the row around a fresh tail
            (_, false, _, false) => {
                let mut other_fields = only_left.clone();
                other_fields.extend(only_right.clone());

                let ext = self.fresh(ctx, Content::FlexVar(None));
                let sub_left =
                    self.fresh(ctx, Content::Structure(FlatType::Record(only_left, ext)));
                let sub_right =
                    self.fresh(ctx, Content::Structure(FlatType::Record(only_right, ext)));

                self.sub_unify(ctx, row1.ext, sub_right)?;
                self.sub_unify(ctx, sub_left, row2.ext)?;
                self.unify_shared_fields(ctx, shared, other_fields, ext)
            }
        }
    }

    /// Unifies every shared field pair, collecting failures instead of
    /// stopping at the first one so the report covers the whole record.
    fn unify_shared_fields(
        &mut self,
        ctx: &Context,
        shared: Vec<(StrKey, Variable, Variable)>,
        other_fields: BTreeMap<StrKey, Variable>,
        ext: Variable,
    ) -> Answer {
        let mut all_fields = other_fields;
        let mut bad_fields = Vec::new();

        for (name, left, right) in shared {
            match self.sub_unify(ctx, left, right) {
                Ok(()) => {
                    all_fields.insert(name, left);
                }
                Err(Problem::Special(reason)) => bad_fields.push((name, Some(reason))),
                Err(_) => bad_fields.push((name, None)),
            }
        }

        if bad_fields.is_empty() {
            self.merge(ctx, Content::Structure(FlatType::Record(all_fields, ext)))
        } else {
            self.mismatch(ctx, Some(Reason::BadFields(bad_fields)))
        }
    }

    /// Turns a failed rule into a [`Problem`], upgrading to `Infinite` when
    /// either side is self-referential.
    ///
    /// An otherwise unexplained mismatch whose function spines disagree in
    /// length becomes `MissingArgs`; a reason diagnosed by a rule is never
    /// overridden by the arity heuristic.
    fn mismatch(&mut self, ctx: &Context, reason: Option<Reason>) -> Answer {
        if occurs(self.uf, ctx.first) || occurs(self.uf, ctx.second) {
            return Err(Problem::Infinite);
        }

        if let Some(reason) = reason {
            let reason = match ctx.orientation {
                Orientation::ExpectedActual => reason,
                Orientation::ActualExpected => reason.flip(),
            };
            return Err(Problem::Special(reason));
        }

        let spine1 = self.collect_args(ctx.first);
        let spine2 = self.collect_args(ctx.second);

        if spine1.len() != spine2.len() {
            // best-effort pass over the overlap; failures stay in this loop
            for (first, second) in spine1.iter().zip(spine2.iter()) {
                let _ = self.guarded_unify(ctx.orientation, *first, *second);
            }
            return Err(Problem::Special(Reason::MissingArgs(
                spine1.len().abs_diff(spine2.len()),
            )));
        }

        Err(Problem::Typical)
    }

    /// Peels the function spine off `var`: arguments left to right, then the
    /// final result. Non-functions collect as a one-element spine.
    fn collect_args(&mut self, var: Variable) -> Vec<Variable> {
        let mut spine = Vec::new();
        let mut current = var;

        loop {
            match &self.uf.descriptor(current).content {
                Content::Structure(FlatType::Func(arg, result)) => {
                    spine.push(*arg);
                    current = *result;
                }
                _ => break,
            }
        }

        spine.push(current);
        spine
    }
}

fn rigid_too_generic(class: Option<Super>, name: StrKey, typed_as: Specific) -> Reason {
    match class {
        Some(class) => Reason::RigidSuperTooGeneric {
            class,
            name,
            typed_as,
        },
        None => Reason::RigidVarTooGeneric { name, typed_as },
    }
}

fn clashes_int_float(a: &TypeCtor, b: &TypeCtor) -> bool {
    matches!(
        (a, b),
        (
            TypeCtor::Builtin(BuiltinType::Int),
            TypeCtor::Builtin(BuiltinType::Float)
        ) | (
            TypeCtor::Builtin(BuiltinType::Float),
            TypeCtor::Builtin(BuiltinType::Int)
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mark;
    use tilia_span::{SourceId, Span};
    use tilia_utils::interner::StrInterner;

    struct Session {
        uf: UnionFind,
        state: SolverState,
        interner: StrInterner,
    }

    impl Session {
        fn new() -> Self {
            Self {
                uf: UnionFind::new(),
                state: SolverState::new(),
                interner: StrInterner::new(),
            }
        }

        fn loc() -> Loc {
            Loc::new(SourceId::new(0), Span::new(0, 0))
        }

        fn fresh_at(&mut self, content: Content, rank: Rank) -> Variable {
            fresh(&mut self.uf, &mut self.state, content, rank)
        }

        fn fresh(&mut self, content: Content) -> Variable {
            self.fresh_at(content, Rank::OUTERMOST)
        }

        fn flex(&mut self) -> Variable {
            self.fresh(Content::FlexVar(None))
        }

        fn flex_super(&mut self, class: Super) -> Variable {
            self.fresh(Content::FlexSuper(class, None))
        }

        fn rigid(&mut self, name: &str) -> Variable {
            let name = self.interner.intern(name);
            self.fresh(Content::RigidVar(name))
        }

        fn atom(&mut self, builtin: BuiltinType) -> Variable {
            self.fresh(Content::Structure(FlatType::atom(builtin)))
        }

        fn list(&mut self, elem: Variable) -> Variable {
            self.fresh(Content::Structure(FlatType::list(elem)))
        }

        fn tuple(&mut self, elems: Vec<Variable>) -> Variable {
            self.fresh(Content::Structure(FlatType::tuple(elems)))
        }

        fn func(&mut self, arg: Variable, result: Variable) -> Variable {
            self.fresh(Content::Structure(FlatType::Func(arg, result)))
        }

        fn record(&mut self, fields: &[(&str, Variable)], ext: Variable) -> Variable {
            let mut map = BTreeMap::new();
            for (name, var) in fields {
                map.insert(self.interner.intern(*name), *var);
            }
            self.fresh(Content::Structure(FlatType::Record(map, ext)))
        }

        fn closed_record(&mut self, fields: &[(&str, Variable)]) -> Variable {
            let empty = self.fresh(Content::Structure(FlatType::EmptyRecord));
            self.record(fields, empty)
        }

        fn alias(&mut self, name: &str, args: &[(&str, Variable)], real: Variable) -> Variable {
            let name = self.interner.intern(name);
            let args = args
                .iter()
                .map(|(arg_name, var)| (self.interner.intern(*arg_name), *var))
                .collect();
            self.fresh(Content::Alias { name, args, real })
        }

        fn unify(&mut self, expected: Variable, actual: Variable) {
            let hint = Hint(self.interner.intern("local"));
            Unifier::new(&mut self.uf, &mut self.state).unify(
                hint,
                Self::loc(),
                expected,
                actual,
            );
        }

        fn content(&mut self, var: Variable) -> Content {
            self.uf.descriptor(var).content.clone()
        }

        fn key(&mut self, name: &str) -> StrKey {
            self.interner.intern(name)
        }

        fn last_reason(&self) -> Option<Reason> {
            match self.state.errors().last() {
                Some((TypeError::Mismatch { reason, .. }, _)) => reason.clone(),
                Some((other, _)) => panic!("expected a mismatch, got {other:?}"),
                None => panic!("expected an error"),
            }
        }
    }

    #[test]
    fn unifies_identical_atoms() {
        let mut s = Session::new();
        let a = s.atom(BuiltinType::Int);
        let b = s.atom(BuiltinType::Int);

        s.unify(a, b);

        assert!(!s.state.has_errors());
        assert!(s.uf.equivalent(a, b));
    }

    #[test]
    fn unify_with_self_is_quiet() {
        let mut s = Session::new();
        let int = s.atom(BuiltinType::Int);
        let var = s.list(int);
        let before = s.content(var);

        s.unify(var, var);

        assert!(!s.state.has_errors());
        assert_eq!(s.content(var), before);
    }

    #[test]
    fn int_vs_float_names_the_confusion() {
        let mut s = Session::new();
        let int = s.atom(BuiltinType::Int);
        let float = s.atom(BuiltinType::Float);

        s.unify(int, float);

        assert_eq!(s.state.errors().len(), 1);
        assert_eq!(s.last_reason(), Some(Reason::IntFloat));
    }

    #[test]
    fn healing_breaks_cascades() {
        let mut s = Session::new();
        let int = s.atom(BuiltinType::Int);
        let float = s.atom(BuiltinType::Float);

        s.unify(int, float);

        assert!(s.content(int).is_error());
        assert!(s.content(float).is_error());

        s.unify(int, float);
        let bool_ = s.atom(BuiltinType::Bool);
        s.unify(int, bool_);

        assert_eq!(s.state.errors().len(), 1);
    }

    #[test]
    fn flex_absorbs_structure() {
        let mut s = Session::new();
        let var = s.flex();
        let int = s.atom(BuiltinType::Int);

        s.unify(var, int);

        assert!(!s.state.has_errors());
        assert!(s.content(var).is_structure());
    }

    #[test]
    fn named_flex_keeps_its_name_against_unnamed() {
        let mut s = Session::new();
        let name = s.key("a");
        let named = s.fresh(Content::FlexVar(Some(name)));
        let unnamed = s.flex();

        s.unify(named, unnamed);

        assert_eq!(s.content(unnamed), Content::FlexVar(Some(name)));
    }

    #[test]
    fn merged_rank_is_the_minimum() {
        let mut s = Session::new();
        let outer = s.fresh_at(Content::FlexVar(None), Rank::new(1));
        let inner = s.fresh_at(Content::FlexVar(None), Rank::new(3));

        s.unify(inner, outer);

        assert_eq!(s.uf.descriptor(inner).rank, Rank::new(1));
        assert_eq!(s.uf.descriptor(outer).rank, Rank::new(1));
    }

    #[test]
    fn merge_resets_mark_and_copy() {
        let mut s = Session::new();
        let a = s.flex();
        let b = s.flex();
        s.uf.descriptor_mut(a).mark = Mark::NONE.next();
        s.uf.descriptor_mut(b).copy = Some(a);

        s.unify(a, b);

        assert_eq!(s.uf.descriptor(a).mark, Mark::NONE);
        assert_eq!(s.uf.descriptor(a).copy, None);
    }

    #[test]
    fn comparable_meets_appendable() {
        let mut s = Session::new();
        let comparable = s.flex_super(Super::Comparable);
        let appendable = s.flex_super(Super::Appendable);

        s.unify(comparable, appendable);

        assert!(!s.state.has_errors());
        assert!(s.uf.equivalent(comparable, appendable));
        assert_eq!(
            s.content(comparable),
            Content::FlexSuper(Super::CompAppend, None)
        );
    }

    #[test]
    fn number_clashes_with_appendable() {
        let mut s = Session::new();
        let number = s.flex_super(Super::Number);
        let appendable = s.flex_super(Super::Appendable);

        s.unify(number, appendable);

        assert_eq!(s.last_reason(), None);
    }

    #[test]
    fn number_absorbs_int() {
        let mut s = Session::new();
        let number = s.flex_super(Super::Number);
        let int = s.atom(BuiltinType::Int);

        s.unify(number, int);

        assert!(!s.state.has_errors());
        assert!(s.content(number).is_structure());
    }

    #[test]
    fn number_rejects_str() {
        let mut s = Session::new();
        let number = s.flex_super(Super::Number);
        let str_ = s.atom(BuiltinType::Str);

        s.unify(number, str_);

        assert_eq!(s.last_reason(), Some(Reason::NotPartOfSuper(Super::Number)));
    }

    #[test]
    fn comparable_list_forces_its_element() {
        let mut s = Session::new();
        let elem = s.flex();
        let list = s.list(elem);
        let comparable = s.flex_super(Super::Comparable);

        s.unify(comparable, list);

        assert!(!s.state.has_errors());
        assert_eq!(
            s.content(elem),
            Content::FlexSuper(Super::Comparable, None)
        );
    }

    #[test]
    fn comparable_list_rejects_functions() {
        let mut s = Session::new();
        let elem = s.flex_super(Super::Comparable);
        let expected = s.list(elem);

        let int = s.atom(BuiltinType::Int);
        let func = s.func(int, int);
        let actual = s.list(func);

        s.unify(expected, actual);

        assert_eq!(s.state.errors().len(), 1);
        assert_eq!(
            s.last_reason(),
            Some(Reason::NotPartOfSuper(Super::Comparable))
        );
    }

    #[test]
    fn appendable_accepts_any_list() {
        let mut s = Session::new();
        let elem = s.flex();
        let list = s.list(elem);
        let appendable = s.flex_super(Super::Appendable);

        s.unify(appendable, list);

        assert!(!s.state.has_errors());
        // appendable never constrains the element
        assert_eq!(s.content(elem), Content::FlexVar(None));
    }

    #[test]
    fn short_tuples_can_be_comparable() {
        let mut s = Session::new();
        let a = s.flex();
        let b = s.flex();
        let pair = s.tuple(vec![a, b]);
        let comparable = s.flex_super(Super::Comparable);

        s.unify(pair, comparable);

        assert!(!s.state.has_errors());
        assert_eq!(s.content(a), Content::FlexSuper(Super::Comparable, None));
        assert_eq!(s.content(b), Content::FlexSuper(Super::Comparable, None));
    }

    #[test]
    fn seven_tuple_is_never_comparable() {
        let mut s = Session::new();
        let elems: Vec<Variable> = (0..7).map(|_| s.flex()).collect();
        let tuple = s.tuple(elems);
        let comparable = s.flex_super(Super::Comparable);

        s.unify(tuple, comparable);

        assert_eq!(s.last_reason(), Some(Reason::TooLongComparableTuple(7)));
    }

    #[test]
    fn function_mismatch_is_typical_and_heals() {
        let mut s = Session::new();
        let a = s.flex();
        let expected = s.func(a, a);

        let int = s.atom(BuiltinType::Int);
        let bool_ = s.atom(BuiltinType::Bool);
        let actual = s.func(int, bool_);

        s.unify(expected, actual);

        assert_eq!(s.state.errors().len(), 1);
        assert_eq!(s.last_reason(), None);
        assert!(s.content(expected).is_error());
        assert!(s.content(actual).is_error());
    }

    #[test]
    fn missing_arguments_are_counted() {
        let mut s = Session::new();
        let int = s.atom(BuiltinType::Int);
        let bool_ = s.atom(BuiltinType::Bool);
        let expected = s.func(int, bool_);

        let int2 = s.atom(BuiltinType::Int);
        let bool2 = s.atom(BuiltinType::Bool);
        let inner = s.func(bool2, int2);
        let actual = s.func(int2, inner);

        s.unify(expected, actual);

        assert_eq!(s.last_reason(), Some(Reason::MissingArgs(1)));
    }

    #[test]
    fn rigid_clash_names_both_sides() {
        let mut s = Session::new();
        let a = s.rigid("a");
        let b = s.rigid("b");

        s.unify(a, b);

        let (key_a, key_b) = (s.key("a"), s.key("b"));
        assert_eq!(s.last_reason(), Some(Reason::RigidClash(key_a, key_b)));
    }

    #[test]
    fn rigid_absorbs_flex() {
        let mut s = Session::new();
        let rigid = s.rigid("a");
        let flex = s.flex();

        s.unify(rigid, flex);

        assert!(!s.state.has_errors());
        let name = s.key("a");
        assert_eq!(s.content(flex), Content::RigidVar(name));
    }

    #[test]
    fn rigid_rejects_structure() {
        let mut s = Session::new();
        let rigid = s.rigid("a");
        let int = s.atom(BuiltinType::Int);

        s.unify(rigid, int);

        let name = s.key("a");
        assert_eq!(
            s.last_reason(),
            Some(Reason::RigidVarTooGeneric {
                name,
                typed_as: Specific::Type(TypeCtor::INT),
            })
        );
    }

    #[test]
    fn rigid_rejects_flex_super() {
        let mut s = Session::new();
        let rigid = s.rigid("a");
        let number = s.flex_super(Super::Number);

        s.unify(rigid, number);

        let name = s.key("a");
        assert_eq!(
            s.last_reason(),
            Some(Reason::RigidVarTooGeneric {
                name,
                typed_as: Specific::Super(Super::Number),
            })
        );
    }

    #[test]
    fn rigid_super_absorbs_weaker_flex_super() {
        let mut s = Session::new();
        let name = s.key("a");
        let rigid = s.fresh(Content::RigidSuper(Super::CompAppend, name));
        let comparable = s.flex_super(Super::Comparable);

        s.unify(rigid, comparable);

        assert!(!s.state.has_errors());
        assert_eq!(
            s.content(comparable),
            Content::RigidSuper(Super::CompAppend, name)
        );
    }

    #[test]
    fn rigid_super_rejects_stronger_flex_super() {
        let mut s = Session::new();
        let name = s.key("a");
        let rigid = s.fresh(Content::RigidSuper(Super::Comparable, name));
        let number = s.flex_super(Super::Number);

        s.unify(rigid, number);

        assert_eq!(
            s.last_reason(),
            Some(Reason::RigidSuperTooGeneric {
                class: Super::Comparable,
                name,
                typed_as: Specific::Super(Super::Number),
            })
        );
    }

    #[test]
    fn alias_is_transparent() {
        let mut s = Session::new();
        let int = s.atom(BuiltinType::Int);
        let alias = s.alias("Age", &[], int);
        let other = s.atom(BuiltinType::Int);

        s.unify(alias, other);

        assert!(!s.state.has_errors());
    }

    #[test]
    fn alias_wins_over_flex() {
        let mut s = Session::new();
        let int = s.atom(BuiltinType::Int);
        let alias = s.alias("Age", &[], int);
        let flex = s.flex();

        s.unify(alias, flex);

        assert!(!s.state.has_errors());
        assert!(s.content(flex).is_alias());
    }

    #[test]
    fn same_name_aliases_unify_their_arguments() {
        let mut s = Session::new();
        let a = s.flex();
        let real_a = s.list(a);
        let alias_a = s.alias("Box", &[("item", a)], real_a);

        let b = s.flex();
        let real_b = s.list(b);
        let alias_b = s.alias("Box", &[("item", b)], real_b);

        s.unify(alias_a, alias_b);

        assert!(!s.state.has_errors());
        assert!(s.uf.equivalent(a, b));
    }

    #[test]
    fn different_name_aliases_unify_their_expansions() {
        let mut s = Session::new();
        let int_a = s.atom(BuiltinType::Int);
        let alias_a = s.alias("Age", &[], int_a);
        let int_b = s.atom(BuiltinType::Int);
        let alias_b = s.alias("Year", &[], int_b);

        s.unify(alias_a, alias_b);

        assert!(!s.state.has_errors());
    }

    #[test]
    fn bad_record_fields_are_collected() {
        let mut s = Session::new();
        let str1 = s.atom(BuiltinType::Str);
        let int = s.atom(BuiltinType::Int);
        let expected = s.closed_record(&[("name", str1), ("age", int)]);

        let str2 = s.atom(BuiltinType::Str);
        let bool_ = s.atom(BuiltinType::Bool);
        let actual = s.closed_record(&[("name", str2), ("age", bool_)]);

        s.unify(expected, actual);

        assert_eq!(s.state.errors().len(), 1);
        let age = s.key("age");
        assert_eq!(s.last_reason(), Some(Reason::BadFields(vec![(age, None)])));
    }

    #[test]
    fn closed_records_with_different_fields_are_messy() {
        let mut s = Session::new();
        let int1 = s.atom(BuiltinType::Int);
        let expected = s.closed_record(&[("x", int1)]);

        let int2 = s.atom(BuiltinType::Int);
        let bool_ = s.atom(BuiltinType::Bool);
        let actual = s.closed_record(&[("x", int2), ("y", bool_)]);

        s.unify(expected, actual);

        let (x, y) = (s.key("x"), s.key("y"));
        assert_eq!(
            s.last_reason(),
            Some(Reason::MessyFields {
                shared: vec![x],
                only_left: vec![],
                only_right: vec![y],
            })
        );
    }

    #[test]
    fn messy_fields_flip_under_the_opposite_orientation() {
        let mut s = Session::new();
        let int1 = s.atom(BuiltinType::Int);
        let expected = s.closed_record(&[("x", int1)]);
        let int2 = s.atom(BuiltinType::Int);
        let bool1 = s.atom(BuiltinType::Bool);
        let actual = s.closed_record(&[("x", int2), ("y", bool1)]);
        s.unify(expected, actual);
        let forward = s.last_reason().unwrap();

        let mut t = Session::new();
        let int3 = t.atom(BuiltinType::Int);
        let bool2 = t.atom(BuiltinType::Bool);
        let expected = t.closed_record(&[("x", int3), ("y", bool2)]);
        let int4 = t.atom(BuiltinType::Int);
        let actual = t.closed_record(&[("x", int4)]);
        t.unify(expected, actual);
        let backward = t.last_reason().unwrap();

        assert_eq!(backward, forward.flip());
    }

    #[test]
    fn identical_rows_join_their_tails() {
        let mut s = Session::new();
        let tail1 = s.flex();
        let tail2 = s.flex();
        let int1 = s.atom(BuiltinType::Int);
        let int2 = s.atom(BuiltinType::Int);
        let expected = s.record(&[("a", int1)], tail1);
        let actual = s.record(&[("a", int2)], tail2);

        s.unify(expected, actual);

        assert!(!s.state.has_errors());
        assert!(s.uf.equivalent(tail1, tail2));
    }

    #[test]
    fn extra_fields_flow_into_an_open_tail() {
        let mut s = Session::new();
        let tail = s.flex();
        let int1 = s.atom(BuiltinType::Int);
        let expected = s.record(&[("x", int1)], tail);

        let int2 = s.atom(BuiltinType::Int);
        let bool_ = s.atom(BuiltinType::Bool);
        let actual = s.closed_record(&[("x", int2), ("y", bool_)]);

        s.unify(expected, actual);

        assert!(!s.state.has_errors());
        let y = s.key("y");
        match s.content(tail) {
            Content::Structure(FlatType::Record(fields, _)) => {
                assert!(fields.contains_key(&y));
            }
            other => panic!("expected the tail to hold the extra field, got {other:?}"),
        }
    }

    #[test]
    fn open_records_share_their_unique_fields() {
        let mut s = Session::new();
        let tail1 = s.flex();
        let tail2 = s.flex();
        let int = s.atom(BuiltinType::Int);
        let bool_ = s.atom(BuiltinType::Bool);
        let expected = s.record(&[("x", int)], tail1);
        let actual = s.record(&[("y", bool_)], tail2);

        s.unify(expected, actual);

        assert!(!s.state.has_errors());
        let (x, y) = (s.key("x"), s.key("y"));
        match s.content(expected) {
            Content::Structure(FlatType::Record(fields, _)) => {
                assert!(fields.contains_key(&x));
                assert!(fields.contains_key(&y));
            }
            other => panic!("expected a merged record, got {other:?}"),
        }
    }

    #[test]
    fn empty_record_closes_an_empty_open_row() {
        let mut s = Session::new();
        let empty = s.fresh(Content::Structure(FlatType::EmptyRecord));
        let tail = s.flex();
        let open = s.record(&[], tail);

        s.unify(empty, open);

        assert!(!s.state.has_errors());
        assert!(matches!(
            s.content(tail),
            Content::Structure(FlatType::EmptyRecord)
        ));
    }

    #[test]
    fn cyclic_graph_reports_one_infinite_type() {
        let mut s = Session::new();
        let cyclic = s.flex();
        s.uf.set_descriptor(
            cyclic,
            Descriptor::new(Content::Structure(FlatType::list(cyclic)), Rank::OUTERMOST),
        );
        let int = s.atom(BuiltinType::Int);

        s.unify(cyclic, int);

        assert_eq!(s.state.errors().len(), 1);
        assert!(matches!(
            s.state.errors().last(),
            Some((TypeError::InfiniteType { .. }, _))
        ));
    }

    #[test]
    fn cyclic_list_cannot_become_comparable() {
        let mut s = Session::new();
        let cyclic = s.flex();
        s.uf.set_descriptor(
            cyclic,
            Descriptor::new(Content::Structure(FlatType::list(cyclic)), Rank::OUTERMOST),
        );
        let comparable = s.flex_super(Super::Comparable);

        s.unify(comparable, cyclic);

        assert_eq!(s.state.errors().len(), 1);
        assert!(matches!(
            s.state.errors().last(),
            Some((TypeError::InfiniteType { .. }, _))
        ));
    }

    #[test]
    fn symmetric_failures_flip_their_reason() {
        let mut s = Session::new();
        let a = s.rigid("a");
        let b = s.rigid("b");
        s.unify(a, b);
        let forward = s.last_reason().unwrap();

        let mut t = Session::new();
        let a = t.rigid("a");
        let b = t.rigid("b");
        t.unify(b, a);
        let backward = t.last_reason().unwrap();

        assert_eq!(backward, forward.flip());
    }
}
