use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use tilia_utils::interner::{DisplayWithInterner, StrInterner, StrKey};

use crate::{
    types::{Content, FlatType, Super, TypeCtor, Variable},
    unionfind::UnionFind,
};

/// A detached, pretty-printable snapshot of a type.
///
/// Built only on failure paths, after the graph has stopped changing for the
/// constraint at hand. Aliases are preserved by name, nested record tails
/// are flattened into one field map, and cycles are cut with [`Infinite`].
///
/// [`Infinite`]: SourceType::Infinite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Flex(Option<StrKey>),
    FlexSuper(Super, Option<StrKey>),
    Rigid(StrKey),
    RigidSuper(Super, StrKey),
    App(TypeCtor, Vec<SourceType>),
    Func(Box<SourceType>, Box<SourceType>),
    Record {
        fields: BTreeMap<StrKey, SourceType>,
        ext: Option<Box<SourceType>>,
    },
    Alias {
        name: StrKey,
        args: Vec<(StrKey, SourceType)>,
    },
    Infinite,
    Error,
}

/// Reads `var` back from the graph as a [`SourceType`].
pub fn source_type(uf: &mut UnionFind, var: Variable) -> SourceType {
    source_type_help(uf, &mut Vec::new(), var)
}

fn source_type_help(uf: &mut UnionFind, seen: &mut Vec<Variable>, var: Variable) -> SourceType {
    let root = uf.find(var);
    if seen.contains(&root) {
        return SourceType::Infinite;
    }

    match uf.descriptor(root).content.clone() {
        Content::FlexVar(name) => SourceType::Flex(name),
        Content::FlexSuper(class, name) => SourceType::FlexSuper(class, name),
        Content::RigidVar(name) => SourceType::Rigid(name),
        Content::RigidSuper(class, name) => SourceType::RigidSuper(class, name),
        Content::Error => SourceType::Error,
        Content::Alias { name, args, .. } => {
            seen.push(root);
            let args = args
                .into_iter()
                .map(|(arg_name, arg)| (arg_name, source_type_help(uf, seen, arg)))
                .collect();
            seen.pop();
            SourceType::Alias { name, args }
        }
        Content::Structure(flat) => {
            seen.push(root);
            let rendered = flat_source_type(uf, seen, flat);
            seen.pop();
            rendered
        }
    }
}

fn flat_source_type(uf: &mut UnionFind, seen: &mut Vec<Variable>, flat: FlatType) -> SourceType {
    match flat {
        FlatType::App(ctor, args) => {
            let args = args
                .into_iter()
                .map(|arg| source_type_help(uf, seen, arg))
                .collect();
            SourceType::App(ctor, args)
        }
        FlatType::Func(arg, result) => SourceType::Func(
            Box::new(source_type_help(uf, seen, arg)),
            Box::new(source_type_help(uf, seen, result)),
        ),
        FlatType::EmptyRecord => SourceType::Record {
            fields: BTreeMap::new(),
            ext: None,
        },
        FlatType::Record(fields, ext) => record_source_type(uf, seen, fields, ext),
    }
}

/// Flattens a record and its chain of record tails into one field map.
///
/// Outer fields win over tail fields with the same name, mirroring how the
/// unifier gathers rows.
fn record_source_type(
    uf: &mut UnionFind,
    seen: &mut Vec<Variable>,
    fields: BTreeMap<StrKey, Variable>,
    ext: Variable,
) -> SourceType {
    let mut rendered: BTreeMap<StrKey, SourceType> = BTreeMap::new();
    for (name, field) in fields {
        let field = source_type_help(uf, seen, field);
        rendered.entry(name).or_insert(field);
    }

    let depth = seen.len();
    let mut tail = ext;
    let ext = loop {
        let root = uf.find(tail);
        if seen.contains(&root) {
            break Some(SourceType::Infinite);
        }

        match uf.descriptor(root).content.clone() {
            Content::Structure(FlatType::Record(more, next)) => {
                seen.push(root);
                for (name, field) in more {
                    let field = source_type_help(uf, seen, field);
                    rendered.entry(name).or_insert(field);
                }
                tail = next;
            }
            Content::Structure(FlatType::EmptyRecord) => break None,
            Content::Alias { real, .. } => {
                seen.push(root);
                tail = real;
            }
            _ => break Some(source_type_help(uf, seen, tail)),
        }
    };
    seen.truncate(depth);

    match ext {
        // A row with no fields of its own is just its tail.
        Some(ext) if rendered.is_empty() => ext,
        ext => SourceType::Record {
            fields: rendered,
            ext: ext.map(Box::new),
        },
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Prec {
    Top,
    FuncLeft,
    AppArg,
}

fn write_key(
    f: &mut fmt::Formatter<'_>,
    interner: Option<&StrInterner>,
    key: StrKey,
) -> fmt::Result {
    match interner {
        Some(interner) => write!(f, "{}", &interner[key]),
        None => write!(f, "{key}"),
    }
}

impl SourceType {
    fn fmt_help(
        &self,
        f: &mut fmt::Formatter<'_>,
        interner: Option<&StrInterner>,
        prec: Prec,
    ) -> fmt::Result {
        match self {
            Self::Flex(None) => write!(f, "_"),
            Self::Flex(Some(name)) => write_key(f, interner, *name),
            Self::FlexSuper(class, None) => write!(f, "{class}"),
            Self::FlexSuper(_, Some(name)) => write_key(f, interner, *name),
            Self::Rigid(name) => write_key(f, interner, *name),
            Self::RigidSuper(_, name) => write_key(f, interner, *name),
            Self::App(TypeCtor::Tuple(_), args) => {
                write!(f, "( ")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    arg.fmt_help(f, interner, Prec::Top)?;
                }
                write!(f, " )")
            }
            Self::App(ctor, args) if args.is_empty() => match interner {
                Some(interner) => DisplayWithInterner::fmt(ctor, f, interner),
                None => write!(f, "{ctor}"),
            },
            Self::App(ctor, args) => {
                let parens = prec == Prec::AppArg;
                if parens {
                    write!(f, "(")?;
                }
                match interner {
                    Some(interner) => DisplayWithInterner::fmt(ctor, f, interner)?,
                    None => write!(f, "{ctor}")?,
                }
                for arg in args {
                    write!(f, " ")?;
                    arg.fmt_help(f, interner, Prec::AppArg)?;
                }
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Func(arg, result) => {
                let parens = prec != Prec::Top;
                if parens {
                    write!(f, "(")?;
                }
                arg.fmt_help(f, interner, Prec::FuncLeft)?;
                write!(f, " -> ")?;
                result.fmt_help(f, interner, Prec::Top)?;
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Record { fields, ext } => {
                if fields.is_empty() && ext.is_none() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_key(f, interner, *name)?;
                    write!(f, " : ")?;
                    field.fmt_help(f, interner, Prec::Top)?;
                }
                if let Some(ext) = ext {
                    write!(f, " | ")?;
                    ext.fmt_help(f, interner, Prec::Top)?;
                }
                write!(f, " }}")
            }
            Self::Alias { name, args } => {
                let parens = prec == Prec::AppArg && !args.is_empty();
                if parens {
                    write!(f, "(")?;
                }
                write_key(f, interner, *name)?;
                for (_, arg) in args {
                    write!(f, " ")?;
                    arg.fmt_help(f, interner, Prec::AppArg)?;
                }
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Infinite => write!(f, "∞"),
            Self::Error => write!(f, "?"),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_help(f, None, Prec::Top)
    }
}

impl DisplayWithInterner for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>, interner: &StrInterner) -> fmt::Result {
        self.fmt_help(f, Some(interner), Prec::Top)
    }
}
