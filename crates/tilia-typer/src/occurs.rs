use crate::{
    types::{Content, FlatType, Variable},
    unionfind::UnionFind,
};

/// Reports whether the structural expansion of `var` reaches `var` itself
/// through any structure or alias edge.
///
/// The visited list is keyed on representatives, so a graph that is already
/// cyclic terminates and reports true instead of spinning.
pub fn occurs(uf: &mut UnionFind, var: Variable) -> bool {
    occurs_help(uf, &mut Vec::new(), var)
}

fn occurs_help(uf: &mut UnionFind, seen: &mut Vec<Variable>, var: Variable) -> bool {
    let root = uf.find(var);
    if seen.contains(&root) {
        return true;
    }

    match uf.descriptor(root).content.clone() {
        Content::FlexVar(_)
        | Content::FlexSuper(_, _)
        | Content::RigidVar(_)
        | Content::RigidSuper(_, _)
        | Content::Error => false,
        Content::Alias { args, real, .. } => {
            seen.push(root);
            let found = args.iter().any(|(_, arg)| occurs_help(uf, seen, *arg))
                || occurs_help(uf, seen, real);
            seen.pop();
            found
        }
        Content::Structure(flat) => {
            seen.push(root);
            let found = match flat {
                FlatType::App(_, args) => args.iter().any(|arg| occurs_help(uf, seen, *arg)),
                FlatType::Func(arg, result) => {
                    occurs_help(uf, seen, arg) || occurs_help(uf, seen, result)
                }
                FlatType::EmptyRecord => false,
                FlatType::Record(fields, ext) => {
                    fields.values().any(|field| occurs_help(uf, seen, *field))
                        || occurs_help(uf, seen, ext)
                }
            };
            seen.pop();
            found
        }
    }
}
