use crate::types::{Descriptor, Variable};

/// A destructive disjoint-set forest over type descriptors.
///
/// Variables are stable indices into an arena of cells. Each cell holds a
/// parent link; the descriptor payload is only meaningful at the
/// representative. `find` compresses paths as it walks, so the long chains
/// produced by repeated merging flatten out over a session.
///
/// All operations are total. Handing in a variable from another forest is a
/// programmer error and panics on the index.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
struct Cell {
    parent: Variable,
    weight: u32,
    descriptor: Descriptor,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Allocates a new singleton class.
    pub fn fresh(&mut self, descriptor: Descriptor) -> Variable {
        let var = Variable::new(self.cells.len());
        self.cells.push(Cell {
            parent: var,
            weight: 1,
            descriptor,
        });
        var
    }

    /// Returns the representative of `var`, compressing the path behind it.
    pub fn find(&mut self, var: Variable) -> Variable {
        let mut root = var;
        while self.cells[root.index()].parent != root {
            root = self.cells[root.index()].parent;
        }

        let mut current = var;
        while current != root {
            let next = self.cells[current.index()].parent;
            self.cells[current.index()].parent = root;
            current = next;
        }

        root
    }

    pub fn equivalent(&mut self, a: Variable, b: Variable) -> bool {
        self.find(a) == self.find(b)
    }

    /// Reads the descriptor of the class `var` belongs to.
    pub fn descriptor(&mut self, var: Variable) -> &Descriptor {
        let root = self.find(var);
        &self.cells[root.index()].descriptor
    }

    pub fn descriptor_mut(&mut self, var: Variable) -> &mut Descriptor {
        let root = self.find(var);
        &mut self.cells[root.index()].descriptor
    }

    pub fn set_descriptor(&mut self, var: Variable, descriptor: Descriptor) {
        *self.descriptor_mut(var) = descriptor;
    }

    /// Merges the classes of `a` and `b`, installing `descriptor` at the
    /// surviving root.
    ///
    /// The smaller class is attached below the larger one, so the surviving
    /// root need not belong to either input; both handles observe the new
    /// descriptor through `find` afterwards.
    pub fn union(&mut self, a: Variable, b: Variable, descriptor: Descriptor) {
        let root_a = self.find(a);
        let root_b = self.find(b);

        if root_a == root_b {
            self.cells[root_a.index()].descriptor = descriptor;
            return;
        }

        let weight_a = self.cells[root_a.index()].weight;
        let weight_b = self.cells[root_b.index()].weight;

        let (root, child) = if weight_a >= weight_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };

        self.cells[child.index()].parent = root;

        let cell = &mut self.cells[root.index()];
        cell.weight = weight_a + weight_b;
        cell.descriptor = descriptor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, Mark, Rank};

    fn flex(uf: &mut UnionFind) -> Variable {
        uf.fresh(Descriptor::new(Content::FlexVar(None), Rank::OUTERMOST))
    }

    #[test]
    fn fresh_is_its_own_representative() {
        let mut uf = UnionFind::new();
        let var = flex(&mut uf);

        assert_eq!(uf.find(var), var);
        assert!(uf.equivalent(var, var));
    }

    #[test]
    fn union_makes_equivalent() {
        let mut uf = UnionFind::new();
        let a = flex(&mut uf);
        let b = flex(&mut uf);

        assert!(!uf.equivalent(a, b));

        uf.union(a, b, Descriptor::new(Content::FlexVar(None), Rank::OUTERMOST));

        assert!(uf.equivalent(a, b));
    }

    #[test]
    fn both_handles_observe_the_new_descriptor() {
        let mut uf = UnionFind::new();
        let a = flex(&mut uf);
        let b = flex(&mut uf);

        let descriptor = Descriptor::new(Content::Error, Rank::NONE);
        uf.union(a, b, descriptor.clone());

        assert_eq!(uf.descriptor(a), &descriptor);
        assert_eq!(uf.descriptor(b), &descriptor);
    }

    #[test]
    fn union_through_chains() {
        let mut uf = UnionFind::new();
        let a = flex(&mut uf);
        let b = flex(&mut uf);
        let c = flex(&mut uf);
        let d = flex(&mut uf);

        let desc_a = uf.descriptor(a).clone();
        uf.union(a, b, desc_a);
        let desc_c = uf.descriptor(c).clone();
        uf.union(c, d, desc_c);
        uf.union(b, c, Descriptor::new(Content::Error, Rank::NONE));

        assert!(uf.equivalent(a, d));
        assert!(uf.descriptor(d).content.is_error());
    }

    #[test]
    fn fresh_descriptor_has_no_mark_and_empty_copy() {
        let mut uf = UnionFind::new();
        let var = flex(&mut uf);

        let descriptor = uf.descriptor(var);
        assert_eq!(descriptor.mark, Mark::NONE);
        assert_eq!(descriptor.copy, None);
    }
}
