use std::collections::{HashMap, VecDeque};

use matrix::Matrix;

use crate::error::TreeError;
use crate::newick::Node;

/// A tree rerooted at the leaf representing population 0, used to map cells of
/// the covariance matrix to sums of branch lengths along least-common-ancestor
/// paths.
pub struct RerootedTree {
    /// For each node id, its parent id and the length of the edge to the parent
    /// (`None` only for the root).
    parent: HashMap<usize, (usize, f64)>,
    /// Node id of each population's leaf, indexed by population number.
    leaf_of: HashMap<usize, usize>,
    root: usize,
}

fn collect_edges(node: &Node, edges: &mut Vec<(usize, usize, f64)>, leaves: &mut HashMap<usize, usize>) {
    if node.is_leaf() {
        if let Some(name) = &node.name {
            if let Ok(population) = name.parse::<usize>() {
                leaves.insert(population, node.id);
            }
        }
    }
    for child in &node.children {
        edges.push((node.id, child.id, child.length.unwrap_or(0.0)));
        collect_edges(child, edges, leaves);
    }
}

impl RerootedTree {
    /// Reroots `tree` at the leaf named `"0"` (population 0).
    pub fn reroot(tree: &Node) -> Result<Self, TreeError> {
        let mut edges = Vec::new();
        let mut leaves = HashMap::new();
        collect_edges(tree, &mut edges, &mut leaves);

        let root = *leaves.get(&0).ok_or(TreeError::TooFewLeaves)?;
        if leaves.len() < 2 {
            return Err(TreeError::TooFewLeaves);
        }

        let mut adjacency: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
        for &(a, b, len) in &edges {
            adjacency.entry(a).or_default().push((b, len));
            adjacency.entry(b).or_default().push((a, len));
        }

        let mut parent = HashMap::new();
        let mut visited = std::collections::HashSet::new();
        visited.insert(root);
        let mut queue = VecDeque::new();
        queue.push_back(root);
        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = adjacency.get(&current) {
                for &(next, len) in neighbors {
                    if visited.insert(next) {
                        parent.insert(next, (current, len));
                        queue.push_back(next);
                    }
                }
            }
        }

        Ok(Self { parent, leaf_of: leaves, root })
    }

    fn path_to_root(&self, mut id: usize) -> Vec<usize> {
        let mut path = vec![id];
        while let Some(&(p, _)) = self.parent.get(&id) {
            path.push(p);
            id = p;
        }
        path.reverse();
        path
    }

    fn edge_length_to_parent(&self, id: usize) -> f64 {
        self.parent.get(&id).map_or(0.0, |&(_, len)| len)
    }

    /// Sum of branch lengths on the overlapping prefix of the root-to-`a` and
    /// root-to-`b` paths (population indices, root is population 0).
    pub fn overlap(&self, a: usize, b: usize) -> Option<f64> {
        let leaf_a = *self.leaf_of.get(&a)?;
        let leaf_b = *self.leaf_of.get(&b)?;
        let path_a = self.path_to_root(leaf_a);
        let path_b = self.path_to_root(leaf_b);

        let mut sum = 0.0;
        for (&na, &nb) in path_a.iter().zip(path_b.iter()) {
            if na != nb {
                break;
            }
            if na != self.root {
                sum += self.edge_length_to_parent(na);
            }
        }
        Some(sum)
    }

    pub fn root(&self) -> usize {
        self.root
    }
}

/// Maps a rooted Newick tree to a `(K-1)x(K-1)` covariance matrix: for each
/// unordered population pair `{a,b}` with `a,b` in `1..K`, `C[a-1,b-1]` is the
/// sum of branch lengths on the intersection of the paths from population 0 to
/// `a` and to `b`.
pub fn tree_to_c(tree: &Node, k: usize) -> Result<Matrix, TreeError> {
    let rerooted = RerootedTree::reroot(tree)?;
    let rk = k - 1;
    let mut c = Matrix::new(rk, rk);
    for row in 0..rk {
        for col in 0..=row {
            let overlap = rerooted.overlap(row + 1, col + 1).ok_or(TreeError::TooFewLeaves)?;
            c.set(row, col, overlap);
            c.set(col, row, overlap);
        }
    }
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse;

    #[test]
    fn overlap_at_diagonal_is_the_branch_to_root() {
        let tree = parse("(0:0,(1:3,2:2):1);").unwrap();
        let rerooted = RerootedTree::reroot(&tree).unwrap();
        let diag1 = rerooted.overlap(1, 1).unwrap();
        assert!((diag1 - 4.0).abs() < 1e-9); // 1 (internal) + 3 (leaf 1)
        let off = rerooted.overlap(1, 2).unwrap();
        assert!((off - 1.0).abs() < 1e-9); // shared internal branch only
    }
}
