use std::collections::HashMap;

use matrix::Matrix;

use crate::error::TreeError;
use crate::newick::Node;

fn pair_distance(dist: &HashMap<(usize, usize), f64>, a: usize, b: usize) -> f64 {
    if a == b {
        0.0
    } else {
        *dist.get(&(a, b)).expect("distance between active clusters must be known")
    }
}

/// Builds a tree from a symmetric distance matrix using neighbor-joining: at
/// each step the pair minimizing the Q-criterion is joined under a new
/// internal node, until two clusters remain, which are joined directly.
///
/// Leaves are named by their row index (`"0"`, `"1"`, ...), matching the
/// population numbering used elsewhere in the covariance model.
pub fn neighbor_join(distances: &Matrix) -> Result<Node, TreeError> {
    let n = distances.height();
    if distances.width() != n {
        return Err(TreeError::NotSquare { height: distances.height(), width: distances.width() });
    }
    if n < 2 {
        return Err(TreeError::TooFewLeaves);
    }

    let mut next_id = n;
    let mut active: Vec<usize> = (0..n).collect();
    let mut trees: HashMap<usize, Node> =
        (0..n).map(|i| (i, Node { id: i, name: Some(i.to_string()), length: None, children: Vec::new() })).collect();

    let mut dist: HashMap<(usize, usize), f64> = HashMap::new();
    for i in 0..n {
        for j in 0..n {
            if i != j {
                dist.insert((i, j), distances.get(i, j));
            }
        }
    }

    while active.len() > 2 {
        let r = active.len() as f64;

        let mut sigma: HashMap<usize, f64> = HashMap::new();
        for &i in &active {
            let sum: f64 = active.iter().filter(|&&j| j != i).map(|&j| pair_distance(&dist, i, j)).sum();
            sigma.insert(i, sum);
        }

        let mut best: Option<(usize, usize, f64)> = None;
        for (idx, &i) in active.iter().enumerate() {
            for &j in &active[idx + 1..] {
                let q = (r - 2.0) * pair_distance(&dist, i, j) - sigma[&i] - sigma[&j];
                let improves = match best {
                    Some((_, _, best_q)) => q < best_q,
                    None => true,
                };
                if improves {
                    best = Some((i, j, q));
                }
            }
        }
        let (i, j, _) = best.expect("at least one active pair when more than two clusters remain");

        let d_ij = pair_distance(&dist, i, j);
        let d_iu = 0.5 * d_ij + (sigma[&i] - sigma[&j]) / (2.0 * (r - 2.0));
        let d_ju = d_ij - d_iu;

        let u = next_id;
        next_id += 1;

        let updates: Vec<(usize, f64)> = active
            .iter()
            .copied()
            .filter(|&k| k != i && k != j)
            .map(|k| (k, 0.5 * (pair_distance(&dist, i, k) + pair_distance(&dist, j, k) - d_ij)))
            .collect();
        for (k, d_uk) in updates {
            dist.insert((u, k), d_uk);
            dist.insert((k, u), d_uk);
        }

        let mut child_i = trees.remove(&i).expect("active cluster must have a tree");
        child_i.length = Some(d_iu);
        let mut child_j = trees.remove(&j).expect("active cluster must have a tree");
        child_j.length = Some(d_ju);
        trees.insert(u, Node { id: u, name: None, length: None, children: vec![child_i, child_j] });

        active.retain(|&x| x != i && x != j);
        active.push(u);
    }

    let a = active[0];
    let b = active[1];
    let d_ab = pair_distance(&dist, a, b);
    let mut child_a = trees.remove(&a).expect("final cluster must have a tree");
    child_a.length = Some(d_ab);
    let mut root = trees.remove(&b).expect("final cluster must have a tree");
    root.children.push(child_a);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_paths(node: &Node, prefix: &[(usize, f64)], out: &mut HashMap<usize, Vec<(usize, f64)>>) {
        let mut path = prefix.to_vec();
        path.push((node.id, node.length.unwrap_or(0.0)));
        if node.is_leaf() {
            if let Some(name) = &node.name {
                if let Ok(leaf) = name.parse::<usize>() {
                    out.insert(leaf, path.clone());
                }
            }
        }
        for child in &node.children {
            leaf_paths(child, &path, out);
        }
    }

    fn tree_distance(paths: &HashMap<usize, Vec<(usize, f64)>>, a: usize, b: usize) -> f64 {
        let path_a = &paths[&a];
        let path_b = &paths[&b];
        let common = path_a.iter().zip(path_b.iter()).take_while(|(x, y)| x.0 == y.0).count();
        let tail_a: f64 = path_a[common..].iter().map(|(_, len)| len).sum();
        let tail_b: f64 = path_b[common..].iter().map(|(_, len)| len).sum();
        tail_a + tail_b
    }

    #[test]
    fn reconstructs_pairwise_distances_of_an_additive_matrix() {
        // Four leaves joined through two internal nodes with known branch
        // lengths; neighbor-joining must recover the exact same pairwise
        // distances regardless of how it roots or labels the result.
        let lengths = [2.0, 3.0, 5.0, 1.0]; // 0,1,2,3 leaf branch lengths
        let internal = 4.0; // 0-1 clade to 2-3 clade connector
        let d = |a: usize, b: usize| -> f64 {
            let same_clade = (a < 2) == (b < 2);
            if same_clade {
                lengths[a] + lengths[b]
            } else {
                lengths[a] + lengths[b] + internal
            }
        };
        let mut distances = Matrix::new(4, 4);
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    distances.set(i, j, d(i, j));
                }
            }
        }

        let tree = neighbor_join(&distances).unwrap();
        let mut paths = HashMap::new();
        leaf_paths(&tree, &[], &mut paths);

        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    let reconstructed = tree_distance(&paths, i, j);
                    assert!((reconstructed - d(i, j)).abs() < 1e-9, "leaf {i},{j}: {reconstructed} vs {}", d(i, j));
                }
            }
        }
    }
}
