//! Black-box scenarios spanning the ancestry optimizer, the covariance
//! optimizer, and the two selection scanners, wired together the way the
//! binaries in `src/bin/` do.

use std::collections::HashMap;

use config::{AncestryConfig, CovarianceConfig, ScanConfig};
use model::{DiscreteGenotypeMatrix, GenotypeModel};
use nemeco::CovarianceInput;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tree::Node;

fn tiny_genotypes() -> GenotypeModel {
    // G = [[0,1,2,0];[1,1,2,2];[2,0,0,1]]
    GenotypeModel::Discrete(DiscreteGenotypeMatrix::from_codes(
        3,
        4,
        vec![0, 1, 2, 0, 1, 1, 2, 2, 2, 0, 0, 1],
    ))
}

#[test]
fn tiny_discrete_ancestry_converges_within_fifty_iterations() {
    let model = tiny_genotypes();
    let mut rng = StdRng::seed_from_u64(1864);
    let q0 = qpas::randomize_q(model.height(), 2, &mut rng);
    let mu = model.create_mu(1e-6);
    let f0 = qpas::randomize_f(2, &mu, &mut rng);

    let config = AncestryConfig { seed: 1864, max_iterations: 50, epsilon: 1e-6, ..Default::default() };
    let result = qpas::run(&config, &model, q0, f0, None, 0).unwrap();

    assert!(result.iterations <= 50);
    for i in 0..result.q.height() {
        assert!((result.q.row_sum(i) - 1.0).abs() < 1e-6);
    }
}

#[test]
fn ancestry_output_feeds_a_treeless_covariance_fit() {
    let model = tiny_genotypes();
    let mut rng = StdRng::seed_from_u64(7);
    let q0 = qpas::randomize_q(model.height(), 2, &mut rng);
    let mu = model.create_mu(1e-6);
    let f0 = qpas::randomize_f(2, &mu, &mut rng);

    let ancestry_config = AncestryConfig { max_iterations: 30, ..Default::default() };
    let ancestry = qpas::run(&ancestry_config, &model, q0, f0, None, 0).unwrap();

    let covariance_config = CovarianceConfig { max_iterations: 200, ..Default::default() };
    let covariance = nemeco::run(&covariance_config, &model, &ancestry.f, CovarianceInput::Treeless).unwrap();

    assert_eq!(covariance.c.height(), 2);
    assert_eq!(covariance.c.width(), 2);
    assert!(covariance.lle.is_finite());
}

#[test]
fn selscan_reports_one_nonnegative_lrt_per_marker() {
    let model = tiny_genotypes();
    let f = matrix::Matrix::from_vec(2, 4, vec![0.2, 0.5, 0.4, 0.6, 0.3, 0.5, 0.4, 0.7]);
    let c1 = matrix::Matrix::from_vec(1, 1, vec![0.05]);
    let config = ScanConfig { steps: 10, ..Default::default() };

    let results = scan::selscan::run(&config, &model, &f, &c1, None).unwrap();
    assert_eq!(results.len(), 4);
    for r in results {
        assert!(r.lrt >= -1e-9);
    }
}

#[test]
fn neoscan_reports_one_result_per_marker_with_years_weighting() {
    let model = tiny_genotypes();
    let q = matrix::Matrix::from_vec(3, 2, vec![0.6, 0.4, 0.3, 0.7, 0.9, 0.1]);
    let f = matrix::Matrix::from_vec(2, 4, vec![0.3, 0.5, 0.4, 0.2, 0.6, 0.4, 0.5, 0.7]);
    let config = ScanConfig::default();
    let years = vec![100.0, 50.0, 0.0];

    let results = scan::neoscan::run(&config, &model, &q, &f, Some(&years)).unwrap();
    assert_eq!(results.len(), 4);
    for r in results {
        assert!(r.lrt >= -1e-6);
    }
}

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
fn neighbor_joining_reconstructs_the_five_leaf_reference_distances() {
    let d = [
        [0.0, 5.0, 9.0, 9.0, 8.0],
        [5.0, 0.0, 10.0, 10.0, 9.0],
        [9.0, 10.0, 0.0, 8.0, 7.0],
        [9.0, 10.0, 8.0, 0.0, 3.0],
        [8.0, 9.0, 7.0, 3.0, 0.0],
    ];
    let mut distances = matrix::Matrix::new(5, 5);
    for i in 0..5 {
        for j in 0..5 {
            distances.set(i, j, d[i][j]);
        }
    }

    let tree = tree::neighbor_join(&distances).unwrap();
    let mut paths = HashMap::new();
    leaf_paths(&tree, &[], &mut paths);

    for i in 0..5 {
        for j in 0..5 {
            if i != j {
                let reconstructed = tree_distance(&paths, i, j);
                assert!((reconstructed - d[i][j]).abs() < 1e-9, "leaf {i},{j}: {reconstructed} vs {}", d[i][j]);
            }
        }
    }
}
