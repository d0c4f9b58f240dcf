//! The NEMECO covariance optimizer: a Nelder-Mead simplex search for the
//! populations' covariance matrix `C`, parameterized directly, by the branch
//! lengths of a Newick tree, or by an admixture-graph expression table.

mod controller;
mod error;
mod likelihood;
mod simplex;

pub use controller::{AgiParameterization, Controller, Parameterization, TreeParameterization, TreelessParameterization};
pub use error::NemecoError;
pub use likelihood::{initial_c, rooted_f, Likelihood};
pub use simplex::{ExecuteArgs, ExitCondition, Operation, Options, Simplex, Stats};

use config::CovarianceConfig;
use matrix::Matrix;
use model::GenotypeModel;

/// What drove the covariance matrix's parameterization for a run, and any
/// parameterization-specific output to emit alongside `C`.
pub enum CovarianceInput {
    /// No `cin`/`tin`/`ain` given: `C` is seeded from `RF*RF'/J` and then
    /// optimized directly, one parameter per lower-triangle cell.
    Treeless,
    /// `cin` given: `C` is read from a file and optimized directly.
    TreelessFrom(Matrix),
    /// `tin` given: `C` is derived from a Newick tree's branch lengths.
    Tree(tree::Node),
    /// `ain` given: `C`'s cells are expressions over admixture-graph
    /// variables.
    Agi(expr::AgiInput),
}

/// The outcome of a NEMECO run: the optimized covariance matrix, the final
/// log-likelihood, and (for the tree/admixture-graph parameterizations) the
/// parameterization-specific output.
pub struct NemecoResult {
    pub c: Matrix,
    pub lle: f64,
    pub iterations: usize,
    pub exit_condition: ExitCondition,
    pub tree: Option<tree::Node>,
    pub agi_args: Option<std::collections::HashMap<String, f64>>,
}

fn execute_args(config: &CovarianceConfig) -> ExecuteArgs {
    ExecuteArgs {
        max_iterations: Some(config.max_iterations),
        max_seconds: if config.max_time > 0.0 { Some(config.max_time) } else { None },
        min_epsilon: Some(config.epsilon),
        ..Default::default()
    }
}

fn run_with<P: Parameterization>(
    config: &CovarianceConfig,
    mut controller: Controller<P>,
) -> (Matrix, f64, usize, ExitCondition, Controller<P>) {
    let initial = controller.init_parameters();
    let opts = Options::new(initial.len());

    let exit_condition;
    let mut simplex;
    {
        let mut objfunc = |params: &[f64]| controller.compute_objfunc(params);
        simplex = Simplex::new(&mut objfunc, initial, opts);
        exit_condition = simplex.execute(&mut objfunc, &execute_args(config));
    }

    // Decode the final vertex once more so `controller`'s cached `C` (and,
    // for the tree/AGI parameterizations, the parameterization's own state)
    // reflects the optimum rather than whatever vertex was evaluated last.
    let lle = -controller.compute_objfunc(simplex.vertex());
    let c = controller.c().clone();
    let iterations = simplex.iterations();
    (c, lle, iterations, exit_condition, controller)
}

/// Runs the NEMECO covariance optimizer to completion.
pub fn run(
    config: &CovarianceConfig,
    model: &GenotypeModel,
    f: &Matrix,
    input: CovarianceInput,
) -> Result<NemecoResult, NemecoError> {
    let rf = rooted_f(f);
    let mu = model.create_mu(config.f_epsilon);

    match input {
        CovarianceInput::Treeless => {
            let initial = initial_c(&rf);
            let parameterization = TreelessParameterization::new(initial);
            let controller = Controller::new(parameterization, rf, &mu);
            let (c, lle, iterations, exit_condition, _) = run_with(config, controller);
            Ok(NemecoResult { c, lle, iterations, exit_condition, tree: None, agi_args: None })
        }
        CovarianceInput::TreelessFrom(initial) => {
            if initial.height() != rf.height() {
                return Err(NemecoError::FcSizeMismatch);
            }
            let parameterization = TreelessParameterization::new(initial);
            let controller = Controller::new(parameterization, rf, &mu);
            let (c, lle, iterations, exit_condition, _) = run_with(config, controller);
            Ok(NemecoResult { c, lle, iterations, exit_condition, tree: None, agi_args: None })
        }
        CovarianceInput::Tree(node) => {
            let rk = rf.height();
            let parameterization = TreeParameterization::new(node, rk);
            let controller = Controller::new(parameterization, rf, &mu);
            let (c, lle, iterations, exit_condition, controller) = run_with(config, controller);
            let tree = controller.parameterization().tree().clone();
            Ok(NemecoResult { c, lle, iterations, exit_condition, tree: Some(tree), agi_args: None })
        }
        CovarianceInput::Agi(agi) => {
            let parameterization = AgiParameterization::new(agi);
            let controller = Controller::new(parameterization, rf, &mu);
            let (c, lle, iterations, exit_condition, controller) = run_with(config, controller);
            let agi_args = controller.parameterization().args().clone();
            Ok(NemecoResult { c, lle, iterations, exit_condition, tree: None, agi_args: Some(agi_args) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discrete_model() -> GenotypeModel {
        // 3 individuals, 2 markers; arbitrary but valid 0/1/2 genotype codes.
        GenotypeModel::Discrete(model::DiscreteGenotypeMatrix::from_codes(
            3,
            2,
            vec![0, 1, 1, 1, 2, 0],
        ))
    }

    #[test]
    fn treeless_run_on_a_tiny_panel_produces_a_finite_likelihood() {
        let model = discrete_model();
        let f = Matrix::from_vec(3, 2, vec![0.2, 0.6, 0.4, 0.5, 0.7, 0.3]);
        let config = CovarianceConfig { max_iterations: 200, ..Default::default() };

        let result = run(&config, &model, &f, CovarianceInput::Treeless).unwrap();
        assert_eq!(result.c.height(), 2);
        assert!(result.lle.is_finite());
    }

    #[test]
    fn tree_run_recovers_a_feasible_covariance_matrix() {
        let model = discrete_model();
        let f = Matrix::from_vec(3, 2, vec![0.2, 0.6, 0.4, 0.5, 0.7, 0.3]);
        let tree = tree::parse("(0:0,(1:0.3,2:0.2):0.1);").unwrap();
        let config = CovarianceConfig { max_iterations: 200, ..Default::default() };

        let result = run(&config, &model, &f, CovarianceInput::Tree(tree)).unwrap();
        assert_eq!(result.c.height(), 2);
        assert!(result.tree.is_some());
        for row in 0..2 {
            assert!(result.c.get(row, row) > 0.0);
        }
    }
}
