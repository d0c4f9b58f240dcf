//! Entry point for the covariance optimizer. An optional first argument names
//! a YAML config file; otherwise a small built-in fixture stands in for real
//! ancestry output.

use std::process;

use anyhow::Result;
use config::CovarianceConfig;
use model::{DiscreteGenotypeMatrix, GenotypeModel};
use nemeco::CovarianceInput;

#[macro_use]
extern crate log;

fn load_config() -> Result<CovarianceConfig> {
    match std::env::args().nth(1) {
        Some(yaml) => {
            let text = io::read_to_string(std::path::Path::new(&yaml))?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(CovarianceConfig::default()),
    }
}

fn fixture_model_and_f() -> (GenotypeModel, matrix::Matrix) {
    let model = GenotypeModel::Discrete(DiscreteGenotypeMatrix::from_codes(
        3,
        2,
        vec![0, 1, 1, 1, 2, 0],
    ));
    let f = matrix::Matrix::from_vec(3, 2, vec![0.2, 0.6, 0.4, 0.5, 0.7, 0.3]);
    (model, f)
}

fn run() -> Result<()> {
    let config = load_config()?;
    config.validate()?;

    let (model, f) = fixture_model_and_f();

    let input = if let Some(path) = &config.ain {
        CovarianceInput::Agi(io::read_agi(path)?)
    } else if let Some(path) = &config.tin {
        CovarianceInput::Tree(io::read_newick(path)?)
    } else if let Some(path) = &config.cin {
        CovarianceInput::TreelessFrom(io::read_matrix(path)?)
    } else {
        CovarianceInput::Treeless
    };

    let result = nemeco::run(&config, &model, &f, input)?;
    info!("converged after {} iterations, lle={:.6}", result.iterations, result.lle);

    if let Some(path) = &config.cout {
        io::write_matrix(path, &result.c)?;
    }
    if let (Some(path), Some(tree)) = (&config.tout, &result.tree) {
        io::write_newick(path, tree)?;
    }
    Ok(())
}

fn main() {
    logger::Logger::init(1);
    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}
