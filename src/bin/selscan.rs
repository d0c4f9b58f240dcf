//! Entry point for SELSCAN. An optional first argument names a YAML config
//! file; otherwise a small built-in fixture stands in for real ancestry and
//! covariance output.

use std::process;

use anyhow::Result;
use config::ScanConfig;
use model::{DiscreteGenotypeMatrix, GenotypeModel};

#[macro_use]
extern crate log;

fn load_config() -> Result<ScanConfig> {
    match std::env::args().nth(1) {
        Some(yaml) => {
            let text = io::read_to_string(std::path::Path::new(&yaml))?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(ScanConfig::default()),
    }
}

fn fixture() -> (GenotypeModel, matrix::Matrix, matrix::Matrix) {
    let model = GenotypeModel::Discrete(DiscreteGenotypeMatrix::from_codes(
        3,
        4,
        vec![0, 1, 2, 0, 1, 1, 2, 2, 2, 0, 0, 1],
    ));
    let f = matrix::Matrix::from_vec(2, 4, vec![0.2, 0.5, 0.4, 0.6, 0.3, 0.5, 0.4, 0.7]);
    let c1 = matrix::Matrix::from_vec(1, 1, vec![0.05]);
    (model, f, c1)
}

fn run() -> Result<()> {
    let config = load_config()?;
    config.validate()?;

    if let Some(n) = config.num_threads {
        matrix::set_num_threads(n);
    }

    let (model, f, c1) = fixture();
    let c2 = config.c_scale.as_deref().map(io::read_matrix).transpose()?;

    let results = scan::selscan::run(&config, &model, &f, &c1, c2.as_ref())?;
    for (j, r) in results.iter().enumerate() {
        info!("marker {j}: step={} lrt={:.4}", r.step, r.lrt);
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
