//! Entry point for the ancestry optimizer. Argument parsing is out of scope;
//! an optional first argument names a YAML config file (the `FromYaml`
//! convention), otherwise a small built-in fixture stands in for real input.

use std::process;

use anyhow::{bail, Result};
use config::AncestryConfig;
use model::{DiscreteGenotypeMatrix, GenotypeModel};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[macro_use]
extern crate log;

fn load_config() -> Result<AncestryConfig> {
    match std::env::args().nth(1) {
        Some(yaml) => {
            let text = io::read_to_string(std::path::Path::new(&yaml))?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(AncestryConfig { seed: 1864, max_iterations: 50, ..Default::default() }),
    }
}

fn fixture_model() -> GenotypeModel {
    // 3 individuals, 4 markers.
    GenotypeModel::Discrete(DiscreteGenotypeMatrix::from_codes(
        3,
        4,
        vec![0, 1, 2, 0, 1, 1, 2, 2, 2, 0, 0, 1],
    ))
}

fn run() -> Result<()> {
    let config = load_config()?;
    config.validate()?;

    if let Some(n) = config.num_threads {
        matrix::set_num_threads(n);
    }

    let model = fixture_model();
    let ksize = config.ksize.unwrap_or(2);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let q0 = match &config.qin {
        Some(path) => io::read_matrix(path)?,
        None => qpas::randomize_q(model.height(), ksize, &mut rng),
    };
    let mu = model.create_mu(1.0e-10);
    let mut f0 = match &config.fin {
        Some(path) => io::read_matrix(path)?,
        None => qpas::randomize_f(ksize, &mu, &mut rng),
    };

    let forced_grouping = config.force.as_deref().map(io::read_forced_grouping).transpose()?;
    let fin_force = config.fin_force.as_deref().map(io::read_matrix).transpose()?;
    let fin_force_rows = match &fin_force {
        Some(m) => {
            if m.width() != f0.width() || m.height() > f0.height() {
                bail!(
                    "fin-force matrix is {}x{}, incompatible with F ({}x{})",
                    m.height(),
                    m.width(),
                    f0.height(),
                    f0.width()
                );
            }
            for k in 0..m.height() {
                for j in 0..m.width() {
                    f0.set(k, j, m.get(k, j));
                }
            }
            m.height()
        }
        None => 0,
    };

    let result = qpas::run(&config, &model, q0, f0, forced_grouping.as_ref(), fin_force_rows)?;
    info!("converged after {} iterations, lle={:.6}", result.iterations, result.lle);

    if let Some(path) = &config.qout {
        io::write_matrix(path, &result.q)?;
    }
    if let Some(path) = &config.fout {
        io::write_matrix(path, &result.f)?;
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
