//! Entry point for the PED/BEAGLE passthrough conversion stub. Takes an input
//! path and an output path; actual format conversion stays out of scope.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Result};

#[macro_use]
extern crate log;

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input: PathBuf = match args.next() {
        Some(p) => p.into(),
        None => bail!("usage: ohana-convert <input> <output>"),
    };
    let output: PathBuf = match args.next() {
        Some(p) => p.into(),
        None => bail!("usage: ohana-convert <input> <output>"),
    };

    io::convert(&input, &output)?;
    info!("wrote {}", output.display());
    Ok(())
}

fn main() {
    logger::Logger::init(1);
    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}
