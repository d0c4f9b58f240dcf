//! File formats shared by the ancestry, covariance, and scan subsystems: the
//! whitespace-separated matrix format, discrete/likelihood genotype files,
//! forced-grouping files, Newick trees, and admixture graph input files.

mod agi;
mod convert;
mod error;
mod files;
mod forced_grouping;
mod genotype;
mod matrix_text;
mod newick;

pub use agi::parse_agi;
pub use convert::convert;
pub use error::IoError;
pub use files::{read_to_string, write_string};
pub use forced_grouping::ForcedGrouping;
pub use genotype::{parse_discrete, parse_genotype_model, parse_likelihood};
pub use matrix_text::{format_matrix, parse_matrix, parse_three_matrices};
pub use newick::{format_newick, parse_newick};

/// Reads a genotype model from a file path, dispatching on its extension.
pub fn read_genotype_model(path: &std::path::Path) -> Result<model::GenotypeModel, IoError> {
    let text = files::read_to_string(path)?;
    genotype::parse_genotype_model(&path.display().to_string(), &text)
}

/// Reads a whitespace-separated matrix file.
pub fn read_matrix(path: &std::path::Path) -> Result<matrix::Matrix, IoError> {
    let text = files::read_to_string(path)?;
    matrix_text::parse_matrix(&path.display().to_string(), &text)
}

/// Writes a matrix in the whitespace-separated format.
pub fn write_matrix(path: &std::path::Path, m: &matrix::Matrix) -> Result<(), IoError> {
    files::write_string(path, &matrix_text::format_matrix(m))
}

/// Reads a forced-grouping file.
pub fn read_forced_grouping(path: &std::path::Path) -> Result<ForcedGrouping, IoError> {
    let text = files::read_to_string(path)?;
    ForcedGrouping::parse(&path.display().to_string(), &text)
}

/// Reads a Newick tree file.
pub fn read_newick(path: &std::path::Path) -> Result<tree::Node, IoError> {
    let text = files::read_to_string(path)?;
    newick::parse_newick(&text)
}

/// Writes a tree as Newick text.
pub fn write_newick(path: &std::path::Path, node: &tree::Node) -> Result<(), IoError> {
    files::write_string(path, &newick::format_newick(node))
}

/// Reads an admixture graph input file.
pub fn read_agi(path: &std::path::Path) -> Result<expr::AgiInput, IoError> {
    let text = files::read_to_string(path)?;
    agi::parse_agi(&text)
}
