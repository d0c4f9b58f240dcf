use model::{DiscreteGenotypeMatrix, GenotypeModel, LikelihoodGenotypeMatrix};

use crate::error::IoError;
use crate::matrix_text::parse_three_matrices;

/// Parses a `.dgm`-format discrete genotype matrix: dosage codes `0`, `1`, `2`,
/// or `3` for missing, laid out as the ASCII matrix format's values.
pub fn parse_discrete(path: &str, text: &str) -> Result<DiscreteGenotypeMatrix, IoError> {
    let mut tokens = text.split_whitespace();
    let height: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| IoError::MatrixSize { path: path.to_string() })?;
    let width: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| IoError::MatrixSize { path: path.to_string() })?;

    let mut codes = Vec::with_capacity(height * width);
    for row in 0..height {
        for col in 0..width {
            let token = tokens
                .next()
                .ok_or_else(|| IoError::MatrixCell { path: path.to_string(), row, col })?;
            let code: i8 = token
                .parse()
                .map_err(|_| IoError::InvalidGenotypeCode(token.to_string()))?;
            if !(0..=3).contains(&code) {
                return Err(IoError::InvalidGenotypeCode(token.to_string()));
            }
            // code 3 marks a missing genotype; from_codes already maps anything
            // outside 0..=2 to missing, so 3 falls through naturally.
            codes.push(code);
        }
    }

    Ok(DiscreteGenotypeMatrix::from_codes(height, width, codes))
}

/// Parses a `.lgm`-format likelihood genotype matrix: three concatenated
/// matrices of identical shape (minor/minor, major/minor, major/major).
pub fn parse_likelihood(path: &str, text: &str) -> Result<LikelihoodGenotypeMatrix, IoError> {
    let (g_aa, g_aa_alt, g_aa_ref) = parse_three_matrices(path, text)?;
    Ok(LikelihoodGenotypeMatrix::new(g_aa, g_aa_alt, g_aa_ref)?)
}

/// Dispatches on file extension (`.dgm` discrete, `.lgm` likelihood) and parses
/// the corresponding genotype matrix format.
pub fn parse_genotype_model(path: &str, text: &str) -> Result<GenotypeModel, IoError> {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext);
    match extension {
        Some("dgm") => Ok(GenotypeModel::Discrete(parse_discrete(path, text)?)),
        Some("lgm") => Ok(GenotypeModel::Likelihood(parse_likelihood(path, text)?)),
        Some(_) => Err(IoError::UnsupportedExtension(path.to_string())),
        None => Err(IoError::MissingExtension(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_discrete_codes_including_missing() {
        let text = "1 4\n0 1 2 3\n";
        let g = parse_discrete("x.dgm", text).unwrap();
        assert_eq!(g.height(), 1);
        assert_eq!(g.width(), 4);
    }

    #[test]
    fn rejects_out_of_range_code() {
        let text = "1 1\n4\n";
        assert!(parse_discrete("x.dgm", text).is_err());
    }

    #[test]
    fn dispatches_on_extension() {
        let text = "1 1\n0\n";
        assert!(matches!(parse_genotype_model("x.dgm", text), Ok(GenotypeModel::Discrete(_))));
        assert!(matches!(parse_genotype_model("x.txt", text), Err(IoError::UnsupportedExtension(_))));
        assert!(matches!(parse_genotype_model("x", text), Err(IoError::MissingExtension(_))));
    }
}
