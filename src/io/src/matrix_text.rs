use std::fmt::Write as _;

use matrix::Matrix;

use crate::error::IoError;

/// Parses the ASCII whitespace-separated matrix format: an integer height, an
/// integer width, then `height*width` values in row-major order.
pub fn parse_matrix(path: &str, text: &str) -> Result<Matrix, IoError> {
    let mut tokens = text.split_whitespace();
    parse_one(path, &mut tokens)
}

/// Renders a matrix in the same whitespace-separated format `parse_matrix` reads.
pub fn format_matrix(m: &Matrix) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", m.height(), m.width());
    for r in 0..m.height() {
        let row = m.row(r);
        for (i, v) in row.iter().enumerate() {
            if i > 0 {
                out.push('\t');
            }
            let _ = write!(out, "{v}");
        }
        out.push('\n');
    }
    out
}

/// Splits off one matrix's worth of tokens, returning the remainder of the
/// token stream alongside the parsed matrix. Used to read the three
/// concatenated sub-matrices of a `.lgm` file.
fn parse_one<'a>(path: &str, tokens: &mut std::str::SplitWhitespace<'a>) -> Result<Matrix, IoError> {
    let height: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| IoError::MatrixSize { path: path.to_string() })?;
    let width: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| IoError::MatrixSize { path: path.to_string() })?;

    let mut data = Vec::with_capacity(height * width);
    for row in 0..height {
        for col in 0..width {
            let value: f64 = tokens
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| IoError::MatrixCell { path: path.to_string(), row, col })?;
            data.push(value);
        }
    }
    Ok(Matrix::from_vec(height, width, data))
}

/// Parses three whitespace-concatenated matrices of identical shape: minor/minor,
/// major/minor, major/major likelihoods.
pub fn parse_three_matrices(path: &str, text: &str) -> Result<(Matrix, Matrix, Matrix), IoError> {
    let mut tokens = text.split_whitespace();
    let a = parse_one(path, &mut tokens)?;
    let b = parse_one(path, &mut tokens)?;
    let c = parse_one(path, &mut tokens)?;
    Ok((a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_a_simple_matrix() {
        let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let text = format_matrix(&m);
        let parsed = parse_matrix("test", &text).unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn parses_three_concatenated_matrices() {
        let text = "1 1\n0.1\n1 1\n0.2\n1 1\n0.7\n";
        let (a, b, c) = parse_three_matrices("test", text).unwrap();
        assert_eq!(a.get(0, 0), 0.1);
        assert_eq!(b.get(0, 0), 0.2);
        assert_eq!(c.get(0, 0), 0.7);
    }

    #[test]
    fn reports_malformed_size_header() {
        assert!(parse_matrix("test", "not-a-number 2\n1 2").is_err());
    }
}
