use expr::AgiInput;

use crate::error::IoError;

/// Parses an admixture graph input (`.agi`) file.
pub fn parse_agi(text: &str) -> Result<AgiInput, IoError> {
    AgiInput::parse(text.as_bytes()).map_err(IoError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_graph() {
        let text = "a\np\n2\na + p\n";
        let agi = parse_agi(text).unwrap();
        assert_eq!(agi.k, 2);
    }
}
