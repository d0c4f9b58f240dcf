use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use crate::error::ExprError;
use crate::shunting_yard::Expression;

fn validate_name(name: &str) -> Result<String, ExprError> {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_alphabetic());
    let rest_ok = chars.clone().all(|c| c.is_alphanumeric() || c == '_');
    if first_ok && rest_ok {
        Ok(name.to_string())
    } else {
        Err(ExprError::InvalidName(name.to_string()))
    }
}

struct LineReader<R> {
    lines: std::io::Lines<R>,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }

    /// Returns the next non-blank, non-comment line.
    fn next_content_line(&mut self) -> Result<Option<String>, ExprError> {
        for line in self.lines.by_ref() {
            let line = line.map_err(|_| ExprError::UnexpectedEof)?;
            if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn require_content_line(&mut self) -> Result<String, ExprError> {
        self.next_content_line()?.ok_or(ExprError::UnexpectedEof)
    }
}

fn read_names<R: BufRead>(reader: &mut LineReader<R>) -> Result<Vec<String>, ExprError> {
    let line = reader.require_content_line()?;
    line.split_whitespace().map(validate_name).collect()
}

fn read_size<R: BufRead>(reader: &mut LineReader<R>) -> Result<usize, ExprError> {
    let line = reader.require_content_line()?;
    let mut parts = line.split_whitespace();
    let size_text = parts.next().ok_or_else(|| ExprError::InvalidSize(line.clone()))?;
    let size: usize = size_text.parse().map_err(|_| ExprError::InvalidSize(line.clone()))?;
    if size < 2 {
        return Err(ExprError::InvalidSize(line));
    }
    if let Some(extra) = parts.next() {
        return Err(ExprError::UnexpectedToken(extra.to_string()));
    }
    Ok(size)
}

/// An admixture graph input file: a declared set of branch-length and
/// admixture-proportion variable names, a population count `k`, and
/// `k*(k-1)/2` expressions for the entries of the covariance matrix.
#[derive(Debug, Clone)]
pub struct AgiInput {
    pub branch_names: Vec<String>,
    pub proportion_names: Vec<String>,
    pub k: usize,
    pub entries: Vec<Expression>,
    pub args: HashMap<String, f64>,
}

impl AgiInput {
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ExprError> {
        let mut lines = LineReader::new(reader);

        let mut branch_names = read_names(&mut lines)?;
        let mut proportion_names = read_names(&mut lines)?;
        let k = read_size(&mut lines)?;

        let entry_count = k * (k - 1) / 2;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let line = lines.require_content_line()?;
            entries.push(Expression::parse(&line)?);
        }

        if let Some(line) = lines.next_content_line()? {
            let token = line.split_whitespace().next().unwrap_or(&line).to_string();
            return Err(ExprError::UnexpectedToken(token));
        }

        let mut defined = HashSet::new();
        for name in branch_names.iter().chain(proportion_names.iter()) {
            if !defined.insert(name.clone()) {
                return Err(ExprError::DuplicateVariable(name.clone()));
            }
        }

        let mut used = HashSet::new();
        for entry in &entries {
            for name in entry.variables() {
                if !defined.contains(&name) {
                    return Err(ExprError::UndeclaredVariable(name));
                }
                used.insert(name);
            }
        }

        branch_names.retain(|name| used.contains(name));
        proportion_names.retain(|name| used.contains(name));

        let args = used.into_iter().map(|name| (name, 0.0)).collect();

        Ok(Self { branch_names, proportion_names, k, entries, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Branch length parameters, range: [0, inf)
a b c d e f g

# Admixture proportion parameters, range: [0, 1]
p

# K value
3

# Matrix entries, total number should be: K*(K-1)/2
(1 - p) * (b + e + g + f + a) + p * (b + d + a)
p * a + (1 - p) * (g + f + a)
c + g + f + a
";

    #[test]
    fn parses_sample_admixture_graph() {
        let agi = AgiInput::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(agi.k, 3);
        assert_eq!(agi.entries.len(), 3);
        assert!(agi.branch_names.contains(&"a".to_string()));
        assert!(agi.proportion_names.contains(&"p".to_string()));
        assert!(agi.args.contains_key("a"));
    }

    #[test]
    fn rejects_undeclared_variable() {
        let bad = "a\np\n2\na + q\n";
        assert!(matches!(AgiInput::parse(bad.as_bytes()), Err(ExprError::UndeclaredVariable(name)) if name == "q"));
    }

    #[test]
    fn rejects_duplicate_variable_name() {
        let bad = "a b a\np\n2\na + b\n";
        assert!(matches!(AgiInput::parse(bad.as_bytes()), Err(ExprError::DuplicateVariable(name)) if name == "a"));
    }

    #[test]
    fn drops_unused_declared_names_without_error() {
        let input = "a unused\np\n2\na + p\n";
        let agi = AgiInput::parse(input.as_bytes()).unwrap();
        assert!(!agi.branch_names.contains(&"unused".to_string()));
    }
}
