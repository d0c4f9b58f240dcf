use matrix::Matrix;
use rand::Rng;

use crate::error::IoError;

/// Per-population lower/upper bounds on each ancestry component, assigning
/// every individual to one of `P` groups.
///
/// File format: `#`-prefixed comment lines are stripped, then the remaining
/// whitespace-separated tokens are `I` (individual count), `K` (component
/// count), `I` group-assignment indices, then for each of the `1 + max(assignment)`
/// groups a `2*K`-length bound vector (first `K` lower bounds, last `K` upper
/// bounds).
#[derive(Debug, Clone)]
pub struct ForcedGrouping {
    ksize: usize,
    assignment: Vec<usize>,
    // one (2*ksize)-length bound vector per group: [0..ksize) lower, [ksize..2*ksize) upper
    bounds: Vec<Vec<f64>>,
}

impl ForcedGrouping {
    pub fn parse(path: &str, text: &str) -> Result<Self, IoError> {
        let stripped: String = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ");
        let mut tokens = stripped.split_whitespace();

        let fail = |reason: &str| IoError::ForcedGrouping { path: path.to_string(), reason: reason.to_string() };

        let individuals: usize =
            tokens.next().and_then(|t| t.parse().ok()).ok_or_else(|| fail("missing individual count I"))?;
        let ksize: usize = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(|| fail("missing component count K"))?;

        if individuals < 2 {
            return Err(fail("I must be at least 2"));
        }
        if ksize < 2 {
            return Err(fail("K must be at least 2"));
        }

        let mut assignment = Vec::with_capacity(individuals);
        for _ in 0..individuals {
            let a: usize = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(|| fail("missing group assignment"))?;
            assignment.push(a);
        }

        let population_count = 1 + assignment.iter().copied().max().unwrap_or(0);
        let mut bounds = Vec::with_capacity(population_count);
        for _ in 0..population_count {
            let mut b = Vec::with_capacity(2 * ksize);
            for _ in 0..2 * ksize {
                let value: f64 = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(|| fail("missing bound value"))?;
                b.push(value);
            }
            bounds.push(b);
        }

        if tokens.next().is_some() {
            return Err(fail("trailing tokens after the last bound vector"));
        }

        let grouping = Self { ksize, assignment, bounds };
        grouping.validate(path)?;
        Ok(grouping)
    }

    fn validate(&self, path: &str) -> Result<(), IoError> {
        let fail = |reason: &str| IoError::ForcedGrouping { path: path.to_string(), reason: reason.to_string() };

        for b in &self.bounds {
            if b.len() != 2 * self.ksize {
                return Err(fail("bound vector has the wrong length"));
            }
            let lower_sum: f64 = b[..self.ksize].iter().sum();
            let upper_sum: f64 = b[self.ksize..].iter().sum();
            if lower_sum > 1.0 {
                return Err(fail("lower bounds sum to more than 1"));
            }
            if upper_sum < 1.0 {
                return Err(fail("upper bounds sum to less than 1"));
            }
            for k in 0..self.ksize {
                let (lo, hi) = (b[k], b[self.ksize + k]);
                if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) {
                    return Err(fail("bound value outside [0, 1]"));
                }
                if lo > hi {
                    return Err(fail("lower bound exceeds upper bound"));
                }
            }
        }
        Ok(())
    }

    pub fn ksize(&self) -> usize {
        self.ksize
    }

    pub fn individuals(&self) -> usize {
        self.assignment.len()
    }

    /// Lower bound on component `k` of individual `i`, via `i`'s group assignment.
    pub fn get_min(&self, i: usize, k: usize) -> f64 {
        self.bounds[self.assignment[i]][k]
    }

    /// Upper bound on component `k` of individual `i`, via `i`'s group assignment.
    pub fn get_max(&self, i: usize, k: usize) -> f64 {
        self.bounds[self.assignment[i]][self.ksize + k]
    }

    /// Builds an initial Q matrix within the grouping's bounds: every cell
    /// starts at its lower bound, then rows are rebalanced towards a sum of
    /// one by repeatedly nudging a random component within its feasible range.
    pub fn randomize_q(&self, rng: &mut impl Rng) -> Matrix {
        const EPSILON: f64 = 1.0e-6;

        let i_count = self.individuals();
        let k_count = self.ksize;
        let mut q = Matrix::new(i_count, k_count);
        for i in 0..i_count {
            for k in 0..k_count {
                q.set(i, k, self.get_min(i, k));
            }
        }

        for i in 0..i_count {
            loop {
                let row_sum = q.row_sum(i);
                if (1.0 - row_sum).abs() < EPSILON {
                    break;
                }
                let k = rng.gen_range(0..k_count);
                let q_ik = q.get(i, k);

                let sample = if row_sum > 1.0 {
                    let min_ik = self.get_min(i, k);
                    let distance = row_sum - 1.0;
                    let boundary = f64::max(min_ik, q_ik - distance);
                    rng.gen_range(boundary..=q_ik)
                } else {
                    let max_ik = self.get_max(i, k);
                    let distance = 1.0 - row_sum;
                    let boundary = f64::min(q_ik + distance, max_ik);
                    rng.gen_range(q_ik..=boundary)
                };
                q.set(i, k, sample);
            }
        }

        q
    }

    /// Checks that `q` has the grouping's shape and every cell respects its
    /// group's bounds.
    pub fn validate_q(&self, q: &matrix::Matrix) -> bool {
        if q.height() != self.individuals() || q.width() != self.ksize {
            return false;
        }
        for i in 0..q.height() {
            for k in 0..self.ksize {
                let value = q.get(i, k);
                if value < self.get_min(i, k) || value > self.get_max(i, k) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_groups() {
        let text = "\
            # comment line\n\
            4 2\n\
            0 0 1 1\n\
            0.1 0.1 0.9 0.9\n\
            0.0 0.2 1.0 0.8\n";
        let fg = ForcedGrouping::parse("x.fg", text).unwrap();
        assert_eq!(fg.ksize(), 2);
        assert_eq!(fg.individuals(), 4);
        assert_eq!(fg.get_min(0, 0), 0.1);
        assert_eq!(fg.get_max(2, 1), 0.8);
    }

    #[test]
    fn rejects_lower_bounds_summing_above_one() {
        let text = "2 2\n0 0\n0.6 0.6 0.9 0.9\n";
        assert!(ForcedGrouping::parse("x.fg", text).is_err());
    }

    #[test]
    fn rejects_trailing_tokens() {
        let text = "2 2\n0 0\n0.1 0.1 0.9 0.9\n extra\n";
        assert!(ForcedGrouping::parse("x.fg", text).is_err());
    }
}
