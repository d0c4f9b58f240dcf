//! A Nelder-Mead simplex with dimension-adaptive coefficients, following Gao
//! and Han's 2010 "Implementing the Nelder-Mead simplex algorithm with
//! adaptive parameters".

use std::time::Instant;

/// The operation performed by one call to [`Simplex::iterate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Reflection,
    Expansion,
    ContractionOut,
    ContractionIn,
    Shrinkage,
}

/// Why [`Simplex::execute`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCondition {
    Delta,
    Epsilon,
    Iteration,
    Length,
    Timeout,
}

/// The reflection/expansion/contraction/shrinkage coefficients. The defaults
/// scale with dimension `n`; `n == 1` falls back to the classic fixed
/// coefficients since the adaptive formulas degenerate there.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub chi: f64,
    pub gamma: f64,
    pub rho: f64,
    pub sigma: f64,
    pub unit: f64,
}

impl Options {
    pub fn new(n: usize) -> Self {
        let (chi, gamma, sigma) = if n >= 2 {
            let nf = n as f64;
            (1.0 + 2.0 / nf, 0.75 - 1.0 / (2.0 * nf), 1.0 - 1.0 / nf)
        } else {
            (2.0, 0.5, 0.5)
        };
        Self { chi, gamma, rho: 1.0, sigma, unit: 1.0 }
    }
}

/// Termination criteria for [`Simplex::execute`]; each is optional (`None`
/// disables that criterion).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteArgs {
    pub max_iterations: Option<usize>,
    pub max_seconds: Option<f64>,
    pub min_delta: Option<f64>,
    pub min_epsilon: Option<f64>,
    pub min_length: Option<f64>,
}

struct Vertex {
    params: Vec<f64>,
    objval: f64,
}

/// Counters describing how an [`Simplex`] run reached its current state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub iterations: usize,
    pub reflections: usize,
    pub expansions: usize,
    pub contractions_out: usize,
    pub contractions_in: usize,
    pub shrinkages: usize,
    pub evaluations: usize,
}

/// A Nelder-Mead simplex over an `n`-dimensional parameter space.
pub struct Simplex {
    n: usize,
    opts: Options,
    vertices: Vec<Vertex>,
    iterations: usize,
    reflections: usize,
    expansions: usize,
    contractions_out: usize,
    contractions_in: usize,
    shrinkages: usize,
    evaluations: usize,
}

impl Simplex {
    /// Builds the initial `n+1` vertices by offsetting `vertex` by `opts.unit`
    /// in each dimension in turn, then evaluates and sorts them.
    pub fn new(objfunc: &mut dyn FnMut(&[f64]) -> f64, vertex: Vec<f64>, opts: Options) -> Self {
        let n = vertex.len();
        assert!(n > 0);

        let mut vertices = Vec::with_capacity(n + 1);
        for i in 0..=n {
            let mut params = vertex.clone();
            if i > 0 {
                params[i - 1] += opts.unit;
            }
            vertices.push(Vertex { params, objval: 0.0 });
        }

        let mut simplex = Self {
            n,
            opts,
            vertices,
            iterations: 0,
            reflections: 0,
            expansions: 0,
            contractions_out: 0,
            contractions_in: 0,
            shrinkages: 0,
            evaluations: 0,
        };
        for v in &mut simplex.vertices {
            v.objval = objfunc(&v.params);
            simplex.evaluations += 1;
        }
        simplex.sort();
        simplex
    }

    fn sort(&mut self) {
        self.vertices.sort_by(|a, b| a.objval.partial_cmp(&b.objval).unwrap_or(std::cmp::Ordering::Equal));
    }

    pub fn vertex(&self) -> &[f64] {
        &self.vertices[0].params
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn stats(&self) -> Stats {
        Stats {
            iterations: self.iterations,
            reflections: self.reflections,
            expansions: self.expansions,
            contractions_out: self.contractions_out,
            contractions_in: self.contractions_in,
            shrinkages: self.shrinkages,
            evaluations: self.evaluations,
        }
    }

    pub fn objval(&self) -> f64 {
        self.vertices[0].objval
    }

    /// Difference between the worst and best objective values.
    pub fn delta(&self) -> f64 {
        self.vertices[self.n].objval - self.vertices[0].objval
    }

    /// Sum of non-infinite objective values, divided by the count of those
    /// values squared; used as the "flux" compared across iterations by the
    /// `min_epsilon` termination criterion.
    pub fn flux(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for v in &self.vertices {
            if v.objval < f64::MAX {
                sum += v.objval;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / (count as f64) / (count as f64)
        }
    }

    /// Maximum squared distance from the best vertex to any other vertex.
    pub fn length_squared(&self) -> f64 {
        let p0 = &self.vertices[0].params;
        let mut max = 0.0_f64;
        for i in 1..=self.n {
            let p = &self.vertices[i].params;
            let sum_sq: f64 = p0.iter().zip(p).map(|(a, b)| (a - b) * (a - b)).sum();
            max = max.max(sum_sq);
        }
        max
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Performs one reflect/expand/contract/shrink iteration.
    pub fn iterate(&mut self, objfunc: &mut dyn FnMut(&[f64]) -> f64) -> Operation {
        self.iterations += 1;
        let n = self.n;

        let mut xbar = vec![0.0; n];
        for i in 0..n {
            for (k, x) in xbar.iter_mut().enumerate() {
                *x += self.vertices[i].params[k];
            }
        }
        for x in &mut xbar {
            *x /= n as f64;
        }

        let xr: Vec<f64> = (0..n)
            .map(|k| xbar[k] + self.opts.rho * (xbar[k] - self.vertices[n].params[k]))
            .collect();
        let fr = self.evaluate(objfunc, &xr);

        if self.vertices[0].objval <= fr && fr < self.vertices[n - 1].objval {
            return self.accept(xr, fr, Operation::Reflection);
        }

        if fr < self.vertices[0].objval {
            let xe: Vec<f64> = (0..n).map(|k| xbar[k] + self.opts.chi * (xr[k] - xbar[k])).collect();
            let fe = self.evaluate(objfunc, &xe);
            return if fe < fr {
                self.accept(xe, fe, Operation::Expansion)
            } else {
                self.accept(xr, fr, Operation::Reflection)
            };
        }

        if fr >= self.vertices[n - 1].objval {
            if fr < self.vertices[n].objval {
                let xc: Vec<f64> = (0..n).map(|k| xbar[k] + self.opts.gamma * (xr[k] - xbar[k])).collect();
                let fc = self.evaluate(objfunc, &xc);
                if fc <= fr {
                    return self.accept(xc, fc, Operation::ContractionOut);
                }
            } else {
                let xcc: Vec<f64> = (0..n)
                    .map(|k| xbar[k] - self.opts.gamma * (xbar[k] - self.vertices[n].params[k]))
                    .collect();
                let fcc = self.evaluate(objfunc, &xcc);
                if fcc < self.vertices[n].objval {
                    return self.accept(xcc, fcc, Operation::ContractionIn);
                }
            }
        }

        let x0 = self.vertices[0].params.clone();
        for i in 1..=n {
            let v = &mut self.vertices[i];
            for k in 0..n {
                v.params[k] = x0[k] + self.opts.sigma * (v.params[k] - x0[k]);
            }
            v.objval = objfunc(&v.params);
            self.evaluations += 1;
        }
        self.sort();
        self.shrinkages += 1;
        Operation::Shrinkage
    }

    fn evaluate(&mut self, objfunc: &mut dyn FnMut(&[f64]) -> f64, params: &[f64]) -> f64 {
        self.evaluations += 1;
        objfunc(params)
    }

    fn accept(&mut self, params: Vec<f64>, objval: f64, op: Operation) -> Operation {
        let n = self.n;
        self.vertices[n].params = params;
        self.vertices[n].objval = objval;
        self.sort();
        match op {
            Operation::Reflection => self.reflections += 1,
            Operation::Expansion => self.expansions += 1,
            Operation::ContractionOut => self.contractions_out += 1,
            Operation::ContractionIn => self.contractions_in += 1,
            Operation::Shrinkage => self.shrinkages += 1,
        }
        op
    }

    /// Calls [`Simplex::iterate`] until one of `args`'s criteria is met.
    pub fn execute(&mut self, objfunc: &mut dyn FnMut(&[f64]) -> f64, args: &ExecuteArgs) -> ExitCondition {
        let t0 = Instant::now();
        let mut iteration = 0usize;
        let mut flux0 = self.flux();

        loop {
            if let Some(max) = args.max_iterations {
                if iteration >= max {
                    return ExitCondition::Iteration;
                }
            }
            if let Some(max) = args.max_seconds {
                if t0.elapsed().as_secs_f64() >= max {
                    return ExitCondition::Timeout;
                }
            }
            if let Some(min) = args.min_delta {
                if self.delta() <= min {
                    return ExitCondition::Delta;
                }
            }
            if let Some(min) = args.min_length {
                if self.length() <= min {
                    return ExitCondition::Length;
                }
            }

            self.iterate(objfunc);
            iteration += 1;

            let flux = self.flux();
            if let Some(min) = args.min_epsilon {
                if (flux0 - flux).abs() <= min {
                    return ExitCondition::Epsilon;
                }
            }
            flux0 = flux;
        }
    }
}
