//! Derivative-free minimisation used for ARIMA parameter estimation.

use std::cmp::Ordering;

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Iterations summed over all restarts.
    pub iterations: usize,
    /// Whether the final simplex met the tolerance.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum iterations per restart.
    pub max_iter: usize,
    /// Convergence tolerance on objective spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Relative step used to build the initial simplex.
    pub initial_step: f64,
    /// Number of times the search is relaunched from the best point.
    pub restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            restarts: 0,
        }
    }
}

/// Minimise `objective` starting from `initial`, clamping every trial point
/// into `bounds` when given.
///
/// # Example
/// ```
/// use sigforecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let start = clamp(initial, bounds);
    let mut best =
        Simplex::around(&start, bounds, &config, &objective).run(&objective, bounds, &config);
    let mut total_iterations = best.iterations;

    for _ in 0..config.restarts {
        let restart = best.optimal_point.clone();
        let mut next =
            Simplex::around(&restart, bounds, &config, &objective).run(&objective, bounds, &config);
        total_iterations += next.iterations;
        let improved = next.optimal_value < best.optimal_value - config.tolerance;
        if next.optimal_value <= best.optimal_value {
            next.iterations = total_iterations;
            best = next;
        }
        if !improved {
            break;
        }
    }

    best.iterations = total_iterations;
    best
}

struct Simplex {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
}

impl Simplex {
    fn around<F>(
        start: &[f64],
        bounds: Option<&[(f64, f64)]>,
        config: &NelderMeadConfig,
        objective: &F,
    ) -> Self
    where
        F: Fn(&[f64]) -> f64,
    {
        let mut vertices = Vec::with_capacity(start.len() + 1);
        vertices.push(start.to_vec());
        for i in 0..start.len() {
            let mut vertex = start.to_vec();
            vertex[i] += if start[i].abs() > 1e-10 {
                config.initial_step * start[i].abs()
            } else {
                config.initial_step
            };
            let vertex = clamp(&vertex, bounds);
            // A vertex clamped back onto the start collapses the simplex.
            let vertex = if vertex == start {
                let mut flipped = start.to_vec();
                flipped[i] -= config.initial_step.max(config.initial_step * start[i].abs());
                clamp(&flipped, bounds)
            } else {
                vertex
            };
            vertices.push(vertex);
        }
        let values = vertices.iter().map(|v| objective(v)).collect();
        Self { vertices, values }
    }

    fn order(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.vertices.len()).collect();
        indices.sort_by(|&a, &b| {
            self.values[a]
                .partial_cmp(&self.values[b])
                .unwrap_or(Ordering::Equal)
        });
        indices
    }

    fn centroid_without(&self, excluded: usize) -> Vec<f64> {
        let dims = self.vertices[0].len();
        let count = (self.vertices.len() - 1) as f64;
        let mut centroid = vec![0.0; dims];
        for (i, vertex) in self.vertices.iter().enumerate() {
            if i == excluded {
                continue;
            }
            for (c, x) in centroid.iter_mut().zip(vertex) {
                *c += x / count;
            }
        }
        centroid
    }

    fn replace(&mut self, index: usize, point: Vec<f64>, value: f64) {
        self.vertices[index] = point;
        self.values[index] = value;
    }

    fn run<F>(
        mut self,
        objective: &F,
        bounds: Option<&[(f64, f64)]>,
        config: &NelderMeadConfig,
    ) -> NelderMeadResult
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = self.vertices.len() - 1;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < config.max_iter {
            iterations += 1;

            let order = self.order();
            let (best, second_worst, worst) = (order[0], order[n - 1], order[n]);

            if self.values[worst] - self.values[best] < config.tolerance {
                converged = true;
                break;
            }

            let centroid = self.centroid_without(worst);
            let size = self
                .vertices
                .iter()
                .map(|v| distance(v, &centroid))
                .fold(0.0, f64::max);
            if size < config.tolerance {
                converged = true;
                break;
            }

            let reflected = clamp(
                &towards(&centroid, &self.vertices[worst], -config.alpha),
                bounds,
            );
            let reflected_value = objective(&reflected);

            if reflected_value < self.values[best] {
                let expanded = clamp(&towards(&centroid, &reflected, config.gamma), bounds);
                let expanded_value = objective(&expanded);
                if expanded_value < reflected_value {
                    self.replace(worst, expanded, expanded_value);
                } else {
                    self.replace(worst, reflected, reflected_value);
                }
                continue;
            }

            if reflected_value < self.values[second_worst] {
                self.replace(worst, reflected, reflected_value);
                continue;
            }

            let (target, target_value) = if reflected_value < self.values[worst] {
                (reflected.clone(), reflected_value)
            } else {
                (self.vertices[worst].clone(), self.values[worst])
            };
            let contracted = clamp(&towards(&centroid, &target, config.rho), bounds);
            let contracted_value = objective(&contracted);
            if contracted_value < target_value {
                self.replace(worst, contracted, contracted_value);
                continue;
            }

            let anchor = self.vertices[best].clone();
            for i in 0..=n {
                if i == best {
                    continue;
                }
                let shrunk = clamp(&towards(&anchor, &self.vertices[i], config.sigma), bounds);
                let value = objective(&shrunk);
                self.replace(i, shrunk, value);
            }
        }

        let best = self.order()[0];
        NelderMeadResult {
            optimal_point: self.vertices[best].clone(),
            optimal_value: self.values[best],
            iterations,
            converged,
        }
    }
}

/// `origin + factor * (point - origin)`.
fn towards(origin: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + factor * (p - o))
        .collect()
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
