//! Derivative-free minimization.

use ordered_float::OrderedFloat;

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Result of a minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

/// Nelder-Mead simplex search starting at `start`.
///
/// The initial simplex offsets each coordinate by `step`. Stops after
/// `max_iter` iterations or once the spread of objective values across the
/// simplex drops below `tol`. Non-finite objective values are treated as
/// infinitely bad.
pub fn nelder_mead<F>(f: F, start: &[f64], step: f64, tol: f64, max_iter: usize) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let dim = start.len();
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
    simplex.push((start.to_vec(), eval(start)));
    for i in 0..dim {
        let mut x = start.to_vec();
        x[i] += step;
        let v = eval(&x);
        simplex.push((x, v));
    }

    let mut iterations = 0;
    while iterations < max_iter {
        simplex.sort_by_key(|(_, v)| OrderedFloat(*v));
        let best = simplex[0].1;
        let worst = simplex[dim].1;
        if (worst - best).abs() <= tol {
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|(x, _)| x[j]).sum::<f64>() / dim as f64)
            .collect();
        let worst_point = simplex[dim].0.clone();
        let towards = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&worst_point)
                .map(|(c, w)| c + coef * (w - c))
                .collect()
        };

        let reflected = towards(-REFLECT);
        let reflected_value = eval(&reflected);
        if reflected_value < best {
            let expanded = towards(-EXPAND);
            let expanded_value = eval(&expanded);
            simplex[dim] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }
        if reflected_value < simplex[dim - 1].1 {
            simplex[dim] = (reflected, reflected_value);
            continue;
        }

        let contracted = if reflected_value < worst {
            towards(-CONTRACT)
        } else {
            towards(CONTRACT)
        };
        let contracted_value = eval(&contracted);
        if contracted_value < worst.min(reflected_value) {
            simplex[dim] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for (x, v) in simplex.iter_mut().skip(1) {
            for (xi, ai) in x.iter_mut().zip(&anchor) {
                *xi = ai + SHRINK * (*xi - ai);
            }
            *v = eval(x);
        }
    }

    simplex.sort_by_key(|(_, v)| OrderedFloat(*v));
    let (x, value) = simplex.swap_remove(0);
    Minimum {
        x,
        value,
        iterations,
    }
}
