//! Proximal step of the congestion cost, pointwise per cell.
//!
//! Every corner $j$ of a cell carries the constraint $A_j + |B|^2/2 <= E_j$,
//! whose conjugate penalty is $sum_j E_j^2 / (2c)$. Per cell, with
//! $a^0 = D_t phi + sigma_A / r$ and $b^0 = G phi + sigma_B / r$, the step solves
//!
//! $min 1/3 sum_j (E_j^2/(2c) + r/2 (A_j - a^0_j)^2) + r/2 |B - b^0|^2$
//! s.t. $A_j + |B|^2/2 <= E_j$.
//!
//! The KKT conditions give $A_j = a^0_j - s_j$, $E_j = c r s_j$,
//! $B = b^0 / (1 + macron(s))$ with $s_j = (a^0_j + beta)_+ / (1 + c r)$,
//! where $beta = |B|^2/2$ is the root of a strictly increasing scalar function.
//! For $c = 0$ this is the projection onto $A_j + |B|^2/2 <= 0$ with $E = 0$.

use crate::{error::GeodesicError, layout::SpaceTimeLayout, state::AdmmState};

use common::linalg::nalgebra::{all_finite, Vector};

use rayon::prelude::*;

const MAX_ROOT_ITERATIONS: usize = 100;
const ROOT_TOLERANCE: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellProx {
  pub a: [f64; 3],
  pub b: [f64; 3],
  pub e: [f64; 3],
}

/// Proximal map of a single cell.
pub fn prox_cell(a0: [f64; 3], b0: [f64; 3], congestion: f64, penalty: f64) -> CellProx {
  let half_b0_sq = 0.5 * (b0[0] * b0[0] + b0[1] * b0[1] + b0[2] * b0[2]);

  if a0.iter().all(|&a| a + half_b0_sq <= 0.0) {
    return CellProx {
      a: a0,
      b: b0,
      e: [0.0; 3],
    };
  }

  let scale = 1.0 + congestion * penalty;
  let beta = solve_beta(a0, half_b0_sq, scale);
  let s = a0.map(|a| (a + beta).max(0.0) / scale);
  let s_mean = (s[0] + s[1] + s[2]) / 3.0;

  CellProx {
    a: std::array::from_fn(|j| a0[j] - s[j]),
    b: b0.map(|b| b / (1.0 + s_mean)),
    e: s.map(|s| congestion * penalty * s),
  }
}

/// Root of $h(beta) = beta - k / (1 + macron(s)(beta))^2$ in $[0, k]$ with $k = |b^0|^2/2$.
///
/// $h$ is continuous, strictly increasing and piecewise smooth. Newton steps
/// are safeguarded by bisection on the bracket.
fn solve_beta(a0: [f64; 3], k: f64, scale: f64) -> f64 {
  if k == 0.0 {
    return 0.0;
  }

  let eval = |beta: f64| {
    let mut s_sum = 0.0;
    let mut nactive = 0;
    for a in a0 {
      if a + beta > 0.0 {
        s_sum += (a + beta) / scale;
        nactive += 1;
      }
    }
    let denom = 1.0 + s_sum / 3.0;
    let h = beta - k / (denom * denom);
    let dh = 1.0 + 2.0 * k / (denom * denom * denom) * nactive as f64 / (3.0 * scale);
    (h, dh)
  };

  let (mut lo, mut hi) = (0.0, k);
  let mut beta = 0.0;
  for _ in 0..MAX_ROOT_ITERATIONS {
    let (h, dh) = eval(beta);
    if h == 0.0 {
      break;
    }
    if h < 0.0 {
      lo = beta;
    } else {
      hi = beta;
    }
    let step = h / dh;
    if step.abs() <= ROOT_TOLERANCE * (1.0 + beta) {
      beta -= step;
      break;
    }
    let next = beta - step;
    beta = if next > lo && next < hi {
      next
    } else {
      0.5 * (lo + hi)
    };
  }
  beta.clamp(0.0, k)
}

/// Applies the proximal map to every cell in parallel, writing the new
/// consensus variables into `state.a`, `state.b` and `state.e`.
pub fn prox_step(
  state: &mut AdmmState,
  layout: &SpaceTimeLayout,
  lambda_a: &Vector,
  lambda_b: &Vector,
  congestion: f64,
  penalty: f64,
  iteration: usize,
) -> Result<(), GeodesicError> {
  let a0 = lambda_a + &state.sigma_a / penalty;
  let b0 = lambda_b + &state.sigma_b / penalty;

  state
    .a
    .as_mut_slice()
    .par_chunks_mut(3)
    .zip(state.b.as_mut_slice().par_chunks_mut(3))
    .zip(state.e.as_mut_slice().par_chunks_mut(3))
    .zip(a0.as_slice().par_chunks(3))
    .zip(b0.as_slice().par_chunks(3))
    .enumerate()
    .try_for_each(|(icell, ((((a, b), e), a0), b0))| {
      let a0 = [a0[0], a0[1], a0[2]];
      let b0 = [b0[0], b0[1], b0[2]];
      let unstable = || {
        let (itime, itriangle) = layout.cell_time_triangle(icell);
        GeodesicError::NumericalInstability {
          iteration,
          itime,
          itriangle,
        }
      };
      if !all_finite(a0.iter().chain(&b0)) {
        return Err(unstable());
      }

      let cell = prox_cell(a0, b0, congestion, penalty);
      if !all_finite(cell.a.iter().chain(&cell.b).chain(&cell.e)) {
        return Err(unstable());
      }
      a.copy_from_slice(&cell.a);
      b.copy_from_slice(&cell.b);
      e.copy_from_slice(&cell.e);
      Ok(())
    })
}
