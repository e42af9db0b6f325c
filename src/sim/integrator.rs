use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Adaptive Dormand-Prince 5(4) integrator
// ---------------------------------------------------------------------------

/// Error-control tolerances for the embedded pair.
///
/// The per-component error scale is `atol + rtol * max(|y0|, |y1|)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerances {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { rtol: 1e-3, atol: 1e-6 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IntegrationError {
    #[error("derivative became non-finite at t = {t}")]
    NonFiniteDerivative { t: f64 },

    #[error("step size underflow at t = {t} (h = {h:e})")]
    StepUnderflow { t: f64, h: f64 },

    #[error("step limit {max_steps} exhausted at t = {t}")]
    StepLimitExceeded { t: f64, max_steps: usize },
}

/// Dormand-Prince 5(4) Butcher tableau. Row `s` of `A` holds the stage-`s`
/// coefficients; `B` is the 5th-order solution weight row and `E` the
/// difference against the embedded 4th-order row (direct error weights).
mod dp45 {
    pub const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

    pub const A: [[f64; 6]; 7] = [
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
        [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
        [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
        [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
        [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
    ];

    pub const B: [f64; 7] = [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ];

    pub const E: [f64; 7] = [
        71.0 / 57600.0,
        0.0,
        -71.0 / 16695.0,
        71.0 / 1920.0,
        -17253.0 / 339200.0,
        22.0 / 525.0,
        -1.0 / 40.0,
    ];
}

const MAX_STEPS: usize = 10_000;
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const MIN_STEP_SCALE: f64 = 1e-14;

enum Attempt<const N: usize> {
    Accept { y_new: [f64; N], err_norm: f64 },
    Reject { err_norm: f64 },
}

/// Integrate `dy/dt = rhs(t, y)` from `t0` to `tf` with adaptive step-size
/// control and return the state at `tf`. Interior states are not reported;
/// callers stepping a simulation re-invoke per interval.
///
/// The first trial step spans the whole interval, which collapses to a single
/// accepted step whenever the right-hand side is smooth over `[t0, tf]`.
/// `tf <= t0` returns `y0` unchanged.
pub fn rk45<const N: usize>(
    rhs: impl Fn(f64, &[f64; N]) -> [f64; N],
    t0: f64,
    y0: [f64; N],
    tf: f64,
    tol: &Tolerances,
) -> Result<[f64; N], IntegrationError> {
    let mut t = t0;
    let mut y = y0;
    let mut h = tf - t0;
    if h <= 0.0 {
        return Ok(y);
    }

    let mut steps = 0;
    while t < tf {
        steps += 1;
        if steps > MAX_STEPS {
            return Err(IntegrationError::StepLimitExceeded { t, max_steps: MAX_STEPS });
        }

        let last = h >= tf - t;
        let h_step = if last { tf - t } else { h };
        if !last && h_step < MIN_STEP_SCALE * t.abs().max(1.0) {
            return Err(IntegrationError::StepUnderflow { t, h: h_step });
        }

        match attempt_step(&rhs, t, &y, h_step, tol)? {
            Attempt::Accept { y_new, err_norm } => {
                y = y_new;
                t = if last { tf } else { t + h_step };
                let factor = if err_norm < 1e-12 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                h = h_step * factor;
            }
            Attempt::Reject { err_norm } => {
                h = h_step * (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, 1.0);
            }
        }
    }

    Ok(y)
}

fn attempt_step<const N: usize>(
    rhs: &impl Fn(f64, &[f64; N]) -> [f64; N],
    t: f64,
    y: &[f64; N],
    h: f64,
    tol: &Tolerances,
) -> Result<Attempt<N>, IntegrationError> {
    let mut k = [[0.0; N]; 7];
    k[0] = rhs(t, y);
    for stage in 1..7 {
        let mut ys = *y;
        for i in 0..N {
            let mut acc = 0.0;
            for (j, kj) in k.iter().enumerate().take(stage) {
                acc += dp45::A[stage][j] * kj[i];
            }
            ys[i] += h * acc;
        }
        k[stage] = rhs(t + dp45::C[stage] * h, &ys);
    }

    let mut y_new = *y;
    let mut err_sq = 0.0;
    for i in 0..N {
        let mut dy = 0.0;
        let mut err = 0.0;
        for (j, kj) in k.iter().enumerate() {
            dy += dp45::B[j] * kj[i];
            err += dp45::E[j] * kj[i];
        }
        y_new[i] += h * dy;
        let scale = tol.atol + tol.rtol * y[i].abs().max(y_new[i].abs());
        let e = h * err / scale;
        err_sq += e * e;
    }
    let err_norm = (err_sq / N as f64).sqrt();

    if !err_norm.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
        return Err(IntegrationError::NonFiniteDerivative { t });
    }

    if err_norm <= 1.0 {
        Ok(Attempt::Accept { y_new, err_norm })
    } else {
        Ok(Attempt::Reject { err_norm })
    }
}
