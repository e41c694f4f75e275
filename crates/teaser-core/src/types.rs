use serde::{Deserialize, Serialize};

/// Easing curve reparametrizing normalized time.
///
/// Every variant maps `0 → 0` and `1 → 1` and is monotone on `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    /// `1 - (1 - t)^3`
    EaseOutCubic,
    /// `1 - (1 - t)^4`
    EaseOutQuart,
    /// CSS-style `cubic-bezier(x1, y1, x2, y2)`. `x1` and `x2` must lie in `[0, 1]`.
    Bezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Easing {
    /// The CSS approximation of an ease-out cubic curve.
    pub const BEZIER_EASE_OUT: Easing = Easing::Bezier {
        x1: 0.33,
        y1: 1.0,
        x2: 0.68,
        y2: 1.0,
    };

    /// Apply the easing function to a normalized time value t, clamped to [0, 1].
    pub fn apply(&self, t: f64) -> f64 {
        self.apply_unclamped(t.clamp(0.0, 1.0))
    }

    /// Apply the curve without clamping `t`, used by `Extrapolate::Extend`.
    ///
    /// Polynomial curves continue their formula outside `[0, 1]`; Bézier curves
    /// clamp their parameter because the parametric form is undefined there.
    pub fn apply_unclamped(&self, t: f64) -> f64 {
        match *self {
            Easing::Linear => t,
            Easing::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::EaseOutQuart => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv * inv
            }
            Easing::Bezier { x1, y1, x2, y2 } => bezier(t.clamp(0.0, 1.0), x1, y1, x2, y2),
        }
    }
}

fn bezier_coord(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_slope(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Solve `x(s) = t` for the curve parameter, then return `y(s)`.
fn bezier(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let mut s = t;
    for _ in 0..8 {
        let err = bezier_coord(s, x1, x2) - t;
        if err.abs() < 1e-7 {
            return bezier_coord(s, y1, y2);
        }
        let slope = bezier_slope(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    // Newton stalled on a flat segment; bisection always converges for x1, x2 in [0, 1].
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    s = t;
    for _ in 0..64 {
        let x = bezier_coord(s, x1, x2);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) * 0.5;
    }
    bezier_coord(s, y1, y2)
}

/// Policy for values requested outside an animation's input interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Extrapolate {
    /// Hold the boundary value.
    #[default]
    Clamp,
    /// Continue the (eased) formula past the boundary.
    Extend,
}
