use serde::{Deserialize, Serialize};
use teaser_core::{Easing, Extrapolate, TeaserError, TeaserResult};

/// One animated value: a frame interval mapped onto an output interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationRange {
    /// Input interval `[a, b]` in frames. Expected `a < b`.
    pub input: [f64; 2],
    /// Output interval `[v0, v1]`.
    pub output: [f64; 2],
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub extrapolate_left: Extrapolate,
    #[serde(default)]
    pub extrapolate_right: Extrapolate,
}

impl AnimationRange {
    /// A linear, clamped range.
    pub fn new(input: [f64; 2], output: [f64; 2]) -> Self {
        Self {
            input,
            output,
            easing: Easing::Linear,
            extrapolate_left: Extrapolate::Clamp,
            extrapolate_right: Extrapolate::Clamp,
        }
    }

    /// Like [`AnimationRange::new`], rejecting empty or non-finite intervals.
    pub fn try_new(input: [f64; 2], output: [f64; 2]) -> TeaserResult<Self> {
        let range = Self::new(input, output);
        if !range.is_valid() {
            return Err(TeaserError::InvalidArgument(format!(
                "animation input range must be finite with a < b, got [{}, {}]",
                input[0], input[1]
            )));
        }
        Ok(range)
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn extrapolate_left(mut self, policy: Extrapolate) -> Self {
        self.extrapolate_left = policy;
        self
    }

    pub fn extrapolate_right(mut self, policy: Extrapolate) -> Self {
        self.extrapolate_right = policy;
        self
    }

    pub fn is_valid(&self) -> bool {
        let [a, b] = self.input;
        a.is_finite() && b.is_finite() && a < b && self.output.iter().all(|v| v.is_finite())
    }

    /// Evaluate at `frame`. See [`interpolate`].
    pub fn value_at(&self, frame: f64) -> f64 {
        interpolate(frame, self)
    }
}

/// Map `frame` through `range`.
///
/// The boundaries are exact: `interpolate(a) == v0` and `interpolate(b) == v1`.
/// Outside `[a, b]` a `Clamp` side holds the boundary value and an `Extend`
/// side keeps evaluating the eased formula. A degenerate interval (`a >= b`)
/// behaves as a step at `b`.
pub fn interpolate(frame: f64, range: &AnimationRange) -> f64 {
    let [a, b] = range.input;
    let [v0, v1] = range.output;

    if b <= a {
        return if frame < b { v0 } else { v1 };
    }

    if frame == a {
        return v0;
    }
    if frame == b {
        return v1;
    }

    let t = (frame - a) / (b - a);

    if frame < a {
        return match range.extrapolate_left {
            Extrapolate::Clamp => v0,
            Extrapolate::Extend => v0 + range.easing.apply_unclamped(t) * (v1 - v0),
        };
    }
    if frame > b {
        return match range.extrapolate_right {
            Extrapolate::Clamp => v1,
            Extrapolate::Extend => v0 + range.easing.apply_unclamped(t) * (v1 - v0),
        };
    }

    v0 + range.easing.apply(t) * (v1 - v0)
}
