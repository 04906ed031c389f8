//! Volume scale conversion and per-sample smoothing.

/// ln(100): the logarithmic scale spans 40 dB.
const LOG_100: f32 = 4.605_170_2;

pub const MAX_UI_LEVEL: u8 = 100;

/// Map a 0..=100 slider level to linear device gain along a perceptual log curve.
pub fn ui_level_to_linear(level: u8) -> f32 {
    let v = level.min(MAX_UI_LEVEL) as f32 / MAX_UI_LEVEL as f32;
    if v >= 1.0 {
        1.0
    } else {
        (-(1.0 - v).ln() / LOG_100).clamp(0.0, 1.0)
    }
}

/// A value that glides toward its target at a bounded rate.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedParameter {
    current: f32,
    target: f32,
    /// Units per second.
    rate: f32,
}

impl SmoothedParameter {
    pub fn new(current: f32, rate: f32) -> Self {
        Self {
            current,
            target: current,
            rate,
        }
    }

    pub fn get(&self) -> f32 {
        self.current
    }

    pub fn set(&mut self, target: f32) {
        self.target = target;
    }

    pub fn advance(&mut self, dt: f32) {
        let step = self.rate * dt;
        let diff = self.target - self.current;
        if !step.is_finite() || diff.abs() <= step {
            self.current = self.target;
        } else {
            self.current += step.copysign(diff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_curve_endpoints() {
        assert_eq!(ui_level_to_linear(0), 0.0);
        assert_eq!(ui_level_to_linear(100), 1.0);
        assert_eq!(ui_level_to_linear(250), 1.0);
    }

    #[test]
    fn log_curve_is_increasing_and_quiet_in_the_middle() {
        let mut previous = -1.0;
        for level in 0..=98 {
            let v = ui_level_to_linear(level);
            assert!(v > previous, "{level}");
            previous = v;
        }
        // The curve reaches full scale at 99.
        assert!(ui_level_to_linear(98) < 1.0);
        assert!(ui_level_to_linear(99) >= previous);
        let half = ui_level_to_linear(50);
        assert!((half - 0.150_515).abs() < 1e-4, "{half}");
    }

    #[test]
    fn smoothing_ramps_without_overshoot() {
        let mut p = SmoothedParameter::new(0.0, 10.0);
        p.set(1.0);
        p.advance(0.05);
        assert!((p.get() - 0.5).abs() < 1e-6);
        p.advance(0.05);
        assert_eq!(p.get(), 1.0);
        p.advance(1.0);
        assert_eq!(p.get(), 1.0);

        p.set(0.25);
        p.advance(0.01);
        assert!((p.get() - 0.9).abs() < 1e-6);
        p.advance(10.0);
        assert_eq!(p.get(), 0.25);
    }
}
