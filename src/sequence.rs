use crate::error::EngineError;
use itertools::Itertools;

/// Classic rates: 0.1, then multiples of 0.35 up to 10.5.
const CLASSIC_RATES: [f64; 31] = [
    0.1, 0.35, 0.7, 1.05, 1.4, 1.75, 2.1, 2.45, 2.8, 3.15, 3.5, 3.85, 4.2, 4.55, 4.9, 5.25, 5.6,
    5.95, 6.3, 6.65, 7.0, 7.35, 7.7, 8.05, 8.4, 8.75, 9.1, 9.45, 9.8, 10.15, 10.5,
];

/// Generated values are rounded to this many steps per unit.
const STEP_PRECISION: f64 = 1_000_000.0;

/// Upper bound on a generated sequence; nobody can read more rates than
/// this off a cycling display.
pub const MAX_STEPPED_COUNT: usize = 10_000;

/// The ordered, immutable list of rates a session cycles through.
///
/// Always holds at least one finite value; there is no way to mutate it
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSequence {
    values: Vec<f64>,
}

impl RateSequence {
    pub fn new(values: Vec<f64>) -> Result<Self, EngineError> {
        if values.is_empty() {
            return Err(EngineError::InvalidConfig(
                "rate sequence must contain at least one value".to_string(),
            ));
        }
        if let Some((idx, v)) = values.iter().find_position(|v| !v.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "rate at position {idx} is not a finite number ({v})"
            )));
        }
        Ok(Self { values })
    }

    /// The hand-enumerated classic list.
    pub fn classic() -> Self {
        Self {
            values: CLASSIC_RATES.to_vec(),
        }
    }

    /// `count` values starting at `start`, each `step` apart.
    pub fn stepped(start: f64, step: f64, count: usize) -> Result<Self, EngineError> {
        if !start.is_finite() || !step.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "stepped rates need a finite start and step (got {start}, {step})"
            )));
        }
        if count > MAX_STEPPED_COUNT {
            return Err(EngineError::InvalidConfig(format!(
                "stepped rates allow at most {MAX_STEPPED_COUNT} values (got {count})"
            )));
        }
        let values = (0..count)
            .map(|i| ((start + step * i as f64) * STEP_PRECISION).round() / STEP_PRECISION)
            .collect();
        Self::new(values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Formats a rate the way every screen shows it: `$ 4.2`.
pub fn format_rate(rate: f64) -> String {
    format!("$ {rate:.1}")
}
