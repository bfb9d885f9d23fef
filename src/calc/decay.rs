//! Decay schedules for learning parameters (learning rate, neighborhood radius).
//!
//! All schedules take the number of completed epochs `t` and return the start value at `t = 0`.
//! None of them ever increases with `t`.

use crate::error::{Result, SomError};
use crate::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default rate of inverse-time decay.
pub const DEFAULT_INVERSE_RATE: f64 = 0.005;
/// Default rate of exponential decay.
pub const DEFAULT_EXP_RATE: f64 = 0.05;

/// Decay functions for learning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DecayFunction {
    /// `start / (1 + c * t)`
    InverseTime(f64),
    /// `start * exp(-c * t)`
    Exponential(f64),
    /// `start / (1 + t)`
    Reciprocal,
    /// `start / sqrt(1 + t)`
    InverseSqrt,
}

impl DecayFunction {
    fn rate(&self) -> Option<f64> {
        match self {
            DecayFunction::InverseTime(c) | DecayFunction::Exponential(c) => Some(*c),
            DecayFunction::Reciprocal | DecayFunction::InverseSqrt => None,
        }
    }
}

impl FromStr for DecayFunction {
    type Err = ParseEnumError;
    /// Parse a string to a `DecayFunction`.
    ///
    /// Accepts `"inverse[:c]" | "exp[:c]" | "reciprocal" | "sqrt"`.
    fn from_str(str: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = str.splitn(2, ':');
        let name = parts.next().unwrap_or("");
        let rate = match parts.next() {
            Some(r) => Some(r.parse::<f64>().map_err(|_| {
                ParseEnumError(format!("Unable to parse decay rate {} in {}", r, str))
            })?),
            None => None,
        };
        match (name, rate) {
            ("inverse", r) => Ok(DecayFunction::InverseTime(
                r.unwrap_or(DEFAULT_INVERSE_RATE),
            )),
            ("exp", r) => Ok(DecayFunction::Exponential(r.unwrap_or(DEFAULT_EXP_RATE))),
            ("reciprocal", None) => Ok(DecayFunction::Reciprocal),
            ("sqrt", None) => Ok(DecayFunction::InverseSqrt),
            _ => Err(ParseEnumError(format!(
                "Not a decay function: {}. Must be one of (inverse[:c]|exp[:c]|reciprocal|sqrt)",
                str
            ))),
        }
    }
}

/// Decay parameters for learning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayParam {
    start: f64,
    function: DecayFunction,
}

impl DecayParam {
    /// Creates a decaying learning parameter from its start value and decay function.
    pub fn new(start: f64, function: DecayFunction) -> Self {
        DecayParam { start, function }
    }
    /// Creates an inverse-time decaying learning parameter.
    pub fn inverse_time(start: f64, rate: f64) -> Self {
        Self::new(start, DecayFunction::InverseTime(rate))
    }
    /// Creates an exponentially decaying learning parameter.
    pub fn exp(start: f64, rate: f64) -> Self {
        Self::new(start, DecayFunction::Exponential(rate))
    }
    /// Creates a reciprocally decaying learning parameter.
    pub fn reciprocal(start: f64) -> Self {
        Self::new(start, DecayFunction::Reciprocal)
    }
    /// Creates a learning parameter decaying with the inverse square root of the epoch.
    pub fn inverse_sqrt(start: f64) -> Self {
        Self::new(start, DecayFunction::InverseSqrt)
    }

    /// The value at epoch 0.
    pub fn start(&self) -> f64 {
        self.start
    }
    /// The decay function.
    pub fn function(&self) -> DecayFunction {
        self.function
    }

    /// Get the parameter's value after the given number of completed epochs.
    pub fn get(&self, epoch: u32) -> f64 {
        let t = epoch as f64;
        match self.function {
            DecayFunction::InverseTime(c) => self.start / (1.0 + c * t),
            DecayFunction::Exponential(c) => self.start * (-c * t).exp(),
            DecayFunction::Reciprocal => self.start / (1.0 + t),
            DecayFunction::InverseSqrt => self.start / (1.0 + t).sqrt(),
        }
    }

    /// Checks for a finite, positive start value not above `max`, and a finite, non-negative rate.
    pub fn validate(&self, name: &str, max: f64) -> Result<()> {
        if !self.start.is_finite() || self.start <= 0.0 || self.start > max {
            return Err(SomError::Configuration(format!(
                "{} must be in (0, {}], got {}",
                name, max, self.start
            )));
        }
        if let Some(rate) = self.function.rate() {
            if !rate.is_finite() || rate < 0.0 {
                return Err(SomError::Configuration(format!(
                    "Decay rate of {} must be finite and non-negative, got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::calc::decay::{DecayFunction, DecayParam};

    fn all() -> Vec<DecayParam> {
        vec![
            DecayParam::inverse_time(0.5, 0.005),
            DecayParam::exp(0.5, 0.05),
            DecayParam::reciprocal(0.5),
            DecayParam::inverse_sqrt(0.5),
        ]
    }

    #[test]
    fn starts_at_start_value() {
        for decay in all() {
            assert!((decay.get(0) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn never_increases() {
        for decay in all() {
            let mut prev = decay.get(0);
            for epoch in 1..2000 {
                let v = decay.get(epoch);
                assert!(v <= prev, "{:?} increased at epoch {}", decay, epoch);
                assert!(v > 0.0);
                prev = v;
            }
        }
    }

    #[test]
    fn inverse_time_decay() {
        let decay = DecayParam::inverse_time(0.1, 0.005);
        assert!((decay.get(200) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn exponential_decay() {
        let decay = DecayParam::exp(1.0, 0.01);
        assert!((decay.get(100) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn reciprocal_decay() {
        let decay = DecayParam::reciprocal(1.0);
        assert!((decay.get(3) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn validation() {
        assert!(DecayParam::inverse_time(0.1, 0.005).validate("alpha", 1.0).is_ok());
        assert!(DecayParam::inverse_time(0.0, 0.005).validate("alpha", 1.0).is_err());
        assert!(DecayParam::inverse_time(1.5, 0.005).validate("alpha", 1.0).is_err());
        assert!(DecayParam::exp(0.1, -1.0).validate("alpha", 1.0).is_err());
        assert!(DecayParam::exp(0.1, std::f64::NAN).validate("alpha", 1.0).is_err());
    }

    #[test]
    fn parse() {
        assert_eq!(
            "inverse:0.01".parse::<DecayFunction>().unwrap(),
            DecayFunction::InverseTime(0.01)
        );
        assert_eq!(
            "exp".parse::<DecayFunction>().unwrap(),
            DecayFunction::Exponential(0.05)
        );
        assert_eq!(
            "reciprocal".parse::<DecayFunction>().unwrap(),
            DecayFunction::Reciprocal
        );
        assert_eq!(
            "sqrt".parse::<DecayFunction>().unwrap(),
            DecayFunction::InverseSqrt
        );
        assert!("lin".parse::<DecayFunction>().is_err());
        assert!("exp:fast".parse::<DecayFunction>().is_err());
        assert!("sqrt:2".parse::<DecayFunction>().is_err());
    }
}
