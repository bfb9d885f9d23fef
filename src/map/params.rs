//! SOM training parameters. Immutable for a training run.

use crate::calc::decay::{DecayFunction, DecayParam, DEFAULT_EXP_RATE, DEFAULT_INVERSE_RATE};
use crate::calc::neighborhood::Neighborhood;
use crate::error::{Result, SomError};
use crate::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Minimum number of units of a network.
pub const MIN_UNITS: usize = 4;
/// Default number of units per input.
pub const DEFAULT_MULTIPLIER: usize = 2;
/// Default start radius of the weight-space neighborhood.
pub const DEFAULT_WEIGHT_RADIUS: f64 = 0.2;
/// Largest half-width of the initialization range. The full range must stay finite.
pub const MAX_INIT_RANGE: f64 = std::f64::MAX / 2.0;

/// Competition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Competition {
    /// Only the winner is updated.
    Hard,
    /// The winner and its neighborhood are updated.
    Soft,
}

impl FromStr for Competition {
    type Err = ParseEnumError;
    /// Parse a string to a `Competition`.
    ///
    /// Accepts `"hard" | "soft"`, as well as `"dura" | "blanda"`.
    fn from_str(str: &str) -> std::result::Result<Self, Self::Err> {
        match str {
            "hard" | "dura" => Ok(Competition::Hard),
            "soft" | "blanda" => Ok(Competition::Soft),
            _ => Err(ParseEnumError(format!(
                "Not a competition mode: {}. Must be one of (hard|soft)",
                str
            ))),
        }
    }
}

fn default_radius_decay(neighborhood: Neighborhood) -> DecayFunction {
    match neighborhood {
        Neighborhood::Gauss => DecayFunction::Exponential(DEFAULT_EXP_RATE),
        Neighborhood::WeightSpace => DecayFunction::InverseSqrt,
    }
}

/// Stopping policy, evaluated once per epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopCriteria {
    /// Stop as soon as the mean quantization error falls below this value.
    pub dm_threshold: f64,
    /// Number of recent epochs checked for stability.
    pub window: usize,
    /// Maximum standard deviation of the recent errors to count as stable.
    pub stability_threshold: f64,
    /// Upper bound for the error of a stable run.
    pub stable_dm_threshold: f64,
}

impl Default for StopCriteria {
    fn default() -> Self {
        StopCriteria {
            dm_threshold: 0.1,
            window: 10,
            stability_threshold: 1e-3,
            stable_dm_threshold: 0.3,
        }
    }
}

impl StopCriteria {
    fn validate(&self) -> Result<()> {
        for (name, v) in &[
            ("dm_threshold", self.dm_threshold),
            ("stability_threshold", self.stability_threshold),
            ("stable_dm_threshold", self.stable_dm_threshold),
        ] {
            if !v.is_finite() || *v < 0.0 {
                return Err(SomError::Configuration(format!(
                    "{} must be finite and non-negative, got {}",
                    name, v
                )));
            }
        }
        if self.window < 2 {
            return Err(SomError::Configuration(format!(
                "Stability window must hold at least 2 epochs, got {}",
                self.window
            )));
        }
        Ok(())
    }
}

/// SOM training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SomParams {
    epochs: u32,
    multiplier: usize,
    competition: Competition,
    neighborhood: Neighborhood,
    alpha: DecayParam,
    radius_start: Option<f64>,
    radius_decay: DecayFunction,
    init_range: f64,
    shuffle: bool,
    seed: Option<u64>,
    stop: StopCriteria,
}

impl SomParams {
    /// Creates parameters for hard competition: only the winner learns.
    pub fn hard(epochs: u32, alpha: DecayParam) -> Self {
        SomParams {
            epochs,
            multiplier: DEFAULT_MULTIPLIER,
            competition: Competition::Hard,
            neighborhood: Neighborhood::Gauss,
            alpha,
            radius_start: None,
            radius_decay: default_radius_decay(Neighborhood::Gauss),
            init_range: 1.0,
            shuffle: true,
            seed: None,
            stop: StopCriteria::default(),
        }
    }

    /// Creates parameters for soft competition with the given neighborhood and radius schedule.
    pub fn soft(
        epochs: u32,
        alpha: DecayParam,
        neighborhood: Neighborhood,
        radius: DecayParam,
    ) -> Self {
        Self::soft_default(epochs, alpha, neighborhood).with_radius(radius)
    }

    /// Creates parameters for soft competition with the neighborhood's default radius schedule.
    ///
    /// The Gaussian radius starts at half the number of units (at least 1) and decays
    /// exponentially. The weight-space radius starts at 0.2 and decays with `1 / sqrt(1 + t)`.
    pub fn soft_default(epochs: u32, alpha: DecayParam, neighborhood: Neighborhood) -> Self {
        SomParams {
            competition: Competition::Soft,
            neighborhood,
            radius_decay: default_radius_decay(neighborhood),
            ..Self::hard(epochs, alpha)
        }
    }

    /// Default parameters for the given competition mode and initial learning rate.
    ///
    /// Learning rate decays in inverse time. Soft competition uses a Gaussian neighborhood.
    pub fn with_defaults(competition: Competition, epochs: u32, alpha: f64) -> Self {
        let alpha = DecayParam::inverse_time(alpha, DEFAULT_INVERSE_RATE);
        match competition {
            Competition::Hard => Self::hard(epochs, alpha),
            Competition::Soft => Self::soft_default(epochs, alpha, Neighborhood::Gauss),
        }
    }

    /// Sets the number of units per input.
    pub fn with_multiplier(mut self, multiplier: usize) -> Self {
        self.multiplier = multiplier;
        self
    }
    /// Sets the half-width of the symmetric range for random weight initialization.
    pub fn with_init_range(mut self, init_range: f64) -> Self {
        self.init_range = init_range;
        self
    }
    /// Enables or disables shuffling of samples in each epoch.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
    /// Sets a seed for weight initialization and shuffling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    /// Sets the stopping policy.
    pub fn with_stop(mut self, stop: StopCriteria) -> Self {
        self.stop = stop;
        self
    }
    /// Sets the neighborhood radius schedule.
    pub fn with_radius(mut self, radius: DecayParam) -> Self {
        self.radius_start = Some(radius.start());
        self.radius_decay = radius.function();
        self
    }
    /// Sets the start neighborhood radius, keeping the decay function.
    pub fn with_radius_start(mut self, start: f64) -> Self {
        self.radius_start = Some(start);
        self
    }
    /// Sets the neighborhood radius decay function, keeping the start value.
    pub fn with_radius_decay(mut self, function: DecayFunction) -> Self {
        self.radius_decay = function;
        self
    }

    /// Maximum number of training epochs.
    pub fn epochs(&self) -> u32 {
        self.epochs
    }
    /// Number of units per input.
    pub fn multiplier(&self) -> usize {
        self.multiplier
    }
    pub fn competition(&self) -> Competition {
        self.competition
    }
    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }
    /// Learning rate schedule.
    pub fn alpha(&self) -> &DecayParam {
        &self.alpha
    }
    /// Start neighborhood radius, `None` for the neighborhood's default.
    pub fn radius_start(&self) -> Option<f64> {
        self.radius_start
    }
    /// Neighborhood radius decay function.
    pub fn radius_decay(&self) -> DecayFunction {
        self.radius_decay
    }
    pub fn init_range(&self) -> f64 {
        self.init_range
    }
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
    pub fn stop(&self) -> &StopCriteria {
        &self.stop
    }

    /// Number of units for `inputs` inputs: `max(4, inputs * multiplier)`.
    pub fn units(&self, inputs: usize) -> usize {
        std::cmp::max(MIN_UNITS, inputs.saturating_mul(self.multiplier))
    }

    /// Neighborhood radius schedule for a network with `units` units.
    pub fn radius(&self, units: usize) -> DecayParam {
        let start = self.radius_start.unwrap_or_else(|| match self.neighborhood {
            Neighborhood::Gauss => (units as f64 / 2.0).max(1.0),
            Neighborhood::WeightSpace => DEFAULT_WEIGHT_RADIUS,
        });
        DecayParam::new(start, self.radius_decay)
    }

    /// Checks all parameters for a network with `inputs` inputs.
    pub fn validate(&self, inputs: usize) -> Result<()> {
        if inputs == 0 {
            return Err(SomError::Configuration(
                "Number of inputs must be positive".to_string(),
            ));
        }
        if self.multiplier == 0 {
            return Err(SomError::Configuration(
                "Unit multiplier must be at least 1".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(SomError::Configuration(
                "Number of epochs must be positive".to_string(),
            ));
        }
        if !self.init_range.is_finite()
            || self.init_range <= 0.0
            || self.init_range > MAX_INIT_RANGE
        {
            return Err(SomError::Configuration(format!(
                "Initialization range must be in (0, {}], got {}",
                MAX_INIT_RANGE, self.init_range
            )));
        }
        self.alpha.validate("Learning rate", 1.0)?;
        if self.competition == Competition::Soft {
            self.radius(self.units(inputs))
                .validate("Neighborhood radius", std::f64::MAX)?;
        }
        self.stop.validate()
    }
}

#[cfg(test)]
mod test {
    use crate::calc::decay::{DecayFunction, DecayParam, DEFAULT_EXP_RATE};
    use crate::calc::neighborhood::Neighborhood;
    use crate::map::params::{Competition, SomParams, StopCriteria, MAX_INIT_RANGE};
    use crate::map::som::Som;
    use crate::SomError;

    #[test]
    fn unit_count() {
        let params = SomParams::hard(10, DecayParam::reciprocal(0.5));
        assert_eq!(params.units(1), 4);
        assert_eq!(params.units(2), 4);
        assert_eq!(params.units(4), 8);
        assert_eq!(params.with_multiplier(6).units(30), 180);
    }

    #[test]
    fn units_never_below_inputs() {
        for k in 1..=8 {
            let params = SomParams::hard(10, DecayParam::reciprocal(0.5)).with_multiplier(k);
            for d in 1..64 {
                let n = params.units(d);
                assert!(n >= 4);
                assert!(n >= d);
            }
        }
    }

    #[test]
    fn invalid_params() {
        let ok = SomParams::hard(10, DecayParam::inverse_time(0.1, 0.005));
        assert!(ok.validate(3).is_ok());
        assert!(ok.validate(0).is_err());
        assert!(ok.clone().with_multiplier(0).validate(3).is_err());
        assert!(ok.clone().with_init_range(0.0).validate(3).is_err());
        assert!(SomParams::hard(0, DecayParam::reciprocal(0.1))
            .validate(3)
            .is_err());
        assert!(SomParams::hard(10, DecayParam::reciprocal(2.0))
            .validate(3)
            .is_err());
        let stop = StopCriteria {
            window: 1,
            ..StopCriteria::default()
        };
        assert!(ok.with_stop(stop).validate(3).is_err());
    }

    #[test]
    fn default_radius() {
        let params = SomParams::with_defaults(Competition::Soft, 10, 0.1);
        assert_eq!(params.neighborhood(), Neighborhood::Gauss);
        assert_eq!(params.radius_start(), None);
        assert_eq!(params.radius(12).start(), 6.0);
        assert_eq!(params.radius(1).start(), 1.0);
        assert_eq!(
            params.radius(12).function(),
            DecayFunction::Exponential(DEFAULT_EXP_RATE)
        );

        let params = SomParams::soft_default(
            10,
            DecayParam::reciprocal(0.1),
            Neighborhood::WeightSpace,
        );
        assert_eq!(params.radius(12).start(), 0.2);
        assert_eq!(params.radius(12).function(), DecayFunction::InverseSqrt);

        let params = params.with_radius_start(0.7);
        assert_eq!(params.radius(12), DecayParam::inverse_sqrt(0.7));
    }

    #[test]
    fn zero_radius_is_invalid() {
        let params = SomParams::soft(
            10,
            DecayParam::reciprocal(0.1),
            Neighborhood::Gauss,
            DecayParam::exp(0.0, 0.05),
        );
        assert!(matches!(
            params.validate(3),
            Err(SomError::Configuration(_))
        ));
        assert!(matches!(
            Som::new(3, params),
            Err(SomError::Configuration(_))
        ));
    }

    #[test]
    fn init_range_limit() {
        let params = SomParams::hard(10, DecayParam::reciprocal(0.5)).with_seed(2);
        for range in &[1e308, std::f64::MAX, std::f64::INFINITY, -1.0] {
            let params = params.clone().with_init_range(*range);
            assert!(params.validate(3).is_err());
            assert!(matches!(
                Som::new(3, params),
                Err(SomError::Configuration(_))
            ));
        }
        let params = params.with_init_range(MAX_INIT_RANGE);
        assert!(params.validate(3).is_ok());
        let som = Som::new(3, params).unwrap();
        assert!(som.weights().data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn parse_competition() {
        assert_eq!("hard".parse::<Competition>().unwrap(), Competition::Hard);
        assert_eq!("blanda".parse::<Competition>().unwrap(), Competition::Soft);
        assert!("medium".parse::<Competition>().is_err());
    }
}
