//! Self-organizing map (Kohonen network) with hard or soft competition. Core types.

use crate::calc::nn;
use crate::data::DataFrame;
use crate::error::{Result, SomError};
use crate::map::convergence::{self, StopReason};
use crate::map::params::{Competition, SomParams};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Mutable training state. Only reset by creating a new network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    epoch: u32,
    learning_rate: f64,
    history: Vec<f64>,
    best_dm: Option<f64>,
    stop_reason: Option<StopReason>,
}

impl TrainingState {
    fn new(learning_rate: f64) -> Self {
        TrainingState {
            epoch: 0,
            learning_rate,
            history: vec![],
            best_dm: None,
            stop_reason: None,
        }
    }
    /// Number of completed epochs.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
    /// Learning rate for the next epoch.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
    /// Mean quantization error of each completed epoch.
    pub fn history(&self) -> &[f64] {
        &self.history
    }
    /// Lowest mean quantization error so far.
    pub fn best_dm(&self) -> Option<f64> {
        self.best_dm
    }
    /// Why training stopped, if it did.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }
}

/// Progress of a single epoch, handed to training observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// Number of completed epochs, including this one.
    pub epoch: u32,
    /// Mean quantization error of this epoch.
    pub dm: f64,
    /// Lowest mean quantization error so far.
    pub best_dm: f64,
    /// Learning rate after the schedule update.
    pub learning_rate: f64,
    /// Neighborhood radius used in this epoch (soft competition only).
    pub radius: Option<f64>,
    /// Set if training stops after this epoch.
    pub stop: Option<StopReason>,
}

/// Result of simulating a single sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    /// Index of the winning unit.
    pub unit: usize,
    /// Euclidean distance between the sample and the winner's weights.
    pub distance: f64,
    /// Copy of the winner's weights.
    pub weights: Vec<f64>,
}

/// SOM core type.
///
/// Weights are stored with one row per unit, so that row `j` holds the `inputs` weights
/// connecting all inputs to unit `j`.
#[derive(Debug, Clone)]
pub struct Som {
    inputs: usize,
    weights: DataFrame,
    params: SomParams,
    state: TrainingState,
    rng: StdRng,
}

impl Som {
    /// Creates a new SOM for `inputs` inputs, with randomly initialized weights.
    pub fn new(inputs: usize, params: SomParams) -> Result<Self> {
        let units = params.units(inputs);
        params.validate(inputs)?;
        let mut rng = Self::create_rng(&params, 0);

        let range = params.init_range();
        let mut weights = DataFrame::filled(units, inputs, 0.0);
        for row in weights.iter_rows_mut() {
            for v in row.iter_mut() {
                *v = rng.gen_range(-range..range);
            }
        }

        debug!(
            "Created SOM with {} inputs and {} units ({:?} competition)",
            inputs,
            units,
            params.competition()
        );

        Ok(Som {
            inputs,
            weights,
            state: TrainingState::new(params.alpha().start()),
            params,
            rng,
        })
    }

    /// Re-creates a SOM from stored weights and training state.
    pub fn from_parts(weights: DataFrame, params: SomParams, state: TrainingState) -> Result<Self> {
        let inputs = weights.ncols();
        let units = params.units(inputs);
        params.validate(inputs)?;
        if weights.nrows() != units {
            return Err(SomError::Configuration(format!(
                "Expected {} units for {} inputs, found {}",
                units,
                inputs,
                weights.nrows()
            )));
        }
        let rng = Self::create_rng(&params, state.epoch);
        Ok(Som {
            inputs,
            weights,
            params,
            state,
            rng,
        })
    }

    fn create_rng(params: &SomParams, epoch: u32) -> StdRng {
        match params.seed() {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(epoch as u64)),
            None => StdRng::from_entropy(),
        }
    }

    /// Number of inputs (D).
    pub fn inputs(&self) -> usize {
        self.inputs
    }
    /// Number of units (N).
    pub fn units(&self) -> usize {
        self.weights.nrows()
    }
    /// Returns a reference to the units weights data frame.
    pub fn weights(&self) -> &DataFrame {
        &self.weights
    }
    /// Returns a reference to the weights of the given unit.
    pub fn unit_weights(&self, unit: usize) -> &[f64] {
        self.weights.get_row(unit)
    }
    /// Returns a reference to the SOM's parameters.
    pub fn params(&self) -> &SomParams {
        &self.params
    }
    /// Returns a reference to the training state.
    pub fn state(&self) -> &TrainingState {
        &self.state
    }
    /// If training has stopped.
    pub fn is_finished(&self) -> bool {
        self.state.stop_reason.is_some()
    }

    /// Neighborhood radius of the current epoch.
    pub fn radius(&self) -> f64 {
        self.params.radius(self.units()).get(self.state.epoch)
    }

    fn check_sample(&self, sample: &[f64]) -> Result<()> {
        if sample.len() != self.inputs {
            return Err(SomError::DimensionMismatch {
                expected: self.inputs,
                found: sample.len(),
            });
        }
        if let Some(col) = sample.iter().position(|v| !v.is_finite()) {
            return Err(SomError::InvalidData(format!(
                "Non-finite value {} at input {}",
                sample[col], col
            )));
        }
        Ok(())
    }

    fn check_data(&self, data: &DataFrame) -> Result<()> {
        if data.ncols() != self.inputs {
            return Err(SomError::DimensionMismatch {
                expected: self.inputs,
                found: data.ncols(),
            });
        }
        if let Some(idx) = data.data().iter().position(|v| !v.is_finite()) {
            return Err(SomError::InvalidData(format!(
                "Non-finite value {} in row {}, column {}",
                data.data()[idx],
                idx / self.inputs,
                idx % self.inputs
            )));
        }
        Ok(())
    }

    /// Euclidean distance from the sample to every unit's weights.
    pub fn distances(&self, sample: &[f64]) -> Result<Vec<f64>> {
        self.check_sample(sample)?;
        Ok(nn::distances(sample, &self.weights))
    }

    /// Finds the unit closest to the sample. Ties resolve to the lowest index.
    /// # Returns
    /// (unit index, distance)
    pub fn winner(&self, sample: &[f64]) -> Result<(usize, f64)> {
        self.check_sample(sample)?;
        Ok(nn::nearest_neighbor(sample, &self.weights))
    }

    /// Finds the winning unit for an unseen sample.
    pub fn simulate(&self, sample: &[f64]) -> Result<Simulation> {
        let (unit, distance) = self.winner(sample)?;
        Ok(Simulation {
            unit,
            distance,
            weights: self.unit_weights(unit).to_vec(),
        })
    }

    /// Finds the winning unit for each row in `data`.
    /// # Returns
    /// A vector of (unit index, distance).
    pub fn winners(&self, data: &DataFrame) -> Result<Vec<(usize, f64)>> {
        self.check_data(data)?;
        Ok(nn::nearest_neighbors(data, &self.weights))
    }

    /// Mean distance between the rows of `data` and their winning units.
    pub fn quantization_error(&self, data: &DataFrame) -> Result<f64> {
        if data.is_empty() {
            return Err(SomError::EmptyDataset);
        }
        let winners = self.winners(data)?;
        Ok(winners.iter().map(|(_, d)| d).sum::<f64>() / winners.len() as f64)
    }

    /// Trains the SOM for one epoch. Updates learning parameters.
    ///
    /// Returns `None` if training has already stopped.
    pub fn epoch(&mut self, samples: &DataFrame) -> Result<Option<EpochReport>> {
        if samples.is_empty() {
            return Err(SomError::EmptyDataset);
        }
        self.check_data(samples)?;
        if self.is_finished() || self.state.epoch >= self.params.epochs() {
            return Ok(None);
        }

        let mut indices: Vec<_> = (0..samples.nrows()).collect();
        if self.params.shuffle() {
            indices.shuffle(&mut self.rng);
        }

        let radius = match self.params.competition() {
            Competition::Hard => None,
            Competition::Soft => Some(self.radius()),
        };

        let mut dist_sum = 0.0;
        for idx in &indices {
            let sample = samples.get_row(*idx);
            let (winner, dist) = nn::nearest_neighbor(sample, &self.weights);
            self.update(sample, winner, radius);
            dist_sum += dist;
        }
        let dm = dist_sum / indices.len() as f64;

        let state = &mut self.state;
        state.epoch += 1;
        state.learning_rate = self.params.alpha().get(state.epoch);
        state.history.push(dm);
        let best_dm = match state.best_dm {
            Some(best) if best <= dm => best,
            _ => dm,
        };
        state.best_dm = Some(best_dm);
        state.stop_reason = convergence::check(
            self.params.stop(),
            &state.history,
            state.epoch,
            self.params.epochs(),
        );

        debug!(
            "Epoch {}: DM {:.6} (best {:.6}), learning rate {:.6}",
            state.epoch, dm, best_dm, state.learning_rate
        );
        if let Some(reason) = state.stop_reason {
            info!(
                "Training stopped after {} epochs ({}), DM {:.6}",
                state.epoch, reason, dm
            );
        }

        Ok(Some(EpochReport {
            epoch: state.epoch,
            dm,
            best_dm,
            learning_rate: state.learning_rate,
            radius,
            stop: state.stop_reason,
        }))
    }

    /// Trains until the stopping policy triggers.
    pub fn train(&mut self, samples: &DataFrame) -> Result<StopReason> {
        self.train_with(samples, |_| {})
    }

    /// Trains until the stopping policy triggers, calling `observer` after every epoch.
    pub fn train_with<F>(&mut self, samples: &DataFrame, mut observer: F) -> Result<StopReason>
    where
        F: FnMut(&EpochReport),
    {
        while let Some(report) = self.epoch(samples)? {
            observer(&report);
        }
        Ok(self.state.stop_reason.unwrap_or(StopReason::MaxEpochs))
    }

    /// Trains the SOM for a single sample, with the current learning rate.
    /// # Returns
    /// (winning unit, distance before the update)
    pub fn train_sample(&mut self, sample: &[f64]) -> Result<(usize, f64)> {
        let (winner, dist) = self.winner(sample)?;
        let radius = match self.params.competition() {
            Competition::Hard => None,
            Competition::Soft => Some(self.radius()),
        };
        self.update(sample, winner, radius);
        Ok((winner, dist))
    }

    /// Moves the winner (and its neighborhood under soft competition) towards the sample.
    fn update(&mut self, sample: &[f64], winner: usize, radius: Option<f64>) {
        let alpha = self.state.learning_rate;
        let influences = match radius {
            None => vec![(winner, 1.0)],
            Some(radius) => self
                .params
                .neighborhood()
                .influences(winner, &self.weights, radius),
        };
        for (unit, influence) in influences {
            if influence == 0.0 {
                continue;
            }
            let rate = alpha * influence;
            for (w, x) in self.weights.get_row_mut(unit).iter_mut().zip(sample) {
                *w += rate * (*x - *w);
            }
        }
    }
}
