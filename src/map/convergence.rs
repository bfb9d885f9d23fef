//! Stopping policy of SOM training.

use crate::map::params::StopCriteria;
use serde::{Deserialize, Serialize};
use statistical as stats;
use std::fmt;

/// Why training stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Mean quantization error fell below the threshold.
    Converged,
    /// Recent errors barely changed and are low enough.
    Stable,
    /// The maximum number of epochs was reached.
    MaxEpochs,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            StopReason::Converged => "converged",
            StopReason::Stable => "stable",
            StopReason::MaxEpochs => "max. epochs",
        };
        f.write_str(str)
    }
}

/// Evaluates the stopping policy after `epoch` completed epochs.
///
/// `history` holds the mean quantization error of every completed epoch, the last one being current.
pub fn check(
    criteria: &StopCriteria,
    history: &[f64],
    epoch: u32,
    max_epochs: u32,
) -> Option<StopReason> {
    let dm = *history.last()?;
    if dm < criteria.dm_threshold {
        return Some(StopReason::Converged);
    }
    if history.len() >= criteria.window && dm < criteria.stable_dm_threshold {
        let recent = &history[history.len() - criteria.window..];
        if stats::standard_deviation(recent, None) < criteria.stability_threshold {
            return Some(StopReason::Stable);
        }
    }
    if epoch >= max_epochs {
        return Some(StopReason::MaxEpochs);
    }
    None
}
