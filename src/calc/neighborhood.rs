//! Neighborhood kernels for soft competition.

use crate::calc::metric::Metric;
use crate::data::DataFrame;
use crate::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::cmp;
use std::str::FromStr;

/// Neighborhood of the winning unit that is updated under soft competition.
///
/// Influence is 1 at the winner and never increases with distance from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Neighborhood {
    /// Units with `|i - winner| <= radius` in index space,
    /// weighted by `exp(-|i - winner|² / (2 radius²))`.
    Gauss,
    /// Units closer than `radius` to the winner in weight space, all with full influence.
    WeightSpace,
}

impl Neighborhood {
    /// Collects `(unit, influence)` for all units with non-zero influence.
    ///
    /// Only reads `weights`, so all influences of a sample are based on the same snapshot.
    pub fn influences(&self, winner: usize, weights: &DataFrame, radius: f64) -> Vec<(usize, f64)> {
        let units = weights.nrows();
        match self {
            Neighborhood::Gauss => {
                let reach = radius.floor().max(0.0) as usize;
                let lower = winner.saturating_sub(reach);
                let upper = cmp::min(units - 1, winner.saturating_add(reach));
                (lower..=upper)
                    .map(|i| {
                        let dist = if i > winner { i - winner } else { winner - i };
                        (i, gauss(dist as f64, radius))
                    })
                    .collect()
            }
            Neighborhood::WeightSpace => {
                let center = weights.get_row(winner);
                let radius_sq = radius.powi(2);
                weights
                    .iter_rows()
                    .enumerate()
                    .filter(|(i, row)| {
                        *i == winner || Metric::SqEuclidean.distance(center, row) < radius_sq
                    })
                    .map(|(i, _)| (i, 1.0))
                    .collect()
            }
        }
    }
}

/// Gaussian kernel, 1.0 at distance 0.
pub fn gauss(distance: f64, radius: f64) -> f64 {
    if distance == 0.0 {
        1.0
    } else {
        (-distance.powi(2) / (2.0 * radius.powi(2))).exp()
    }
}

impl FromStr for Neighborhood {
    type Err = ParseEnumError;
    /// Parse a string to a `Neighborhood`.
    ///
    /// Accepts `"gauss" | "weight"`.
    fn from_str(str: &str) -> Result<Self, Self::Err> {
        match str {
            "gauss" => Ok(Neighborhood::Gauss),
            "weight" => Ok(Neighborhood::WeightSpace),
            _ => Err(ParseEnumError(format!(
                "Not a neighborhood: {}. Must be one of (gauss|weight)",
                str
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::calc::neighborhood::{gauss, Neighborhood};
    use crate::data::DataFrame;

    #[test]
    fn gauss_kernel() {
        assert_eq!(gauss(0.0, 1.0), 1.0);
        assert!(gauss(3.0, 1.0) < 0.012);
        assert!(gauss(1.0, 2.0) > gauss(2.0, 2.0));
    }

    #[test]
    fn gauss_within_radius() {
        let weights = DataFrame::filled(10, 2, 0.0);
        let infl = Neighborhood::Gauss.influences(4, &weights, 2.5);
        let units: Vec<_> = infl.iter().map(|(i, _)| *i).collect();
        assert_eq!(units, vec![2, 3, 4, 5, 6]);
        assert_eq!(infl[2], (4, 1.0));
        assert!(infl[1].1 > infl[0].1);
        assert!((infl[1].1 - infl[3].1).abs() < 1e-12);
    }

    #[test]
    fn gauss_clipped_at_edges() {
        let weights = DataFrame::filled(4, 2, 0.0);
        let infl = Neighborhood::Gauss.influences(0, &weights, 10.0);
        assert_eq!(infl.len(), 4);
        let infl = Neighborhood::Gauss.influences(3, &weights, 0.5);
        assert_eq!(infl, vec![(3, 1.0)]);
    }

    #[test]
    fn weight_space_threshold() {
        let weights = DataFrame::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.15],
        ]);
        let infl = Neighborhood::WeightSpace.influences(0, &weights, 0.2);
        assert_eq!(infl, vec![(0, 1.0), (1, 1.0), (3, 1.0)]);
        let infl = Neighborhood::WeightSpace.influences(2, &weights, 0.2);
        assert_eq!(infl, vec![(2, 1.0)]);
    }

    #[test]
    fn parse() {
        assert_eq!("gauss".parse::<Neighborhood>().unwrap(), Neighborhood::Gauss);
        assert_eq!(
            "weight".parse::<Neighborhood>().unwrap(),
            Neighborhood::WeightSpace
        );
        assert!("bubble".parse::<Neighborhood>().is_err());
    }
}
