//! Distance metrics.

/// Metrics between a sample and a unit's weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    SqEuclidean,
    Euclidean,
}

impl Metric {
    pub fn distance(&self, from: &[f64], to: &[f64]) -> f64 {
        assert_eq!(from.len(), to.len());
        let sum: f64 = from.iter().zip(to).map(|(a, b)| (*a - *b).powi(2)).sum();
        match self {
            Metric::SqEuclidean => sum,
            Metric::Euclidean => sum.sqrt(),
        }
    }
}
