//! Nearest-neighbor search.

use crate::calc::metric::Metric;
use crate::data::DataFrame;

const EUCLIDEAN: Metric = Metric::Euclidean;

/// Euclidean distances from `from` to every row of `to`.
pub fn distances(from: &[f64], to: &DataFrame) -> Vec<f64> {
    assert_eq!(from.len(), to.ncols());
    to.iter_rows()
        .map(|row_to| EUCLIDEAN.distance(from, row_to))
        .collect()
}

/// Nearest-neighbor by Euclidean distance. Ties resolve to the lowest row index.
/// The distance is always the true distance to the returned row, `NaN` included.
/// # Returns
/// (index, distance)
pub fn nearest_neighbor(from: &[f64], to: &DataFrame) -> (usize, f64) {
    assert_eq!(from.len(), to.ncols());

    let mut min_dist = std::f64::INFINITY;
    let mut min_idx: usize = 0;
    for (idx_to, row_to) in to.iter_rows().enumerate() {
        let dist = EUCLIDEAN.distance(from, row_to);
        if idx_to == 0 || dist < min_dist {
            min_dist = dist;
            min_idx = idx_to
        }
    }
    (min_idx, min_dist)
}

/// Nearest-neighbors for multiple starting points, by Euclidean distance.
/// # Returns
/// Vec(index, distance)
pub fn nearest_neighbors(from: &DataFrame, to: &DataFrame) -> Vec<(usize, f64)> {
    assert_eq!(from.ncols(), to.ncols());

    from.iter_rows()
        .map(|row_from| nearest_neighbor(row_from, to))
        .collect()
}

#[cfg(test)]
mod test {
    use crate::calc::nn;
    use crate::data::DataFrame;
    use rand::Rng;

    #[test]
    fn nn_simple() {
        let mut rng = rand::thread_rng();
        let from = [0.0, 0.0, 0.0];
        let mut to = DataFrame::empty(&["A", "B", "C"]);

        for _i in 0..100 {
            to.push_row(&[
                rng.gen_range(0.5..1.0),
                rng.gen_range(0.5..1.0),
                rng.gen_range(0.5..1.0),
            ]);
        }
        to.push_row(&[0.0, 0.0, 0.2]);

        let (idx, dist) = nn::nearest_neighbor(&from, &to);
        assert_eq!(idx, 100);
        assert!((dist - 0.2).abs() < 1e-12);
    }

    #[test]
    fn nn_ties_prefer_lowest_index() {
        let to = DataFrame::from_rows(&[
            vec![2.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
        ]);
        let (idx, _) = nn::nearest_neighbor(&[0.0, 0.0], &to);
        assert_eq!(idx, 1);
        assert_eq!(nn::distances(&[0.0, 0.0], &to), vec![2.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn nn_never_invents_distance() {
        let to = DataFrame::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
        let (idx, dist) = nn::nearest_neighbor(&[std::f64::NAN, 0.0], &to);
        assert_eq!(idx, 0);
        assert!(dist.is_nan());

        let (idx, dist) = nn::nearest_neighbor(&[std::f64::INFINITY, 0.0], &to);
        assert_eq!(idx, 0);
        assert!(dist.is_infinite());
    }

    #[test]
    fn distances_length() {
        let to = DataFrame::filled(8, 3, 0.0);
        let dist = nn::distances(&[3.0, 4.0, 0.0], &to);
        assert_eq!(dist.len(), 8);
        assert!(dist.iter().all(|d| (d - 5.0).abs() < 1e-12));
    }

    #[test]
    fn nns_simple() {
        let mut rng = rand::thread_rng();
        let mut from = DataFrame::empty(&["A", "B", "C"]);
        let mut to = DataFrame::empty(&["A", "B", "C"]);

        for _i in 0..100 {
            from.push_row(&[
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ]);
        }
        for _i in 0..100 {
            to.push_row(&[
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ]);
        }

        let result = nn::nearest_neighbors(&from, &to);
        assert_eq!(result.len(), from.nrows());
        for (row, (idx, dist)) in from.iter_rows().zip(&result) {
            assert_eq!(nn::nearest_neighbor(row, &to), (*idx, *dist));
        }
    }
}
