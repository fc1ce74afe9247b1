//! Local outlier factor
//!
//! Unsupervised density-based outlier labelling: a point whose local
//! reachability density is much lower than that of its neighbors gets a
//! large outlier factor. Labels are decided by the `contamination`
//! percentile of the negated factors, so a fit always has an expected share
//! of outliers rather than a fixed score threshold.

use std::cmp::Ordering;

/// Added to mean reachability distances so duplicate points don't divide
/// by zero.
const DENSITY_EPSILON: f64 = 1e-10;

/// Minkowski distance with p = 1
fn manhattan<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Inlier/outlier decision for one point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Inlier,
    Outlier,
}

/// Result of fitting the model to a point set
#[derive(Debug, Clone, PartialEq)]
pub struct LofFit {
    /// Neighbor count actually used (clamped to `n - 1`)
    pub n_neighbors: usize,
    /// Negated outlier factor per point; lower is more anomalous
    pub negative_outlier_factor: Vec<f64>,
    /// Decision offset: points scoring strictly below it are outliers
    pub offset: f64,
    /// Label per point, in input order
    pub labels: Vec<Label>,
}

impl LofFit {
    /// Whether the point at `index` was labelled an outlier
    pub fn is_outlier(&self, index: usize) -> bool {
        self.labels.get(index) == Some(&Label::Outlier)
    }
}

/// Local outlier factor model configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalOutlierFactor {
    /// Requested neighborhood size
    pub n_neighbors: usize,
    /// Expected proportion of outliers, in `(0, 0.5]`
    pub contamination: f64,
}

impl LocalOutlierFactor {
    /// Create a model with Manhattan distance
    pub fn new(n_neighbors: usize, contamination: f64) -> Self {
        Self {
            n_neighbors,
            contamination,
        }
    }

    /// Fit the model on `points` and label each of them.
    ///
    /// Fewer than two points cannot be assessed; they come back as inliers.
    pub fn fit_predict<const D: usize>(&self, points: &[[f64; D]]) -> LofFit {
        let n = points.len();
        if n < 2 {
            return LofFit {
                n_neighbors: 0,
                negative_outlier_factor: vec![-1.0; n],
                offset: -1.0,
                labels: vec![Label::Inlier; n],
            };
        }

        let k = self.n_neighbors.clamp(1, n - 1);
        let neighbors: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|i| self.k_nearest(points, i, k))
            .collect();

        // Distance to the k-th neighbor
        let k_distance: Vec<f64> = neighbors.iter().map(|nb| nb[k - 1].1).collect();

        let lrd: Vec<f64> = neighbors
            .iter()
            .map(|nb| {
                let reach: f64 = nb.iter().map(|&(j, d)| d.max(k_distance[j])).sum();
                1.0 / (reach / k as f64 + DENSITY_EPSILON)
            })
            .collect();

        let negative_outlier_factor: Vec<f64> = neighbors
            .iter()
            .enumerate()
            .map(|(i, nb)| {
                let ratio: f64 = nb.iter().map(|&(j, _)| lrd[j] / lrd[i]).sum();
                -(ratio / k as f64)
            })
            .collect();

        let offset = percentile(&negative_outlier_factor, 100.0 * self.contamination);
        let labels = negative_outlier_factor
            .iter()
            .map(|&score| {
                if score < offset {
                    Label::Outlier
                } else {
                    Label::Inlier
                }
            })
            .collect();

        LofFit {
            n_neighbors: k,
            negative_outlier_factor,
            offset,
            labels,
        }
    }

    /// The `k` nearest other points of `points[i]`, closest first; ties go
    /// to the lower index.
    fn k_nearest<const D: usize>(
        &self,
        points: &[[f64; D]],
        i: usize,
        k: usize,
    ) -> Vec<(usize, f64)> {
        let mut others: Vec<(usize, f64)> = points
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, p)| (j, manhattan(&points[i], p)))
            .collect();
        others.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        others.truncate(k);
        others
    }
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is in `[0, 100]`; an empty slice yields NaN.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
