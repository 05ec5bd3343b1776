//! Null model fitted on shuffled statistics.
//!
//! Over-dispersed samples get a negative binomial fitted by the method of
//! moments. Samples with `0 < var <= mean` fall back to a Poisson of the same
//! mean, the limit of the negative binomial as `r` grows.
use serde::Serialize;
use statrs::distribution::{DiscreteCDF, NegativeBinomial, Poisson};

use crate::accumulator::SufficientStats;

/// P-value reported when no null model could be fitted.
pub const PVALUE_NOT_COMPUTABLE: f64 = -1.0;

/// P-value reported when the tail probability underflows to zero.
pub const PVALUE_FLOOR: f64 = 1e-320;

/// Maximum number of bins of the goodness of fit table.
const MAX_FIT_BINS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum NullModel {
    /// NB(r, p) with `r` successes and success probability `p`, so that
    /// `mean = r (1 - p) / p`.
    NegativeBinomial { r: f64, p: f64 },
    Poisson { lambda: f64 },
}

enum Distribution {
    NegativeBinomial(NegativeBinomial),
    Poisson(Poisson),
}

impl Distribution {
    fn cdf(&self, x: u64) -> f64 {
        match self {
            Distribution::NegativeBinomial(dist) => dist.cdf(x),
            Distribution::Poisson(dist) => dist.cdf(x),
        }
    }

    fn sf(&self, x: u64) -> f64 {
        match self {
            Distribution::NegativeBinomial(dist) => dist.sf(x),
            Distribution::Poisson(dist) => dist.sf(x),
        }
    }
}

impl NullModel {
    ///
    /// Method of moments fit. `None` when the mean is zero or the samples
    /// are constant.
    ///
    pub fn from_moments(mean: f64, variance: f64) -> Option<Self> {
        if !(mean > 0.0) || !(variance > 0.0) || !mean.is_finite() || !variance.is_finite() {
            return None;
        }
        if variance > mean {
            Some(NullModel::NegativeBinomial {
                r: mean * mean / (variance - mean),
                p: mean / variance,
            })
        } else {
            Some(NullModel::Poisson { lambda: mean })
        }
    }

    pub fn from_stats(stats: &SufficientStats) -> Option<Self> {
        NullModel::from_moments(stats.mean(), stats.variance())
    }

    fn distribution(&self) -> Option<Distribution> {
        match *self {
            NullModel::NegativeBinomial { r, p } => NegativeBinomial::new(r, p)
                .ok()
                .map(Distribution::NegativeBinomial),
            NullModel::Poisson { lambda } => Poisson::new(lambda).ok().map(Distribution::Poisson),
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            NullModel::NegativeBinomial { r, p } => r * (1.0 - p) / p,
            NullModel::Poisson { lambda } => lambda,
        }
    }

    ///
    /// Two-tailed p-value of the observed value: twice the probability of
    /// the tail on the side of the observation, capped at 1.
    ///
    pub fn pvalue(&self, observed: u64) -> f64 {
        let Some(dist) = self.distribution() else {
            return PVALUE_NOT_COMPUTABLE;
        };

        let tail = if (observed as f64) < self.mean() {
            dist.cdf(observed)
        } else if observed == 0 {
            1.0
        } else {
            dist.sf(observed - 1)
        };

        let pvalue = (2.0 * tail).min(1.0);
        if pvalue.is_nan() {
            PVALUE_NOT_COMPUTABLE
        } else if pvalue <= 0.0 {
            PVALUE_FLOOR
        } else {
            pvalue
        }
    }

    ///
    /// `1 - Cramér's V` between the histogram of the samples and the
    /// histogram expected under this model, over at most 16 equal-width
    /// bins spanning the observed range. 1 is a perfect fit.
    ///
    pub fn fit_quality(&self, stats: &SufficientStats) -> f64 {
        let (Some(min), Some(max), Some(dist)) = (stats.min(), stats.max(), self.distribution())
        else {
            return 0.0;
        };

        let range = max - min + 1;
        let bins = range.min(MAX_FIT_BINS);
        let width = range.div_ceil(bins);

        let mut observed = vec![0.0; bins as usize];
        for (low, _, count) in stats.histogram().bins() {
            let idx = ((low.max(min) - min) / width).min(bins - 1);
            observed[idx as usize] += count as f64;
        }

        let n = stats.count() as f64;
        let expected: Vec<f64> = (0..bins)
            .map(|i| {
                let low = min + i * width;
                let high = (low + width - 1).min(max);
                let below = if low == 0 { 0.0 } else { dist.cdf(low - 1) };
                n * (dist.cdf(high) - below).max(0.0)
            })
            .collect();

        match cramers_v(&observed, &expected) {
            Some(v) => 1.0 - v,
            None => 0.0,
        }
    }
}

/// Cramér's V of a two-row contingency table. Columns empty in both rows are
/// ignored.
fn cramers_v(first: &[f64], second: &[f64]) -> Option<f64> {
    let columns: Vec<(f64, f64)> = first
        .iter()
        .zip(second)
        .map(|(&a, &b)| (a, b))
        .filter(|(a, b)| a + b > 0.0)
        .collect();

    let first_total: f64 = columns.iter().map(|(a, _)| a).sum();
    let second_total: f64 = columns.iter().map(|(_, b)| b).sum();
    let total = first_total + second_total;
    if first_total <= 0.0 || second_total <= 0.0 {
        return None;
    }
    if columns.len() < 2 {
        return Some(0.0);
    }

    let chi2: f64 = columns
        .iter()
        .map(|&(a, b)| {
            let column_total = a + b;
            let expected_a = first_total * column_total / total;
            let expected_b = second_total * column_total / total;
            (a - expected_a).powi(2) / expected_a + (b - expected_b).powi(2) / expected_b
        })
        .sum();

    // min(rows, columns) - 1 is always 1 for two rows
    let v = (chi2 / total).sqrt();
    v.is_finite().then_some(v.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use statrs::distribution::Discrete;

    /// Samples laid out following the NB(r, p) probability mass.
    fn nb_shaped_samples(r: f64, p: f64, total: f64) -> SufficientStats {
        let dist = NegativeBinomial::new(r, p).unwrap();
        let mut stats = SufficientStats::default();
        for x in 0..400u64 {
            let copies = (dist.pmf(x) * total).round() as u64;
            stats.extend(std::iter::repeat_n(x, copies as usize));
        }
        stats
    }

    #[rstest]
    fn test_moments_fit() {
        let fit = NullModel::from_moments(10.0, 20.0).unwrap();
        assert_eq!(fit, NullModel::NegativeBinomial { r: 10.0, p: 0.5 });
        assert!((fit.mean() - 10.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(0.0, 3.0)]
    #[case(0.0, 0.0)]
    #[case(10.0, 0.0)]
    fn test_degenerate_moments(#[case] mean: f64, #[case] variance: f64) {
        assert_eq!(NullModel::from_moments(mean, variance), None);
    }

    #[rstest]
    #[case(10.0, 10.0)]
    #[case(10.0, 5.0)]
    fn test_under_dispersed_moments_fall_back_to_poisson(
        #[case] mean: f64,
        #[case] variance: f64,
    ) {
        assert_eq!(
            NullModel::from_moments(mean, variance),
            Some(NullModel::Poisson { lambda: mean })
        );
    }

    #[rstest]
    fn test_under_dispersed_samples_are_scored() {
        let values = [
            62, 63, 63, 64, 64, 65, 65, 65, 66, 66, 66, 66, 67, 67, 67, 68, 68, 69, 69, 70,
        ];
        let mut stats = SufficientStats::default();
        stats.extend(values);
        assert!(stats.variance() < stats.mean());

        let fit = NullModel::from_stats(&stats).unwrap();
        assert_eq!(fit, NullModel::Poisson { lambda: 66.0 });

        let pvalue = fit.pvalue(75);
        assert!(pvalue > 0.0 && pvalue < 1.0);
        assert!(fit.pvalue(66) > pvalue);

        let quality = fit.fit_quality(&stats);
        assert!(quality > 0.0 && quality <= 1.0);
    }

    #[rstest]
    fn test_pvalue_tails() {
        let fit = NullModel::from_moments(10.0, 20.0).unwrap();

        let central = fit.pvalue(10);
        assert!(central > 0.5 && central <= 1.0);

        let high = fit.pvalue(40);
        let low = fit.pvalue(1);
        assert!(high > 0.0 && high < 1e-4);
        assert!(low > 0.0 && low < 0.05);
        assert!(fit.pvalue(60) < high);
    }

    #[rstest]
    fn test_pvalue_floor() {
        let fit = NullModel::from_moments(5.0, 6.0).unwrap();
        assert_eq!(fit.pvalue(1_000_000), PVALUE_FLOOR);
    }

    #[rstest]
    fn test_fit_quality_of_matching_samples() {
        let stats = nb_shaped_samples(10.0, 0.5, 10_000.0);
        let fit = NullModel::from_stats(&stats).unwrap();
        assert!(fit.fit_quality(&stats) > 0.9);
    }

    #[rstest]
    fn test_fit_quality_of_bimodal_samples() {
        let matching = nb_shaped_samples(10.0, 0.5, 10_000.0);
        let matching_quality = NullModel::from_stats(&matching)
            .unwrap()
            .fit_quality(&matching);

        let mut bimodal = SufficientStats::default();
        bimodal.extend(std::iter::repeat_n(2, 500));
        bimodal.extend(std::iter::repeat_n(30, 500));
        let quality = NullModel::from_stats(&bimodal).unwrap().fit_quality(&bimodal);

        assert!(quality < matching_quality);
        assert!(quality >= 0.0);
    }

    #[rstest]
    fn test_cramers_v_bounds() {
        assert_eq!(cramers_v(&[5.0, 5.0], &[5.0, 5.0]), Some(0.0));
        let v = cramers_v(&[10.0, 0.0], &[0.0, 10.0]).unwrap();
        assert!((v - 1.0).abs() < 1e-12);
        assert_eq!(cramers_v(&[1.0, 2.0], &[0.0, 0.0]), None);
    }
}
