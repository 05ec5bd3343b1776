use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use genolap_overlaprs::OverlapCounts;

use crate::accumulator::SufficientStats;
use crate::errors::GenolapStatsError;
use crate::negbin::{NullModel, PVALUE_NOT_COMPUTABLE};
use crate::scheduler::Merge;

/// Shuffled values of both statistics for one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapSamples {
    pub n: SufficientStats,
    pub s: SufficientStats,
}

impl OverlapSamples {
    pub fn push(&mut self, counts: OverlapCounts) {
        self.n.push(counts.n);
        self.s.push(counts.s);
    }
}

impl Merge for OverlapSamples {
    fn merge(&mut self, other: Self) {
        self.n.merge(&other.n);
        self.s.merge(&other.s);
    }
}

/// One statistic (N or S) of one feature: true value against its null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSummary {
    pub true_value: u64,
    pub shuffle_count: u64,
    pub expectation: f64,
    pub variance: f64,
    pub null_model: Option<NullModel>,
    pub fit_quality: f64,
    pub pvalue: f64,
    pub log2_fold_change: f64,
}

impl StatSummary {
    pub fn new(true_value: u64, samples: &SufficientStats) -> Self {
        let expectation = samples.mean();
        let null_model = NullModel::from_stats(samples);
        let (fit_quality, pvalue) = match &null_model {
            Some(fit) => (fit.fit_quality(samples), fit.pvalue(true_value)),
            None => (0.0, PVALUE_NOT_COMPUTABLE),
        };

        StatSummary {
            true_value,
            shuffle_count: samples.count(),
            expectation,
            variance: samples.variance(),
            null_model,
            fit_quality,
            pvalue,
            log2_fold_change: (true_value as f64 / (expectation + 1.0)).log2(),
        }
    }
}

/// Statistics of one reference set, or of one combination of sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapStatRecord {
    pub feature_type: String,
    pub nb_intersections: StatSummary,
    pub summed_bp_overlaps: StatSummary,
}

impl OverlapStatRecord {
    pub fn new(feature_type: String, observed: OverlapCounts, samples: &OverlapSamples) -> Self {
        OverlapStatRecord {
            feature_type,
            nb_intersections: StatSummary::new(observed.n, &samples.n),
            summed_bp_overlaps: StatSummary::new(observed.s, &samples.s),
        }
    }
}

/// The twelve statistic columns of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatColumn {
    NbIntersectionsExpectationShuffled,
    NbIntersectionsVarianceShuffled,
    NbIntersectionsNegbinomFitQuality,
    NbIntersectionsLog2FoldChange,
    NbIntersectionsTrue,
    NbIntersectionsPvalue,
    SummedBpOverlapsExpectationShuffled,
    SummedBpOverlapsVarianceShuffled,
    SummedBpOverlapsNegbinomFitQuality,
    SummedBpOverlapsLog2FoldChange,
    SummedBpOverlapsTrue,
    SummedBpOverlapsPvalue,
}

impl StatColumn {
    pub const ALL: [StatColumn; 12] = [
        StatColumn::NbIntersectionsExpectationShuffled,
        StatColumn::NbIntersectionsVarianceShuffled,
        StatColumn::NbIntersectionsNegbinomFitQuality,
        StatColumn::NbIntersectionsLog2FoldChange,
        StatColumn::NbIntersectionsTrue,
        StatColumn::NbIntersectionsPvalue,
        StatColumn::SummedBpOverlapsExpectationShuffled,
        StatColumn::SummedBpOverlapsVarianceShuffled,
        StatColumn::SummedBpOverlapsNegbinomFitQuality,
        StatColumn::SummedBpOverlapsLog2FoldChange,
        StatColumn::SummedBpOverlapsTrue,
        StatColumn::SummedBpOverlapsPvalue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StatColumn::NbIntersectionsExpectationShuffled => "nb_intersections_expectation_shuffled",
            StatColumn::NbIntersectionsVarianceShuffled => "nb_intersections_variance_shuffled",
            StatColumn::NbIntersectionsNegbinomFitQuality => "nb_intersections_negbinom_fit_quality",
            StatColumn::NbIntersectionsLog2FoldChange => "nb_intersections_log2_fold_change",
            StatColumn::NbIntersectionsTrue => "nb_intersections_true",
            StatColumn::NbIntersectionsPvalue => "nb_intersections_pvalue",
            StatColumn::SummedBpOverlapsExpectationShuffled => {
                "summed_bp_overlaps_expectation_shuffled"
            }
            StatColumn::SummedBpOverlapsVarianceShuffled => "summed_bp_overlaps_variance_shuffled",
            StatColumn::SummedBpOverlapsNegbinomFitQuality => {
                "summed_bp_overlaps_negbinom_fit_quality"
            }
            StatColumn::SummedBpOverlapsLog2FoldChange => "summed_bp_overlaps_log2_fold_change",
            StatColumn::SummedBpOverlapsTrue => "summed_bp_overlaps_true",
            StatColumn::SummedBpOverlapsPvalue => "summed_bp_overlaps_pvalue",
        }
    }

    /// Value of this column in `record`.
    pub fn value(&self, record: &OverlapStatRecord) -> f64 {
        use StatColumn::*;

        let n = &record.nb_intersections;
        let s = &record.summed_bp_overlaps;
        match self {
            NbIntersectionsExpectationShuffled => n.expectation,
            NbIntersectionsVarianceShuffled => n.variance,
            NbIntersectionsNegbinomFitQuality => n.fit_quality,
            NbIntersectionsLog2FoldChange => n.log2_fold_change,
            NbIntersectionsTrue => n.true_value as f64,
            NbIntersectionsPvalue => n.pvalue,
            SummedBpOverlapsExpectationShuffled => s.expectation,
            SummedBpOverlapsVarianceShuffled => s.variance,
            SummedBpOverlapsNegbinomFitQuality => s.fit_quality,
            SummedBpOverlapsLog2FoldChange => s.log2_fold_change,
            SummedBpOverlapsTrue => s.true_value as f64,
            SummedBpOverlapsPvalue => s.pvalue,
        }
    }
}

impl Display for StatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StatColumn {
    type Err = GenolapStatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatColumn::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| GenolapStatsError::Config(format!("unknown statistic column '{}'", s)))
    }
}

///
/// Stable ascending sort of `records` by one statistic column.
///
pub fn sort_records(records: &mut [OverlapStatRecord], key: StatColumn) {
    records.sort_by(|a, b| key.value(a).total_cmp(&key.value(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn samples(values: &[(u64, u64)]) -> OverlapSamples {
        let mut samples = OverlapSamples::default();
        for &(n, s) in values {
            samples.push(OverlapCounts::new(n, s));
        }
        samples
    }

    #[rstest]
    fn test_summary_of_dispersed_samples() {
        let summary = StatSummary::new(9, &samples(&[(0, 0), (2, 0), (4, 0), (10, 0)]).n);

        assert_eq!(summary.shuffle_count, 4);
        assert_eq!(summary.expectation, 4.0);
        assert!(matches!(
            summary.null_model,
            Some(NullModel::NegativeBinomial { .. })
        ));
        assert!(summary.pvalue > 0.0 && summary.pvalue <= 1.0);
        assert!((summary.log2_fold_change - (9.0f64 / 5.0).log2()).abs() < 1e-12);
    }

    #[rstest]
    fn test_summary_of_under_dispersed_samples() {
        // 20 shuffles tightly packed around 66, well below Poisson spread
        let shuffled: Vec<(u64, u64)> = [64, 65, 65, 66, 66, 66, 66, 67, 67, 68]
            .into_iter()
            .cycle()
            .take(20)
            .map(|s| (1, s))
            .collect();
        let summary = StatSummary::new(75, &samples(&shuffled).s);

        assert!(summary.variance < summary.expectation);
        assert_eq!(summary.null_model, Some(NullModel::Poisson { lambda: 66.0 }));
        assert!(summary.pvalue > 0.0 && summary.pvalue <= 1.0);
        assert!(summary.fit_quality > 0.0);
    }

    #[rstest]
    fn test_summary_without_null_model() {
        // never any overlap: no dispersion to fit
        let summary = StatSummary::new(0, &samples(&[(0, 0), (0, 0), (0, 0)]).s);

        assert_eq!(summary.null_model, None);
        assert_eq!(summary.pvalue, PVALUE_NOT_COMPUTABLE);
        assert_eq!(summary.fit_quality, 0.0);
        assert_eq!(summary.log2_fold_change, f64::NEG_INFINITY);
    }

    #[rstest]
    fn test_column_names_round_trip() {
        for column in StatColumn::ALL {
            assert_eq!(column.name().parse::<StatColumn>().unwrap(), column);
        }
        assert!("pvalue".parse::<StatColumn>().is_err());
    }

    #[rstest]
    fn test_sort_records() {
        let shuffled = samples(&[(1, 10), (3, 30), (8, 80)]);
        let mut records = vec![
            OverlapStatRecord::new("b".into(), OverlapCounts::new(9, 5), &shuffled),
            OverlapStatRecord::new("a".into(), OverlapCounts::new(2, 500), &shuffled),
            OverlapStatRecord::new("c".into(), OverlapCounts::new(5, 50), &shuffled),
        ];

        sort_records(&mut records, StatColumn::NbIntersectionsTrue);
        let order: Vec<&str> = records.iter().map(|r| r.feature_type.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);

        sort_records(&mut records, StatColumn::SummedBpOverlapsTrue);
        let order: Vec<&str> = records.iter().map(|r| r.feature_type.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }
}
