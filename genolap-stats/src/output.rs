use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::errors::Result;
use crate::records::OverlapStatRecord;

/// One line of the TSV table, columns in output order.
#[derive(Serialize)]
struct TsvRow<'a> {
    feature_type: &'a str,
    nb_intersections_expectation_shuffled: f64,
    nb_intersections_variance_shuffled: f64,
    nb_intersections_negbinom_fit_quality: f64,
    nb_intersections_log2_fold_change: f64,
    nb_intersections_true: u64,
    nb_intersections_pvalue: f64,
    summed_bp_overlaps_expectation_shuffled: f64,
    summed_bp_overlaps_variance_shuffled: f64,
    summed_bp_overlaps_negbinom_fit_quality: f64,
    summed_bp_overlaps_log2_fold_change: f64,
    summed_bp_overlaps_true: u64,
    summed_bp_overlaps_pvalue: f64,
}

impl<'a> From<&'a OverlapStatRecord> for TsvRow<'a> {
    fn from(record: &'a OverlapStatRecord) -> Self {
        let n = &record.nb_intersections;
        let s = &record.summed_bp_overlaps;
        TsvRow {
            feature_type: &record.feature_type,
            nb_intersections_expectation_shuffled: n.expectation,
            nb_intersections_variance_shuffled: n.variance,
            nb_intersections_negbinom_fit_quality: n.fit_quality,
            nb_intersections_log2_fold_change: n.log2_fold_change,
            nb_intersections_true: n.true_value,
            nb_intersections_pvalue: n.pvalue,
            summed_bp_overlaps_expectation_shuffled: s.expectation,
            summed_bp_overlaps_variance_shuffled: s.variance,
            summed_bp_overlaps_negbinom_fit_quality: s.fit_quality,
            summed_bp_overlaps_log2_fold_change: s.log2_fold_change,
            summed_bp_overlaps_true: s.true_value,
            summed_bp_overlaps_pvalue: s.pvalue,
        }
    }
}

///
/// Write `records` as a tab separated table with a header line.
///
/// Infinite fold changes are written `-inf`, p-values that could not be
/// computed `-1`.
///
pub fn write_tsv<W: Write>(records: &[OverlapStatRecord], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for record in records {
        wtr.serialize(TsvRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_tsv_file(records: &[OverlapStatRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_tsv(records, BufWriter::new(file))
}

/// Write `records` as a JSON array. Infinite values become `null`.
pub fn write_json<W: Write>(records: &[OverlapStatRecord], writer: W) -> Result<()> {
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_json_file(records: &[OverlapStatRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_json(records, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    use genolap_overlaprs::OverlapCounts;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::records::OverlapSamples;

    #[fixture]
    fn records() -> Vec<OverlapStatRecord> {
        let mut dispersed = OverlapSamples::default();
        for (n, s) in [(0, 0), (2, 30), (4, 10), (10, 200)] {
            dispersed.push(OverlapCounts::new(n, s));
        }
        let mut flat = OverlapSamples::default();
        for _ in 0..4 {
            flat.push(OverlapCounts::new(0, 0));
        }

        vec![
            OverlapStatRecord::new("promoters".into(), OverlapCounts::new(6, 90), &dispersed),
            OverlapStatRecord::new("[Query + A + ...]".into(), OverlapCounts::new(0, 0), &flat),
        ]
    }

    #[rstest]
    fn test_tsv_layout(records: Vec<OverlapStatRecord>) {
        let mut buffer = Vec::new();
        write_tsv(&records, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(header.len(), 13);
        assert_eq!(header[0], "feature_type");
        assert_eq!(header[5], "nb_intersections_true");
        assert_eq!(header[12], "summed_bp_overlaps_pvalue");

        let flat: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(flat[0], "[Query + A + ...]");
        assert_eq!(flat[4], "-inf");
        assert_eq!(flat[6], "-1.0");
    }

    #[rstest]
    fn test_json_nulls_infinite_values(records: Vec<OverlapStatRecord>) {
        let mut buffer = Vec::new();
        write_json(&records, &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value[0]["feature_type"], "promoters");
        assert_eq!(value[0]["nb_intersections"]["true_value"], 6);
        assert!(value[1]["nb_intersections"]["log2_fold_change"].is_null());
        assert_eq!(value[1]["nb_intersections"]["pvalue"], -1.0);
    }

    #[rstest]
    fn test_write_files(records: Vec<OverlapStatRecord>) {
        let dir = tempfile::tempdir().unwrap();
        write_tsv_file(&records, &dir.path().join("stats.tsv")).unwrap();
        write_json_file(&records, &dir.path().join("stats.json")).unwrap();

        let tsv = std::fs::read_to_string(dir.path().join("stats.tsv")).unwrap();
        assert!(tsv.starts_with("feature_type\tnb_intersections_expectation_shuffled"));
    }
}
