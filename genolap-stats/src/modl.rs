//! MODL: selection of a small dictionary of combinations.
//!
//! The observed combinations form a binary matrix (one row per distinct
//! reference mask) weighted by abundance. Words are picked greedily: each
//! step adds the candidate that most reduces the weighted number of row bits
//! that cannot be rebuilt as a union of selected words contained in the
//! row. Selection stops after `max_words` words or when no candidate helps.
use log::debug;

/// Candidate words are pairwise intersections of rows only below this
/// number of distinct rows.
const MAX_ROWS_FOR_INTERSECTIONS: usize = 512;

///
/// Integer weight of each abundance: abundances are divided by the rarest
/// one, but never by less than `min_ratio` times the largest one, and
/// rounded up.
///
pub fn squish_weights(counts: &[u64], min_ratio: f64) -> Vec<u64> {
    let (Some(&min), Some(&max)) = (counts.iter().min(), counts.iter().max()) else {
        return Vec::new();
    };
    let unit = (min as f64).max(min_ratio * max as f64).max(f64::MIN_POSITIVE);
    counts
        .iter()
        .map(|&c| ((c as f64 / unit).ceil() as u64).max(1))
        .collect()
}

fn candidates(rows: &[u64]) -> Vec<u64> {
    let mut words: Vec<u64> = rows.to_vec();
    if rows.len() <= MAX_ROWS_FOR_INTERSECTIONS {
        for (i, &a) in rows.iter().enumerate() {
            for &b in &rows[i + 1..] {
                if a & b != 0 {
                    words.push(a & b);
                }
            }
        }
    }
    words.sort_unstable();
    words.dedup();
    words
}

fn residual(rows: &[u64], weights: &[u64], covered: &[u64], word: u64) -> u64 {
    rows.iter()
        .zip(weights)
        .zip(covered)
        .map(|((&row, &weight), &cover)| {
            let cover = match word & !row == 0 {
                true => cover | word,
                false => cover,
            };
            weight * (row & !cover).count_ones() as u64
        })
        .sum()
}

///
/// Select up to `max_words` reference masks summarising `rows`, given as
/// `(reference mask, abundance)` pairs. Words are returned in selection
/// order.
///
pub fn select_words(rows: &[(u64, u64)], max_words: usize, min_ratio: f64) -> Vec<u64> {
    let masks: Vec<u64> = rows.iter().map(|&(mask, _)| mask).collect();
    let counts: Vec<u64> = rows.iter().map(|&(_, count)| count).collect();
    let weights = squish_weights(&counts, min_ratio);

    let mut covered = vec![0u64; masks.len()];
    let mut current = residual(&masks, &weights, &covered, 0);
    let mut pool = candidates(&masks);
    let mut selected = Vec::new();

    while selected.len() < max_words && current > 0 {
        let best = pool
            .iter()
            .enumerate()
            .map(|(idx, &word)| (residual(&masks, &weights, &covered, word), word.count_ones(), word, idx))
            .min();

        let Some((score, _, word, idx)) = best else {
            break;
        };
        if score >= current {
            break;
        }

        debug!("MODL word {:#b} brings the residual from {} to {}", word, current, score);
        for (cover, &row) in covered.iter_mut().zip(&masks) {
            if word & !row == 0 {
                *cover |= word;
            }
        }
        current = score;
        selected.push(word);
        pool.swap_remove(idx);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_squish_weights() {
        assert_eq!(squish_weights(&[100, 50, 1], 1e-4), vec![100, 50, 1]);
        assert_eq!(squish_weights(&[10, 25, 5], 1e-4), vec![2, 5, 1]);
        // the rarest abundance is raised to a tenth of the largest
        assert_eq!(squish_weights(&[1000, 10, 1], 0.1), vec![10, 1, 1]);
        assert!(squish_weights(&[], 0.1).is_empty());
    }

    #[rstest]
    fn test_greedy_selection() {
        let rows = [(0b011, 100), (0b100, 50), (0b111, 1)];

        assert_eq!(select_words(&rows, 1, 1e-4), vec![0b011]);
        // the full row is rebuilt from the first two words, a third one is useless
        assert_eq!(select_words(&rows, 3, 1e-4), vec![0b011, 0b100]);
    }

    #[rstest]
    fn test_intersection_candidates() {
        // A+B is never observed alone but is shared by both rows
        let rows = [(0b0111, 10), (0b1011, 10)];
        assert_eq!(select_words(&rows, 1, 1e-4), vec![0b0011]);
    }

    #[rstest]
    fn test_empty_rows() {
        assert!(select_words(&[], 5, 1e-4).is_empty());
    }
}
