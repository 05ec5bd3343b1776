use num_traits::{PrimInt, Unsigned};

use super::Overlapper;
use genolap_core::models::Interval;

/// Minimum number of covered followers that makes an interval "long".
const MIN_COVERAGE: usize = 10;

/// An Augmented Interval List for overlap queries.
///
/// From the following article: <https://academic.oup.com/bioinformatics/article/35/23/4907/5509521>
///
/// Intervals are split into components. Each component is sorted by start
/// and carries a running maximum of the ends, which lets a query walk
/// backwards from the last candidate start and stop as soon as nothing
/// further left can reach the query. Long intervals that would cover many
/// of their successors are moved to a later component so they do not
/// defeat that early stop.
///
/// ```
/// use genolap_overlaprs::{AIList, Overlapper, Interval};
///
/// let genes = AIList::build(vec![
///     Interval::with_val(1000u32, 2000, "GENE1"),
///     Interval::with_val(1500, 2500, "GENE2"),
///     Interval::with_val(5000, 6000, "GENE3"),
/// ]);
///
/// assert_eq!(genes.find(1800, 2200).len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    components: Vec<Component<I, T>>,
}

#[derive(Debug, Clone)]
struct Component<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    starts: Vec<I>,
    max_ends: Vec<I>,
    intervals: Vec<Interval<I, T>>,
}

impl<I, T> Component<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// `intervals` must be sorted by start.
    fn new(intervals: Vec<Interval<I, T>>) -> Self {
        let starts = intervals.iter().map(|iv| iv.start).collect();
        let max_ends = intervals
            .iter()
            .scan(I::zero(), |max, iv| {
                *max = (*max).max(iv.end);
                Some(*max)
            })
            .collect();

        Component {
            starts,
            max_ends,
            intervals,
        }
    }

    fn overlapping(&self, start: I, end: I) -> impl Iterator<Item = &Interval<I, T>> {
        let last = self.starts.partition_point(|&s| s < end);
        (0..last)
            .rev()
            .take_while(move |&i| self.max_ends[i] > start)
            .map(move |i| &self.intervals[i])
            .filter(move |iv| iv.end > start)
    }
}

/// Split sorted intervals into the ones kept in the current component and
/// the long ones deferred to the next.
fn decompose<I, T>(intervals: Vec<Interval<I, T>>) -> (Vec<Interval<I, T>>, Vec<Interval<I, T>>)
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    let long: Vec<bool> = intervals
        .iter()
        .enumerate()
        .map(|(idx, iv)| {
            intervals[idx + 1..]
                .iter()
                .take(2 * MIN_COVERAGE - 1)
                .filter(|next| iv.end > next.end)
                .count()
                >= MIN_COVERAGE
        })
        .collect();

    let mut kept = Vec::with_capacity(intervals.len());
    let mut deferred = Vec::new();
    for (iv, is_long) in intervals.into_iter().zip(long) {
        if is_long {
            deferred.push(iv);
        } else {
            kept.push(iv);
        }
    }
    (kept, deferred)
}

impl<I, T> Overlapper<I, T> for AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self {
        let mut remaining = intervals;
        remaining.sort_by_key(|iv| iv.start);

        let mut components = Vec::new();
        // the last interval of a list is never long, so every pass shrinks the list
        while !remaining.is_empty() {
            let (kept, deferred) = decompose(remaining);
            components.push(Component::new(kept));
            remaining = deferred;
        }

        AIList { components }
    }

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        Box::new(
            self.components
                .iter()
                .flat_map(move |component| component.overlapping(start, end)),
        )
    }
}

impl<I, T> AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Returns the number of intervals in the AIList.
    pub fn len(&self) -> usize {
        self.components.iter().map(|c| c.intervals.len()).sum()
    }

    /// Returns `true` if the AIList contains no intervals.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of decomposed components, mostly useful for tests.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn brute_force(intervals: &[Interval<u32, u32>], start: u32, end: u32) -> Vec<u32> {
        let mut hits: Vec<u32> = intervals
            .iter()
            .filter(|iv| iv.overlap(start, end))
            .map(|iv| iv.val)
            .collect();
        hits.sort();
        hits
    }

    #[fixture]
    fn nested_intervals() -> Vec<Interval<u32, u32>> {
        // one long interval covering many short ones forces a second component
        let mut intervals = vec![Interval::with_val(0, 10_000, 0)];
        for i in 1..=40u32 {
            intervals.push(Interval::with_val(i * 100, i * 100 + 50, i));
        }
        intervals
    }

    #[rstest]
    fn test_empty() {
        let ailist: AIList<u32, ()> = AIList::build(vec![]);
        assert!(ailist.is_empty());
        assert_eq!(ailist.find(0, 100).len(), 0);
    }

    #[rstest]
    fn test_find_simple() {
        let ailist = AIList::build(vec![
            Interval::with_val(10u32, 20, 'a'),
            Interval::with_val(15, 25, 'b'),
            Interval::with_val(30, 40, 'c'),
        ]);

        let mut hits: Vec<char> = ailist.find_iter(18, 31).map(|iv| iv.val).collect();
        hits.sort();
        assert_eq!(hits, vec!['a', 'b', 'c']);

        // half open ends
        assert_eq!(ailist.find(25, 30).len(), 0);
        assert_eq!(ailist.find(0, 10).len(), 0);
    }

    #[rstest]
    fn test_decomposition_keeps_all_intervals(nested_intervals: Vec<Interval<u32, u32>>) {
        let ailist = AIList::build(nested_intervals.clone());
        assert_eq!(ailist.len(), nested_intervals.len());
        assert_eq!(ailist.component_count(), 2);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(120, 130)]
    #[case(149, 260)]
    #[case(3990, 4100)]
    #[case(9000, 20000)]
    #[case(10_000, 20000)]
    fn test_matches_brute_force(
        nested_intervals: Vec<Interval<u32, u32>>,
        #[case] start: u32,
        #[case] end: u32,
    ) {
        let ailist = AIList::build(nested_intervals.clone());
        let mut hits: Vec<u32> = ailist.find_iter(start, end).map(|iv| iv.val).collect();
        hits.sort();
        assert_eq!(hits, brute_force(&nested_intervals, start, end));
    }
}
