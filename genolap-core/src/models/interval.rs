use num_traits::{PrimInt, Unsigned, identities::zero};
use std::cmp::Ordering;

/// Half-open range `[start, end)` carrying an arbitrary payload.
///
/// Equality and ordering only look at the coordinates, so two intervals with
/// different payloads but the same bounds compare equal.
#[derive(Eq, Debug, Clone)]
pub struct Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    pub start: I,
    pub end: I,
    pub val: T,
}

impl<I> Interval<I, ()>
where
    I: PrimInt + Unsigned + Send + Sync,
{
    pub fn new(start: I, end: I) -> Self {
        Interval {
            start,
            end,
            val: (),
        }
    }
}

impl<I, T> Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    pub fn with_val(start: I, end: I, val: T) -> Self {
        Interval { start, end, val }
    }

    #[inline]
    pub fn width(&self) -> I {
        self.end.checked_sub(&self.start).unwrap_or_else(zero::<I>)
    }

    /// Number of positions shared with `other`, zero when disjoint.
    #[inline]
    pub fn intersect<U>(&self, other: &Interval<I, U>) -> I
    where
        U: Eq + Clone + Send + Sync,
    {
        self.end
            .min(other.end)
            .checked_sub(&self.start.max(other.start))
            .unwrap_or_else(zero::<I>)
    }

    /// Does `[start, end)` share at least one position with this interval?
    #[inline]
    pub fn overlap(&self, start: I, end: I) -> bool {
        self.start < end && self.end > start
    }
}

impl<I, T> Ord for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn cmp(&self, other: &Interval<I, T>) -> Ordering {
        (self.start, self.end).cmp(&(other.start, other.end))
    }
}

impl<I, T> PartialOrd for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I, T> PartialEq for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn eq(&self, other: &Interval<I, T>) -> bool {
        self.start == other.start && self.end == other.end
    }
}
