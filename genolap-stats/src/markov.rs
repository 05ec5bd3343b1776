//! Order-2 Markov chains over observed integer sequences.
//!
//! Used by the Markov shuffling mode to resample interval lengths and
//! inter-interval gaps while keeping some of their local correlation.
use fxhash::FxHashMap;
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct MarkovChain {
    observed: Vec<u32>,
    /// Every value that followed a given pair, with repetitions, so that a
    /// uniform pick follows the empirical transition probabilities.
    transitions: FxHashMap<(u32, u32), Vec<u32>>,
}

impl MarkovChain {
    pub fn fit(observed: &[u32]) -> Self {
        let mut transitions: FxHashMap<(u32, u32), Vec<u32>> = FxHashMap::default();
        for window in observed.windows(3) {
            transitions
                .entry((window[0], window[1]))
                .or_default()
                .push(window[2]);
        }

        MarkovChain {
            observed: observed.to_vec(),
            transitions,
        }
    }

    fn draw_observed<R: Rng>(&self, rng: &mut R) -> u32 {
        self.observed[rng.random_range(0..self.observed.len())]
    }

    ///
    /// Sample a sequence of `len` values.
    ///
    /// The chain starts from a random pair of consecutive observed values.
    /// A pair never seen in the observed sequence is followed by a uniform
    /// draw among the observed values.
    ///
    pub fn sample<R: Rng>(&self, len: usize, rng: &mut R) -> Vec<u32> {
        if self.observed.is_empty() {
            return vec![0; len];
        }
        if self.observed.len() < 2 {
            return (0..len).map(|_| self.draw_observed(rng)).collect();
        }

        let first = rng.random_range(0..self.observed.len() - 1);
        let mut sequence = Vec::with_capacity(len.max(2));
        sequence.extend_from_slice(&self.observed[first..first + 2]);

        while sequence.len() < len {
            let key = (sequence[sequence.len() - 2], sequence[sequence.len() - 1]);
            let next = match self.transitions.get(&key) {
                Some(followers) => followers[rng.random_range(0..followers.len())],
                None => self.draw_observed(rng),
            };
            sequence.push(next);
        }

        sequence.truncate(len);
        sequence
    }
}
