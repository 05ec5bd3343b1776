//! Minibatch scheduling of shuffling experiments.
//!
//! A run of `minibatch_count × minibatch_size` shuffles is cut into
//! minibatches executed on a dedicated rayon pool, one wave of
//! `worker_count` minibatches at a time. Workers only return their partial
//! summaries; the scheduler is the single writer folding them into the
//! run total.
//!
//! Every minibatch owns a random stream derived from the run seed, the
//! analysis index and the minibatch index, so a run is reproducible for a
//! given seed and minibatch partitioning whatever the number of workers.
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::RunConfig;
use crate::errors::{GenolapStatsError, Result};

/// Key of the random stream of one minibatch: run seed, analysis stream and
/// minibatch index laid side by side in a ChaCha key.
pub fn derive_seed(seed: u64, stream: u64, minibatch: u64) -> [u8; 32] {
    let mut key = [0u8; 32];
    for (chunk, word) in key.chunks_exact_mut(8).zip([seed, stream, minibatch]) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    key
}

/// One unit of work: `size` shuffles drawn from a dedicated random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinibatchTask {
    pub index: usize,
    pub size: usize,
    pub seed: [u8; 32],
}

impl MinibatchTask {
    pub fn rng(&self) -> StdRng {
        StdRng::from_seed(self.seed)
    }
}

/// Partial results that can be folded together.
pub trait Merge {
    fn merge(&mut self, other: Self);
}

/// A shuffling experiment run minibatch by minibatch.
pub trait Experiment: Sync {
    type Summary: Merge + Send;

    /// Summary of zero shuffles.
    fn empty(&self) -> Self::Summary;

    fn run_minibatch(&self, task: &MinibatchTask) -> Result<Self::Summary>;
}

pub struct Scheduler {
    pool: ThreadPool,
    worker_count: usize,
    minibatch_count: usize,
    minibatch_size: usize,
    seed: u64,
    show_progress: bool,
}

impl Scheduler {
    pub fn new(config: &RunConfig) -> Result<Self> {
        let available = std::thread::available_parallelism()
            .map(|c| c.get())
            .unwrap_or(1);

        let worker_count = match config.worker_count {
            0 => available,
            requested => {
                if requested < available {
                    warn!(
                        "Using {} workers while {} cores are available",
                        requested, available
                    );
                }
                requested
            }
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("genolap-worker-{}", i))
            .build()?;

        Ok(Scheduler {
            pool,
            worker_count,
            minibatch_count: config.minibatch_count,
            minibatch_size: config.minibatch_size,
            seed: config.seed,
            show_progress: config.show_progress,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn task(&self, stream: u64, index: usize) -> MinibatchTask {
        MinibatchTask {
            index,
            size: self.minibatch_size,
            seed: derive_seed(self.seed, stream, index as u64),
        }
    }

    fn progress_bar(&self, message: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(self.minibatch_count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} minibatches {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb
    }

    ///
    /// Run every minibatch of `experiment` on the random stream `stream` and
    /// fold the summaries.
    ///
    /// The first failing minibatch fails the whole run, nothing partial is
    /// returned.
    ///
    pub fn run<E: Experiment>(&self, stream: u64, experiment: &E, label: &str) -> Result<E::Summary> {
        let pb = self.progress_bar(label);
        let mut total = experiment.empty();

        let indices: Vec<usize> = (0..self.minibatch_count).collect();
        for wave in indices.chunks(self.worker_count) {
            let tasks: Vec<MinibatchTask> = wave.iter().map(|&i| self.task(stream, i)).collect();
            let results: Vec<Result<E::Summary>> = self
                .pool
                .install(|| tasks.par_iter().map(|t| experiment.run_minibatch(t)).collect());

            for (task, result) in tasks.iter().zip(results) {
                let summary = result.map_err(|e| GenolapStatsError::Minibatch {
                    index: task.index,
                    source: Box::new(e),
                })?;
                total.merge(summary);
                pb.inc(1);
            }
            debug!("{}: merged minibatches up to {}", label, wave[wave.len() - 1]);
        }

        pb.finish_and_clear();
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rand::Rng;
    use rstest::*;

    use crate::accumulator::SufficientStats;

    struct Dice;

    impl Experiment for Dice {
        type Summary = SufficientStats;

        fn empty(&self) -> SufficientStats {
            SufficientStats::default()
        }

        fn run_minibatch(&self, task: &MinibatchTask) -> Result<SufficientStats> {
            let mut rng = task.rng();
            let mut stats = SufficientStats::default();
            for _ in 0..task.size {
                stats.push(rng.random_range(1..=6));
            }
            Ok(stats)
        }
    }

    struct Failing;

    impl Experiment for Failing {
        type Summary = SufficientStats;

        fn empty(&self) -> SufficientStats {
            SufficientStats::default()
        }

        fn run_minibatch(&self, task: &MinibatchTask) -> Result<SufficientStats> {
            match task.index {
                3 => Err(GenolapStatsError::Data("boom".to_string())),
                _ => Ok(SufficientStats::default()),
            }
        }
    }

    fn config(workers: usize) -> RunConfig {
        RunConfig {
            minibatch_count: 9,
            minibatch_size: 25,
            worker_count: workers,
            show_progress: false,
            ..Default::default()
        }
    }

    #[rstest]
    fn test_all_shuffles_are_run() {
        let scheduler = Scheduler::new(&config(2)).unwrap();
        let stats = scheduler.run(0, &Dice, "dice").unwrap();
        assert_eq!(stats.count(), 225);
        assert!(stats.min().unwrap() >= 1 && stats.max().unwrap() <= 6);
    }

    #[rstest]
    fn test_result_does_not_depend_on_workers() {
        let one = Scheduler::new(&config(1)).unwrap().run(5, &Dice, "dice").unwrap();
        let four = Scheduler::new(&config(4)).unwrap().run(5, &Dice, "dice").unwrap();
        assert_eq!(one, four);
    }

    #[rstest]
    fn test_streams_differ() {
        let scheduler = Scheduler::new(&config(1)).unwrap();
        assert_ne!(scheduler.task(0, 0).seed, scheduler.task(1, 0).seed);
        assert_ne!(scheduler.task(0, 0).seed, scheduler.task(0, 1).seed);
        assert_eq!(scheduler.task(2, 3), scheduler.task(2, 3));
    }

    #[rstest]
    fn test_minibatch_streams_draw_differently() {
        let scheduler = Scheduler::new(&config(1)).unwrap();
        let draws = |stream, index| -> Vec<u64> {
            let mut rng = scheduler.task(stream, index).rng();
            (0..4).map(|_| rng.random()).collect()
        };

        assert_eq!(draws(0, 0), draws(0, 0));
        assert_ne!(draws(0, 0), draws(1, 0));
        assert_ne!(draws(0, 0), draws(0, 1));
        assert_ne!(draws(1, 0), draws(0, 1));
    }

    #[rstest]
    fn test_failing_minibatch_fails_the_run() {
        let scheduler = Scheduler::new(&config(4)).unwrap();
        match scheduler.run(0, &Failing, "failing") {
            Err(GenolapStatsError::Minibatch { index, .. }) => assert_eq!(index, 3),
            other => panic!("expected a minibatch error, got {:?}", other.map(|s| s.count())),
        }
    }
}
