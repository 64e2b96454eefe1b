//! Seeded two-stage train/valid/test assignment.
//!
//! Planning is pure: it takes an already sorted list and returns which
//! elements go where. The filesystem side lives in the parent module.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::fmt;

use crate::error::PrepError;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Corpora smaller than this go entirely to train.
pub const MIN_SPLITTABLE: usize = 3;

// Guards `ceil` against products like 10 * 0.3 = 3.0000000000000004.
const CEIL_EPSILON: f64 = 1e-9;

/// One of the three output subsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    /// Folder name under the output root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Validated validation/test fractions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SplitRatios {
    val: f64,
    test: f64,
}

impl SplitRatios {
    /// Both fractions must lie in `[0, 1)` and sum to less than 1.
    pub fn new(val: f64, test: f64) -> Result<Self, PrepError> {
        for (name, value) in [("val", val), ("test", test)] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(PrepError::InvalidSplitRatios {
                    message: format!("{name} ratio {value} must be in [0.0, 1.0)"),
                });
            }
        }
        if val + test >= 1.0 {
            return Err(PrepError::InvalidSplitRatios {
                message: format!("val + test = {} leaves nothing for train", val + test),
            });
        }
        Ok(Self { val, test })
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn test(&self) -> f64 {
        self.test
    }

    fn holdout(&self) -> f64 {
        self.val + self.test
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            val: 0.1,
            test: 0.1,
        }
    }
}

/// Assignment of items to the three splits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitPlan<T> {
    pub train: Vec<T>,
    pub valid: Vec<T>,
    pub test: Vec<T>,
}

impl<T> SplitPlan<T> {
    pub fn get(&self, split: Split) -> &[T] {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `items` into train, valid and test.
///
/// `items` should already be in a stable order (the partitioner sorts by
/// file name): the shuffle is seeded, so the same order, ratios and seed
/// always give the same plan.
///
/// - Fewer than [`MIN_SPLITTABLE`] items: everything goes to train.
/// - Stage 1 shuffles and holds out `ceil(n * (val + test))` items, capped
///   so that train keeps at least one.
/// - Stage 2 reshuffles the holdout with the same seed and gives
///   `ceil(holdout * test / (val + test))` of it to test, the rest to valid.
///   A holdout of fewer than two items goes entirely to valid.
///
/// Each returned list is sorted.
pub fn plan_split<T: Clone + Ord>(items: &[T], ratios: SplitRatios, seed: u64) -> SplitPlan<T> {
    let n = items.len();
    if n < MIN_SPLITTABLE {
        let mut train = items.to_vec();
        train.sort();
        return SplitPlan {
            train,
            valid: Vec::new(),
            test: Vec::new(),
        };
    }

    let mut shuffled = items.to_vec();
    shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

    let holdout_len = ceil_fraction(n, ratios.holdout()).min(n - 1);
    let mut train = shuffled.split_off(holdout_len);
    let mut holdout = shuffled;

    let (mut valid, mut test) = if holdout.len() < 2 {
        (holdout, Vec::new())
    } else {
        holdout.shuffle(&mut StdRng::seed_from_u64(seed));
        let test_len = ceil_fraction(holdout.len(), ratios.test() / ratios.holdout());
        let valid = holdout.split_off(test_len);
        (valid, holdout)
    };

    train.sort();
    valid.sort();
    test.sort();
    SplitPlan { train, valid, test }
}

fn ceil_fraction(n: usize, fraction: f64) -> usize {
    if fraction <= 0.0 {
        return 0;
    }
    let raw = (n as f64 * fraction - CEIL_EPSILON).ceil();
    (raw.max(0.0) as usize).min(n)
}
