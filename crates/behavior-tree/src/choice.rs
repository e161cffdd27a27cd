//! Weighted random selection.
//!
//! Both the per-tick [`WeightedChoice`] node and one-off rolls made while
//! compiling content share [`pick_weighted`], so a given weight table and
//! draw always land on the same entry.

use crate::{Behavior, BehaviorFault, Status};

/// Source of uniform randomness for nodes that roll dice.
pub trait RandomSource {
    /// Returns a uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Picks an index from `weights` using a uniform `unit` draw in `[0, 1)`.
///
/// Walks the cumulative sum and returns the first entry whose running total
/// exceeds `unit * total`. Entries with a zero, negative or non-finite weight
/// are never chosen. Returns `None` when nothing has positive weight.
pub fn pick_weighted(weights: &[f64], unit: f64) -> Option<usize> {
    let usable = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };

    let total: f64 = weights.iter().copied().map(usable).sum();
    if total <= 0.0 {
        return None;
    }

    let target = unit.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (index, weight) in weights.iter().copied().map(usable).enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(index);
        if cumulative > target {
            return Some(index);
        }
    }

    // Rounding can leave the target sitting exactly on the total.
    last_positive
}

/// Re-rolls among weighted children every tick and ticks exactly one.
///
/// # Semantics
///
/// - Weights are non-negative integers; a zero-weight child never runs
/// - If every weight is zero the node is a no-op and returns `Failure`
/// - Otherwise the chosen child's status is returned
pub struct WeightedChoice<B> {
    weights: Vec<f64>,
    children: Vec<B>,
}

impl<B> WeightedChoice<B> {
    /// Creates a choice node from `(weight, child)` pairs.
    pub fn new(options: Vec<(u32, B)>) -> Self {
        let (weights, children) = options
            .into_iter()
            .map(|(weight, child)| (f64::from(weight), child))
            .unzip();
        Self { weights, children }
    }

    /// Number of options, including zero-weight ones.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if there are no options at all.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}

impl<C, B> Behavior<C> for WeightedChoice<B>
where
    C: RandomSource,
    B: Behavior<C>,
{
    fn tick(&mut self, ctx: &mut C) -> Result<Status, BehaviorFault> {
        let draw = ctx.next_unit();
        match pick_weighted(&self.weights, draw) {
            Some(index) => self.children[index].tick(ctx),
            None => Ok(Status::Failure),
        }
    }

    fn name(&self) -> &'static str {
        "weighted_choice"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic 64-bit LCG, good enough for distribution checks.
    struct TestContext {
        state: u64,
        hits: Vec<u32>,
    }

    impl TestContext {
        fn new(slots: usize) -> Self {
            Self {
                state: 0x2545_f491_4f6c_dd1d,
                hits: vec![0; slots],
            }
        }
    }

    impl RandomSource for TestContext {
        fn next_unit(&mut self) -> f64 {
            self.state = self
                .state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (self.state >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    struct Hit(usize);
    impl Behavior<TestContext> for Hit {
        fn tick(&mut self, ctx: &mut TestContext) -> Result<Status, BehaviorFault> {
            ctx.hits[self.0] += 1;
            Ok(Status::Success)
        }
    }

    #[test]
    fn picks_first_entry_whose_running_total_exceeds_draw() {
        let weights = [1.0, 2.0, 1.0];
        assert_eq!(pick_weighted(&weights, 0.0), Some(0));
        assert_eq!(pick_weighted(&weights, 0.24), Some(0));
        assert_eq!(pick_weighted(&weights, 0.25), Some(1));
        assert_eq!(pick_weighted(&weights, 0.74), Some(1));
        assert_eq!(pick_weighted(&weights, 0.75), Some(2));
        assert_eq!(pick_weighted(&weights, 0.999_999), Some(2));
    }

    #[test]
    fn zero_weights_are_never_picked() {
        let weights = [0.0, 3.0, 0.0];
        for step in 0..100 {
            assert_eq!(pick_weighted(&weights, step as f64 / 100.0), Some(1));
        }
    }

    #[test]
    fn zero_total_has_no_pick() {
        assert_eq!(pick_weighted(&[], 0.5), None);
        assert_eq!(pick_weighted(&[0.0, 0.0], 0.5), None);
    }

    #[test]
    fn choice_with_zero_total_is_noop() {
        let mut choice = WeightedChoice::new(vec![(0, Hit(0)), (0, Hit(1))]);
        let mut ctx = TestContext::new(2);

        assert_eq!(choice.tick(&mut ctx), Ok(Status::Failure));
        assert_eq!(ctx.hits, vec![0, 0]);
    }

    #[test]
    fn choice_converges_to_configured_proportions() {
        let mut choice = WeightedChoice::new(vec![(1, Hit(0)), (3, Hit(1)), (0, Hit(2)), (6, Hit(3))]);
        let mut ctx = TestContext::new(4);

        let rounds = 20_000;
        for _ in 0..rounds {
            assert_eq!(choice.tick(&mut ctx), Ok(Status::Success));
        }

        let share = |i: usize| f64::from(ctx.hits[i]) / rounds as f64;
        assert!((share(0) - 0.1).abs() < 0.02, "share 0 = {}", share(0));
        assert!((share(1) - 0.3).abs() < 0.02, "share 1 = {}", share(1));
        assert_eq!(ctx.hits[2], 0);
        assert!((share(3) - 0.6).abs() < 0.02, "share 3 = {}", share(3));
    }
}
