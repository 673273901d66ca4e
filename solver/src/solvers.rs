//! Wrappers around the plain [`Solver`] trait: time measurement and
//! deadline enforcement. Deadlines rely on the interruptible engines
//! yielding between iterations of their outer loop.

use std::time::{Duration, Instant};

use async_std::future::timeout;
use async_std::task::block_on;
use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{SATSolution, Solver, CNF};

/// A solver that can be abandoned at its yield points.
#[async_trait]
#[auto_impl(Box)]
pub trait InterruptibleSolver {
    async fn solve_interruptible(&self, formula: &CNF) -> SATSolution;
}

#[async_trait]
impl<'a, S: InterruptibleSolver + Sync> InterruptibleSolver for &'a S {
    async fn solve_interruptible(&self, formula: &CNF) -> SATSolution {
        (**self).solve_interruptible(formula).await
    }
}

/// A wrapper for another solver which exposes time performance
/// measurement
pub struct TimedSolver<S> {
    solver: S,
}

impl<S> TimedSolver<S> {
    pub fn new(solver: S) -> TimedSolver<S> {
        TimedSolver { solver }
    }
}

impl<S: Solver> Solver for TimedSolver<S> {
    fn solve(&self, formula: &CNF) -> SATSolution {
        self.solver.solve(formula)
    }
}

impl<S: Solver> TimedSolver<S> {
    /// Solves a given formula and additionally reports the elapsed time.
    pub fn solve_timed(&self, formula: &CNF) -> (Duration, SATSolution) {
        let start = Instant::now();
        let solution = self.solver.solve(formula);
        (start.elapsed(), solution)
    }
}

/// Bounds the runtime of an interruptible solver; expiry yields
/// [`SATSolution::Unknown`].
pub struct TimeLimitedSolver<S: InterruptibleSolver> {
    solver: S,
    max_duration: Duration,
}

impl<S: InterruptibleSolver> TimeLimitedSolver<S> {
    pub fn new(solver: S, max_duration: Duration) -> TimeLimitedSolver<S> {
        TimeLimitedSolver {
            solver,
            max_duration,
        }
    }
}

impl<S: InterruptibleSolver> Solver for TimeLimitedSolver<S> {
    fn solve(&self, formula: &CNF) -> SATSolution {
        block_on(async {
            timeout(self.max_duration, self.solver.solve_interruptible(formula))
                .await
                .unwrap_or(SATSolution::Unknown)
        })
    }
}

#[async_trait]
impl<S: InterruptibleSolver + Send + Sync> InterruptibleSolver for TimeLimitedSolver<S> {
    async fn solve_interruptible(&self, formula: &CNF) -> SATSolution {
        timeout(self.max_duration, self.solver.solve_interruptible(formula))
            .await
            .unwrap_or(SATSolution::Unknown)
    }
}
