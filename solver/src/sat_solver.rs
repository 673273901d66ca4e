use crate::{SATSolution, CNF};

pub trait Solver {
    fn solve(&self, formula: &CNF) -> SATSolution;
}
