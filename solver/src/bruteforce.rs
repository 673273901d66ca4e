use crate::sat_solution::SATSolution;
use crate::sat_solver::Solver;
use crate::CNF;

/// Exhaustive reference solver: tries every valuation. Only meant for
/// cross-checking the real engines on small instances.
pub struct Bruteforce;

impl Solver for Bruteforce {
    fn solve(&self, formula: &CNF) -> SATSolution {
        let width = formula.num_variables.max(formula.max_variable_id());
        let mut valuation = vec![false; width];
        if search(formula, 0, &mut valuation) {
            SATSolution::Satisfiable(valuation)
        } else {
            SATSolution::Unsatisfiable
        }
    }
}

fn satisfies(formula: &CNF, valuation: &[bool]) -> bool {
    formula.clauses.iter().all(|clause| {
        clause
            .vars
            .iter()
            .any(|lit| valuation[lit.id - 1] == lit.sign)
    })
}

fn search(formula: &CNF, position: usize, valuation: &mut Vec<bool>) -> bool {
    if position == valuation.len() {
        return satisfies(formula, valuation);
    }
    for &value in &[false, true] {
        valuation[position] = value;
        if search(formula, position + 1, valuation) {
            return true;
        }
    }
    valuation[position] = false;
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CNFVar;

    fn formula(clauses: &[&[i32]]) -> CNF {
        clauses
            .iter()
            .map(|clause| clause.iter().map(|&lit| CNFVar::from_i32(lit)).collect())
            .collect()
    }

    #[test]
    fn finds_a_model() {
        match Bruteforce.solve(&formula(&[&[1, 2], &[-1, 2], &[-2, 3]])) {
            SATSolution::Satisfiable(valuation) => {
                assert!(satisfies(&formula(&[&[1, 2], &[-1, 2], &[-2, 3]]), &valuation))
            }
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn detects_unsatisfiability() {
        assert!(Bruteforce
            .solve(&formula(&[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]))
            .is_unsat());
    }
}
