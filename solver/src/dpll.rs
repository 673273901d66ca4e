use std::sync::Mutex;

use itertools::Itertools;

use crate::cnf::{CNFVar, CNF};
use crate::config::{SolverOptions, WatchMode};
use crate::logging::{StepLogger, StepRecord};
use crate::preprocessing::pure_literal_pass;
use crate::sat_solution::SATSolution;
use crate::sat_solver::Solver;
use crate::state::{PlainState, SatState, TrueTwlState, TwlState};

/// Recursive DPLL engine.
///
/// Every frame saturates unit propagation first, then branches on the
/// literal picked by the configured heuristic; the second branch flips
/// the decision in place and a failed frame undoes its propagations
/// before returning. Pure-literal elimination optionally runs once
/// before the recursion starts.
///
/// # Example
/// ```
/// use resolute::{DpllSolver, Solver, SolverOptions, CNF};
///
/// let solver = DpllSolver::new(SolverOptions::default());
/// let verdict = solver.solve(&CNF::from_dimacs("p cnf 1 1\n1 0\n").unwrap());
/// assert!(verdict.is_sat());
/// ```
pub struct DpllSolver {
    options: SolverOptions,
    steps: Mutex<Vec<StepRecord>>,
}

impl DpllSolver {
    pub fn new(options: SolverOptions) -> DpllSolver {
        DpllSolver {
            options,
            steps: Mutex::new(Vec::new()),
        }
    }

    /// The step records of the most recent [`Solver::solve`] call.
    /// Empty unless logging was enabled in the options.
    pub fn decision_steps(&self) -> Vec<StepRecord> {
        self.steps.lock().unwrap().clone()
    }

    fn run<S: SatState>(&self, state: S) -> SATSolution {
        let mut run = DpllRun {
            state,
            decision_level: 0,
            logger: StepLogger::new(self.options.use_logger),
            options: &self.options,
        };

        if self.options.use_pure_literal {
            run.eliminate_pure_literals();
        }
        let satisfiable = run.dpll();
        log::debug!(
            "dpll finished: {}",
            if satisfiable { "SAT" } else { "UNSAT" }
        );

        let solution = if satisfiable {
            SATSolution::Satisfiable(run.state.valuation())
        } else {
            SATSolution::Unsatisfiable
        };
        *self.steps.lock().unwrap() = run.logger.into_steps();
        solution
    }
}

impl Solver for DpllSolver {
    fn solve(&self, formula: &CNF) -> SATSolution {
        match self.options.watch_mode {
            WatchMode::Plain => self.run(PlainState::new(formula)),
            WatchMode::Twl => self.run(TwlState::new(formula)),
            WatchMode::TrueTwl => self.run(TrueTwlState::new(formula)),
        }
    }
}

struct DpllRun<'a, S> {
    state: S,
    decision_level: usize,
    logger: StepLogger,
    options: &'a SolverOptions,
}

impl<'a, S: SatState> DpllRun<'a, S> {
    /// Assigns pure literals until a pass changes nothing.
    fn eliminate_pure_literals(&mut self) {
        loop {
            let assigned = pure_literal_pass(&mut self.state);
            if assigned.is_empty() {
                break;
            }
            log::debug!("pure literal elimination assigned {:?}", assigned);
            let explanation = format!(
                "PLE {}",
                assigned.iter().map(|lit| lit.to_i32()).join(", ")
            );
            self.logger
                .log_step(&self.state, self.decision_level, None, None, explanation);
        }
    }

    fn dpll(&mut self) -> bool {
        if self.state.is_satisfied() {
            return true;
        }
        if self.state.is_unsatisfiable() {
            return false;
        }

        let (outcome, propagated) = self.propagate_units();
        if let Some(verdict) = outcome {
            return verdict;
        }

        let decision = match self.options.heuristic.pick_literal(&self.state) {
            Some(literal) => literal,
            // no unresolved literal left; unsatisfied clauses decide
            None => return self.state.is_satisfied(),
        };
        self.decision_level += 1;

        self.state.assign(decision);
        self.log_decision(decision);
        if self.dpll() {
            return true;
        }

        self.state.flip(-decision);
        self.log_decision(-decision);
        if self.dpll() {
            return true;
        }

        self.state.unassign(-decision);
        for literal in propagated {
            self.state.unassign(literal);
        }
        self.decision_level -= 1;
        false
    }

    /// Saturates unit propagation. `Some(verdict)` short-circuits the
    /// frame; on a conflict every propagation of this frame is undone
    /// before returning.
    fn propagate_units(&mut self) -> (Option<bool>, Vec<CNFVar>) {
        let mut propagated: Vec<CNFVar> = Vec::new();
        loop {
            let clause = match self.state.unitary().iter().next() {
                Some(&clause) => clause,
                None => return (None, propagated),
            };
            let implied = self.state.find_unit_literal(clause);
            self.state.assign(implied);
            propagated.push(implied);
            self.logger.log_step(
                &self.state,
                self.decision_level,
                None,
                Some(implied),
                format!("BCP {}", clause),
            );

            if self.state.is_satisfied() {
                return (Some(true), propagated);
            }
            if self.state.is_unsatisfiable() {
                for &literal in &propagated {
                    self.state.unassign(literal);
                }
                return (Some(false), Vec::new());
            }
        }
    }

    fn log_decision(&mut self, decision: CNFVar) {
        self.logger.log_step(
            &self.state,
            self.decision_level,
            Some(decision),
            None,
            format!("INC_DL {}", self.options.heuristic_label()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching_strategy::Heuristic;

    fn formula(clauses: &[&[i32]]) -> CNF {
        clauses
            .iter()
            .map(|clause| clause.iter().map(|&lit| CNFVar::from_i32(lit)).collect())
            .collect()
    }

    fn is_model(formula: &CNF, valuation: &[bool]) -> bool {
        formula.clauses.iter().all(|clause| {
            clause
                .vars
                .iter()
                .any(|lit| valuation[lit.id - 1] == lit.sign)
        })
    }

    fn all_watch_modes() -> Vec<WatchMode> {
        vec![WatchMode::Plain, WatchMode::Twl, WatchMode::TrueTwl]
    }

    #[test]
    fn propagation_chain_with_conflict_backtracking_is_sat() {
        let cnf = formula(&[
            &[1, 2],
            &[-1, 2],
            &[-1, -2, 3, 4],
            &[-1, -2, 3, -4],
            &[-1, -2, -3, 4],
            &[-1, -2, -3, -4],
        ]);
        for watch_mode in all_watch_modes() {
            let solver =
                DpllSolver::new(SolverOptions::default().watch_mode(watch_mode));
            match solver.solve(&cnf) {
                SATSolution::Satisfiable(valuation) => {
                    assert!(is_model(&cnf, &valuation), "{:?}", watch_mode)
                }
                other => panic!("expected SAT under {:?}, got {:?}", watch_mode, other),
            }
        }
    }

    #[test]
    fn pure_literal_elimination_solves_without_deciding() {
        let cnf = formula(&[&[1, 3], &[-2, 3], &[2, 4], &[-4]]);
        let solver = DpllSolver::new(
            SolverOptions::default().pure_literal(true).logger(true),
        );
        assert!(solver.solve(&cnf).is_sat());

        let steps = solver.decision_steps();
        assert!(steps.iter().any(|step| step.explanation.starts_with("PLE")));
        // with 1 and 3 pure, no INC_DL decision is ever needed
        assert!(steps
            .iter()
            .all(|step| !step.explanation.starts_with("INC_DL")));
    }

    #[test]
    fn blocked_two_variable_formula_is_unsat() {
        let cnf = formula(&[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]);
        for watch_mode in all_watch_modes() {
            for heuristic in vec![Heuristic::Default, Heuristic::Dlcs, Heuristic::Moms(1)] {
                let solver = DpllSolver::new(
                    SolverOptions::default()
                        .watch_mode(watch_mode)
                        .heuristic(heuristic),
                );
                assert!(
                    solver.solve(&cnf).is_unsat(),
                    "{:?}/{:?}",
                    watch_mode,
                    heuristic
                );
            }
        }
    }

    #[test]
    fn contradicting_units_are_unsat_without_decisions() {
        let cnf = formula(&[&[1], &[-1]]);
        for watch_mode in all_watch_modes() {
            let solver =
                DpllSolver::new(SolverOptions::default().watch_mode(watch_mode).logger(true));
            assert!(solver.solve(&cnf).is_unsat());
            assert!(solver
                .decision_steps()
                .iter()
                .all(|step| !step.explanation.starts_with("INC_DL")));
        }
    }

    #[test]
    fn unit_chain_solves_scenario_five() {
        let cnf = formula(&[
            &[4, -3, 1],
            &[2, 1, 3],
            &[-4, -3],
            &[3, -1],
            &[-4, 2, 3],
            &[4],
        ]);
        for watch_mode in all_watch_modes() {
            let solver =
                DpllSolver::new(SolverOptions::default().watch_mode(watch_mode).logger(true));
            match solver.solve(&cnf) {
                SATSolution::Satisfiable(valuation) => {
                    assert!(is_model(&cnf, &valuation), "{:?}", watch_mode)
                }
                other => panic!("expected SAT under {:?}, got {:?}", watch_mode, other),
            }
            // the first propagation is forced by the unit clause 5
            let steps = solver.decision_steps();
            assert_eq!(steps[0].explanation, "BCP 5");
            assert_eq!(steps[0].implied_literal, Some(4));
        }
    }

    #[test]
    fn bcp_logs_carry_the_affected_clause_index() {
        let cnf = formula(&[&[1, 2], &[-1]]);
        let solver = DpllSolver::new(SolverOptions::default().logger(true));
        assert!(solver.solve(&cnf).is_sat());

        let steps = solver.decision_steps();
        assert_eq!(steps[0].explanation, "BCP 1");
        assert_eq!(steps[0].implied_literal, Some(-1));
        assert_eq!(steps[1].explanation, "BCP 0");
        assert_eq!(steps[1].implied_literal, Some(2));
    }

    #[test]
    fn heuristic_names_show_up_in_decision_logs() {
        let cnf = formula(&[&[1, 2], &[-1, 2], &[1, -2]]);
        let solver = DpllSolver::new(
            SolverOptions::default()
                .heuristic(Heuristic::Dlcs)
                .watch_mode(WatchMode::Twl)
                .logger(true),
        );
        assert!(solver.solve(&cnf).is_sat());
        assert!(solver
            .decision_steps()
            .iter()
            .any(|step| step.explanation == "INC_DL dlcs twl"));
    }

    #[test]
    fn every_heuristic_agrees_on_a_small_instance() {
        let cnf = formula(&[&[1, 2, 3], &[-1, -2], &[-2, -3], &[-1, -3], &[2, 3]]);
        let heuristics = vec![
            Heuristic::Default,
            Heuristic::Dlcs,
            Heuristic::Dlis,
            Heuristic::Rdlcs,
            Heuristic::Rdlis,
            Heuristic::Moms(0),
            Heuristic::Moms(2),
            Heuristic::Rmoms(1),
        ];
        for heuristic in heuristics {
            let solver = DpllSolver::new(SolverOptions::default().heuristic(heuristic));
            match solver.solve(&cnf) {
                SATSolution::Satisfiable(valuation) => {
                    assert!(is_model(&cnf, &valuation), "{:?}", heuristic)
                }
                other => panic!("expected SAT under {:?}, got {:?}", heuristic, other),
            }
        }
    }
}
