use std::sync::Mutex;

use async_std::task::yield_now;

use crate::cnf::{CNFClause, CNFVar, CNF};
use crate::config::{SolverOptions, WatchMode};
use crate::logging::{GraphRecord, GraphStepLogger, StepLogger, StepRecord};
use crate::sat_solution::SATSolution;
use crate::sat_solver::Solver;
use crate::solvers::InterruptibleSolver;
use crate::state::{PlainState, SatState, TrueTwlState, TwlState};

use super::analysis::analyze_conflict;
use super::graph::{GraphNode, ImplicationGraph};

/// Iterative CDCL engine.
///
/// The loop propagates to saturation, analyzes any conflict into a 1-UIP
/// clause, backjumps non-chronologically and adds the learned clause,
/// which is unit at the target level and drives the next propagation.
/// Decisions only happen on a conflict-free, unsaturated state.
pub struct CdclSolver {
    options: SolverOptions,
    steps: Mutex<Vec<StepRecord>>,
    graph_steps: Mutex<Vec<GraphRecord>>,
    learned: Mutex<Vec<CNFClause>>,
}

impl CdclSolver {
    pub fn new(options: SolverOptions) -> CdclSolver {
        CdclSolver {
            options,
            steps: Mutex::new(Vec::new()),
            graph_steps: Mutex::new(Vec::new()),
            learned: Mutex::new(Vec::new()),
        }
    }

    /// The step records of the most recent [`Solver::solve`] call.
    pub fn decision_steps(&self) -> Vec<StepRecord> {
        self.steps.lock().unwrap().clone()
    }

    /// The implication-graph records of the most recent solve.
    pub fn graph_steps(&self) -> Vec<GraphRecord> {
        self.graph_steps.lock().unwrap().clone()
    }

    /// The clauses learned during the most recent solve.
    pub fn learned_clauses(&self) -> Vec<CNFClause> {
        self.learned.lock().unwrap().clone()
    }

    fn run<S: SatState>(&self, state: S) -> SATSolution {
        let mut run = CdclRun::new(state, &self.options);
        let satisfiable = loop {
            if let Some(verdict) = run.step() {
                break verdict;
            }
        };
        self.finish(run, satisfiable)
    }

    async fn run_interruptible<S: SatState>(&self, state: S) -> SATSolution {
        let mut run = CdclRun::new(state, &self.options);
        let satisfiable = loop {
            if let Some(verdict) = run.step() {
                break verdict;
            }
            yield_now().await;
        };
        self.finish(run, satisfiable)
    }

    fn finish<S: SatState>(&self, run: CdclRun<S>, satisfiable: bool) -> SATSolution {
        log::debug!(
            "cdcl finished: {} after learning {} clauses",
            if satisfiable { "SAT" } else { "UNSAT" },
            run.learned_clauses.len()
        );
        let solution = if satisfiable {
            SATSolution::Satisfiable(run.state.valuation())
        } else {
            SATSolution::Unsatisfiable
        };
        *self.steps.lock().unwrap() = run.logger.into_steps();
        *self.graph_steps.lock().unwrap() = run.graph_logger.into_steps();
        *self.learned.lock().unwrap() = run.learned_clauses;
        solution
    }
}

impl Solver for CdclSolver {
    fn solve(&self, formula: &CNF) -> SATSolution {
        match self.options.watch_mode {
            WatchMode::Plain => self.run(PlainState::new(formula)),
            WatchMode::Twl => self.run(TwlState::new(formula)),
            WatchMode::TrueTwl => self.run(TrueTwlState::new(formula)),
        }
    }
}

#[async_trait::async_trait]
impl InterruptibleSolver for CdclSolver {
    async fn solve_interruptible(&self, formula: &CNF) -> SATSolution {
        match self.options.watch_mode {
            WatchMode::Plain => self.run_interruptible(PlainState::new(formula)).await,
            WatchMode::Twl => self.run_interruptible(TwlState::new(formula)).await,
            WatchMode::TrueTwl => self.run_interruptible(TrueTwlState::new(formula)).await,
        }
    }
}

struct CdclRun<'a, S> {
    state: S,
    decision_level: usize,
    graph: ImplicationGraph,
    learned_clauses: Vec<CNFClause>,
    logger: StepLogger,
    graph_logger: GraphStepLogger,
    options: &'a SolverOptions,
}

impl<'a, S: SatState> CdclRun<'a, S> {
    fn new(state: S, options: &'a SolverOptions) -> CdclRun<'a, S> {
        CdclRun {
            state,
            decision_level: 0,
            graph: ImplicationGraph::new(),
            learned_clauses: Vec::new(),
            logger: StepLogger::new(options.use_logger),
            graph_logger: GraphStepLogger::new(options.use_logger),
            options,
        }
    }

    /// One iteration of the outer loop; `Some(verdict)` terminates it.
    fn step(&mut self) -> Option<bool> {
        if let Some(conflict) = self.propagate() {
            if self.decision_level == 0 {
                return Some(false);
            }
            let (learned, backjump_level) =
                analyze_conflict(&self.state, &self.graph, self.decision_level, &conflict);
            log::debug!(
                "conflict at level {}: learned {:?}, backjumping to {}",
                self.decision_level,
                learned.vars,
                backjump_level
            );
            self.graph_logger.log_step(
                self.decision_level,
                None,
                None,
                None,
                Some(learned.vars.iter().map(|lit| lit.to_i32()).collect()),
                Some(backjump_level),
                self.options.cutting_method.name(),
            );

            self.learned_clauses.push(learned.clone());
            self.backjump(backjump_level);
            self.state.add_clause(&learned);
            None
        } else if self.state.is_satisfied() {
            Some(true)
        } else {
            match self.options.heuristic.pick_literal(&self.state) {
                Some(decision) => {
                    self.decide(decision);
                    None
                }
                // nothing left to branch on, unsatisfied clauses decide
                None => Some(self.state.is_satisfied()),
            }
        }
    }

    /// Saturates unit propagation, recording every implication in the
    /// graph. Returns the literals of the contradicted clause on conflict.
    fn propagate(&mut self) -> Option<Vec<CNFVar>> {
        loop {
            let clause = match self.state.unitary().iter().next() {
                Some(&clause) => clause,
                None => return None,
            };
            let implied = self.state.find_unit_literal(clause);
            self.state.assign(implied);
            self.graph.insert(
                implied,
                GraphNode {
                    decision_level: self.decision_level,
                    antecedent: Some(clause),
                },
            );
            self.logger.log_step(
                &self.state,
                self.decision_level,
                None,
                Some(implied),
                format!("BCP {}", clause),
            );
            self.graph_logger.log_step(
                self.decision_level,
                None,
                Some(implied),
                self.graph.record_of(implied),
                None,
                None,
                self.options.cutting_method.name(),
            );

            if self.state.is_unsatisfiable() {
                let conflict = *self
                    .state
                    .contradicted()
                    .iter()
                    .next()
                    .expect("unsatisfiable state has no contradicted clause");
                return Some(self.state.full_clause(conflict).to_vec());
            }
        }
    }

    fn decide(&mut self, decision: CNFVar) {
        self.decision_level += 1;
        self.state.assign(decision);
        self.graph.insert(
            decision,
            GraphNode {
                decision_level: self.decision_level,
                antecedent: None,
            },
        );
        self.logger.log_step(
            &self.state,
            self.decision_level,
            Some(decision),
            None,
            format!("INC_DL {}", self.options.heuristic_label()),
        );
        self.graph_logger.log_step(
            self.decision_level,
            Some(decision),
            None,
            self.graph.record_of(decision),
            None,
            None,
            self.options.cutting_method.name(),
        );
    }

    /// Removes every graph entry above `level` and undoes its assignment.
    fn backjump(&mut self, level: usize) {
        for literal in self.graph.drain_above(level) {
            if self.state.is_assigned(literal.id) {
                self.state.unassign(literal);
            }
        }
        self.decision_level = level;
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
    fn contradicting_units_are_unsat_at_level_zero() {
        let cnf = formula(&[&[1], &[-1]]);
        for watch_mode in all_watch_modes() {
            let solver = CdclSolver::new(SolverOptions::default().watch_mode(watch_mode));
            assert!(solver.solve(&cnf).is_unsat(), "{:?}", watch_mode);
        }
    }

    #[test]
    fn blocked_two_variable_formula_is_unsat() {
        let cnf = formula(&[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]);
        for watch_mode in all_watch_modes() {
            let solver = CdclSolver::new(SolverOptions::default().watch_mode(watch_mode));
            assert!(solver.solve(&cnf).is_unsat(), "{:?}", watch_mode);
        }
    }

    #[test]
    fn propagation_chain_instance_is_sat_in_every_mode() {
        let cnf = formula(&[
            &[1, 2],
            &[-1, 2],
            &[-1, -2, 3, 4],
            &[-1, -2, 3, -4],
            &[-1, -2, -3, 4],
            &[-1, -2, -3, -4],
        ]);
        for watch_mode in all_watch_modes() {
            for heuristic in vec![Heuristic::Default, Heuristic::Dlis, Heuristic::Moms(0)] {
                let solver = CdclSolver::new(
                    SolverOptions::default()
                        .watch_mode(watch_mode)
                        .heuristic(heuristic),
                );
                match solver.solve(&cnf) {
                    SATSolution::Satisfiable(valuation) => {
                        assert!(is_model(&cnf, &valuation), "{:?}/{:?}", watch_mode, heuristic)
                    }
                    other => panic!(
                        "expected SAT under {:?}/{:?}, got {:?}",
                        watch_mode, heuristic, other
                    ),
                }
            }
        }
    }

    /// Cross-level conflict: decisions 6 and 1, the conflict on [-2,-3]
    /// learns {-1,-6}, backjumps to level 1 and immediately propagates
    /// the asserting literal -1 with the learned clause as antecedent.
    #[test]
    fn learned_clause_asserts_after_backjump() {
        let cnf = formula(&[&[6, 7], &[-1, 2], &[-1, -6, 3], &[-2, -3]]);
        let solver = CdclSolver::new(SolverOptions::default().logger(true));
        let solution = solver.solve(&cnf);

        match solution {
            SATSolution::Satisfiable(valuation) => assert!(is_model(&cnf, &valuation)),
            other => panic!("expected SAT, got {:?}", other),
        }

        let learned = solver.learned_clauses();
        assert_eq!(learned.len(), 1);
        assert_eq!(
            learned[0].vars,
            vec![CNFVar::neg(1), CNFVar::neg(6)]
        );

        let graph_steps = solver.graph_steps();
        let analysis = graph_steps
            .iter()
            .find(|step| step.learned_clause.is_some())
            .expect("no analysis record logged");
        assert_eq!(analysis.learned_clause, Some(vec![-1, -6]));
        assert_eq!(analysis.backtrack_level, Some(1));
        assert_eq!(analysis.cut_method, "1UIP");

        // exactly one learned literal was falsified at the conflict level
        let asserting_record = graph_steps
            .iter()
            .find(|step| step.implied_literal == Some(-1))
            .expect("asserting literal never propagated");
        assert_eq!(asserting_record.decision_level, 1);
        let node = asserting_record.last_node.expect("missing graph node");
        assert_eq!(node.decision_level, 1);
        assert_eq!(node.antecedent, Some(4));
    }

    #[test]
    fn learned_clauses_accumulate_on_unsat_instances() {
        let cnf = formula(&[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]);
        let solver = CdclSolver::new(SolverOptions::default());
        assert!(solver.solve(&cnf).is_unsat());
        assert!(!solver.learned_clauses().is_empty());
    }

    #[test]
    fn interruptible_solve_reaches_the_same_verdict() {
        let cnf = formula(&[&[1, 2], &[-1, 2], &[-2, 3], &[-3, -1]]);
        let solver = CdclSolver::new(SolverOptions::default());
        let blocking = solver.solve(&cnf).is_sat();
        let interruptible =
            async_std::task::block_on(solver.solve_interruptible(&cnf)).is_sat();
        assert_eq!(blocking, interruptible);
    }
}
