//! A CNF satisfiability library with two engines: a recursive DPLL
//! solver and an iterative CDCL solver with 1-UIP clause learning and
//! non-chronological backjumping. Both run on a shared, counter-based
//! CNF state that comes in three variants (plain, TWL, TrueTWL).

/// Branching heuristics one can choose from to customize the engines.
mod branching_strategy;
/// Exhaustive reference solver used by tests and the CLI.
pub mod bruteforce;
/// Conflict-driven clause learning engine.
mod cdcl;
/// The CNF representation of a formula, including the DIMACS reader.
pub mod cnf;
/// Engine options shared by DPLL and CDCL.
mod config;
/// The recursive DPLL engine.
mod dpll;
/// The error taxonomy of the library.
mod error;
/// Step and implication-graph logging.
pub mod logging;
/// Pure literal elimination.
pub mod preprocessing;
/// Module that specifies the output of a solver.
mod sat_solution;
/// The Solver trait which has to be implemented by each solver.
pub mod sat_solver;
/// Additional solver wrappers: timed and time-limited solving.
pub mod solvers;
/// The CNF bookkeeping state variants.
pub mod state;
mod util;

pub use branching_strategy::Heuristic;
pub use bruteforce::Bruteforce;
pub use cdcl::{CdclSolver, GraphNode, ImplicationGraph};
pub use cnf::{CNFClause, CNFVar, VarId, CNF};
pub use config::{CuttingMethod, SolverOptions, WatchMode};
pub use dpll::DpllSolver;
pub use error::SolverError;
pub use logging::{GraphRecord, StepRecord};
pub use sat_solution::{SATSolution, Valuation};
pub use sat_solver::Solver;
pub use state::{PlainState, SatState, TrueTwlState, TwlState};
