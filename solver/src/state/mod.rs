//! CNF bookkeeping state shared by both search engines.
//!
//! Three variants implement the same [`SatState`] contract: the plain
//! counter-based state, a Two-Watched-Literals state and a stricter
//! TrueTWL state where only watched literals can satisfy a clause. The
//! engines stay generic over the trait, so every engine/state combination
//! is available.

mod plain;
mod true_twl;
mod twl;

pub use plain::PlainState;
pub use true_twl::TrueTwlState;
pub use twl::TwlState;

use std::collections::BTreeSet;

use crate::cnf::{CNFClause, CNFVar, VarId};
use crate::error::SolverError;
use crate::util::{HashMap, IndexMap};

/// Partial assignment, ordered by insertion so the step log can print it
/// in chronological order.
pub type Assignments = IndexMap<VarId, bool>;

/// Common contract of the CNF state variants.
///
/// All mutators keep the bookkeeping sets consistent with their
/// definitions: `unitary` holds the indices of unsatisfied clauses with
/// exactly one unassigned (watched) literal, `contradicted` those with
/// none. Both are ordered so the engines always pick the smallest clause
/// index, which keeps step logs reproducible.
pub trait SatState {
    /// Assigns `literal` to true. The variable must be unassigned.
    fn assign(&mut self, literal: CNFVar);

    /// Reverts an assignment. The variable must currently be assigned to
    /// the value that made `literal` true.
    fn unassign(&mut self, literal: CNFVar);

    /// Replaces the assignment of `-literal` by `literal`.
    fn flip(&mut self, literal: CNFVar) {
        self.unassign(-literal);
        self.assign(literal);
    }

    /// Appends a clause and replays the current assignment on it, leaving
    /// the bookkeeping of every other clause untouched. Used by CDCL for
    /// learned clauses; the asserting literal is expected first so it
    /// becomes a watched literal.
    fn add_clause(&mut self, clause: &CNFClause);

    fn is_satisfied(&self) -> bool;

    fn is_unsatisfiable(&self) -> bool {
        !self.contradicted().is_empty()
    }

    fn unitary(&self) -> &BTreeSet<usize>;

    fn contradicted(&self) -> &BTreeSet<usize>;

    /// The literal list the engine scans for clause `index`: the full
    /// clause for the plain state, the currently watched literals for the
    /// watched variants.
    fn clause_view(&self, index: usize) -> &[CNFVar];

    /// The original literal list of clause `index`, independent of the
    /// watch bookkeeping. Conflict analysis resolves over these.
    fn full_clause(&self, index: usize) -> &[CNFVar];

    fn num_clauses(&self) -> usize;

    fn num_variables(&self) -> usize;

    fn is_clause_satisfied(&self, index: usize) -> bool;

    /// Number of unassigned literals in the engine's view of the clause.
    fn num_unassigned(&self, index: usize) -> usize;

    fn assignments(&self) -> &Assignments;

    fn is_assigned(&self, var: VarId) -> bool {
        self.assignments().contains_key(&var)
    }

    /// `Some(true)` iff the literal is assigned and evaluates to true.
    fn value_of(&self, literal: CNFVar) -> Option<bool> {
        self.assignments()
            .get(&literal.id)
            .map(|&value| value == literal.sign)
    }

    /// The single unassigned literal of a unit clause.
    fn find_unit_literal(&self, index: usize) -> CNFVar {
        *self
            .clause_view(index)
            .iter()
            .find(|lit| !self.is_assigned(lit.id))
            .expect("unit clause has no unassigned literal left")
    }

    /// Recomputes every bookkeeping field from scratch and compares it to
    /// the maintained one. Test support; any mismatch is a programmer bug.
    fn check_invariants(&self) -> Result<(), SolverError>;

    /// The model implied by the current assignment; unassigned variables
    /// default to false.
    fn valuation(&self) -> Vec<bool> {
        let len = self
            .assignments()
            .keys()
            .copied()
            .max()
            .unwrap_or(0)
            .max(self.num_variables());
        (1..=len)
            .map(|var| self.assignments().get(&var).copied().unwrap_or(false))
            .collect()
    }
}

/// Maps each literal to the indices of the clauses it appears in.
pub(crate) fn build_occurrence_index(clauses: &[Vec<CNFVar>]) -> HashMap<CNFVar, Vec<usize>> {
    let mut index: HashMap<CNFVar, Vec<usize>> = HashMap::default();
    for (i, clause) in clauses.iter().enumerate() {
        for &lit in clause {
            index.entry(lit).or_insert_with(Vec::new).push(i);
        }
    }
    index
}

/// Removes the first occurrence of `clause` from the occurrence list of
/// `literal`. Watch moves rely on this being a plain positional remove.
pub(crate) fn remove_occurrence(
    index: &mut HashMap<CNFVar, Vec<usize>>,
    literal: CNFVar,
    clause: usize,
) {
    if let Some(list) = index.get_mut(&literal) {
        if let Some(position) = list.iter().position(|&c| c == clause) {
            list.remove(position);
        }
    }
}

pub(crate) fn push_occurrence(
    index: &mut HashMap<CNFVar, Vec<usize>>,
    literal: CNFVar,
    clause: usize,
) {
    index.entry(literal).or_insert_with(Vec::new).push(clause);
}
