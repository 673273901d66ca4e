use std::collections::BTreeSet;

use crate::cnf::{CNFClause, CNFVar, CNF};
use crate::error::SolverError;
use crate::util::HashMap;

use super::{
    build_occurrence_index, push_occurrence, remove_occurrence, Assignments, SatState,
};

/// Two-Watched-Literals state.
///
/// Keeps the plain bookkeeping, but `num_unassigned` only counts the up to
/// two watched literals of each clause. When an assignment falsifies a
/// watched literal the clause tries to re-watch an unassigned literal of
/// the original clause instead of decrementing. A clause still counts as
/// satisfied through *any* true literal; see [`super::TrueTwlState`] for
/// the stricter rule.
#[derive(Debug, Clone)]
pub struct TwlState {
    original_clauses: Vec<Vec<CNFVar>>,
    watched: Vec<Vec<CNFVar>>,
    num_variables: usize,
    assignments: Assignments,
    satisfaction_map: Vec<bool>,
    num_satisfying: Vec<usize>,
    num_unassigned: Vec<usize>,
    clauses_by_literal: HashMap<CNFVar, Vec<usize>>,
    clauses_by_watched_literal: HashMap<CNFVar, Vec<usize>>,
    contradicted: BTreeSet<usize>,
    unitary: BTreeSet<usize>,
}

impl TwlState {
    pub fn new(formula: &CNF) -> TwlState {
        let original_clauses: Vec<Vec<CNFVar>> = formula
            .clauses
            .iter()
            .map(|clause| clause.vars.clone())
            .collect();
        let watched: Vec<Vec<CNFVar>> = original_clauses
            .iter()
            .map(|clause| clause.iter().take(2).copied().collect())
            .collect();
        let clauses_by_literal = build_occurrence_index(&original_clauses);
        let clauses_by_watched_literal = build_occurrence_index(&watched);
        let satisfaction_map = vec![false; original_clauses.len()];
        let num_satisfying = vec![0; original_clauses.len()];
        let num_unassigned: Vec<usize> = watched.iter().map(Vec::len).collect();
        let unitary = watched
            .iter()
            .enumerate()
            .filter(|(_, watched)| watched.len() == 1)
            .map(|(i, _)| i)
            .collect();

        TwlState {
            original_clauses,
            watched,
            num_variables: formula.num_variables.max(formula.max_variable_id()),
            assignments: Assignments::default(),
            satisfaction_map,
            num_satisfying,
            num_unassigned,
            clauses_by_literal,
            clauses_by_watched_literal,
            contradicted: BTreeSet::new(),
            unitary,
        }
    }

    fn occurrences(&self, literal: CNFVar) -> Vec<usize> {
        self.clauses_by_literal
            .get(&literal)
            .cloned()
            .unwrap_or_default()
    }

    // snapshot; re-watching moves entries of this very list
    fn watched_occurrences(&self, literal: CNFVar) -> Vec<usize> {
        self.clauses_by_watched_literal
            .get(&literal)
            .cloned()
            .unwrap_or_default()
    }

    /// Swaps the falsified watch `-assigned` of `clause` for an unassigned
    /// literal of the original clause. Returns false when no replacement
    /// exists, in which case the caller treats the watched clause as
    /// having shrunk.
    fn try_rewatch(&mut self, clause: usize, assigned: CNFVar) -> bool {
        if self.satisfaction_map[clause] {
            return false;
        }
        for i in 0..self.original_clauses[clause].len() {
            let candidate = self.original_clauses[clause][i];
            if self.watched[clause].contains(&candidate) {
                continue;
            }
            if !self.is_assigned(candidate.id) {
                let old = -assigned;
                if let Some(position) = self.watched[clause].iter().position(|&w| w == old) {
                    self.watched[clause].remove(position);
                }
                remove_occurrence(&mut self.clauses_by_watched_literal, old, clause);
                push_occurrence(&mut self.clauses_by_watched_literal, candidate, clause);
                self.watched[clause].push(candidate);
                return true;
            }
        }
        false
    }

    fn replay_on_clause(&mut self, clause: usize, assigned: CNFVar) {
        if self.original_clauses[clause].contains(&assigned) {
            self.satisfaction_map[clause] = true;
            self.num_satisfying[clause] += 1;
            if self.watched[clause].contains(&assigned) {
                self.num_unassigned[clause] -= 1;
            }
            self.unitary.remove(&clause);
            self.contradicted.remove(&clause);
        }
        if self.watched[clause].contains(&-assigned) && !self.try_rewatch(clause, assigned) {
            self.num_unassigned[clause] -= 1;
            if !self.satisfaction_map[clause] {
                match self.num_unassigned[clause] {
                    0 => {
                        self.unitary.remove(&clause);
                        self.contradicted.insert(clause);
                    }
                    1 => {
                        self.unitary.insert(clause);
                    }
                    _ => {}
                }
            }
        }
    }
}

impl SatState for TwlState {
    fn assign(&mut self, literal: CNFVar) {
        let previous = self.assignments.insert(literal.id, literal.sign);
        assert!(
            previous.is_none(),
            "variable {} is already assigned",
            literal.id
        );

        for clause in self.occurrences(literal) {
            self.satisfaction_map[clause] = true;
            self.num_satisfying[clause] += 1;
            if self.watched[clause].contains(&literal) {
                self.num_unassigned[clause] -= 1;
            }
            self.unitary.remove(&clause);
            self.contradicted.remove(&clause);
        }
        for clause in self.watched_occurrences(-literal) {
            if !self.try_rewatch(clause, literal) {
                self.num_unassigned[clause] -= 1;
                if !self.satisfaction_map[clause] {
                    match self.num_unassigned[clause] {
                        0 => {
                            self.unitary.remove(&clause);
                            self.contradicted.insert(clause);
                        }
                        1 => {
                            self.unitary.insert(clause);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn unassign(&mut self, literal: CNFVar) {
        let removed = self.assignments.shift_remove(&literal.id);
        assert_eq!(
            removed,
            Some(literal.sign),
            "variable {} was not assigned so that {} holds",
            literal.id,
            literal
        );

        for clause in self.occurrences(literal) {
            if self.watched[clause].contains(&literal) {
                self.num_unassigned[clause] += 1;
            }
            self.num_satisfying[clause] -= 1;
            if self.num_satisfying[clause] == 0 {
                self.satisfaction_map[clause] = false;
                match self.num_unassigned[clause] {
                    0 => {
                        self.contradicted.insert(clause);
                    }
                    1 => {
                        self.unitary.insert(clause);
                    }
                    _ => {}
                }
            }
        }
        for clause in self.occurrences(-literal) {
            if self.watched[clause].contains(&-literal) {
                if self.contradicted.remove(&clause) {
                    self.unitary.insert(clause);
                }
                self.num_unassigned[clause] += 1;
                if self.num_unassigned[clause] > 1 {
                    self.unitary.remove(&clause);
                }
            }
        }
    }

    fn add_clause(&mut self, clause: &CNFClause) {
        let index = self.original_clauses.len();
        let watched: Vec<CNFVar> = clause.vars.iter().take(2).copied().collect();
        self.original_clauses.push(clause.vars.clone());
        self.satisfaction_map.push(false);
        self.num_satisfying.push(0);
        self.num_unassigned.push(watched.len());
        for &lit in &clause.vars {
            push_occurrence(&mut self.clauses_by_literal, lit, index);
            self.num_variables = self.num_variables.max(lit.id);
        }
        for &lit in &watched {
            push_occurrence(&mut self.clauses_by_watched_literal, lit, index);
        }
        if watched.len() == 1 {
            self.unitary.insert(index);
        }
        self.watched.push(watched);

        let trail: Vec<CNFVar> = self
            .assignments
            .iter()
            .map(|(&var, &value)| CNFVar::new(var, value))
            .collect();
        for assigned in trail {
            self.replay_on_clause(index, assigned);
        }
    }

    fn is_satisfied(&self) -> bool {
        self.satisfaction_map.iter().all(|&satisfied| satisfied)
    }

    fn unitary(&self) -> &BTreeSet<usize> {
        &self.unitary
    }

    fn contradicted(&self) -> &BTreeSet<usize> {
        &self.contradicted
    }

    fn clause_view(&self, index: usize) -> &[CNFVar] {
        &self.watched[index]
    }

    fn full_clause(&self, index: usize) -> &[CNFVar] {
        &self.original_clauses[index]
    }

    fn num_clauses(&self) -> usize {
        self.original_clauses.len()
    }

    fn num_variables(&self) -> usize {
        self.num_variables
    }

    fn is_clause_satisfied(&self, index: usize) -> bool {
        self.satisfaction_map[index]
    }

    fn num_unassigned(&self, index: usize) -> usize {
        self.num_unassigned[index]
    }

    fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    fn check_invariants(&self) -> Result<(), SolverError> {
        for (i, original) in self.original_clauses.iter().enumerate() {
            let satisfying = original
                .iter()
                .filter(|lit| self.value_of(**lit) == Some(true))
                .count();
            let unassigned_watched = self.watched[i]
                .iter()
                .filter(|lit| !self.is_assigned(lit.id))
                .count();

            if self.watched[i].len() > 2 {
                return Err(SolverError::InvariantViolation(format!(
                    "clause {} watches {} literals",
                    i,
                    self.watched[i].len()
                )));
            }
            if self.watched[i].iter().any(|lit| !original.contains(lit)) {
                return Err(SolverError::InvariantViolation(format!(
                    "clause {} watches a literal outside of the clause",
                    i
                )));
            }
            if self.satisfaction_map[i] != (satisfying > 0) {
                return Err(SolverError::InvariantViolation(format!(
                    "satisfaction_map[{}] is {} but {} literals satisfy the clause",
                    i, self.satisfaction_map[i], satisfying
                )));
            }
            if self.num_satisfying[i] != satisfying {
                return Err(SolverError::InvariantViolation(format!(
                    "num_satisfying[{}] is {} but should be {}",
                    i, self.num_satisfying[i], satisfying
                )));
            }
            if self.num_unassigned[i] != unassigned_watched {
                return Err(SolverError::InvariantViolation(format!(
                    "num_unassigned[{}] is {} but {} watched literals are unassigned",
                    i, self.num_unassigned[i], unassigned_watched
                )));
            }
            let should_be_unit = satisfying == 0 && unassigned_watched == 1;
            if self.unitary.contains(&i) != should_be_unit {
                return Err(SolverError::InvariantViolation(format!(
                    "unitary membership of clause {} is wrong",
                    i
                )));
            }
            let should_be_contradicted = satisfying == 0 && unassigned_watched == 0;
            if self.contradicted.contains(&i) != should_be_contradicted {
                return Err(SolverError::InvariantViolation(format!(
                    "contradicted membership of clause {} is wrong",
                    i
                )));
            }
            for watched in &self.watched[i] {
                let listed = self
                    .clauses_by_watched_literal
                    .get(watched)
                    .map(|list| list.contains(&i))
                    .unwrap_or(false);
                if !listed {
                    return Err(SolverError::InvariantViolation(format!(
                        "watch index is missing clause {} under literal {}",
                        i, watched
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(clauses: &[&[i32]]) -> CNF {
        clauses
            .iter()
            .map(|clause| clause.iter().map(|&lit| CNFVar::from_i32(lit)).collect())
            .collect()
    }

    #[test]
    fn watches_start_on_the_first_two_literals() {
        let state = TwlState::new(&formula(&[&[1, 2, 3], &[-1]]));
        assert_eq!(state.clause_view(0), &[CNFVar::pos(1), CNFVar::pos(2)]);
        assert_eq!(state.clause_view(1), &[CNFVar::neg(1)]);
        assert_eq!(state.unitary().iter().copied().collect::<Vec<_>>(), vec![1]);
        state.check_invariants().unwrap();
    }

    #[test]
    fn falsified_watch_moves_to_an_unassigned_literal() {
        let mut state = TwlState::new(&formula(&[&[1, 2, 3]]));
        state.assign(CNFVar::neg(1));

        assert_eq!(state.num_unassigned(0), 2);
        assert!(state.clause_view(0).contains(&CNFVar::pos(3)));
        assert!(!state.clause_view(0).contains(&CNFVar::pos(1)));
        assert!(state.unitary().is_empty());
        state.check_invariants().unwrap();
    }

    #[test]
    fn clause_becomes_unit_when_no_replacement_exists() {
        let mut state = TwlState::new(&formula(&[&[1, 2]]));
        state.assign(CNFVar::neg(1));

        assert_eq!(state.unitary().iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(state.find_unit_literal(0), CNFVar::pos(2));

        state.assign(CNFVar::neg(2));
        assert!(state.is_unsatisfiable());
        state.check_invariants().unwrap();
    }

    #[test]
    fn any_true_literal_satisfies_the_clause() {
        let mut state = TwlState::new(&formula(&[&[1, 2, 3], &[3, 4]]));
        // 3 is not watched in clause 0, yet the clause counts as satisfied
        state.assign(CNFVar::pos(3));
        assert!(state.is_clause_satisfied(0));
        assert!(state.is_satisfied());
        state.check_invariants().unwrap();
    }

    #[test]
    fn unassign_restores_unit_and_conflict_classification() {
        let mut state = TwlState::new(&formula(&[&[1, 2], &[-2, 1]]));
        state.assign(CNFVar::neg(1));
        state.assign(CNFVar::pos(2));
        // clause 1 watches -2 and 1, both false
        assert!(state.is_unsatisfiable());

        state.unassign(CNFVar::pos(2));
        assert!(!state.is_unsatisfiable());
        state.check_invariants().unwrap();

        state.unassign(CNFVar::neg(1));
        assert!(state.unitary().is_empty());
        state.check_invariants().unwrap();
    }

    #[test]
    fn added_clause_replays_the_current_assignment() {
        let mut state = TwlState::new(&formula(&[&[1, 2], &[-1, 2]]));
        state.assign(CNFVar::neg(2));

        let learned: CNFClause = [CNFVar::pos(2), CNFVar::neg(1), CNFVar::pos(3)]
            .iter()
            .copied()
            .collect();
        state.add_clause(&learned);

        // 2 is false, the clause re-watches 3 and stays binary
        assert_eq!(state.num_unassigned(2), 2);
        assert!(state.clause_view(2).contains(&CNFVar::pos(3)));
        state.check_invariants().unwrap();
    }
}
