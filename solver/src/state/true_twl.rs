use std::collections::BTreeSet;

use crate::cnf::{CNFClause, CNFVar, CNF};
use crate::error::SolverError;
use crate::util::HashMap;

use super::{build_occurrence_index, push_occurrence, remove_occurrence, Assignments, SatState};

/// Strict Two-Watched-Literals state.
///
/// Unlike [`super::TwlState`] a clause only counts as satisfied once one of
/// its *watched* literals is assigned true; a true literal elsewhere in the
/// clause changes nothing until the re-watch scan adopts it. Consequently
/// the occurrence index is keyed by watched literals only.
#[derive(Debug, Clone)]
pub struct TrueTwlState {
    original_clauses: Vec<Vec<CNFVar>>,
    watched: Vec<Vec<CNFVar>>,
    num_variables: usize,
    assignments: Assignments,
    satisfaction_map: Vec<bool>,
    num_satisfying: Vec<usize>,
    num_unassigned: Vec<usize>,
    clauses_by_watched_literal: HashMap<CNFVar, Vec<usize>>,
    contradicted: BTreeSet<usize>,
    unitary: BTreeSet<usize>,
}

impl TrueTwlState {
    pub fn new(formula: &CNF) -> TrueTwlState {
        let original_clauses: Vec<Vec<CNFVar>> = formula
            .clauses
            .iter()
            .map(|clause| clause.vars.clone())
            .collect();
        let watched: Vec<Vec<CNFVar>> = original_clauses
            .iter()
            .map(|clause| clause.iter().take(2).copied().collect())
            .collect();
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

        TrueTwlState {
            original_clauses,
            watched,
            num_variables: formula.num_variables.max(formula.max_variable_id()),
            assignments: Assignments::default(),
            satisfaction_map,
            num_satisfying,
            num_unassigned,
            clauses_by_watched_literal,
            contradicted: BTreeSet::new(),
            unitary,
        }
    }

    // snapshot; re-watching moves entries of this very list
    fn watched_occurrences(&self, literal: CNFVar) -> Vec<usize> {
        self.clauses_by_watched_literal
            .get(&literal)
            .cloned()
            .unwrap_or_default()
    }

    fn swap_watch(&mut self, clause: usize, old: CNFVar, new: CNFVar) {
        if let Some(position) = self.watched[clause].iter().position(|&w| w == old) {
            self.watched[clause].remove(position);
        }
        remove_occurrence(&mut self.clauses_by_watched_literal, old, clause);
        push_occurrence(&mut self.clauses_by_watched_literal, new, clause);
        self.watched[clause].push(new);
    }

    /// Replaces the falsified watch `-assigned`. A candidate already
    /// assigned true is adopted as well and satisfies the clause on the
    /// spot. Returns true only when an unassigned replacement was found;
    /// on false the caller treats the watched clause as having shrunk.
    fn try_rewatch(&mut self, clause: usize, assigned: CNFVar) -> bool {
        if self.satisfaction_map[clause] {
            return false;
        }
        for i in 0..self.original_clauses[clause].len() {
            let candidate = self.original_clauses[clause][i];
            if self.watched[clause].contains(&candidate) {
                continue;
            }
            match self.assignments.get(&candidate.id) {
                Some(&value) if value == candidate.sign => {
                    self.num_satisfying[clause] += 1;
                    self.swap_watch(clause, -assigned, candidate);
                    self.satisfaction_map[clause] = true;
                    self.unitary.remove(&clause);
                    self.contradicted.remove(&clause);
                    return false;
                }
                None => {
                    self.swap_watch(clause, -assigned, candidate);
                    return true;
                }
                Some(_) => {}
            }
        }
        false
    }

    fn replay_on_clause(&mut self, clause: usize, assigned: CNFVar) {
        if self.watched[clause].contains(&assigned) {
            self.satisfaction_map[clause] = true;
            self.num_satisfying[clause] += 1;
            self.num_unassigned[clause] -= 1;
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

impl SatState for TrueTwlState {
    fn assign(&mut self, literal: CNFVar) {
        let previous = self.assignments.insert(literal.id, literal.sign);
        assert!(
            previous.is_none(),
            "variable {} is already assigned",
            literal.id
        );

        for clause in self.watched_occurrences(literal) {
            self.satisfaction_map[clause] = true;
            self.num_satisfying[clause] += 1;
            self.num_unassigned[clause] -= 1;
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

        for clause in self.watched_occurrences(literal) {
            self.num_unassigned[clause] += 1;
            self.num_satisfying[clause] -= 1;
            if self.num_satisfying[clause] == 0 {
                self.satisfaction_map[clause] = false;
                if self.num_unassigned[clause] == 1 {
                    self.unitary.insert(clause);
                }
            }
        }
        for clause in self.watched_occurrences(-literal) {
            if self.num_satisfying[clause] == 0 && !self.satisfaction_map[clause] {
                if self.contradicted.remove(&clause) {
                    self.unitary.insert(clause);
                }
            }
            self.num_unassigned[clause] += 1;
            if !self.satisfaction_map[clause]
                && self.unitary.contains(&clause)
                && self.num_unassigned[clause] > 1
            {
                self.unitary.remove(&clause);
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
            let watched_true = self.watched[i]
                .iter()
                .filter(|lit| self.value_of(**lit) == Some(true))
                .count();
            let watched_unassigned = self.watched[i]
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
            if self.satisfaction_map[i] != (watched_true > 0) {
                return Err(SolverError::InvariantViolation(format!(
                    "satisfaction_map[{}] is {} but {} watched literals are true",
                    i, self.satisfaction_map[i], watched_true
                )));
            }
            if self.num_satisfying[i] != watched_true {
                return Err(SolverError::InvariantViolation(format!(
                    "num_satisfying[{}] is {} but should be {}",
                    i, self.num_satisfying[i], watched_true
                )));
            }
            if self.num_unassigned[i] != watched_unassigned {
                return Err(SolverError::InvariantViolation(format!(
                    "num_unassigned[{}] is {} but {} watched literals are unassigned",
                    i, self.num_unassigned[i], watched_unassigned
                )));
            }
            let should_be_unit = watched_true == 0 && watched_unassigned == 1;
            if self.unitary.contains(&i) != should_be_unit {
                return Err(SolverError::InvariantViolation(format!(
                    "unitary membership of clause {} is wrong",
                    i
                )));
            }
            let should_be_contradicted = watched_true == 0 && watched_unassigned == 0;
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
