use std::collections::BTreeSet;

use crate::cnf::{CNFClause, CNFVar, CNF};
use crate::error::SolverError;
use crate::util::HashMap;

use super::{build_occurrence_index, push_occurrence, Assignments, SatState};

/// Counter-based CNF state.
///
/// Per clause it tracks whether the clause is satisfied, how many assigned
/// literals satisfy it and how many of its literals are still unassigned.
/// Unit and contradicted clauses fall out of the counters and are kept in
/// ordered sets so the engines can pick them deterministically.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainState {
    clauses: Vec<Vec<CNFVar>>,
    num_variables: usize,
    assignments: Assignments,
    satisfaction_map: Vec<bool>,
    num_satisfying: Vec<usize>,
    num_unassigned: Vec<usize>,
    clauses_by_literal: HashMap<CNFVar, Vec<usize>>,
    contradicted: BTreeSet<usize>,
    unitary: BTreeSet<usize>,
}

impl PlainState {
    pub fn new(formula: &CNF) -> PlainState {
        let clauses: Vec<Vec<CNFVar>> = formula
            .clauses
            .iter()
            .map(|clause| clause.vars.clone())
            .collect();
        let clauses_by_literal = build_occurrence_index(&clauses);
        let satisfaction_map = vec![false; clauses.len()];
        let num_satisfying = vec![0; clauses.len()];
        let num_unassigned: Vec<usize> = clauses.iter().map(Vec::len).collect();
        let unitary = clauses
            .iter()
            .enumerate()
            .filter(|(_, clause)| clause.len() == 1)
            .map(|(i, _)| i)
            .collect();

        PlainState {
            clauses,
            num_variables: formula.num_variables.max(formula.max_variable_id()),
            assignments: Assignments::default(),
            satisfaction_map,
            num_satisfying,
            num_unassigned,
            clauses_by_literal,
            contradicted: BTreeSet::new(),
            unitary,
        }
    }

    // cloned so the loops below can mutate the per-clause fields
    fn occurrences(&self, literal: CNFVar) -> Vec<usize> {
        self.clauses_by_literal
            .get(&literal)
            .cloned()
            .unwrap_or_default()
    }

    /// Applies the effect of one already-assigned literal on a freshly
    /// added clause, leaving every other clause untouched.
    fn replay_on_clause(&mut self, clause: usize, assigned: CNFVar) {
        if self.clauses[clause].contains(&assigned) {
            self.num_satisfying[clause] += 1;
            self.satisfaction_map[clause] = true;
            self.num_unassigned[clause] -= 1;
            self.unitary.remove(&clause);
            self.contradicted.remove(&clause);
        }
        if self.clauses[clause].contains(&-assigned) {
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

impl SatState for PlainState {
    fn assign(&mut self, literal: CNFVar) {
        let previous = self.assignments.insert(literal.id, literal.sign);
        assert!(
            previous.is_none(),
            "variable {} is already assigned",
            literal.id
        );

        for clause in self.occurrences(literal) {
            self.num_satisfying[clause] += 1;
            self.satisfaction_map[clause] = true;
            self.num_unassigned[clause] -= 1;
            self.unitary.remove(&clause);
        }
        for clause in self.occurrences(-literal) {
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
            self.num_unassigned[clause] += 1;
            self.num_satisfying[clause] -= 1;
            if self.num_satisfying[clause] == 0 {
                self.satisfaction_map[clause] = false;
                if self.num_unassigned[clause] == 1 {
                    self.unitary.insert(clause);
                }
            }
        }
        for clause in self.occurrences(-literal) {
            if self.contradicted.remove(&clause) {
                self.unitary.insert(clause);
            }
            self.num_unassigned[clause] += 1;
            if self.num_unassigned[clause] > 1 {
                self.unitary.remove(&clause);
            }
        }
    }

    fn add_clause(&mut self, clause: &CNFClause) {
        let index = self.clauses.len();
        self.clauses.push(clause.vars.clone());
        self.satisfaction_map.push(false);
        self.num_satisfying.push(0);
        self.num_unassigned.push(clause.len());
        for &lit in &clause.vars {
            push_occurrence(&mut self.clauses_by_literal, lit, index);
            self.num_variables = self.num_variables.max(lit.id);
        }
        if clause.len() == 1 {
            self.unitary.insert(index);
        }

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
        &self.clauses[index]
    }

    fn full_clause(&self, index: usize) -> &[CNFVar] {
        &self.clauses[index]
    }

    fn num_clauses(&self) -> usize {
        self.clauses.len()
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
        for (i, clause) in self.clauses.iter().enumerate() {
            let satisfying = clause
                .iter()
                .filter(|lit| self.value_of(**lit) == Some(true))
                .count();
            let unassigned = clause
                .iter()
                .filter(|lit| !self.is_assigned(lit.id))
                .count();

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
            if self.num_unassigned[i] != unassigned {
                return Err(SolverError::InvariantViolation(format!(
                    "num_unassigned[{}] is {} but should be {}",
                    i, self.num_unassigned[i], unassigned
                )));
            }
            let should_be_unit = satisfying == 0 && unassigned == 1;
            if self.unitary.contains(&i) != should_be_unit {
                return Err(SolverError::InvariantViolation(format!(
                    "unitary membership of clause {} is wrong",
                    i
                )));
            }
            let should_be_contradicted = satisfying == 0 && unassigned == 0;
            if self.contradicted.contains(&i) != should_be_contradicted {
                return Err(SolverError::InvariantViolation(format!(
                    "contradicted membership of clause {} is wrong",
                    i
                )));
            }
        }
        Ok(())
    }
}
