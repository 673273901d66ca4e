use serde::Serialize;

use crate::cnf::CNFVar;
use crate::state::SatState;

/// One entry of the DPLL/CDCL decision table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepRecord {
    pub decision_level: usize,
    /// Partial assignment in insertion order, e.g. `{1, -2}`.
    pub partial_assignment: String,
    pub decision_literal: Option<i32>,
    pub implied_literal: Option<i32>,
    pub satisfied_clauses: Vec<usize>,
    pub contradicted_clauses: Vec<usize>,
    pub unit_clauses: Vec<usize>,
    pub pending_clauses: Vec<usize>,
    /// `"BCP <i>"`, `"INC_DL <heuristic>"` or `"PLE <lits>"`.
    pub explanation: String,
}

/// The implication-graph node attached to a CDCL log entry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GraphNodeRecord {
    #[serde(rename = "DL")]
    pub decision_level: usize,
    #[serde(rename = "Ante")]
    pub antecedent: Option<usize>,
}

/// One entry of the CDCL implication-graph log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphRecord {
    pub decision_level: usize,
    pub decision_literal: Option<i32>,
    pub implied_literal: Option<i32>,
    /// The graph node of the literal this entry is about.
    pub last_node: Option<GraphNodeRecord>,
    pub learned_clause: Option<Vec<i32>>,
    pub backtrack_level: Option<usize>,
    pub cut_method: String,
}

/// Collects [`StepRecord`]s while a solver runs. A disabled logger
/// swallows everything, so the engines can log unconditionally.
#[derive(Clone, Debug, Default)]
pub struct StepLogger {
    enabled: bool,
    steps: Vec<StepRecord>,
}

impl StepLogger {
    pub fn new(enabled: bool) -> StepLogger {
        StepLogger {
            enabled,
            steps: Vec::new(),
        }
    }

    pub fn log_step(
        &mut self,
        state: &impl SatState,
        decision_level: usize,
        decision_literal: Option<CNFVar>,
        implied_literal: Option<CNFVar>,
        explanation: String,
    ) {
        if !self.enabled {
            return;
        }

        let partial_assignment = format!(
            "{{{}}}",
            state
                .assignments()
                .iter()
                .map(|(&var, &value)| {
                    if value {
                        var.to_string()
                    } else {
                        format!("-{}", var)
                    }
                })
                .collect::<Vec<String>>()
                .join(", ")
        );

        let mut satisfied_clauses = Vec::new();
        let mut contradicted_clauses = Vec::new();
        let mut unit_clauses = Vec::new();
        let mut pending_clauses = Vec::new();
        for clause in 0..state.num_clauses() {
            if state.is_clause_satisfied(clause) {
                satisfied_clauses.push(clause);
            } else {
                match state.num_unassigned(clause) {
                    0 => contradicted_clauses.push(clause),
                    1 => unit_clauses.push(clause),
                    _ => pending_clauses.push(clause),
                }
            }
        }

        self.steps.push(StepRecord {
            decision_level,
            partial_assignment,
            decision_literal: decision_literal.map(|lit| lit.to_i32()),
            implied_literal: implied_literal.map(|lit| lit.to_i32()),
            satisfied_clauses,
            contradicted_clauses,
            unit_clauses,
            pending_clauses,
            explanation,
        });
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.steps)
    }

    /// Prints the decision table the same way the records are logged.
    pub fn print_steps(&self) {
        print_decision_table(&self.steps);
    }
}

/// Prints step records as the solver's decision table.
pub fn print_decision_table(steps: &[StepRecord]) {
    println!("\nDecision Table:");
    println!(
        "{:<3} {:<25} {:<5} {:<5} {:<25} {:<20} {:<25} {:<25} {:<20}",
        "DL", "Partial Assignment", "DLit", "IL", "Satisfied Clauses",
        "Contradicted Clauses", "Unit Clauses", "Pending Clauses", "Explanation"
    );
    for step in steps {
        println!(
            "{:<3} {:<25} {:<5} {:<5} {:<25} {:<20} {:<25} {:<25} {:<20}",
            step.decision_level,
            step.partial_assignment,
            format!("{:?}", step.decision_literal),
            format!("{:?}", step.implied_literal),
            format!("{:?}", step.satisfied_clauses),
            format!("{:?}", step.contradicted_clauses),
            format!("{:?}", step.unit_clauses),
            format!("{:?}", step.pending_clauses),
            step.explanation,
        );
    }
}

/// Prints graph records as the CDCL decision graph table.
pub fn print_graph_table(steps: &[GraphRecord]) {
    println!("\nDecision Graph:");
    println!(
        "{:<3} {:<5} {:<5} {:<30} {:<25} {:<20} {:<20}",
        "DL", "DLit", "IL", "Implication Graph", "Learned Clause", "Backtrack Level",
        "Cut Method"
    );
    for step in steps {
        println!(
            "{:<3} {:<5} {:<5} {:<30} {:<25} {:<20} {:<20}",
            step.decision_level,
            format!("{:?}", step.decision_literal),
            format!("{:?}", step.implied_literal),
            format!("{:?}", step.last_node),
            format!("{:?}", step.learned_clause),
            format!("{:?}", step.backtrack_level),
            step.cut_method,
        );
    }
}

/// Collects [`GraphRecord`]s during a CDCL run.
#[derive(Clone, Debug, Default)]
pub struct GraphStepLogger {
    enabled: bool,
    steps: Vec<GraphRecord>,
}

impl GraphStepLogger {
    pub fn new(enabled: bool) -> GraphStepLogger {
        GraphStepLogger {
            enabled,
            steps: Vec::new(),
        }
    }

    pub fn log_step(
        &mut self,
        decision_level: usize,
        decision_literal: Option<CNFVar>,
        implied_literal: Option<CNFVar>,
        last_node: Option<GraphNodeRecord>,
        learned_clause: Option<Vec<i32>>,
        backtrack_level: Option<usize>,
        cut_method: &str,
    ) {
        if !self.enabled {
            return;
        }
        self.steps.push(GraphRecord {
            decision_level,
            decision_literal: decision_literal.map(|lit| lit.to_i32()),
            implied_literal: implied_literal.map(|lit| lit.to_i32()),
            last_node,
            learned_clause,
            backtrack_level,
            cut_method: cut_method.to_string(),
        });
    }

    pub fn steps(&self) -> &[GraphRecord] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<GraphRecord> {
        self.steps
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.steps)
    }

    pub fn print_steps(&self) {
        print_graph_table(&self.steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::CNF;
    use crate::state::{PlainState, SatState};

    fn formula(clauses: &[&[i32]]) -> CNF {
        clauses
            .iter()
            .map(|clause| clause.iter().map(|&lit| CNFVar::from_i32(lit)).collect())
            .collect()
    }

    #[test]
    fn records_the_partial_assignment_in_insertion_order() {
        let mut state = PlainState::new(&formula(&[&[1, 2], &[-1, 3, 4], &[3, 5]]));
        let mut logger = StepLogger::new(true);

        state.assign(CNFVar::pos(1));
        state.assign(CNFVar::neg(3));
        logger.log_step(&state, 1, Some(CNFVar::pos(1)), None, "INC_DL default".into());

        let step = &logger.steps()[0];
        assert_eq!(step.partial_assignment, "{1, -3}");
        assert_eq!(step.decision_literal, Some(1));
        assert_eq!(step.satisfied_clauses, vec![0]);
        assert_eq!(step.unit_clauses, vec![1, 2]);
        assert!(step.pending_clauses.is_empty());
    }

    #[test]
    fn disabled_logger_stays_empty() {
        let state = PlainState::new(&formula(&[&[1]]));
        let mut logger = StepLogger::new(false);
        logger.log_step(&state, 0, None, None, "BCP 0".into());
        assert!(logger.steps().is_empty());
    }

    #[test]
    fn graph_records_serialize_with_short_node_names() {
        let mut logger = GraphStepLogger::new(true);
        logger.log_step(
            1,
            None,
            Some(CNFVar::pos(2)),
            Some(GraphNodeRecord {
                decision_level: 1,
                antecedent: Some(0),
            }),
            None,
            None,
            "1UIP",
        );
        let json = logger.to_json().unwrap();
        assert!(json.contains("\"DL\": 1"));
        assert!(json.contains("\"Ante\": 0"));
    }
}
