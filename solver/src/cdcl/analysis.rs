use std::collections::BTreeSet;

use tinyset::SetUsize;

use crate::cnf::{CNFClause, CNFVar};
use crate::state::SatState;

use super::graph::ImplicationGraph;

/// 1-UIP conflict analysis.
///
/// Starting from the contradicted clause, literals of the current decision
/// level are resolved against their antecedents until exactly one is left
/// (the asserting literal). The decision literal itself is never resolved;
/// when popped it is rotated to the bottom of the pending list. Variables
/// already resolved are not re-introduced by later antecedents.
///
/// Returns the learned clause with the asserting literal in front (so it
/// gets watched) and the backjump level: the deepest level among the
/// remaining literals, or 0 when the clause asserts alone.
pub(super) fn analyze_conflict<S: SatState>(
    state: &S,
    graph: &ImplicationGraph,
    decision_level: usize,
    conflict: &[CNFVar],
) -> (CNFClause, usize) {
    let mut learned: BTreeSet<CNFVar> = conflict.iter().copied().collect();
    let mut seen = SetUsize::new();
    let mut pending = current_level_literals(&learned, graph, decision_level);

    while pending.len() > 1 {
        let literal = pending.pop().expect("pending literals cannot be empty here");
        if graph.is_decision(-literal) {
            pending.insert(0, literal);
            continue;
        }

        let antecedent = graph
            .node(-literal)
            .and_then(|node| node.antecedent)
            .expect("propagated literal has no antecedent clause");
        for &lit in state.full_clause(antecedent) {
            if !seen.contains(lit.id) {
                learned.insert(lit);
            }
        }
        learned.remove(&literal);
        learned.remove(&-literal);
        seen.insert(literal.id);

        pending = current_level_literals(&learned, graph, decision_level);
    }

    let asserting = pending.first().copied();
    let backjump_level = learned
        .iter()
        .filter(|&&lit| Some(lit) != asserting)
        .filter_map(|&lit| graph.level_of(-lit))
        .max()
        .unwrap_or(0);

    let mut vars: Vec<CNFVar> = Vec::with_capacity(learned.len());
    if let Some(lit) = asserting {
        vars.push(lit);
    }
    vars.extend(learned.iter().copied().filter(|&lit| Some(lit) != asserting));

    (CNFClause { vars }, backjump_level)
}

fn current_level_literals(
    learned: &BTreeSet<CNFVar>,
    graph: &ImplicationGraph,
    decision_level: usize,
) -> Vec<CNFVar> {
    learned
        .iter()
        .filter(|&&lit| graph.level_of(-lit) == Some(decision_level))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::graph::GraphNode;
    use super::*;
    use crate::cnf::CNF;
    use crate::state::{PlainState, SatState};

    fn formula(clauses: &[&[i32]]) -> CNF {
        clauses
            .iter()
            .map(|clause| clause.iter().map(|&lit| CNFVar::from_i32(lit)).collect())
            .collect()
    }

    fn lit(value: i32) -> CNFVar {
        CNFVar::from_i32(value)
    }

    /// Decisions 6 then 1; propagation forces 2 and 3 until [-2, -3]
    /// becomes the conflict. The 1-UIP cut is {-1, -6} with backjump
    /// level 1.
    #[test]
    fn one_uip_cut_across_two_levels() {
        let cnf = formula(&[&[6, 7], &[-1, 2], &[-1, -6, 3], &[-2, -3]]);
        let mut state = PlainState::new(&cnf);
        let mut graph = ImplicationGraph::new();

        for (literal, level, antecedent) in vec![
            (lit(6), 1, None),
            (lit(1), 2, None),
            (lit(2), 2, Some(1)),
            (lit(3), 2, Some(2)),
        ] {
            state.assign(literal);
            graph.insert(
                literal,
                GraphNode {
                    decision_level: level,
                    antecedent,
                },
            );
        }
        assert!(state.is_unsatisfiable());

        let conflict: Vec<CNFVar> = state.full_clause(3).to_vec();
        let (learned, backjump_level) = analyze_conflict(&state, &graph, 2, &conflict);

        assert_eq!(learned.vars, vec![lit(-1), lit(-6)]);
        assert_eq!(backjump_level, 1);
    }

    /// A conflict caused purely by propagations of one level learns a
    /// unit clause and backjumps to level 0.
    #[test]
    fn single_level_conflict_learns_a_unit_clause() {
        let cnf = formula(&[&[-1, 2], &[-1, 3], &[-2, -3]]);
        let mut state = PlainState::new(&cnf);
        let mut graph = ImplicationGraph::new();

        for (literal, level, antecedent) in vec![
            (lit(1), 1, None),
            (lit(2), 1, Some(0)),
            (lit(3), 1, Some(1)),
        ] {
            state.assign(literal);
            graph.insert(
                literal,
                GraphNode {
                    decision_level: level,
                    antecedent,
                },
            );
        }
        assert!(state.is_unsatisfiable());

        let conflict: Vec<CNFVar> = state.full_clause(2).to_vec();
        let (learned, backjump_level) = analyze_conflict(&state, &graph, 1, &conflict);

        assert_eq!(learned.vars, vec![lit(-1)]);
        assert_eq!(backjump_level, 0);
    }

    /// The learned clause contains exactly one literal falsified at the
    /// current decision level.
    #[test]
    fn learned_clause_has_one_current_level_literal() {
        let cnf = formula(&[&[6, 7], &[-1, 2], &[-1, -6, 3], &[-2, -3]]);
        let mut state = PlainState::new(&cnf);
        let mut graph = ImplicationGraph::new();
        for (literal, level, antecedent) in vec![
            (lit(6), 1, None),
            (lit(1), 2, None),
            (lit(2), 2, Some(1)),
            (lit(3), 2, Some(2)),
        ] {
            state.assign(literal);
            graph.insert(
                literal,
                GraphNode {
                    decision_level: level,
                    antecedent,
                },
            );
        }

        let conflict: Vec<CNFVar> = state.full_clause(3).to_vec();
        let (learned, _) = analyze_conflict(&state, &graph, 2, &conflict);

        let at_current_level = learned
            .vars
            .iter()
            .filter(|&&l| graph.level_of(-l) == Some(2))
            .count();
        assert_eq!(at_current_level, 1);
    }
}
