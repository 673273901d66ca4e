use crate::cnf::{CNFVar, VarId};
use crate::state::SatState;
use crate::util::IndexMap;

/// One pure-literal pass: every variable that occurs with a single
/// polarity across the unsatisfied clauses is assigned that polarity.
/// Returns the assigned literals in encounter order; an empty result
/// means a fixpoint was reached.
///
/// Polarities are collected over the full clauses even under the watched
/// variants, a watched subset could misclassify a variable as pure.
pub fn pure_literal_pass(state: &mut impl SatState) -> Vec<CNFVar> {
    let mut counts: IndexMap<VarId, (usize, usize)> = IndexMap::default();
    for clause in 0..state.num_clauses() {
        if state.is_clause_satisfied(clause) {
            continue;
        }
        for lit in state.full_clause(clause) {
            if state.is_assigned(lit.id) {
                continue;
            }
            let entry = counts.entry(lit.id).or_insert((0, 0));
            if lit.sign {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    let pure: Vec<CNFVar> = counts
        .iter()
        .filter_map(|(&var, &(positive, negative))| {
            if positive > 0 && negative == 0 {
                Some(CNFVar::pos(var))
            } else if negative > 0 && positive == 0 {
                Some(CNFVar::neg(var))
            } else {
                None
            }
        })
        .collect();

    for &literal in &pure {
        state.assign(literal);
    }
    pure
}
