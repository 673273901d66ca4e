use std::fmt;

use crate::cnf::{CNFVar, VarId};
use crate::error::SolverError;
use crate::state::SatState;
use crate::util::IndexMap;

/// Branching heuristics one can choose from to customize the engines.
///
/// Every heuristic is a pure function over the state: it scans the
/// unsatisfied clauses and returns the literal to branch on, or `None`
/// when no unresolved literal is left. Ties break towards the variable
/// encountered first, which matches scanning clauses in index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heuristic {
    /// First unassigned literal of the first unsatisfied clause, assigned true.
    Default,
    /// Dynamic Largest Combined Sum: maximize CP + CN.
    Dlcs,
    /// Dynamic Largest Individual Sum: maximize max(CP, CN).
    Dlis,
    /// DLCS with a random sign.
    Rdlcs,
    /// DLIS with a random sign.
    Rdlis,
    /// Maximum Occurrences in clauses of Minimum size, parameterized by k.
    Moms(u32),
    /// MOMs with a random sign.
    Rmoms(u32),
}

impl Heuristic {
    /// Resolves a heuristic name as accepted on the engine surface.
    /// `k` is only used by the MOMs family.
    pub fn from_name(name: &str, k: u32) -> Result<Heuristic, SolverError> {
        match name {
            "default" => Ok(Heuristic::Default),
            "dlcs" => Ok(Heuristic::Dlcs),
            "dlis" => Ok(Heuristic::Dlis),
            "rdlcs" => Ok(Heuristic::Rdlcs),
            "rdlis" => Ok(Heuristic::Rdlis),
            "moms" => Ok(Heuristic::Moms(k)),
            "rmoms" => Ok(Heuristic::Rmoms(k)),
            _ => Err(SolverError::InvalidArgument(format!(
                "unknown heuristic '{}', must be one of \
                 default, dlcs, dlis, rdlcs, rdlis, moms, rmoms",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::Default => "default",
            Heuristic::Dlcs => "dlcs",
            Heuristic::Dlis => "dlis",
            Heuristic::Rdlcs => "rdlcs",
            Heuristic::Rdlis => "rdlis",
            Heuristic::Moms(_) => "moms",
            Heuristic::Rmoms(_) => "rmoms",
        }
    }

    /// Picks the next decision literal, or `None` when no unsatisfied
    /// clause has an unassigned literal left.
    pub fn pick_literal(&self, state: &impl SatState) -> Option<CNFVar> {
        match *self {
            Heuristic::Default => default_literal(state),
            Heuristic::Dlcs => dlcs(state),
            Heuristic::Dlis => dlis(state),
            Heuristic::Rdlcs => dlcs(state).map(random_sign),
            Heuristic::Rdlis => dlis(state).map(random_sign),
            Heuristic::Moms(k) => moms(state, k),
            Heuristic::Rmoms(k) => moms(state, k).map(random_sign),
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn random_sign(literal: CNFVar) -> CNFVar {
    if rand::random::<bool>() {
        literal
    } else {
        -literal
    }
}

fn default_literal(state: &impl SatState) -> Option<CNFVar> {
    for clause in 0..state.num_clauses() {
        if state.is_clause_satisfied(clause) {
            continue;
        }
        for lit in state.clause_view(clause) {
            if !state.is_assigned(lit.id) {
                return Some(CNFVar::pos(lit.id));
            }
        }
    }
    None
}

/// (CP, CN) per unassigned variable over unsatisfied clauses, keyed in
/// first-encounter order so ties stay deterministic.
fn count_literals(state: &impl SatState) -> IndexMap<VarId, (usize, usize)> {
    let mut counts: IndexMap<VarId, (usize, usize)> = IndexMap::default();
    for clause in 0..state.num_clauses() {
        if state.is_clause_satisfied(clause) {
            continue;
        }
        for lit in state.clause_view(clause) {
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
    counts
}

fn dlcs(state: &impl SatState) -> Option<CNFVar> {
    let mut best: Option<(CNFVar, usize)> = None;
    for (&var, &(cp, cn)) in count_literals(state).iter() {
        let combined = cp + cn;
        if best.map_or(true, |(_, score)| combined > score) {
            best = Some((CNFVar::new(var, cp >= cn), combined));
        }
    }
    best.map(|(lit, _)| lit)
}

fn dlis(state: &impl SatState) -> Option<CNFVar> {
    let mut best: Option<(CNFVar, usize)> = None;
    for (&var, &(cp, cn)) in count_literals(state).iter() {
        if best.map_or(true, |(_, score)| cp > score) {
            best = Some((CNFVar::pos(var), cp));
        }
        if best.map_or(true, |(_, score)| cn > score) {
            best = Some((CNFVar::neg(var), cn));
        }
    }
    best.map(|(lit, _)| lit)
}

fn moms(state: &impl SatState, k: u32) -> Option<CNFVar> {
    let min_width = (0..state.num_clauses())
        .filter(|&clause| !state.is_clause_satisfied(clause))
        .map(|clause| {
            state
                .clause_view(clause)
                .iter()
                .filter(|lit| !state.is_assigned(lit.id))
                .count()
        })
        .filter(|&width| width > 0)
        .min()?;

    let mut counts: IndexMap<VarId, (u64, u64)> = IndexMap::default();
    for clause in 0..state.num_clauses() {
        if state.is_clause_satisfied(clause) {
            continue;
        }
        let unassigned: Vec<&CNFVar> = state
            .clause_view(clause)
            .iter()
            .filter(|lit| !state.is_assigned(lit.id))
            .collect();
        if unassigned.len() != min_width {
            continue;
        }
        for lit in unassigned {
            let entry = counts.entry(lit.id).or_insert((0, 0));
            if lit.sign {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    // scores saturate instead of overflowing for large k
    let weight = 1u64.checked_shl(k).unwrap_or(u64::MAX);
    let mut best: Option<(CNFVar, u64)> = None;
    for (&var, &(cp, cn)) in counts.iter() {
        let score = cp
            .saturating_add(cn)
            .saturating_mul(weight)
            .saturating_add(cp.saturating_mul(cn));
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((CNFVar::new(var, cp >= cn), score));
        }
    }
    best.map(|(lit, _)| lit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::CNF;
    use crate::state::PlainState;

    fn formula(clauses: &[&[i32]]) -> CNF {
        clauses
            .iter()
            .map(|clause| clause.iter().map(|&lit| CNFVar::from_i32(lit)).collect())
            .collect()
    }

    #[test]
    fn unknown_heuristic_name_is_rejected() {
        assert!(matches!(
            Heuristic::from_name("vsids", 0),
            Err(SolverError::InvalidArgument(_))
        ));
        assert_eq!(Heuristic::from_name("moms", 3), Ok(Heuristic::Moms(3)));
    }

    #[test]
    fn default_picks_the_first_open_literal_positively() {
        let mut state = PlainState::new(&formula(&[&[-1, 2], &[2, 3]]));
        assert_eq!(
            Heuristic::Default.pick_literal(&state),
            Some(CNFVar::pos(1))
        );

        // satisfied clauses are skipped
        state.assign(CNFVar::neg(1));
        assert_eq!(
            Heuristic::Default.pick_literal(&state),
            Some(CNFVar::pos(2))
        );
    }

    #[test]
    fn dlcs_maximizes_the_combined_count() {
        let state = PlainState::new(&formula(&[&[1, -2], &[-2, 3], &[-2, -3], &[1, 3]]));
        // variable 2: CP=0, CN=3 -> combined 3, sign negative
        assert_eq!(Heuristic::Dlcs.pick_literal(&state), Some(CNFVar::neg(2)));
    }

    #[test]
    fn dlis_maximizes_a_single_polarity() {
        let state = PlainState::new(&formula(&[&[1, 2], &[1, -2], &[1, 3], &[-2, -3]]));
        // CP(1)=3 beats CN(2)=2
        assert_eq!(Heuristic::Dlis.pick_literal(&state), Some(CNFVar::pos(1)));
    }

    #[test]
    fn moms_counts_only_minimum_width_clauses() {
        let state = PlainState::new(&formula(&[&[1, 2, 3], &[-2, 3], &[3, -2], &[-1, 2, -3]]));
        // binary clauses are the smallest; variables 2 and 3 both occur
        // twice there, 2 is encountered first and wins the tie
        assert_eq!(
            Heuristic::Moms(0).pick_literal(&state),
            Some(CNFVar::neg(2))
        );
    }

    #[test]
    fn moms_with_huge_k_saturates() {
        let state = PlainState::new(&formula(&[&[1, 2], &[-1, 2]]));
        assert!(Heuristic::Moms(200).pick_literal(&state).is_some());
    }

    #[test]
    fn exhausted_state_yields_no_literal() {
        let mut state = PlainState::new(&formula(&[&[1, 2]]));
        state.assign(CNFVar::pos(1));
        assert_eq!(Heuristic::Dlcs.pick_literal(&state), None);
        assert_eq!(Heuristic::Default.pick_literal(&state), None);
    }

    #[test]
    fn random_variants_pick_the_same_variable() {
        let state = PlainState::new(&formula(&[&[1, -2], &[-2, 3], &[-2, -3]]));
        let lit = Heuristic::Rdlcs.pick_literal(&state).unwrap();
        assert_eq!(lit.id, 2);
    }
}
