use crate::cnf::CNFVar;
use crate::logging::GraphNodeRecord;
use crate::util::IndexMap;

/// One assigned literal in the implication graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub decision_level: usize,
    /// Index of the clause that became unit, `None` for a decision.
    pub antecedent: Option<usize>,
}

/// Implication graph keyed by the literal that was made true.
/// Entries stay in insertion order, which is the chronological trail;
/// backjumping removes every entry above a decision level.
#[derive(Clone, Debug, Default)]
pub struct ImplicationGraph {
    nodes: IndexMap<CNFVar, GraphNode>,
}

impl ImplicationGraph {
    pub fn new() -> ImplicationGraph {
        ImplicationGraph {
            nodes: IndexMap::default(),
        }
    }

    pub fn insert(&mut self, literal: CNFVar, node: GraphNode) {
        self.nodes.insert(literal, node);
    }

    pub fn node(&self, literal: CNFVar) -> Option<&GraphNode> {
        self.nodes.get(&literal)
    }

    /// Decision level of the assignment that made `literal` true.
    pub fn level_of(&self, literal: CNFVar) -> Option<usize> {
        self.nodes.get(&literal).map(|node| node.decision_level)
    }

    pub fn is_decision(&self, literal: CNFVar) -> bool {
        self.nodes
            .get(&literal)
            .map_or(false, |node| node.antecedent.is_none())
    }

    /// Removes every entry above `level` and returns the removed literals
    /// in chronological order.
    pub fn drain_above(&mut self, level: usize) -> Vec<CNFVar> {
        let removed: Vec<CNFVar> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.decision_level > level)
            .map(|(&literal, _)| literal)
            .collect();
        for literal in &removed {
            self.nodes.shift_remove(literal);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The log representation of a node.
    pub fn record_of(&self, literal: CNFVar) -> Option<GraphNodeRecord> {
        self.nodes.get(&literal).map(|node| GraphNodeRecord {
            decision_level: node.decision_level,
            antecedent: node.antecedent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_above_removes_in_chronological_order() {
        let mut graph = ImplicationGraph::new();
        graph.insert(
            CNFVar::pos(1),
            GraphNode {
                decision_level: 1,
                antecedent: None,
            },
        );
        graph.insert(
            CNFVar::neg(2),
            GraphNode {
                decision_level: 2,
                antecedent: Some(0),
            },
        );
        graph.insert(
            CNFVar::pos(3),
            GraphNode {
                decision_level: 2,
                antecedent: Some(1),
            },
        );

        let removed = graph.drain_above(1);
        assert_eq!(removed, vec![CNFVar::neg(2), CNFVar::pos(3)]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.level_of(CNFVar::pos(1)), Some(1));
    }

    #[test]
    fn decisions_have_no_antecedent() {
        let mut graph = ImplicationGraph::new();
        graph.insert(
            CNFVar::pos(1),
            GraphNode {
                decision_level: 1,
                antecedent: None,
            },
        );
        assert!(graph.is_decision(CNFVar::pos(1)));
        assert!(!graph.is_decision(CNFVar::neg(1)));
    }
}
