use itertools::Itertools;
use std::collections::HashSet;
use std::fmt;
use std::iter::FromIterator;

use crate::error::SolverError;

/// Type used for referencing logical variables
pub type VarId = usize;

/// Representation of logical formulae in CNF form
/// (conjunction of clauses), validated against the declared
/// problem-line counts.
#[derive(Clone, Debug, PartialEq)]
pub struct CNF {
    /// Vector of inner clauses
    pub clauses: Vec<CNFClause>,
    /// Number of distinct variables, as declared by the problem line
    pub num_variables: usize,
    /// Number of clauses, as declared by the problem line
    pub num_clauses: usize,
}

/// Representation of a clause (disjunction of literals).
/// Literal order is preserved: it decides which literals get
/// watched first under the watched-literal state variants.
#[derive(Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub struct CNFClause {
    /// Vector of inner literals
    pub vars: Vec<CNFVar>,
}

/// Logical literal
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct CNFVar {
    /// Identifier of a variable
    pub id: VarId,
    /// Literal is negated iff `sign == false`
    pub sign: bool,
}

impl CNF {
    /// Creates an empty CNF formula
    #[inline]
    pub fn empty() -> CNF {
        CNF {
            clauses: Vec::new(),
            num_variables: 0,
            num_clauses: 0,
        }
    }

    /// Builds a validated formula out of raw sentinel-terminated clauses.
    ///
    /// Every raw clause must end with the DIMACS sentinel `0` (which is
    /// stripped), must not be empty once stripped and must not contain an
    /// interior `0`. The declared `num_clauses` has to match the clause
    /// count and `num_vars` the number of distinct variables. Duplicate
    /// literals inside a clause are dropped, keeping the first occurrence.
    pub fn validate(
        clauses_raw: &[Vec<i32>],
        num_vars: usize,
        num_clauses: usize,
    ) -> Result<CNF, SolverError> {
        let mut clauses = Vec::with_capacity(clauses_raw.len());
        for (index, raw) in clauses_raw.iter().enumerate() {
            match raw.last() {
                Some(0) => {}
                _ => {
                    return Err(SolverError::MalformedInput(format!(
                        "clause {} does not end with the sentinel 0",
                        index
                    )))
                }
            }
            let body = &raw[..raw.len() - 1];
            if body.is_empty() {
                return Err(SolverError::MalformedInput(format!(
                    "clause {} is empty",
                    index
                )));
            }
            let mut clause = CNFClause::with_capacity(body.len());
            for &lit in body {
                if lit == 0 {
                    return Err(SolverError::MalformedInput(format!(
                        "clause {} contains an interior 0",
                        index
                    )));
                }
                let var = CNFVar::from_i32(lit);
                if !clause.vars.contains(&var) {
                    clause.vars.push(var);
                }
            }
            clauses.push(clause);
        }

        if clauses.len() != num_clauses {
            return Err(SolverError::MalformedInput(format!(
                "declared {} clauses but found {}",
                num_clauses,
                clauses.len()
            )));
        }

        let distinct = clauses
            .iter()
            .flat_map(|clause| clause.vars.iter().map(CNFVar::id))
            .unique()
            .count();
        if distinct != num_vars {
            return Err(SolverError::MalformedInput(format!(
                "declared {} variables but found {} distinct ones",
                num_vars, distinct
            )));
        }

        Ok(CNF {
            clauses,
            num_variables: num_vars,
            num_clauses,
        })
    }

    /// Parse a DIMACS string into a validated CNF structure.
    ///
    /// Lines starting with `c` are comments, the mandatory problem line is
    /// `p cnf <num_vars> <num_clauses>`, each clause line is a list of
    /// integers terminated by `0`, and a line starting with `%` ends the
    /// clause section.
    pub fn from_dimacs(input: &str) -> Result<CNF, SolverError> {
        let mut declared: Option<(usize, usize)> = None;
        let mut clauses_raw: Vec<Vec<i32>> = Vec::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            if line.starts_with('%') {
                break;
            }
            if line.starts_with('p') {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() != 4 || fields[1] != "cnf" {
                    return Err(SolverError::MalformedInput(format!(
                        "unsupported problem line: {}",
                        line
                    )));
                }
                let num_vars = fields[2].parse::<usize>().map_err(|_| {
                    SolverError::MalformedInput(format!("bad variable count: {}", fields[2]))
                })?;
                let num_clauses = fields[3].parse::<usize>().map_err(|_| {
                    SolverError::MalformedInput(format!("bad clause count: {}", fields[3]))
                })?;
                declared = Some((num_vars, num_clauses));
                continue;
            }
            if declared.is_none() {
                return Err(SolverError::MalformedInput(
                    "clause section starts before the problem line".to_string(),
                ));
            }
            let clause = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<i32>().map_err(|_| {
                        SolverError::MalformedInput(format!("not an integer: {}", token))
                    })
                })
                .collect::<Result<Vec<i32>, SolverError>>()?;
            clauses_raw.push(clause);
        }

        let (num_vars, num_clauses) = declared
            .ok_or_else(|| SolverError::MalformedInput("missing problem line".to_string()))?;
        CNF::validate(&clauses_raw, num_vars, num_clauses)
    }

    /// Returns number of clauses in the formula
    #[inline]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Collects all variable identifiers that appear in the formula
    #[inline]
    pub fn vars(&self) -> HashSet<VarId> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.vars.iter().map(CNFVar::id))
            .unique()
            .collect()
    }

    /// Returns the greatest variable identifier used in the formula.
    /// May exceed `num_variables` when identifiers are not contiguous.
    #[inline]
    pub fn max_variable_id(&self) -> usize {
        self.clauses
            .iter()
            .map(CNFClause::max_variable_id)
            .max()
            .unwrap_or(0)
    }

    /// Prints formula in DIMACS compatible form
    pub fn to_dimacs(&self) -> String {
        let mut out = format!("p cnf {} {}\n", self.num_variables, self.num_clauses);
        for clause in &self.clauses {
            for var in &clause.vars {
                out.push_str(&var.to_i32().to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}

impl FromIterator<CNFClause> for CNF {
    fn from_iter<I: IntoIterator<Item = CNFClause>>(iter: I) -> Self {
        let clauses = iter.into_iter().collect::<Vec<CNFClause>>();

        let num_variables = clauses
            .iter()
            .flat_map(|clause| clause.vars.iter().map(CNFVar::id))
            .unique()
            .count();
        let num_clauses = clauses.len();

        CNF {
            clauses,
            num_variables,
            num_clauses,
        }
    }
}

impl IntoIterator for CNF {
    type Item = CNFClause;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.into_iter()
    }
}

impl CNFClause {
    /// Creates an empty CNF clause
    #[inline]
    pub fn new() -> CNFClause {
        CNFClause { vars: Vec::new() }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> CNFClause {
        CNFClause {
            vars: Vec::with_capacity(capacity),
        }
    }

    /// Creates a CNF clause containing a single literal
    #[inline]
    pub fn single(var: CNFVar) -> CNFClause {
        CNFClause { vars: vec![var] }
    }

    /// Adds a single literal at the end of the clause
    #[inline]
    pub fn push(&mut self, v: CNFVar) {
        self.vars.push(v);
    }

    /// Returns the greatest variable identifier used in the clause
    #[inline]
    pub fn max_variable_id(&self) -> usize {
        self.vars.iter().map(|lit| lit.id).max().unwrap_or(0)
    }

    /// Calculates number of literals in clause
    #[inline]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl FromIterator<CNFVar> for CNFClause {
    fn from_iter<I: IntoIterator<Item = CNFVar>>(iter: I) -> Self {
        CNFClause {
            vars: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CNFClause {
    type Item = CNFVar;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}

impl CNFVar {
    /// Creates literal with given identifier and positivity
    #[inline]
    pub fn new(id: VarId, sign: bool) -> CNFVar {
        CNFVar { id, sign }
    }

    /// Creates a positive literal with given identifier
    #[inline]
    pub fn pos(id: VarId) -> CNFVar {
        CNFVar { id, sign: true }
    }

    /// Creates a negative literal with given identifier
    #[inline]
    pub fn neg(id: VarId) -> CNFVar {
        CNFVar { id, sign: false }
    }

    /// Gets the identifier of a literal
    #[inline]
    pub fn id(&self) -> VarId {
        self.id
    }

    /// Checks if the literal is positive
    #[inline]
    pub fn sign(&self) -> bool {
        self.sign
    }

    /// Converts to signed integer. The absolute value indicates
    /// the identifier and the sign states for positivity.
    ///
    /// **NOTE** it is not integer-overflow friendly.
    pub fn to_i32(&self) -> i32 {
        if self.sign {
            self.id as i32
        } else {
            -(self.id as i32)
        }
    }

    /// Inverse of [`CNFVar::to_i32`]. Must not be called with `0`.
    pub fn from_i32(lit: i32) -> CNFVar {
        debug_assert!(lit != 0, "0 is not a literal");
        CNFVar {
            id: lit.abs() as VarId,
            sign: lit > 0,
        }
    }
}

impl std::ops::Neg for CNFVar {
    type Output = CNFVar;
    fn neg(mut self) -> Self::Output {
        self.sign = !self.sign;
        self
    }
}

impl From<CNFVar> for (VarId, bool) {
    fn from(lit: CNFVar) -> Self {
        (lit.id, lit.sign)
    }
}

impl fmt::Display for CNF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.clauses {
            writeln!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Display for CNFClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.vars {
            write!(f, "({})  ", c)?;
        }
        Ok(())
    }
}

impl fmt::Display for CNFVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_i32())
    }
}
