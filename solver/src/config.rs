use crate::branching_strategy::Heuristic;
use crate::error::SolverError;

/// Which bookkeeping variant the engine runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchMode {
    /// Full per-clause counters.
    Plain,
    /// Two watched literals, satisfaction through any literal.
    Twl,
    /// Two watched literals, satisfaction only through a watched literal.
    TrueTwl,
}

impl WatchMode {
    /// Resolves the `twl`/`true_twl` flag pair of the engine surface.
    pub fn from_flags(twl: bool, true_twl: bool) -> Result<WatchMode, SolverError> {
        match (twl, true_twl) {
            (true, true) => Err(SolverError::InvalidArgument(
                "twl and true_twl are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(WatchMode::Twl),
            (false, true) => Ok(WatchMode::TrueTwl),
            (false, false) => Ok(WatchMode::Plain),
        }
    }
}

/// How CDCL cuts the implication graph into a learned clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CuttingMethod {
    /// First unique implication point.
    FirstUip,
}

impl CuttingMethod {
    pub fn from_name(name: &str) -> Result<CuttingMethod, SolverError> {
        match name {
            "1UIP" => Ok(CuttingMethod::FirstUip),
            _ => Err(SolverError::InvalidArgument(format!(
                "unknown cutting method '{}', only 1UIP is supported",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CuttingMethod::FirstUip => "1UIP",
        }
    }
}

/// Configuration shared by both engines. Invalid combinations cannot be
/// expressed: the watch mode and the heuristic are tagged variants, so
/// only the string-based [`SolverOptions::from_names`] front door can
/// fail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverOptions {
    pub heuristic: Heuristic,
    pub watch_mode: WatchMode,
    /// Run pure-literal elimination before the DPLL recursion.
    pub use_pure_literal: bool,
    /// Record step (and, for CDCL, graph) logs while solving.
    pub use_logger: bool,
    pub cutting_method: CuttingMethod,
}

impl Default for SolverOptions {
    fn default() -> SolverOptions {
        SolverOptions {
            heuristic: Heuristic::Default,
            watch_mode: WatchMode::Plain,
            use_pure_literal: false,
            use_logger: false,
            cutting_method: CuttingMethod::FirstUip,
        }
    }
}

impl SolverOptions {
    /// Builds options from the string/flag surface used by the CLI.
    pub fn from_names(
        heuristic: &str,
        k: u32,
        twl: bool,
        true_twl: bool,
        use_pure_literal: bool,
        use_logger: bool,
        cutting_method: &str,
    ) -> Result<SolverOptions, SolverError> {
        Ok(SolverOptions {
            heuristic: Heuristic::from_name(heuristic, k)?,
            watch_mode: WatchMode::from_flags(twl, true_twl)?,
            use_pure_literal,
            use_logger,
            cutting_method: CuttingMethod::from_name(cutting_method)?,
        })
    }

    pub fn heuristic(mut self, heuristic: Heuristic) -> SolverOptions {
        self.heuristic = heuristic;
        self
    }

    pub fn watch_mode(mut self, watch_mode: WatchMode) -> SolverOptions {
        self.watch_mode = watch_mode;
        self
    }

    pub fn pure_literal(mut self, enabled: bool) -> SolverOptions {
        self.use_pure_literal = enabled;
        self
    }

    pub fn logger(mut self, enabled: bool) -> SolverOptions {
        self.use_logger = enabled;
        self
    }

    /// The heuristic name as it appears in `INC_DL` log explanations,
    /// suffixed with the active watch mode.
    pub fn heuristic_label(&self) -> String {
        match self.watch_mode {
            WatchMode::Plain => self.heuristic.name().to_string(),
            WatchMode::Twl => format!("{} twl", self.heuristic.name()),
            WatchMode::TrueTwl => format!("{} true_twl", self.heuristic.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicting_watch_flags_are_rejected() {
        assert!(matches!(
            WatchMode::from_flags(true, true),
            Err(SolverError::InvalidArgument(_))
        ));
        assert_eq!(WatchMode::from_flags(false, true), Ok(WatchMode::TrueTwl));
    }

    #[test]
    fn unknown_cutting_method_is_rejected() {
        assert!(matches!(
            CuttingMethod::from_name("LUIP"),
            Err(SolverError::InvalidArgument(_))
        ));
        assert_eq!(CuttingMethod::from_name("1UIP"), Ok(CuttingMethod::FirstUip));
    }

    #[test]
    fn heuristic_label_carries_the_watch_mode() {
        let options = SolverOptions::default()
            .heuristic(Heuristic::Dlcs)
            .watch_mode(WatchMode::Twl);
        assert_eq!(options.heuristic_label(), "dlcs twl");

        let options = SolverOptions::from_names("moms", 2, false, true, false, false, "1UIP")
            .unwrap();
        assert_eq!(options.heuristic_label(), "moms true_twl");
    }
}
