use std::fs;
use std::process;
use std::time::Duration;

use clap::{App, Arg, ArgMatches};
use resolute::logging::{print_decision_table, print_graph_table};
use resolute::solvers::TimeLimitedSolver;
use resolute::{
    CdclSolver, DpllSolver, SATSolution, Solver, SolverError, SolverOptions, CNF,
};

struct Config {
    input: String,
    engine: String,
    options: SolverOptions,
    time_limit: Option<Duration>,
    print_steps: bool,
    json_steps: bool,
    return_code: bool,
}

fn make_config<'a>() -> Result<Config, SolverError> {
    let matches = App::new("resolute")
        .version("0.1.0")
        .about("DPLL/CDCL SAT solver for DIMACS CNF files")
        .arg(
            Arg::with_name("input")
                .help("DIMACS CNF input file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("engine")
                .long("engine")
                .short("e")
                .takes_value(true)
                .default_value("dpll")
                .help("Search engine to run: dpll or cdcl"),
        )
        .arg(
            Arg::with_name("heuristic")
                .long("heuristic")
                .short("b")
                .takes_value(true)
                .default_value("default")
                .help("Branching heuristic: default, dlcs, dlis, rdlcs, rdlis, moms, rmoms"),
        )
        .arg(
            Arg::with_name("k")
                .short("k")
                .takes_value(true)
                .default_value("0")
                .help("Exponent for the moms/rmoms scoring function"),
        )
        .arg(
            Arg::with_name("twl")
                .long("twl")
                .help("Track two watched literals per clause"),
        )
        .arg(
            Arg::with_name("true-twl")
                .long("true-twl")
                .help("Watched literals with strict satisfaction rules"),
        )
        .arg(
            Arg::with_name("ple")
                .long("ple")
                .help("Run pure literal elimination before DPLL search"),
        )
        .arg(
            Arg::with_name("cutting-method")
                .long("cutting-method")
                .takes_value(true)
                .default_value("1UIP")
                .help("How CDCL cuts the implication graph"),
        )
        .arg(
            Arg::with_name("log-steps")
                .long("log-steps")
                .short("l")
                .help("Print the decision table (and graph for cdcl) after solving"),
        )
        .arg(
            Arg::with_name("json-steps")
                .long("json-steps")
                .help("Print the logged steps as JSON instead of a table"),
        )
        .arg(
            Arg::with_name("time-limit")
                .long("time-limit")
                .short("t")
                .takes_value(true)
                .help("Abort after this many seconds (cdcl only)"),
        )
        .arg(
            Arg::with_name("return_code")
                .long("return-code")
                .short("r")
                .help("Return 1 if satisfiable and 0 if not (useful for scripting)"),
        )
        .get_matches();

    config_from_matches(&matches)
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config, SolverError> {
    let k = matches
        .value_of("k")
        .unwrap_or("0")
        .parse::<u32>()
        .map_err(|_| SolverError::InvalidArgument("k must be a nonnegative integer".into()))?;

    let engine = matches.value_of("engine").unwrap_or("dpll").to_string();
    if engine != "dpll" && engine != "cdcl" {
        return Err(SolverError::InvalidArgument(format!(
            "unknown engine '{}', must be dpll or cdcl",
            engine
        )));
    }

    let print_steps = matches.is_present("log-steps");
    let json_steps = matches.is_present("json-steps");
    let options = SolverOptions::from_names(
        matches.value_of("heuristic").unwrap_or("default"),
        k,
        matches.is_present("twl"),
        matches.is_present("true-twl"),
        matches.is_present("ple"),
        print_steps || json_steps,
        matches.value_of("cutting-method").unwrap_or("1UIP"),
    )?;

    let time_limit = match matches.value_of("time-limit") {
        Some(value) => {
            let seconds = value.parse::<u64>().map_err(|_| {
                SolverError::InvalidArgument("time limit must be a number of seconds".into())
            })?;
            if engine != "cdcl" {
                return Err(SolverError::InvalidArgument(
                    "the time limit is only supported by the cdcl engine".into(),
                ));
            }
            Some(Duration::from_secs(seconds))
        }
        None => None,
    };

    Ok(Config {
        input: matches.value_of("input").unwrap().to_string(),
        engine,
        options,
        time_limit,
        print_steps,
        json_steps,
        return_code: matches.is_present("return_code"),
    })
}

fn run(config: &Config) -> Result<SATSolution, String> {
    let content = fs::read_to_string(&config.input)
        .map_err(|err| format!("cannot read {}: {}", config.input, err))?;
    let formula = CNF::from_dimacs(&content).map_err(|err| err.to_string())?;

    if config.engine == "cdcl" {
        let solver = CdclSolver::new(config.options);
        let solution = match config.time_limit {
            Some(limit) => TimeLimitedSolver::new(&solver, limit).solve(&formula),
            None => solver.solve(&formula),
        };
        if config.json_steps {
            let json = serde_json::to_string_pretty(&solver.graph_steps())
                .map_err(|err| err.to_string())?;
            println!("{}", json);
        } else if config.print_steps {
            print_decision_table(&solver.decision_steps());
            print_graph_table(&solver.graph_steps());
        }
        Ok(solution)
    } else {
        let solver = DpllSolver::new(config.options);
        let solution = solver.solve(&formula);
        if config.json_steps {
            let json = serde_json::to_string_pretty(&solver.decision_steps())
                .map_err(|err| err.to_string())?;
            println!("{}", json);
        } else if config.print_steps {
            print_decision_table(&solver.decision_steps());
        }
        Ok(solution)
    }
}

fn main() {
    env_logger::init();

    let config = match make_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(2);
        }
    };

    match run(&config) {
        Ok(solution) => {
            print!("{}", solution.to_dimacs());
            if config.return_code {
                process::exit(if solution.is_sat() { 1 } else { 0 });
            }
        }
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    }
}
