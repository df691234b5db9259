use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use letsbranch::infrastructure::init_logging;
use letsbranch::plugins::builtin;
use letsbranch::{Model, Solution};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Solve a MIP instance by branch and bound with pluggable branching and node selection"
)]
struct Cli {
    /// Instance file (MPS)
    instance: PathBuf,

    /// Branching rule to run first (mostinf, leastinf, random)
    #[arg(long)]
    branching: Option<String>,

    /// Node selector to use (estimate, bfs, dfs, breadthfirst)
    #[arg(long)]
    nodesel: Option<String>,

    /// Parameter override, e.g. --set limits/nodes=1000
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Settings file with one `key = value` per line
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter, overrides LETSBRANCH_LOG (e.g. info, debug, letsbranch=trace)
    #[arg(long)]
    log: Option<String>,

    /// Print the nonzero entries of the best solution
    #[arg(long)]
    print_solution: bool,
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;

    let mut model = Model::new();
    model.read_problem(&cli.instance)?;
    configure(&mut model, &cli)?;

    let solution = model.solve()?;
    print_summary(&model, &solution, cli.print_solution);
    Ok(())
}

/// Include the plugins first so settings may refer to their parameters.
fn configure(model: &mut Model, cli: &Cli) -> Result<(), Box<dyn Error + Send + Sync>> {
    model.include_default_plugins()?;
    if let Some(name) = &cli.branching {
        if model.plugins().branch_rule(name).is_none() {
            let (props, rule) = builtin::branch_rule(name)
                .ok_or_else(|| format!("unknown branching rule '{name}'"))?;
            model.include_boxed_branch_rule(props, rule)?;
        }
    }
    if let Some(name) = &cli.nodesel {
        if model.plugins().node_selector(name).is_none() {
            let (props, selector) = builtin::node_selector(name)
                .ok_or_else(|| format!("unknown node selector '{name}'"))?;
            model.include_boxed_node_selector(props, selector)?;
        }
    }

    if let Some(path) = &cli.settings {
        model.read_params(path)?;
    }
    for entry in &cli.overrides {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("--set expects KEY=VALUE, got '{entry}'"))?;
        model.set_param_from_str(key.trim(), value)?;
    }

    if let Some(name) = &cli.branching {
        model.set_param(&format!("branching/{name}/priority"), i64::from(i32::MAX))?;
    }
    if let Some(name) = &cli.nodesel {
        model.set_param(&format!("nodeselection/{name}/stdpriority"), i64::from(i32::MAX))?;
        model.set_param(&format!("nodeselection/{name}/memsavepriority"), i64::from(i32::MAX))?;
    }
    Ok(())
}

fn print_summary(model: &Model, solution: &Solution, print_solution: bool) {
    let stats = &solution.statistics;

    println!("Status            : {}", solution.status);
    match solution.optimal_value {
        Some(value) => println!("Primal bound      : {value}"),
        None => println!("Primal bound      : -"),
    }
    match solution.best_bound {
        Some(value) => println!("Dual bound        : {value}"),
        None => println!("Dual bound        : -"),
    }
    if let Some(gap) = solution.gap {
        if gap.is_finite() {
            println!("Gap               : {:.4}%", gap * 100.0);
        } else {
            println!("Gap               : infinite");
        }
    }
    println!("Nodes             : {} ({} pruned)", stats.nodes_explored, stats.nodes_pruned);
    println!("LP solves         : {}", stats.lp_solves);
    println!("Max depth         : {}", stats.max_depth);
    println!("Solving time      : {:.2} ms", stats.solve_time_ms);

    println!("Branching rules   :        calls   branchings");
    for rule in &stats.branch_rules {
        println!("  {:<16} {:>12} {:>12}", rule.name, rule.calls, rule.branchings);
    }
    println!("Node selectors    :        calls");
    for selector in &stats.node_selectors {
        println!("  {:<16} {:>12}", selector.name, selector.calls);
    }

    if print_solution && solution.has_solution() {
        let names = model
            .problem()
            .map(|p| p.variables.iter().map(|v| v.name.as_str()).collect::<Vec<_>>())
            .unwrap_or_default();
        println!("Solution:");
        for (j, value) in solution.variable_values.iter().enumerate() {
            if value.abs() > 1e-9 {
                println!("  {:<16} {}", names.get(j).copied().unwrap_or("?"), value);
            }
        }
    }
}
