// Example: the same 0/1 knapsack solved with every built-in branching rule
// and node selector
//
// Item   | Weight (kg) | Value ($)
// -------|-------------|----------
// Tent   |     7       |   150
// Stove  |     3       |    90
// Food   |     4       |   120
// Water  |     5       |   100
// Camera |     2       |    80
// Rope   |     6       |   110
// Lamp   |     1       |    35
//
// Maximize total value subject to a 16 kg weight limit. Every combination
// reaches the same optimum; the node and LP counts show how differently they
// get there.

use letsbranch::plugins::builtin;
use letsbranch::{
    Constraint, ConstraintType, Model, ObjectiveFunction, OptimizationProblem, Variable,
};

const ITEMS: [(&str, f64, f64); 7] = [
    ("tent", 7.0, 150.0),
    ("stove", 3.0, 90.0),
    ("food", 4.0, 120.0),
    ("water", 5.0, 100.0),
    ("camera", 2.0, 80.0),
    ("rope", 6.0, 110.0),
    ("lamp", 1.0, 35.0),
];

fn knapsack() -> OptimizationProblem {
    let values = ITEMS.iter().map(|&(_, _, v)| v).collect();
    let weights: Vec<f64> = ITEMS.iter().map(|&(_, w, _)| w).collect();
    let variables = ITEMS.iter().map(|&(name, _, _)| Variable::binary(name)).collect();

    OptimizationProblem::new(ObjectiveFunction::maximize(values), variables)
        .with_name("knapsack")
        .add_constraint(
            Constraint::dense(ConstraintType::LessThanOrEqual, &weights, 16.0).with_name("weight"),
        )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Knapsack: built-in plugin tour ===\n");
    println!(
        "{:<10} {:<13} {:>8} {:>7} {:>9}",
        "branching", "nodesel", "value", "nodes", "lp solves"
    );

    for rule in builtin::BRANCH_RULES {
        for selector in builtin::NODE_SELECTORS {
            let mut model = Model::from_problem(knapsack());
            model.set_param("display/verblevel", 0)?;
            model.set_param("randomization/seed", 7)?;

            if let Some((props, plugin)) = builtin::branch_rule(rule) {
                model.include_boxed_branch_rule(props, plugin)?;
            }
            if let Some((props, plugin)) = builtin::node_selector(selector) {
                model.include_boxed_node_selector(props, plugin)?;
            }

            let solution = model.solve()?;
            println!(
                "{:<10} {:<13} {:>8} {:>7} {:>9}",
                rule,
                selector,
                solution.optimal_value.unwrap_or(f64::NAN),
                solution.statistics.nodes_explored,
                solution.statistics.lp_solves
            );
        }
    }

    let mut model = Model::from_problem(knapsack());
    model.set_param("display/verblevel", 0)?;
    model.include_default_plugins()?;
    let solution = model.solve()?;

    println!("\nPacked with the default plugins:");
    for ((name, weight, value), x) in ITEMS.iter().zip(&solution.variable_values) {
        if *x > 0.5 {
            println!("  {name:<8} {weight:>4} kg  ${value}");
        }
    }
    Ok(())
}
