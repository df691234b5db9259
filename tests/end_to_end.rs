// End-to-end solves through the `Model` façade with the HiGHS backend.

#![cfg(feature = "highs")]

use letsbranch::plugins::builtin;
use letsbranch::{
    Constraint, ConstraintType, Model, ObjectiveFunction, OptimizationProblem, SolutionStatus,
    Variable,
};
use proptest::prelude::*;

const TOL: f64 = 1e-6;

/// 0/1 knapsack whose root relaxation is fractional.
fn knapsack(weights: &[f64], values: &[f64], capacity: f64) -> OptimizationProblem {
    let variables = (0..weights.len())
        .map(|i| Variable::binary(format!("x{i}")))
        .collect();
    OptimizationProblem::new(ObjectiveFunction::maximize(values.to_vec()), variables)
        .with_name("knapsack")
        .add_constraint(Constraint::dense(
            ConstraintType::LessThanOrEqual,
            weights,
            capacity,
        ))
}

fn hiker() -> OptimizationProblem {
    knapsack(
        &[7.0, 3.0, 4.0, 5.0, 2.0, 6.0, 1.0],
        &[150.0, 90.0, 120.0, 100.0, 80.0, 110.0, 35.0],
        16.0,
    )
}

/// Best knapsack value by enumeration.
fn brute_force_knapsack(weights: &[f64], values: &[f64], capacity: f64) -> f64 {
    let n = weights.len();
    (0u32..1 << n)
        .filter_map(|mask| {
            let picked = (0..n).filter(|i| mask & (1 << i) != 0);
            let weight: f64 = picked.clone().map(|i| weights[i]).sum();
            (weight <= capacity + TOL).then(|| picked.map(|i| values[i]).sum::<f64>())
        })
        .fold(0.0, f64::max)
}

fn quiet(problem: OptimizationProblem) -> Model {
    let mut model = Model::from_problem(problem);
    model.set_param("display/verblevel", 0).unwrap();
    model
}

#[test]
fn test_knapsack_with_default_plugins() {
    let mut model = quiet(hiker());
    model.include_default_plugins().unwrap();
    let solution = model.solve().unwrap();

    let expected = brute_force_knapsack(
        &[7.0, 3.0, 4.0, 5.0, 2.0, 6.0, 1.0],
        &[150.0, 90.0, 120.0, 100.0, 80.0, 110.0, 35.0],
        16.0,
    );
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert!((solution.optimal_value.unwrap() - expected).abs() < TOL);
    assert!((solution.best_bound.unwrap() - expected).abs() < TOL);
    assert_eq!(solution.gap, Some(0.0));
    assert!(solution.variable_values.iter().all(|&x| x == 0.0 || x == 1.0));
    assert!(solution.statistics.nodes_explored > 1);
    assert!(solution.statistics.incumbent_updates >= 1);
}

#[test]
fn test_every_builtin_combination_agrees() {
    let mut values = Vec::new();
    for rule in builtin::BRANCH_RULES {
        for selector in builtin::NODE_SELECTORS {
            let mut model = quiet(hiker());
            let (props, plugin) = builtin::branch_rule(rule).unwrap();
            model.include_boxed_branch_rule(props, plugin).unwrap();
            let (props, plugin) = builtin::node_selector(selector).unwrap();
            model.include_boxed_node_selector(props, plugin).unwrap();

            let solution = model.solve().unwrap();
            assert_eq!(solution.status, SolutionStatus::Optimal, "{rule}/{selector}");
            let stats = &solution.statistics;
            assert!(stats.branch_rule(rule).unwrap().branchings > 0, "{rule}/{selector}");
            assert!(stats.node_selector(selector).unwrap().calls > 0, "{rule}/{selector}");
            values.push(solution.optimal_value.unwrap());
        }
    }
    assert!(values.windows(2).all(|w| (w[0] - w[1]).abs() < TOL));
}

#[test]
fn test_general_integers_with_equality() {
    // min 3x - 2y + z
    // x + 2y - z <= 4.5, 2x - y + 3z >= -2.5, x + y + z == 3, all in [-3, 5]
    let problem = OptimizationProblem::new(
        ObjectiveFunction::minimize(vec![3.0, -2.0, 1.0]),
        vec![
            Variable::integer("x").with_bounds(-3.0, 5.0),
            Variable::integer("y").with_bounds(-3.0, 5.0),
            Variable::integer("z").with_bounds(-3.0, 5.0),
        ],
    )
    .add_constraint(Constraint::dense(ConstraintType::LessThanOrEqual, &[1.0, 2.0, -1.0], 4.5))
    .add_constraint(Constraint::dense(
        ConstraintType::GreaterThanOrEqual,
        &[2.0, -1.0, 3.0],
        -2.5,
    ))
    .add_constraint(Constraint::dense(ConstraintType::Equal, &[1.0, 1.0, 1.0], 3.0));

    let mut best = f64::INFINITY;
    for x in -3..=5 {
        for y in -3..=5 {
            for z in -3..=5 {
                let (x, y, z) = (x as f64, y as f64, z as f64);
                if x + 2.0 * y - z <= 4.5 && 2.0 * x - y + 3.0 * z >= -2.5 && x + y + z == 3.0 {
                    best = best.min(3.0 * x - 2.0 * y + z);
                }
            }
        }
    }

    let mut model = quiet(problem);
    model.include_default_plugins().unwrap();
    let solution = model.solve().unwrap();
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert!((solution.optimal_value.unwrap() - best).abs() < TOL);
    let x = &solution.variable_values;
    assert!((x[0] + x[1] + x[2] - 3.0).abs() < TOL);
}

#[test]
fn test_mixed_integer_with_offset() {
    // max 3x + 2y + 1, 2x + y <= 7.3, x integer in [0, 10], y in [0, 0.5]
    let problem = OptimizationProblem::new(
        ObjectiveFunction::maximize(vec![3.0, 2.0]).with_offset(1.0),
        vec![
            Variable::integer("x").with_bounds(0.0, 10.0),
            Variable::continuous("y").with_bounds(0.0, 0.5),
        ],
    )
    .add_constraint(Constraint::dense(ConstraintType::LessThanOrEqual, &[2.0, 1.0], 7.3));

    let mut model = quiet(problem);
    model.include_default_plugins().unwrap();
    let solution = model.solve().unwrap();

    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert!((solution.optimal_value.unwrap() - 11.0).abs() < TOL);
    assert!((solution.variable_values[0] - 3.0).abs() < TOL);
    assert!((solution.variable_values[1] - 0.5).abs() < TOL);
}

#[test]
fn test_infeasible() {
    // 3.5 <= x + y <= 3.7 has no integer point
    let problem = OptimizationProblem::new(
        ObjectiveFunction::minimize(vec![1.0, 1.0]),
        vec![
            Variable::integer("x").with_bounds(0.0, 5.0),
            Variable::integer("y").with_bounds(0.0, 5.0),
        ],
    )
    .add_constraint(Constraint::dense(ConstraintType::GreaterThanOrEqual, &[1.0, 1.0], 3.5))
    .add_constraint(Constraint::dense(ConstraintType::LessThanOrEqual, &[1.0, 1.0], 3.7));

    let mut model = quiet(problem);
    model.include_default_plugins().unwrap();
    let solution = model.solve().unwrap();

    assert_eq!(solution.status, SolutionStatus::Infeasible);
    assert!(!solution.has_solution());
    assert!(solution.variable_values.is_empty());
    assert_eq!(solution.best_bound, None);
}

#[test]
fn test_unbounded() {
    let problem = OptimizationProblem::new(
        ObjectiveFunction::minimize(vec![-1.0, -1.0]),
        vec![Variable::integer("x"), Variable::integer("y")],
    )
    .add_constraint(Constraint::dense(ConstraintType::LessThanOrEqual, &[1.0, -1.0], 1.0));

    let mut model = quiet(problem);
    model.include_default_plugins().unwrap();
    let solution = model.solve().unwrap();
    assert!(matches!(
        solution.status,
        SolutionStatus::Unbounded | SolutionStatus::InfeasibleOrUnbounded
    ));
}

#[test]
fn test_node_limit_keeps_bounds() {
    let mut model = quiet(hiker());
    model.include_default_plugins().unwrap();
    model.set_param("limits/nodes", 1).unwrap();
    let solution = model.solve().unwrap();

    assert_eq!(solution.status, SolutionStatus::NodeLimit);
    assert_eq!(solution.statistics.nodes_explored, 1);
    // Maximization: the dual bound is an upper bound on the optimum.
    let optimum = brute_force_knapsack(
        &[7.0, 3.0, 4.0, 5.0, 2.0, 6.0, 1.0],
        &[150.0, 90.0, 120.0, 100.0, 80.0, 110.0, 35.0],
        16.0,
    );
    assert!(solution.best_bound.unwrap() >= optimum - TOL);
}

#[test]
fn test_time_limit_stops_before_the_root() {
    let mut model = quiet(hiker());
    model.include_default_plugins().unwrap();
    model.set_param("limits/time", 0.0).unwrap();
    let solution = model.solve().unwrap();

    assert_eq!(solution.status, SolutionStatus::TimeLimit);
    assert_eq!(solution.statistics.nodes_explored, 0);
}

#[test]
fn test_gap_limit() {
    let mut model = quiet(hiker());
    model.include_default_plugins().unwrap();
    model.set_param("limits/gap", 0.5).unwrap();
    let solution = model.solve().unwrap();

    assert!(matches!(
        solution.status,
        SolutionStatus::GapLimit | SolutionStatus::Optimal
    ));
    assert!(solution.gap.unwrap() <= 0.5);
}

#[test]
fn test_resolve_after_parameter_change() {
    let mut model = quiet(hiker());
    model.include_default_plugins().unwrap();
    let first = model.solve().unwrap();

    model.set_param("nodeselection/dfs/stdpriority", 1_000_000).unwrap();
    let second = model.solve().unwrap();

    assert_eq!(first.optimal_value, second.optimal_value);
    assert_eq!(second.statistics.node_selector("estimate").unwrap().calls, 0);
}

#[cfg(feature = "cbc")]
#[test]
fn test_cbc_backend_matches_highs() {
    let mut highs = quiet(hiker());
    highs.include_default_plugins().unwrap();
    let expected = highs.solve().unwrap().optimal_value;

    let mut cbc = quiet(hiker());
    cbc.include_default_plugins().unwrap();
    cbc.set_param("lp/solver", "cbc").unwrap();
    assert_eq!(cbc.solve().unwrap().optimal_value, expected);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_knapsack_matches_enumeration(
        items in proptest::collection::vec((1u32..20, 1u32..30), 2..7),
        rule in 0usize..builtin::BRANCH_RULES.len(),
        selector in 0usize..builtin::NODE_SELECTORS.len(),
    ) {
        let weights: Vec<f64> = items.iter().map(|&(w, _)| f64::from(w)).collect();
        let values: Vec<f64> = items.iter().map(|&(_, v)| f64::from(v)).collect();
        let capacity = (weights.iter().sum::<f64>() / 2.0).floor() + 0.5;

        let mut model = quiet(knapsack(&weights, &values, capacity));
        let (props, plugin) = builtin::branch_rule(builtin::BRANCH_RULES[rule]).unwrap();
        model.include_boxed_branch_rule(props, plugin).unwrap();
        let (props, plugin) = builtin::node_selector(builtin::NODE_SELECTORS[selector]).unwrap();
        model.include_boxed_node_selector(props, plugin).unwrap();

        let solution = model.solve().unwrap();
        prop_assert_eq!(solution.status, SolutionStatus::Optimal);
        let expected = brute_force_knapsack(&weights, &values, capacity);
        prop_assert!((solution.optimal_value.unwrap() - expected).abs() < TOL);
    }
}
