// Example: writing your own plugins
//
// `WorstBoundSelector` always expands the open node with the largest lower
// bound, the opposite of best-bound search. `FirstFractional` branches on the
// lowest-index fractional variable and prefers the up branch. Both are
// registered next to the defaults with priorities high enough to win.

use std::cmp::Ordering;

use letsbranch::{
    BranchContext, BranchResult, BranchRule, BranchRuleProperties, Constraint, ConstraintType,
    Model, Node, NodeSelector, NodeSelectorProperties, ObjectiveFunction, OptimizationProblem,
    Result, Variable,
};

struct WorstBoundSelector;

impl NodeSelector for WorstBoundSelector {
    fn compare(&self, a: &Node, b: &Node) -> Ordering {
        b.lower_bound().total_cmp(&a.lower_bound())
    }
}

struct FirstFractional;

impl BranchRule for FirstFractional {
    fn execute_lp(&mut self, ctx: &mut BranchContext<'_>) -> Result<BranchResult> {
        let Some(candidate) = ctx.candidates().iter().min_by_key(|c| c.var).copied() else {
            return Ok(BranchResult::DidNotRun);
        };
        ctx.branch_with_priorities(candidate.var, 0.0, 1.0)?;
        Ok(BranchResult::Branched)
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // max 8a + 11b + 6c + 4d, 5a + 7b + 4c + 3d <= 14, all binary
    let problem = OptimizationProblem::new(
        ObjectiveFunction::maximize(vec![8.0, 11.0, 6.0, 4.0]),
        vec![
            Variable::binary("a"),
            Variable::binary("b"),
            Variable::binary("c"),
            Variable::binary("d"),
        ],
    )
    .add_constraint(Constraint::dense(
        ConstraintType::LessThanOrEqual,
        &[5.0, 7.0, 4.0, 3.0],
        14.0,
    ));

    let mut model = Model::from_problem(problem);
    model.include_default_plugins()?;
    model.include_node_selector(
        NodeSelectorProperties::new("worstbound", "largest lower bound first")
            .with_priorities(1_000_000, 1_000_000),
        WorstBoundSelector,
    )?;
    model.include_branch_rule(
        BranchRuleProperties::new("firstfrac", "lowest index fractional variable")
            .with_priority(10_000)
            .with_max_depth(Some(20)),
        FirstFractional,
    )?;

    let solution = model.solve()?;
    println!("Status : {}", solution.status);
    println!("Value  : {:?}", solution.optimal_value);
    println!("x      : {:?}", solution.variable_values);
    for stats in solution
        .statistics
        .branch_rules
        .iter()
        .chain(&solution.statistics.node_selectors)
    {
        println!("{:<12} calls={} branchings={}", stats.name, stats.calls, stats.branchings);
    }
    Ok(())
}
