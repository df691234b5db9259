use super::error::{Error, Result};
use super::value_objects::{ConstraintType, OptimizationType, SolutionStatus, VariableType};

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: 1.0,
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        self.variable_type.is_integral()
    }
}

/// Linear objective `offset + c·x`
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub coefficients: Vec<f64>,
    pub offset: f64,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, coefficients: Vec<f64>) -> Self {
        Self {
            optimization_type,
            coefficients,
            offset: 0.0,
        }
    }

    pub fn minimize(coefficients: Vec<f64>) -> Self {
        Self::new(OptimizationType::Minimize, coefficients)
    }

    pub fn maximize(coefficients: Vec<f64>) -> Self {
        Self::new(OptimizationType::Maximize, coefficients)
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.coefficients.len()
    }

    /// Evaluate the objective at `x` in the original sense.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.offset
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

/// Linear constraint `Σ a_j x_j (≤|=|≥) bound`, stored sparse
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub terms: Vec<(usize, f64)>,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self {
            constraint_type,
            terms,
            bound,
            name: String::new(),
        }
    }

    /// Build from a dense coefficient row; zeros are dropped.
    pub fn dense(constraint_type: ConstraintType, coefficients: &[f64], bound: f64) -> Self {
        let terms = coefficients
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != 0.0)
            .map(|(j, &c)| (j, c))
            .collect();
        Self::new(constraint_type, terms, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Left-hand side activity at `x`.
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.terms.iter().map(|&(j, a)| a * x[j]).sum()
    }

    pub fn is_satisfied(&self, x: &[f64], tol: f64) -> bool {
        let lhs = self.activity(x);
        match self.constraint_type {
            ConstraintType::LessThanOrEqual => lhs <= self.bound + tol,
            ConstraintType::Equal => (lhs - self.bound).abs() <= tol,
            ConstraintType::GreaterThanOrEqual => lhs >= self.bound - tol,
        }
    }
}

/// Complete mixed-integer linear problem
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
}

impl OptimizationProblem {
    pub fn new(objective: ObjectiveFunction, variables: Vec<Variable>) -> Self {
        Self {
            name: String::new(),
            objective,
            constraints: Vec::new(),
            variables,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn add_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    /// Check the problem for structural errors, reporting all of them at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = self.num_variables();

        if num_vars == 0 {
            errors.push("Problem must have at least one variable".to_string());
        }

        if self.objective.num_variables() != num_vars {
            errors.push(format!(
                "Number of variables ({}) doesn't match objective coefficients ({})",
                num_vars,
                self.objective.num_variables()
            ));
        }

        if self.objective.coefficients.iter().any(|c| !c.is_finite())
            || !self.objective.offset.is_finite()
        {
            errors.push("Objective has non-finite coefficients".to_string());
        }

        for (i, constraint) in self.constraints.iter().enumerate() {
            for &(j, a) in &constraint.terms {
                if j >= num_vars {
                    errors.push(format!(
                        "Constraint {} '{}' references variable {} but problem has {} variables",
                        i, constraint.name, j, num_vars
                    ));
                }
                if !a.is_finite() {
                    errors.push(format!(
                        "Constraint {} '{}' has a non-finite coefficient",
                        i, constraint.name
                    ));
                }
            }
            if constraint.bound.is_nan() {
                errors.push(format!("Constraint {} '{}' has a NaN bound", i, constraint.name));
            }
        }

        for (i, var) in self.variables.iter().enumerate() {
            if var.lower_bound > var.upper_bound {
                errors.push(format!(
                    "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                    i, var.name, var.lower_bound, var.upper_bound
                ));
            }
            if var.lower_bound.is_nan() || var.upper_bound.is_nan() {
                errors.push(format!("Variable {} '{}' has a NaN bound", i, var.name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidProblem(errors.join("; ")))
        }
    }
}

/// Per-plugin call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginStatistics {
    pub name: String,
    pub calls: u64,
    /// Branching rules: calls that returned `Branched`.
    pub branchings: u64,
}

/// Statistics about the search
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub nodes_explored: u64,
    pub nodes_pruned: u64,
    pub lp_solves: u64,
    pub max_depth: usize,
    pub incumbent_updates: u64,
    pub solve_time_ms: f64,
    pub branch_rules: Vec<PluginStatistics>,
    pub node_selectors: Vec<PluginStatistics>,
}

impl SolverStatistics {
    pub fn branch_rule(&self, name: &str) -> Option<&PluginStatistics> {
        self.branch_rules.iter().find(|s| s.name == name)
    }

    pub fn node_selector(&self, name: &str) -> Option<&PluginStatistics> {
        self.node_selectors.iter().find(|s| s.name == name)
    }
}

/// Result of a branch-and-bound solve, expressed in the original objective sense
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub optimal_value: Option<f64>,
    pub best_bound: Option<f64>,
    pub gap: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            optimal_value: None,
            best_bound: None,
            gap: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn has_solution(&self) -> bool {
        self.optimal_value.is_some()
    }

    /// Relative gap between primal and dual bound, infinite if either is missing.
    pub fn compute_gap(primal: f64, dual: f64) -> f64 {
        if !primal.is_finite() || !dual.is_finite() {
            return f64::INFINITY;
        }
        if primal == dual {
            return 0.0;
        }
        let denom = primal.abs().min(dual.abs());
        if denom < 1e-9 || primal * dual < 0.0 {
            return f64::INFINITY;
        }
        (primal - dual).abs() / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> OptimizationProblem {
        OptimizationProblem::new(
            ObjectiveFunction::maximize(vec![150.0, 90.0, 120.0]),
            vec![Variable::binary("tent"), Variable::binary("stove"), Variable::binary("food")],
        )
        .add_constraint(
            Constraint::dense(ConstraintType::LessThanOrEqual, &[7.0, 3.0, 4.0], 10.0)
                .with_name("weight"),
        )
    }

    #[test]
    fn test_valid_problem() {
        let problem = knapsack();
        assert!(problem.validate().is_ok());
        assert!(problem.is_mixed_integer());
        assert_eq!(problem.num_integer_variables(), 3);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut problem = knapsack();
        problem.variables[0].lower_bound = 2.0;
        problem.constraints.push(Constraint::new(ConstraintType::Equal, vec![(7, 1.0)], 1.0));

        let err = problem.validate().unwrap_err().to_string();
        assert!(err.contains("lower bound"), "{err}");
        assert!(err.contains("references variable 7"), "{err}");
    }

    #[test]
    fn test_objective_length_mismatch() {
        let mut problem = knapsack();
        problem.objective.coefficients.pop();
        assert!(matches!(problem.validate(), Err(Error::InvalidProblem(_))));
    }

    #[test]
    fn test_dense_constraint_drops_zeros() {
        let c = Constraint::dense(ConstraintType::GreaterThanOrEqual, &[0.0, 2.0, 0.0, 1.0], 3.0);
        assert_eq!(c.terms, vec![(1, 2.0), (3, 1.0)]);
        assert!(c.is_satisfied(&[9.0, 1.0, 9.0, 1.0], 1e-9));
        assert!(!c.is_satisfied(&[9.0, 0.5, 9.0, 1.0], 1e-9));
    }

    #[test]
    fn test_gap_computation() {
        let gap = Solution::compute_gap(10.0, 8.0);
        assert!((gap - 0.25).abs() < 1e-12);
        assert_eq!(Solution::compute_gap(5.0, 5.0), 0.0);
        assert_eq!(Solution::compute_gap(5.0, f64::NEG_INFINITY), f64::INFINITY);
        assert_eq!(Solution::compute_gap(1.0, -1.0), f64::INFINITY);
    }
}
