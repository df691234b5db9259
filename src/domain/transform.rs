// Transformed problem: the minimization form the search works on.
//
// Every solve starts by copying the user problem into this form. Maximization
// objectives are negated, integer domains are rounded inwards, binary domains
// are clamped to `[0, 1]` and rows become two-sided `lhs <= a·x <= rhs`.

use super::error::Result;
use super::models::OptimizationProblem;
use super::value_objects::{ConstraintType, OptimizationType, VariableType};

/// Which side of a variable domain a bound change tightens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Lower,
    Upper,
}

/// A single bound tightening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundChange {
    pub var: usize,
    pub kind: BoundKind,
    pub value: f64,
}

impl BoundChange {
    /// `x <= floor(value)`.
    pub fn down(var: usize, value: f64) -> Self {
        Self {
            var,
            kind: BoundKind::Upper,
            value: value.floor(),
        }
    }

    /// `x >= ceil(value)`.
    pub fn up(var: usize, value: f64) -> Self {
        Self {
            var,
            kind: BoundKind::Lower,
            value: value.ceil(),
        }
    }
}

/// Local variable bounds of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Domain {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        debug_assert_eq!(lower.len(), upper.len());
        Self { lower, upper }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self, var: usize) -> f64 {
        self.lower[var]
    }

    pub fn upper(&self, var: usize) -> f64 {
        self.upper[var]
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    /// Apply a tightening. Changes that would relax a bound are ignored.
    pub fn apply(&mut self, change: &BoundChange) {
        match change.kind {
            BoundKind::Lower => {
                if change.value > self.lower[change.var] {
                    self.lower[change.var] = change.value;
                }
            }
            BoundKind::Upper => {
                if change.value < self.upper[change.var] {
                    self.upper[change.var] = change.value;
                }
            }
        }
    }

    /// True when some variable has `lower > upper + tol`.
    pub fn is_infeasible(&self, tol: f64) -> bool {
        self.lower
            .iter()
            .zip(&self.upper)
            .any(|(lb, ub)| *lb > ub + tol)
    }
}

/// Two-sided linear row.
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub lhs: f64,
    pub rhs: f64,
}

impl Row {
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.terms.iter().map(|&(j, a)| a * x[j]).sum()
    }
}

#[derive(Debug, Clone)]
pub struct TransformedProblem {
    pub name: String,
    /// Minimization objective coefficients.
    pub objective: Vec<f64>,
    /// Constant term in minimization form.
    pub objective_offset: f64,
    /// `1.0` for minimization, `-1.0` when the original problem maximizes.
    pub sense_factor: f64,
    pub rows: Vec<Row>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub integral: Vec<bool>,
    pub var_names: Vec<String>,
}

impl TransformedProblem {
    pub fn transform(problem: &OptimizationProblem, feastol: f64) -> Result<Self> {
        problem.validate()?;

        let sense_factor = match problem.objective.optimization_type {
            OptimizationType::Minimize => 1.0,
            OptimizationType::Maximize => -1.0,
        };
        let objective = problem
            .objective
            .coefficients
            .iter()
            .map(|c| sense_factor * c)
            .collect();

        let n = problem.num_variables();
        let mut lower = Vec::with_capacity(n);
        let mut upper = Vec::with_capacity(n);
        let mut integral = Vec::with_capacity(n);
        let mut var_names = Vec::with_capacity(n);

        for var in &problem.variables {
            let (mut lb, mut ub) = (var.lower_bound, var.upper_bound);
            if var.variable_type == VariableType::Binary {
                lb = lb.max(0.0);
                ub = ub.min(1.0);
            }
            if var.is_integer() {
                if lb.is_finite() {
                    lb = (lb - feastol).ceil();
                }
                if ub.is_finite() {
                    ub = (ub + feastol).floor();
                }
            }
            lower.push(lb);
            upper.push(ub);
            integral.push(var.is_integer());
            var_names.push(var.name.clone());
        }

        let rows = problem
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let (lhs, rhs) = match c.constraint_type {
                    ConstraintType::LessThanOrEqual => (f64::NEG_INFINITY, c.bound),
                    ConstraintType::Equal => (c.bound, c.bound),
                    ConstraintType::GreaterThanOrEqual => (c.bound, f64::INFINITY),
                };
                let name = if c.name.is_empty() {
                    format!("c{}", i)
                } else {
                    c.name.clone()
                };
                Row {
                    name,
                    terms: c.terms.clone(),
                    lhs,
                    rhs,
                }
            })
            .collect();

        Ok(Self {
            name: problem.name.clone(),
            objective,
            objective_offset: sense_factor * problem.objective.offset,
            sense_factor,
            rows,
            lower,
            upper,
            integral,
            var_names,
        })
    }

    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_integral(&self) -> usize {
        self.integral.iter().filter(|&&b| b).count()
    }

    pub fn root_domain(&self) -> Domain {
        Domain::new(self.lower.clone(), self.upper.clone())
    }

    /// Minimization objective value at `x`, including the offset.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective_offset
            + self
                .objective
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    /// Map an internal (minimization) value back to the original sense.
    pub fn external_value(&self, internal: f64) -> f64 {
        self.sense_factor * internal
    }

    /// Check bounds, rows and integrality of `x` within `tol`.
    pub fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        if x.len() != self.num_vars() {
            return false;
        }
        let bounds_ok = x
            .iter()
            .enumerate()
            .all(|(j, &v)| v >= self.lower[j] - tol && v <= self.upper[j] + tol);
        let integral_ok = x
            .iter()
            .zip(&self.integral)
            .all(|(&v, &int)| !int || (v - v.round()).abs() <= tol);
        let rows_ok = self.rows.iter().all(|row| {
            let a = row.activity(x);
            a >= row.lhs - tol && a <= row.rhs + tol
        });
        bounds_ok && integral_ok && rows_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Constraint, ObjectiveFunction, Variable};

    fn problem() -> OptimizationProblem {
        OptimizationProblem::new(
            ObjectiveFunction::maximize(vec![3.0, 2.0, 1.0]).with_offset(5.0),
            vec![
                Variable::integer("x").with_bounds(0.4, 3.7),
                Variable::binary("y").with_bounds(-2.0, 4.0),
                Variable::continuous("z").with_bounds(0.5, 2.5),
            ],
        )
        .add_constraint(Constraint::dense(ConstraintType::LessThanOrEqual, &[1.0, 1.0, 0.0], 4.0))
        .add_constraint(Constraint::dense(ConstraintType::Equal, &[0.0, 1.0, 1.0], 2.0).with_name("link"))
    }

    #[test]
    fn test_maximize_is_negated() {
        let t = TransformedProblem::transform(&problem(), 1e-6).unwrap();
        assert_eq!(t.objective, vec![-3.0, -2.0, -1.0]);
        assert_eq!(t.objective_offset, -5.0);
        assert_eq!(t.external_value(t.objective_value(&[1.0, 1.0, 1.0])), 11.0);
    }

    #[test]
    fn test_integer_bounds_are_rounded_inwards() {
        let t = TransformedProblem::transform(&problem(), 1e-6).unwrap();
        assert_eq!((t.lower[0], t.upper[0]), (1.0, 3.0));
        assert_eq!((t.lower[1], t.upper[1]), (0.0, 1.0));
        assert_eq!((t.lower[2], t.upper[2]), (0.5, 2.5));
        assert_eq!(t.num_integral(), 2);
    }

    #[test]
    fn test_rows_are_two_sided() {
        let t = TransformedProblem::transform(&problem(), 1e-6).unwrap();
        assert_eq!(t.rows[0].name, "c0");
        assert_eq!(t.rows[0].lhs, f64::NEG_INFINITY);
        assert_eq!(t.rows[0].rhs, 4.0);
        assert_eq!(t.rows[1].name, "link");
        assert_eq!((t.rows[1].lhs, t.rows[1].rhs), (2.0, 2.0));
    }

    #[test]
    fn test_feasibility_check() {
        let t = TransformedProblem::transform(&problem(), 1e-6).unwrap();
        assert!(t.is_feasible(&[2.0, 1.0, 1.0], 1e-6));
        assert!(!t.is_feasible(&[2.5, 1.0, 1.0], 1e-6));
        assert!(!t.is_feasible(&[3.0, 1.0, 1.5], 1e-6));
    }

    #[test]
    fn test_domain_only_tightens() {
        let mut d = Domain::new(vec![0.0, 0.0], vec![5.0, 5.0]);
        d.apply(&BoundChange::down(0, 2.7));
        d.apply(&BoundChange::up(1, 1.2));
        d.apply(&BoundChange { var: 0, kind: BoundKind::Upper, value: 4.0 });
        assert_eq!(d.upper(0), 2.0);
        assert_eq!(d.lower(1), 2.0);
        assert!(!d.is_infeasible(1e-9));

        d.apply(&BoundChange::up(0, 2.2));
        assert!(d.is_infeasible(1e-9));
    }
}
