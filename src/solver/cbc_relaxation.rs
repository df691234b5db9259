// COIN-OR CBC relaxation adapter, through good_lp
// All columns are added as continuous: CBC only ever sees the LP relaxation.

use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable,
};

use crate::domain::{
    Domain, Error, Relaxation, RelaxationSolver, RelaxationStatus, Result, TransformedProblem,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct CoinCbcRelaxation;

impl CoinCbcRelaxation {
    pub fn new() -> Self {
        Self
    }
}

impl RelaxationSolver for CoinCbcRelaxation {
    fn solve(&self, problem: &TransformedProblem, domain: &Domain) -> Result<Relaxation> {
        let mut vars = variables!();
        let columns: Vec<Variable> = (0..problem.num_vars())
            .map(|j| {
                let mut def = variable();
                if domain.lower(j).is_finite() {
                    def = def.min(domain.lower(j));
                }
                if domain.upper(j).is_finite() {
                    def = def.max(domain.upper(j));
                }
                vars.add(def)
            })
            .collect();

        let objective: Expression = problem
            .objective
            .iter()
            .zip(&columns)
            .filter(|(c, _)| **c != 0.0)
            .map(|(&c, &v)| c * v)
            .sum();

        let mut model = vars.minimise(objective).using(coin_cbc::coin_cbc);
        model.set_parameter("log", "0");

        for row in &problem.rows {
            let activity: Expression = row.terms.iter().map(|&(j, a)| a * columns[j]).sum();
            if row.lhs == row.rhs {
                model = model.with(activity.eq(row.rhs));
                continue;
            }
            if row.lhs.is_finite() {
                model = model.with(activity.clone().geq(row.lhs));
            }
            if row.rhs.is_finite() {
                model = model.with(activity.leq(row.rhs));
            }
        }

        match model.solve() {
            Ok(solution) => {
                let x: Vec<f64> = columns.iter().map(|&v| solution.value(v)).collect();
                let objective = problem.objective_value(&x);
                Ok(Relaxation::optimal(x, objective))
            }
            Err(ResolutionError::Infeasible) => {
                Ok(Relaxation::without_solution(RelaxationStatus::Infeasible))
            }
            Err(ResolutionError::Unbounded) => {
                Ok(Relaxation::without_solution(RelaxationStatus::Unbounded))
            }
            Err(e) => Err(Error::Relaxation(format!("CBC: {e}"))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem, Variable as Var,
    };

    #[test]
    fn test_relaxation_ignores_integrality() {
        // max x + y, 2x + 2y <= 3
        let problem = OptimizationProblem::new(
            ObjectiveFunction::maximize(vec![1.0, 1.0]),
            vec![Var::integer("x"), Var::integer("y")],
        )
        .add_constraint(Constraint::dense(ConstraintType::LessThanOrEqual, &[2.0, 2.0], 3.0));
        let t = TransformedProblem::transform(&problem, 1e-6).unwrap();

        let relaxation = CoinCbcRelaxation::new().solve(&t, &t.root_domain()).unwrap();
        assert_eq!(relaxation.status, RelaxationStatus::Optimal);
        assert!((relaxation.objective + 1.5).abs() < 1e-6);
    }
}
