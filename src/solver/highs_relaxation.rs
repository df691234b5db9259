// HiGHS relaxation adapter
// Translates a transformed problem plus node bounds into a HiGHS row problem
// and solves it as a pure LP: integrality is handled by the search.

use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::trace;

use crate::domain::{
    Domain, Error, Relaxation, RelaxationSolver, RelaxationStatus, Result, TransformedProblem,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct HighsRelaxation;

impl HighsRelaxation {
    pub fn new() -> Self {
        Self
    }
}

impl RelaxationSolver for HighsRelaxation {
    fn solve(&self, problem: &TransformedProblem, domain: &Domain) -> Result<Relaxation> {
        let mut pb = RowProblem::default();

        // Columns first, then rows
        let cols: Vec<_> = problem
            .objective
            .iter()
            .enumerate()
            .map(|(j, &c)| pb.add_column(c, domain.lower(j)..=domain.upper(j)))
            .collect();

        for row in &problem.rows {
            let terms: Vec<_> = row.terms.iter().map(|&(j, a)| (cols[j], a)).collect();
            pb.add_row(row.lhs..=row.rhs, &terms);
        }

        let mut model = pb.optimise(Sense::Minimise);
        model.set_option("presolve", "off");
        model.set_option("output_flag", false);

        let solved = model
            .try_solve()
            .map_err(|status| Error::Relaxation(format!("HiGHS failed with {status:?}")))?;

        let status = solved.status();
        trace!(component = "highs", ?status, "LP solved");

        match status {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => {
                let x = solved.get_solution().columns().to_vec();
                let objective = problem.objective_value(&x);
                Ok(Relaxation::optimal(x, objective))
            }
            HighsModelStatus::Infeasible => {
                Ok(Relaxation::without_solution(RelaxationStatus::Infeasible))
            }
            HighsModelStatus::Unbounded => {
                Ok(Relaxation::without_solution(RelaxationStatus::Unbounded))
            }
            HighsModelStatus::UnboundedOrInfeasible => Ok(Relaxation::without_solution(
                RelaxationStatus::InfeasibleOrUnbounded,
            )),
            other => Err(Error::Relaxation(format!(
                "HiGHS returned status {other:?}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}
