// Solver façade: problem, parameters, plugins and the solve lifecycle.
//
// A [`Model`] moves through three stages. Plugins can only be included
// while it holds the original problem; [`Model::solve`] transforms the
// problem, runs the search and leaves the model in the solved stage until
// [`Model::free_transform`] (or the next solve) returns it.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{
    Error, OptimizationProblem, RelaxationSolver, Result, Solution, SolutionStatus,
    SolverStatistics, TransformedProblem,
};
use crate::infrastructure::mps;
use crate::plugins::{
    builtin, BranchRule, BranchRuleProperties, NodeSelector, NodeSelectorProperties, PluginSet,
    SolveInfo,
};
use crate::search::BranchAndBound;
use crate::solver::RelaxationFactory;

use super::params::{ParamValue, Params, Settings};

/// Lifecycle stage of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Holding the original problem; plugins may be included.
    Problem,
    /// The problem was transformed and plugins were initialized.
    Transformed,
    /// The search finished.
    Solved,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Problem => "PROBLEM",
            Stage::Transformed => "TRANSFORMED",
            Stage::Solved => "SOLVED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Model {
    problem: Option<OptimizationProblem>,
    params: Params,
    plugins: PluginSet,
    relaxation: Option<Box<dyn RelaxationSolver>>,
    transformed: Option<TransformedProblem>,
    stage: Stage,
    statistics: SolverStatistics,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            problem: None,
            params: Params::new(),
            plugins: PluginSet::new(),
            relaxation: None,
            transformed: None,
            stage: Stage::Problem,
            statistics: SolverStatistics::default(),
        }
    }

    pub fn from_problem(problem: OptimizationProblem) -> Self {
        let mut model = Self::new();
        model.problem = Some(problem);
        model
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn problem(&self) -> Option<&OptimizationProblem> {
        self.problem.as_ref()
    }

    /// Replace the problem. Only allowed in the problem stage.
    pub fn set_problem(&mut self, problem: OptimizationProblem) -> Result<()> {
        self.require_problem_stage("set_problem")?;
        self.problem = Some(problem);
        Ok(())
    }

    /// Read a problem file, choosing the reader by extension.
    pub fn read_problem(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.require_problem_stage("read_problem")?;
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let problem = match extension.as_deref() {
            Some("mps") => mps::read(path)?,
            _ => return Err(Error::UnsupportedFormat(path.display().to_string())),
        };
        debug!(
            path = %path.display(),
            vars = problem.num_variables(),
            rows = problem.constraints.len(),
            "Problem read"
        );
        self.problem = Some(problem);
        Ok(())
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.params.set(key, value)
    }

    /// Set a parameter from text, as given on a command line.
    pub fn set_param_from_str(&mut self, key: &str, raw: &str) -> Result<()> {
        self.params.set_from_str(key, raw)
    }

    pub fn get_param(&self, key: &str) -> Result<&ParamValue> {
        self.params.get(key)
    }

    pub fn get_bool_param(&self, key: &str) -> Result<bool> {
        self.params.get_bool(key)
    }

    pub fn get_int_param(&self, key: &str) -> Result<i64> {
        self.params.get_int(key)
    }

    pub fn get_real_param(&self, key: &str) -> Result<f64> {
        self.params.get_real(key)
    }

    pub fn get_str_param(&self, key: &str) -> Result<&str> {
        self.params.get_str(key)
    }

    /// Apply a settings file.
    pub fn read_params(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.params.read(path)
    }

    /// Use `lp` for node relaxations instead of the `lp/solver` backend.
    pub fn set_relaxation_solver(&mut self, lp: Box<dyn RelaxationSolver>) {
        self.relaxation = Some(lp);
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.plugins
    }

    pub fn include_branch_rule<R>(&mut self, props: BranchRuleProperties, rule: R) -> Result<()>
    where
        R: BranchRule + 'static,
    {
        self.include_boxed_branch_rule(props, Box::new(rule))
    }

    pub fn include_boxed_branch_rule(
        &mut self,
        props: BranchRuleProperties,
        rule: Box<dyn BranchRule>,
    ) -> Result<()> {
        self.require_problem_stage("include_branch_rule")?;
        let prefix = format!("branching/{}", props.name);
        let max_depth = props
            .max_depth
            .map_or(-1, |d| i64::try_from(d).unwrap_or(i64::MAX));
        let (priority, max_bound_distance) = (props.priority, props.max_bound_distance);
        self.plugins.add_branch_rule(props, rule)?;

        self.params.add_int(
            &format!("{prefix}/priority"),
            "priority of the branching rule",
            priority.into(),
            i32::MIN.into(),
            i32::MAX.into(),
        );
        self.params.add_int(
            &format!("{prefix}/maxdepth"),
            "maximal depth level up to which the rule is applied (-1: no limit)",
            max_depth,
            -1,
            i64::MAX,
        );
        self.params.add_real(
            &format!("{prefix}/maxbounddist"),
            "maximal relative distance from the global lower bound to apply the rule",
            max_bound_distance,
            0.0,
            1.0,
        );
        Ok(())
    }

    pub fn include_node_selector<S>(
        &mut self,
        props: NodeSelectorProperties,
        selector: S,
    ) -> Result<()>
    where
        S: NodeSelector + 'static,
    {
        self.include_boxed_node_selector(props, Box::new(selector))
    }

    pub fn include_boxed_node_selector(
        &mut self,
        props: NodeSelectorProperties,
        selector: Box<dyn NodeSelector>,
    ) -> Result<()> {
        self.require_problem_stage("include_node_selector")?;
        let prefix = format!("nodeselection/{}", props.name);
        let (standard, memsave) = (props.standard_priority, props.memsave_priority);
        self.plugins.add_node_selector(props, selector)?;

        self.params.add_int(
            &format!("{prefix}/stdpriority"),
            "priority of the node selector in standard mode",
            standard.into(),
            i32::MIN.into(),
            i32::MAX.into(),
        );
        self.params.add_int(
            &format!("{prefix}/memsavepriority"),
            "priority of the node selector in memory saving mode",
            memsave.into(),
            i32::MIN.into(),
            i32::MAX.into(),
        );
        Ok(())
    }

    /// Include `mostinf`, `estimate` and `dfs`, skipping any already present.
    pub fn include_default_plugins(&mut self) -> Result<()> {
        self.require_problem_stage("include_default_plugins")?;
        for name in builtin::DEFAULTS {
            if let Some((props, rule)) = builtin::branch_rule(name) {
                if self.plugins.branch_rule(name).is_none() {
                    self.include_boxed_branch_rule(props, rule)?;
                }
            } else if let Some((props, selector)) = builtin::node_selector(name) {
                if self.plugins.node_selector(name).is_none() {
                    self.include_boxed_node_selector(props, selector)?;
                }
            }
        }
        Ok(())
    }

    /// Transform the problem, run branch and bound and report the result in
    /// the original objective sense.
    pub fn solve(&mut self) -> Result<Solution> {
        if self.stage != Stage::Problem {
            self.free_transform()?;
        }
        let settings = Settings::from_params(&self.params)?;
        self.sync_plugin_params()?;
        let problem = self
            .problem
            .as_ref()
            .ok_or_else(|| Error::InvalidProblem("no problem loaded".to_string()))?;

        let transformed: &TransformedProblem = self
            .transformed
            .insert(TransformedProblem::transform(problem, settings.feastol)?);
        self.stage = Stage::Transformed;
        let info = SolveInfo {
            problem: transformed,
            random_seed: settings.random_seed,
        };
        self.plugins.init(&info)?;
        self.plugins.init_solve(&info)?;
        self.plugins.reset_statistics();

        let factory_lp;
        let lp: &dyn RelaxationSolver = match &self.relaxation {
            Some(lp) => lp.as_ref(),
            None => {
                factory_lp = RelaxationFactory::create(settings.backend)?;
                factory_lp.as_ref()
            }
        };

        let outcome = BranchAndBound::new(transformed, lp, &mut self.plugins, &settings).run();
        let exit_solve = self.plugins.exit_solve(&info);
        let outcome = outcome?;
        exit_solve?;
        self.stage = Stage::Solved;

        let mut statistics = outcome.statistics;
        (statistics.branch_rules, statistics.node_selectors) = self.plugins.statistics();
        self.statistics = statistics.clone();

        let primal = outcome
            .solution
            .as_ref()
            .map(|_| transformed.external_value(outcome.primal_bound));
        let dual = outcome
            .dual_bound
            .is_finite()
            .then(|| transformed.external_value(outcome.dual_bound));

        let mut solution = Solution::new(outcome.status, status_message(outcome.status))
            .with_statistics(statistics);
        solution.optimal_value = primal;
        solution.best_bound = dual;
        solution.gap = primal.map(|p| Solution::compute_gap(p, dual.unwrap_or(f64::NAN)));
        solution.variable_values = outcome.solution.unwrap_or_default();
        Ok(solution)
    }

    /// Fire the plugins' `exit` hooks and return to the problem stage.
    pub fn free_transform(&mut self) -> Result<()> {
        if self.stage == Stage::Problem {
            return Ok(());
        }
        self.stage = Stage::Problem;
        match self.transformed.take() {
            Some(transformed) => {
                let info = SolveInfo {
                    problem: &transformed,
                    random_seed: self.params.get_int(super::params::RANDOM_SEED)?.max(0) as u64,
                };
                self.plugins.exit(&info)
            }
            None => Ok(()),
        }
    }

    /// Statistics of the last solve.
    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    fn require_problem_stage(&self, operation: &'static str) -> Result<()> {
        if self.stage == Stage::Problem {
            Ok(())
        } else {
            Err(Error::InvalidStage {
                operation,
                stage: self.stage.as_str(),
            })
        }
    }

    /// Copy the per-plugin parameters into the plugin properties.
    fn sync_plugin_params(&mut self) -> Result<()> {
        let rules: Vec<String> = self.plugins.branch_rule_names().map(String::from).collect();
        for name in rules {
            let prefix = format!("branching/{name}");
            let priority = self.params.get_int(&format!("{prefix}/priority"))?;
            let max_depth = self.params.get_int(&format!("{prefix}/maxdepth"))?;
            let max_bound_distance = self.params.get_real(&format!("{prefix}/maxbounddist"))?;
            if let Some(props) = self.plugins.branch_rule_props_mut(&name) {
                props.priority = i32::try_from(priority)
                    .map_err(|e| Error::invalid_value(format!("{prefix}/priority"), e.to_string()))?;
                props.max_depth = usize::try_from(max_depth).ok();
                props.max_bound_distance = max_bound_distance;
            }
        }

        let selectors: Vec<String> = self.plugins.node_selector_names().map(String::from).collect();
        for name in selectors {
            let prefix = format!("nodeselection/{name}");
            let standard = self.params.get_int(&format!("{prefix}/stdpriority"))?;
            let memsave = self.params.get_int(&format!("{prefix}/memsavepriority"))?;
            if let Some(props) = self.plugins.node_selector_props_mut(&name) {
                props.standard_priority = i32::try_from(standard).map_err(|e| {
                    Error::invalid_value(format!("{prefix}/stdpriority"), e.to_string())
                })?;
                props.memsave_priority = i32::try_from(memsave).map_err(|e| {
                    Error::invalid_value(format!("{prefix}/memsavepriority"), e.to_string())
                })?;
            }
        }
        Ok(())
    }
}

fn status_message(status: SolutionStatus) -> &'static str {
    match status {
        SolutionStatus::Optimal => "Optimal solution found",
        SolutionStatus::Infeasible => "Problem is infeasible: no integer point satisfies all constraints",
        SolutionStatus::Unbounded => "Problem is unbounded",
        SolutionStatus::InfeasibleOrUnbounded => "Problem is infeasible or unbounded",
        SolutionStatus::TimeLimit => "Time limit reached",
        SolutionStatus::NodeLimit => "Node limit reached",
        SolutionStatus::GapLimit => "Gap limit reached",
        SolutionStatus::Interrupted => "Search interrupted by the node selector",
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        if let Err(e) = self.free_transform() {
            warn!(error = %e, "Plugin exit hook failed while dropping the model");
        }
        self.plugins.free();
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("problem", &self.problem.as_ref().map(|p| p.name.as_str()))
            .field("stage", &self.stage)
            .field("plugins", &self.plugins)
            .field("relaxation", &self.relaxation.as_ref().map(|lp| lp.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::domain::{
        Domain, ObjectiveFunction, Relaxation, RelaxationStatus, Variable,
    };
    use crate::plugins::{BranchContext, BranchResult};

    /// Box-constrained LP, enough for problems without rows.
    struct BoxRelaxation;

    impl RelaxationSolver for BoxRelaxation {
        fn solve(&self, problem: &TransformedProblem, domain: &Domain) -> Result<Relaxation> {
            let x: Vec<f64> = problem
                .objective
                .iter()
                .enumerate()
                .map(|(j, &c)| if c < 0.0 { domain.upper(j) } else { domain.lower(j) })
                .collect();
            if x.iter().any(|v| !v.is_finite()) {
                return Ok(Relaxation::without_solution(RelaxationStatus::Unbounded));
            }
            let objective = problem.objective_value(&x);
            Ok(Relaxation::optimal(x, objective))
        }

        fn name(&self) -> &str {
            "box"
        }
    }

    fn model() -> Model {
        let problem = OptimizationProblem::new(
            ObjectiveFunction::minimize(vec![1.0, -2.0]).with_offset(1.0),
            vec![
                Variable::integer("x").with_bounds(-1.0, 3.0),
                Variable::integer("y").with_bounds(0.0, 4.0),
            ],
        );
        let mut model = Model::from_problem(problem);
        model.set_relaxation_solver(Box::new(BoxRelaxation));
        model
    }

    /// Records every lifecycle hook it sees.
    struct Recorder(Rc<RefCell<Vec<&'static str>>>);

    impl BranchRule for Recorder {
        fn init(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
            self.0.borrow_mut().push("init");
            Ok(())
        }

        fn init_solve(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
            self.0.borrow_mut().push("init_solve");
            Ok(())
        }

        fn execute_lp(&mut self, _ctx: &mut BranchContext<'_>) -> Result<BranchResult> {
            self.0.borrow_mut().push("execute_lp");
            Ok(BranchResult::DidNotRun)
        }

        fn exit_solve(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
            self.0.borrow_mut().push("exit_solve");
            Ok(())
        }

        fn exit(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
            self.0.borrow_mut().push("exit");
            Ok(())
        }

        fn free(&mut self) {
            self.0.borrow_mut().push("free");
        }
    }

    #[test]
    fn test_solve_reports_original_sense() {
        let mut model = model();
        model.include_default_plugins().unwrap();
        let solution = model.solve().unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.variable_values, vec![-1.0, 4.0]);
        assert_eq!(solution.optimal_value, Some(-8.0));
        assert_eq!(solution.best_bound, Some(-8.0));
        assert_eq!(solution.gap, Some(0.0));
        assert_eq!(model.stage(), Stage::Solved);
    }

    #[test]
    fn test_solve_without_problem() {
        let mut model = Model::new();
        model.include_default_plugins().unwrap();
        assert!(matches!(model.solve(), Err(Error::InvalidProblem(_))));
    }

    #[test]
    fn test_plugins_only_in_problem_stage() {
        let mut model = model();
        model.include_default_plugins().unwrap();
        model.solve().unwrap();

        let err = model
            .include_branch_rule(
                builtin::LeastInfeasibleBranching::properties(),
                builtin::LeastInfeasibleBranching,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStage { stage: "SOLVED", .. }));

        model.free_transform().unwrap();
        assert_eq!(model.stage(), Stage::Problem);
        model
            .include_branch_rule(
                builtin::LeastInfeasibleBranching::properties(),
                builtin::LeastInfeasibleBranching,
            )
            .unwrap();
    }

    #[test]
    fn test_plugin_params_are_registered_and_applied() {
        let mut model = model();
        model.include_default_plugins().unwrap();
        assert_eq!(model.get_int_param("branching/mostinf/priority").unwrap(), -1000);
        assert_eq!(model.get_int_param("branching/mostinf/maxdepth").unwrap(), -1);
        assert_eq!(model.get_real_param("branching/mostinf/maxbounddist").unwrap(), 1.0);
        assert_eq!(model.get_int_param("nodeselection/dfs/memsavepriority").unwrap(), 100_000);

        model.set_param("nodeselection/dfs/stdpriority", 500_000).unwrap();
        model.set_param("branching/mostinf/maxdepth", 7).unwrap();
        model.solve().unwrap();

        assert_eq!(model.plugins().node_selector("dfs").unwrap().standard_priority, 500_000);
        assert_eq!(model.plugins().branch_rule("mostinf").unwrap().max_depth, Some(7));
        assert!(model.statistics().node_selector("dfs").unwrap().calls > 0);
        assert_eq!(model.statistics().node_selector("estimate").unwrap().calls, 0);
    }

    #[test]
    fn test_include_default_plugins_is_idempotent() {
        let mut model = model();
        model.include_default_plugins().unwrap();
        model.include_default_plugins().unwrap();
        assert_eq!(model.plugins().num_branch_rules(), 1);
        assert_eq!(model.plugins().num_node_selectors(), 2);
    }

    #[test]
    fn test_duplicate_plugin() {
        let mut model = model();
        model.include_default_plugins().unwrap();
        let err = model
            .include_node_selector(builtin::DepthFirstSelector::properties(), builtin::DepthFirstSelector)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePlugin(name) if name == "dfs"));
    }

    #[test]
    fn test_lifecycle_hook_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut model = model();
            model
                .include_branch_rule(
                    BranchRuleProperties::new("recorder", "").with_priority(1),
                    Recorder(Rc::clone(&log)),
                )
                .unwrap();
            model.include_default_plugins().unwrap();
            model.solve().unwrap();
        }
        let log = log.borrow();
        assert_eq!(log.first(), Some(&"init"));
        assert_eq!(log[1], "init_solve");
        assert_eq!(&log[log.len() - 3..], &["exit_solve", "exit", "free"]);
    }

    #[test]
    fn test_unknown_extension() {
        let mut model = Model::new();
        let err = model.read_problem("instance.lp").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_node_selector() {
        let mut model = model();
        assert!(matches!(model.solve(), Err(Error::MissingPlugin(_))));
    }
}
