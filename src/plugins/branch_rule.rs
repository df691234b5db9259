// Branching-rule protocol.
//
// A branching rule is called at every node whose LP solution has fractional
// integer variables. It receives the candidates through a [`BranchContext`],
// acts on the node through the context (branch or tighten bounds) and returns
// a [`BranchResult`] telling the engine what it did.

use crate::domain::{BoundChange, BoundKind, Domain, Error, Result, TransformedProblem};
use crate::search::Node;

use super::SolveInfo;

/// Registration data of a branching rule.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRuleProperties {
    pub name: String,
    pub description: String,
    /// Rules are tried in decreasing priority.
    pub priority: i32,
    /// Deepest node depth at which the rule runs; `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Maximal relative distance of the node's dual bound from the global
    /// dual bound, measured against the cutoff bound. `0.0` restricts the rule
    /// to the current best nodes, `1.0` allows it everywhere.
    pub max_bound_distance: f64,
}

impl BranchRuleProperties {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            priority: 0,
            max_depth: None,
            max_bound_distance: 1.0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_bound_distance(mut self, distance: f64) -> Self {
        self.max_bound_distance = distance;
        self
    }

    /// Whether the rule may run at a node of `depth` whose relative bound
    /// distance is `bound_distance`.
    pub fn is_eligible(&self, depth: usize, bound_distance: f64) -> bool {
        let depth_ok = self.max_depth.map_or(true, |max| depth <= max);
        depth_ok && bound_distance <= self.max_bound_distance
    }
}

/// Relative distance of a node's lower bound from the global lower bound,
/// normalized by the gap to the cutoff bound.
pub fn bound_distance(node_lower: f64, global_lower: f64, cutoff: f64) -> f64 {
    if !global_lower.is_finite() || !cutoff.is_finite() || cutoff <= global_lower {
        return 0.0;
    }
    ((node_lower - global_lower) / (cutoff - global_lower)).max(0.0)
}

/// What a branching rule did at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchResult {
    /// Children were created through [`BranchContext::branch`].
    Branched,
    /// Local bounds were tightened; the node LP is solved again.
    ReducedDomain,
    /// The node was detected to be infeasible or dominated.
    CutOff,
    /// The rule ran but found nothing to do.
    DidNotFind,
    /// The rule chose not to run.
    DidNotRun,
}

/// An integer variable with a fractional LP value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchCandidate {
    pub var: usize,
    /// LP solution value.
    pub value: f64,
    /// Fractional part `value - floor(value)`, strictly inside `(0, 1)`.
    pub frac: f64,
}

impl BranchCandidate {
    pub fn new(var: usize, value: f64) -> Self {
        Self {
            var,
            value,
            frac: value - value.floor(),
        }
    }

    /// Distance to the nearest integer, `min(frac, 1 - frac)`.
    pub fn infeasibility(&self) -> f64 {
        self.frac.min(1.0 - self.frac)
    }
}

/// Collect the fractional candidates of an LP solution.
pub fn fractional_candidates(
    problem: &TransformedProblem,
    x: &[f64],
    feastol: f64,
) -> Vec<BranchCandidate> {
    problem
        .integral
        .iter()
        .zip(x)
        .enumerate()
        .filter(|(_, (&int, &v))| int && (v - v.round()).abs() > feastol)
        .map(|(j, (_, &v))| BranchCandidate::new(j, v))
        .collect()
}

/// A branching decision recorded by the context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branching {
    pub candidate: BranchCandidate,
    pub down_priority: f64,
    pub up_priority: f64,
}

/// Everything a branching rule may look at and do at one node.
pub struct BranchContext<'a> {
    rule: &'a str,
    node: &'a Node,
    problem: &'a TransformedProblem,
    domain: &'a Domain,
    candidates: &'a [BranchCandidate],
    lp_solution: &'a [f64],
    lp_objective: f64,
    incumbent: Option<f64>,
    cutoff: f64,
    branching: Option<Branching>,
    tightenings: Vec<BoundChange>,
}

impl<'a> BranchContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        rule: &'a str,
        node: &'a Node,
        problem: &'a TransformedProblem,
        domain: &'a Domain,
        candidates: &'a [BranchCandidate],
        lp_solution: &'a [f64],
        lp_objective: f64,
        incumbent: Option<f64>,
        cutoff: f64,
    ) -> Self {
        Self {
            rule,
            node,
            problem,
            domain,
            candidates,
            lp_solution,
            lp_objective,
            incumbent,
            cutoff,
            branching: None,
            tightenings: Vec::new(),
        }
    }

    pub fn node(&self) -> &Node {
        self.node
    }

    pub fn depth(&self) -> usize {
        self.node.depth()
    }

    pub fn candidates(&self) -> &[BranchCandidate] {
        self.candidates
    }

    pub fn lp_objective(&self) -> f64 {
        self.lp_objective
    }

    pub fn lp_solution(&self) -> &[f64] {
        self.lp_solution
    }

    pub fn num_vars(&self) -> usize {
        self.domain.len()
    }

    /// Local lower bound of `var`, `None` if there is no such variable.
    pub fn lower_bound(&self, var: usize) -> Option<f64> {
        self.domain.lower_bounds().get(var).copied()
    }

    pub fn upper_bound(&self, var: usize) -> Option<f64> {
        self.domain.upper_bounds().get(var).copied()
    }

    pub fn var_name(&self, var: usize) -> Option<&str> {
        self.problem.var_names.get(var).map(String::as_str)
    }

    /// Minimization objective coefficient of `var` in the transformed problem.
    pub fn objective_coefficient(&self, var: usize) -> Option<f64> {
        self.problem.objective.get(var).copied()
    }

    /// Incumbent value in minimization form, if one has been found.
    pub fn incumbent(&self) -> Option<f64> {
        self.incumbent
    }

    pub fn cutoff_bound(&self) -> f64 {
        self.cutoff
    }

    /// Branch on candidate `var`, creating `x <= floor(v)` and `x >= ceil(v)`.
    ///
    /// The child on the side closer to the LP value gets the higher priority.
    pub fn branch(&mut self, var: usize) -> Result<()> {
        let candidate = self.candidate(var)?;
        self.branch_with_priorities(var, 1.0 - candidate.frac, candidate.frac)
    }

    /// Branch on candidate `var` with explicit child priorities.
    pub fn branch_with_priorities(
        &mut self,
        var: usize,
        down_priority: f64,
        up_priority: f64,
    ) -> Result<()> {
        let candidate = self.candidate(var)?;
        if self.branching.is_some() {
            return Err(Error::plugin(self.rule, "branched twice at the same node"));
        }
        if !down_priority.is_finite() || !up_priority.is_finite() {
            return Err(Error::plugin(self.rule, "child priorities must be finite"));
        }
        self.branching = Some(Branching {
            candidate,
            down_priority,
            up_priority,
        });
        Ok(())
    }

    /// Tighten the local lower bound of `var`. Returns whether it tightened.
    pub fn tighten_lower(&mut self, var: usize, value: f64) -> Result<bool> {
        self.tighten(var, BoundKind::Lower, value)
    }

    /// Tighten the local upper bound of `var`. Returns whether it tightened.
    pub fn tighten_upper(&mut self, var: usize, value: f64) -> Result<bool> {
        self.tighten(var, BoundKind::Upper, value)
    }

    fn tighten(&mut self, var: usize, kind: BoundKind, value: f64) -> Result<bool> {
        if var >= self.domain.len() {
            return Err(Error::plugin(self.rule, format!("unknown variable {}", var)));
        }
        if value.is_nan() {
            return Err(Error::plugin(self.rule, "bound must not be NaN"));
        }
        let value = match (kind, self.problem.integral[var]) {
            (BoundKind::Lower, true) => value.ceil(),
            (BoundKind::Upper, true) => value.floor(),
            _ => value,
        };
        let current = self
            .tightenings
            .iter()
            .filter(|c| c.var == var && c.kind == kind)
            .map(|c| c.value)
            .fold(
                match kind {
                    BoundKind::Lower => self.domain.lower(var),
                    BoundKind::Upper => self.domain.upper(var),
                },
                |acc, v| match kind {
                    BoundKind::Lower => acc.max(v),
                    BoundKind::Upper => acc.min(v),
                },
            );
        let tightens = match kind {
            BoundKind::Lower => value > current,
            BoundKind::Upper => value < current,
        };
        if tightens {
            self.tightenings.push(BoundChange { var, kind, value });
        }
        Ok(tightens)
    }

    fn candidate(&self, var: usize) -> Result<BranchCandidate> {
        self.candidates
            .iter()
            .find(|c| c.var == var)
            .copied()
            .ok_or_else(|| {
                Error::plugin(
                    self.rule,
                    format!("variable {} is not a fractional branching candidate", var),
                )
            })
    }

    pub(crate) fn into_actions(self) -> (Option<Branching>, Vec<BoundChange>) {
        (self.branching, self.tightenings)
    }
}

/// A branching rule plugin.
///
/// All hooks but [`BranchRule::execute_lp`] default to doing nothing.
pub trait BranchRule {
    /// Called after the problem has been transformed.
    fn init(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    /// Called right before the search starts.
    fn init_solve(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    /// Called at a node whose LP solution has fractional candidates.
    fn execute_lp(&mut self, ctx: &mut BranchContext<'_>) -> Result<BranchResult>;

    /// Called after the search finished.
    fn exit_solve(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    /// Called before the transformed problem is freed.
    fn exit(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once when the model releases the plugin.
    fn free(&mut self) {}
}
