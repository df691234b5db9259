// Branch-and-bound driver.
//
// Node LPs go to a [`RelaxationSolver`]. Branching and node selection are
// delegated to the plugins registered in a [`PluginSet`].

use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::application::Settings;
use crate::domain::{
    BoundChange, Domain, Error, Relaxation, RelaxationSolver, RelaxationStatus, Result, Solution,
    SolutionStatus, SolverStatistics, TransformedProblem,
};
use crate::plugins::{
    bound_distance, fractional_candidates, BranchCandidate, BranchContext, BranchResult,
    Branching, PluginSet, Selection,
};

use super::{IncumbentTracker, Node, Tree};

/// Result of a search, in the minimization form of the transformed problem.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub status: SolutionStatus,
    /// Best integer-feasible point found.
    pub solution: Option<Vec<f64>>,
    /// Incumbent objective, `+inf` without a solution.
    pub primal_bound: f64,
    /// Proven lower bound on the optimum.
    pub dual_bound: f64,
    /// Search counters, without the per-plugin entries.
    pub statistics: SolverStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeOutcome {
    Pruned,
    Feasible,
    Branched,
    /// The relaxation is unbounded: the search stops with this status.
    Unbounded(SolutionStatus),
}

#[derive(Debug)]
enum BranchDecision {
    Branch(Branching),
    Reduce(Vec<BoundChange>),
    CutOff,
}

/// One branch-and-bound run.
pub struct BranchAndBound<'a> {
    problem: &'a TransformedProblem,
    lp: &'a dyn RelaxationSolver,
    plugins: &'a mut PluginSet,
    settings: &'a Settings,
    root_domain: Domain,
    tree: Tree,
    incumbent: IncumbentTracker,
    stats: SolverStatistics,
    memsave: bool,
    start: Instant,
}

impl<'a> BranchAndBound<'a> {
    pub fn new(
        problem: &'a TransformedProblem,
        lp: &'a dyn RelaxationSolver,
        plugins: &'a mut PluginSet,
        settings: &'a Settings,
    ) -> Self {
        Self {
            problem,
            lp,
            plugins,
            settings,
            root_domain: problem.root_domain(),
            tree: Tree::with_root(Node::root()),
            incumbent: IncumbentTracker::new(),
            stats: SolverStatistics::default(),
            memsave: false,
            start: Instant::now(),
        }
    }

    /// Run the search until the tree is exhausted, a limit is hit or the
    /// node selector stops.
    pub fn run(mut self) -> Result<SearchOutcome> {
        if self.plugins.num_node_selectors() == 0 {
            return Err(Error::MissingPlugin("node selector"));
        }
        self.plugins.sort_branch_rules();

        info!(
            problem = %self.problem.name,
            vars = self.problem.num_vars(),
            integral = self.problem.num_integral(),
            rows = self.problem.num_rows(),
            lp = self.lp.name(),
            "Starting branch and bound"
        );

        let status = loop {
            if self.tree.is_empty() {
                break if self.incumbent.has_incumbent() {
                    SolutionStatus::Optimal
                } else {
                    SolutionStatus::Infeasible
                };
            }
            if let Some(status) = self.check_limits() {
                break status;
            }

            let Some(node) = self.select_node()? else {
                debug!(open = self.tree.len(), "Node selector stopped the search");
                break SolutionStatus::Interrupted;
            };

            let depth = node.depth();
            let id = node.id();
            let outcome = self.process_node(node)?;
            trace!(node = id, depth, ?outcome, "Node processed");

            if let NodeOutcome::Unbounded(status) = outcome {
                self.tree.clear();
                break status;
            }
            self.display_progress();
        };

        Ok(self.finish(status))
    }

    fn check_limits(&self) -> Option<SolutionStatus> {
        if let Some(limit) = self.settings.node_limit {
            if self.stats.nodes_explored >= limit {
                return Some(SolutionStatus::NodeLimit);
            }
        }
        if let Some(limit) = self.settings.time_limit {
            if self.start.elapsed().as_secs_f64() >= limit {
                return Some(SolutionStatus::TimeLimit);
            }
        }
        if let Some(primal) = self.incumbent.value() {
            let gap = Solution::compute_gap(primal, self.tree.lower_bound());
            if gap <= self.settings.gap_limit {
                return Some(SolutionStatus::GapLimit);
            }
        }
        None
    }

    /// Ask the active node selector for the next node and focus it.
    fn select_node(&mut self) -> Result<Option<Node>> {
        let memsave = self
            .settings
            .max_open_nodes
            .is_some_and(|max| self.tree.len() > max);
        if memsave != self.memsave {
            debug!(open = self.tree.len(), memsave, "Switching node selection mode");
            self.memsave = memsave;
        }

        let index = self
            .plugins
            .active_node_selector(memsave)
            .ok_or(Error::MissingPlugin("node selector"))?;
        let entry = self.plugins.node_selector_entry_mut(index);
        entry.stats.calls += 1;

        match entry.selector.select(&self.tree.open_nodes())? {
            Selection::Stop => Ok(None),
            Selection::Node(id) => match self.tree.focus(id) {
                Some((node, category)) => {
                    trace!(node = id, ?category, selector = %entry.props.name, "Node selected");
                    Ok(Some(node))
                }
                None => Err(Error::InvalidSelection {
                    selector: entry.props.name.clone(),
                    node: id,
                }),
            },
        }
    }

    fn process_node(&mut self, mut node: Node) -> Result<NodeOutcome> {
        self.stats.nodes_explored += 1;
        self.stats.max_depth = self.stats.max_depth.max(node.depth());

        let cutoff = self.incumbent.cutoff();
        if node.can_prune(cutoff) {
            self.stats.nodes_pruned += 1;
            return Ok(NodeOutcome::Pruned);
        }

        let feastol = self.settings.feastol;
        let mut domain = node.domain(&self.root_domain);
        loop {
            if domain.is_infeasible(feastol) {
                self.stats.nodes_pruned += 1;
                return Ok(NodeOutcome::Pruned);
            }

            let relaxation = self.lp.solve(self.problem, &domain)?;
            self.stats.lp_solves += 1;

            match relaxation.status {
                RelaxationStatus::Optimal => {}
                RelaxationStatus::Infeasible => {
                    self.stats.nodes_pruned += 1;
                    return Ok(NodeOutcome::Pruned);
                }
                RelaxationStatus::Unbounded => {
                    return Ok(NodeOutcome::Unbounded(SolutionStatus::Unbounded));
                }
                RelaxationStatus::InfeasibleOrUnbounded if node.depth() == 0 => {
                    return Ok(NodeOutcome::Unbounded(SolutionStatus::InfeasibleOrUnbounded));
                }
                RelaxationStatus::InfeasibleOrUnbounded => {
                    // Below the root the LP was bounded, so this is infeasibility.
                    self.stats.nodes_pruned += 1;
                    return Ok(NodeOutcome::Pruned);
                }
            }

            node.raise_lower_bound(relaxation.objective);
            if node.can_prune(cutoff) {
                self.stats.nodes_pruned += 1;
                return Ok(NodeOutcome::Pruned);
            }

            let candidates = fractional_candidates(self.problem, &relaxation.x, feastol);
            if candidates.is_empty() {
                self.record_solution(&relaxation.x);
                return Ok(NodeOutcome::Feasible);
            }

            match self.branch(&node, &domain, &candidates, &relaxation)? {
                BranchDecision::Branch(branching) => {
                    self.create_children(&node, branching, &candidates, relaxation.objective);
                    return Ok(NodeOutcome::Branched);
                }
                BranchDecision::Reduce(changes) => {
                    trace!(node = node.id(), count = changes.len(), "Domain reduced, resolving");
                    for change in changes {
                        domain.apply(&change);
                        node.push_bound_change(change);
                    }
                }
                BranchDecision::CutOff => {
                    self.stats.nodes_pruned += 1;
                    return Ok(NodeOutcome::Pruned);
                }
            }
        }
    }

    /// Run the eligible branching rules in priority order until one acts.
    fn branch(
        &mut self,
        node: &Node,
        domain: &Domain,
        candidates: &[BranchCandidate],
        relaxation: &Relaxation,
    ) -> Result<BranchDecision> {
        let global_lower = self.tree.lower_bound().min(node.lower_bound());
        let incumbent = self.incumbent.value();
        let cutoff = self.incumbent.cutoff();
        let distance = bound_distance(node.lower_bound(), global_lower, cutoff);

        for entry in self.plugins.branch_rules_mut() {
            if !entry.props.is_eligible(node.depth(), distance) {
                continue;
            }
            entry.stats.calls += 1;

            let mut ctx = BranchContext::new(
                &entry.props.name,
                node,
                self.problem,
                domain,
                candidates,
                &relaxation.x,
                relaxation.objective,
                incumbent,
                cutoff,
            );
            let result = entry.rule.execute_lp(&mut ctx)?;
            let (branching, tightenings) = ctx.into_actions();
            trace!(rule = %entry.props.name, node = node.id(), ?result, "Branching rule executed");

            let name = &entry.props.name;
            match (result, branching) {
                (BranchResult::Branched, Some(branching)) if tightenings.is_empty() => {
                    entry.stats.branchings += 1;
                    return Ok(BranchDecision::Branch(branching));
                }
                (BranchResult::ReducedDomain, None) if !tightenings.is_empty() => {
                    return Ok(BranchDecision::Reduce(tightenings));
                }
                (BranchResult::CutOff, None) if tightenings.is_empty() => {
                    return Ok(BranchDecision::CutOff);
                }
                (BranchResult::DidNotFind | BranchResult::DidNotRun, None)
                    if tightenings.is_empty() => {}
                (BranchResult::Branched, None) => {
                    return Err(Error::plugin(name, "returned Branched without branching"));
                }
                (BranchResult::ReducedDomain, None) => {
                    return Err(Error::plugin(
                        name,
                        "returned ReducedDomain without tightening a bound",
                    ));
                }
                (result, branching) => {
                    return Err(Error::plugin(
                        name,
                        format!(
                            "returned {result:?} but recorded {} and {} bound change(s)",
                            if branching.is_some() { "a branching" } else { "no branching" },
                            tightenings.len()
                        ),
                    ));
                }
            }
        }

        let candidate = candidates[0];
        warn!(
            node = node.id(),
            var = %self.problem.var_names[candidate.var],
            "No branching rule branched, branching on the first candidate"
        );
        Ok(BranchDecision::Branch(Branching {
            candidate,
            down_priority: 1.0 - candidate.frac,
            up_priority: candidate.frac,
        }))
    }

    fn create_children(
        &mut self,
        node: &Node,
        branching: Branching,
        candidates: &[BranchCandidate],
        lp_objective: f64,
    ) {
        let estimate = lp_objective
            + candidates
                .iter()
                .map(|c| c.infeasibility() * self.problem.objective[c.var].abs())
                .sum::<f64>();
        let BranchCandidate { var, value, .. } = branching.candidate;

        let down_id = self.tree.allocate_id();
        let down = node.child(
            down_id,
            BoundChange::down(var, value),
            node.lower_bound(),
            estimate,
            branching.down_priority,
        );
        let up_id = self.tree.allocate_id();
        let up = node.child(
            up_id,
            BoundChange::up(var, value),
            node.lower_bound(),
            estimate,
            branching.up_priority,
        );

        debug!(
            node = node.id(),
            depth = node.depth(),
            var = %self.problem.var_names[var],
            value,
            down = down_id,
            up = up_id,
            "Branched"
        );
        self.tree.add_child(down);
        self.tree.add_child(up);
    }

    fn record_solution(&mut self, x: &[f64]) {
        let mut point = x.to_vec();
        for (value, &integral) in point.iter_mut().zip(&self.problem.integral) {
            if integral {
                *value = value.round();
            }
        }
        let objective = self.problem.objective_value(&point);

        if self.incumbent.update(&point, objective) {
            let pruned = self.tree.prune(objective);
            self.stats.nodes_pruned += pruned as u64;
            if self.settings.verblevel >= 3 {
                info!(
                    objective = self.problem.external_value(objective),
                    nodes = self.stats.nodes_explored,
                    pruned,
                    "New incumbent"
                );
            }
        }
    }

    fn display_progress(&self) {
        let nodes = self.stats.nodes_explored;
        if !progress_due(self.settings.verblevel, self.settings.display_freq, nodes) {
            return;
        }
        let dual = self.tree.lower_bound().min(self.incumbent.cutoff());
        info!(
            nodes,
            open = self.tree.len(),
            lp_solves = self.stats.lp_solves,
            dual_bound = self.problem.external_value(dual),
            primal_bound = self.incumbent.value().map(|v| self.problem.external_value(v)),
            gap = Solution::compute_gap(self.incumbent.cutoff(), dual),
            elapsed_s = self.start.elapsed().as_secs_f64(),
            "Progress"
        );
    }

    fn finish(mut self, status: SolutionStatus) -> SearchOutcome {
        let primal_bound = self.incumbent.cutoff();
        let dual_bound = match status {
            SolutionStatus::Optimal => primal_bound,
            SolutionStatus::Infeasible => f64::INFINITY,
            SolutionStatus::Unbounded | SolutionStatus::InfeasibleOrUnbounded => {
                f64::NEG_INFINITY
            }
            _ => self.tree.lower_bound().min(primal_bound),
        };

        self.stats.incumbent_updates = self.incumbent.update_count;
        self.stats.solve_time_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        info!(
            %status,
            nodes = self.stats.nodes_explored,
            lp_solves = self.stats.lp_solves,
            time_ms = self.stats.solve_time_ms,
            "Branch and bound finished"
        );

        SearchOutcome {
            status,
            solution: self.incumbent.solution,
            primal_bound,
            dual_bound,
            statistics: self.stats,
        }
    }
}

/// Whether a progress line is printed after `nodes` processed nodes: every
/// node from verbosity 5, every `display_freq` nodes from verbosity 3.
fn progress_due(verblevel: u8, display_freq: u64, nodes: u64) -> bool {
    verblevel >= 5 || (verblevel >= 3 && display_freq > 0 && nodes % display_freq == 0)
}
