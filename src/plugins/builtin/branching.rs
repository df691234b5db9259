// Built-in branching rules.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::domain::Result;
use crate::plugins::{
    BranchCandidate, BranchContext, BranchResult, BranchRule, BranchRuleProperties, SolveInfo,
};

/// Infeasibilities closer than this count as a tie.
const TIE_TOL: f64 = 1e-9;

/// Branch on the candidate whose fractional part is closest to 0.5.
#[derive(Debug, Default, Clone)]
pub struct MostInfeasibleBranching;

impl MostInfeasibleBranching {
    pub const NAME: &'static str = "mostinf";

    pub fn properties() -> BranchRuleProperties {
        BranchRuleProperties::new(Self::NAME, "most infeasible branching")
            .with_priority(-1000)
    }
}

impl BranchRule for MostInfeasibleBranching {
    fn execute_lp(&mut self, ctx: &mut BranchContext<'_>) -> Result<BranchResult> {
        let Some(best) = pick(ctx.candidates(), |c, best| {
            c.infeasibility() > best.infeasibility() + TIE_TOL
        })
        else {
            return Ok(BranchResult::DidNotRun);
        };
        trace!(var = best.var, frac = best.frac, "mostinf picked candidate");
        ctx.branch(best.var)?;
        Ok(BranchResult::Branched)
    }
}

/// Branch on the candidate whose fractional part is closest to an integer.
#[derive(Debug, Default, Clone)]
pub struct LeastInfeasibleBranching;

impl LeastInfeasibleBranching {
    pub const NAME: &'static str = "leastinf";

    pub fn properties() -> BranchRuleProperties {
        BranchRuleProperties::new(Self::NAME, "least infeasible branching").with_priority(-50)
    }
}

impl BranchRule for LeastInfeasibleBranching {
    fn execute_lp(&mut self, ctx: &mut BranchContext<'_>) -> Result<BranchResult> {
        let Some(best) = pick(ctx.candidates(), |c, best| {
            c.infeasibility() < best.infeasibility() - TIE_TOL
        })
        else {
            return Ok(BranchResult::DidNotRun);
        };
        trace!(var = best.var, frac = best.frac, "leastinf picked candidate");
        ctx.branch(best.var)?;
        Ok(BranchResult::Branched)
    }
}

/// Branch on a uniformly random candidate.
///
/// The generator is reseeded at the start of every solve, from the explicit
/// seed if one was given and from `randomization/seed` otherwise, so repeated
/// solves make the same choices.
#[derive(Debug, Clone)]
pub struct RandomBranching {
    seed: Option<u64>,
    rng: StdRng,
}

impl RandomBranching {
    pub const NAME: &'static str = "random";

    pub fn new() -> Self {
        Self {
            seed: None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn properties() -> BranchRuleProperties {
        BranchRuleProperties::new(Self::NAME, "random variable branching").with_priority(-100_000)
    }
}

impl Default for RandomBranching {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchRule for RandomBranching {
    fn init_solve(&mut self, info: &SolveInfo<'_>) -> Result<()> {
        self.rng = StdRng::seed_from_u64(self.seed.unwrap_or(info.random_seed));
        Ok(())
    }

    fn execute_lp(&mut self, ctx: &mut BranchContext<'_>) -> Result<BranchResult> {
        let n = ctx.candidates().len();
        if n == 0 {
            return Ok(BranchResult::DidNotRun);
        }
        let var = ctx.candidates()[self.rng.gen_range(0..n)].var;
        trace!(var, "random picked candidate");
        ctx.branch(var)?;
        Ok(BranchResult::Branched)
    }
}

// First candidate wins ties.
fn pick<F>(candidates: &[BranchCandidate], better: F) -> Option<BranchCandidate>
where
    F: Fn(&BranchCandidate, &BranchCandidate) -> bool,
{
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if !better(c, &b) => Some(b),
        _ => Some(*c),
    })
}
