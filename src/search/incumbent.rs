// Best known feasible solution.

/// Tracks the incumbent of a minimization search.
#[derive(Debug, Clone)]
pub struct IncumbentTracker {
    /// Current best solution (if any).
    pub solution: Option<Vec<f64>>,

    /// Objective value of the incumbent, `+inf` until one is found.
    pub obj_val: f64,

    /// Number of times the incumbent was improved.
    pub update_count: u64,
}

impl Default for IncumbentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IncumbentTracker {
    pub fn new() -> Self {
        Self {
            solution: None,
            obj_val: f64::INFINITY,
            update_count: 0,
        }
    }

    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }

    /// Incumbent value, if any.
    pub fn value(&self) -> Option<f64> {
        self.solution.as_ref().map(|_| self.obj_val)
    }

    /// Cutoff bound: nodes whose lower bound reaches it cannot improve.
    pub fn cutoff(&self) -> f64 {
        self.obj_val
    }

    /// Replace the incumbent if `obj` is strictly better.
    ///
    /// Returns true if the incumbent was improved.
    pub fn update(&mut self, x: &[f64], obj: f64) -> bool {
        if obj < self.obj_val - 1e-9 {
            self.solution = Some(x.to_vec());
            self.obj_val = obj;
            self.update_count += 1;
            true
        } else {
            false
        }
    }
}
