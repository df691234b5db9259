// Registered plugins and their call statistics.

use crate::domain::{Error, PluginStatistics, Result};

use super::{BranchRule, BranchRuleProperties, NodeSelector, NodeSelectorProperties, SolveInfo};

pub(crate) struct BranchRuleEntry {
    pub props: BranchRuleProperties,
    pub rule: Box<dyn BranchRule>,
    pub stats: PluginStatistics,
}

pub(crate) struct NodeSelectorEntry {
    pub props: NodeSelectorProperties,
    pub selector: Box<dyn NodeSelector>,
    pub stats: PluginStatistics,
}

/// Plugin registry owned by a model.
#[derive(Default)]
pub struct PluginSet {
    branch_rules: Vec<BranchRuleEntry>,
    node_selectors: Vec<NodeSelectorEntry>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch_rule(
        &mut self,
        props: BranchRuleProperties,
        rule: Box<dyn BranchRule>,
    ) -> Result<()> {
        if self.branch_rule(&props.name).is_some() {
            return Err(Error::DuplicatePlugin(props.name));
        }
        let stats = PluginStatistics {
            name: props.name.clone(),
            ..Default::default()
        };
        self.branch_rules.push(BranchRuleEntry { props, rule, stats });
        Ok(())
    }

    pub fn add_node_selector(
        &mut self,
        props: NodeSelectorProperties,
        selector: Box<dyn NodeSelector>,
    ) -> Result<()> {
        if self.node_selector(&props.name).is_some() {
            return Err(Error::DuplicatePlugin(props.name));
        }
        let stats = PluginStatistics {
            name: props.name.clone(),
            ..Default::default()
        };
        self.node_selectors.push(NodeSelectorEntry {
            props,
            selector,
            stats,
        });
        Ok(())
    }

    pub fn branch_rule(&self, name: &str) -> Option<&BranchRuleProperties> {
        self.branch_rules
            .iter()
            .find(|e| e.props.name == name)
            .map(|e| &e.props)
    }

    pub fn node_selector(&self, name: &str) -> Option<&NodeSelectorProperties> {
        self.node_selectors
            .iter()
            .find(|e| e.props.name == name)
            .map(|e| &e.props)
    }

    pub fn branch_rule_names(&self) -> impl Iterator<Item = &str> {
        self.branch_rules.iter().map(|e| e.props.name.as_str())
    }

    pub fn node_selector_names(&self) -> impl Iterator<Item = &str> {
        self.node_selectors.iter().map(|e| e.props.name.as_str())
    }

    pub fn num_branch_rules(&self) -> usize {
        self.branch_rules.len()
    }

    pub fn num_node_selectors(&self) -> usize {
        self.node_selectors.len()
    }

    pub(crate) fn branch_rule_props_mut(&mut self, name: &str) -> Option<&mut BranchRuleProperties> {
        self.branch_rules
            .iter_mut()
            .find(|e| e.props.name == name)
            .map(|e| &mut e.props)
    }

    pub(crate) fn node_selector_props_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut NodeSelectorProperties> {
        self.node_selectors
            .iter_mut()
            .find(|e| e.props.name == name)
            .map(|e| &mut e.props)
    }

    /// Order rules by decreasing priority, then by name.
    pub(crate) fn sort_branch_rules(&mut self) {
        self.branch_rules.sort_by(|a, b| {
            b.props
                .priority
                .cmp(&a.props.priority)
                .then_with(|| a.props.name.cmp(&b.props.name))
        });
    }

    pub(crate) fn branch_rules_mut(&mut self) -> &mut [BranchRuleEntry] {
        &mut self.branch_rules
    }

    /// Index of the selector with the highest priority for the given mode.
    /// Ties go to the earlier registration.
    pub(crate) fn active_node_selector(&self, memsave: bool) -> Option<usize> {
        self.node_selectors
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, i32)>, (i, e)| {
                let p = e.props.priority(memsave);
                match best {
                    Some((_, bp)) if p <= bp => best,
                    _ => Some((i, p)),
                }
            })
            .map(|(i, _)| i)
    }

    pub(crate) fn node_selector_entry_mut(&mut self, index: usize) -> &mut NodeSelectorEntry {
        &mut self.node_selectors[index]
    }

    pub(crate) fn reset_statistics(&mut self) {
        for e in &mut self.branch_rules {
            e.stats.calls = 0;
            e.stats.branchings = 0;
        }
        for e in &mut self.node_selectors {
            e.stats.calls = 0;
            e.stats.branchings = 0;
        }
    }

    pub(crate) fn statistics(&self) -> (Vec<PluginStatistics>, Vec<PluginStatistics>) {
        (
            self.branch_rules.iter().map(|e| e.stats.clone()).collect(),
            self.node_selectors.iter().map(|e| e.stats.clone()).collect(),
        )
    }

    pub(crate) fn init(&mut self, info: &SolveInfo<'_>) -> Result<()> {
        for e in &mut self.branch_rules {
            e.rule.init(info)?;
        }
        for e in &mut self.node_selectors {
            e.selector.init(info)?;
        }
        Ok(())
    }

    pub(crate) fn init_solve(&mut self, info: &SolveInfo<'_>) -> Result<()> {
        for e in &mut self.branch_rules {
            e.rule.init_solve(info)?;
        }
        for e in &mut self.node_selectors {
            e.selector.init_solve(info)?;
        }
        Ok(())
    }

    pub(crate) fn exit_solve(&mut self, info: &SolveInfo<'_>) -> Result<()> {
        for e in &mut self.branch_rules {
            e.rule.exit_solve(info)?;
        }
        for e in &mut self.node_selectors {
            e.selector.exit_solve(info)?;
        }
        Ok(())
    }

    pub(crate) fn exit(&mut self, info: &SolveInfo<'_>) -> Result<()> {
        for e in &mut self.branch_rules {
            e.rule.exit(info)?;
        }
        for e in &mut self.node_selectors {
            e.selector.exit(info)?;
        }
        Ok(())
    }

    pub(crate) fn free(&mut self) {
        for e in &mut self.branch_rules {
            e.rule.free();
        }
        for e in &mut self.node_selectors {
            e.selector.free();
        }
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field(
                "branch_rules",
                &self.branch_rules.iter().map(|e| &e.props.name).collect::<Vec<_>>(),
            )
            .field(
                "node_selectors",
                &self.node_selectors.iter().map(|e| &e.props.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
