use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::comparator::Comparator;
use super::node::Balance;
use super::options::TtreeOptions;
use crate::primitives::store::NodeStore;
use crate::types::{NodeId, Persistent, Result, TtreeError};

const MAX_FINDINGS: usize = 32;

/// Represents a single issue discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// Page the issue was found on; absent for findings about the index as a
    /// whole.
    pub node: Option<u64>,
    /// Human-readable description of the issue.
    pub message: String,
}

/// Statistics collected while walking the tree.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Pages reachable from the root.
    pub nodes: u64,
    /// Members stored in those pages.
    pub members: u64,
    /// Height of the tree in pages.
    pub height: u64,
}

/// Complete report of a verification pass.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// Whether no issue was found.
    pub success: bool,
    /// Issues discovered, capped at a fixed number.
    pub findings: Vec<VerifyFinding>,
    /// Totals gathered during the walk.
    pub counts: VerifyCounts,
}

impl VerifyReport {
    /// Renders the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| TtreeError::Config(err.to_string()))
    }
}

struct Subtree<E> {
    height: u64,
    min: E,
    max: E,
}

struct Verifier<'a, E, C, S> {
    store: &'a mut S,
    comparator: &'a C,
    options: &'a TtreeOptions,
    visited: FxHashSet<NodeId>,
    findings: Vec<VerifyFinding>,
    counts: VerifyCounts,
    _marker: std::marker::PhantomData<E>,
}

/// Checks ordering, occupancy and balance of every page below `root`.
///
/// Storage faults abort the walk; structural problems are collected as
/// findings instead.
pub fn verify<E, C, S>(
    store: &mut S,
    comparator: &C,
    root: Option<NodeId>,
    options: &TtreeOptions,
) -> Result<VerifyReport>
where
    E: Persistent,
    C: Comparator<E>,
    S: NodeStore<E>,
{
    let mut verifier = Verifier {
        store,
        comparator,
        options,
        visited: FxHashSet::default(),
        findings: Vec::new(),
        counts: VerifyCounts::default(),
        _marker: std::marker::PhantomData,
    };
    if let Some(root) = root {
        if let Some(subtree) = verifier.walk(root)? {
            verifier.counts.height = subtree.height;
        }
    }
    let report = VerifyReport {
        success: verifier.findings.is_empty(),
        findings: verifier.findings,
        counts: verifier.counts,
    };
    if !report.success {
        tracing::warn!(target: "ttree::verify", findings = report.findings.len(), "tree verification failed");
    }
    Ok(report)
}

impl<E, C, S> Verifier<'_, E, C, S>
where
    E: Persistent,
    C: Comparator<E>,
    S: NodeStore<E>,
{
    fn push(&mut self, id: NodeId, message: impl Into<String>) {
        if self.findings.len() < MAX_FINDINGS {
            self.findings.push(VerifyFinding {
                node: Some(id.0),
                message: message.into(),
            });
        }
    }

    fn walk(&mut self, id: NodeId) -> Result<Option<Subtree<E>>> {
        if !self.visited.insert(id) {
            self.push(id, "page reachable twice");
            return Ok(None);
        }
        let (items, left, right, balance) = {
            let node = self.store.materialize(id)?;
            (node.items.clone(), node.left, node.right, node.balance)
        };
        self.counts.nodes += 1;
        self.counts.members += items.len() as u64;

        if items.is_empty() || items.len() > self.options.max_items {
            self.push(
                id,
                format!(
                    "occupancy {} outside 1..={}",
                    items.len(),
                    self.options.max_items
                ),
            );
        }
        for item in &items {
            self.store.materialize_member(item)?;
        }
        if items
            .windows(2)
            .any(|pair| self.comparator.compare_members(&pair[0], &pair[1]) == Ordering::Greater)
        {
            self.push(id, "members out of order within page");
        }

        let left_tree = match left {
            Some(left) => self.walk(left)?,
            None => None,
        };
        let right_tree = match right {
            Some(right) => self.walk(right)?,
            None => None,
        };

        let (Some(first), Some(last)) = (items.first().cloned(), items.last().cloned()) else {
            return Ok(None);
        };
        if let Some(lt) = &left_tree {
            if self.comparator.compare_members(&lt.max, &first) == Ordering::Greater {
                self.push(id, "left subtree holds a member ordering after the page");
            }
        }
        if let Some(rt) = &right_tree {
            if self.comparator.compare_members(&rt.min, &last) == Ordering::Less {
                self.push(id, "right subtree holds a member ordering before the page");
            }
        }

        let left_height = left_tree.as_ref().map_or(0, |t| t.height);
        let right_height = right_tree.as_ref().map_or(0, |t| t.height);
        let diff = right_height as i64 - left_height as i64;
        match Balance::from_height_diff(diff) {
            Some(actual) if actual == balance => {}
            Some(actual) => self.push(
                id,
                format!("balance recorded as {balance:?} but subtrees are {actual:?}"),
            ),
            None => self.push(id, format!("subtree heights differ by {diff}")),
        }

        Ok(Some(Subtree {
            height: 1 + left_height.max(right_height),
            min: left_tree.map_or(first, |t| t.min),
            max: right_tree.map_or(last, |t| t.max),
        }))
    }
}
