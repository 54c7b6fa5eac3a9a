//! Hierarchical account balances.
//!
//! A [`BalanceTree`] holds one node per account, linked to its parent by the
//! `:`-separated account name. Every node keeps its own balance and the
//! aggregate of its whole subtree. The tree can be pruned to a subset of
//! accounts; removed subtrees are subtracted from the aggregates of their
//! ancestors so that the remaining nodes stay consistent.

use chrono::NaiveDate;
use perfledger_core::{Directive, Inventory};
use std::collections::{BTreeMap, BTreeSet};

use crate::Accounts;

/// One account in a [`BalanceTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    /// Full account name; the root is `""`.
    pub name: String,
    /// Balance booked directly to this account.
    pub balance: Inventory,
    /// Balance of this account and all of its descendants.
    pub balance_children: Inventory,
    /// Arena indices of the child nodes.
    pub children: Vec<usize>,
    /// Arena index of the parent node, `None` for the root.
    pub parent: Option<usize>,
}

impl TreeNode {
    fn new(name: &str, parent: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            ..Self::default()
        }
    }
}

/// Arena-backed tree of account balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceTree {
    nodes: Vec<Option<TreeNode>>,
    index: BTreeMap<String, usize>,
}

const ROOT: usize = 0;

impl Default for BalanceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceTree {
    /// Create a tree holding only the root.
    #[must_use]
    pub fn new() -> Self {
        let mut index = BTreeMap::new();
        index.insert(String::new(), ROOT);
        Self {
            nodes: vec![Some(TreeNode::new("", None))],
            index,
        }
    }

    /// Build a tree from a ledger.
    ///
    /// `open` directives create empty nodes and every posting is booked to
    /// its account. With `as_of`, directives dated after it are ignored.
    #[must_use]
    pub fn from_directives(directives: &[Directive], as_of: Option<NaiveDate>) -> Self {
        let mut tree = Self::new();
        for directive in directives {
            if as_of.is_some_and(|as_of| directive.date() > as_of) {
                continue;
            }
            match directive {
                Directive::Open(open) => {
                    tree.ensure(&open.account);
                }
                Directive::Transaction(txn) => {
                    for posting in &txn.postings {
                        let inventory: Inventory = std::iter::once(posting.position()).collect();
                        tree.insert(&posting.account, &inventory);
                    }
                }
                _ => {}
            }
        }
        tree
    }

    /// Add `inventory` to `account`, creating it and its ancestors as needed.
    pub fn insert(&mut self, account: &str, inventory: &Inventory) {
        let idx = self.ensure(account);
        if let Some(node) = self.nodes[idx].as_mut() {
            node.balance += inventory;
        }
        let mut current = Some(idx);
        while let Some(i) = current {
            current = match self.nodes[i].as_mut() {
                Some(node) => {
                    node.balance_children += inventory;
                    node.parent
                }
                None => None,
            };
        }
    }

    fn ensure(&mut self, account: &str) -> usize {
        if let Some(&idx) = self.index.get(account) {
            return idx;
        }
        let parent = self.ensure(parent_name(account));
        let idx = self.nodes.len();
        self.nodes.push(Some(TreeNode::new(account, Some(parent))));
        self.index.insert(account.to_string(), idx);
        if let Some(node) = self.nodes[parent].as_mut() {
            node.children.push(idx);
        }
        idx
    }

    /// Look up a node by account name.
    #[must_use]
    pub fn get(&self, account: &str) -> Option<&TreeNode> {
        self.index
            .get(account)
            .and_then(|&idx| self.nodes[idx].as_ref())
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes[ROOT].as_ref()
    }

    /// Check if `account` is in the tree.
    #[must_use]
    pub fn contains(&self, account: &str) -> bool {
        self.index.contains_key(account)
    }

    /// Names of the direct children of `account`.
    #[must_use]
    pub fn children(&self, account: &str) -> Vec<&str> {
        self.get(account)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&idx| self.nodes[idx].as_ref())
                    .map(|child| child.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All account names except the root, sorted.
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str).filter(|name| !name.is_empty())
    }

    /// Number of nodes, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the tree holds only the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Remove every account not in `retained`, together with its subtree.
    ///
    /// The root is never removed. A retained account below a removed one
    /// goes with its ancestor, so callers usually pass the output of
    /// [`accounts_with_parents`].
    pub fn prune(&mut self, retained: &BTreeSet<String>) {
        let doomed: Vec<String> = self
            .accounts()
            .filter(|name| !retained.contains(*name))
            .map(str::to_string)
            .collect();

        for name in doomed {
            if let Some(&idx) = self.index.get(&name) {
                self.remove_subtree(idx);
            }
        }
    }

    fn remove_subtree(&mut self, idx: usize) {
        let children = self.nodes[idx]
            .as_ref()
            .map(|node| node.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove_subtree(child);
        }

        let Some(node) = self.nodes[idx].take() else {
            return;
        };
        // With the children gone, the aggregate is the node's own balance.
        let mut current = node.parent;
        while let Some(i) = current {
            current = match self.nodes[i].as_mut() {
                Some(ancestor) => {
                    ancestor.balance_children -= &node.balance_children;
                    ancestor.parent
                }
                None => None,
            };
        }
        if let Some(parent) = node.parent.and_then(|p| self.nodes[p].as_mut()) {
            parent.children.retain(|&child| child != idx);
        }
        self.index.remove(&node.name);
    }

    /// Check that every aggregate equals the node's balance plus the
    /// aggregates of its children.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().flatten().all(|node| {
            let mut expected = node.balance.clone();
            for &child in &node.children {
                match &self.nodes[child] {
                    Some(child) => expected += &child.balance_children,
                    None => return false,
                }
            }
            expected == node.balance_children
        })
    }
}

fn parent_name(account: &str) -> &str {
    account.rsplit_once(':').map_or("", |(parent, _)| parent)
}

/// `accounts` plus every ancestor of each of them.
#[must_use]
pub fn accounts_with_parents(accounts: &BTreeSet<String>) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    for account in accounts {
        let mut name = account.as_str();
        while !name.is_empty() {
            if !result.insert(name.to_string()) {
                break;
            }
            name = parent_name(name);
        }
    }
    result
}

/// Balance tree of the value accounts and their ancestors.
#[must_use]
pub fn value_balance_tree(
    directives: &[Directive],
    accounts: &Accounts,
    as_of: Option<NaiveDate>,
) -> BalanceTree {
    let mut tree = BalanceTree::from_directives(directives, as_of);
    tree.prune(&accounts_with_parents(accounts.value()));
    tracing::debug!("Value balance tree has {} accounts", tree.len() - 1);
    tree
}
