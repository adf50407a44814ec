//! Decision trees stored in a shared arena
//!
//! Each locus owns one tree. Interior nodes split on the value of another
//! locus, leaves hold the Bernoulli distribution of the owning locus for the
//! parents routed there. Nodes keep a link to their parent node so the split
//! variables along a path can be recovered without a stack.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Stable handle into a [`DecisionForest`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeId(usize);

impl TreeId {
    /// Position in the forest's arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A proposed split of one leaf on one variable
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitCandidate {
    /// Variable the leaf would split on
    pub var: usize,
    /// Score improvement net of the split penalty
    pub gain: f64,
    /// `(n, n1)` of the child taking `var = 0`
    pub zeros: (usize, usize),
    /// `(n, n1)` of the child taking `var = 1`
    pub ones: (usize, usize),
}

/// Terminal node: the owning locus's distribution given the path to it
#[derive(Clone, Debug)]
pub struct Leaf {
    rows: Vec<usize>,
    n1: usize,
    score: f64,
    draw: Bernoulli,
    candidates: BTreeMap<usize, SplitCandidate>,
}

impl Leaf {
    /// Leaf over the given parent rows with `n1` of them having the locus set
    ///
    /// An empty leaf draws with probability 1/2.
    pub fn new(rows: Vec<usize>, n1: usize, score: f64) -> Result<Self, ModelError> {
        let n = rows.len();
        if n1 > n {
            return Err(ModelError::invariant(format!(
                "leaf counts {n1} ones among {n} samples"
            )));
        }
        let p = if n == 0 { 0.5 } else { n1 as f64 / n as f64 };
        let draw = Bernoulli::new(p)
            .map_err(|e| ModelError::invariant(format!("leaf distribution p={p}: {e}")))?;
        Ok(Self {
            rows,
            n1,
            score,
            draw,
            candidates: BTreeMap::new(),
        })
    }

    /// Parent rows routed to this leaf
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Number of parents routed here
    pub fn n(&self) -> usize {
        self.rows.len()
    }

    /// Number of those parents with the owning locus set
    pub fn n1(&self) -> usize {
        self.n1
    }

    /// `n1 / n`, or 1/2 for an empty leaf
    pub fn probability(&self) -> f64 {
        if self.rows.is_empty() {
            0.5
        } else {
            self.n1 as f64 / self.rows.len() as f64
        }
    }

    /// Marginal log-likelihood of the leaf's counts
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Draw a value for the owning locus
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.draw.sample(rng)
    }

    /// Pending split candidates, ascending by variable
    pub fn candidates(&self) -> &BTreeMap<usize, SplitCandidate> {
        &self.candidates
    }

    pub(crate) fn candidates_mut(&mut self) -> &mut BTreeMap<usize, SplitCandidate> {
        &mut self.candidates
    }
}

/// Node content
#[derive(Clone, Debug)]
pub enum TreeNode {
    /// Interior node; `children[b]` takes the parents with `var == b`
    Split { var: usize, children: [TreeId; 2] },
    Leaf(Leaf),
}

#[derive(Clone, Debug)]
struct Slot {
    owner: usize,
    up: Option<TreeId>,
    node: TreeNode,
}

/// Arena holding the trees of every locus
#[derive(Clone, Debug, Default)]
pub struct DecisionForest {
    slots: Vec<Slot>,
}

impl DecisionForest {
    /// Forest with no trees
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes across all trees
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no tree has been added
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Create the root of `owner`'s tree
    pub fn add_root(&mut self, owner: usize, leaf: Leaf) -> TreeId {
        self.push(owner, None, TreeNode::Leaf(leaf))
    }

    fn push(&mut self, owner: usize, up: Option<TreeId>, node: TreeNode) -> TreeId {
        let id = TreeId(self.slots.len());
        self.slots.push(Slot { owner, up, node });
        id
    }

    /// Node behind `id`
    pub fn node(&self, id: TreeId) -> &TreeNode {
        &self.slots[id.0].node
    }

    /// Locus whose tree contains `id`
    pub fn owner(&self, id: TreeId) -> usize {
        self.slots[id.0].owner
    }

    /// `id` as a leaf, `None` once it has been split
    pub fn leaf(&self, id: TreeId) -> Option<&Leaf> {
        match &self.slots[id.0].node {
            TreeNode::Leaf(leaf) => Some(leaf),
            TreeNode::Split { .. } => None,
        }
    }

    /// Mutable form of [`DecisionForest::leaf`]
    pub fn leaf_mut(&mut self, id: TreeId) -> Option<&mut Leaf> {
        match &mut self.slots[id.0].node {
            TreeNode::Leaf(leaf) => Some(leaf),
            TreeNode::Split { .. } => None,
        }
    }

    /// Leaves under `root`, depth first, `0` branch before `1` branch
    pub fn leaves(&self, root: TreeId) -> Vec<TreeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match &self.slots[id.0].node {
                TreeNode::Leaf(_) => out.push(id),
                TreeNode::Split { children, .. } => {
                    stack.push(children[1]);
                    stack.push(children[0]);
                }
            }
        }
        out
    }

    /// Split variables on the path from the root down to `id`
    pub fn path_vars(&self, id: TreeId) -> Vec<usize> {
        let mut vars = Vec::new();
        let mut cursor = self.slots[id.0].up;
        while let Some(up) = cursor {
            if let TreeNode::Split { var, .. } = self.slots[up.0].node {
                vars.push(var);
            }
            cursor = self.slots[up.0].up;
        }
        vars
    }

    /// Number of split nodes above `id`
    pub fn depth(&self, id: TreeId) -> usize {
        self.path_vars(id).len()
    }

    /// Replace leaf `id` with a split on `var`
    ///
    /// Returns the handles of the new `[zeros, ones]` leaves.
    pub fn split(&mut self, id: TreeId, var: usize, children: [Leaf; 2]) -> Result<[TreeId; 2], ModelError> {
        if self.leaf(id).is_none() {
            return Err(ModelError::invariant(format!(
                "node {} is already split",
                id.0
            )));
        }
        let owner = self.slots[id.0].owner;
        let [zeros, ones] = children;
        let zeros = self.push(owner, Some(id), TreeNode::Leaf(zeros));
        let ones = self.push(owner, Some(id), TreeNode::Leaf(ones));
        self.slots[id.0].node = TreeNode::Split {
            var,
            children: [zeros, ones],
        };
        Ok([zeros, ones])
    }

    /// Follow `assignment` from `root` to a leaf
    pub fn descend(&self, root: TreeId, assignment: &[bool]) -> &Leaf {
        let mut id = root;
        loop {
            match &self.slots[id.0].node {
                TreeNode::Leaf(leaf) => return leaf,
                TreeNode::Split { var, children } => {
                    id = children[usize::from(assignment[*var])];
                }
            }
        }
    }

    /// Indented dump of the tree under `root`
    pub fn display(&self, root: TreeId) -> TreeDisplay<'_> {
        TreeDisplay { forest: self, root }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: TreeId, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth + 1);
        match &self.slots[id.0].node {
            TreeNode::Leaf(leaf) => writeln!(
                f,
                "{pad}p={:.4} (n={}, n1={})",
                leaf.probability(),
                leaf.n(),
                leaf.n1()
            ),
            TreeNode::Split { var, children } => {
                for (value, child) in children.iter().enumerate() {
                    writeln!(f, "{pad}x{var} = {value}:")?;
                    self.write_node(f, *child, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// [`fmt::Display`] adapter returned by [`DecisionForest::display`]
pub struct TreeDisplay<'a> {
    forest: &'a DecisionForest,
    root: TreeId,
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.forest.write_node(f, self.root, 0)
    }
}
