//! Regression trees stored as flat node arrays.

use serde::{Deserialize, Serialize};

fn no_index() -> i32 {
    -1
}

/// A tree node (internal or leaf).
///
/// Internal nodes split on `feature_idx` and go left when
/// `x[feature_idx] <= threshold`. Leaves carry `leaf`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    #[serde(default = "no_index")]
    pub left: i32,

    #[serde(default = "no_index")]
    pub right: i32,

    #[serde(rename = "feature_idx", alias = "feature", default = "no_index")]
    pub feature_idx: i32,

    #[serde(default)]
    pub threshold: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf: Option<f64>,
}

impl Node {
    pub fn internal(feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(value: f64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some() || self.feature_idx < 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Node 0 is the root.
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walks from the root to a leaf. Assumes [`Tree::validate`] passed for
    /// `features.len()`; a malformed path scores 0.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        while let Some(node) = self.nodes.get(idx) {
            if let Some(v) = node.leaf {
                return v;
            }
            if node.feature_idx < 0 {
                return 0.0;
            }
            let Some(x) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };
            let next = if *x <= node.threshold {
                node.left
            } else {
                node.right
            };
            // children always sit after their parent
            if next <= idx as i32 {
                return 0.0;
            }
            idx = next as usize;
        }
        0.0
    }

    /// Structural checks against an input of `n_features` columns.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n = self.nodes.len() as i32;

        for (i, node) in self.nodes.iter().enumerate() {
            let i = i as i32;
            if node.is_leaf() {
                match node.leaf {
                    Some(v) if v.is_finite() => {}
                    Some(v) => return Err(format!("leaf node {i} has non-finite value {v}")),
                    None => return Err(format!("leaf node {i} has no leaf value")),
                }
                continue;
            }
            if node.feature_idx as usize >= n_features {
                return Err(format!(
                    "node {i} splits on feature {} but the input has {n_features}",
                    node.feature_idx
                ));
            }
            if !node.threshold.is_finite() {
                return Err(format!("node {i} has a non-finite threshold"));
            }
            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i || child >= n {
                    return Err(format!("node {i} has invalid {side} child: {child}"));
                }
            }
        }
        Ok(())
    }
}
