//! Regression tree with exact greedy splits on variance reduction.
//!
//! Shared by the random forest (full-depth bagged trees) and the gradient
//! booster (shallow trees on residuals). Nodes live in a flat arena so a
//! fitted tree is a plain, cheaply clonable value.

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Impurity decrease accumulated per feature, sample-weighted.
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Fit on the rows selected by `indices` (duplicates allowed, which is
    /// what bootstrap sampling hands us).
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], indices: &[usize], params: &TreeParams) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let mut tree = Self {
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        let total = indices.len().max(1) as f64;
        tree.grow(rows, targets, indices, params, 0, total);
        tree
    }

    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        params: &TreeParams,
        depth: usize,
        total_samples: f64,
    ) -> usize {
        let mean = mean_of(targets, indices);
        if depth >= params.max_depth || indices.len() < params.min_samples_split {
            return self.push_leaf(mean);
        }

        let Some(split) = best_split(rows, targets, indices, params) else {
            return self.push_leaf(mean);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| rows[i][split.feature] <= split.threshold);
        if left_idx.len() < params.min_samples_leaf || right_idx.len() < params.min_samples_leaf {
            return self.push_leaf(mean);
        }

        self.importances[split.feature] += split.gain * indices.len() as f64 / total_samples;

        let node = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean }); // placeholder until children exist
        let left = self.grow(rows, targets, &left_idx, params, depth + 1, total_samples);
        let right = self.grow(rows, targets, &right_idx, params, depth + 1, total_samples);
        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    fn push_leaf(&mut self, value: f64) -> usize {
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut at = 0usize;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Raw (unnormalized) per-feature impurity decreases.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

fn mean_of(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}

/// Exact split search: per feature, sort the node's values and evaluate every
/// boundary between distinct neighbours using prefix sums of y and y².
fn best_split(
    rows: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    params: &TreeParams,
) -> Option<BestSplit> {
    let n = indices.len();
    let n_features = rows[indices[0]].len();
    let parent_sse = sse_of(targets, indices);

    let mut best: Option<BestSplit> = None;
    let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

    for feature in 0..n_features {
        pairs.clear();
        pairs.extend(indices.iter().map(|&i| (rows[i][feature], targets[i])));
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut sum_left = 0.0;
        let mut sq_left = 0.0;
        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();

        for split_at in 1..n {
            let (x_prev, y_prev) = pairs[split_at - 1];
            sum_left += y_prev;
            sq_left += y_prev * y_prev;

            let x_here = pairs[split_at].0;
            if x_here <= x_prev {
                continue; // no boundary between equal values
            }
            if split_at < params.min_samples_leaf || n - split_at < params.min_samples_leaf {
                continue;
            }

            let n_left = split_at as f64;
            let n_right = (n - split_at) as f64;
            let sum_right = total_sum - sum_left;
            let sq_right = total_sq - sq_left;
            let child_sse =
                (sq_left - sum_left * sum_left / n_left) + (sq_right - sum_right * sum_right / n_right);
            let gain = parent_sse - child_sse;

            if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(BestSplit {
                    feature,
                    threshold: (x_prev + x_here) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}

fn sse_of(targets: &[f64], indices: &[usize]) -> f64 {
    let n = indices.len() as f64;
    let sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
    sq - sum * sum / n
}
