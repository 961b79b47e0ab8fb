//! Backward operation trait and graph traversal

use super::Tensor;
use ndarray::Array2;
use std::collections::HashSet;

/// Gradient rule of one differentiable operation.
pub trait BackwardOp {
    /// Tensors the operation read from
    fn inputs(&self) -> Vec<Tensor>;

    /// Given the gradient of the operation's output, accumulate gradients
    /// into every input that requires one.
    fn backward(&self, grad_output: &Array2<f64>);
}

/// Nodes reachable from `root` in post-order (inputs before consumers).
fn topological_order(root: &Tensor) -> Vec<Tensor> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root.clone(), false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        if !visited.insert(node.id()) {
            continue;
        }
        let op = node.backward_op();
        stack.push((node, true));
        if let Some(op) = op {
            for input in op.inputs() {
                if input.requires_grad() && !visited.contains(&input.id()) {
                    stack.push((input, false));
                }
            }
        }
    }

    order
}

/// Run reverse-mode differentiation from `tensor`.
///
/// `grad_output` seeds the output gradient; `None` seeds ones, which is the
/// usual choice for a scalar loss. Every operation in the graph runs its
/// backward rule exactly once, after all of its consumers.
pub fn backward(tensor: &Tensor, grad_output: Option<Array2<f64>>) {
    if !tensor.requires_grad() {
        return;
    }
    let seed = grad_output.unwrap_or_else(|| Array2::ones(tensor.shape()));
    tensor.accumulate_grad(seed);

    for node in topological_order(tensor).iter().rev() {
        if let Some(op) = node.backward_op() {
            if let Some(grad) = node.grad() {
                op.backward(&grad);
            }
        }
    }
}
