//! Tensor with shared storage and a gradient cell

use super::BackwardOp;
use ndarray::Array2;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A 2-D tensor participating in reverse-mode differentiation.
///
/// Cloning a tensor produces another handle to the same storage and gradient
/// cell, so a parameter held by a layer and by an optimizer is one tensor.
/// Use [`Tensor::freeze`] for an independent copy that carries no gradient.
#[derive(Clone)]
pub struct Tensor {
    id: usize,
    data: Rc<RefCell<Array2<f64>>>,
    grad: Rc<RefCell<Option<Array2<f64>>>>,
    requires_grad: bool,
    backward_op: Option<Rc<dyn BackwardOp>>,
}

impl Tensor {
    /// Create a new tensor
    pub fn new(data: Array2<f64>, requires_grad: bool) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            data: Rc::new(RefCell::new(data)),
            grad: Rc::new(RefCell::new(None)),
            requires_grad,
            backward_op: None,
        }
    }

    /// Create a tensor of zeros
    pub fn zeros(rows: usize, cols: usize, requires_grad: bool) -> Self {
        Self::new(Array2::zeros((rows, cols)), requires_grad)
    }

    /// Wrap an array as a constant (no gradient)
    pub fn constant(data: Array2<f64>) -> Self {
        Self::new(data, false)
    }

    /// Constant identity matrix
    pub fn eye(n: usize) -> Self {
        Self::constant(Array2::eye(n))
    }

    /// A 1x1 tensor
    pub fn scalar(value: f64, requires_grad: bool) -> Self {
        Self::new(Array2::from_elem((1, 1), value), requires_grad)
    }

    /// Unique identity of the underlying graph node
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn data(&self) -> Ref<'_, Array2<f64>> {
        self.data.borrow()
    }

    pub fn data_mut(&self) -> RefMut<'_, Array2<f64>> {
        self.data.borrow_mut()
    }

    /// Owned copy of the values
    pub fn to_array(&self) -> Array2<f64> {
        self.data.borrow().clone()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.borrow().dim()
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First element; the value of a scalar loss
    pub fn item(&self) -> f64 {
        self.data.borrow().iter().next().copied().unwrap_or(f64::NAN)
    }

    /// Whether every element is finite
    pub fn is_finite(&self) -> bool {
        self.data.borrow().iter().all(|v| v.is_finite())
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Leaf tensors are created by the user rather than by an operation
    pub fn is_leaf(&self) -> bool {
        self.backward_op.is_none()
    }

    /// Copy of the accumulated gradient, if any
    pub fn grad(&self) -> Option<Array2<f64>> {
        self.grad.borrow().clone()
    }

    pub fn set_grad(&self, grad: Array2<f64>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add `grad` into the gradient cell
    pub fn accumulate_grad(&self, grad: Array2<f64>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing += &grad,
            None => *cell = Some(grad),
        }
    }

    /// Drop the accumulated gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    pub fn grad_cell(&self) -> Rc<RefCell<Option<Array2<f64>>>> {
        Rc::clone(&self.grad)
    }

    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    /// Copy the values into a fresh constant tensor.
    ///
    /// The copy has no history and does not require a gradient: anything
    /// computed from it is treated as a constant during backward.
    pub fn freeze(&self) -> Tensor {
        Tensor::constant(self.to_array())
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("shape", &self.shape())
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}
