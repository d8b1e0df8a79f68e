use crate::autograd::var::Var;
use crate::error::GradKitError;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A single entry of the Wengert list.
///
/// Local partial derivatives are computed when the node is recorded, so the
/// backward sweep only needs multiply-adds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node {
    pub(crate) value: f64,
    parents: [(usize, f64); 2],
    arity: u8,
}

impl Node {
    fn leaf(value: f64) -> Self {
        Node {
            value,
            parents: [(0, 0.0); 2],
            arity: 0,
        }
    }

    fn is_leaf(&self) -> bool {
        self.arity == 0
    }
}

#[derive(Debug, Default)]
struct TapeInner {
    nodes: Vec<Node>,
    adjoints: Vec<f64>,
}

/// Marker returned by [`Tape::checkpoint`], consumed by [`Tape::rewind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

/// Records scalar operations for reverse-mode differentiation.
///
/// `Tape` is a cheap, cloneable handle (`Rc<RefCell<..>>`): every clone
/// refers to the same list of nodes and the same adjoint buffer. Derivative
/// state is owned by the tape rather than by the process, so independent
/// evaluation contexts simply use independent tapes.
///
/// The tape is not `Send`; a tape and all of its vars belong to one thread.
#[derive(Clone, Default)]
pub struct Tape {
    inner: Rc<RefCell<TapeInner>>,
}

impl Tape {
    /// Creates an empty tape.
    pub fn new() -> Self {
        Tape::default()
    }

    /// Records a new independent variable (leaf) holding `value`.
    pub fn var(&self, value: f64) -> Var {
        let index = self.push(Node::leaf(value));
        Var::from_parts(self.clone(), index)
    }

    /// Alias of [`Tape::var`] for values that are never differentiated against.
    pub fn constant(&self, value: f64) -> Var {
        self.var(value)
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if both handles refer to the same tape.
    pub fn ptr_eq(&self, other: &Tape) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Value of the node at `index`.
    pub fn value(&self, index: usize) -> Result<f64, GradKitError> {
        let inner = self.inner.borrow();
        inner
            .nodes
            .get(index)
            .map(|node| node.value)
            .ok_or_else(|| out_of_bounds(index, inner.nodes.len()))
    }

    /// Overwrites the value of a leaf node.
    ///
    /// Nodes already recorded from this leaf keep their old values; expressions
    /// must be recorded again to observe the update.
    pub fn set_value(&self, index: usize, value: f64) -> Result<(), GradKitError> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.nodes.len();
        let node = inner
            .nodes
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(index, len))?;
        if !node.is_leaf() {
            return Err(GradKitError::InvalidArgument(format!(
                "node {} is not a leaf, its value is derived from its parents",
                index
            )));
        }
        node.value = value;
        Ok(())
    }

    /// Accumulated derivative of the last backward pass w.r.t. node `index`.
    pub fn adjoint(&self, index: usize) -> Result<f64, GradKitError> {
        let inner = self.inner.borrow();
        inner
            .adjoints
            .get(index)
            .copied()
            .ok_or_else(|| out_of_bounds(index, inner.adjoints.len()))
    }

    /// Clears every accumulated adjoint on the tape.
    pub fn zero_adjoints(&self) {
        self.inner
            .borrow_mut()
            .adjoints
            .iter_mut()
            .for_each(|adj| *adj = 0.0);
    }

    /// Marks the current end of the tape.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.len())
    }

    /// Drops every node recorded after `checkpoint`.
    ///
    /// Vars pointing past the checkpoint must not be used afterwards.
    pub fn rewind(&self, checkpoint: Checkpoint) {
        let mut inner = self.inner.borrow_mut();
        if checkpoint.0 < inner.nodes.len() {
            log::debug!(
                "Rewinding tape from {} to {} nodes",
                inner.nodes.len(),
                checkpoint.0
            );
            inner.nodes.truncate(checkpoint.0);
            inner.adjoints.truncate(checkpoint.0);
        }
    }

    /// Back-propagates from the node at `index`, seeding its adjoint with 1.
    ///
    /// Adjoints accumulate on top of whatever the buffer already holds; call
    /// [`Tape::zero_adjoints`] first for a clean pass.
    pub fn backward(&self, index: usize) -> Result<(), GradKitError> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.nodes.len();
        if index >= len {
            return Err(out_of_bounds(index, len));
        }
        log::debug!("Backward pass from node {} of {}", index, len);
        inner.adjoints[index] += 1.0;

        let TapeInner { nodes, adjoints } = &mut *inner;
        for i in (0..=index).rev() {
            let adj = adjoints[i];
            if adj == 0.0 {
                continue;
            }
            let node = nodes[i];
            for &(parent, partial) in &node.parents[..node.arity as usize] {
                adjoints[parent] += adj * partial;
            }
        }
        Ok(())
    }

    pub(crate) fn push_unary(&self, value: f64, parent: usize, partial: f64) -> usize {
        self.push(Node {
            value,
            parents: [(parent, partial), (0, 0.0)],
            arity: 1,
        })
    }

    pub(crate) fn push_binary(&self, value: f64, lhs: (usize, f64), rhs: (usize, f64)) -> usize {
        self.push(Node {
            value,
            parents: [lhs, rhs],
            arity: 2,
        })
    }

    fn push(&self, node: Node) -> usize {
        let mut inner = self.inner.borrow_mut();
        let index = inner.nodes.len();
        inner.nodes.push(node);
        inner.adjoints.push(0.0);
        index
    }

    /// Sum of `vars`, recorded as a chain of additions.
    ///
    /// An empty slice yields a constant zero.
    pub fn sum(&self, vars: &[Var]) -> Var {
        match vars.split_first() {
            None => self.constant(0.0),
            Some((first, rest)) => rest.iter().fold(first.clone(), |acc, v| acc + v),
        }
    }

    /// Arithmetic mean of `vars`. An empty slice yields a constant zero.
    pub fn mean(&self, vars: &[Var]) -> Var {
        if vars.is_empty() {
            log::warn!("Mean of an empty slice of vars, returning 0");
            return self.constant(0.0);
        }
        self.sum(vars) / vars.len() as f64
    }
}

impl fmt::Debug for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tape").field("len", &self.len()).finish()
    }
}

fn out_of_bounds(index: usize, len: usize) -> GradKitError {
    GradKitError::IndexOutOfBounds {
        index: vec![index],
        shape: vec![len],
    }
}

#[cfg(test)]
#[path = "tape_test.rs"]
mod tests;
