//! Reverse mode automatic differentiation on scalars. Every variable holds shared links to the
//! variables it was computed from, so the computation graph lives on the heap and is dropped
//! together with its last output.

use std::{
    cell::RefCell,
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    ops::{Add, Div, Mul, Sub},
    rc::Rc,
};

/// The inputs of the operation that produced a variable together with the local derivative of
/// the output with respect to each of them.
#[derive(Clone)]
struct Origin {
    parents: [Option<Var>; 2],
    local_grad: [f64; 2],
}

impl Origin {
    fn leaf() -> Self {
        Self {
            parents: [None, None],
            local_grad: [0.0, 0.0],
        }
    }

    fn unary(parent: &Var, grad: f64) -> Self {
        Self {
            parents: [Some(parent.clone()), None],
            local_grad: [grad, 0.0],
        }
    }

    fn binary(lhs: &Var, rhs: &Var, grad_lhs: f64, grad_rhs: f64) -> Self {
        Self {
            parents: [Some(lhs.clone()), Some(rhs.clone())],
            local_grad: [grad_lhs, grad_rhs],
        }
    }
}

struct Node {
    value: f64,
    grad: f64,
    origin: Origin,
}

// Long chains such as a summed minibatch loss would overflow the stack if every node dropped its
// parents recursively, so ancestors that are about to be freed are unlinked on an explicit stack.
impl Drop for Node {
    fn drop(&mut self) {
        let mut stack: Vec<Var> = self
            .origin
            .parents
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        while let Some(var) = stack.pop() {
            if let Ok(cell) = Rc::try_unwrap(var.node) {
                let mut node = cell.into_inner();
                stack.extend(node.origin.parents.iter_mut().filter_map(Option::take));
            }
        }
    }
}

/// A scalar variable. Cloning a variable yields another handle to the same node, so updates made
/// through one handle are seen by all of them.
#[derive(Clone)]
pub struct Var {
    node: Rc<RefCell<Node>>,
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        f.debug_struct("Var")
            .field("value", &node.value)
            .field("grad", &node.grad)
            .finish()
    }
}

impl Eq for Var {}
impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(Rc::as_ptr(&self.node) as *const () as usize);
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, |$l:ident, $r:ident| $value:expr, $grad_l:expr, $grad_r:expr) => {
        impl $trait for &Var {
            type Output = Var;

            #[allow(unused_variables)]
            fn $method(self, rhs: Self) -> Self::Output {
                let $l = self.value();
                let $r = rhs.value();
                Var::from_origin($value, Origin::binary(self, rhs, $grad_l, $grad_r))
            }
        }

        impl $trait for Var {
            type Output = Var;

            fn $method(self, rhs: Self) -> Self::Output {
                (&self).$method(&rhs)
            }
        }
    };
}

binary_op!(Add, add, |l, r| l + r, 1.0, 1.0);
binary_op!(Sub, sub, |l, r| l - r, 1.0, -1.0);
binary_op!(Mul, mul, |l, r| l * r, r, l);
binary_op!(Div, div, |l, r| l / r, 1.0 / r, -l / (r * r));

impl Var {
    /// Creates a new leaf variable with the given value.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self::from_origin(value, Origin::leaf())
    }

    /// Gets the value of the variable.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.node.borrow().value
    }

    /// Overwrites the value of the variable.
    pub fn set_value(&self, value: f64) {
        self.node.borrow_mut().value = value;
    }

    /// Gets the gradient accumulated by the last calls to [`Var::backward`].
    #[must_use]
    pub fn grad(&self) -> f64 {
        self.node.borrow().grad
    }

    /// Resets the accumulated gradient to zero.
    pub fn zero_grad(&self) {
        self.node.borrow_mut().grad = 0.0;
    }

    /// Computes the gradient of this variable with respect to every variable in the graph that
    /// produced it, accumulating into their gradients.
    pub fn backward(&self) {
        self.node.borrow_mut().grad += 1.0;
        for var in self.topological_order().iter().rev() {
            var.propagate_grad();
        }
    }

    /// Returns a new variable with the same value as this variable.
    #[must_use]
    pub fn identity(&self) -> Self {
        Self::from_origin(self.value(), Origin::unary(self, 1.0))
    }

    /// Returns a new variable with the logistic sigmoid of this variable.
    #[must_use]
    pub fn sigmoid(&self) -> Self {
        let x = self.value();
        let value = if x >= 0.0 {
            1.0 / (1.0 + (-x).exp())
        } else {
            let exp = x.exp();
            exp / (1.0 + exp)
        };
        Self::from_origin(value, Origin::unary(self, value * (1.0 - value)))
    }

    /// Returns a new variable with the hyperbolic tangent of this variable.
    #[must_use]
    pub fn tanh(&self) -> Self {
        let value = self.value().tanh();
        Self::from_origin(value, Origin::unary(self, 1.0 - value * value))
    }

    /// Returns a new variable with the rectified linear unit of this variable.
    #[must_use]
    pub fn relu(&self) -> Self {
        let x = self.value();
        let (value, grad) = if x > 0.0 { (x, 1.0) } else { (0.0, 0.0) };
        Self::from_origin(value, Origin::unary(self, grad))
    }

    fn from_origin(value: f64, origin: Origin) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                value,
                grad: 0.0,
                origin,
            })),
        }
    }

    fn parents(&self) -> Vec<Var> {
        self.node.borrow().origin.parents.iter().flatten().cloned().collect()
    }

    fn propagate_grad(&self) {
        let node = self.node.borrow();
        for (parent, local) in node.origin.parents.iter().zip(node.origin.local_grad) {
            if let Some(p) = parent {
                // A node never lists itself as a parent, so this borrow can't alias `node`.
                p.node.borrow_mut().grad += node.grad * local;
            }
        }
    }

    /// Every variable of the graph, each listed after all the variables it depends on.
    fn topological_order(&self) -> Vec<Var> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(self.clone(), false)];
        while let Some((var, expanded)) = stack.pop() {
            if expanded {
                order.push(var);
                continue;
            }
            if !seen.insert(var.clone()) {
                continue;
            }
            let parents = var.parents();
            stack.push((var, true));
            for parent in parents {
                if !seen.contains(&parent) {
                    stack.push((parent, false));
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn arithmetic_gradients() {
        let x = Var::new(3.0);
        let y = Var::new(2.0);
        // z = (x * y + x) / y - y
        let z = &(&(&(&x * &y) + &x) / &y) - &y;
        assert_close(z.value(), 2.5);
        z.backward();
        // dz/dx = (y + 1) / y, dz/dy = -x / y^2 - 1
        assert_close(x.grad(), 1.5);
        assert_close(y.grad(), -1.75);
    }

    #[test]
    fn shared_subexpression_accumulates() {
        let x = Var::new(2.0);
        let h = x.tanh();
        // Reach `h` through paths of different lengths.
        let short = &h * &h;
        let long = (&h + &Var::new(0.0)).identity() * Var::new(3.0);
        let z = &short + &long;
        z.backward();
        let t = 2f64.tanh();
        assert_close(x.grad(), (2.0 * t + 3.0) * (1.0 - t * t));
    }

    #[test]
    fn activation_gradients() {
        let x = Var::new(-1.0);
        let s = x.sigmoid();
        s.backward();
        let expected = 1.0 / (1.0 + 1f64.exp());
        assert_close(s.value(), expected);
        assert_close(x.grad(), expected * (1.0 - expected));

        let x = Var::new(-1.0);
        let r = x.relu();
        r.backward();
        assert_close(r.value(), 0.0);
        assert_close(x.grad(), 0.0);

        let x = Var::new(4.0);
        let r = x.relu();
        r.backward();
        assert_close(x.grad(), 1.0);
    }

    #[test]
    fn clones_share_the_node() {
        let x = Var::new(1.0);
        let y = x.clone();
        y.set_value(5.0);
        assert_eq!(x, y);
        assert_close(x.value(), 5.0);
        (&x * &Var::new(2.0)).backward();
        assert_close(y.grad(), 2.0);
        y.zero_grad();
        assert_close(x.grad(), 0.0);
    }

    #[test]
    fn deep_chain_backward_and_drop() {
        let first = Var::new(1.0);
        let mut total = first.clone();
        for _ in 0..100_000 {
            total = &total + &Var::new(1.0);
        }
        total.backward();
        assert_close(total.value(), 100_001.0);
        assert_close(first.grad(), 1.0);
        drop(total);
        // Leaves still referenced elsewhere survive the teardown.
        assert_close(first.value(), 1.0);
    }
}
