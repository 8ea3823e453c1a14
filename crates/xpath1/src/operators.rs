//! Binary operator semantics: comparisons, arithmetic and node-set union.

use crate::ast::BinaryOperator;
use crate::datasource::DataSourceNode;
use crate::engine::{XPathValue, string_to_number};
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    match op {
        BinaryOperator::Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        BinaryOperator::And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        BinaryOperator::Equals
        | BinaryOperator::NotEquals
        | BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        BinaryOperator::Plus => Ok(arithmetic(left, right, |a, b| a + b)),
        BinaryOperator::Minus => Ok(arithmetic(left, right, |a, b| a - b)),
        BinaryOperator::Multiply => Ok(arithmetic(left, right, |a, b| a * b)),
        BinaryOperator::Divide => Ok(arithmetic(left, right, |a, b| a / b)),
        // `%` on f64 truncates like the XPath `mod` operator.
        BinaryOperator::Modulo => Ok(arithmetic(left, right, |a, b| a % b)),
        BinaryOperator::Union => union(left, right),
    }
}

fn arithmetic<'a, N: DataSourceNode<'a>>(
    left: XPathValue<N>,
    right: XPathValue<N>,
    f: impl Fn(f64, f64) -> f64,
) -> XPathValue<N> {
    XPathValue::Number(f(left.to_number(), right.to_number()))
}

fn union<'a, N: DataSourceNode<'a>>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    match (left, right) {
        (XPathValue::NodeSet(mut nodes), XPathValue::NodeSet(more)) => {
            nodes.extend(more);
            nodes.sort();
            nodes.dedup();
            Ok(XPathValue::NodeSet(nodes))
        }
        (l, r) => Err(XPathError::TypeError(format!(
            "'|' requires node-set operands, got {:?} and {:?}",
            l, r
        ))),
    }
}

/// The operator to use when the operands are swapped, so a node-set can
/// always be treated as the left-hand side.
fn swapped(op: BinaryOperator) -> BinaryOperator {
    match op {
        BinaryOperator::LessThan => BinaryOperator::GreaterThan,
        BinaryOperator::LessThanOrEqual => BinaryOperator::GreaterThanOrEqual,
        BinaryOperator::GreaterThan => BinaryOperator::LessThan,
        BinaryOperator::GreaterThanOrEqual => BinaryOperator::LessThanOrEqual,
        other => other,
    }
}

/// XPath 1.0 comparison. A node-set operand compares true if any of its
/// nodes satisfies the comparison.
pub fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(a), XPathValue::NodeSet(b)) => {
            let right_values: Vec<String> = b.iter().map(|n| n.string_value()).collect();
            a.iter().any(|x| {
                let sx = x.string_value();
                right_values
                    .iter()
                    .any(|sy| compare_strings(op, &sx, sy))
            })
        }
        (XPathValue::NodeSet(nodes), other) => compare_node_set(op, nodes, other),
        (other, XPathValue::NodeSet(nodes)) => compare_node_set(swapped(op), nodes, other),
        (l, r) => compare_atomic(op, l, r),
    }
}

fn compare_strings(op: BinaryOperator, a: &str, b: &str) -> bool {
    match op {
        BinaryOperator::Equals => a == b,
        BinaryOperator::NotEquals => a != b,
        _ => compare_numbers(op, string_to_number(a), string_to_number(b)),
    }
}

fn compare_node_set<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    nodes: &[N],
    other: &XPathValue<N>,
) -> bool {
    match other {
        XPathValue::Boolean(_) => {
            compare_atomic(op, &XPathValue::Boolean(!nodes.is_empty()), other)
        }
        XPathValue::Number(n) => nodes
            .iter()
            .any(|x| compare_numbers(op, string_to_number(&x.string_value()), *n)),
        XPathValue::String(s) => nodes
            .iter()
            .any(|x| compare_strings(op, &x.string_value(), s)),
        XPathValue::NodeSet(_) => compare(op, &XPathValue::NodeSet(nodes.to_vec()), other),
    }
}

fn compare_atomic<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    let is_bool = |v: &XPathValue<N>| matches!(v, XPathValue::Boolean(_));
    let is_number = |v: &XPathValue<N>| matches!(v, XPathValue::Number(_));
    match op {
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let equal = if is_bool(left) || is_bool(right) {
                left.to_bool() == right.to_bool()
            } else if is_number(left) || is_number(right) {
                left.to_number() == right.to_number()
            } else {
                left.to_string() == right.to_string()
            };
            (op == BinaryOperator::Equals) == equal
        }
        _ => compare_numbers(op, left.to_number(), right.to_number()),
    }
}

fn compare_numbers(op: BinaryOperator, a: f64, b: f64) -> bool {
    match op {
        BinaryOperator::Equals => a == b,
        BinaryOperator::NotEquals => a != b,
        BinaryOperator::LessThan => a < b,
        BinaryOperator::LessThanOrEqual => a <= b,
        BinaryOperator::GreaterThan => a > b,
        BinaryOperator::GreaterThanOrEqual => a >= b,
        _ => false,
    }
}
