//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step};
use super::functions::{self, FunctionRegistry};
use super::namespace::NamespaceContext;
use super::{axes, operators};
use crate::ast::UnaryOperator;
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    ///
    /// A node-set converts through the string-value of its first node in
    /// document order; an empty node-set is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => nodes
                .iter()
                .min()
                .map_or(f64::NAN, |n| string_to_number(&n.string_value())),
        }
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => match nodes.iter().min() {
                Some(first) => f.write_str(&first.string_value()),
                None => Ok(()),
            },
            XPathValue::String(s) => f.write_str(s),
            XPathValue::Number(n) => f.write_str(&format_number(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Converts a string to a number using the lexical form of an XPath `Number`:
/// optional whitespace, an optional minus sign, digits with an optional
/// fractional part, optional whitespace. Anything else is NaN.
///
/// Exponent forms such as `1e3` are NaN here, although libxml2 accepts them.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_xml_whitespace);
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let well_formed = all_digits(int_part)
        && frac_part.is_none_or(all_digits)
        && (!int_part.is_empty() || frac_part.is_some_and(|f| !f.is_empty()));
    if !well_formed {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Formats a number as the XPath 1.0 `string()` function does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// A container for all state needed during expression evaluation.
/// `'a` is the lifetime of the underlying data source.
/// `'d` is the lifetime of the evaluation context itself.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub functions: &'d FunctionRegistry,
    pub namespaces: &'d NamespaceContext,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    pub variables: &'d HashMap<String, XPathValue<N>>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context_node: N,
        root_node: N,
        functions: &'d FunctionRegistry,
        namespaces: &'d NamespaceContext,
        context_position: usize,
        context_size: usize,
        variables: &'d HashMap<String, XPathValue<N>>,
    ) -> Self {
        Self {
            context_node,
            root_node,
            functions,
            namespaces,
            context_position,
            context_size,
            variables,
            _marker: PhantomData,
        }
    }

    /// A context with the same bindings but a different focus.
    pub fn with_focus(&self, node: N, position: usize, size: usize) -> Self {
        Self::new(
            node,
            self.root_node,
            self.functions,
            self.namespaces,
            position,
            size,
            self.variables,
        )
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::Filter { base, predicates } => {
            let nodes = expect_node_set(evaluate(base, e_ctx)?, "filter expression")?;
            let mut filtered = apply_predicates(nodes, predicates, e_ctx)?;
            filtered.sort();
            filtered.dedup();
            Ok(XPathValue::NodeSet(filtered))
        }
        Expression::Variable(name) => e_ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| XPathError::UnknownVariable(name.clone())),
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp { left, op, right } => match op {
            // `and`/`or` do not evaluate their right operand once the result is known.
            BinaryOperator::Or => Ok(XPathValue::Boolean(
                evaluate(left, e_ctx)?.to_bool() || evaluate(right, e_ctx)?.to_bool(),
            )),
            BinaryOperator::And => Ok(XPathValue::Boolean(
                evaluate(left, e_ctx)?.to_bool() && evaluate(right, e_ctx)?.to_bool(),
            )),
            _ => {
                let left_val = evaluate(left, e_ctx)?;
                let right_val = evaluate(right, e_ctx)?;
                operators::evaluate(*op, left_val, right_val)
            }
        },
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
    }
}

fn expect_node_set<'a, N: DataSourceNode<'a>>(
    value: XPathValue<N>,
    what: &str,
) -> Result<Vec<N>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(XPathError::TypeError(format!(
            "{} must evaluate to a node-set, got {:?}",
            what, other
        ))),
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut current_nodes = if let Some(start_expr) = &path.start_point {
        expect_node_set(evaluate(start_expr, e_ctx)?, "path start")?
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// A node test with its prefix already resolved to a namespace URI.
enum ResolvedTest<'t> {
    Name {
        namespace: Option<&'t str>,
        local: &'t str,
    },
    AnyName,
    AnyInNamespace(&'t str),
    NodeType(NodeTypeTest),
    ProcessingInstruction(&'t str),
}

fn resolve_node_test<'t>(
    test: &'t NodeTest,
    namespaces: &'t NamespaceContext,
) -> Result<ResolvedTest<'t>, XPathError> {
    let lookup = |prefix: &str| {
        namespaces
            .resolve(prefix)
            .ok_or_else(|| XPathError::UndefinedPrefix(prefix.to_string()))
    };
    Ok(match test {
        NodeTest::Name { prefix, local } => ResolvedTest::Name {
            namespace: prefix.as_deref().map(lookup).transpose()?,
            local: local.as_str(),
        },
        NodeTest::Wildcard => ResolvedTest::AnyName,
        NodeTest::NamespaceWildcard(prefix) => ResolvedTest::AnyInNamespace(lookup(prefix)?),
        NodeTest::NodeType(ntt) => ResolvedTest::NodeType(*ntt),
        NodeTest::ProcessingInstruction(target) => {
            ResolvedTest::ProcessingInstruction(target.as_str())
        }
    })
}

fn principal_node_type(axis: Axis) -> NodeType {
    match axis {
        Axis::Attribute => NodeType::Attribute,
        Axis::Namespace => NodeType::Namespace,
        _ => NodeType::Element,
    }
}

fn matches_node_test<'a, N: DataSourceNode<'a>>(
    node: &N,
    test: &ResolvedTest<'_>,
    principal: NodeType,
) -> bool {
    match test {
        ResolvedTest::Name { namespace, local } => {
            node.node_type() == principal
                && node.name().is_some_and(|q| q.local_part == *local)
                && node.namespace_uri() == *namespace
        }
        ResolvedTest::AnyName => node.node_type() == principal,
        ResolvedTest::AnyInNamespace(uri) => {
            node.node_type() == principal && node.namespace_uri() == Some(*uri)
        }
        ResolvedTest::NodeType(ntt) => match ntt {
            NodeTypeTest::Text => node.node_type() == NodeType::Text,
            NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
            NodeTypeTest::ProcessingInstruction => {
                node.node_type() == NodeType::ProcessingInstruction
            }
            NodeTypeTest::Node => true,
        },
        ResolvedTest::ProcessingInstruction(target) => {
            node.node_type() == NodeType::ProcessingInstruction
                && node.name().is_some_and(|q| q.local_part == *target)
        }
    }
}

/// Evaluates a single step for every context node, then merges the results
/// into one duplicate-free node-set in document order.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let test = resolve_node_test(&step.node_test, e_ctx.namespaces)?;
    let principal = principal_node_type(step.axis);

    let mut merged = Vec::new();
    let mut axis_nodes = Vec::new();
    for &node in context_nodes {
        axis_nodes.clear();
        axes::collect(step.axis, node, &mut axis_nodes);
        let tested: Vec<N> = axis_nodes
            .iter()
            .filter(|n| matches_node_test(*n, &test, principal))
            .copied()
            .collect();
        merged.extend(apply_predicates(tested, &step.predicates, e_ctx)?);
    }

    merged.sort();
    merged.dedup();
    Ok(merged)
}

/// Filters `nodes` (already in proximity order) through each predicate in turn.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes;
    for predicate in predicates {
        let context_size = final_nodes.len();
        let mut kept = Vec::with_capacity(context_size);
        for (i, node) in final_nodes.iter().enumerate() {
            let predicate_e_ctx = e_ctx.with_focus(*node, i + 1, context_size);
            let keep = match evaluate(predicate, &predicate_e_ctx)? {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(*node);
            }
        }
        final_nodes = kept;
    }
    Ok(final_nodes)
}
