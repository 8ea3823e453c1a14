pub mod ast;
pub mod axes;
pub mod context;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod namespace;
pub mod operators;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
pub use context::XPathContext;
pub use datasource::{DataSourceNode, NodeType, QName};
pub use engine::{EvaluationContext, XPathValue, evaluate};
pub use namespace::{NamespaceContext, XML_NAMESPACE};

// Re-export test utilities for integration testing in downstream crates
pub use datasource::tests;
pub use error::XPathError;
pub use functions::FunctionRegistry;
pub use parser::{MAX_NESTING_DEPTH, MAX_OPERATORS, parse_expression};

/// Prepares the process-wide evaluator state (the core function library).
///
/// Calling it is optional and idempotent; contexts initialize it on first use.
pub fn init() {
    let functions = FunctionRegistry::builtin();
    log::trace!("XPath engine ready with {} core functions", functions.len());
}
