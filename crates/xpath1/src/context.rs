//! An XPath evaluation context bound to one document.
//!
//! The context owns the namespace bindings and variables used to evaluate
//! expressions. Every expression is evaluated with the document root as its
//! context node.

use crate::ast::Expression;
use crate::datasource::DataSourceNode;
use crate::engine::{self, EvaluationContext, XPathValue};
use crate::error::XPathError;
use crate::functions::FunctionRegistry;
use crate::namespace::NamespaceContext;
use crate::parser;
use std::collections::HashMap;

pub struct XPathContext<'a, N: DataSourceNode<'a>> {
    root: N,
    namespaces: NamespaceContext,
    variables: HashMap<String, XPathValue<N>>,
    functions: &'static FunctionRegistry,
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a, N: DataSourceNode<'a> + 'a> XPathContext<'a, N> {
    /// Creates a context for the document whose root node is `root`.
    pub fn new(root: N) -> Self {
        Self {
            root,
            namespaces: NamespaceContext::new(),
            variables: HashMap::new(),
            functions: FunctionRegistry::builtin(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn root(&self) -> N {
        self.root
    }

    /// Binds `prefix` to `uri` for name tests in later evaluations.
    pub fn register_namespace(&mut self, prefix: &str, uri: &str) -> Result<(), XPathError> {
        self.namespaces.register(prefix, uri)
    }

    pub fn register_variable(&mut self, name: &str, value: XPathValue<N>) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn namespaces(&self) -> &NamespaceContext {
        &self.namespaces
    }

    /// Parses and evaluates `xpath` against the document root.
    pub fn evaluate(&self, xpath: &str) -> Result<XPathValue<N>, XPathError> {
        let expr = parser::parse_expression(xpath)?;
        log::trace!("Parsed '{}' into {:?}", xpath, expr);
        self.evaluate_expression(&expr)
    }

    /// Evaluates an already-parsed expression against the document root.
    pub fn evaluate_expression(&self, expr: &Expression) -> Result<XPathValue<N>, XPathError> {
        let e_ctx = EvaluationContext::new(
            self.root,
            self.root,
            self.functions,
            &self.namespaces,
            1,
            1,
            &self.variables,
        );
        engine::evaluate(expr, &e_ctx)
    }
}
