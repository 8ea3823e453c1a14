//! Defines the registry and built-in implementations for the XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, string_to_number};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use crate::namespace::XML_NAMESPACE;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// The arity of a registered function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions such as `concat()`.
    pub max_args: Option<usize>,
}

impl FunctionSignature {
    fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }

    fn describe(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => format!("Expected {} argument(s)", max),
            Some(max) => format!("Expected {} to {} arguments", self.min_args, max),
            None => format!("Expected at least {} arguments", self.min_args),
        }
    }
}

/// The set of functions an expression may call, keyed by name.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionSignature>,
}

static BUILTINS: OnceLock<FunctionRegistry> = OnceLock::new();

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// The shared registry of the core function library, built on first use.
    pub fn builtin() -> &'static FunctionRegistry {
        BUILTINS.get_or_init(FunctionRegistry::default)
    }

    pub fn register(&mut self, name: &'static str, min_args: usize, max_args: Option<usize>) {
        self.functions.insert(
            name,
            FunctionSignature {
                name,
                min_args,
                max_args,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Fails unless `name` is registered and accepts `count` arguments.
    pub fn check_call(&self, name: &str, count: usize) -> Result<(), XPathError> {
        let signature = self.get(name).ok_or_else(|| XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown XPath function".to_string(),
        })?;
        if signature.accepts(count) {
            Ok(())
        } else {
            Err(XPathError::FunctionError {
                function: format!("{}()", name),
                message: format!("{}, got {}", signature.describe(), count),
            })
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        // Node-set
        registry.register("last", 0, Some(0));
        registry.register("position", 0, Some(0));
        registry.register("count", 1, Some(1));
        registry.register("id", 1, Some(1));
        registry.register("local-name", 0, Some(1));
        registry.register("namespace-uri", 0, Some(1));
        registry.register("name", 0, Some(1));
        // String
        registry.register("string", 0, Some(1));
        registry.register("concat", 2, None);
        registry.register("starts-with", 2, Some(2));
        registry.register("contains", 2, Some(2));
        registry.register("substring-before", 2, Some(2));
        registry.register("substring-after", 2, Some(2));
        registry.register("substring", 2, Some(3));
        registry.register("string-length", 0, Some(1));
        registry.register("normalize-space", 0, Some(1));
        registry.register("translate", 3, Some(3));
        // Boolean
        registry.register("boolean", 1, Some(1));
        registry.register("not", 1, Some(1));
        registry.register("true", 0, Some(0));
        registry.register("false", 0, Some(0));
        registry.register("lang", 1, Some(1));
        // Number
        registry.register("number", 0, Some(1));
        registry.register("sum", 1, Some(1));
        registry.register("floor", 1, Some(1));
        registry.register("ceiling", 1, Some(1));
        registry.register("round", 1, Some(1));
        registry
    }
}

/// Dispatches a function call to the correct implementation after checking
/// the call against the context's registry.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    e_ctx.functions.check_call(name, args.len())?;
    let mut args = args.into_iter();

    match name {
        // Node-set
        "last" => Ok(XPathValue::Number(e_ctx.context_size as f64)),
        "position" => Ok(XPathValue::Number(e_ctx.context_position as f64)),
        "count" => {
            let nodes = node_set_arg(name, args.next())?;
            Ok(XPathValue::Number(nodes.len() as f64))
        }
        "id" => func_id(args.next(), e_ctx),
        "local-name" => {
            let node = optional_node_arg(name, args.next(), e_ctx)?;
            Ok(XPathValue::String(
                node.and_then(|n| n.name())
                    .map(|q| q.local_part.to_string())
                    .unwrap_or_default(),
            ))
        }
        "namespace-uri" => {
            let node = optional_node_arg(name, args.next(), e_ctx)?;
            Ok(XPathValue::String(
                node.and_then(|n| n.namespace_uri())
                    .unwrap_or_default()
                    .to_string(),
            ))
        }
        "name" => {
            let node = optional_node_arg(name, args.next(), e_ctx)?;
            Ok(XPathValue::String(
                node.and_then(|n| n.name())
                    .map(|q| q.to_string())
                    .unwrap_or_default(),
            ))
        }

        // String
        "string" => Ok(XPathValue::String(string_or_context(args.next(), e_ctx))),
        "concat" => Ok(XPathValue::String(args.map(|v| v.to_string()).collect())),
        "starts-with" => {
            let (s1, s2) = two_strings(args);
            Ok(XPathValue::Boolean(s1.starts_with(&s2)))
        }
        "contains" => {
            let (s1, s2) = two_strings(args);
            Ok(XPathValue::Boolean(s1.contains(&s2)))
        }
        "substring-before" => {
            let (s1, s2) = two_strings(args);
            let before = s1.find(&s2).map(|i| &s1[..i]).unwrap_or_default();
            Ok(XPathValue::String(before.to_string()))
        }
        "substring-after" => {
            let (s1, s2) = two_strings(args);
            let after = s1.find(&s2).map(|i| &s1[i + s2.len()..]).unwrap_or_default();
            Ok(XPathValue::String(after.to_string()))
        }
        "substring" => {
            let s = next_string(&mut args);
            let start = next_number(&mut args);
            let length = args.next().map(|v| v.to_number());
            Ok(XPathValue::String(substring(&s, start, length)))
        }
        "string-length" => {
            let s = string_or_context(args.next(), e_ctx);
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            let s = string_or_context(args.next(), e_ctx);
            let normalized = s
                .split([' ', '\t', '\n', '\r'])
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(XPathValue::String(normalized))
        }
        "translate" => {
            let source = next_string(&mut args);
            let from: Vec<char> = next_string(&mut args).chars().collect();
            let to: Vec<char> = next_string(&mut args).chars().collect();
            Ok(XPathValue::String(translate(&source, &from, &to)))
        }

        // Boolean
        "boolean" => Ok(XPathValue::Boolean(
            args.next().is_some_and(|v| v.to_bool()),
        )),
        "not" => Ok(XPathValue::Boolean(
            !args.next().is_some_and(|v| v.to_bool()),
        )),
        "true" => Ok(XPathValue::Boolean(true)),
        "false" => Ok(XPathValue::Boolean(false)),
        "lang" => {
            let wanted = next_string(&mut args);
            Ok(XPathValue::Boolean(func_lang(&wanted, e_ctx)))
        }

        // Number
        "number" => Ok(XPathValue::Number(match args.next() {
            Some(v) => v.to_number(),
            None => XPathValue::NodeSet(vec![e_ctx.context_node]).to_number(),
        })),
        "sum" => {
            let nodes = node_set_arg(name, args.next())?;
            let sum = nodes
                .iter()
                .map(|n| string_to_number(&n.string_value()))
                .sum();
            Ok(XPathValue::Number(sum))
        }
        "floor" => Ok(XPathValue::Number(next_number(&mut args).floor())),
        "ceiling" => Ok(XPathValue::Number(next_number(&mut args).ceil())),
        "round" => Ok(XPathValue::Number(round(next_number(&mut args)))),

        _ => Err(XPathError::FunctionError {
            function: name.to_string(),
            message: "Registered but not implemented".to_string(),
        }),
    }
}

// --- Argument helpers ---

fn node_set_arg<'a, N: DataSourceNode<'a>>(
    function: &str,
    arg: Option<XPathValue<N>>,
) -> Result<Vec<N>, XPathError> {
    match arg {
        Some(XPathValue::NodeSet(nodes)) => Ok(nodes),
        v => Err(XPathError::TypeError(format!(
            "{}() argument must be a node-set, got {:?}",
            function, v
        ))),
    }
}

/// The first node (in document order) of an optional node-set argument,
/// defaulting to the context node when the argument is omitted.
fn optional_node_arg<'a, N: DataSourceNode<'a>>(
    function: &str,
    arg: Option<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Option<N>, XPathError> {
    match arg {
        None => Ok(Some(e_ctx.context_node)),
        Some(v) => Ok(node_set_arg(function, Some(v))?.into_iter().min()),
    }
}

fn string_or_context<'a, N: DataSourceNode<'a>>(
    arg: Option<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> String {
    match arg {
        Some(v) => v.to_string(),
        None => e_ctx.context_node.string_value(),
    }
}

fn next_string<'a, N: DataSourceNode<'a>>(
    args: &mut impl Iterator<Item = XPathValue<N>>,
) -> String {
    args.next().map(|v| v.to_string()).unwrap_or_default()
}

fn next_number<'a, N: DataSourceNode<'a>>(
    args: &mut impl Iterator<Item = XPathValue<N>>,
) -> f64 {
    args.next().map_or(f64::NAN, |v| v.to_number())
}

fn two_strings<'a, N: DataSourceNode<'a>>(
    mut args: impl Iterator<Item = XPathValue<N>>,
) -> (String, String) {
    let first = next_string(&mut args);
    let second = next_string(&mut args);
    (first, second)
}

// --- Implementations ---

/// Elements whose `id` or `xml:id` attribute matches one of the whitespace
/// separated tokens. A node-set argument contributes the tokens of each node.
fn func_id<'a, 'd, N: DataSourceNode<'a>>(
    arg: Option<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let id_text = match arg {
        Some(XPathValue::NodeSet(nodes)) => nodes
            .iter()
            .map(|n| n.string_value())
            .collect::<Vec<_>>()
            .join(" "),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let wanted: HashSet<&str> = id_text.split_whitespace().collect();
    if wanted.is_empty() {
        return Ok(XPathValue::NodeSet(vec![]));
    }

    let mut results = Vec::new();
    let mut stack = vec![e_ctx.root_node];
    while let Some(node) = stack.pop() {
        if node.node_type() == NodeType::Element {
            let is_match = node.attributes().any(|attr| {
                let is_id_attr = attr.name().is_some_and(|q| q.local_part == "id")
                    && matches!(attr.namespace_uri(), None | Some(XML_NAMESPACE));
                is_id_attr && wanted.contains(attr.string_value().as_str())
            });
            if is_match {
                results.push(node);
            }
        }
        stack.extend(node.children());
    }

    results.sort();
    Ok(XPathValue::NodeSet(results))
}

fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let first = round(start);
    let last = length.map_or(f64::INFINITY, |l| first + round(l));
    s.chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (*i + 1) as f64;
            pos >= first && pos < last
        })
        .map(|(_, c)| c)
        .collect()
}

fn translate(source: &str, from: &[char], to: &[char]) -> String {
    source
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect()
}

/// Walks up from the context node to the nearest `xml:lang` and compares it,
/// ignoring case and any subtag suffix.
fn func_lang<'a, N: DataSourceNode<'a>>(
    wanted: &str,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> bool {
    let wanted = wanted.to_lowercase();
    let mut current = Some(e_ctx.context_node);
    while let Some(node) = current {
        let lang = node.attributes().find(|attr| {
            attr.namespace_uri() == Some(XML_NAMESPACE)
                && attr.name().is_some_and(|q| q.local_part == "lang")
        });
        if let Some(attr) = lang {
            let lang = attr.string_value().to_lowercase();
            return lang == wanted
                || lang
                    .strip_prefix(wanted.as_str())
                    .is_some_and(|rest| rest.starts_with('-'));
        }
        current = node.parent();
    }
    false
}

/// XPath rounding: halves go towards positive infinity and -0.5..0 rounds to -0.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        (n + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, MockTree, create_test_tree};
    use crate::engine::EvaluationContext;
    use crate::namespace::NamespaceContext;

    struct TestSetup<'a> {
        tree: &'a MockTree<'a>,
        funcs: FunctionRegistry,
        namespaces: NamespaceContext,
        vars: HashMap<String, XPathValue<MockNode<'a>>>,
    }

    impl<'a> TestSetup<'a> {
        fn new(tree: &'a MockTree<'a>) -> Self {
            TestSetup {
                tree,
                funcs: FunctionRegistry::default(),
                namespaces: NamespaceContext::new(),
                vars: HashMap::new(),
            }
        }

        fn context(&self, node_id: usize) -> EvaluationContext<'a, '_, MockNode<'a>> {
            let root = MockNode {
                id: 0,
                tree: self.tree,
            };
            let node = MockNode {
                id: node_id,
                tree: self.tree,
            };
            EvaluationContext::new(node, root, &self.funcs, &self.namespaces, 1, 1, &self.vars)
        }

        fn call(&self, name: &str, args: Vec<XPathValue<MockNode<'a>>>) -> XPathValue<MockNode<'a>> {
            evaluate_function(name, args, &self.context(0)).unwrap()
        }

        fn node_set(&self, ids: &[usize]) -> XPathValue<MockNode<'a>> {
            XPathValue::NodeSet(
                ids.iter()
                    .map(|&id| MockNode {
                        id,
                        tree: self.tree,
                    })
                    .collect(),
            )
        }
    }

    fn s<N>(v: &str) -> XPathValue<N> {
        XPathValue::String(v.to_string())
    }

    fn n<N>(v: f64) -> XPathValue<N> {
        XPathValue::Number(v)
    }

    #[test]
    fn test_registry_rejects_unknown_names_and_bad_arity() {
        let registry = FunctionRegistry::default();
        assert!(registry.check_call("count", 1).is_ok());
        assert!(registry.check_call("concat", 5).is_ok());
        assert!(registry.check_call("count", 0).is_err());
        assert!(registry.check_call("concat", 1).is_err());
        assert!(registry.check_call("substring", 4).is_err());
        assert!(registry.check_call("evaluate", 1).is_err());
    }

    #[test]
    fn test_builtin_registry_is_shared() {
        let a = FunctionRegistry::builtin();
        let b = FunctionRegistry::builtin();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.len(), 27);
    }

    #[test]
    fn test_count_requires_a_node_set() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        assert_eq!(setup.call("count", vec![setup.node_set(&[1, 4, 7])]), n(3.0));
        let err = evaluate_function("count", vec![s("x")], &setup.context(0)).unwrap_err();
        assert!(matches!(err, XPathError::TypeError(_)));
    }

    #[test]
    fn test_name_functions_use_first_node_in_document_order() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let nodes = setup.node_set(&[7, 4]);
        assert_eq!(setup.call("name", vec![nodes.clone()]), s("cpp:define"));
        assert_eq!(setup.call("local-name", vec![nodes.clone()]), s("define"));
        assert_eq!(
            setup.call("namespace-uri", vec![nodes]),
            s("http://www.srcML.org/srcML/cpp")
        );
        assert_eq!(setup.call("name", vec![setup.node_set(&[])]), s(""));
    }

    #[test]
    fn test_string_functions() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        assert_eq!(setup.call("concat", vec![s("a"), n(1.0), s("b")]), s("a1b"));
        assert_eq!(
            setup.call("substring-before", vec![s("1999/04/01"), s("/")]),
            s("1999")
        );
        assert_eq!(
            setup.call("substring-after", vec![s("1999/04/01"), s("/")]),
            s("04/01")
        );
        assert_eq!(
            setup.call("normalize-space", vec![s("  a \n b\t ")]),
            s("a b")
        );
        assert_eq!(
            setup.call("translate", vec![s("--aaa--"), s("abc-"), s("ABC")]),
            s("AAA")
        );
        assert_eq!(setup.call("string-length", vec![s("héllo")]), n(5.0));
        assert_eq!(setup.call("string", vec![setup.node_set(&[1])]), s("NAMEmain42"));
    }

    #[test]
    fn test_substring_edge_cases() {
        assert_eq!(substring("12345", 2.0, Some(3.0)), "234");
        assert_eq!(substring("12345", 1.5, Some(2.6)), "234");
        assert_eq!(substring("12345", 0.0, Some(3.0)), "12");
        assert_eq!(substring("12345", f64::NAN, Some(3.0)), "");
        assert_eq!(substring("12345", 1.0, Some(f64::NAN)), "");
        assert_eq!(substring("12345", -42.0, Some(f64::INFINITY)), "12345");
        assert_eq!(substring("12345", f64::NEG_INFINITY, Some(f64::INFINITY)), "");
    }

    #[test]
    fn test_number_functions() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        assert_eq!(setup.call("number", vec![s(" 12 ")]), n(12.0));
        assert_eq!(setup.call("round", vec![n(2.5)]), n(3.0));
        assert_eq!(setup.call("round", vec![n(-2.5)]), n(-2.0));
        assert_eq!(setup.call("floor", vec![n(-1.5)]), n(-2.0));
        assert_eq!(setup.call("ceiling", vec![n(1.2)]), n(2.0));
        assert!(setup.call("sum", vec![setup.node_set(&[12, 2])]).to_number().is_nan());
        assert_eq!(setup.call("sum", vec![setup.node_set(&[12, 12])]), n(84.0));
        assert!(round(-0.3).is_sign_negative());
    }

    #[test]
    fn test_number_without_argument_uses_context_node() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(11);
        assert_eq!(evaluate_function("number", vec![], &e_ctx).unwrap(), n(42.0));
    }

    #[test]
    fn test_boolean_functions() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        assert_eq!(setup.call("boolean", vec![s("")]), XPathValue::Boolean(false));
        assert_eq!(setup.call("boolean", vec![n(f64::NAN)]), XPathValue::Boolean(false));
        assert_eq!(setup.call("not", vec![setup.node_set(&[])]), XPathValue::Boolean(true));
    }

    #[test]
    fn test_lang_inherits_from_ancestors() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(9);
        let lang = |l: &str| evaluate_function("lang", vec![s(l)], &e_ctx).unwrap();
        assert_eq!(lang("en"), XPathValue::Boolean(true));
        assert_eq!(lang("EN"), XPathValue::Boolean(true));
        assert_eq!(lang("e"), XPathValue::Boolean(false));
        assert_eq!(lang("fr"), XPathValue::Boolean(false));
    }

    #[test]
    fn test_id_finds_no_match_in_tree_without_ids() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        assert_eq!(setup.call("id", vec![s("a b")]), setup.node_set(&[]));
    }
}
