//! Defines the core abstraction for a navigable, read-only data source tree.
use std::hash::Hash;

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

impl std::fmt::Display for QName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_part),
            None => f.write_str(self.local_part),
        }
    }
}

/// The type of a node in the data source tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Namespace,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract for a node in a read-only, hierarchical document.
///
/// The evaluator is written exclusively against this trait, so any tree that
/// implements it (a parsed XML document, an in-memory mock) can be queried.
/// `Ord` must follow document order.
///
/// `'a` is the lifetime of the underlying document.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node (e.g., `src:unit`). Returns `None` for node
    /// types that do not have names, such as text or root nodes. For a processing-
    /// instruction, this is its target; for a namespace node, its prefix.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI of an element or attribute name, if it has one.
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The string value of the node, as defined by the XPath 1.0 `string()` function.
    /// - For a text node, this is its content.
    /// - For an element or the root, the concatenation of all descendant text nodes.
    /// - For an attribute, this is its value; for a namespace node, its URI.
    /// - For a comment or processing instruction, this is its content.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node.
    /// The iterator will be empty for non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the in-scope namespace nodes of an element.
    fn namespaces(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node.
    /// The iterator will be empty for leaf nodes (like text or attributes).
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. `None` only for the root. The parent of an attribute or
    /// namespace node is the element it belongs to.
    fn parent(&self) -> Option<Self>;
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    pub const MOCK_SRC_NS: &str = "http://www.srcML.org/srcML/src";
    pub const MOCK_CPP_NS: &str = "http://www.srcML.org/srcML/cpp";

    #[derive(Debug, Clone)]
    struct MockNodeData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        namespace: Option<&'a str>,
        value: &'a str,
        parent: Option<usize>,
        children: Vec<usize>,
        attributes: Vec<usize>,
    }

    /// An arena of nodes; ids are allocated in document order.
    #[derive(Debug, Default)]
    pub struct MockTree<'a> {
        nodes: Vec<MockNodeData<'a>>,
    }

    impl<'a> MockTree<'a> {
        fn add(
            &mut self,
            parent: Option<usize>,
            node_type: NodeType,
            name: Option<(Option<&'a str>, &'a str)>,
            namespace: Option<&'a str>,
            value: &'a str,
        ) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNodeData {
                node_type,
                name: name.map(|(prefix, local_part)| QName { prefix, local_part }),
                namespace,
                value,
                parent,
                children: vec![],
                attributes: vec![],
            });
            if let Some(pid) = parent {
                if node_type == NodeType::Attribute {
                    self.nodes[pid].attributes.push(id);
                } else {
                    self.nodes[pid].children.push(id);
                }
            }
            id
        }
    }

    /// A simple, in-memory node representation that holds a reference to its tree.
    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl<'a> MockNode<'a> {
        fn data(&self) -> &'a MockNodeData<'a> {
            &self.tree.nodes[self.id]
        }
    }

    impl PartialEq for MockNode<'_> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for MockNode<'_> {}

    impl PartialOrd for MockNode<'_> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl Ord for MockNode<'_> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl Hash for MockNode<'_> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.data().node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.data().name
        }

        fn namespace_uri(&self) -> Option<&'a str> {
            self.data().namespace
        }

        fn string_value(&self) -> String {
            let data = self.data();
            match data.node_type {
                NodeType::Root | NodeType::Element => {
                    let mut out = String::new();
                    collect_text(*self, &mut out);
                    out
                }
                _ => data.value.to_string(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                self.data()
                    .attributes
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn namespaces(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            Box::new(std::iter::empty())
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                self.data()
                    .children
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn parent(&self) -> Option<Self> {
            self.data().parent.map(|id| MockNode {
                id,
                tree: self.tree,
            })
        }
    }

    fn collect_text(node: MockNode<'_>, out: &mut String) {
        for child in node.children() {
            match child.node_type() {
                NodeType::Text => out.push_str(child.data().value),
                NodeType::Element => collect_text(child, out),
                _ => {}
            }
        }
    }

    /// Creates a small srcML-shaped mock tree for testing:
    /// ```text
    /// (root)                                           id 0
    ///   <src:unit language="C++" xml:lang="en">        id 1, attrs 2 & 3
    ///     <cpp:define>NAME</cpp:define>                id 4, text 5
    ///     <!-- note -->                                id 6
    ///     <src:function>                               id 7
    ///       <src:name>main</src:name>                  id 8, text 9
    ///     </src:function>
    ///     <?pi-target pi-value?>                       id 10
    ///     <plain>42</plain>                            id 11, text 12
    ///   </src:unit>
    /// ```
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        let mut tree = MockTree::default();
        let root = tree.add(None, NodeType::Root, None, None, "");
        let unit = tree.add(
            Some(root),
            NodeType::Element,
            Some((Some("src"), "unit")),
            Some(MOCK_SRC_NS),
            "",
        );
        tree.add(
            Some(unit),
            NodeType::Attribute,
            Some((None, "language")),
            None,
            "C++",
        );
        tree.add(
            Some(unit),
            NodeType::Attribute,
            Some((Some("xml"), "lang")),
            Some("http://www.w3.org/XML/1998/namespace"),
            "en",
        );
        let define = tree.add(
            Some(unit),
            NodeType::Element,
            Some((Some("cpp"), "define")),
            Some(MOCK_CPP_NS),
            "",
        );
        tree.add(Some(define), NodeType::Text, None, None, "NAME");
        tree.add(Some(unit), NodeType::Comment, None, None, " note ");
        let function = tree.add(
            Some(unit),
            NodeType::Element,
            Some((Some("src"), "function")),
            Some(MOCK_SRC_NS),
            "",
        );
        let name = tree.add(
            Some(function),
            NodeType::Element,
            Some((Some("src"), "name")),
            Some(MOCK_SRC_NS),
            "",
        );
        tree.add(Some(name), NodeType::Text, None, None, "main");
        tree.add(
            Some(unit),
            NodeType::ProcessingInstruction,
            Some((None, "pi-target")),
            None,
            "pi-value",
        );
        let plain = tree.add(
            Some(unit),
            NodeType::Element,
            Some((None, "plain")),
            None,
            "",
        );
        tree.add(Some(plain), NodeType::Text, None, None, "42");
        tree
    }
}
