// XML document adapter over roxmltree
use roxmltree::Node;
use srcml_xpath1::{DataSourceNode, NodeType, QName, XML_NAMESPACE};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A parsed XML document, borrowing the text it was parsed from.
pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    /// Parses `text` as a namespace-aware XML document.
    ///
    /// An internal DTD subset is accepted; nothing else deviates from the
    /// parser defaults.
    pub fn parse(text: &'input str) -> Result<Self, roxmltree::Error> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)?;
        Ok(Self { doc })
    }

    /// The document (root) node, parent of the document element.
    pub fn root_node(&self) -> XmlNode<'_, 'input> {
        XmlNode::Tree(self.doc.root())
    }
}

/// A node of an [`XmlDocument`].
///
/// roxmltree stores attributes and namespace declarations as data on their
/// element, so those two node kinds are addressed by owner and index.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    /// The root, an element, text, comment or processing instruction.
    Tree(Node<'a, 'input>),
    Attribute {
        parent: Node<'a, 'input>,
        index: usize,
    },
    /// An in-scope namespace of `parent`.
    Namespace {
        parent: Node<'a, 'input>,
        index: usize,
    },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    /// Document-order key: an element precedes its namespace nodes, which
    /// precede its attributes, which precede its children.
    fn order_key(&self) -> (usize, u8, usize) {
        match self {
            XmlNode::Tree(node) => (node.id().get() as usize, 0, 0),
            XmlNode::Namespace { parent, index } => (parent.id().get() as usize, 1, *index),
            XmlNode::Attribute { parent, index } => (parent.id().get() as usize, 2, *index),
        }
    }

    fn attribute(&self) -> Option<roxmltree::Attribute<'a, 'input>> {
        match self {
            XmlNode::Attribute { parent, index } => parent.attributes().nth(*index),
            _ => None,
        }
    }

}

impl<'a> XmlNode<'a, 'a> {
    /// Prefix and URI of a namespace node.
    ///
    /// roxmltree does not list the implicit `xml` binding, so one index past
    /// the declared namespaces stands for it.
    fn namespace_binding(&self) -> Option<(Option<&'a str>, &'a str)> {
        let XmlNode::Namespace { parent, index } = self else {
            return None;
        };
        match parent.namespaces().nth(*index) {
            Some(ns) => Some((ns.name(), ns.uri())),
            None if *index == parent.namespaces().count() && !declares_xml(*parent) => {
                Some((Some("xml"), XML_NAMESPACE))
            }
            None => None,
        }
    }
}

fn declares_xml(node: Node<'_, '_>) -> bool {
    node.namespaces().any(|ns| ns.name() == Some("xml"))
}

impl PartialEq for XmlNode<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        self.order_key() == other.order_key()
    }
}

impl Eq for XmlNode<'_, '_> {}

impl PartialOrd for XmlNode<'_, '_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for XmlNode<'_, '_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl Hash for XmlNode<'_, '_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.order_key().hash(state);
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a, 'a> {
    fn node_type(&self) -> NodeType {
        match self {
            XmlNode::Tree(node) => {
                if node.is_root() {
                    NodeType::Root
                } else if node.is_text() {
                    NodeType::Text
                } else if node.is_comment() {
                    NodeType::Comment
                } else if node.is_pi() {
                    NodeType::ProcessingInstruction
                } else {
                    NodeType::Element
                }
            }
            XmlNode::Attribute { .. } => NodeType::Attribute,
            XmlNode::Namespace { .. } => NodeType::Namespace,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self {
            XmlNode::Tree(node) if node.is_element() => {
                let tag = node.tag_name();
                let prefix = tag
                    .namespace()
                    .and_then(|uri| node.lookup_prefix(uri))
                    .filter(|p| !p.is_empty());
                Some(QName {
                    prefix,
                    local_part: tag.name(),
                })
            }
            XmlNode::Tree(node) => node.pi().map(|pi| QName {
                prefix: None,
                local_part: pi.target,
            }),
            XmlNode::Attribute { parent, .. } => self.attribute().map(|attr| {
                let prefix = match attr.namespace() {
                    Some(XML_NAMESPACE) => Some("xml"),
                    Some(uri) => parent.lookup_prefix(uri).filter(|p| !p.is_empty()),
                    None => None,
                };
                QName {
                    prefix,
                    local_part: attr.name(),
                }
            }),
            // The default namespace node has an empty name.
            XmlNode::Namespace { .. } => self.namespace_binding().map(|(name, _)| QName {
                prefix: None,
                local_part: name.unwrap_or(""),
            }),
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        match self {
            XmlNode::Tree(node) if node.is_element() => node.tag_name().namespace(),
            XmlNode::Attribute { .. } => self.attribute().and_then(|attr| attr.namespace()),
            _ => None,
        }
    }

    fn string_value(&self) -> String {
        match self {
            XmlNode::Tree(node) => {
                if node.is_element() || node.is_root() {
                    node.descendants()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect()
                } else if node.is_pi() {
                    node.pi()
                        .and_then(|pi| pi.value)
                        .unwrap_or("")
                        .to_string()
                } else {
                    // Text and comment nodes.
                    node.text().unwrap_or("").to_string()
                }
            }
            XmlNode::Attribute { .. } => self
                .attribute()
                .map(|attr| attr.value().to_string())
                .unwrap_or_default(),
            XmlNode::Namespace { .. } => self
                .namespace_binding()
                .map(|(_, uri)| uri.to_string())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) if node.is_element() => {
                let parent = *node;
                let count = node.attributes().len();
                Box::new((0..count).map(move |index| XmlNode::Attribute { parent, index }))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn namespaces(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) if node.is_element() => {
                let parent = *node;
                let mut count = node.namespaces().count();
                if !declares_xml(parent) {
                    count += 1;
                }
                Box::new((0..count).map(move |index| XmlNode::Namespace { parent, index }))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) => Box::new(node.children().map(XmlNode::Tree)),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            XmlNode::Tree(node) => node.parent().map(XmlNode::Tree),
            XmlNode::Attribute { parent, .. } | XmlNode::Namespace { parent, .. } => {
                Some(XmlNode::Tree(*parent))
            }
        }
    }
}
