//! Parsed document model
//!
//! `scraper::Html` is not shareable between worker tasks, so the fetched page is
//! parsed once and copied into an owned arena tree. The tree supports
//! child/sibling navigation and a depth-first walk over every node.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use scraper::{Html, Node};
use std::borrow::Cow;

/// How much of the body is inspected for a charset declaration or binary data
const SNIFF_LEN: usize = 1024;

/// Index of a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Content of one document node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root
    Document,

    /// `<!DOCTYPE ...>` declaration
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },

    /// An element with its lowercase tag name and attributes in source order
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },

    /// A text node
    Text(String),

    /// A comment
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Owned, thread-safe HTML document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Parses raw document bytes
    ///
    /// The body is decoded from its byte order mark, UTF-8, a declared
    /// charset or windows-1252, in that order. The HTML parser recovers from
    /// any malformed markup, so the only rejected input is binary content.
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - Successfully parsed document
    /// * `Err(String)` - The body is not text
    pub fn parse(body: &[u8]) -> Result<Self, String> {
        let text = decode_body(body)?;
        Ok(Self::parse_str(&text))
    }

    /// Parses an HTML string
    pub fn parse_str(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Self { nodes: Vec::new() };

        // Depth-first copy; children are pushed in reverse so they are popped,
        // and therefore appended, in source order.
        let mut stack = vec![(parsed.tree.root(), None)];
        while let Some((node, parent)) = stack.pop() {
            let kind = match node.value() {
                Node::Document | Node::Fragment => NodeKind::Document,
                Node::Doctype(doctype) => NodeKind::Doctype {
                    name: doctype.name().to_string(),
                    public_id: doctype.public_id().to_string(),
                    system_id: doctype.system_id().to_string(),
                },
                Node::Element(element) => NodeKind::Element {
                    name: element.name().to_ascii_lowercase(),
                    attrs: element
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect(),
                },
                Node::Text(text) => NodeKind::Text(text.to_string()),
                Node::Comment(comment) => NodeKind::Comment(comment.to_string()),
                Node::ProcessingInstruction(_) => continue,
            };

            let id = document.push(kind, parent);
            for child in node.children().rev() {
                stack.push((child, Some(id)));
            }
        }

        document
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
        });

        if let Some(parent) = parent {
            match self.nodes[parent.0].last_child {
                Some(previous) => self.nodes[previous.0].next_sibling = Some(id),
                None => self.nodes[parent.0].first_child = Some(id),
            }
            self.nodes[parent.0].last_child = Some(id);
        }

        id
    }

    /// Returns the document root
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            document: self,
            id: NodeId(0),
        }
    }

    /// Returns the node with the given id
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { document: self, id })
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first, pre-order walk over every node
    pub fn descendants(&self) -> Descendants<'_> {
        self.root().descendants()
    }

    /// Depth-first walk over the elements with the given tag name
    pub fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.descendants().filter(move |node| node.is_element(name))
    }

    /// Returns the first `<!DOCTYPE>` node, if any
    pub fn doctype(&self) -> Option<NodeRef<'_>> {
        self.root()
            .children()
            .find(|node| matches!(node.kind(), NodeKind::Doctype { .. }))
    }
}

/// Decodes a response body to text
///
/// # Decoding Order
///
/// 1. A byte order mark selects UTF-8 or UTF-16
/// 2. A body that is valid UTF-8 is used as is
/// 3. A `charset=` label in the first kilobyte (a `<meta>` tag) picks the encoding
/// 4. Anything else is read as windows-1252, which maps every byte
///
/// Malformed sequences in a declared encoding become U+FFFD.
///
/// # Returns
///
/// * `Ok(Cow<str>)` - The decoded text
/// * `Err(String)` - The body holds NUL bytes without a UTF-16 byte order mark
fn decode_body(body: &[u8]) -> Result<Cow<'_, str>, String> {
    let head = &body[..body.len().min(SNIFF_LEN)];

    if Encoding::for_bom(body).is_none() && head.contains(&0) {
        return Err("document body is binary data, not text".to_string());
    }

    let encoding = if std::str::from_utf8(body).is_ok() {
        UTF_8
    } else {
        declared_charset(head).unwrap_or(WINDOWS_1252)
    };

    // decode() honours a byte order mark over the chosen encoding
    let (text, used, had_errors) = encoding.decode(body);
    if used != UTF_8 || had_errors {
        tracing::debug!(
            "Decoded {} byte body as {} (replacements: {})",
            body.len(),
            used.name(),
            had_errors
        );
    }

    Ok(text)
}

/// Finds a `charset=` label and maps it to an encoding
fn declared_charset(head: &[u8]) -> Option<&'static Encoding> {
    const MARKER: &[u8] = b"charset=";

    let start = head
        .windows(MARKER.len())
        .position(|window| window.eq_ignore_ascii_case(MARKER))?
        + MARKER.len();

    let label: Vec<u8> = head[start..]
        .iter()
        .skip_while(|&&b| b == b'"' || b == b'\'' || b == b' ')
        .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
        .copied()
        .collect();

    // HTML reads a UTF-16 label found in ASCII markup as UTF-8
    match Encoding::for_label(&label)? {
        encoding if encoding == UTF_16LE || encoding == UTF_16BE => Some(UTF_8),
        encoding => Some(encoding),
    }
}

/// Borrowed handle to one node of a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    document: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.document.nodes[self.id.0]
    }

    fn at(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.map(|id| NodeRef {
            document: self.document,
            id,
        })
    }

    /// The node's id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's content
    pub fn kind(&self) -> &'a NodeKind {
        &self.data().kind
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.at(self.data().parent)
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.at(self.data().first_child)
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.at(self.data().next_sibling)
    }

    /// Iterates over direct children in source order
    pub fn children(&self) -> Children<'a> {
        Children {
            next: self.first_child(),
        }
    }

    /// Depth-first, pre-order walk over this node and everything below it
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants { stack: vec![*self] }
    }

    /// Returns the tag name if this node is an element
    pub fn element_name(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Returns true if this node is an element with the given tag name
    pub fn is_element(&self, name: &str) -> bool {
        self.element_name() == Some(name)
    }

    /// Returns the value of an attribute; attribute names match case-insensitively
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of the direct text children
    pub fn own_text(&self) -> String {
        self.children()
            .filter_map(|child| match child.kind() {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Iterator over a node's direct children
pub struct Children<'a> {
    next: Option<NodeRef<'a>>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next_sibling();
        Some(current)
    }
}

/// Depth-first, pre-order iterator driven by an explicit stack
pub struct Descendants<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let mut children: Vec<_> = current.children().collect();
        children.reverse();
        self.stack.extend(children);
        Some(current)
    }
}
