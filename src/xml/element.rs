//! Owned XML element tree.
//!
//! The tree keeps qualified names as written in the document together with
//! the namespace each name resolved to, so callers can match on either.

/// An attribute on an element, with its resolved namespace (if prefixed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) value: String,
}

impl XmlAttribute {
    /// Qualified attribute name as written (e.g. `p:UUID`).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute name without its prefix.
    #[inline]
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Namespace URI of a prefixed attribute. Unprefixed attributes have none.
    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Unescaped attribute value.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element of a parsed document, owning its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    /// Default namespace in scope at this element.
    pub(crate) default_namespace: Option<String>,
    /// `xmlns` / `xmlns:prefix` declarations made on this element.
    pub(crate) declarations: Vec<(String, String)>,
    pub(crate) attributes: Vec<XmlAttribute>,
    pub(crate) children: Vec<XmlNode>,
}

impl XmlElement {
    /// Qualified element name as written (e.g. `slic3rpe:volume`).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element name without its prefix.
    #[inline]
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Namespace URI the element name resolved to.
    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Default namespace in scope at this element (`nsmap[None]`).
    #[inline]
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Namespace declarations made on this element, as `(prefix, uri)` pairs.
    /// The default namespace is reported with an empty prefix.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    /// All attributes in document order.
    #[inline]
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Look up an attribute value by its name as written. `id` does not
    /// match `s:id`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Look up a prefixed attribute by resolved namespace and local name,
    /// whatever prefix the document bound.
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace() == Some(namespace) && attr.local_name() == local_name)
            .map(|attr| attr.value.as_str())
    }

    /// All child nodes in document order.
    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            if let XmlNode::Text(t) = node {
                text.push_str(t);
            }
        }
        text
    }

    /// Depth-first iterator over every element below this one (excluding itself).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.elements().collect::<Vec<_>>().into_iter().rev().collect(),
        }
    }

    /// Every descendant element with the given local name in the given namespace,
    /// in document order. The equivalent of `.//ns:name`.
    pub fn find_all<'a>(
        &'a self,
        namespace: Option<&'a str>,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.descendants()
            .filter(move |e| e.local_name() == local_name && e.namespace() == namespace)
    }

    pub(crate) fn push_text(&mut self, text: String) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(XmlNode::Text(text));
        }
    }

    pub(crate) fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }
}

/// Pre-order traversal over an element's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let before = self.stack.len();
        self.stack.extend(next.elements());
        self.stack[before..].reverse();
        Some(next)
    }
}

#[inline]
fn local_part(name: &str) -> &str {
    match memchr::memchr(b':', name.as_bytes()) {
        Some(colon) => &name[colon + 1..],
        None => name,
    }
}
