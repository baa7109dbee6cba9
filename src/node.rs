use std::{borrow::Cow, fmt};

use crate::value::Value;

pub type Location = Vec<PathElement>;
pub type NodeList<'v> = Vec<Node<'v>>;

/// A single match: a value and where it was found.
///
/// Most values are borrowed from the queried document. Function segments
/// derive new values, which are owned by the node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'v> {
    pub value: Cow<'v, Value>,
    pub location: Location,
}

/// An array element index or object member name in a Node's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    Index(usize),
    Name(String),
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Index(i) => write!(f, "[{}]", i),
            PathElement::Name(s) => write!(f, "['{}']", s.replace('\'', "\\'")),
        }
    }
}

impl<'v> Node<'v> {
    pub fn new(value: &'v Value) -> Self {
        Node {
            value: Cow::Borrowed(value),
            location: Location::new(),
        }
    }

    pub fn new_array_element(value: &'v Value, location: &Location, index: usize) -> Self {
        let mut location = location.clone();
        location.push(PathElement::Index(index));
        Node {
            value: Cow::Borrowed(value),
            location,
        }
    }

    pub fn new_object_member(value: &'v Value, location: &Location, name: &str) -> Self {
        let mut location = location.clone();
        location.push(PathElement::Name(name.to_owned()));
        Node {
            value: Cow::Borrowed(value),
            location,
        }
    }

    /// A node holding a value computed from the node at `location`.
    pub fn derived(value: Value, location: &Location) -> Self {
        Node {
            value: Cow::Owned(value),
            location: location.clone(),
        }
    }

    /// Detach this node from the document it was found in.
    pub fn into_owned(self) -> Node<'static> {
        Node {
            value: Cow::Owned(self.value.into_owned()),
            location: self.location,
        }
    }

    /// The location of this node's value in the query argument as a normalized path.
    pub fn path(&self) -> String {
        let mut path = String::from("$");
        for element in self.location.iter() {
            path.push_str(&element.to_string());
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(location: Location) -> Node<'static> {
        Node::derived(Value::Bool(true), &location)
    }

    #[test]
    fn normalized_path_names() {
        let node = node_at(vec![
            PathElement::Name(String::from("a")),
            PathElement::Name(String::from("b")),
            PathElement::Name(String::from("c")),
        ]);

        assert_eq!(node.path(), "$['a']['b']['c']");
    }

    #[test]
    fn normalized_path_indices() {
        let node = node_at(vec![
            PathElement::Index(1),
            PathElement::Index(2),
            PathElement::Index(3),
        ]);

        assert_eq!(node.path(), "$[1][2][3]");
    }

    #[test]
    fn normalized_path_mixed() {
        let node = node_at(vec![
            PathElement::Name(String::from("a")),
            PathElement::Index(2),
            PathElement::Name(String::from("it's")),
        ]);

        assert_eq!(node.path(), "$['a'][2]['it\\'s']");
    }

    #[test]
    fn normalized_path_root() {
        let value = Value::Null;
        assert_eq!(Node::new(&value).path(), "$");
    }

    #[test]
    fn child_locations_extend_the_parent() {
        let value = Value::Null;
        let parent = Node::new_object_member(&value, &Location::new(), "a");
        let child = Node::new_array_element(&value, &parent.location, 0);
        assert_eq!(parent.path(), "$['a']");
        assert_eq!(child.path(), "$['a'][0]");
    }
}
