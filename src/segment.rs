use std::{borrow::Cow, fmt};

use itertools::Itertools;
use log::trace;

use crate::{
    env::Environment,
    errors::JSONPathError,
    filter::Predicate,
    node::{Location, Node, NodeList, PathElement},
    value::Value,
};

/// One step of a path expression. Each segment maps the nodes matched so
/// far to a new list of nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Field {
        name: String,
    },
    Wild,
    Recursive,
    Index {
        index: i64,
    },
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    KeyUnion {
        names: Vec<String>,
    },
    /// Keeps the candidates that satisfy a predicate. Array candidates are
    /// its elements. An object is a candidate itself, followed by its
    /// members, so after `..` an object can be selected twice: once by its
    /// own visit and once as a member of its parent.
    Filter {
        predicate: Box<Predicate>,
    },
    Function {
        name: String,
        args: Vec<Value>,
    },
}

impl Segment {
    pub fn resolve<'v>(
        &self,
        nodes: NodeList<'v>,
        env: &Environment,
        root: &'v Value,
    ) -> Result<NodeList<'v>, JSONPathError> {
        let mut rv: NodeList<'v> = Vec::new();

        for node in nodes {
            match node.value {
                Cow::Borrowed(value) => {
                    rv.append(&mut self.select(env, value, root, &node.location)?);
                }
                // Values computed by a function don't live in the document,
                // so neither do their children.
                Cow::Owned(ref value) => {
                    for child in self.select(env, value, root, &node.location)? {
                        rv.push(child.into_owned());
                    }
                }
            }
        }

        Ok(rv)
    }

    fn select<'a>(
        &self,
        env: &Environment,
        value: &'a Value,
        root: &'a Value,
        location: &Location,
    ) -> Result<NodeList<'a>, JSONPathError> {
        match self {
            Segment::Field { name } => Ok(match value {
                Value::Object(obj) => obj
                    .get_key_value(name)
                    .map(|(k, v)| Node::new_object_member(v, location, k))
                    .into_iter()
                    .collect(),
                Value::Null
                | Value::Bool(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::Array(_) => Vec::new(),
            }),
            Segment::Wild => Ok(children(value, location)),
            Segment::Recursive => {
                let mut nodes = Vec::new();
                descend(value, location, &mut nodes);
                Ok(nodes)
            }
            Segment::Index { index } => Ok(match value {
                Value::Array(array) => norm_index(*index, array.len())
                    .and_then(|i| Some(Node::new_array_element(array.get(i)?, location, i)))
                    .into_iter()
                    .collect(),
                Value::Null
                | Value::Bool(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::Object(_) => Vec::new(),
            }),
            Segment::Slice { start, stop, step } => match value {
                Value::Array(array) => slice(array, location, *start, *stop, *step),
                Value::Null
                | Value::Bool(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::Object(_) => Ok(Vec::new()),
            },
            Segment::KeyUnion { names } => Ok(match value {
                Value::Object(obj) => names
                    .iter()
                    .filter_map(|name| obj.get_key_value(name))
                    .map(|(k, v)| Node::new_object_member(v, location, k))
                    .collect(),
                Value::Null
                | Value::Bool(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::Array(_) => Vec::new(),
            }),
            Segment::Filter { predicate } => {
                let candidates = match value {
                    Value::Array(_) => children(value, location),
                    // An object is tested itself, then each of its members.
                    Value::Object(_) => {
                        let mut candidates = vec![Node {
                            value: Cow::Borrowed(value),
                            location: location.clone(),
                        }];
                        candidates.append(&mut children(value, location));
                        candidates
                    }
                    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                        vec![Node {
                            value: Cow::Borrowed(value),
                            location: location.clone(),
                        }]
                    }
                };

                let mut nodes = Vec::new();
                for candidate in candidates {
                    if predicate.evaluate(env, root, candidate.value.as_ref())? {
                        nodes.push(candidate);
                    }
                }
                Ok(nodes)
            }
            Segment::Function { name, args } => {
                let function = env.get(name).ok_or_else(|| {
                    JSONPathError::evaluation(format!("unknown function '{}'", name))
                })?;

                function
                    .sig()
                    .check(name, args)
                    .map_err(JSONPathError::evaluation)?;

                match function.call(value, args) {
                    Some(derived) => Ok(vec![Node::derived(derived, location)]),
                    None => {
                        trace!("{}() is not applicable to {}", name, value.kind());
                        Ok(Vec::new())
                    }
                }
            }
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field { name } => write!(f, "[{}]", quote(name)),
            Segment::Wild => f.write_str("[*]"),
            Segment::Recursive => f.write_str(".."),
            Segment::Index { index } => write!(f, "[{index}]"),
            Segment::Slice { start, stop, step } => {
                write!(
                    f,
                    "[{}:{}",
                    start.map(|i| i.to_string()).unwrap_or_default(),
                    stop.map(|i| i.to_string()).unwrap_or_default(),
                )?;
                if let Some(step) = step {
                    write!(f, ":{step}")?;
                }
                f.write_str("]")
            }
            Segment::KeyUnion { names } => {
                write!(f, "[{}]", names.iter().map(|name| quote(name)).join(", "))
            }
            Segment::Filter { predicate } => write!(f, "[?({predicate})]"),
            Segment::Function { name, args } => write!(f, "[{}({})]", name, args.iter().join(", ")),
        }
    }
}

fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// The immediate children of an array or object, in document order.
fn children<'v>(value: &'v Value, location: &Location) -> NodeList<'v> {
    match value {
        Value::Array(array) => array
            .iter()
            .enumerate()
            .map(|(i, v)| Node::new_array_element(v, location, i))
            .collect(),
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| Node::new_object_member(v, location, k))
            .collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Vec::new(),
    }
}

/// Collect `value` and all of its descendants, depth-first and pre-order.
///
/// Recursion depth equals the depth of the document. Documents decoded by
/// serde_json are limited to 128 levels unless its recursion limit is
/// disabled.
fn descend<'v>(value: &'v Value, location: &Location, nodes: &mut NodeList<'v>) {
    nodes.push(Node {
        value: Cow::Borrowed(value),
        location: location.clone(),
    });

    match value {
        Value::Array(array) => {
            for (i, v) in array.iter().enumerate() {
                let mut child_location = location.clone();
                child_location.push(PathElement::Index(i));
                descend(v, &child_location, nodes);
            }
        }
        Value::Object(obj) => {
            for (k, v) in obj.iter() {
                let mut child_location = location.clone();
                child_location.push(PathElement::Name(k.to_owned()));
                descend(v, &child_location, nodes);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => (),
    }
}

fn norm_index(index: i64, length: usize) -> Option<usize> {
    if index < 0 {
        index
            .checked_abs()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| length.checked_sub(i))
    } else {
        usize::try_from(index).ok()
    }
}

fn slice<'v>(
    array: &'v [Value],
    location: &Location,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<NodeList<'v>, JSONPathError> {
    let step = step.unwrap_or(1);

    if step == 0 {
        return Err(JSONPathError::evaluation(String::from(
            "slice step cannot be zero",
        )));
    }

    let len = i64::try_from(array.len()).unwrap_or(i64::MAX);
    let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };

    let bound = |i: i64| {
        if i < 0 {
            i.saturating_add(len).max(lower)
        } else {
            i.min(upper)
        }
    };

    let n_start = start
        .map(bound)
        .unwrap_or(if step < 0 { upper } else { lower });
    let n_stop = stop.map(bound).unwrap_or(if step < 0 { lower } else { upper });

    let mut nodes: NodeList = Vec::new();
    let mut i = n_start;

    while (step > 0 && i < n_stop) || (step < 0 && i > n_stop) {
        if let Some(v) = usize::try_from(i).ok().and_then(|index| array.get(index)) {
            nodes.push(Node::new_array_element(v, location, i as usize));
        }

        i = match i.checked_add(step) {
            Some(i) => i,
            None => break,
        };
    }

    Ok(nodes)
}
