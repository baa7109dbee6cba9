use std::fmt;

use itertools::Itertools;
use lazy_static::lazy_static;
use log::{debug, trace};

use crate::{
    env::{Environment, ENV},
    errors::JSONPathError,
    lexer::lex,
    node::{Node, NodeList},
    parser::Parser,
    segment::Segment,
    value::Value,
};

lazy_static! {
    static ref PARSER: Parser<'static> = Parser::new(&ENV);
}

/// A parsed path expression. The root identifier `$` is implicit.
///
/// A `Query` holds no evaluation state, so one query can be shared between
/// threads and evaluated against any number of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub segments: Vec<Segment>,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.segments_to_string())
    }
}

impl Query {
    /// Parse `expr` using the standard function extensions.
    pub fn standard(expr: &str) -> Result<Self, JSONPathError> {
        PARSER.parse(lex(expr)?)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Evaluate this query against `value` using the standard environment.
    pub fn find<'v>(&self, value: &'v Value) -> Result<NodeList<'v>, JSONPathError> {
        self.find_in(&ENV, value)
    }

    /// Evaluate this query against `value`, calling functions registered with `env`.
    pub fn find_in<'v>(
        &self,
        env: &Environment,
        value: &'v Value,
    ) -> Result<NodeList<'v>, JSONPathError> {
        let nodes = self.resolve(env, value, value)?;
        debug!("{} matched {} node(s)", self, nodes.len());
        Ok(nodes)
    }

    pub(crate) fn resolve<'v>(
        &self,
        env: &Environment,
        root: &'v Value,
        current: &'v Value,
    ) -> Result<NodeList<'v>, JSONPathError> {
        self.segments
            .iter()
            .try_fold(vec![Node::new(current)], |nodes, segment| {
                let nodes = segment.resolve(nodes, env, root)?;
                trace!("{} -> {} node(s)", segment, nodes.len());
                Ok(nodes)
            })
    }

    /// This query's segments in canonical form, without the leading identifier.
    pub(crate) fn segments_to_string(&self) -> String {
        self.segments.iter().join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(query: &str, data: serde_json::Value) -> Vec<serde_json::Value> {
        let value = Value::from(data);
        Query::standard(query)
            .unwrap()
            .find(&value)
            .unwrap()
            .iter()
            .map(|node| serde_json::Value::from(node.value.as_ref()))
            .collect()
    }

    #[test]
    fn root_only() {
        let query = Query::standard("$").unwrap();
        assert!(query.is_empty());
        assert_eq!(values("$", json!({"a": 1})), vec![json!({"a": 1})]);
    }

    #[test]
    fn segments_compose_in_order() {
        let data = json!({"a": [{"b": 1}, {"b": 2}, {"c": 3}]});
        assert_eq!(values("$.a[*].b", data), vec![json!(1), json!(2)]);
    }

    #[test]
    fn recursive_descent_finds_fields_at_any_depth() {
        let data = json!({"id": 0, "a": {"id": 1, "b": [{"id": 2}]}});
        assert_eq!(
            values("$..id", data),
            vec![json!(0), json!(1), json!(2)]
        );
    }

    #[test]
    fn filter_in_the_middle_of_a_path() {
        let data = json!([
            {"state": "open", "title": "a"},
            {"state": "closed", "title": "b"},
            {"state": "open", "title": "c"}
        ]);
        assert_eq!(
            values("$[?(@.state = 'open')].title", data),
            vec![json!("a"), json!("c")]
        );
    }

    #[test]
    fn function_results_keep_their_location() {
        let value = Value::from(json!({"a": ["x", "yy"]}));
        let nodes = Query::standard("$.a[*][length()]")
            .unwrap()
            .find(&value)
            .unwrap();
        let paths: Vec<String> = nodes.iter().map(|n| n.path()).collect();
        assert_eq!(paths, vec!["$['a'][0]", "$['a'][1]"]);
        assert_eq!(nodes[1].value.as_f64(), Some(2.0));
    }

    #[test]
    fn segments_after_a_function() {
        let data = json!({"o": {"b": 1, "a": 2}});
        assert_eq!(values("$.o[keys()][0]", data), vec![json!("b")]);
    }
}
