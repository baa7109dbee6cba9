use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::{
    env::Environment,
    errors::JSONPathError,
    node::{Node, NodeList},
    query::Query,
    value::Value,
};

/// A boolean expression inside a filter segment, evaluated once per candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Exists {
        query: FilterQuery,
    },
    Comparison {
        query: FilterQuery,
        operator: ComparisonOperator,
        value: Value,
    },
    RegexMatch {
        query: FilterQuery,
        pattern: Pattern,
    },
    Not {
        predicate: Box<Predicate>,
    },
    Logical {
        left: Box<Predicate>,
        operator: LogicalOperator,
        right: Box<Predicate>,
    },
}

impl Predicate {
    /// Evaluate this predicate with `@` bound to `current`.
    ///
    /// Subpaths that resolve to nothing, or to more than one node, make
    /// comparisons and regex matches false.
    pub fn evaluate<'v>(
        &self,
        env: &Environment,
        root: &'v Value,
        current: &'v Value,
    ) -> Result<bool, JSONPathError> {
        match self {
            Predicate::Exists { query } => Ok(!query.resolve(env, root, current)?.is_empty()),
            Predicate::Comparison {
                query,
                operator,
                value,
            } => Ok(singular(query.resolve(env, root, current)?)
                .is_some_and(|left| compare(left.value.as_ref(), operator, value))),
            Predicate::RegexMatch { query, pattern } => {
                Ok(singular(query.resolve(env, root, current)?)
                    .is_some_and(|node| node.value.as_str().is_some_and(|s| pattern.is_match(s))))
            }
            Predicate::Not { predicate } => Ok(!predicate.evaluate(env, root, current)?),
            Predicate::Logical {
                left,
                operator: LogicalOperator::And,
                right,
            } => Ok(left.evaluate(env, root, current)? && right.evaluate(env, root, current)?),
            Predicate::Logical {
                left,
                operator: LogicalOperator::Or,
                right,
            } => Ok(left.evaluate(env, root, current)? || right.evaluate(env, root, current)?),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Exists { query } => write!(f, "{query}"),
            Predicate::Comparison {
                query,
                operator,
                value,
            } => write!(f, "{query} {operator} {value}"),
            Predicate::RegexMatch { query, pattern } => write!(f, "{query} =~ {pattern}"),
            Predicate::Not { predicate } => write!(f, "not ({predicate})"),
            Predicate::Logical {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
        }
    }
}

/// A path inside a filter, relative to the candidate (`@`) or to the
/// document root (`$`).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterQuery {
    Relative { query: Box<Query> },
    Root { query: Box<Query> },
}

impl FilterQuery {
    fn resolve<'v>(
        &self,
        env: &Environment,
        root: &'v Value,
        current: &'v Value,
    ) -> Result<NodeList<'v>, JSONPathError> {
        match self {
            FilterQuery::Relative { query } => query.resolve(env, root, current),
            FilterQuery::Root { query } => query.resolve(env, root, root),
        }
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterQuery::Relative { query } => write!(f, "@{}", query.segments_to_string()),
            FilterQuery::Root { query } => write!(f, "${}", query.segments_to_string()),
        }
    }
}

/// A compiled regex literal, like `/^bob/i`.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str, flags: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .ignore_whitespace(flags.contains('x'))
            .build()?;

        Ok(Self {
            source: source.to_owned(),
            flags: flags.to_owned(),
            regex,
        })
    }

    /// Unanchored search, use `^` and `$` to match the whole string.
    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source.replace('/', "\\/"), self.flags)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("and"),
            LogicalOperator::Or => f.write_str("or"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl ComparisonOperator {
    /// The operator to use when the operands swap sides.
    pub fn flip(self) -> Self {
        match self {
            ComparisonOperator::Eq => ComparisonOperator::Eq,
            ComparisonOperator::Ne => ComparisonOperator::Ne,
            ComparisonOperator::Ge => ComparisonOperator::Le,
            ComparisonOperator::Gt => ComparisonOperator::Lt,
            ComparisonOperator::Le => ComparisonOperator::Ge,
            ComparisonOperator::Lt => ComparisonOperator::Gt,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Eq => f.write_str("="),
            ComparisonOperator::Ne => f.write_str("!="),
            ComparisonOperator::Ge => f.write_str(">="),
            ComparisonOperator::Gt => f.write_str(">"),
            ComparisonOperator::Le => f.write_str("<="),
            ComparisonOperator::Lt => f.write_str("<"),
        }
    }
}

fn singular(nodes: NodeList) -> Option<Node> {
    if nodes.len() == 1 {
        nodes.into_iter().next()
    } else {
        None
    }
}

fn compare(left: &Value, op: &ComparisonOperator, right: &Value) -> bool {
    use ComparisonOperator::*;
    match op {
        Eq => left == right,
        Ne => left != right,
        Lt => lt(left, right),
        Gt => lt(right, left),
        Ge => lt(right, left) || left == right,
        Le => lt(left, right) || left == right,
    }
}

fn lt(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l < r,
        (Value::String(l), Value::String(r)) => l < r,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_numerically() {
        let (one, two) = (Value::Number(1.0), Value::Number(2.0));
        assert!(compare(&one, &ComparisonOperator::Lt, &two));
        assert!(compare(&two, &ComparisonOperator::Ge, &one));
        assert!(compare(&one, &ComparisonOperator::Le, &one));
        assert!(!compare(&one, &ComparisonOperator::Gt, &two));
    }

    #[test]
    fn strings_compare_lexicographically() {
        let (a, b) = (Value::from("apple"), Value::from("banana"));
        assert!(compare(&a, &ComparisonOperator::Lt, &b));
        assert!(compare(&a, &ComparisonOperator::Eq, &Value::from("apple")));
    }

    #[test]
    fn mixed_types_are_never_ordered_or_equal() {
        let (n, s) = (Value::Number(1.0), Value::from("1"));
        for op in [
            ComparisonOperator::Eq,
            ComparisonOperator::Lt,
            ComparisonOperator::Le,
            ComparisonOperator::Gt,
            ComparisonOperator::Ge,
        ] {
            assert!(!compare(&n, &op, &s), "{op}");
        }
        assert!(compare(&n, &ComparisonOperator::Ne, &s));
    }

    #[test]
    fn flipped_operators() {
        assert_eq!(ComparisonOperator::Lt.flip(), ComparisonOperator::Gt);
        assert_eq!(ComparisonOperator::Ge.flip(), ComparisonOperator::Le);
        assert_eq!(ComparisonOperator::Eq.flip(), ComparisonOperator::Eq);
    }

    #[test]
    fn pattern_flags() {
        let pattern = Pattern::new("^bob", "i").unwrap();
        assert!(pattern.is_match("Bobby"));
        assert!(!pattern.is_match("a bob"));
        assert_eq!(pattern.to_string(), "/^bob/i");
    }

    #[test]
    fn pattern_display_escapes_slashes() {
        let pattern = Pattern::new("a/b", "").unwrap();
        assert!(pattern.is_match("xa/by"));
        assert_eq!(pattern.to_string(), "/a\\/b/");
    }
}
