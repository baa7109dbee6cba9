//! A JSONPath engine: a parser turning path expressions into a [`Query`],
//! and a tree-walking evaluator applying a query to a JSON [`Value`].
//!
//! The dialect is the one used by JSONPath-with-filters implementations like
//! jsonpath2, with `=` for equality, `=~` for regex matches and function
//! calls as path segments.
//!
//! ## Finding values
//!
//! ```
//! use jsonpath_engine::{errors::JSONPathError, Query, Value};
//! use serde_json::json;
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let data = Value::from(json!({
//!         "issues": [
//!             {"state": "open", "title": "Crash on start"},
//!             {"state": "closed", "title": "Typo"}
//!         ]
//!     }));
//!
//!     let q = Query::standard("$.issues[?(@.state = 'open')].title")?;
//!
//!     for node in q.find(&data)? {
//!         println!("{} => {}", node.path(), node.value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Prints:
//!
//! ```text
//! $['issues'][0]['title'] => "Crash on start"
//! ```
//!
//! A [`Query`] is displayed in its canonical form, which parses back to an
//! equal query.
//!
//! ```text
//! $['issues'][?(@['state'] = "open")]['title']
//! ```
//!
//! ## Function extensions
//!
//! Functions are called as segments, `$.title[length()]` or `$.title.length()`.
//! The standard environment provides `length`, `substring`, `charAt`, `keys`,
//! `values` and `entries`. Register more by implementing [`FunctionExtension`]
//! and adding it to an [`Environment`].
//!
//! ```
//! use jsonpath_engine::{
//!     errors::JSONPathError, Environment, FunctionExtension, FunctionSignature, Value,
//! };
//! use serde_json::json;
//!
//! struct Upper;
//!
//! impl FunctionExtension for Upper {
//!     fn call(&self, value: &Value, _args: &[Value]) -> Option<Value> {
//!         value.as_str().map(|s| Value::from(s.to_uppercase()))
//!     }
//!
//!     fn sig(&self) -> FunctionSignature {
//!         FunctionSignature::new(vec![])
//!     }
//! }
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let mut env = Environment::standard();
//!     env.add_function("upper", Upper);
//!
//!     let data = Value::from(json!({"name": "bob"}));
//!     let nodes = env.find("$.name.upper()", &data)?;
//!     assert_eq!(nodes[0].value.as_str(), Some("BOB"));
//!     Ok(())
//! }
//! ```
//!
//! Calling an unregistered function is a syntax error.
//!
//! ```text
//! Error: JSONPathError { kind: SyntaxError, msg: "unknown function 'upper'", line: 1, column: 8 }
//! ```
pub mod env;
pub mod errors;
pub mod filter;
pub mod function;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod query;
pub mod segment;
pub mod standard_functions;
mod token;
pub mod value;

pub use env::Environment;
pub use errors::JSONPathError;
pub use errors::JSONPathErrorType;
pub use function::FunctionExtension;
pub use function::FunctionSignature;
pub use function::ParamType;
pub use node::Node;
pub use node::NodeList;
pub use parser::Parser;
pub use query::Query;
pub use segment::Segment;
pub use value::Value;

/// Parse `expr` with the standard environment and evaluate it against `value`.
pub fn find<'v>(expr: &str, value: &'v Value) -> Result<NodeList<'v>, JSONPathError> {
    env::ENV.find(expr, value)
}
