use std::{collections::HashMap, sync::Arc};

use lazy_static::lazy_static;

use crate::{
    errors::JSONPathError,
    function::{FunctionExtension, FunctionRegister},
    lexer::lex,
    node::NodeList,
    parser::Parser,
    query::Query,
    standard_functions::{CharAt, Entries, Keys, Length, Substring, Values},
    value::Value,
};

lazy_static! {
    /// The environment used by [`Query::standard`] and [`Query::find`].
    pub static ref ENV: Environment = Environment::standard();
}

/// Function extensions available to queries. The parser checks function
/// calls against an environment's signatures and the evaluator calls the
/// same environment's implementations.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub function_register: FunctionRegister,
}

impl Environment {
    /// An environment without any functions.
    pub fn new() -> Self {
        Self {
            function_register: HashMap::new(),
        }
    }

    /// An environment with the built-in functions `length`, `substring`,
    /// `charAt`, `keys`, `values` and `entries`.
    pub fn standard() -> Self {
        let mut env = Self::new();
        env.add_function("length", Length::new());
        env.add_function("substring", Substring::new());
        env.add_function("charAt", CharAt::new());
        env.add_function("keys", Keys::new());
        env.add_function("values", Values::new());
        env.add_function("entries", Entries::new());
        env
    }

    /// Register a function extension, replacing any function with the same name.
    pub fn add_function(
        &mut self,
        name: &str,
        function: impl FunctionExtension + Send + Sync + 'static,
    ) {
        self.function_register
            .insert(name.to_owned(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FunctionExtension + Send + Sync>> {
        self.function_register.get(name)
    }

    /// Parse `expr` using this environment's functions.
    pub fn parse(&self, expr: &str) -> Result<Query, JSONPathError> {
        Parser::new(self).parse(lex(expr)?)
    }

    /// Parse `expr` and evaluate it against `value`.
    pub fn find<'v>(&self, expr: &str, value: &'v Value) -> Result<NodeList<'v>, JSONPathError> {
        self.parse(expr)?.find_in(self, value)
    }
}
