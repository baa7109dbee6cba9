use std::{collections::HashMap, fmt::Debug, sync::Arc};

use itertools::Itertools;

use crate::value::Value;

/// The type of a literal function argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Number,
    String,
    Value,
}

impl ParamType {
    fn accepts(&self, arg: &Value) -> bool {
        match self {
            ParamType::Int => arg.as_f64().is_some_and(|n| n.fract() == 0.0),
            ParamType::Number => matches!(arg, Value::Number(_)),
            ParamType::String => matches!(arg, Value::String(_)),
            ParamType::Value => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub param_types: Vec<ParamType>,
    /// Parameters after the first `required` are optional.
    pub required: usize,
}

impl FunctionSignature {
    pub fn new(param_types: Vec<ParamType>) -> Self {
        let required = param_types.len();
        Self {
            param_types,
            required,
        }
    }

    pub fn with_optional(param_types: Vec<ParamType>, required: usize) -> Self {
        Self {
            param_types,
            required,
        }
    }

    /// Check literal arguments against this signature, returning a message
    /// describing the first problem found.
    pub fn check(&self, name: &str, args: &[Value]) -> Result<(), String> {
        let max = self.param_types.len();

        if args.len() < self.required || args.len() > max {
            let expected = if self.required == max {
                format!("{} argument{}", max, if max == 1 { "" } else { "s" })
            } else {
                format!("{} to {} arguments", self.required, max)
            };

            return Err(format!(
                "{}() takes {} but {} {} given",
                name,
                expected,
                args.len(),
                if args.len() == 1 { "was" } else { "were" }
            ));
        }

        match self
            .param_types
            .iter()
            .zip(args)
            .find_position(|(typ, arg)| !typ.accepts(arg))
        {
            Some((i, (typ, arg))) => Err(format!(
                "argument {} of {}() must be {}, found {}",
                i + 1,
                name,
                match typ {
                    ParamType::Int => "an integer",
                    ParamType::Number => "a number",
                    ParamType::String => "a string",
                    ParamType::Value => "a value",
                },
                arg
            )),
            None => Ok(()),
        }
    }
}

/// A function that can be called as a path segment, like `[length()]`.
///
/// `call` is given the value of one match and the function's literal
/// arguments. Returning `None` drops the match.
pub trait FunctionExtension {
    fn call(&self, value: &Value, args: &[Value]) -> Option<Value>;
    fn sig(&self) -> FunctionSignature;
}

impl Debug for dyn FunctionExtension + Send + Sync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sig = self.sig();
        write!(f, "({:?}, required: {})", sig.param_types, sig.required)
    }
}

pub type FunctionRegister = HashMap<String, Arc<dyn FunctionExtension + Send + Sync>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_count() {
        let sig = FunctionSignature::new(vec![]);
        assert_eq!(
            sig.check("length", &[Value::Number(1.0)]),
            Err(String::from("length() takes 0 arguments but 1 was given"))
        );
    }

    #[test]
    fn optional_arguments() {
        let sig = FunctionSignature::with_optional(vec![ParamType::Int, ParamType::Int], 1);
        assert!(sig.check("substring", &[Value::Number(1.0)]).is_ok());
        assert!(sig
            .check("substring", &[Value::Number(1.0), Value::Number(2.0)])
            .is_ok());
        assert_eq!(
            sig.check("substring", &[]),
            Err(String::from(
                "substring() takes 1 to 2 arguments but 0 were given"
            ))
        );
    }

    #[test]
    fn argument_types() {
        let sig = FunctionSignature::new(vec![ParamType::Int]);
        assert_eq!(
            sig.check("charAt", &[Value::Number(1.5)]),
            Err(String::from(
                "argument 1 of charAt() must be an integer, found 1.5"
            ))
        );
        assert_eq!(
            sig.check("charAt", &[Value::from("a")]),
            Err(String::from(
                "argument 1 of charAt() must be an integer, found \"a\""
            ))
        );
    }
}
