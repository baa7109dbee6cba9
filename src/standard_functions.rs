use crate::{
    function::{FunctionExtension, FunctionSignature, ParamType},
    value::Value,
};

/// `length()`, the number of elements in an array or characters in a string.
pub struct Length;

impl Length {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionExtension for Length {
    fn call(&self, value: &Value, _args: &[Value]) -> Option<Value> {
        match value {
            Value::String(s) => Some(Value::from(s.chars().count())),
            Value::Array(a) => Some(Value::from(a.len())),
            _ => None,
        }
    }

    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(vec![])
    }
}

/// `substring(start[, len])`, at most `len` characters of a string starting
/// at character `start`. Out of range bounds are clamped.
pub struct Substring;

impl Substring {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for Substring {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionExtension for Substring {
    fn call(&self, value: &Value, args: &[Value]) -> Option<Value> {
        let s = value.as_str()?;
        let start = args.first().and_then(Value::as_f64).unwrap_or(0.0).max(0.0) as usize;
        let len = args
            .get(1)
            .and_then(Value::as_f64)
            .map(|n| n.max(0.0) as usize)
            .unwrap_or(usize::MAX);

        Some(Value::String(s.chars().skip(start).take(len).collect()))
    }

    fn sig(&self) -> FunctionSignature {
        FunctionSignature::with_optional(vec![ParamType::Int, ParamType::Int], 1)
    }
}

/// `charAt(i)`, the character at index `i` of a string. Negative indices
/// count from the end.
pub struct CharAt;

impl CharAt {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for CharAt {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionExtension for CharAt {
    fn call(&self, value: &Value, args: &[Value]) -> Option<Value> {
        let s = value.as_str()?;
        let index = args.first().and_then(Value::as_f64)? as i64;

        let ch = if index < 0 {
            let from_end = usize::try_from(index.checked_neg()?).ok()?;
            s.chars().rev().nth(from_end.checked_sub(1)?)?
        } else {
            s.chars().nth(usize::try_from(index).ok()?)?
        };

        Some(Value::String(ch.to_string()))
    }

    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(vec![ParamType::Int])
    }
}

/// `keys()`, an object's member names, or an array's indices.
pub struct Keys;

impl Keys {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionExtension for Keys {
    fn call(&self, value: &Value, _args: &[Value]) -> Option<Value> {
        match value {
            Value::Object(obj) => Some(Value::Array(
                obj.keys().map(|k| Value::from(k.as_str())).collect(),
            )),
            Value::Array(a) => Some(Value::Array((0..a.len()).map(Value::from).collect())),
            _ => None,
        }
    }

    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(vec![])
    }
}

/// `values()`, an object's member values, or a copy of an array.
pub struct Values;

impl Values {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionExtension for Values {
    fn call(&self, value: &Value, _args: &[Value]) -> Option<Value> {
        match value {
            Value::Object(obj) => Some(Value::Array(obj.values().cloned().collect())),
            Value::Array(a) => Some(Value::Array(a.clone())),
            _ => None,
        }
    }

    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(vec![])
    }
}

/// `entries()`, `[key, value]` pairs for each object member or array element.
pub struct Entries;

impl Entries {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for Entries {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionExtension for Entries {
    fn call(&self, value: &Value, _args: &[Value]) -> Option<Value> {
        match value {
            Value::Object(obj) => Some(Value::Array(
                obj.iter()
                    .map(|(k, v)| Value::Array(vec![Value::from(k.as_str()), v.clone()]))
                    .collect(),
            )),
            Value::Array(a) => Some(Value::Array(
                a.iter()
                    .enumerate()
                    .map(|(i, v)| Value::Array(vec![Value::from(i), v.clone()]))
                    .collect(),
            )),
            _ => None,
        }
    }

    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn substring(s: &str, args: &[f64]) -> Option<Value> {
        let args: Vec<Value> = args.iter().map(|n| Value::Number(*n)).collect();
        Substring::new().call(&Value::from(s), &args)
    }

    #[test]
    fn length_of_string_counts_characters() {
        assert_eq!(
            Length::new().call(&Value::from("héllo"), &[]),
            Some(Value::Number(5.0))
        );
    }

    #[test]
    fn length_of_array() {
        let value = Value::from(json!([1, [2, 3], {}]));
        assert_eq!(Length::new().call(&value, &[]), Some(Value::Number(3.0)));
    }

    #[test]
    fn length_of_other_types() {
        assert_eq!(Length::new().call(&Value::Number(42.0), &[]), None);
        assert_eq!(Length::new().call(&Value::from(json!({"a": 1})), &[]), None);
        assert_eq!(Length::new().call(&Value::Null, &[]), None);
    }

    #[test]
    fn substring_within_bounds() {
        assert_eq!(substring("hello world", &[0.0, 5.0]), Some(Value::from("hello")));
        assert_eq!(substring("hello world", &[6.0, 5.0]), Some(Value::from("world")));
    }

    #[test]
    fn substring_clamps() {
        assert_eq!(substring("hello", &[3.0, 40.0]), Some(Value::from("lo")));
        assert_eq!(substring("hello", &[10.0, 2.0]), Some(Value::from("")));
        assert_eq!(substring("hello", &[-2.0, 2.0]), Some(Value::from("he")));
        assert_eq!(substring("hello", &[1.0, -1.0]), Some(Value::from("")));
        assert_eq!(substring("", &[0.0, 40.0]), Some(Value::from("")));
    }

    #[test]
    fn substring_without_length() {
        assert_eq!(substring("hello", &[2.0]), Some(Value::from("llo")));
    }

    #[test]
    fn substring_of_non_string() {
        assert_eq!(
            Substring::new().call(&Value::Number(1.0), &[Value::Number(0.0)]),
            None
        );
    }

    #[test]
    fn char_at() {
        let f = CharAt::new();
        let s = Value::from("abc");
        assert_eq!(f.call(&s, &[Value::Number(1.0)]), Some(Value::from("b")));
        assert_eq!(f.call(&s, &[Value::Number(-1.0)]), Some(Value::from("c")));
        assert_eq!(f.call(&s, &[Value::Number(3.0)]), None);
        assert_eq!(f.call(&s, &[Value::Number(-4.0)]), None);
    }

    #[test]
    fn keys_values_entries() {
        let obj = Value::from(json!({"b": 1, "a": 2}));
        assert_eq!(
            Keys::new().call(&obj, &[]),
            Some(Value::from(json!(["b", "a"])))
        );
        assert_eq!(
            Values::new().call(&obj, &[]),
            Some(Value::from(json!([1, 2])))
        );
        assert_eq!(
            Entries::new().call(&obj, &[]),
            Some(Value::from(json!([["b", 1], ["a", 2]])))
        );
        assert_eq!(
            Keys::new().call(&Value::from(json!(["x", "y"])), &[]),
            Some(Value::from(json!([0, 1])))
        );
        assert_eq!(Keys::new().call(&Value::from("x"), &[]), None);
    }
}
