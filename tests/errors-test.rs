use jsonpath_engine::{JSONPathErrorType, Query};

mod syntax_errors {
    use super::*;

    #[test]
    #[should_panic(expected = "expected '$', found 'f'")]
    fn missing_root() {
        Query::standard("foo.bar").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '.', '..' or a bracketed selection, found 'b'")]
    fn trailing_name() {
        Query::standard("$.a b").unwrap();
    }

    #[test]
    #[should_panic(expected = "unknown function 'nosuchthing'")]
    fn unknown_function() {
        Query::standard("$.a[nosuchthing()]").unwrap();
    }

    #[test]
    #[should_panic(expected = "length() takes 0 arguments but 1 was given")]
    fn too_many_arguments() {
        Query::standard("$.a[length(1)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "substring() takes 1 to 2 arguments but 0 were given")]
    fn not_enough_arguments() {
        Query::standard("$.a.substring()").unwrap();
    }

    #[test]
    #[should_panic(expected = "argument 1 of substring() must be an integer")]
    fn wrong_argument_type() {
        Query::standard("$.a[substring('x', 2)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unbalanced parentheses")]
    fn unbalanced_parens() {
        Query::standard("$[?((@.foo)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected a filter expression")]
    fn empty_parens() {
        Query::standard("$[?()]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected a filter expression")]
    fn empty_filter() {
        Query::standard("$[?]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed bracketed selection")]
    fn unclosed_bracketed_selection() {
        Query::standard("$[1:3").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed bracketed selection")]
    fn unclosed_bracketed_selection_inside_filter() {
        Query::standard("$[?@.a < 1").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty bracketed selection")]
    fn empty_brackets() {
        Query::standard("$.a[]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected a quoted name, found ']'")]
    fn trailing_comma_in_key_union() {
        Query::standard("$['a',]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected ']', found ','")]
    fn index_union() {
        Query::standard("$[1,2]").unwrap();
    }

    #[test]
    #[should_panic(expected = "too many colons in slice")]
    fn too_many_colons() {
        Query::standard("$[1:2:3:4]").unwrap();
    }

    #[test]
    #[should_panic(expected = "slice step cannot be zero")]
    fn zero_step() {
        Query::standard("$[::0]").unwrap();
    }

    #[test]
    #[should_panic(expected = "invalid index '01'")]
    fn leading_zero() {
        Query::standard("$[01]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed string starting at 1:5")]
    fn unclosed_string() {
        Query::standard("$.a['b").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed regex literal starting at 1:12")]
    fn unclosed_regex() {
        Query::standard("$[?(@.a =~ /abc)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "invalid regex /(/")]
    fn invalid_regex() {
        Query::standard("$[?(@.a =~ /(/)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "filter expression literals must be compared")]
    fn bare_literal() {
        Query::standard("$[?(1)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected a literal, found '@'")]
    fn subpath_compared_to_subpath() {
        Query::standard("$[?(@.a = @.b)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected '&', did you mean '&&'?")]
    fn single_ampersand() {
        Query::standard("$[?(@.a & @.b)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "filter expression nested too deeply")]
    fn deeply_nested_parens() {
        let n = 500;
        Query::standard(&format!("$[?({}@.a{})]", "(".repeat(n), ")".repeat(n))).unwrap();
    }

    #[test]
    #[should_panic(expected = "filter expression nested too deeply")]
    fn long_not_chain() {
        Query::standard(&format!("$[?({}@.a)]", "!".repeat(20000))).unwrap();
    }

    #[test]
    #[should_panic(expected = "filter expression nested too deeply")]
    fn deeply_nested_filters() {
        let n = 200;
        Query::standard(&format!("${}{}", "[?(@".repeat(n), ")]".repeat(n))).unwrap();
    }
}

mod nesting {
    use super::*;

    #[test]
    fn moderate_nesting_is_fine() {
        let n = 32;
        let query = Query::standard(&format!("$[?({}@.a{})]", "(".repeat(n), ")".repeat(n)));
        assert!(query.is_ok());

        let query = Query::standard(&format!("$[?({}@.a)]", "not ".repeat(n)));
        assert!(query.is_ok());
    }

    #[test]
    fn nesting_limit_is_a_syntax_error() {
        let n = 300;
        let err = Query::standard(&format!("$[?({}@.a{})]", "(".repeat(n), ")".repeat(n)))
            .unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::SyntaxError);
        assert_eq!(err.line, 1);
    }
}

mod positions {
    use super::*;

    #[test]
    fn syntax_errors_cite_line_and_column() {
        let err = Query::standard("$.a[?(@.b = 1 and )]").unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::SyntaxError);
        assert_eq!((err.line, err.column), (1, 19));
        assert_eq!(
            err.to_string(),
            "syntax error: expected a filter expression (1:19)"
        );
    }

    #[test]
    fn positions_span_lines() {
        let err = Query::standard("$.a\n  .b[nosuchthing()]").unwrap_err();
        assert_eq!((err.line, err.column), (2, 6));
    }
}

mod evaluation_errors {
    use jsonpath_engine::{Segment, Value};

    use super::*;

    #[test]
    fn zero_step_in_a_hand_built_query() {
        let query = Query {
            segments: vec![Segment::Slice {
                start: None,
                stop: None,
                step: Some(0),
            }],
        };

        let err = query.find(&Value::Array(vec![Value::Null])).unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::EvaluationError);
        assert_eq!(err.to_string(), "evaluation error: slice step cannot be zero");
    }

    #[test]
    fn unknown_function_in_a_hand_built_query() {
        let query = Query {
            segments: vec![Segment::Function {
                name: String::from("nosuchthing"),
                args: vec![],
            }],
        };

        let err = query.find(&Value::Null).unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::EvaluationError);
        assert_eq!(err.msg, "unknown function 'nosuchthing'");
    }

    #[test]
    fn bad_arguments_in_a_hand_built_query() {
        let query = Query {
            segments: vec![Segment::Function {
                name: String::from("substring"),
                args: vec![],
            }],
        };

        let err = query.find(&Value::from("abc")).unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::EvaluationError);
    }

    #[test]
    fn shape_mismatches_are_not_errors() {
        let value = Value::from(serde_json::json!({"a": [1, "two", {"b": null}]}));
        for query in [
            "$.a.b",
            "$.a[10]",
            "$.a[5:1]",
            "$.a[0].b",
            "$.a['b', 'c']",
            "$.a[*][length()]",
            "$.a[*][substring(0, 40)]",
            "$.a[?(@.b > 1)]",
            "$.a[?(@ =~ /t/)]",
        ] {
            assert!(
                Query::standard(query).unwrap().find(&value).is_ok(),
                "{}",
                query
            );
        }
    }
}
