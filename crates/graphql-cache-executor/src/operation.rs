//! The selection-set shape the executor consumes.
//!
//! The query code generator that would normally produce this tree from a
//! `.graphql` document is out of scope here, so this module defines the
//! minimal shape by hand: enough for a generator (or a test) to build
//! directly. Fragment spreads are pre-flattened — a spread's selections are
//! inlined at the point of use rather than resolved against a separate
//! fragment registry, since there is no codegen step upstream to hand us
//! fragment names in the first place.

use std::collections::HashMap;

use graphql_cache_types::CacheError;

/// The root a `GraphQLOperation` executes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

/// An argument value as written in a selection: either a literal or a
/// reference to one of the operation's variables.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Literal(serde_json::Value),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ArgumentValue,
}

impl Argument {
    pub fn literal(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value: ArgumentValue::Literal(value),
        }
    }

    pub fn variable(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ArgumentValue::Variable(variable.into()),
        }
    }
}

/// What a field's value looks like, recursively (a list's element shape may
/// itself be a list, to describe `[[Foo]]`-style nesting).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    Scalar,
    Object(Vec<Selection>),
    List(Box<FieldShape>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub response_key: String,
    pub arguments: Vec<Argument>,
    pub shape: FieldShape,
}

impl Field {
    /// A field whose response key equals its name (the common case; an
    /// aliased field sets `response_key` separately).
    pub fn scalar(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            response_key: name.clone(),
            name,
            arguments: Vec::new(),
            shape: FieldShape::Scalar,
        }
    }

    pub fn object(name: impl Into<String>, selections: Vec<Selection>) -> Self {
        let name = name.into();
        Self {
            response_key: name.clone(),
            name,
            arguments: Vec::new(),
            shape: FieldShape::Object(selections),
        }
    }

    pub fn list_of_objects(name: impl Into<String>, selections: Vec<Selection>) -> Self {
        let name = name.into();
        Self {
            response_key: name.clone(),
            name,
            arguments: Vec::new(),
            shape: FieldShape::List(Box::new(FieldShape::Object(selections))),
        }
    }

    pub fn with_alias(mut self, response_key: impl Into<String>) -> Self {
        self.response_key = response_key.into();
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<Argument>) -> Self {
        self.arguments = arguments;
        self
    }
}

/// An inline fragment, optionally conditioned on `__typename`. A bare
/// fragment spread to a named selection set is represented the same way,
/// with its selections already inlined (see module docs) and no type
/// condition.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
}

impl Selection {
    pub fn field(field: Field) -> Self {
        Selection::Field(field)
    }

    pub fn fragment(type_condition: Option<&str>, selections: Vec<Selection>) -> Self {
        Selection::InlineFragment(InlineFragment {
            type_condition: type_condition.map(str::to_string),
            selections,
        })
    }
}

/// A GraphQL operation as consumed by the executor: an operation type, a
/// variable environment, and a root selection set.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLOperation {
    pub operation_type: OperationType,
    pub variables: HashMap<String, serde_json::Value>,
    pub selections: Vec<Selection>,
}

impl GraphQLOperation {
    pub fn query(selections: Vec<Selection>) -> Self {
        Self {
            operation_type: OperationType::Query,
            variables: HashMap::new(),
            selections,
        }
    }

    pub fn with_variables(mut self, variables: HashMap<String, serde_json::Value>) -> Self {
        self.variables = variables;
        self
    }
}

/// Resolve a field's declared arguments against an operation's variables,
/// producing the `(name, value)` pairs `field_key` canonicalizes.
pub fn resolve_arguments(
    arguments: &[Argument],
    variables: &HashMap<String, serde_json::Value>,
) -> Result<Vec<(String, serde_json::Value)>, CacheError> {
    arguments
        .iter()
        .map(|arg| {
            let value = match &arg.value {
                ArgumentValue::Literal(value) => value.clone(),
                ArgumentValue::Variable(name) => variables.get(name).cloned().ok_or_else(|| {
                    CacheError::type_mismatch(
                        graphql_cache_types::CacheKey::new(format!("${name}")),
                        arg.name.clone(),
                        "declared variable",
                    )
                })?,
            };
            Ok((arg.name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_literal_and_variable_arguments() {
        let arguments = vec![
            Argument::literal("lang", serde_json::json!("en")),
            Argument::variable("episode", "ep"),
        ];
        let mut variables = HashMap::new();
        variables.insert("ep".to_string(), serde_json::json!("EMPIRE"));

        let resolved = resolve_arguments(&arguments, &variables).unwrap();
        assert_eq!(
            resolved,
            vec![
                ("lang".to_string(), serde_json::json!("en")),
                ("episode".to_string(), serde_json::json!("EMPIRE")),
            ]
        );
    }

    #[test]
    fn unknown_variable_is_a_type_mismatch() {
        let arguments = vec![Argument::variable("episode", "missing")];
        let err = resolve_arguments(&arguments, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch { .. }));
    }
}
