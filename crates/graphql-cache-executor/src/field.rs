//! Flattening a selection set into the concrete fields the executor
//! actually visits for one object.

use std::collections::HashMap;

use graphql_cache_types::{field_key, CacheError};

use crate::operation::{resolve_arguments, Field, Selection};

/// Metadata about one field, resolved against the operation's variables,
/// computed once per visit and threaded through resolution and
/// accumulation.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub field_name: String,
    pub response_key: String,
    pub arguments: Vec<(String, serde_json::Value)>,
    pub field_key: String,
}

/// Walk `selections`, inlining fragments whose type condition matches
/// `typename` (an absent condition always matches), in declaration order.
///
/// Selections on a differing `__typename` are dropped silently — not an
/// error, per the fragment-on-non-matching-typename case.
pub fn flatten_selections<'a>(
    selections: &'a [Selection],
    typename: Option<&str>,
) -> Vec<&'a Field> {
    let mut fields = Vec::new();
    flatten_into(selections, typename, &mut fields);
    fields
}

fn flatten_into<'a>(selections: &'a [Selection], typename: Option<&str>, out: &mut Vec<&'a Field>) {
    for selection in selections {
        match selection {
            Selection::Field(field) => out.push(field),
            Selection::InlineFragment(fragment) => {
                let matches = match &fragment.type_condition {
                    Some(condition) => typename == Some(condition.as_str()),
                    None => true,
                };
                if matches {
                    flatten_into(&fragment.selections, typename, out);
                }
            }
        }
    }
}

pub fn build_field_info(
    field: &Field,
    variables: &HashMap<String, serde_json::Value>,
) -> Result<FieldInfo, CacheError> {
    let arguments = resolve_arguments(&field.arguments, variables)?;
    let field_key = field_key(&field.name, &arguments);
    Ok(FieldInfo {
        field_name: field.name.clone(),
        response_key: field.response_key.clone(),
        arguments,
        field_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Field, Selection};

    #[test]
    fn unconditional_fragment_always_merges() {
        let selections = vec![Selection::fragment(
            None,
            vec![Selection::field(Field::scalar("name"))],
        )];
        let fields = flatten_selections(&selections, Some("Droid"));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "name");
    }

    #[test]
    fn fragment_on_non_matching_typename_yields_no_fields() {
        let selections = vec![Selection::fragment(
            Some("Human"),
            vec![Selection::field(Field::scalar("homePlanet"))],
        )];
        let fields = flatten_selections(&selections, Some("Droid"));
        assert!(fields.is_empty());
    }

    #[test]
    fn fragment_on_matching_typename_merges() {
        let selections = vec![Selection::fragment(
            Some("Droid"),
            vec![Selection::field(Field::scalar("primaryFunction"))],
        )];
        let fields = flatten_selections(&selections, Some("Droid"));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "primaryFunction");
    }
}
