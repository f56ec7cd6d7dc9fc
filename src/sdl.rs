//! Rendering synthesized types as GraphQL SDL.

use std::fmt::Write as _;

use crate::output::{NamedType, ObjectType, OutputScalar, OutputType, UnionType};

/// Render `types` as SDL, in the given order.
///
/// Custom scalars (`JSONString`, `GenericScalar`) used by any field are
/// declared first.
pub fn render_sdl(types: &[NamedType]) -> String {
    let mut blocks = Vec::new();

    for scalar in [OutputScalar::Json, OutputScalar::Generic] {
        if types.iter().any(|t| uses_scalar(t, scalar)) {
            blocks.push(format!("scalar {}", scalar.name()));
        }
    }
    for ty in types {
        blocks.push(match ty {
            NamedType::Object(object) => render_object(object),
            NamedType::Union(union) => render_union(union),
        });
    }

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// SDL reference to a field type.
pub fn type_ref(ty: &OutputType, required: bool) -> String {
    let name = match ty {
        OutputType::Scalar(scalar) => scalar.name().to_string(),
        OutputType::Object(object) => object.name.clone(),
        OutputType::Union(union) => union.name.clone(),
        OutputType::List(element) => format!("[{}]", type_ref(element, false)),
    };
    if required {
        name + "!"
    } else {
        name
    }
}

// --- Internal implementation ---

fn render_object(object: &ObjectType) -> String {
    let mut out = description(object.description.as_deref(), "");
    let _ = writeln!(out, "type {} {{", object.name);
    for field in &object.fields {
        out.push_str(&description(field.description.as_deref(), "  "));
        let _ = writeln!(out, "  {}: {}", field.name, type_ref(&field.ty, field.required));
    }
    out.push('}');
    out
}

fn render_union(union: &UnionType) -> String {
    let mut out = description(union.description.as_deref(), "");
    let members: Vec<&str> = union.members.iter().map(|m| m.name.as_str()).collect();
    let _ = write!(out, "union {} = {}", union.name, members.join(" | "));
    out
}

fn description(text: Option<&str>, indent: &str) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let text = text.replace("\"\"\"", "\\\"\"\"");
    if text.contains('\n') {
        let mut out = format!("{indent}\"\"\"\n");
        for line in text.lines() {
            let _ = writeln!(out, "{indent}{line}");
        }
        let _ = writeln!(out, "{indent}\"\"\"");
        out
    } else {
        format!("{indent}\"\"\"{text}\"\"\"\n")
    }
}

fn uses_scalar(ty: &NamedType, scalar: OutputScalar) -> bool {
    fn contains(ty: &OutputType, scalar: OutputScalar) -> bool {
        match ty {
            OutputType::Scalar(s) => *s == scalar,
            OutputType::List(element) => contains(element, scalar),
            OutputType::Object(_) | OutputType::Union(_) => false,
        }
    }

    match ty {
        NamedType::Object(object) => object.fields.iter().any(|f| contains(&f.ty, scalar)),
        NamedType::Union(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GeneratedField;
    use std::sync::Arc;

    fn field(name: &str, ty: OutputType, required: bool, description: Option<&str>) -> GeneratedField {
        GeneratedField {
            name: name.into(),
            source: name.into(),
            ty,
            required,
            description: description.map(str::to_owned),
        }
    }

    #[test]
    fn renders_objects_unions_and_scalars() {
        let entry = Arc::new(ObjectType {
            name: "EntryString".into(),
            description: Some("A named entry in a list of String".into()),
            fields: vec![
                field("key", OutputType::Scalar(OutputScalar::String), true, None),
                field("value", OutputType::Scalar(OutputScalar::String), true, None),
            ],
            discriminator: None,
        });
        let service = Arc::new(ObjectType {
            name: "Service".into(),
            description: Some("A service\nwith two lines".into()),
            fields: vec![
                field(
                    "environment",
                    OutputType::list(OutputType::Object(Arc::clone(&entry))),
                    false,
                    Some("Environment variables"),
                ),
                field("extra", OutputType::Scalar(OutputScalar::Json), true, None),
            ],
            discriminator: None,
        });
        let union = Arc::new(UnionType {
            name: "Anything".into(),
            description: None,
            members: vec![Arc::clone(&entry), Arc::clone(&service)],
        });

        let sdl = render_sdl(&[
            NamedType::Object(entry),
            NamedType::Object(service),
            NamedType::Union(union),
        ]);

        assert_eq!(
            sdl,
            r#"scalar JSONString

"""A named entry in a list of String"""
type EntryString {
  key: String!
  value: String!
}

"""
A service
with two lines
"""
type Service {
  """Environment variables"""
  environment: [EntryString]
  extra: JSONString!
}

union Anything = EntryString | Service
"#
        );
    }

    #[test]
    fn nested_list_references() {
        let ty = OutputType::list(OutputType::list(OutputType::Scalar(OutputScalar::Int)));
        assert_eq!(type_ref(&ty, true), "[[Int]]!");
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render_sdl(&[]), "");
    }
}
