//! # Schema Generator
//!
//! Renders definitions back to schema text. The output compiles back to the
//! same definitions.

use thiserror::Error;

use crate::model::{AllowedSubject, Definition, Expression, Relation, RelationKind, SubjectTarget};

/// A definition that cannot be expressed as schema text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// A definition, relation or referenced name is empty
    #[error("empty name in {context}")]
    EmptyName {
        /// Where the empty name was found.
        context: String,
    },

    /// A structural relation allows no subject types
    #[error("relation `{relation}` on `{definition}` has no allowed subjects")]
    NoSubjects {
        /// Owning definition.
        definition: String,
        /// Offending relation.
        relation: String,
    },

    /// A union or intersection has no children
    #[error("permission `{relation}` on `{definition}` has an empty set operation")]
    EmptySetOperation {
        /// Owning definition.
        definition: String,
        /// Offending permission.
        relation: String,
    },
}

/// Render definitions as schema text, separated by blank lines.
///
/// ```
/// use bootstrap_schema::generator::generate;
/// use bootstrap_schema::model::{AllowedSubject, Definition, Relation};
///
/// let doc = Definition::new("doc")
///     .with_relation(Relation::direct("owner", vec![AllowedSubject::object("user")]));
/// let text = generate(&[Definition::new("user"), doc]).unwrap();
/// assert_eq!(text, "definition user {}\n\ndefinition doc {\n\trelation owner: user\n}");
/// ```
pub fn generate(definitions: &[Definition]) -> Result<String, GenerateError> {
    let rendered = definitions
        .iter()
        .map(render_definition)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join("\n\n"))
}

fn render_definition(definition: &Definition) -> Result<String, GenerateError> {
    if definition.name.is_empty() {
        return Err(GenerateError::EmptyName {
            context: "definition".to_string(),
        });
    }

    let mut out = String::new();
    for comment in &definition.comments {
        out.push_str(comment);
        out.push('\n');
    }

    if definition.relations.is_empty() {
        out.push_str(&format!("definition {} {{}}", definition.name));
        return Ok(out);
    }

    out.push_str(&format!("definition {} {{\n", definition.name));
    for relation in &definition.relations {
        for comment in &relation.comments {
            out.push('\t');
            out.push_str(comment);
            out.push('\n');
        }
        out.push('\t');
        out.push_str(&render_relation(&definition.name, relation)?);
        out.push('\n');
    }
    out.push('}');
    Ok(out)
}

fn render_relation(definition: &str, relation: &Relation) -> Result<String, GenerateError> {
    if relation.name.is_empty() {
        return Err(GenerateError::EmptyName {
            context: format!("relation of `{definition}`"),
        });
    }

    match &relation.kind {
        RelationKind::Relation(subjects) => {
            if subjects.is_empty() {
                return Err(GenerateError::NoSubjects {
                    definition: definition.to_string(),
                    relation: relation.name.clone(),
                });
            }
            let subjects = subjects
                .iter()
                .map(|s| render_subject(definition, &relation.name, s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("relation {}: {}", relation.name, subjects.join(" | ")))
        }
        RelationKind::Permission(expression) => {
            let mut body = String::new();
            render_expression(definition, &relation.name, expression, &mut body)?;
            Ok(format!("permission {} = {}", relation.name, body))
        }
    }
}

fn render_subject(definition: &str, relation: &str, subject: &AllowedSubject) -> Result<String, GenerateError> {
    let empty = || GenerateError::EmptyName {
        context: format!("subject of `{definition}#{relation}`"),
    };
    if subject.object_type.is_empty() {
        return Err(empty());
    }
    Ok(match &subject.target {
        SubjectTarget::Ellipsis => subject.object_type.clone(),
        SubjectTarget::Wildcard => format!("{}:*", subject.object_type),
        SubjectTarget::Relation(rel) if rel.is_empty() => return Err(empty()),
        SubjectTarget::Relation(rel) => format!("{}#{}", subject.object_type, rel),
    })
}

fn render_expression(
    definition: &str,
    relation: &str,
    expression: &Expression,
    out: &mut String,
) -> Result<(), GenerateError> {
    let empty_name = || GenerateError::EmptyName {
        context: format!("expression of `{definition}#{relation}`"),
    };

    match expression {
        Expression::Nil => out.push_str("nil"),
        Expression::Computed(name) => {
            if name.is_empty() {
                return Err(empty_name());
            }
            out.push_str(name);
        }
        Expression::Arrow { tupleset, computed } => {
            if tupleset.is_empty() || computed.is_empty() {
                return Err(empty_name());
            }
            out.push_str(tupleset);
            out.push_str("->");
            out.push_str(computed);
        }
        Expression::Union(children) | Expression::Intersection(children) => {
            if children.is_empty() {
                return Err(GenerateError::EmptySetOperation {
                    definition: definition.to_string(),
                    relation: relation.to_string(),
                });
            }
            let (operator, level) = match expression {
                Expression::Union(_) => (" + ", UNION),
                _ => (" & ", INTERSECTION),
            };
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push_str(operator);
                }
                render_operand(definition, relation, child, precedence(child) <= level, out)?;
            }
        }
        Expression::Exclusion(base, subtracted) => {
            render_operand(definition, relation, base, precedence(base) < EXCLUSION, out)?;
            out.push_str(" - ");
            render_operand(definition, relation, subtracted, subtracted.is_set_operation(), out)?;
        }
    }
    Ok(())
}

const UNION: u8 = 1;
const INTERSECTION: u8 = 2;
const EXCLUSION: u8 = 3;
const ATOM: u8 = 4;

/// Binding strength; a nested operand at or below its parent's level keeps its
/// parentheses so it compiles back to the same tree.
fn precedence(expression: &Expression) -> u8 {
    match expression {
        Expression::Union(_) => UNION,
        Expression::Intersection(_) => INTERSECTION,
        Expression::Exclusion(..) => EXCLUSION,
        _ => ATOM,
    }
}

fn render_operand(
    definition: &str,
    relation: &str,
    expression: &Expression,
    parenthesize: bool,
    out: &mut String,
) -> Result<(), GenerateError> {
    if parenthesize {
        out.push('(');
        render_expression(definition, relation, expression, out)?;
        out.push(')');
        Ok(())
    } else {
        render_expression(definition, relation, expression, out)
    }
}
