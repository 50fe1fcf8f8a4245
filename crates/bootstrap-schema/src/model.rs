//! # Schema Model
//!
//! Object-type definitions, their relations, and the userset rewrite
//! expressions that derive permissions from other relations.
//!
//! ```text
//! definition billing/invoice {
//!     relation workspace: workspace                       <- structural
//!     permission read = workspace->billing_invoice_read   <- derived
//! }
//! ```

use serde::{Deserialize, Serialize};

/// A named object type and its ordered relations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Definition {
    /// Type name, optionally prefixed (`billing/invoice`).
    pub name: String,
    /// Comments attached to the definition, verbatim including markers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Relations and permissions in declaration order.
    pub relations: Vec<Relation>,
}

impl Definition {
    /// Create an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comments: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Builder-style relation append.
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Find a relation or permission by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Check if a relation or permission with this name exists.
    pub fn has_relation(&self, name: &str) -> bool {
        self.relation(name).is_some()
    }
}

/// A relation or permission declared on a definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    /// Relation name.
    pub name: String,
    /// Comments attached to the relation, verbatim including markers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Structural or derived body.
    pub kind: RelationKind,
}

impl Relation {
    /// A structural relation (`relation name: subjects`).
    pub fn direct(name: impl Into<String>, subjects: Vec<AllowedSubject>) -> Self {
        Self {
            name: name.into(),
            comments: Vec::new(),
            kind: RelationKind::Relation(subjects),
        }
    }

    /// A derived permission (`permission name = expression`).
    pub fn permission(name: impl Into<String>, expression: Expression) -> Self {
        Self {
            name: name.into(),
            comments: Vec::new(),
            kind: RelationKind::Permission(expression),
        }
    }

    /// Check if this is a derived permission.
    pub fn is_permission(&self) -> bool {
        matches!(self.kind, RelationKind::Permission(_))
    }

    /// The rewrite expression of a permission.
    pub fn expression(&self) -> Option<&Expression> {
        match &self.kind {
            RelationKind::Permission(expr) => Some(expr),
            RelationKind::Relation(_) => None,
        }
    }
}

/// Body of a relation declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Direct link to the listed subject types.
    Relation(Vec<AllowedSubject>),
    /// Computed from other relations.
    Permission(Expression),
}

/// A subject type allowed on a structural relation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowedSubject {
    /// Subject object type.
    pub object_type: String,
    /// Which subjects of that type are allowed.
    pub target: SubjectTarget,
}

/// Qualifier on an allowed subject type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubjectTarget {
    /// The object itself (`user`).
    Ellipsis,
    /// Members of a relation on the object (`group#member`).
    Relation(String),
    /// Every object of the type (`user:*`).
    Wildcard,
}

impl AllowedSubject {
    /// `type`
    pub fn object(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            target: SubjectTarget::Ellipsis,
        }
    }

    /// `type#relation`
    pub fn relation(object_type: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            target: SubjectTarget::Relation(relation.into()),
        }
    }

    /// `type:*`
    pub fn wildcard(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            target: SubjectTarget::Wildcard,
        }
    }
}

/// Userset rewrite expression of a permission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// The empty set.
    Nil,
    /// Another relation on the same object.
    Computed(String),
    /// Follow `tupleset` and evaluate `computed` on the far object.
    Arrow {
        /// Relation to walk.
        tupleset: String,
        /// Relation evaluated on the target.
        computed: String,
    },
    /// Any child matches.
    Union(Vec<Expression>),
    /// All children match.
    Intersection(Vec<Expression>),
    /// Base minus subtracted.
    Exclusion(Box<Expression>, Box<Expression>),
}

impl Expression {
    /// `relation`
    pub fn computed(relation: impl Into<String>) -> Self {
        Expression::Computed(relation.into())
    }

    /// `tupleset->computed`
    pub fn arrow(tupleset: impl Into<String>, computed: impl Into<String>) -> Self {
        Expression::Arrow {
            tupleset: tupleset.into(),
            computed: computed.into(),
        }
    }

    /// `a + b + ...`
    pub fn union<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Expression>,
    {
        Expression::Union(children.into_iter().collect())
    }

    /// `a & b & ...`
    pub fn intersection<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Expression>,
    {
        Expression::Intersection(children.into_iter().collect())
    }

    /// `base - subtracted`
    pub fn exclusion(base: Expression, subtracted: Expression) -> Self {
        Expression::Exclusion(Box::new(base), Box::new(subtracted))
    }

    /// Check if this node combines other expressions.
    pub fn is_set_operation(&self) -> bool {
        matches!(
            self,
            Expression::Union(_) | Expression::Intersection(_) | Expression::Exclusion(..)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_lookup() {
        let def = Definition::new("doc")
            .with_relation(Relation::direct("owner", vec![AllowedSubject::object("user")]))
            .with_relation(Relation::permission("view", Expression::computed("owner")));

        assert!(def.has_relation("owner"));
        assert!(def.relation("view").unwrap().is_permission());
        assert!(!def.relation("owner").unwrap().is_permission());
        assert!(def.relation("edit").is_none());
    }

    #[test]
    fn test_expression_builders() {
        let expr = Expression::union([Expression::arrow("parent", "view"), Expression::computed("owner")]);
        assert!(expr.is_set_operation());
        assert_eq!(
            expr,
            Expression::Union(vec![
                Expression::Arrow {
                    tupleset: "parent".to_string(),
                    computed: "view".to_string(),
                },
                Expression::Computed("owner".to_string()),
            ])
        );
        assert!(!Expression::Nil.is_set_operation());
    }

    #[test]
    fn test_relation_expression_accessor() {
        let rel = Relation::permission("view", Expression::computed("owner"));
        assert_eq!(rel.expression(), Some(&Expression::computed("owner")));
        let rel = Relation::direct("owner", vec![AllowedSubject::wildcard("user")]);
        assert_eq!(rel.expression(), None);
    }
}
