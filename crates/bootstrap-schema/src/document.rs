//! # Bootstrap Document
//!
//! A YAML mapping whose `schema` key holds the schema text. Every other key
//! (for instance `relationships`) is carried through unchanged.
//!
//! ```yaml
//! schema: |-
//!   definition user {}
//!   ...
//! relationships: ""
//! ```

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;

/// Key holding the schema text.
pub const SCHEMA_KEY: &str = "schema";

/// A loaded bootstrap document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    schema: Schema,
    document: Mapping,
}

impl SchemaDocument {
    /// Parse a document from YAML text.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Yaml`] if the text is not a YAML mapping,
    /// [`SchemaError::MissingSchemaText`] if `schema` is absent or not a
    /// string, and any compile or graph error of the schema text.
    pub fn parse(yaml: &str) -> SchemaResult<Self> {
        let document: Mapping = serde_yaml::from_str(yaml)?;
        let text = document
            .get(SCHEMA_KEY)
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingSchemaText)?;
        let schema = Schema::compile(text)?;

        Ok(Self { schema, document })
    }

    /// Read and parse the document at `path`.
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|err| SchemaError::io(path, err))?;
        let document = Self::parse(&yaml)?;

        debug!(
            path = %path.display(),
            definitions = document.schema.definitions().len(),
            permissions = document.schema.permission_count(),
            "loaded bootstrap document"
        );
        Ok(document)
    }

    /// Render the document with regenerated schema text.
    pub fn render(&self) -> SchemaResult<String> {
        let mut document = self.document.clone();
        document.insert(Value::from(SCHEMA_KEY), Value::from(self.schema.to_text()?));
        Ok(serde_yaml::to_string(&document)?)
    }

    /// Write the document to `path`. Nothing is written if rendering fails.
    pub fn store(&self, path: impl AsRef<Path>) -> SchemaResult<()> {
        let path = path.as_ref();
        let yaml = self.render()?;
        std::fs::write(path, yaml).map_err(|err| SchemaError::io(path, err))?;

        debug!(path = %path.display(), "stored bootstrap document");
        Ok(())
    }

    /// The schema graph.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Mutable access to the schema graph.
    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "schema: |-\n  definition role {}\n\n  definition role_binding {}\n\n  definition workspace {}\nrelationships: |-\n  workspace:root#parent@workspace:child\n";

    #[test]
    fn test_parse_and_render_keeps_other_keys() {
        let document = SchemaDocument::parse(DOC).unwrap();
        let rendered = document.render().unwrap();

        let reparsed: Mapping = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(
            reparsed.get("relationships").and_then(Value::as_str),
            Some("workspace:root#parent@workspace:child")
        );
        assert_eq!(SchemaDocument::parse(&rendered).unwrap().schema(), document.schema());
    }

    #[test]
    fn test_render_reflects_mutation() {
        let mut document = SchemaDocument::parse(DOC).unwrap();
        document.schema_mut().register_resource_type("app", "res", &["read"]).unwrap();

        let reparsed = SchemaDocument::parse(&document.render().unwrap()).unwrap();
        assert!(reparsed.schema().get("app/res").is_some());
        assert!(reparsed.schema().has_permission("app_res_read"));
    }

    #[test]
    fn test_missing_schema_key() {
        let err = SchemaDocument::parse("relationships: \"\"\n").unwrap_err();
        assert!(matches!(err, SchemaError::MissingSchemaText));

        let err = SchemaDocument::parse("schema: 42\n").unwrap_err();
        assert!(matches!(err, SchemaError::MissingSchemaText));
    }

    #[test]
    fn test_not_a_mapping() {
        let err = SchemaDocument::parse("- a\n- b\n").unwrap_err();
        assert!(matches!(err, SchemaError::Yaml(_)));
    }

    #[test]
    fn test_schema_compile_error_surfaces() {
        let err = SchemaDocument::parse("schema: \"definition role {\"\n").unwrap_err();
        assert!(matches!(err, SchemaError::Compile(_)));
    }
}
