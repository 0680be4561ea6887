//! Entity schema descriptors
//!
//! Each audited entity type is described once, up front: its table, mapped
//! columns, primary key, validation rules and audit attribute. The
//! interceptor looks schemas up by type identifier instead of inspecting
//! entity types at runtime.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuditError, AuditResult};
use crate::session::Entity;

/// Per-type audit marker consulted by the opt-in/opt-out modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditAttribute {
    #[default]
    None,
    Include,
    Ignore,
}

/// A mapped property and the column it is stored in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub property: String,

    /// Column name when it differs from the property name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl ColumnMapping {
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.property)
    }
}

/// Declarative validation rule bound to one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationRule {
    Required { property: String },
    MaxLength { property: String, max: usize },
    MinLength { property: String, min: usize },
    Range {
        property: String,
        min: f64,
        max: f64,
    },
    OneOf {
        property: String,
        values: Vec<Value>,
    },
}

impl ValidationRule {
    pub fn required(property: impl Into<String>) -> Self {
        Self::Required {
            property: property.into(),
        }
    }

    pub fn max_length(property: impl Into<String>, max: usize) -> Self {
        Self::MaxLength {
            property: property.into(),
            max,
        }
    }

    pub fn min_length(property: impl Into<String>, min: usize) -> Self {
        Self::MinLength {
            property: property.into(),
            min,
        }
    }

    pub fn range(property: impl Into<String>, min: f64, max: f64) -> Self {
        Self::Range {
            property: property.into(),
            min,
            max,
        }
    }

    pub fn one_of(property: impl Into<String>, values: Vec<Value>) -> Self {
        Self::OneOf {
            property: property.into(),
            values,
        }
    }

    /// Property the rule applies to
    pub fn property(&self) -> &str {
        match self {
            Self::Required { property }
            | Self::MaxLength { property, .. }
            | Self::MinLength { property, .. }
            | Self::Range { property, .. }
            | Self::OneOf { property, .. } => property,
        }
    }
}

/// Entity-level validation, for checks spanning several properties
pub trait EntityValidator: Send + Sync {
    /// Failure messages; empty when the entity is valid
    fn validate(&self, entity: &dyn Entity) -> Vec<String>;
}

impl<F> EntityValidator for F
where
    F: Fn(&dyn Entity) -> Vec<String> + Send + Sync,
{
    fn validate(&self, entity: &dyn Entity) -> Vec<String> {
        self(entity)
    }
}

/// Descriptor of one entity type
#[derive(Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    table: Option<String>,

    columns: Vec<ColumnMapping>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    primary_key: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rules: Vec<ValidationRule>,

    #[serde(skip)]
    validators: Vec<Arc<dyn EntityValidator>>,

    #[serde(default)]
    audit: AuditAttribute,
}

impl EntitySchema {
    /// Start describing an entity type
    pub fn builder(type_name: impl Into<String>) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            schema: EntitySchema {
                type_name: type_name.into(),
                table: None,
                columns: Vec::new(),
                primary_key: Vec::new(),
                rules: Vec::new(),
                validators: Vec::new(),
                audit: AuditAttribute::None,
            },
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Table name: the explicit mapping, else the last segment of the type name
    pub fn table_name(&self) -> &str {
        if let Some(table) = &self.table {
            return table;
        }
        self.type_name
            .rsplit(['.', ':'])
            .next()
            .unwrap_or(&self.type_name)
    }

    pub fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    /// Declared key properties, in key order
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Column name a property is stored in
    pub fn column_name_of<'a>(&'a self, property: &'a str) -> &'a str {
        self.columns
            .iter()
            .find(|c| c.property == property)
            .map(ColumnMapping::column_name)
            .unwrap_or(property)
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn validators(&self) -> impl Iterator<Item = &dyn EntityValidator> {
        self.validators.iter().map(|v| &**v)
    }

    pub fn audit_attribute(&self) -> AuditAttribute {
        self.audit
    }

    /// Attach a custom validator to an already-built schema
    pub fn add_validator(&mut self, validator: impl EntityValidator + 'static) {
        self.validators.push(Arc::new(validator));
    }

    /// Check the descriptor for internal consistency
    pub fn check(&self) -> AuditResult<()> {
        if self.type_name.trim().is_empty() {
            return Err(AuditError::Schema("Entity type name cannot be empty".into()));
        }
        if self.table_name().is_empty() {
            return Err(AuditError::Schema(format!(
                "{}: type name ends with a separator, so the table must be mapped explicitly",
                self.type_name
            )));
        }

        let mut properties = HashSet::new();
        let mut columns = HashSet::new();
        for mapping in &self.columns {
            if !properties.insert(mapping.property.as_str()) {
                return Err(AuditError::Schema(format!(
                    "{}: property '{}' is mapped twice",
                    self.type_name, mapping.property
                )));
            }
            if !columns.insert(mapping.column_name()) {
                return Err(AuditError::Schema(format!(
                    "{}: column '{}' is mapped twice",
                    self.type_name,
                    mapping.column_name()
                )));
            }
        }

        for key in &self.primary_key {
            if !properties.contains(key.as_str()) {
                return Err(AuditError::Schema(format!(
                    "{}: key property '{}' is not a mapped column",
                    self.type_name, key
                )));
            }
        }

        for rule in &self.rules {
            if !properties.contains(rule.property()) {
                return Err(AuditError::Schema(format!(
                    "{}: validation rule targets unmapped property '{}'",
                    self.type_name,
                    rule.property()
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("type_name", &self.type_name)
            .field("table", &self.table_name())
            .field("columns", &self.columns)
            .field("primary_key", &self.primary_key)
            .field("rules", &self.rules)
            .field("validators", &self.validators.len())
            .field("audit", &self.audit)
            .finish()
    }
}

/// Builder for [`EntitySchema`]
pub struct EntitySchemaBuilder {
    schema: EntitySchema,
}

impl EntitySchemaBuilder {
    /// Map the entity to an explicit table name
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.schema.table = Some(table.into());
        self
    }

    /// Map a property to a column of the same name
    pub fn column(mut self, property: impl Into<String>) -> Self {
        self.schema.columns.push(ColumnMapping {
            property: property.into(),
            column: None,
        });
        self
    }

    /// Map a property to a differently named column
    pub fn column_as(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.schema.columns.push(ColumnMapping {
            property: property.into(),
            column: Some(column.into()),
        });
        self
    }

    /// Declare the primary key properties, in key order
    pub fn key<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.primary_key = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.schema.rules.push(rule);
        self
    }

    pub fn validator(mut self, validator: impl EntityValidator + 'static) -> Self {
        self.schema.validators.push(Arc::new(validator));
        self
    }

    pub fn audit(mut self, attribute: AuditAttribute) -> Self {
        self.schema.audit = attribute;
        self
    }

    pub fn build(self) -> AuditResult<EntitySchema> {
        self.schema.check()?;
        Ok(self.schema)
    }
}

/// Schemas keyed by entity type identifier
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, EntitySchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of schemas
    pub fn from_schemas(schemas: impl IntoIterator<Item = EntitySchema>) -> AuditResult<Self> {
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Register a schema; each type may be registered once
    pub fn register(&mut self, schema: EntitySchema) -> AuditResult<()> {
        schema.check()?;

        if self.schemas.contains_key(schema.type_name()) {
            return Err(AuditError::Schema(format!(
                "Entity type '{}' is already registered",
                schema.type_name()
            )));
        }

        self.schemas.insert(schema.type_name().to_string(), schema);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&EntitySchema> {
        self.schemas.get(type_name)
    }

    /// Look up a schema, failing for unregistered types
    pub fn require(&self, type_name: &str) -> AuditResult<&EntitySchema> {
        self.get(type_name)
            .ok_or_else(|| AuditError::UnknownEntityType(type_name.to_string()))
    }

    /// Mutable access, for attaching validators after loading schemas
    pub fn get_mut(&mut self, type_name: &str) -> Option<&mut EntitySchema> {
        self.schemas.get_mut(type_name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
