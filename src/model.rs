//! Model resolution: turns declared type descriptors into data type references and collects
//! the model definitions a listing needs.
//!
//! Resolution never fails a scan. A type the resolver does not know yields `None`, and the
//! listing expander substitutes [`ModelReference::opaque`].

use crate::route::TypeDescriptor;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Data type used for anything that could not be resolved.
pub const OPAQUE_DATA_TYPE: &str = "object";

/// Resolves declared types to data type references.
pub trait ModelResolver: Send + Sync {
    /// Resolves a declared type, or `None` when the type is unknown.
    fn resolve(&self, descriptor: &TypeDescriptor) -> Option<ModelReference>;

    /// Full definition of a named model, used to embed models in group listings.
    fn model(&self, _name: &str) -> Option<Model> {
        None
    }
}

/// Reference to a data type: a primitive, an array, or a named model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReference {
    /// Primitive name (`string`, `integer`...), `array`, or the model id
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Element type for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ModelReference>>,
    /// Model id when this refers to a complex model
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ModelReference {
    pub fn primitive(data_type: impl Into<String>, format: Option<&str>) -> Self {
        Self {
            data_type: data_type.into(),
            format: format.map(str::to_string),
            items: None,
            model: None,
        }
    }

    pub fn array(items: ModelReference) -> Self {
        Self {
            data_type: "array".to_string(),
            format: None,
            items: Some(Box::new(items)),
            model: None,
        }
    }

    pub fn model(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            data_type: name.clone(),
            format: None,
            items: None,
            model: Some(name),
        }
    }

    /// Placeholder for types that could not be resolved.
    pub fn opaque() -> Self {
        Self::primitive(OPAQUE_DATA_TYPE, None)
    }

    pub fn is_opaque(&self) -> bool {
        self.data_type == OPAQUE_DATA_TYPE && self.model.is_none() && self.items.is_none()
    }

    /// Id of the model this reference points at, directly or through array items.
    pub fn model_id(&self) -> Option<&str> {
        match (&self.model, &self.items) {
            (Some(name), _) => Some(name),
            (None, Some(items)) => items.model_id(),
            (None, None) => None,
        }
    }
}

/// A complex model definition embedded in a group listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    pub properties: IndexMap<String, ModelProperty>,
}

impl Model {
    /// Ids of models referenced by this model's properties.
    pub fn referenced_models(&self) -> BTreeSet<String> {
        self.properties
            .values()
            .filter_map(|p| p.reference.model_id().map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProperty {
    #[serde(flatten)]
    pub reference: ModelReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Declared shape of a model, as carried in route manifests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    #[serde(rename = "type")]
    pub type_descriptor: TypeDescriptor,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Bool,
    Char,
    DateTime,
    Date,
    Uuid,
}

impl PrimitiveType {
    pub fn parse(type_name: &str) -> Option<Self> {
        match type_name {
            "String" | "str" | "&str" | "string" => Some(PrimitiveType::String),
            "i8" => Some(PrimitiveType::I8),
            "i16" => Some(PrimitiveType::I16),
            "i32" => Some(PrimitiveType::I32),
            "i64" => Some(PrimitiveType::I64),
            "i128" => Some(PrimitiveType::I128),
            "u8" => Some(PrimitiveType::U8),
            "u16" => Some(PrimitiveType::U16),
            "u32" => Some(PrimitiveType::U32),
            "u64" => Some(PrimitiveType::U64),
            "u128" => Some(PrimitiveType::U128),
            "f32" => Some(PrimitiveType::F32),
            "f64" => Some(PrimitiveType::F64),
            "bool" | "boolean" => Some(PrimitiveType::Bool),
            "char" => Some(PrimitiveType::Char),
            "DateTime" => Some(PrimitiveType::DateTime),
            "NaiveDate" | "Date" => Some(PrimitiveType::Date),
            "Uuid" => Some(PrimitiveType::Uuid),
            _ => None,
        }
    }

    pub fn reference(&self) -> ModelReference {
        let (data_type, format) = match self {
            PrimitiveType::String | PrimitiveType::Char => ("string", None),
            PrimitiveType::I8 | PrimitiveType::I16 | PrimitiveType::I32 => {
                ("integer", Some("int32"))
            }
            PrimitiveType::U8 | PrimitiveType::U16 | PrimitiveType::U32 => {
                ("integer", Some("int32"))
            }
            PrimitiveType::I64 | PrimitiveType::I128 => ("integer", Some("int64")),
            PrimitiveType::U64 | PrimitiveType::U128 => ("integer", Some("int64")),
            PrimitiveType::F32 => ("number", Some("float")),
            PrimitiveType::F64 => ("number", Some("double")),
            PrimitiveType::Bool => ("boolean", None),
            PrimitiveType::DateTime => ("string", Some("date-time")),
            PrimitiveType::Date => ("string", Some("date")),
            PrimitiveType::Uuid => ("string", Some("uuid")),
        };
        ModelReference::primitive(data_type, format)
    }
}

/// Default resolver: primitives, arrays, and the models registered with it.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    definitions: HashMap<String, ModelDefinition>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = (String, ModelDefinition)>,
    ) -> Self {
        Self {
            definitions: definitions.into_iter().collect(),
        }
    }

    pub fn register(mut self, name: impl Into<String>, definition: ModelDefinition) -> Self {
        self.definitions.insert(name.into(), definition);
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ModelResolver for ModelRegistry {
    fn resolve(&self, descriptor: &TypeDescriptor) -> Option<ModelReference> {
        let descriptor = descriptor.unwrap_option();

        if descriptor.is_vec {
            let inner = descriptor.generic_args.first()?;
            return self.resolve(inner).map(ModelReference::array);
        }

        if let Some(primitive) = PrimitiveType::parse(&descriptor.name) {
            return Some(primitive.reference());
        }

        if self.definitions.contains_key(&descriptor.name) {
            return Some(ModelReference::model(&descriptor.name));
        }

        debug!("Could not resolve type: {}", descriptor);
        None
    }

    fn model(&self, name: &str) -> Option<Model> {
        let definition = self.definitions.get(name)?;
        let mut properties = IndexMap::new();
        let mut required = Vec::new();

        for (property_name, property) in &definition.properties {
            let reference = self
                .resolve(&property.type_descriptor)
                .unwrap_or_else(ModelReference::opaque);
            if property.required && !property.type_descriptor.is_option {
                required.push(property_name.clone());
            }
            properties.insert(
                property_name.clone(),
                ModelProperty {
                    reference,
                    description: property.description.clone(),
                },
            );
        }

        Some(Model {
            id: name.to_string(),
            description: definition.description.clone(),
            required,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        let yaml = r#"
Pet:
  description: A pet in the store
  properties:
    id: { type: u64, required: true }
    name: { type: String, required: true }
    tags: { type: "Vec<Tag>" }
    owner: { type: Option<Person>, required: true }
Tag:
  properties:
    label: { type: String }
"#;
        let definitions: IndexMap<String, ModelDefinition> = serde_yaml::from_str(yaml).unwrap();
        ModelRegistry::from_definitions(definitions)
    }

    #[test]
    fn test_primitive_types() {
        let registry = ModelRegistry::new();
        let cases = [
            ("String", "string", None),
            ("i32", "integer", Some("int32")),
            ("u64", "integer", Some("int64")),
            ("f32", "number", Some("float")),
            ("f64", "number", Some("double")),
            ("bool", "boolean", None),
            ("Uuid", "string", Some("uuid")),
        ];
        for (name, data_type, format) in cases {
            let reference = registry.resolve(&TypeDescriptor::new(name)).unwrap();
            assert_eq!(reference.data_type, data_type, "data type for {}", name);
            assert_eq!(reference.format.as_deref(), format, "format for {}", name);
        }
    }

    #[test]
    fn test_option_is_unwrapped() {
        let reference = ModelRegistry::new()
            .resolve(&TypeDescriptor::parse("Option<i64>"))
            .unwrap();
        assert_eq!(reference.data_type, "integer");
    }

    #[test]
    fn test_vec_of_model() {
        let reference = registry().resolve(&TypeDescriptor::parse("Vec<Pet>")).unwrap();
        assert_eq!(reference.data_type, "array");
        assert_eq!(reference.items.as_ref().unwrap().model.as_deref(), Some("Pet"));
        assert_eq!(reference.model_id(), Some("Pet"));
    }

    #[test]
    fn test_unknown_type_is_unresolved() {
        assert!(registry().resolve(&TypeDescriptor::new("Mystery")).is_none());
        assert!(registry().resolve(&TypeDescriptor::parse("Vec<Mystery>")).is_none());
    }

    #[test]
    fn test_model_definition() {
        let model = registry().model("Pet").unwrap();
        assert_eq!(model.id, "Pet");
        assert_eq!(model.description.as_deref(), Some("A pet in the store"));
        assert_eq!(model.required, vec!["id".to_string(), "name".to_string()]);
        let keys: Vec<_> = model.properties.keys().cloned().collect();
        assert_eq!(keys, vec!["id", "name", "tags", "owner"]);
        // Person is not registered, so the property degrades
        assert!(model.properties["owner"].reference.is_opaque());
        assert_eq!(
            model.referenced_models().into_iter().collect::<Vec<_>>(),
            vec!["Tag".to_string()]
        );
    }

    #[test]
    fn test_opaque_placeholder() {
        let opaque = ModelReference::opaque();
        assert!(opaque.is_opaque());
        assert_eq!(opaque.data_type, "object");
        assert!(!ModelReference::model("object").is_opaque());
    }

    #[test]
    fn test_model_reference_serialization() {
        let json =
            serde_json::to_value(ModelReference::array(ModelReference::model("Pet"))).unwrap();
        assert_eq!(json["type"], "array");
        assert_eq!(json["items"]["$ref"], "Pet");
    }
}
