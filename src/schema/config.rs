//! Slicer project settings schema (`Metadata/*.config`).
//!
//! Covers both the per-object settings written by Bambu/Orca style slicers
//! (`model_settings.config`: objects, parts, plates, assemble items) and the
//! PrusaSlicer flavour (`Slic3r_PE_model.config`: objects and volumes).

use crate::options::XmlParserOptions;
use crate::schema::{
    SchemaError, UnusedTracker, is_schema_child, optional, optional_value, required,
};
use crate::xml::XmlElement;
use std::collections::BTreeMap;

/// A deserialized `<config>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub objects: Vec<ObjectConfig>,
    pub plates: Vec<PlateConfig>,
    pub assemble: Vec<AssembleItem>,
}

/// `<metadata type=".." key=".." value=".."/>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub kind: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub face_count: Option<u64>,
}

/// Settings attached to a model object, keyed by the model's object id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectConfig {
    pub id: String,
    pub instances_count: Option<u32>,
    pub metadata: Vec<ConfigMetadata>,
    pub parts: Vec<PartConfig>,
}

/// A `<part>` (Bambu/Orca) or `<volume>` (PrusaSlicer) of an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartConfig {
    pub id: Option<String>,
    pub subtype: Option<String>,
    pub first_id: Option<u32>,
    pub last_id: Option<u32>,
    pub metadata: Vec<ConfigMetadata>,
    /// Attributes of the `<mesh_stat>`/`<mesh>` repair statistics element.
    pub mesh_stats: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateConfig {
    pub metadata: Vec<ConfigMetadata>,
    /// Metadata of each `<model_instance>` placed on the plate.
    pub instances: Vec<Vec<ConfigMetadata>>,
}

/// `<assemble_item .../>`, kept as raw attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembleItem {
    pub attributes: BTreeMap<String, String>,
}

impl Config {
    /// Map a parsed `<config>` tree onto the settings schema.
    pub fn deserialize(root: &XmlElement, options: &XmlParserOptions) -> Result<Self, SchemaError> {
        if root.local_name() != "config" {
            return Err(SchemaError::UnexpectedRoot {
                expected: "config",
                found: root.name().to_string(),
            });
        }

        let mut unused = UnusedTracker::default();
        unused.attributes(root, &[]);

        let mut config = Config::default();
        for child in root.elements() {
            if is_schema_child(root, child, "object") {
                config.objects.push(ObjectConfig::deserialize(child, &mut unused)?);
            } else if is_schema_child(root, child, "plate") {
                config.plates.push(PlateConfig::deserialize(child, &mut unused)?);
            } else if is_schema_child(root, child, "assemble") {
                unused.attributes(child, &[]);
                for item in child.elements() {
                    if is_schema_child(child, item, "assemble_item") {
                        config.assemble.push(AssembleItem {
                            attributes: raw_attributes(item),
                        });
                    } else {
                        unused.element(child, item);
                    }
                }
            } else {
                unused.element(root, child);
            }
        }

        unused.finish(options)?;
        Ok(config)
    }

    /// Settings for the object with the given id.
    pub fn object(&self, id: &str) -> Option<&ObjectConfig> {
        self.objects.iter().find(|object| object.id == id)
    }
}

impl ConfigMetadata {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.attributes(element, &["type", "key", "value", "face_count"]);
        Ok(Self {
            kind: optional(element, "type"),
            key: optional(element, "key"),
            value: optional(element, "value"),
            face_count: optional_value(element, "face_count")?,
        })
    }
}

impl ObjectConfig {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.attributes(element, &["id", "instances_count"]);

        let mut object = ObjectConfig {
            id: required(element, "id")?.to_string(),
            instances_count: optional_value(element, "instances_count")?,
            metadata: Vec::new(),
            parts: Vec::new(),
        };

        for child in element.elements() {
            if is_schema_child(element, child, "metadata") {
                object.metadata.push(ConfigMetadata::deserialize(child, unused)?);
            } else if is_schema_child(element, child, "part")
                || is_schema_child(element, child, "volume")
            {
                object.parts.push(PartConfig::deserialize(child, unused)?);
            } else {
                unused.element(element, child);
            }
        }

        Ok(object)
    }

    /// Value of the metadata entry with the given key.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.key.as_deref() == Some(key))
            .and_then(|m| m.value.as_deref())
    }
}

impl PartConfig {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.attributes(element, &["id", "subtype", "firstid", "lastid"]);

        let mut part = PartConfig {
            id: optional(element, "id"),
            subtype: optional(element, "subtype"),
            first_id: optional_value(element, "firstid")?,
            last_id: optional_value(element, "lastid")?,
            ..PartConfig::default()
        };

        for child in element.elements() {
            if is_schema_child(element, child, "metadata") {
                part.metadata.push(ConfigMetadata::deserialize(child, unused)?);
            } else if is_schema_child(element, child, "mesh_stat")
                || is_schema_child(element, child, "mesh")
            {
                part.mesh_stats = raw_attributes(child);
            } else {
                unused.element(element, child);
            }
        }

        Ok(part)
    }
}

impl PlateConfig {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.attributes(element, &[]);

        let mut plate = PlateConfig::default();
        for child in element.elements() {
            if is_schema_child(element, child, "metadata") {
                plate.metadata.push(ConfigMetadata::deserialize(child, unused)?);
            } else if is_schema_child(element, child, "model_instance") {
                let mut instance = Vec::new();
                for metadata in child.elements() {
                    if is_schema_child(child, metadata, "metadata") {
                        instance.push(ConfigMetadata::deserialize(metadata, unused)?);
                    } else {
                        unused.element(child, metadata);
                    }
                }
                plate.instances.push(instance);
            } else {
                unused.element(element, child);
            }
        }

        Ok(plate)
    }
}

fn raw_attributes(element: &XmlElement) -> BTreeMap<String, String> {
    element
        .attributes()
        .iter()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect()
}
