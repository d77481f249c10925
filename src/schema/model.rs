//! 3MF core model schema (`3D/*.model`).

use crate::options::XmlParserOptions;
use crate::schema::{
    SchemaError, UnusedTracker, is_schema_child, optional, optional_bool, parse_coordinate,
    parse_index, production, required,
};
use crate::xml::XmlElement;

/// Unit assumed when the model omits `unit`.
pub const DEFAULT_UNIT: &str = "millimeter";

/// A deserialized `<model>` document.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub unit: String,
    pub language: Option<String>,
    pub required_extensions: Option<String>,
    pub metadata: Vec<ModelMetadata>,
    pub objects: Vec<Object>,
    pub build: Vec<BuildItem>,
}

/// `<metadata name="...">value</metadata>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    pub name: String,
    pub value: String,
    pub preserve: Option<bool>,
    pub kind: Option<String>,
}

/// A printable resource declared under `<resources>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub id: String,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub part_number: Option<String>,
    pub uuid: Option<String>,
    pub mesh: Option<Mesh>,
    pub components: Vec<Component>,
    pub metadata: Vec<ModelMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<Triangle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
}

/// Reference from one object to another, possibly in a different model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub object_id: String,
    pub transform: Option<String>,
    pub path: Option<String>,
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildItem {
    pub object_id: String,
    pub transform: Option<String>,
    pub part_number: Option<String>,
    pub printable: Option<bool>,
    pub path: Option<String>,
    pub uuid: Option<String>,
}

impl Model {
    /// Map a parsed `<model>` tree onto the core schema.
    pub fn deserialize(root: &XmlElement, options: &XmlParserOptions) -> Result<Self, SchemaError> {
        if root.local_name() != "model" {
            return Err(SchemaError::UnexpectedRoot {
                expected: "model",
                found: root.name().to_string(),
            });
        }

        let mut unused = UnusedTracker::default();
        unused.attributes(root, &["unit", "requiredextensions", "recommendedextensions"]);

        let mut model = Model {
            unit: optional(root, "unit").unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            language: optional(root, "xml:lang"),
            required_extensions: optional(root, "requiredextensions"),
            metadata: Vec::new(),
            objects: Vec::new(),
            build: Vec::new(),
        };

        for child in root.elements() {
            if is_schema_child(root, child, "metadata") {
                model.metadata.push(ModelMetadata::deserialize(child, &mut unused)?);
            } else if is_schema_child(root, child, "resources") {
                for resource in child.elements() {
                    if is_schema_child(child, resource, "object") {
                        model.objects.push(Object::deserialize(resource, &mut unused)?);
                    } else {
                        unused.element(child, resource);
                    }
                }
                unused.attributes(child, &[]);
            } else if is_schema_child(root, child, "build") {
                unused.extended_attributes(child, &[], &["UUID"]);
                for item in child.elements() {
                    if is_schema_child(child, item, "item") {
                        model.build.push(BuildItem::deserialize(item, &mut unused)?);
                    } else {
                        unused.element(child, item);
                    }
                }
            } else {
                unused.element(root, child);
            }
        }

        unused.finish(options)?;
        Ok(model)
    }

    /// Look up a declared object by id.
    pub fn object(&self, id: &str) -> Option<&Object> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// First metadata value with the given name.
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }
}

impl ModelMetadata {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.attributes(element, &["name", "preserve", "type"]);
        Ok(Self {
            name: required(element, "name")?.to_string(),
            value: element.text(),
            preserve: optional_bool(element, "preserve")?,
            kind: optional(element, "type"),
        })
    }
}

impl Object {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.extended_attributes(
            element,
            &["id", "type", "name", "partnumber", "pid", "pindex", "thumbnail"],
            &["UUID"],
        );

        let mut object = Object {
            id: required(element, "id")?.to_string(),
            kind: optional(element, "type"),
            name: optional(element, "name"),
            part_number: optional(element, "partnumber"),
            uuid: production(element, "UUID"),
            mesh: None,
            components: Vec::new(),
            metadata: Vec::new(),
        };

        for child in element.elements() {
            if is_schema_child(element, child, "mesh") {
                object.mesh = Some(Mesh::deserialize(child, unused)?);
            } else if is_schema_child(element, child, "components") {
                for component in child.elements() {
                    if is_schema_child(child, component, "component") {
                        object
                            .components
                            .push(Component::deserialize(component, unused)?);
                    } else {
                        unused.element(child, component);
                    }
                }
            } else if is_schema_child(element, child, "metadatagroup") {
                for metadata in child.elements() {
                    if is_schema_child(child, metadata, "metadata") {
                        object
                            .metadata
                            .push(ModelMetadata::deserialize(metadata, unused)?);
                    } else {
                        unused.element(child, metadata);
                    }
                }
            } else {
                unused.element(element, child);
            }
        }

        Ok(object)
    }

    /// Number of triangles in this object's own mesh.
    pub fn triangle_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, |mesh| mesh.triangles.len())
    }
}

impl Mesh {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        let mut mesh = Mesh::default();

        for child in element.elements() {
            if is_schema_child(element, child, "vertices") {
                for vertex in child.elements() {
                    if !is_schema_child(child, vertex, "vertex") {
                        unused.element(child, vertex);
                        continue;
                    }
                    unused.attributes(vertex, &["x", "y", "z"]);
                    mesh.vertices.push([
                        parse_coordinate(vertex, "x")?,
                        parse_coordinate(vertex, "y")?,
                        parse_coordinate(vertex, "z")?,
                    ]);
                }
            } else if is_schema_child(element, child, "triangles") {
                for triangle in child.elements() {
                    if !is_schema_child(child, triangle, "triangle") {
                        unused.element(child, triangle);
                        continue;
                    }
                    unused.attributes(triangle, &["v1", "v2", "v3", "p1", "p2", "p3", "pid"]);
                    mesh.triangles.push(Triangle {
                        v1: parse_index(triangle, "v1")?,
                        v2: parse_index(triangle, "v2")?,
                        v3: parse_index(triangle, "v3")?,
                    });
                }
            } else {
                unused.element(element, child);
            }
        }

        Ok(mesh)
    }
}

impl Component {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.extended_attributes(element, &["objectid", "transform"], &["path", "UUID"]);
        Ok(Self {
            object_id: required(element, "objectid")?.to_string(),
            transform: optional(element, "transform"),
            path: production(element, "path"),
            uuid: production(element, "UUID"),
        })
    }
}

impl BuildItem {
    fn deserialize(element: &XmlElement, unused: &mut UnusedTracker) -> Result<Self, SchemaError> {
        unused.extended_attributes(
            element,
            &["objectid", "transform", "partnumber", "printable"],
            &["path", "UUID"],
        );
        Ok(Self {
            object_id: required(element, "objectid")?.to_string(),
            transform: optional(element, "transform"),
            part_number: optional(element, "partnumber"),
            printable: optional_bool(element, "printable")?,
            path: production(element, "path"),
            uuid: production(element, "UUID"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{ParseOptions, parse};

    const CUBE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <metadata name="Application">Slicer-2.7</metadata>
  <resources>
    <object id="1" type="model" name="Cube">
      <mesh>
        <vertices>
          <vertex x="0" y="0" z="0"/>
          <vertex x="10" y="0" z="0"/>
          <vertex x="0" y="10" z="0"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="1" v3="2"/>
        </triangles>
      </mesh>
    </object>
    <object id="2" type="model">
      <components>
        <component objectid="1" transform="1 0 0 0 1 0 0 0 1 5 5 0"/>
      </components>
    </object>
  </resources>
  <build>
    <item objectid="2" printable="1"/>
  </build>
</model>"#;

    fn strict_unused() -> XmlParserOptions {
        XmlParserOptions {
            assert_unused_elements: true,
            assert_unused_attributes: true,
            ..XmlParserOptions::default()
        }
    }

    #[test]
    fn test_deserialize_cube() {
        let root = parse(CUBE.as_bytes(), ParseOptions::default()).unwrap();
        let model = Model::deserialize(&root, &strict_unused()).unwrap();

        assert_eq!(model.unit, "millimeter");
        assert_eq!(model.language.as_deref(), Some("en-US"));
        assert_eq!(model.metadata_value("Application"), Some("Slicer-2.7"));
        assert_eq!(model.objects.len(), 2);

        let cube = model.object("1").unwrap();
        assert_eq!(cube.name.as_deref(), Some("Cube"));
        assert_eq!(cube.triangle_count(), 1);
        assert_eq!(cube.mesh.as_ref().unwrap().vertices[1], [10.0, 0.0, 0.0]);

        let assembly = model.object("2").unwrap();
        assert_eq!(assembly.components[0].object_id, "1");

        assert_eq!(model.build.len(), 1);
        assert_eq!(model.build[0].printable, Some(true));
    }

    #[test]
    fn test_wrong_root() {
        let root = parse(b"<config/>", ParseOptions::default()).unwrap();
        let err = Model::deserialize(&root, &XmlParserOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedRoot { expected: "model", .. }));
    }

    #[test]
    fn test_object_without_id() {
        let xml = br#"<model xmlns="urn:core"><resources><object type="model"/></resources></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();
        let err = Model::deserialize(&root, &XmlParserOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingAttribute { attribute: "id", .. }));
    }

    #[test]
    fn test_bad_vertex_coordinate() {
        let xml = br#"<model xmlns="urn:core"><resources><object id="1"><mesh><vertices>
            <vertex x="a" y="0" z="0"/></vertices></mesh></object></resources></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();
        let err = Model::deserialize(&root, &XmlParserOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidAttribute { attribute: "x", .. }));
    }

    #[test]
    fn test_bad_triangle_index() {
        let xml = br#"<model xmlns="urn:core"><resources><object id="1"><mesh><triangles>
            <triangle v1="0" v2="-1" v3="2"/></triangles></mesh></object></resources></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();
        let err = Model::deserialize(&root, &XmlParserOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidAttribute { attribute: "v2", .. }));
    }

    #[test]
    fn test_foreign_namespace_content_is_unused() {
        let xml = br#"<model xmlns="urn:core" xmlns:s="urn:slicer" s:version="1">
            <s:extra/><resources><object id="1"/></resources></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();

        assert!(Model::deserialize(&root, &XmlParserOptions::default()).is_ok());

        let err = Model::deserialize(&root, &strict_unused()).unwrap_err();
        let SchemaError::Unused(unused) = err else {
            panic!("expected unused report");
        };
        assert_eq!(unused.len(), 2);
        assert!(unused.iter().any(|u| u.contains("s:extra")));
        assert!(unused.iter().any(|u| u.contains("s:version")));
    }

    #[test]
    fn test_production_attributes_under_any_prefix() {
        let xml = br#"<model xmlns="urn:core"
            xmlns:prod="http://schemas.microsoft.com/3dmanufacturing/production/2015/06">
            <resources><object id="1" prod:UUID="obj-1"/></resources>
            <build prod:UUID="build-1">
              <item objectid="1" prod:path="/3D/Objects/a.model" prod:UUID="item-1"/>
            </build></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();
        let model = Model::deserialize(&root, &strict_unused()).unwrap();

        assert_eq!(model.object("1").unwrap().uuid.as_deref(), Some("obj-1"));
        assert_eq!(model.build[0].path.as_deref(), Some("/3D/Objects/a.model"));
        assert_eq!(model.build[0].uuid.as_deref(), Some("item-1"));
    }

    #[test]
    fn test_prefixed_id_is_not_an_object_id() {
        let xml = br#"<model xmlns="urn:core" xmlns:s="urn:slicer">
            <resources><object s:id="5"/></resources></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();
        let err = Model::deserialize(&root, &XmlParserOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingAttribute { attribute: "id", .. }));
    }

    #[test]
    fn test_uuid_outside_production_namespace_is_unused() {
        let xml = br#"<model xmlns="urn:core" xmlns:s="urn:slicer">
            <resources><object id="1" s:UUID="x"/></resources></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();

        let model = Model::deserialize(&root, &XmlParserOptions::default()).unwrap();
        assert_eq!(model.object("1").unwrap().uuid, None);

        let err = Model::deserialize(&root, &strict_unused()).unwrap_err();
        assert_eq!(err, SchemaError::Unused(vec!["<object> @s:UUID".to_string()]));
    }

    #[test]
    fn test_metadata_text_references_are_resolved() {
        let xml = br#"<model xmlns="urn:core">
            <metadata name="Title">Nuts &amp; Bolts</metadata>
            <metadata name="Designer">A &#38; B</metadata>
            <resources/></model>"#;
        let root = parse(xml, ParseOptions::default()).unwrap();
        let model = Model::deserialize(&root, &XmlParserOptions::default()).unwrap();

        assert_eq!(model.metadata_value("Title"), Some("Nuts & Bolts"));
        assert_eq!(model.metadata_value("Designer"), Some("A & B"));
    }
}
