//! In-memory project archives for tests.

use crate::project::constants::namespace;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A model document declaring one mesh object per id. Ends with `</model>`.
pub(crate) fn model_xml(ids: &[&str]) -> Vec<u8> {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="{}">
 <resources>
"#,
        namespace::CORE
    );
    for id in ids {
        xml.push_str(&format!(
            r#"  <object id="{id}" type="model">
   <mesh>
    <vertices>
     <vertex x="0" y="0" z="0"/>
     <vertex x="1" y="0" z="0"/>
     <vertex x="0" y="1" z="0"/>
    </vertices>
    <triangles>
     <triangle v1="0" v2="1" v3="2"/>
    </triangles>
   </mesh>
  </object>
"#
        ));
    }
    xml.push_str(" </resources>\n <build>\n");
    for id in ids {
        xml.push_str(&format!("  <item objectid=\"{id}\"/>\n"));
    }
    xml.push_str(" </build>\n</model>");
    xml.into_bytes()
}

/// A `model_settings.config` document with one named object per id.
pub(crate) fn config_xml(ids: &[&str]) -> Vec<u8> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<config>\n");
    for id in ids {
        xml.push_str(&format!(
            "  <object id=\"{id}\">\n    <metadata key=\"name\" value=\"Object {id}\"/>\n  </object>\n"
        ));
    }
    xml.push_str("</config>\n");
    xml.into_bytes()
}

/// Zip the given entries, in order.
pub(crate) fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip_data = Vec::new();
    {
        let cursor = Cursor::new(&mut zip_data);
        let mut writer = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default();

        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }

        writer.finish().unwrap();
    }
    zip_data
}

/// Read every entry of an archive, in central directory order.
pub(crate) fn entries(zip_data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(zip_data)).unwrap();
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let mut content = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut content).unwrap();
        entries.push((file.name().to_string(), content));
    }
    entries
}

/// A small but complete project: content types, relationships, a thumbnail,
/// one model with objects `1` and `2`, and a config.
pub(crate) fn sample_project() -> Vec<u8> {
    let model = model_xml(&["1", "2"]);
    let config = config_xml(&["1", "2"]);
    archive(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", RELS.as_bytes()),
        ("3D/3dmodel.model", model.as_slice()),
        ("Metadata/plate_1.png", &PNG_HEADER[..]),
        ("Metadata/model_settings.config", config.as_slice()),
    ])
}

pub(crate) const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
 <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
 <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
 <Default Extension="png" ContentType="image/png"/>
</Types>"#;

pub(crate) const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
 <Relationship Target="/3D/3dmodel.model" Id="rel-1" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

pub(crate) const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
