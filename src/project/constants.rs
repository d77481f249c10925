//! Constant values for 3MF slicer projects.

use phf::phf_set;

/// Extension of 3MF model documents (`3D/3dmodel.model`, `3D/Objects/*.model`).
pub const MODEL_EXTENSION: &str = ".model";

/// Extension of 3MF project archives.
pub const PROJECT_EXTENSION: &str = ".3mf";

/// Per-object settings written by Bambu Studio / OrcaSlicer.
pub const MODEL_SETTINGS_CONFIG: &str = "Metadata/model_settings.config";

/// Per-object settings written by PrusaSlicer.
pub const SLIC3R_PE_MODEL_CONFIG: &str = "Metadata/Slic3r_PE_model.config";

/// Archive paths recognized as the project's config document.
pub static CONFIG_PATHS: phf::Set<&'static str> = phf_set! {
    "Metadata/model_settings.config",
    "Metadata/Slic3r_PE_model.config",
};

/// XML namespaces found in 3MF projects.
pub mod namespace {
    /// 3MF core specification namespace.
    pub const CORE: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";
    /// Production extension namespace (`p:UUID`, `p:path`).
    pub const PRODUCTION: &str = "http://schemas.microsoft.com/3dmanufacturing/production/2015/06";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_constants_are_recognized() {
        assert!(CONFIG_PATHS.contains(MODEL_SETTINGS_CONFIG));
        assert!(CONFIG_PATHS.contains(SLIC3R_PE_MODEL_CONFIG));
        assert_eq!(CONFIG_PATHS.len(), 2);
    }
}
