use serde::{Deserialize, Serialize};

/// 50 MiB, the largest file the upload path accepts
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Which faces of a multi-object OBJ file end up in the model
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjGroupPolicy {
    /// Every face in the file, regardless of `o`/`g` sections
    #[default]
    MergeAll,
    /// Only the faces of the first section that has any
    FirstObject,
}

/// A complete settings file with all values filled in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Largest input accepted, in bytes
    pub max_file_size: u64,

    /// Handling of `o`/`g` sections in OBJ files
    pub obj_groups: ObjGroupPolicy,

    /// Filename handed to the export collaborator
    pub export_name: String,

    /// Text written into the 80 byte binary STL header
    pub stl_header: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            obj_groups: ObjGroupPolicy::MergeAll,
            export_name: "model.stl".to_string(),
            stl_header: "Binary STL exported by meshview".to_string(),
        }
    }
}

/// The same as settings but every field is optional
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialSettings {
    /// Largest input accepted, in bytes
    pub max_file_size: Option<u64>,

    /// Handling of `o`/`g` sections in OBJ files
    pub obj_groups: Option<ObjGroupPolicy>,

    /// Filename handed to the export collaborator
    pub export_name: Option<String>,

    /// Text written into the 80 byte binary STL header
    pub stl_header: Option<String>,
}

impl PartialSettings {
    /// Fill every unset value from the defaults
    pub fn get_settings(self) -> Settings {
        let default = Settings::default();

        Settings {
            max_file_size: self.max_file_size.unwrap_or(default.max_file_size),
            obj_groups: self.obj_groups.unwrap_or(default.obj_groups),
            export_name: self.export_name.unwrap_or(default.export_name),
            stl_header: self.stl_header.unwrap_or(default.stl_header),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_partial_is_default() {
        assert_eq!(PartialSettings::default().get_settings(), Settings::default());
    }

    #[test]
    fn hjson_overrides() {
        let partial: PartialSettings = deser_hjson::from_str(
            "{\n  max_file_size: 1024\n  obj_groups: \"FirstObject\"\n}",
        )
        .unwrap();
        let settings = partial.get_settings();

        assert_eq!(settings.max_file_size, 1024);
        assert_eq!(settings.obj_groups, ObjGroupPolicy::FirstObject);
        assert_eq!(settings.export_name, "model.stl");
    }
}
