#![deny(missing_docs)]

use crate::error::DecodeError;
use crate::loader::route;
use crate::settings::Settings;
use crate::types::{FormatKind, GeometryModel};
use log::debug;
use std::path::Path;

mod obj;
mod stl;

pub use obj::OBJExporter;
pub use stl::{encode, STLExporter};

/// Exporter trait to define writing a model out as a file type
pub trait Exporter {
    /// Encode the whole model, returning nothing on failure
    fn export(&self, model: &GeometryModel, settings: &Settings) -> Result<Vec<u8>, DecodeError>;
}

/// Encode a model in the format picked by the destination's extension
pub fn export(
    model: &GeometryModel,
    destination: &str,
    settings: &Settings,
) -> Result<Vec<u8>, DecodeError> {
    match route(destination)? {
        FormatKind::Stl => STLExporter.export(model, settings),
        FormatKind::Obj => OBJExporter.export(model, settings),
    }
}

/// Write an encoded export to disk
///
/// The bytes go to a sibling `.part` file first and are renamed into place,
/// so the destination is either the complete export or untouched.
pub fn save(destination: &str, data: &[u8]) -> Result<(), DecodeError> {
    let write_error = |_| DecodeError::FileWriteError {
        filepath: destination.to_string(),
    };

    let path = Path::new(destination);
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");

    if let Err(err) = std::fs::write(&partial, data) {
        // best effort, the write already failed
        let _ = std::fs::remove_file(&partial);
        return Err(write_error(err));
    }

    if let Err(err) = std::fs::rename(&partial, path) {
        let _ = std::fs::remove_file(&partial);
        return Err(write_error(err));
    }

    debug!("Saved {} bytes to {}", data.len(), destination);
    Ok(())
}

/// Filename for a model converted from `source` into `format`
///
/// `bracket.obj` converted to STL becomes `bracket_converted.stl`.
pub fn converted_name(source: &str, format: FormatKind) -> String {
    let base = match source.rsplit_once('.') {
        Some((base, _extension)) if !base.is_empty() => base,
        _ => source,
    };

    format!("{}_converted.{}", base, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_names() {
        assert_eq!(converted_name("bracket.obj", FormatKind::Stl), "bracket_converted.stl");
        assert_eq!(converted_name("a.b.STL", FormatKind::Obj), "a.b_converted.obj");
        assert_eq!(converted_name("noext", FormatKind::Stl), "noext_converted.stl");
    }

    #[test]
    fn save_replaces_destination() {
        let path = std::env::temp_dir().join("meshview_save_test.stl");
        let destination = path.to_str().unwrap();
        std::fs::write(&path, b"old").unwrap();

        save(destination, b"new contents").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new contents");
        assert!(!Path::new(&format!("{}.part", destination)).exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn save_into_missing_directory_fails_cleanly() {
        let destination = "/nonexistent/dir/model.stl";
        assert_eq!(
            save(destination, b"data"),
            Err(DecodeError::FileWriteError {
                filepath: destination.to_string()
            })
        );
    }

    #[test]
    fn export_routes_on_destination() {
        use crate::types::{IndexedTriangle, Vector3};

        let model = GeometryModel::new(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            vec![],
            vec![IndexedTriangle {
                verts: [0, 1, 2],
                normal: None,
            }],
        )
        .unwrap();
        let settings = Settings::default();

        assert_eq!(export(&model, "out.stl", &settings).unwrap().len(), 134);
        assert!(export(&model, "out.obj", &settings)
            .unwrap()
            .starts_with(b"# Exported by meshview"));
        assert!(matches!(
            export(&model, "out.ply", &settings),
            Err(DecodeError::UnsupportedFormat { .. })
        ));
    }
}
