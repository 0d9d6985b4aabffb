use crate::error::DecodeError;
use crate::exporter::Exporter;
use crate::settings::Settings;
use crate::types::GeometryModel;
use log::debug;
use std::io::Write;

/// Exporter for Wavefront OBJ files
pub struct OBJExporter;

impl Exporter for OBJExporter {
    fn export(&self, model: &GeometryModel, settings: &Settings) -> Result<Vec<u8>, DecodeError> {
        let write_error = |_| DecodeError::FileWriteError {
            filepath: settings.export_name.clone(),
        };

        let mut data = Vec::new();
        let has_normals = !model.normals().is_empty();

        writeln!(data, "# Exported by meshview").map_err(write_error)?;

        for v in model.vertices() {
            writeln!(data, "v {} {} {}", v.x, v.y, v.z).map_err(write_error)?;
        }

        for n in model.normals() {
            writeln!(data, "vn {} {} {}", n.x, n.y, n.z).map_err(write_error)?;
        }

        for tri in model.triangles() {
            let [a, b, c] = tri.verts.map(|i| i + 1);
            if has_normals {
                writeln!(data, "f {a}//{a} {b}//{b} {c}//{c}").map_err(write_error)?;
            } else {
                writeln!(data, "f {a} {b} {c}").map_err(write_error)?;
            }
        }

        debug!(
            "Wrote {} vertices and {} faces as OBJ",
            model.vertices().len(),
            model.triangles().len()
        );

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Loader, OBJLoader};
    use crate::types::{IndexedTriangle, Vector3};

    #[test]
    fn writes_faces_one_based() {
        let model = GeometryModel::new(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.5, 0.0, 0.0),
                Vector3::new(0.0, 1.0, -2.0),
            ],
            vec![],
            vec![IndexedTriangle {
                verts: [0, 1, 2],
                normal: None,
            }],
        )
        .unwrap();

        let text = String::from_utf8(OBJExporter.export(&model, &Settings::default()).unwrap()).unwrap();

        assert_eq!(
            text,
            "# Exported by meshview\nv 0 0 0\nv 1.5 0 0\nv 0 1 -2\nf 1 2 3\n"
        );
    }

    #[test]
    fn normals_survive_reload() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nvn 0 0 1\nf 1//1 2//1 4//1 3//1\n";
        let settings = Settings::default();
        let model = OBJLoader.load(text.as_bytes(), &settings).unwrap();

        let exported = OBJExporter.export(&model, &settings).unwrap();
        let reloaded = OBJLoader.load(&exported, &settings).unwrap();

        assert_eq!(reloaded.vertices(), model.vertices());
        assert_eq!(reloaded.normals(), model.normals());
        assert_eq!(reloaded.triangles(), model.triangles());
    }
}
