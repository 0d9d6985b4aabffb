#![deny(missing_docs)]

use crate::error::DecodeError;
use crate::settings::Settings;
use crate::types::{FormatKind, GeometryModel, IndexedTriangle, Vector3};
use log::{debug, info};

mod obj;
mod stl;

pub use obj::OBJLoader;
pub use stl::STLLoader;

/// Loader trait to define decoding a file type into a model
pub trait Loader {
    /// Decode the raw bytes of a file
    fn load(&self, data: &[u8], settings: &Settings) -> Result<GeometryModel, DecodeError>;
}

/// Pick the format from a filename or bare extension hint
///
/// Only the text after the last `.` is looked at, so `"part.STL"` and
/// `"stl"` both route to STL.
pub fn route(filename: &str) -> Result<FormatKind, DecodeError> {
    let extension = filename.rsplit('.').next().unwrap_or(filename);

    match extension.to_lowercase().as_str() {
        "stl" => Ok(FormatKind::Stl),
        "obj" => Ok(FormatKind::Obj),
        _ => Err(DecodeError::UnsupportedFormat {
            filename: filename.to_string(),
        }),
    }
}

/// Checks that run before any decoding
///
/// Rejects unsupported extensions and inputs over the size ceiling, and
/// returns the format to decode with.
pub fn check(data: &[u8], filename: &str, settings: &Settings) -> Result<FormatKind, DecodeError> {
    let format = route(filename)?;

    let size = data.len() as u64;
    if size > settings.max_file_size {
        return Err(DecodeError::Oversized {
            size,
            limit: settings.max_file_size,
        });
    }

    Ok(format)
}

/// Decode bytes already known to be in `format`
pub fn decode(format: FormatKind, data: &[u8], settings: &Settings) -> Result<GeometryModel, DecodeError> {
    debug!("Decoding {} bytes as {}", data.len(), format);

    match format {
        FormatKind::Stl => STLLoader.load(data, settings),
        FormatKind::Obj => OBJLoader.load(data, settings),
    }
}

/// Route, size check and decode a file in one step
pub fn load(data: &[u8], filename: &str, settings: &Settings) -> Result<GeometryModel, DecodeError> {
    let format = check(data, filename, settings)?;
    let model = decode(format, data, settings)?;

    info!(
        "Loaded {}: {} vertices, {} triangles",
        filename,
        model.vertices().len(),
        model.triangles().len()
    );

    Ok(model)
}

/// Accumulates vertices and triangles while a decoder runs
///
/// Normals are tracked per vertex. If no vertex ever receives one the
/// finished model has no normals, otherwise the gaps are zero vectors.
#[derive(Default)]
pub(crate) struct MeshBuilder {
    vertices: Vec<Vector3>,
    normals: Vec<Option<Vector3>>,
    triangles: Vec<IndexedTriangle>,
}

impl MeshBuilder {
    pub(crate) fn with_capacity(vertices: usize, triangles: usize) -> Self {
        MeshBuilder {
            vertices: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
        }
    }

    /// Append a vertex and return its index
    pub(crate) fn push_vertex(&mut self, position: Vector3, normal: Option<Vector3>) -> usize {
        self.vertices.push(position);
        self.normals.push(normal);
        self.vertices.len() - 1
    }

    /// Give a vertex a normal unless it already has one
    ///
    /// Returns the kept normal when it differs from `normal`.
    pub(crate) fn fill_normal(&mut self, index: usize, normal: Vector3) -> Option<Vector3> {
        let slot = self.normals.get_mut(index)?;
        let kept = *slot.get_or_insert(normal);
        (kept != normal).then_some(kept)
    }

    pub(crate) fn push_triangle(&mut self, verts: [usize; 3], normal: Option<Vector3>) {
        self.triangles.push(IndexedTriangle { verts, normal });
    }

    pub(crate) fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub(crate) fn build(self) -> Result<GeometryModel, DecodeError> {
        let normals = if self.normals.iter().any(Option::is_some) {
            self.normals
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect()
        } else {
            vec![]
        };

        GeometryModel::new(self.vertices, normals, self.triangles)
    }
}
