use crate::error::{DecodeError, Position};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A single point or direction in model space
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    /// X Coordinate
    pub x: f32,
    /// Y Coordinate
    pub y: f32,
    /// Z Coordinate
    pub z: f32,
}

impl Vector3 {
    /// Create a vector from its three components
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }

    /// Components in x, y, z order
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(value: [f32; 3]) -> Self {
        Vector3::new(value[0], value[1], value[2])
    }
}

impl From<Vector3> for nalgebra::Vector3<f32> {
    fn from(value: Vector3) -> Self {
        nalgebra::Vector3::new(value.x, value.y, value.z)
    }
}

impl From<nalgebra::Vector3<f32>> for Vector3 {
    fn from(value: nalgebra::Vector3<f32>) -> Self {
        Vector3::new(value.x, value.y, value.z)
    }
}

/// A triangle made up of indices into the model's vertex buffer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedTriangle {
    /// Indices of the three corners
    pub verts: [usize; 3],

    /// Face normal as stored in the source file
    pub normal: Option<Vector3>,
}

/// The unified mesh every decoder produces
///
/// Built once per successful decode and never mutated afterwards. Vertex
/// indices are positions in `vertices` and stay valid for the life of the
/// model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeometryModel {
    vertices: Vec<Vector3>,
    normals: Vec<Vector3>,
    triangles: Vec<IndexedTriangle>,
}

impl GeometryModel {
    /// Build a model, checking every structural invariant
    ///
    /// `normals` must be empty or one per vertex. Every triangle must
    /// reference three distinct in-bounds vertices and there must be at
    /// least one triangle.
    pub fn new(
        vertices: Vec<Vector3>,
        normals: Vec<Vector3>,
        triangles: Vec<IndexedTriangle>,
    ) -> Result<Self, DecodeError> {
        if triangles.is_empty() {
            return Err(DecodeError::EmptyMesh);
        }

        if !normals.is_empty() && normals.len() != vertices.len() {
            return Err(DecodeError::malformed(
                Position::Triangle(0),
                format!(
                    "{} normals given for {} vertices",
                    normals.len(),
                    vertices.len()
                ),
            ));
        }

        for (index, tri) in triangles.iter().enumerate() {
            check_triangle(tri, vertices.len())
                .map_err(|reason| DecodeError::malformed(Position::Triangle(index), reason))?;
        }

        Ok(GeometryModel {
            vertices,
            normals,
            triangles,
        })
    }

    /// Vertex positions, indexed by triangle corners
    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    /// Per-vertex normals, empty when the source had none
    pub fn normals(&self) -> &[Vector3] {
        &self.normals
    }

    /// Triangles in source order
    pub fn triangles(&self) -> &[IndexedTriangle] {
        &self.triangles
    }

    /// Summary numbers for display
    pub fn stats(&self) -> MeshStats {
        let first: nalgebra::Vector3<f32> = self.vertices[0].into();

        let (min, max) = self
            .vertices
            .iter()
            .map(|v| nalgebra::Vector3::<f32>::from(*v))
            .fold((first, first), |(min, max), v| (min.inf(&v), max.sup(&v)));

        MeshStats {
            vertices: self.vertices.len(),
            triangles: self.triangles.len(),
            min: min.into(),
            max: max.into(),
        }
    }
}

fn check_triangle(tri: &IndexedTriangle, vertex_count: usize) -> Result<(), String> {
    let [a, b, c] = tri.verts;

    if let Some(out) = tri.verts.iter().find(|&&i| i >= vertex_count) {
        return Err(format!(
            "vertex index {} out of bounds for {} vertices",
            out, vertex_count
        ));
    }

    if a == b || b == c || a == c {
        return Err(format!("corners {:?} are not distinct", tri.verts));
    }

    Ok(())
}

/// Counts and bounds of a loaded model
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    /// Number of vertices
    pub vertices: usize,
    /// Number of triangles
    pub triangles: usize,
    /// Smallest corner of the bounding box
    pub min: Vector3,
    /// Largest corner of the bounding box
    pub max: Vector3,
}

impl MeshStats {
    /// Center of the bounding box
    pub fn center(&self) -> Vector3 {
        let min: nalgebra::Vector3<f32> = self.min.into();
        let max: nalgebra::Vector3<f32> = self.max.into();
        ((min + max) * 0.5).into()
    }

    /// Size of the bounding box along each axis
    pub fn dimensions(&self) -> Vector3 {
        let min: nalgebra::Vector3<f32> = self.min.into();
        let max: nalgebra::Vector3<f32> = self.max.into();
        (max - min).into()
    }
}

/// The mesh file formats that can be ingested
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    /// STL, ASCII or binary
    Stl,
    /// Wavefront OBJ
    Obj,
}

impl FormatKind {
    /// The lower case extension used for this format
    pub const fn extension(&self) -> &'static str {
        match self {
            FormatKind::Stl => "stl",
            FormatKind::Obj => "obj",
        }
    }
}

impl Display for FormatKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatKind::Stl => write!(f, "STL"),
            FormatKind::Obj => write!(f, "OBJ"),
        }
    }
}

/// How the render surface should draw the model
///
/// Not interpreted here, only carried along with the loaded model.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Filled, shaded triangles
    #[default]
    Solid,
    /// Triangle edges only
    Wireframe,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solid" => Ok(RenderMode::Solid),
            "wireframe" => Ok(RenderMode::Wireframe),
            other => Err(format!(
                "unknown render mode '{}', expected solid or wireframe",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> (Vec<Vector3>, Vec<IndexedTriangle>) {
        (
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            vec![IndexedTriangle {
                verts: [0, 1, 2],
                normal: None,
            }],
        )
    }

    #[test]
    fn rejects_empty_triangle_list() {
        let (vertices, _) = unit_triangle();
        assert_eq!(
            GeometryModel::new(vertices, vec![], vec![]),
            Err(DecodeError::EmptyMesh)
        );
    }

    #[test]
    fn rejects_out_of_bounds_index() {
        let (vertices, _) = unit_triangle();
        let tris = vec![IndexedTriangle {
            verts: [0, 1, 3],
            normal: None,
        }];
        assert!(matches!(
            GeometryModel::new(vertices, vec![], tris),
            Err(DecodeError::Malformed {
                position: Position::Triangle(0),
                ..
            })
        ));
    }

    #[test]
    fn rejects_repeated_corner() {
        let (vertices, _) = unit_triangle();
        let tris = vec![IndexedTriangle {
            verts: [0, 1, 1],
            normal: None,
        }];
        assert!(GeometryModel::new(vertices, vec![], tris).is_err());
    }

    #[test]
    fn rejects_partial_normals() {
        let (vertices, tris) = unit_triangle();
        let normals = vec![Vector3::new(0.0, 0.0, 1.0)];
        assert!(GeometryModel::new(vertices, normals, tris).is_err());
    }

    #[test]
    fn stats_bounds() {
        let (vertices, tris) = unit_triangle();
        let stats = GeometryModel::new(vertices, vec![], tris).unwrap().stats();

        assert_eq!(stats.vertices, 3);
        assert_eq!(stats.triangles, 1);
        assert_eq!(stats.min, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(stats.max, Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(stats.center(), Vector3::new(0.5, 0.5, 0.0));
        assert_eq!(stats.dimensions(), Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn render_mode_parse() {
        assert_eq!("Wireframe".parse::<RenderMode>(), Ok(RenderMode::Wireframe));
        assert_eq!("solid".parse::<RenderMode>(), Ok(RenderMode::Solid));
        assert!("points".parse::<RenderMode>().is_err());
    }
}
