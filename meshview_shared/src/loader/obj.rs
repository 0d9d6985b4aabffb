use crate::error::{DecodeError, Position};
use crate::loader::{Loader, MeshBuilder};
use crate::settings::{ObjGroupPolicy, Settings};
use crate::types::{GeometryModel, Vector3};
use itertools::Itertools;
use log::{debug, trace, warn};
use std::collections::HashMap;

/// Loader for Wavefront OBJ files
///
/// Only geometry is read: `v`, `vn` and `f`, plus `o`/`g` to tell
/// sections apart. Faces are fan triangulated from their first corner.
pub struct OBJLoader;

impl Loader for OBJLoader {
    fn load(&self, data: &[u8], settings: &Settings) -> Result<GeometryModel, DecodeError> {
        let text = String::from_utf8_lossy(data);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        let mut state = ObjState::new(settings.obj_groups);

        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;
            let content = match raw_line.split_once('#') {
                Some((before, _comment)) => before,
                None => raw_line,
            };

            let mut tokens = content.split_whitespace();
            let Some(directive) = tokens.next() else {
                continue;
            };

            match directive {
                "v" => {
                    let position = parse_position(tokens, line)?;
                    state.positions.push(position);
                }
                "vn" => {
                    let normal = parse_normal(tokens, line)?;
                    state.normals.push(normal);
                }
                "f" => state.face(tokens, line)?,
                "o" | "g" => state.start_section(line),
                other => trace!("Skipping '{}' at line {}", other, line),
            }
        }

        state.finish()
    }
}

/// A face corner after index resolution, both 0-based into the raw pools
struct Corner {
    position: usize,
    normal: Option<usize>,
}

struct ObjState {
    policy: ObjGroupPolicy,

    positions: Vec<Vector3>,
    normals: Vec<Vector3>,

    /// Raw position index to model vertex index
    materialized: HashMap<usize, usize>,
    builder: MeshBuilder,

    section: usize,
    section_has_faces: bool,
    kept_section: Option<usize>,
    skipped_faces: usize,
    normal_conflicts: usize,
}

impl ObjState {
    fn new(policy: ObjGroupPolicy) -> Self {
        ObjState {
            policy,
            positions: vec![],
            normals: vec![],
            materialized: HashMap::new(),
            builder: MeshBuilder::default(),
            section: 0,
            section_has_faces: false,
            kept_section: None,
            skipped_faces: 0,
            normal_conflicts: 0,
        }
    }

    fn start_section(&mut self, line: usize) {
        // an `o` followed straight by a `g` names one section, not two
        if self.section_has_faces {
            self.section += 1;
            self.section_has_faces = false;
            trace!("Section {} starts at line {}", self.section, line);
        }
    }

    fn face<'a>(
        &mut self,
        tokens: impl Iterator<Item = &'a str>,
        line: usize,
    ) -> Result<(), DecodeError> {
        let corners = tokens
            .map(|token| self.resolve_corner(token, line))
            .collect::<Result<Vec<Corner>, DecodeError>>()?;

        if corners.len() < 3 {
            return Err(DecodeError::malformed(
                Position::Line(line),
                format!("face has {} vertices, needs at least 3", corners.len()),
            ));
        }

        if let Some(repeated) = corners.iter().map(|c| c.position).duplicates().next() {
            return Err(DecodeError::malformed(
                Position::Line(line),
                format!("face uses vertex {} more than once", repeated + 1),
            ));
        }

        self.section_has_faces = true;

        if self.policy == ObjGroupPolicy::FirstObject {
            match self.kept_section {
                None => self.kept_section = Some(self.section),
                Some(kept) if kept != self.section => {
                    self.skipped_faces += 1;
                    return Ok(());
                }
                Some(_) => {}
            }
        }

        let verts: Vec<usize> = corners
            .iter()
            .map(|corner| self.materialize(corner, line))
            .collect();

        for (&b, &c) in verts[1..].iter().tuple_windows() {
            self.builder.push_triangle([verts[0], b, c], None);
        }

        Ok(())
    }

    /// Model index for a corner, adding the vertex on first use
    fn materialize(&mut self, corner: &Corner, line: usize) -> usize {
        let normal = corner.normal.map(|n| self.normals[n]);

        match self.materialized.get(&corner.position) {
            Some(&index) => {
                let conflict = normal.and_then(|normal| self.builder.fill_normal(index, normal));
                if let Some(kept) = conflict {
                    self.normal_conflicts += 1;
                    warn!(
                        "Vertex {} gets a different normal at line {}, keeping ({}, {}, {})",
                        corner.position + 1,
                        line,
                        kept.x,
                        kept.y,
                        kept.z
                    );
                }
                index
            }
            None => {
                let index = self
                    .builder
                    .push_vertex(self.positions[corner.position], normal);
                self.materialized.insert(corner.position, index);
                index
            }
        }
    }

    fn resolve_corner(&self, token: &str, line: usize) -> Result<Corner, DecodeError> {
        let mut parts = token.split('/');

        let position = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                DecodeError::malformed(
                    Position::Line(line),
                    format!("face corner '{}' has no vertex index", token),
                )
            })
            .and_then(|p| resolve_index(p, self.positions.len(), line, "vertex"))?;

        // texture coordinates are not read
        let _texture = parts.next();

        let normal = match parts.next() {
            Some(n) if !n.is_empty() => Some(resolve_index(n, self.normals.len(), line, "normal")?),
            _ => None,
        };

        Ok(Corner { position, normal })
    }

    fn finish(self) -> Result<GeometryModel, DecodeError> {
        debug!(
            "OBJ pools: {} positions, {} normals, {} referenced",
            self.positions.len(),
            self.normals.len(),
            self.builder.vertex_count()
        );

        if self.skipped_faces > 0 {
            debug!(
                "Skipped {} faces outside the first object",
                self.skipped_faces
            );
        }

        if self.builder.triangle_count() == 0 {
            return Err(DecodeError::EmptyMesh);
        }

        if self.policy == ObjGroupPolicy::MergeAll
            && self.builder.vertex_count() < self.positions.len()
        {
            warn!(
                "{} vertices are not used by any face",
                self.positions.len() - self.builder.vertex_count()
            );
        }

        self.builder.build()
    }
}

/// Turn a 1-based or negative OBJ index into a 0-based pool index
fn resolve_index(token: &str, pool_len: usize, line: usize, what: &str) -> Result<usize, DecodeError> {
    let raw: i64 = token.parse().map_err(|_| {
        DecodeError::malformed(
            Position::Line(line),
            format!("'{}' is not a valid {} index", token, what),
        )
    })?;

    let resolved = match raw {
        0 => None,
        r if r > 0 => usize::try_from(r - 1).ok(),
        r => usize::try_from(pool_len as i64 + r).ok(),
    };

    resolved.filter(|&i| i < pool_len).ok_or_else(|| {
        DecodeError::malformed(
            Position::Line(line),
            format!(
                "{} index {} is out of range ({} defined so far)",
                what, raw, pool_len
            ),
        )
    })
}

fn parse_float(token: &str, line: usize, what: &str) -> Result<f32, DecodeError> {
    token.parse::<f32>().map_err(|_| {
        DecodeError::malformed(
            Position::Line(line),
            format!("'{}' is not a valid number in {}", token, what),
        )
    })
}

/// `v x y z`, ignoring a trailing `w` or vertex colour
fn parse_position<'a>(
    tokens: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vector3, DecodeError> {
    let coords = tokens
        .take(3)
        .map(|t| parse_float(t, line, "vertex"))
        .collect::<Result<Vec<f32>, DecodeError>>()?;

    match coords[..] {
        [x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(DecodeError::malformed(
            Position::Line(line),
            "vertex needs 3 components",
        )),
    }
}

fn parse_normal<'a>(
    tokens: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vector3, DecodeError> {
    let coords = tokens
        .map(|t| parse_float(t, line, "normal"))
        .collect::<Result<Vec<f32>, DecodeError>>()?;

    match coords[..] {
        [x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(DecodeError::malformed(
            Position::Line(line),
            format!("normal needs 3 components, found {}", coords.len()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Result<GeometryModel, DecodeError> {
        OBJLoader.load(text.as_bytes(), &Settings::default())
    }

    const QUAD: &str = "# a unit square
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn quad_fan_triangulates() {
        let model = decode(QUAD).unwrap();

        let tris: Vec<[usize; 3]> = model.triangles().iter().map(|t| t.verts).collect();
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(model.vertices().len(), 4);
        assert!(model.normals().is_empty());
    }

    #[test]
    fn pentagon_fan() {
        let text = "v 0 0 0\nv 1 0 0\nv 2 1 0\nv 1 2 0\nv 0 1 0\nf 1 2 3 4 5\n";
        let tris: Vec<[usize; 3]> = decode(text)
            .unwrap()
            .triangles()
            .iter()
            .map(|t| t.verts)
            .collect();
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn shared_vertices_are_reused() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";
        let model = decode(text).unwrap();

        assert_eq!(model.vertices().len(), 4);
        assert_eq!(model.triangles()[1].verts, [0, 2, 3]);
    }

    #[test]
    fn only_referenced_vertices_are_kept() {
        let text = "v 9 9 9\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 4 3 2\n";
        let model = decode(text).unwrap();

        assert_eq!(model.vertices().len(), 3);
        assert_eq!(model.vertices()[0], Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(model.triangles()[0].verts, [0, 1, 2]);
    }

    #[test]
    fn negative_indices_resolve_against_current_pool() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nv 5 5 5\nf -4 -2 -1\n";
        let model = decode(text).unwrap();

        assert_eq!(model.vertices().len(), 4);
        assert_eq!(model.triangles()[1].verts, [0, 2, 3]);
        assert_eq!(model.vertices()[3], Vector3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn slash_forms_keep_normals() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2//1 3/1\n";
        let model = decode(text).unwrap();

        let up = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(model.normals(), &[up, up, Vector3::default()]);
        assert_eq!(model.triangles()[0].normal, None);
    }

    #[test]
    fn zero_index_is_malformed() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n";
        assert!(matches!(
            decode(text),
            Err(DecodeError::Malformed {
                position: Position::Line(4),
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n";
        assert_eq!(
            decode(text),
            Err(DecodeError::malformed(
                Position::Line(4),
                "vertex index 4 is out of range (3 defined so far)"
            ))
        );
    }

    #[test]
    fn forward_reference_is_malformed() {
        let text = "v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\n";
        assert!(decode(text).is_err());
    }

    #[test]
    fn bad_number_is_malformed() {
        let text = "v 0 0 0\nv 1 x 0\n";
        assert_eq!(
            decode(text),
            Err(DecodeError::malformed(
                Position::Line(2),
                "'x' is not a valid number in vertex"
            ))
        );
    }

    #[test]
    fn short_face_is_malformed() {
        assert!(decode("v 0 0 0\nv 1 0 0\nf 1 2\n").is_err());
    }

    #[test]
    fn repeated_corner_is_malformed() {
        assert!(decode("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 -3\n").is_err());
    }

    #[test]
    fn no_faces_is_empty() {
        assert_eq!(decode("v 0 0 0\nv 1 0 0\nv 0 1 0\n"), Err(DecodeError::EmptyMesh));
        assert_eq!(decode(""), Err(DecodeError::EmptyMesh));
    }

    #[test]
    fn trailing_comment_and_unknown_directives() {
        let text = "mtllib cube.mtl\nv 0 0 0 # origin\nv 1 0 0\nv 0 1 0 1.0\nusemtl red\ns off\nf 1 2 3 # only face\n";
        assert_eq!(decode(text).unwrap().triangles().len(), 1);
    }

    const TWO_OBJECTS: &str = "o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
g body
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
f 4 6 1
";

    #[test]
    fn objects_merge_by_default() {
        let model = decode(TWO_OBJECTS).unwrap();
        assert_eq!(model.triangles().len(), 3);
        assert_eq!(model.vertices().len(), 6);
    }

    #[test]
    fn first_object_policy_keeps_first_section() {
        let settings = Settings {
            obj_groups: ObjGroupPolicy::FirstObject,
            ..Settings::default()
        };
        let model = OBJLoader.load(TWO_OBJECTS.as_bytes(), &settings).unwrap();

        assert_eq!(model.triangles().len(), 1);
        assert_eq!(model.vertices().len(), 3);
    }

    #[test]
    fn first_object_policy_skips_faceless_sections() {
        let text = "o empty\nv 0 0 0\nv 1 0 0\nv 0 1 0\no real\nf 1 2 3\no later\nf 3 2 1\n";
        let settings = Settings {
            obj_groups: ObjGroupPolicy::FirstObject,
            ..Settings::default()
        };
        let model = OBJLoader.load(text.as_bytes(), &settings).unwrap();

        assert_eq!(model.triangles().len(), 1);
        assert_eq!(model.triangles()[0].verts, [0, 1, 2]);
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let text = "\u{feff}v 9 9 9\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 2 3 4\n";
        let model = decode(text).unwrap();

        assert_eq!(model.vertices()[0], Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(model.vertices()[2], Vector3::new(1.0, 0.0, 0.0));
    }

    const CONFLICTING_NORMALS: &str = "v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
vn 0 0 1
vn 0 0 -1
f 1//1 2//1 3//1
f 2//2 4//2 3//2
";

    #[test]
    fn conflicting_normals_keep_the_first() {
        let model = decode(CONFLICTING_NORMALS).unwrap();

        let up = Vector3::new(0.0, 0.0, 1.0);
        let down = Vector3::new(0.0, 0.0, -1.0);
        assert_eq!(model.normals(), &[up, up, up, down]);
    }

    #[test]
    fn conflicting_normals_are_counted() {
        let mut state = ObjState::new(ObjGroupPolicy::MergeAll);
        for (index, line) in CONFLICTING_NORMALS.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => state.positions.push(parse_position(tokens, index + 1).unwrap()),
                Some("vn") => state.normals.push(parse_normal(tokens, index + 1).unwrap()),
                Some("f") => state.face(tokens, index + 1).unwrap(),
                _ => {}
            }
        }

        // vertices 2 and 3 are both seen again with the second normal
        assert_eq!(state.normal_conflicts, 2);
    }

    #[test]
    fn negative_normal_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 1 0 0\nvn 0 0 1\nf 1//-1 2//-1 3//-2\n";
        let model = decode(text).unwrap();

        let up = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(model.normals(), &[up, up, Vector3::new(1.0, 0.0, 0.0)]);
    }

    #[test]
    fn out_of_range_normal_index_is_malformed() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//2 3//1\n";
        assert_eq!(
            decode(text),
            Err(DecodeError::malformed(
                Position::Line(5),
                "normal index 2 is out of range (1 defined so far)"
            ))
        );
    }
}
