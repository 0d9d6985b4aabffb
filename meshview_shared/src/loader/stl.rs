use crate::error::{DecodeError, Position};
use crate::loader::{Loader, MeshBuilder};
use crate::settings::Settings;
use crate::types::{GeometryModel, Vector3};
use log::{debug, trace, warn};

const HEADER_LEN: usize = 80;
const PREAMBLE_LEN: usize = HEADER_LEN + 4;
const RECORD_LEN: usize = 50;

/// Loader for STL files, ASCII or binary
pub struct STLLoader;

impl Loader for STLLoader {
    fn load(&self, data: &[u8], _settings: &Settings) -> Result<GeometryModel, DecodeError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::EmptyMesh);
        }

        match binary_triangle_count(data) {
            Some(count) => {
                debug!("Detected binary STL with {} triangles", count);
                load_binary(data, count)
            }
            None => {
                debug!("Detected ASCII STL");
                load_ascii(data)
            }
        }
    }
}

/// The triangle count, if the length matches the binary layout exactly
fn binary_triangle_count(data: &[u8]) -> Option<usize> {
    let (count, expected) = binary_claimed_len(data)?;
    (expected == data.len() as u64).then_some(count as usize)
}

/// The declared triangle count and the file length it implies
fn binary_claimed_len(data: &[u8]) -> Option<(u32, u64)> {
    let count_bytes = data.get(HEADER_LEN..PREAMBLE_LEN)?;
    let count = u32::from_le_bytes([count_bytes[0], count_bytes[1], count_bytes[2], count_bytes[3]]);
    Some((count, u64::from(count) * RECORD_LEN as u64 + PREAMBLE_LEN as u64))
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_vector(bytes: &[u8], offset: usize) -> Vector3 {
    Vector3::new(
        read_f32(bytes, offset),
        read_f32(bytes, offset + 4),
        read_f32(bytes, offset + 8),
    )
}

fn load_binary(data: &[u8], count: usize) -> Result<GeometryModel, DecodeError> {
    if count == 0 {
        return Err(DecodeError::EmptyMesh);
    }

    let mut builder = MeshBuilder::with_capacity(count * 3, count);

    for record in data[PREAMBLE_LEN..].chunks_exact(RECORD_LEN) {
        let normal = read_vector(record, 0);

        // STL never shares vertices, each facet owns three fresh ones
        let a = builder.push_vertex(read_vector(record, 12), Some(normal));
        let b = builder.push_vertex(read_vector(record, 24), Some(normal));
        let c = builder.push_vertex(read_vector(record, 36), Some(normal));
        builder.push_triangle([a, b, c], Some(normal));
    }

    builder.build()
}

/// Why an ASCII file that is not ASCII is being rejected
///
/// Anything without a leading `solid` was most likely meant to be binary,
/// so the error talks about the binary layout instead.
fn not_ascii_error(data: &[u8]) -> DecodeError {
    match binary_claimed_len(data) {
        Some((count, expected)) => DecodeError::malformed(
            Position::Byte(data.len()),
            format!(
                "binary STL declares {} triangles which needs {} bytes, found {}",
                count,
                expected,
                data.len()
            ),
        ),
        None => DecodeError::malformed(
            Position::Byte(data.len()),
            format!(
                "file is too short for a binary STL header ({} of {} bytes) and does not start with 'solid'",
                data.len(),
                PREAMBLE_LEN
            ),
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AsciiState {
    /// Before the opening `solid`
    Start,
    /// Between facets
    Solid,
    /// After `facet normal`, waiting for `outer loop`
    Facet { normal: Vector3, line: usize },
    /// Collecting vertices
    Loop { normal: Vector3, line: usize },
    /// After `endloop`, waiting for `endfacet`
    LoopClosed { line: usize },
    /// After `endsolid`
    Closed,
}

fn parse_vector<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<Vector3, DecodeError> {
    let mut coords = [0.0f32; 3];

    for coord in coords.iter_mut() {
        let token = tokens.next().ok_or_else(|| {
            DecodeError::malformed(Position::Line(line), format!("{} needs 3 components", what))
        })?;
        *coord = token.parse::<f32>().map_err(|_| {
            DecodeError::malformed(
                Position::Line(line),
                format!("'{}' is not a valid number in {}", token, what),
            )
        })?;
    }

    if let Some(extra) = tokens.next() {
        return Err(DecodeError::malformed(
            Position::Line(line),
            format!("unexpected '{}' after {}", extra, what),
        ));
    }

    Ok(coords.into())
}

fn unexpected(keyword: &str, line: usize, state: AsciiState) -> DecodeError {
    let expected = match state {
        AsciiState::Start => "'solid'",
        AsciiState::Solid => "'facet' or 'endsolid'",
        AsciiState::Facet { .. } => "'outer loop'",
        AsciiState::Loop { .. } => "'vertex' or 'endloop'",
        AsciiState::LoopClosed { .. } => "'endfacet'",
        AsciiState::Closed => "'solid' or end of file",
    };

    DecodeError::malformed(
        Position::Line(line),
        format!("expected {} but found '{}'", expected, keyword),
    )
}

fn load_ascii(data: &[u8]) -> Result<GeometryModel, DecodeError> {
    let text = String::from_utf8_lossy(data);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut builder = MeshBuilder::default();
    let mut state = AsciiState::Start;
    let mut loop_verts: Vec<usize> = Vec::with_capacity(3);
    let mut last_line = 0;

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let mut tokens = raw_line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        last_line = line;
        let keyword = keyword.to_ascii_lowercase();

        state = match (keyword.as_str(), state) {
            ("solid", AsciiState::Start | AsciiState::Closed) => {
                trace!("Opening solid at line {}", line);
                AsciiState::Solid
            }
            (_, AsciiState::Start) => return Err(not_ascii_error(data)),
            ("facet", AsciiState::Solid) => {
                match tokens.next() {
                    Some(word) if word.eq_ignore_ascii_case("normal") => {}
                    _ => {
                        return Err(DecodeError::malformed(
                            Position::Line(line),
                            "expected 'normal' after 'facet'",
                        ))
                    }
                }
                let normal = parse_vector(tokens, line, "facet normal")?;
                AsciiState::Facet { normal, line }
            }
            ("outer", AsciiState::Facet { normal, line: facet_line }) => {
                match tokens.next() {
                    Some(word) if word.eq_ignore_ascii_case("loop") => {}
                    _ => {
                        return Err(DecodeError::malformed(
                            Position::Line(line),
                            "expected 'loop' after 'outer'",
                        ))
                    }
                }
                loop_verts.clear();
                AsciiState::Loop {
                    normal,
                    line: facet_line,
                }
            }
            ("vertex", AsciiState::Loop { normal, .. }) => {
                if loop_verts.len() == 3 {
                    return Err(DecodeError::malformed(
                        Position::Line(line),
                        "facet has more than 3 vertices",
                    ));
                }
                let position = parse_vector(tokens, line, "vertex")?;
                loop_verts.push(builder.push_vertex(position, Some(normal)));
                state
            }
            ("endloop", AsciiState::Loop { normal, line: facet_line }) => {
                let [a, b, c] = loop_verts[..] else {
                    return Err(DecodeError::malformed(
                        Position::Line(line),
                        format!("facet has {} vertices, expected 3", loop_verts.len()),
                    ));
                };
                builder.push_triangle([a, b, c], Some(normal));
                trace!("Facet {} closed", builder.triangle_count());
                AsciiState::LoopClosed { line: facet_line }
            }
            ("endfacet", AsciiState::LoopClosed { .. }) => AsciiState::Solid,
            ("endsolid", AsciiState::Solid) => AsciiState::Closed,
            (other, current) => return Err(unexpected(other, line, current)),
        };
    }

    match state {
        AsciiState::Start => Err(not_ascii_error(data)),
        AsciiState::Facet { line, .. }
        | AsciiState::Loop { line, .. }
        | AsciiState::LoopClosed { line } => Err(DecodeError::malformed(
            Position::Line(last_line),
            format!("file ends inside the facet opened at line {}", line),
        )),
        AsciiState::Solid => {
            warn!("ASCII STL is missing 'endsolid'");
            finish_ascii(builder)
        }
        AsciiState::Closed => finish_ascii(builder),
    }
}

fn finish_ascii(builder: MeshBuilder) -> Result<GeometryModel, DecodeError> {
    debug!(
        "ASCII STL held {} facets, {} vertices",
        builder.triangle_count(),
        builder.vertex_count()
    );

    if builder.triangle_count() == 0 {
        return Err(DecodeError::EmptyMesh);
    }

    builder.build()
}
