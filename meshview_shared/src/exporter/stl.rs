use crate::error::{DecodeError, Position};
use crate::exporter::Exporter;
use crate::settings::Settings;
use crate::types::GeometryModel;
use log::{debug, warn};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Exporter for binary STL files
pub struct STLExporter;

impl Exporter for STLExporter {
    fn export(&self, model: &GeometryModel, settings: &Settings) -> Result<Vec<u8>, DecodeError> {
        encode(model, &settings.stl_header)
    }
}

/// Encode a model as binary STL
///
/// The header text is cut to 80 bytes and zero padded. Triangles without a
/// stored normal get the zero vector.
pub fn encode(model: &GeometryModel, header: &str) -> Result<Vec<u8>, DecodeError> {
    let triangles = model.triangles();
    let count = u32::try_from(triangles.len()).map_err(|_| {
        DecodeError::malformed(
            Position::Triangle(u32::MAX as usize),
            format!("{} triangles do not fit in a binary STL", triangles.len()),
        )
    })?;

    let records = triangles
        .iter()
        .enumerate()
        .map(|(index, tri)| {
            let position = |vert: usize| {
                model.vertices().get(vert).copied().ok_or_else(|| {
                    DecodeError::malformed(
                        Position::Triangle(index),
                        format!("vertex index {} out of bounds", vert),
                    )
                })
            };

            let [a, b, c] = tri.verts;
            Ok(stl_io::Triangle {
                normal: stl_io::Normal::new(tri.normal.unwrap_or_default().to_array()),
                vertices: [
                    stl_io::Vertex::new(position(a)?.to_array()),
                    stl_io::Vertex::new(position(b)?.to_array()),
                    stl_io::Vertex::new(position(c)?.to_array()),
                ],
            })
        })
        .collect::<Result<Vec<stl_io::Triangle>, DecodeError>>()?;

    let mut data: Vec<u8> = Vec::with_capacity(HEADER_LEN + 4 + records.len() * RECORD_LEN);
    stl_io::write_stl(&mut data, records.iter()).map_err(|err| {
        warn!("STL writer failed: {}", err);
        DecodeError::FileWriteError {
            filepath: "binary STL buffer".to_string(),
        }
    })?;

    // the writer leaves the header zeroed
    let header_bytes = header.as_bytes();
    let header_len = header_bytes.len().min(HEADER_LEN);
    data[..header_len].copy_from_slice(&header_bytes[..header_len]);

    debug!("Encoded {} triangles into {} bytes", count, data.len());

    Ok(data)
}
