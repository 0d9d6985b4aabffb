use crate::error::DecodeError;
use crate::types::{MeshStats, RenderMode};
use serde::{Deserialize, Serialize};

/// Messages sent over stdout when running in message mode
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Message {
    /// The pipeline moved to a new stage
    StateUpdate(String),

    /// A model finished loading
    Loaded {
        /// Name of the source file
        filename: String,
        /// Render mode requested for the model
        render_mode: RenderMode,
        /// Counts and bounds of the model
        stats: MeshStats,
    },

    /// Encoded export ready to be saved by the receiver
    Export {
        /// Suggested filename for the data
        filename: String,
        /// Encoded file contents
        data: Vec<u8>,
    },

    /// Loading or exporting failed
    Error(DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector3;

    #[test]
    fn bincode_round_trip() {
        let message = Message::Loaded {
            filename: "cube.stl".to_string(),
            render_mode: RenderMode::Wireframe,
            stats: MeshStats {
                vertices: 36,
                triangles: 12,
                min: Vector3::new(-1.0, -1.0, -1.0),
                max: Vector3::new(1.0, 1.0, 1.0),
            },
        };

        let bytes = bincode::serialize(&message).unwrap();
        let back: Message = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, message);
    }
}
