use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Where in the source a malformed construct was found
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// 1-based line number in a text format
    Line(usize),
    /// Byte offset into a binary format
    Byte(usize),
    /// Index of a triangle in an already built model
    Triangle(usize),
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Line(line) => write!(f, "line {}", line),
            Position::Byte(offset) => write!(f, "byte {}", offset),
            Position::Triangle(index) => write!(f, "triangle {}", index),
        }
    }
}

/// Errors that can be raised while ingesting or exporting a mesh
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The file extension is not one of the supported formats
    UnsupportedFormat {
        /// The filename or hint that could not be routed
        filename: String,
    },

    /// The file is bigger than the configured ceiling
    Oversized {
        /// Size of the rejected input in bytes
        size: u64,
        /// The configured ceiling in bytes
        limit: u64,
    },

    /// Structural violation found while parsing
    Malformed {
        /// Where the problem was found
        position: Position,
        /// Short description of the problem
        reason: String,
    },

    /// The file parsed but holds no triangles
    EmptyMesh,

    /// The model file could not be read
    FileNotFound {
        /// Filepath of the requested file
        filepath: String,
    },

    /// The export destination could not be written
    FileWriteError {
        /// Filepath of the destination
        filepath: String,
    },

    /// The settings file could not be read
    SettingsFileNotFound {
        /// Filepath of the requested file
        filepath: String,
    },

    /// The settings file is not valid hjson
    SettingsFileMisformat {
        /// Filepath of the requested file
        filepath: String,
    },
}

impl DecodeError {
    /// Shorthand for a [`DecodeError::Malformed`]
    pub fn malformed(position: Position, reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            position,
            reason: reason.into(),
        }
    }

    ///Return the error code and pretty error message
    pub fn get_code_and_message(&self) -> (u32, String) {
        match self {
            DecodeError::UnsupportedFormat { filename } => (
                0x1000,
                format!(
                    "The file {} is not a supported format. Supported formats: .stl, .obj",
                    filename
                ),
            ),
            DecodeError::Oversized { size, limit } => (
                0x1001,
                format!(
                    "The file is {} bytes which exceeds the maximum size of {} bytes",
                    size, limit
                ),
            ),
            DecodeError::Malformed { position, reason } => (
                0x1002,
                format!("The model file is malformed at {}: {}", position, reason),
            ),
            DecodeError::EmptyMesh => (
                0x1003,
                "The model file does not contain any triangles".to_string(),
            ),
            DecodeError::FileNotFound { filepath } => (
                0x1004,
                format!("Could not load model file. Could not find file at {}", filepath),
            ),
            DecodeError::FileWriteError { filepath } => (
                0x1005,
                format!("Could not write export file at {}", filepath),
            ),
            DecodeError::SettingsFileNotFound { filepath } => (
                0x1006,
                format!("Could not load settings file. Could not find file at {}", filepath),
            ),
            DecodeError::SettingsFileMisformat { filepath } => (
                0x1007,
                format!("The settings file at {} is not valid hjson", filepath),
            ),
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (_, message) = self.get_code_and_message();
        write!(f, "{}", message)
    }
}

impl std::error::Error for DecodeError {}
