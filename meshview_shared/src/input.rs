use log::debug;

use crate::error::DecodeError;
use crate::settings::{PartialSettings, Settings};

/// Read a model file from disk
///
/// The size is checked against the settings before the contents are read.
pub fn read_model_file(filepath: &str, settings: &Settings) -> Result<Vec<u8>, DecodeError> {
    let not_found = |_| DecodeError::FileNotFound {
        filepath: filepath.to_string(),
    };

    let size = std::fs::metadata(filepath).map_err(not_found)?.len();
    if size > settings.max_file_size {
        return Err(DecodeError::Oversized {
            size,
            limit: settings.max_file_size,
        });
    }

    debug!("Reading {} bytes from {}", size, filepath);

    std::fs::read(filepath).map_err(not_found)
}

/// Get the contents from a file or convert error
pub fn load_settings_json(filepath: &str) -> Result<String, DecodeError> {
    std::fs::read_to_string(filepath).map_err(|_| DecodeError::SettingsFileNotFound {
        filepath: filepath.to_string(),
    })
}

/// Load settings from hjson text, filling anything missing with defaults
pub fn load_settings(filepath: Option<&str>, settings_data: &str) -> Result<Settings, DecodeError> {
    let partial_settings: PartialSettings =
        deser_hjson::from_str(settings_data).map_err(|_| DecodeError::SettingsFileMisformat {
            filepath: filepath.unwrap_or("Command Line Argument").to_string(),
        })?;

    let settings = partial_settings.get_settings();

    if let Ok(json) = serde_json::to_string(&settings) {
        debug!("Using Settings {}", json);
    }

    Ok(settings)
}
