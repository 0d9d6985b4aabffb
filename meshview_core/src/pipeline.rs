use std::time::SystemTime;

use log::*;
use meshview_shared::exporter;
use meshview_shared::loader;
use meshview_shared::prelude::*;

pub trait PipelineCallbacks {
    fn handle_state_update(&mut self, state_message: &str);
    fn handle_loaded(&mut self, filename: &str, render_mode: RenderMode, stats: &MeshStats);
    fn handle_export(&mut self, _filename: &str, _data: &[u8]) {}
}

/// Logs every stage with the time it took
pub struct ProfilingCallbacks {
    start_time: SystemTime,
    last_time: SystemTime,
}

impl ProfilingCallbacks {
    pub fn new() -> Self {
        let time = SystemTime::now();
        ProfilingCallbacks {
            start_time: time,
            last_time: time,
        }
    }

    pub fn total_elapsed_millis(&self) -> u128 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_millis()
    }
}

impl Default for ProfilingCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineCallbacks for ProfilingCallbacks {
    fn handle_state_update(&mut self, state_message: &str) {
        let time = SystemTime::now();
        let elapsed = time.duration_since(self.last_time).unwrap_or_default();
        self.last_time = time;
        info!("{}\t{}", state_message, elapsed.as_millis());
    }

    fn handle_loaded(&mut self, filename: &str, render_mode: RenderMode, stats: &MeshStats) {
        let dims = stats.dimensions();
        info!(
            "Loaded {} ({:?}): {} vertices, {} triangles",
            filename, render_mode, stats.vertices, stats.triangles
        );
        info!(
            "Bounding box: [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
            stats.min.x, stats.min.y, stats.min.z, stats.max.x, stats.max.y, stats.max.z
        );
        let center = stats.center();
        info!("Dimensions: {:.3} x {:.3} x {:.3}", dims.x, dims.y, dims.z);
        info!("Center: [{:.3}, {:.3}, {:.3}]", center.x, center.y, center.z);
    }
}

/// Reports every stage as a bincode message on stdout
pub struct MessageCallbacks;

impl PipelineCallbacks for MessageCallbacks {
    fn handle_state_update(&mut self, state_message: &str) {
        send_message(&Message::StateUpdate(state_message.to_string()));
    }

    fn handle_loaded(&mut self, filename: &str, render_mode: RenderMode, stats: &MeshStats) {
        send_message(&Message::Loaded {
            filename: filename.to_string(),
            render_mode,
            stats: *stats,
        });
    }

    fn handle_export(&mut self, filename: &str, data: &[u8]) {
        send_message(&Message::Export {
            filename: filename.to_string(),
            data: data.to_vec(),
        });
    }
}

/// Decode a file and report what was loaded
///
/// The render mode is not used here, it is passed on to the callbacks
/// alongside the model's stats.
pub fn load_pipeline(
    data: &[u8],
    filename: &str,
    render_mode: RenderMode,
    settings: &Settings,
    callbacks: &mut impl PipelineCallbacks,
) -> Result<GeometryModel, DecodeError> {
    callbacks.handle_state_update("Checking Input");
    let format = loader::check(data, filename, settings)?;

    callbacks.handle_state_update("Decoding");
    let model = loader::decode(format, data, settings)?;

    callbacks.handle_loaded(filename, render_mode, &model.stats());

    Ok(model)
}

/// Encode a model for export
///
/// With a destination the format follows its extension and the caller
/// saves the bytes. Without one the model is encoded as binary STL named
/// after `settings.export_name` and handed to the callbacks for delivery.
pub fn export_pipeline(
    model: &GeometryModel,
    destination: Option<&str>,
    settings: &Settings,
    callbacks: &mut impl PipelineCallbacks,
) -> Result<(String, Vec<u8>), DecodeError> {
    callbacks.handle_state_update("Encoding");

    match destination {
        Some(path) => {
            let data = exporter::export(model, path, settings)?;
            debug!("Export {} is {} bytes", path, data.len());
            Ok((path.to_string(), data))
        }
        None => {
            let data = STLExporter.export(model, settings)?;
            debug!("Export {} is {} bytes", settings.export_name, data.len());
            callbacks.handle_export(&settings.export_name, &data);
            Ok((settings.export_name.clone(), data))
        }
    }
}
