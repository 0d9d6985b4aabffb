pub use crate::error::*;
pub use crate::exporter::{Exporter, OBJExporter, STLExporter};
pub use crate::input::{self, load_settings};
pub use crate::loader::{Loader, OBJLoader, STLLoader};
pub use crate::messages::*;
pub use crate::settings::*;
pub use crate::types::*;
pub use crate::utils::*;
