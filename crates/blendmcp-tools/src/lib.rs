//! Blender scene operations (tools) and read-only scene queries (resources),
//! each expressed as a generated bpy script sent through a
//! [`CommandTransport`](blendmcp_connection::CommandTransport).

mod args;
mod lighting;
mod resources;
mod tools;

use blendmcp_connection::BridgeError;
use thiserror::Error;

pub use args::{
    CameraView, CreateMaterialArgs, CreateObjectArgs, DeleteObjectArgs, ExecutePythonArgs,
    LightingPreset, ModifyObjectArgs, ObjectKind, RenderSceneArgs, SetupCameraArgs,
    SetupLightingArgs, Vec3,
};
pub use resources::{BlenderResources, ResourceKind};
pub use tools::{BlenderTools, DEFAULT_RENDER_PATH, DEFAULT_RESOLUTION, DEFAULT_SAMPLES};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("Failed to {action}: {message}")]
    Remote { action: &'static str, message: String },
}

/// Python literal for a float. `Debug` keeps a decimal point on integral
/// values, so `1.0` stays a float on the Blender side.
pub(crate) fn py_float(value: f64) -> String {
    if value.is_finite() {
        format!("{value:?}")
    } else {
        "0.0".to_string()
    }
}

pub(crate) fn py_tuple(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().copied().map(py_float).collect();
    format!("({})", items.join(", "))
}
