//! Script-side helpers shared by every blendmcp crate: building Blender
//! Python scripts, cleaning up Blender errors, normalizing values, and
//! reading the literal payloads scripts print back.

mod builder;
mod format;
pub mod pylit;
mod values;

pub use builder::ScriptBuilder;
pub use format::{create_safe_blender_script, dedent, format_blender_error};
pub use pylit::{PyLiteralError, RESULT_MARKER, parse_literal, parse_result, quote};
pub use values::{
    DEFAULT_COLOR, clamp_value, degrees_to_radians, normalize_color, radians_to_degrees,
    validate_blender_object_name,
};
