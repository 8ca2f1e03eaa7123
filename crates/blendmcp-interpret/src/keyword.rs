use crate::{Interpretation, Interpreter, STATUS_SUCCESS, ensure_bpy_import};
use anyhow::Result;
use blendmcp_script::{dedent, quote};
use tracing::info;

const DELETE_ALL: &str = "import bpy
if bpy.context.object and bpy.context.object.mode == 'EDIT':
    bpy.ops.object.mode_set(mode='OBJECT')
bpy.ops.object.select_all(action='SELECT')
bpy.ops.object.delete()
print('Deleted all objects.')
";

/// Offline interpreter that recognises a handful of keywords. Anything it
/// does not recognise still yields a script echoing the command.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordInterpreter;

impl Interpreter for KeywordInterpreter {
    fn interpret(&self, command: &str) -> Result<Interpretation> {
        info!("interpreting with keywords: {command}");
        let lower = command.to_lowercase();

        let mut review = format!("Interpreting command: '{command}'. (Placeholder LLM response)");
        let mut script = format!(
            "# Placeholder script - LLM would generate this\nprint(\"Command received: \" + repr({}))\n",
            quote(command)
        );

        if lower.contains("cube") {
            script.push_str("bpy.ops.mesh.primitive_cube_add()\n");
            review.push_str("\nAction: Will attempt to create a cube.");
        } else if lower.contains("sphere") {
            script.push_str("bpy.ops.mesh.primitive_uv_sphere_add()\n");
            review.push_str("\nAction: Will attempt to create a sphere.");
        } else if lower.contains("cylinder") {
            script.push_str("bpy.ops.mesh.primitive_cylinder_add()\n");
            review.push_str("\nAction: Will attempt to create a cylinder.");
            if lower.contains("red") {
                review.push_str(" (Color 'red' noted, but placeholder cannot apply color yet).");
            } else if lower.contains("blue") {
                review.push_str(" (Color 'blue' noted, but placeholder cannot apply color yet).");
            }
        } else if lower.contains("delete all") {
            script.push_str(DELETE_ALL);
            review.push_str("\nAction: Will attempt to delete all objects.");
        } else {
            review.push_str(
                "\nAction: Could not determine a specific action from the command (using placeholder).",
            );
        }

        Ok(Interpretation {
            status: STATUS_SUCCESS.to_string(),
            review,
            generated_code: dedent(&ensure_bpy_import(script)),
        })
    }
}
