use blendmcp_tools::ResourceKind;
use serde_json::{Value, json};

pub const TOOL_NAMES: [&str; 8] = [
    "create_object",
    "delete_object",
    "modify_object",
    "create_material",
    "setup_lighting",
    "setup_camera",
    "execute_python",
    "render_scene",
];

fn vec3(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "number"},
        "minItems": 3,
        "maxItems": 3,
        "description": description,
    })
}

fn vec3_with_default(description: &str, default: [f64; 3]) -> Value {
    let mut schema = vec3(description);
    schema["default"] = json!(default);
    schema
}

/// Tool definitions as returned by `tools/list`.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "create_object",
            "description": "Create a 3D object in Blender",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "object_type": {
                        "type": "string",
                        "enum": ["cube", "sphere", "cylinder", "cone", "plane", "monkey"],
                        "description": "Type of object to create",
                    },
                    "location": vec3_with_default("Location coordinates [x, y, z]", [0.0, 0.0, 0.0]),
                    "scale": vec3_with_default("Scale factors [x, y, z]", [1.0, 1.0, 1.0]),
                    "rotation": vec3_with_default("Rotation angles in radians [x, y, z]", [0.0, 0.0, 0.0]),
                },
                "required": ["object_type"],
            },
        }),
        json!({
            "name": "delete_object",
            "description": "Delete an object from the Blender scene",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "object_name": {"type": "string", "description": "Name of the object to delete"},
                },
                "required": ["object_name"],
            },
        }),
        json!({
            "name": "modify_object",
            "description": "Modify properties of an existing object",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "object_name": {"type": "string", "description": "Name of the object to modify"},
                    "location": vec3("New location coordinates [x, y, z]"),
                    "scale": vec3("New scale factors [x, y, z]"),
                    "rotation": vec3("New rotation angles in radians [x, y, z]"),
                },
                "required": ["object_name"],
            },
        }),
        json!({
            "name": "create_material",
            "description": "Create and apply a material to an object",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "object_name": {"type": "string", "description": "Name of the object to apply material to"},
                    "material_name": {"type": "string", "description": "Name for the new material"},
                    "color": {
                        "type": "array",
                        "items": {"type": "number", "minimum": 0},
                        "minItems": 3,
                        "maxItems": 4,
                        "description": "RGB or RGBA color, either 0-1 floats or 0-255 values",
                        "default": [0.8, 0.8, 0.8, 1.0],
                    },
                    "metallic": {"type": "number", "minimum": 0, "maximum": 1, "description": "Metallic factor", "default": 0.0},
                    "roughness": {"type": "number", "minimum": 0, "maximum": 1, "description": "Roughness factor", "default": 0.5},
                },
                "required": ["object_name", "material_name"],
            },
        }),
        json!({
            "name": "setup_lighting",
            "description": "Set up lighting in the scene",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "lighting_type": {
                        "type": "string",
                        "enum": ["studio", "outdoor", "dramatic", "soft"],
                        "description": "Type of lighting setup",
                    },
                    "strength": {"type": "number", "minimum": 0, "description": "Light strength/intensity", "default": 1.0},
                },
                "required": ["lighting_type"],
            },
        }),
        json!({
            "name": "setup_camera",
            "description": "Position and configure the camera",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "location": vec3("Camera location [x, y, z]"),
                    "target": vec3_with_default("Point to look at [x, y, z]", [0.0, 0.0, 0.0]),
                    "lens": {"type": "number", "minimum": 1, "maximum": 200, "description": "Camera lens focal length in mm", "default": 50},
                    "view_type": {
                        "type": "string",
                        "enum": ["perspective", "orthographic"],
                        "description": "Camera view type",
                        "default": "perspective",
                    },
                },
                "required": ["location"],
            },
        }),
        json!({
            "name": "execute_python",
            "description": "Execute arbitrary Python code in Blender",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "code": {"type": "string", "description": "Python code to execute in Blender"},
                },
                "required": ["code"],
            },
        }),
        json!({
            "name": "render_scene",
            "description": "Render the current scene",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "output_path": {"type": "string", "description": "Path to save the rendered image"},
                    "resolution": {
                        "type": "array",
                        "items": {"type": "integer", "minimum": 1},
                        "minItems": 2,
                        "maxItems": 2,
                        "description": "Render resolution [width, height]",
                        "default": [1920, 1080],
                    },
                    "samples": {"type": "integer", "minimum": 1, "description": "Number of render samples", "default": 128},
                },
            },
        }),
    ]
}

pub fn resource_definitions() -> Vec<Value> {
    ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            json!({
                "uri": kind.uri(),
                "name": kind.name(),
                "description": kind.description(),
                "mimeType": "application/json",
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TOOL_NAMES, resource_definitions, tool_definitions};

    #[test]
    fn tool_list_matches_names() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools
            .iter()
            .map(|t| t["name"].as_str().expect("tool has a name"))
            .collect();
        assert_eq!(names, TOOL_NAMES);
        for tool in &tools {
            assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        }
    }

    #[test]
    fn six_resources() {
        let resources = resource_definitions();
        assert_eq!(resources.len(), 6);
        assert_eq!(resources[0]["uri"], "scene://info");
        assert_eq!(resources[5]["uri"], "render://settings");
    }
}
