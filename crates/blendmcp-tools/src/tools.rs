use crate::args::{
    CreateMaterialArgs, CreateObjectArgs, DeleteObjectArgs, ExecutePythonArgs, ModifyObjectArgs,
    RenderSceneArgs, SetupCameraArgs, SetupLightingArgs, Vec3,
};
use crate::lighting::lighting_body;
use crate::{ToolError, py_float, py_tuple};
use blendmcp_connection::CommandTransport;
use blendmcp_script::{
    ScriptBuilder, clamp_value, normalize_color, parse_result, quote, validate_blender_object_name,
};
use serde_json::{Value, json};
use tracing::{debug, info};

pub const DEFAULT_RENDER_PATH: &str = "/tmp/blender_render.png";
pub const DEFAULT_RESOLUTION: [u32; 2] = [1920, 1080];
pub const DEFAULT_SAMPLES: u32 = 128;

const ORIGIN: Vec3 = [0.0, 0.0, 0.0];
const UNIT_SCALE: Vec3 = [1.0, 1.0, 1.0];

const PRINT_RESULT: &str = "\nprint(\"RESULT:\", json.dumps(result))";

const NOT_FOUND: &str =
    "    result = {\"success\": False, \"message\": f\"Object '{object_name}' not found\"}";

const OBJECT_STATE: &str = r#"result = {
    "success": True,
    "object_name": obj.name,
    "location": list(obj.location),
    "scale": list(obj.scale),
    "rotation": list(obj.rotation_euler),
}"#;

/// Scene-editing operations. Each call generates one script, sends it as
/// `execute_code`, and returns the mapping the script printed after
/// `RESULT:`, or a summary when the output carried none.
pub struct BlenderTools<T: CommandTransport> {
    transport: T,
}

impl<T: CommandTransport> BlenderTools<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn create_object(&self, args: &CreateObjectArgs) -> Result<Value, ToolError> {
        let location = args.location.unwrap_or(ORIGIN);
        let scale = args.scale.unwrap_or(UNIT_SCALE);
        let rotation = args.rotation.unwrap_or(ORIGIN);

        let body = format!(
            "{op}(location={loc})\nobj = bpy.context.active_object\nobj.scale = {scale}\nobj.rotation_euler = Euler({rot}, 'XYZ')\nbpy.context.view_layer.update()\n\n{OBJECT_STATE}",
            op = args.object_type.operator(),
            loc = py_tuple(&location),
            scale = py_tuple(&scale),
            rot = py_tuple(&rotation),
        );

        let mut script = script_with_json();
        script.add_from_import("mathutils", "Euler").add_code(body);
        self.run(script, "create object", || {
            json!({
                "success": true,
                "message": format!("Created {} object", args.object_type),
            })
        })
    }

    pub fn delete_object(&self, args: &DeleteObjectArgs) -> Result<Value, ToolError> {
        let name = checked_name(&args.object_name)?;
        let body = format!(
            "object_name = {}\nobj = bpy.data.objects.get(object_name)\nif obj is None:\n{NOT_FOUND}\nelse:\n    bpy.data.objects.remove(obj, do_unlink=True)\n    result = {{\"success\": True, \"message\": f\"Object '{{object_name}}' deleted successfully\"}}",
            quote(name)
        );

        let mut script = script_with_json();
        script.add_code(body);
        self.run(script, "delete object", || {
            json!({"success": true, "message": format!("Deleted object {name}")})
        })
    }

    pub fn modify_object(&self, args: &ModifyObjectArgs) -> Result<Value, ToolError> {
        let name = checked_name(&args.object_name)?;

        let mut changes = String::new();
        if let Some(location) = args.location {
            changes.push_str(&format!("    obj.location = {}\n", py_tuple(&location)));
        }
        if let Some(scale) = args.scale {
            changes.push_str(&format!("    obj.scale = {}\n", py_tuple(&scale)));
        }
        if let Some(rotation) = args.rotation {
            changes.push_str(&format!(
                "    obj.rotation_euler = Euler({}, 'XYZ')\n",
                py_tuple(&rotation)
            ));
        }

        let body = format!(
            "object_name = {}\nobj = bpy.data.objects.get(object_name)\nif obj is None:\n{NOT_FOUND}\nelse:\n{changes}    bpy.context.view_layer.update()\n{}",
            quote(name),
            indent(OBJECT_STATE)
        );

        let mut script = script_with_json();
        script.add_from_import("mathutils", "Euler").add_code(body);
        self.run(script, "modify object", || {
            json!({"success": true, "message": format!("Modified object {name}")})
        })
    }

    pub fn create_material(&self, args: &CreateMaterialArgs) -> Result<Value, ToolError> {
        let object_name = checked_name(&args.object_name)?;
        let material_name = checked_name(&args.material_name)?;
        let color = match &args.color {
            Some(channels) => normalize_color(channels),
            None => blendmcp_script::DEFAULT_COLOR,
        };
        let metallic = py_float(clamp_value(args.metallic, 0.0, 1.0));
        let roughness = py_float(clamp_value(args.roughness, 0.0, 1.0));
        let color = py_tuple(&color);

        let body = format!(
            r#"object_name = {object}
material_name = {material}
obj = bpy.data.objects.get(object_name)
if obj is None:
{NOT_FOUND}
elif not hasattr(obj.data, "materials"):
    result = {{"success": False, "message": f"Object '{{object_name}}' cannot hold materials"}}
else:
    mat = bpy.data.materials.new(name=material_name)
    mat.use_nodes = True
    bsdf = mat.node_tree.nodes.get("Principled BSDF")
    if bsdf:
        bsdf.inputs["Base Color"].default_value = {color}
        bsdf.inputs["Metallic"].default_value = {metallic}
        bsdf.inputs["Roughness"].default_value = {roughness}
    if obj.data.materials:
        obj.data.materials[0] = mat
    else:
        obj.data.materials.append(mat)
    result = {{
        "success": True,
        "object_name": obj.name,
        "material_name": mat.name,
        "color": list({color}),
        "metallic": {metallic},
        "roughness": {roughness},
    }}"#,
            object = quote(object_name),
            material = quote(material_name),
        );

        let mut script = script_with_json();
        script.add_code(body);
        self.run(script, "create material", || {
            json!({
                "success": true,
                "message": format!("Created material {material_name} for {object_name}"),
            })
        })
    }

    pub fn setup_lighting(&self, args: &SetupLightingArgs) -> Result<Value, ToolError> {
        let strength = args.strength.max(0.0);
        let preset = args.lighting_type;

        let mut script = script_with_json();
        script.add_code(lighting_body(preset, strength)).add_code(format!(
            "result = {{\"success\": True, \"lighting_type\": \"{preset}\", \"strength\": {}}}",
            py_float(strength)
        ));
        self.run(script, "setup lighting", || {
            json!({"success": true, "message": format!("Set up {preset} lighting")})
        })
    }

    pub fn setup_camera(&self, args: &SetupCameraArgs) -> Result<Value, ToolError> {
        let location = py_tuple(&args.location);
        let target = py_tuple(&args.target.unwrap_or(ORIGIN));
        let lens = py_float(clamp_value(args.lens, 1.0, 200.0));

        let body = format!(
            r#"camera = bpy.context.scene.camera
if camera is None:
    bpy.ops.object.camera_add(location={location})
    camera = bpy.context.active_object
    bpy.context.scene.camera = camera
else:
    camera.location = {location}

camera.data.lens = {lens}
camera.data.type = '{kind}'
direction = Vector({target}) - camera.location
camera.rotation_euler = direction.to_track_quat('-Z', 'Y').to_euler()
bpy.context.view_layer.update()

result = {{
    "success": True,
    "camera_location": list(camera.location),
    "target": list({target}),
    "lens": camera.data.lens,
    "view_type": "{view}",
}}"#,
            kind = args.view_type.blender_type(),
            view = args.view_type.as_str(),
        );

        let mut script = script_with_json();
        script.add_from_import("mathutils", "Vector").add_code(body);
        self.run(script, "setup camera", || {
            json!({"success": true, "message": "Camera positioned successfully"})
        })
    }

    /// Runs `code` as-is and returns its captured output.
    pub fn execute_python(&self, args: &ExecutePythonArgs) -> Result<Value, ToolError> {
        info!("executing {} bytes of Python in Blender", args.code.len());
        let response = self.transport.execute_script(&args.code)?;
        if !response.is_success() {
            return Err(ToolError::Remote {
                action: "execute code",
                message: response.failure_message(),
            });
        }
        Ok(json!({
            "success": true,
            "output": response.output(),
            "message": "Code executed successfully",
        }))
    }

    pub fn render_scene(&self, args: &RenderSceneArgs) -> Result<Value, ToolError> {
        let output_path = args.output_path.as_deref().unwrap_or(DEFAULT_RENDER_PATH);
        let [width, height] = args.resolution.unwrap_or(DEFAULT_RESOLUTION).map(|v| v.max(1));
        let samples = args.samples.unwrap_or(DEFAULT_SAMPLES).max(1);

        let body = format!(
            r#"scene = bpy.context.scene
scene.render.resolution_x = {width}
scene.render.resolution_y = {height}
scene.render.filepath = {path}
if scene.render.engine == 'CYCLES':
    scene.cycles.samples = {samples}

bpy.ops.render.render(write_still=True)

result = {{
    "success": True,
    "output_path": scene.render.filepath,
    "resolution": [{width}, {height}],
    "samples": {samples},
}}"#,
            path = quote(output_path),
        );

        let mut script = script_with_json();
        script.add_code(body);
        self.run(script, "render scene", || {
            json!({
                "success": true,
                "message": format!("Scene rendered to {output_path}"),
                "output_path": output_path,
            })
        })
    }

    fn run<F>(&self, mut script: ScriptBuilder, action: &'static str, fallback: F) -> Result<Value, ToolError>
    where
        F: FnOnce() -> Value,
    {
        script.add_code(PRINT_RESULT);
        debug!(action, "sending tool script");

        let response = self.transport.execute_script(&script.build())?;
        if !response.is_success() {
            return Err(ToolError::Remote {
                action,
                message: response.failure_message(),
            });
        }

        let output = response.output();
        if let Some(result @ Value::Object(_)) = parse_result(&output) {
            return Ok(result);
        }

        let mut summary = fallback();
        if let Value::Object(map) = &mut summary {
            if !output.is_empty() {
                map.insert("output".to_string(), Value::String(output));
            }
        }
        Ok(summary)
    }
}

fn script_with_json() -> ScriptBuilder {
    let mut script = ScriptBuilder::new();
    script.add_import("bpy").add_import("json");
    script
}

fn checked_name(name: &str) -> Result<&str, ToolError> {
    if validate_blender_object_name(name) {
        Ok(name)
    } else {
        Err(ToolError::InvalidArgument(format!("Invalid object name: {name:?}")))
    }
}

fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::BlenderTools;
    use crate::ToolError;
    use crate::args::{
        CameraView, CreateMaterialArgs, CreateObjectArgs, DeleteObjectArgs, ExecutePythonArgs,
        LightingPreset, ModifyObjectArgs, ObjectKind, RenderSceneArgs, SetupCameraArgs,
        SetupLightingArgs,
    };
    use blendmcp_connection::{BridgeError, Command, CommandTransport, Response};
    use serde_json::{Value, json};
    use std::cell::RefCell;

    struct Recorder {
        reply: Response,
        sent: RefCell<Vec<Command>>,
    }

    impl Recorder {
        fn replying(status: &str, result: &str) -> Self {
            Self {
                reply: Response {
                    status: status.to_string(),
                    result: Some(Value::String(result.to_string())),
                    ..Response::default()
                },
                sent: RefCell::new(Vec::new()),
            }
        }

        fn last_code(&self) -> String {
            let sent = self.sent.borrow();
            let command = sent.last().expect("a command was sent");
            assert_eq!(command.kind, "execute_code");
            command.params["code"]
                .as_str()
                .expect("code is a string")
                .to_string()
        }
    }

    impl CommandTransport for Recorder {
        fn send_command(&self, command: &Command) -> Result<Response, BridgeError> {
            self.sent.borrow_mut().push(command.clone());
            Ok(self.reply.clone())
        }
    }

    fn tools(status: &str, result: &str) -> BlenderTools<Recorder> {
        BlenderTools::new(Recorder::replying(status, result))
    }

    #[test]
    fn create_object_returns_parsed_result() {
        let tools = tools(
            "success",
            "RESULT: {\"success\": true, \"object_name\": \"Cube.001\"}\n",
        );
        let mut args = CreateObjectArgs::new(ObjectKind::Cube);
        args.location = Some([1.0, 2.0, 3.0]);

        let out = tools.create_object(&args).expect("tool should work");
        assert_eq!(out, json!({"success": true, "object_name": "Cube.001"}));

        let code = tools.transport().last_code();
        assert!(code.starts_with("import bpy\nimport json\n\nfrom mathutils import Euler\n"));
        assert!(code.contains("bpy.ops.mesh.primitive_cube_add(location=(1.0, 2.0, 3.0))"));
        assert!(code.contains("obj.scale = (1.0, 1.0, 1.0)"));
        assert!(code.contains("obj.rotation_euler = Euler((0.0, 0.0, 0.0), 'XYZ')"));
        assert!(code.ends_with("print(\"RESULT:\", json.dumps(result))"));
    }

    #[test]
    fn create_object_falls_back_to_summary() {
        let tools = tools("success", "some noise");
        let out = tools
            .create_object(&CreateObjectArgs::new(ObjectKind::Monkey))
            .expect("tool should work");
        assert_eq!(
            out,
            json!({"success": true, "message": "Created monkey object", "output": "some noise"})
        );
    }

    #[test]
    fn delete_object_script() {
        let tools = tools("success", "");
        let out = tools
            .delete_object(&DeleteObjectArgs {
                object_name: "Cube".to_string(),
            })
            .expect("tool should work");
        assert_eq!(out, json!({"success": true, "message": "Deleted object Cube"}));

        insta::assert_snapshot!(tools.transport().last_code(), @r###"
        import bpy
        import json

        object_name = "Cube"
        obj = bpy.data.objects.get(object_name)
        if obj is None:
            result = {"success": False, "message": f"Object '{object_name}' not found"}
        else:
            bpy.data.objects.remove(obj, do_unlink=True)
            result = {"success": True, "message": f"Object '{object_name}' deleted successfully"}

        print("RESULT:", json.dumps(result))
        "###);
    }

    #[test]
    fn invalid_names_never_reach_blender() {
        let tools = tools("success", "");
        let err = tools
            .delete_object(&DeleteObjectArgs {
                object_name: "bad/name".to_string(),
            })
            .expect_err("must fail");
        assert!(matches!(err, ToolError::InvalidArgument(_)));
        assert!(tools.transport().sent.borrow().is_empty());
    }

    #[test]
    fn names_are_quoted_literals() {
        let tools = tools("success", "");
        tools
            .modify_object(&ModifyObjectArgs {
                object_name: "My \"Cube\"".to_string(),
                location: Some([0.0, 0.0, 2.0]),
                scale: None,
                rotation: None,
            })
            .expect("tool should work");
        let code = tools.transport().last_code();
        assert!(code.contains(r#"object_name = "My \"Cube\"""#));
        assert!(code.contains("    obj.location = (0.0, 0.0, 2.0)\n"));
        assert!(!code.contains("obj.scale ="));
        assert!(code.contains("    result = {\n        \"success\": True,"));
    }

    #[test]
    fn material_values_are_normalized() {
        let tools = tools("success", "");
        let mut args = CreateMaterialArgs::new("Cube", "Red");
        args.color = Some(vec![255.0, 0.0, 0.0]);
        args.metallic = 3.0;
        args.roughness = -1.0;

        let out = tools.create_material(&args).expect("tool should work");
        assert_eq!(out["message"], "Created material Red for Cube");

        let code = tools.transport().last_code();
        assert!(code.contains("default_value = (1.0, 0.0, 0.0, 1.0)"));
        assert!(code.contains("[\"Metallic\"].default_value = 1.0"));
        assert!(code.contains("[\"Roughness\"].default_value = 0.0"));
    }

    #[test]
    fn lighting_and_camera_scripts() {
        let tools = tools("success", "");
        let out = tools
            .setup_lighting(&SetupLightingArgs {
                lighting_type: LightingPreset::Studio,
                strength: 2.0,
            })
            .expect("tool should work");
        assert_eq!(out["message"], "Set up studio lighting");
        assert!(tools.transport().last_code().contains("key_light.data.energy = 200.0"));

        let mut camera = SetupCameraArgs::new([7.0, -7.0, 5.0]);
        camera.lens = 500.0;
        camera.view_type = CameraView::Orthographic;
        tools.setup_camera(&camera).expect("tool should work");
        let code = tools.transport().last_code();
        assert!(code.contains("camera.data.lens = 200.0"));
        assert!(code.contains("camera.data.type = 'ORTHO'"));
        assert!(code.contains("direction = Vector((0.0, 0.0, 0.0)) - camera.location"));
    }

    #[test]
    fn render_defaults() {
        let tools = tools("success", "");
        let out = tools
            .render_scene(&RenderSceneArgs::default())
            .expect("tool should work");
        assert_eq!(out["output_path"], "/tmp/blender_render.png");

        let code = tools.transport().last_code();
        assert!(code.contains("scene.render.resolution_x = 1920"));
        assert!(code.contains("scene.render.filepath = \"/tmp/blender_render.png\""));
        assert!(code.contains("scene.cycles.samples = 128"));
    }

    #[test]
    fn execute_python_passes_code_through() {
        let tools = tools("success", "hello\n");
        let out = tools
            .execute_python(&ExecutePythonArgs {
                code: "print('hello')".to_string(),
            })
            .expect("tool should work");
        assert_eq!(
            out,
            json!({"success": true, "output": "hello\n", "message": "Code executed successfully"})
        );
        assert_eq!(tools.transport().last_code(), "print('hello')");
    }

    #[test]
    fn remote_failure_carries_message() {
        let tools = BlenderTools::new(Recorder {
            reply: Response {
                status: "error".to_string(),
                message: Some("name 'foo' is not defined".to_string()),
                ..Response::default()
            },
            sent: RefCell::new(Vec::new()),
        });
        let err = tools
            .render_scene(&RenderSceneArgs::default())
            .expect_err("must fail");
        assert_eq!(err.to_string(), "Failed to render scene: name 'foo' is not defined");

        let unknown = BlenderTools::new(Recorder::replying("error", ""))
            .execute_python(&ExecutePythonArgs {
                code: "x".to_string(),
            })
            .expect_err("must fail");
        assert_eq!(unknown.to_string(), "Failed to execute code: Unknown error");
    }
}
