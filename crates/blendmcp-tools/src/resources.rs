use blendmcp_connection::{BridgeError, CommandTransport};
use blendmcp_script::{ScriptBuilder, parse_result};
use serde_json::{Value, json};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    SceneInfo,
    ObjectsList,
    MaterialsList,
    CameraInfo,
    LightingInfo,
    RenderSettings,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        Self::SceneInfo,
        Self::ObjectsList,
        Self::MaterialsList,
        Self::CameraInfo,
        Self::LightingInfo,
        Self::RenderSettings,
    ];

    pub fn uri(self) -> &'static str {
        match self {
            Self::SceneInfo => "scene://info",
            Self::ObjectsList => "objects://list",
            Self::MaterialsList => "materials://list",
            Self::CameraInfo => "camera://info",
            Self::LightingInfo => "lighting://info",
            Self::RenderSettings => "render://settings",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.uri() == uri)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SceneInfo => "Scene Information",
            Self::ObjectsList => "Object List",
            Self::MaterialsList => "Material List",
            Self::CameraInfo => "Camera Information",
            Self::LightingInfo => "Lighting Information",
            Self::RenderSettings => "Render Settings",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SceneInfo => "Get information about the current Blender scene",
            Self::ObjectsList => "List all objects in the scene",
            Self::MaterialsList => "List all materials in the scene",
            Self::CameraInfo => "Get camera settings and position",
            Self::LightingInfo => "List lights and world lighting in the scene",
            Self::RenderSettings => "Get the current render settings",
        }
    }

    fn subject(self) -> &'static str {
        match self {
            Self::SceneInfo => "scene info",
            Self::ObjectsList => "objects list",
            Self::MaterialsList => "materials list",
            Self::CameraInfo => "camera info",
            Self::LightingInfo => "lighting info",
            Self::RenderSettings => "render settings",
        }
    }

    fn body(self) -> &'static str {
        match self {
            Self::SceneInfo => SCENE_INFO,
            Self::ObjectsList => OBJECTS_LIST,
            Self::MaterialsList => MATERIALS_LIST,
            Self::CameraInfo => CAMERA_INFO,
            Self::LightingInfo => LIGHTING_INFO,
            Self::RenderSettings => RENDER_SETTINGS,
        }
    }

    pub fn script(self) -> String {
        let mut script = ScriptBuilder::new();
        script
            .add_import("bpy")
            .add_import("json")
            .add_code(self.body())
            .add_code("\nprint(\"RESULT:\", json.dumps(result, default=str))");
        script.build()
    }
}

/// Read-only scene queries. Transport failures propagate; output without a
/// parseable `RESULT:` mapping yields `{"error": "Failed to get <what>"}`.
pub struct BlenderResources<T: CommandTransport> {
    transport: T,
}

impl<T: CommandTransport> BlenderResources<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn read(&self, kind: ResourceKind) -> Result<Value, BridgeError> {
        let response = self.transport.execute_script(&kind.script())?;
        if response.is_success() {
            if let Some(data @ Value::Object(_)) = parse_result(&response.output()) {
                return Ok(data);
            }
        } else {
            warn!(uri = kind.uri(), "resource script failed: {}", response.failure_message());
        }
        Ok(json!({"error": format!("Failed to get {}", kind.subject())}))
    }

    pub fn scene_info(&self) -> Result<Value, BridgeError> {
        self.read(ResourceKind::SceneInfo)
    }

    pub fn objects_list(&self) -> Result<Value, BridgeError> {
        self.read(ResourceKind::ObjectsList)
    }

    pub fn materials_list(&self) -> Result<Value, BridgeError> {
        self.read(ResourceKind::MaterialsList)
    }

    pub fn camera_info(&self) -> Result<Value, BridgeError> {
        self.read(ResourceKind::CameraInfo)
    }

    pub fn lighting_info(&self) -> Result<Value, BridgeError> {
        self.read(ResourceKind::LightingInfo)
    }

    pub fn render_settings(&self) -> Result<Value, BridgeError> {
        self.read(ResourceKind::RenderSettings)
    }
}

const SCENE_INFO: &str = r#"scene = bpy.context.scene
active = bpy.context.view_layer.objects.active
result = {
    "name": scene.name,
    "frame_current": scene.frame_current,
    "frame_start": scene.frame_start,
    "frame_end": scene.frame_end,
    "render_engine": scene.render.engine,
    "resolution": [scene.render.resolution_x, scene.render.resolution_y],
    "object_count": len(scene.objects),
    "material_count": len(bpy.data.materials),
    "mesh_count": len(bpy.data.meshes),
    "light_count": len([obj for obj in scene.objects if obj.type == 'LIGHT']),
    "camera_count": len([obj for obj in scene.objects if obj.type == 'CAMERA']),
    "active_object": active.name if active else None,
}"#;

const OBJECTS_LIST: &str = r#"objects = []
for obj in bpy.context.scene.objects:
    info = {
        "name": obj.name,
        "type": obj.type,
        "location": list(obj.location),
        "rotation": list(obj.rotation_euler),
        "scale": list(obj.scale),
        "visible": obj.visible_get(),
        "selected": obj.select_get(),
        "active": obj == bpy.context.active_object,
        "parent": obj.parent.name if obj.parent else None,
        "children": [child.name for child in obj.children],
        "material_count": len(obj.data.materials) if hasattr(obj.data, "materials") else 0,
    }
    if obj.type == 'MESH':
        info["vertex_count"] = len(obj.data.vertices)
        info["face_count"] = len(obj.data.polygons)
        info["edge_count"] = len(obj.data.edges)
    elif obj.type == 'LIGHT':
        info["light_type"] = obj.data.type
        info["energy"] = obj.data.energy
    elif obj.type == 'CAMERA':
        info["lens"] = obj.data.lens
        info["camera_type"] = obj.data.type
    objects.append(info)

result = {"objects": objects, "total_count": len(objects)}"#;

const MATERIALS_LIST: &str = r#"materials = []
for mat in bpy.data.materials:
    info = {
        "name": mat.name,
        "use_nodes": mat.use_nodes,
        "users": mat.users,
        "fake_user": mat.use_fake_user,
    }
    if mat.use_nodes and mat.node_tree:
        bsdf = mat.node_tree.nodes.get("Principled BSDF")
        if bsdf:
            info["base_color"] = list(bsdf.inputs["Base Color"].default_value)
            info["metallic"] = bsdf.inputs["Metallic"].default_value
            info["roughness"] = bsdf.inputs["Roughness"].default_value
            info["alpha"] = bsdf.inputs["Alpha"].default_value
            info["connected_inputs"] = [s.name for s in bsdf.inputs if s.is_linked]
    materials.append(info)

result = {"materials": materials, "total_count": len(materials)}"#;

const CAMERA_INFO: &str = r#"cameras = []
for obj in bpy.context.scene.objects:
    if obj.type != 'CAMERA':
        continue
    info = {
        "name": obj.name,
        "location": list(obj.location),
        "rotation": list(obj.rotation_euler),
        "lens": obj.data.lens,
        "type": obj.data.type,
        "clip_start": obj.data.clip_start,
        "clip_end": obj.data.clip_end,
        "is_active": obj == bpy.context.scene.camera,
    }
    if obj.data.type == 'ORTHO':
        info["ortho_scale"] = obj.data.ortho_scale
    cameras.append(info)

active = bpy.context.scene.camera
active_info = None
if active:
    active_info = {
        "name": active.name,
        "location": list(active.location),
        "rotation": list(active.rotation_euler),
        "lens": active.data.lens,
        "type": active.data.type,
    }

result = {"cameras": cameras, "active_camera": active_info, "total_count": len(cameras)}"#;

const LIGHTING_INFO: &str = r#"lights = []
for obj in bpy.context.scene.objects:
    if obj.type != 'LIGHT':
        continue
    info = {
        "name": obj.name,
        "type": obj.data.type,
        "location": list(obj.location),
        "rotation": list(obj.rotation_euler),
        "energy": obj.data.energy,
        "color": list(obj.data.color),
    }
    if obj.data.type == 'SPOT':
        info["spot_size"] = obj.data.spot_size
        info["spot_blend"] = obj.data.spot_blend
    elif obj.data.type == 'AREA':
        info["size"] = obj.data.size
        info["shape"] = obj.data.shape
    elif obj.data.type == 'SUN':
        info["angle"] = obj.data.angle
    lights.append(info)

world = bpy.context.scene.world
world_info = None
if world and world.use_nodes:
    background = world.node_tree.nodes.get("Background")
    if background:
        world_info = {
            "color": list(background.inputs["Color"].default_value[:3]),
            "strength": background.inputs["Strength"].default_value,
        }

result = {"lights": lights, "world_lighting": world_info, "total_lights": len(lights)}"#;

const RENDER_SETTINGS: &str = r#"scene = bpy.context.scene
result = {
    "engine": scene.render.engine,
    "resolution": [scene.render.resolution_x, scene.render.resolution_y],
    "resolution_percentage": scene.render.resolution_percentage,
    "frame_range": [scene.frame_start, scene.frame_end],
    "current_frame": scene.frame_current,
    "fps": scene.render.fps,
    "output_path": scene.render.filepath,
    "file_format": scene.render.image_settings.file_format,
}
if scene.render.engine == 'CYCLES':
    result["cycles"] = {
        "samples": scene.cycles.samples,
        "preview_samples": scene.cycles.preview_samples,
        "device": scene.cycles.device,
        "use_denoising": scene.cycles.use_denoising,
    }
elif scene.render.engine.startswith('BLENDER_EEVEE'):
    result["eevee"] = {
        "taa_render_samples": scene.eevee.taa_render_samples,
        "taa_samples": scene.eevee.taa_samples,
    }"#;
