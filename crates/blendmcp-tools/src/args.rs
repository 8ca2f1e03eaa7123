use crate::ToolError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub type Vec3 = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ObjectKind {
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Plane,
    Monkey,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        Self::Cube,
        Self::Sphere,
        Self::Cylinder,
        Self::Cone,
        Self::Plane,
        Self::Monkey,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Plane => "plane",
            Self::Monkey => "monkey",
        }
    }

    pub fn operator(self) -> &'static str {
        match self {
            Self::Cube => "bpy.ops.mesh.primitive_cube_add",
            Self::Sphere => "bpy.ops.mesh.primitive_uv_sphere_add",
            Self::Cylinder => "bpy.ops.mesh.primitive_cylinder_add",
            Self::Cone => "bpy.ops.mesh.primitive_cone_add",
            Self::Plane => "bpy.ops.mesh.primitive_plane_add",
            Self::Monkey => "bpy.ops.mesh.primitive_monkey_add",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ToolError::InvalidArgument(format!("Unknown object type: {s}")))
    }
}

impl TryFrom<String> for ObjectKind {
    type Error = ToolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LightingPreset {
    Studio,
    Outdoor,
    Dramatic,
    Soft,
}

impl LightingPreset {
    pub const ALL: [LightingPreset; 4] = [Self::Studio, Self::Outdoor, Self::Dramatic, Self::Soft];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Studio => "studio",
            Self::Outdoor => "outdoor",
            Self::Dramatic => "dramatic",
            Self::Soft => "soft",
        }
    }
}

impl fmt::Display for LightingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightingPreset {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| ToolError::InvalidArgument(format!("Unknown lighting type: {s}")))
    }
}

impl TryFrom<String> for LightingPreset {
    type Error = ToolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraView {
    #[default]
    Perspective,
    Orthographic,
}

impl CameraView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Orthographic => "orthographic",
        }
    }

    /// Value of Blender's `Camera.type` for this view.
    pub fn blender_type(self) -> &'static str {
        match self {
            Self::Perspective => "PERSP",
            Self::Orthographic => "ORTHO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateObjectArgs {
    pub object_type: ObjectKind,
    #[serde(default)]
    pub location: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
    #[serde(default)]
    pub rotation: Option<Vec3>,
}

impl CreateObjectArgs {
    pub fn new(object_type: ObjectKind) -> Self {
        Self {
            object_type,
            location: None,
            scale: None,
            rotation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteObjectArgs {
    pub object_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModifyObjectArgs {
    pub object_name: String,
    #[serde(default)]
    pub location: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
    #[serde(default)]
    pub rotation: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMaterialArgs {
    pub object_name: String,
    pub material_name: String,
    #[serde(default)]
    pub color: Option<Vec<f64>>,
    #[serde(default)]
    pub metallic: f64,
    #[serde(default = "default_roughness")]
    pub roughness: f64,
}

impl CreateMaterialArgs {
    pub fn new(object_name: impl Into<String>, material_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            material_name: material_name.into(),
            color: None,
            metallic: 0.0,
            roughness: default_roughness(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupLightingArgs {
    pub lighting_type: LightingPreset,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupCameraArgs {
    pub location: Vec3,
    #[serde(default)]
    pub target: Option<Vec3>,
    #[serde(default = "default_lens")]
    pub lens: f64,
    #[serde(default)]
    pub view_type: CameraView,
}

impl SetupCameraArgs {
    pub fn new(location: Vec3) -> Self {
        Self {
            location,
            target: None,
            lens: default_lens(),
            view_type: CameraView::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutePythonArgs {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSceneArgs {
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub resolution: Option<[u32; 2]>,
    #[serde(default)]
    pub samples: Option<u32>,
}

fn default_roughness() -> f64 {
    0.5
}

fn default_strength() -> f64 {
    1.0
}

fn default_lens() -> f64 {
    50.0
}

#[cfg(test)]
mod tests {
    use super::{
        CameraView, CreateMaterialArgs, CreateObjectArgs, LightingPreset, ObjectKind,
        SetupCameraArgs, SetupLightingArgs,
    };
    use serde_json::json;

    #[test]
    fn object_kind_parses_known_names_only() {
        assert_eq!("monkey".parse::<ObjectKind>().expect("known"), ObjectKind::Monkey);
        let err = "torus".parse::<ObjectKind>().expect_err("must fail");
        assert_eq!(err.to_string(), "invalid argument: Unknown object type: torus");
    }

    #[test]
    fn create_object_args_from_json() {
        let args: CreateObjectArgs =
            serde_json::from_value(json!({"object_type": "cone", "location": [1, 2, 3]}))
                .expect("decode should work");
        assert_eq!(args.object_type, ObjectKind::Cone);
        assert_eq!(args.location, Some([1.0, 2.0, 3.0]));
        assert_eq!(args.scale, None);

        let err = serde_json::from_value::<CreateObjectArgs>(json!({"object_type": "torus"}))
            .expect_err("must fail");
        assert!(err.to_string().contains("Unknown object type: torus"));
    }

    #[test]
    fn material_defaults() {
        let args: CreateMaterialArgs =
            serde_json::from_value(json!({"object_name": "Cube", "material_name": "Red"}))
                .expect("decode should work");
        assert_eq!(args, CreateMaterialArgs::new("Cube", "Red"));
        assert_eq!(args.roughness, 0.5);
    }

    #[test]
    fn lighting_and_camera_defaults() {
        let lighting: SetupLightingArgs =
            serde_json::from_value(json!({"lighting_type": "soft"})).expect("decode should work");
        assert_eq!(lighting.lighting_type, LightingPreset::Soft);
        assert_eq!(lighting.strength, 1.0);

        let camera: SetupCameraArgs =
            serde_json::from_value(json!({"location": [7, -7, 5]})).expect("decode should work");
        assert_eq!(camera, SetupCameraArgs::new([7.0, -7.0, 5.0]));
        assert_eq!(camera.view_type, CameraView::Perspective);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(
            serde_json::from_value::<SetupLightingArgs>(
                json!({"lighting_type": "studio", "colour": "warm"})
            )
            .is_err()
        );
    }
}
