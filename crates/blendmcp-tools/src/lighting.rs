use crate::args::LightingPreset;
use crate::{py_float, py_tuple};
use std::fmt::Write;

const CLEAR_LIGHTS: &str = "bpy.ops.object.select_all(action='DESELECT')
for obj in bpy.context.scene.objects:
    if obj.type == 'LIGHT':
        obj.select_set(True)
bpy.ops.object.delete()
";

struct LightSpec {
    var: &'static str,
    kind: &'static str,
    location: [f64; 3],
    /// Energy per unit of requested strength.
    energy: f64,
    extras: &'static [(&'static str, &'static str)],
}

const STUDIO: &[LightSpec] = &[
    LightSpec {
        var: "key_light",
        kind: "AREA",
        location: [4.0, -4.0, 6.0],
        energy: 100.0,
        extras: &[("data.size", "2")],
    },
    LightSpec {
        var: "fill_light",
        kind: "AREA",
        location: [-4.0, -2.0, 4.0],
        energy: 50.0,
        extras: &[("data.size", "3")],
    },
    LightSpec {
        var: "rim_light",
        kind: "SPOT",
        location: [0.0, 4.0, 6.0],
        energy: 75.0,
        extras: &[],
    },
];

const OUTDOOR: &[LightSpec] = &[
    LightSpec {
        var: "sun_light",
        kind: "SUN",
        location: [0.0, 0.0, 10.0],
        energy: 5.0,
        extras: &[("rotation_euler", "(0.785, 0, 0.785)")],
    },
    LightSpec {
        var: "sky_light",
        kind: "AREA",
        location: [0.0, 0.0, 8.0],
        energy: 20.0,
        extras: &[("data.size", "10")],
    },
];

const DRAMATIC: &[LightSpec] = &[
    LightSpec {
        var: "main_light",
        kind: "SPOT",
        location: [6.0, -6.0, 8.0],
        energy: 200.0,
        extras: &[("data.spot_size", "0.5")],
    },
    LightSpec {
        var: "fill_light",
        kind: "AREA",
        location: [-2.0, 2.0, 3.0],
        energy: 10.0,
        extras: &[],
    },
];

const SOFT: &[LightSpec] = &[
    LightSpec {
        var: "light1",
        kind: "AREA",
        location: [3.0, -3.0, 5.0],
        energy: 30.0,
        extras: &[("data.size", "4")],
    },
    LightSpec {
        var: "light2",
        kind: "AREA",
        location: [-3.0, 3.0, 5.0],
        energy: 30.0,
        extras: &[("data.size", "4")],
    },
    LightSpec {
        var: "light3",
        kind: "AREA",
        location: [0.0, 0.0, 8.0],
        energy: 20.0,
        extras: &[("data.size", "6")],
    },
];

fn rig(preset: LightingPreset) -> &'static [LightSpec] {
    match preset {
        LightingPreset::Studio => STUDIO,
        LightingPreset::Outdoor => OUTDOOR,
        LightingPreset::Dramatic => DRAMATIC,
        LightingPreset::Soft => SOFT,
    }
}

/// Script body replacing every light in the scene with the preset's rig.
/// Expects `bpy` to be imported already.
pub(crate) fn lighting_body(preset: LightingPreset, strength: f64) -> String {
    let mut out = String::from(CLEAR_LIGHTS);
    for light in rig(preset) {
        let _ = write!(
            out,
            "\nbpy.ops.object.light_add(type='{}', location={})\n{} = bpy.context.active_object\n{}.data.energy = {}\n",
            light.kind,
            py_tuple(&light.location),
            light.var,
            light.var,
            py_float(strength * light.energy),
        );
        for (attr, value) in light.extras {
            let _ = writeln!(out, "{}.{attr} = {value}", light.var);
        }
    }
    out
}
