//! Engine-supplied shader constants.

use serde::Serialize;

use super::program::BuiltinType::{self, Int as I, None as N, Real as R};

/// An engine-supplied shader constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoConstant {
    pub name: &'static str,
    pub elements: u8,
    pub element_type: BuiltinType,
    pub extra_type: BuiltinType,
}

const fn auto(name: &'static str, elements: u8, extra_type: BuiltinType) -> AutoConstant {
    AutoConstant {
        name,
        elements,
        element_type: BuiltinType::Real,
        extra_type,
    }
}

/// Built-in auto constants; the wire code is the index into this table.
pub static AUTO_CONSTANTS: &[AutoConstant] = &[
    auto("world_matrix", 16, N),
    auto("inverse_world_matrix", 16, N),
    auto("transpose_world_matrix", 16, N),
    auto("inverse_transpose_world_matrix", 16, N),
    auto("world_matrix_array_3x4", 12, N),
    auto("world_matrix_array", 16, N),
    auto("world_dualquaternion_array_2x4", 8, N),
    auto("world_scale_shear_matrix_array_3x4", 9, N),
    auto("view_matrix", 16, N),
    auto("inverse_view_matrix", 16, N),
    auto("transpose_view_matrix", 16, N),
    auto("inverse_transpose_view_matrix", 16, N),
    auto("projection_matrix", 16, N),
    auto("inverse_projection_matrix", 16, N),
    auto("transpose_projection_matrix", 16, N),
    auto("inverse_transpose_projection_matrix", 16, N),
    auto("viewproj_matrix", 16, N),
    auto("inverse_viewproj_matrix", 16, N),
    auto("transpose_viewproj_matrix", 16, N),
    auto("inverse_transpose_viewproj_matrix", 16, N),
    auto("worldview_matrix", 16, N),
    auto("inverse_worldview_matrix", 16, N),
    auto("transpose_worldview_matrix", 16, N),
    auto("inverse_transpose_worldview_matrix", 16, N),
    auto("worldviewproj_matrix", 16, N),
    auto("inverse_worldviewproj_matrix", 16, N),
    auto("transpose_worldviewproj_matrix", 16, N),
    auto("inverse_transpose_worldviewproj_matrix", 16, N),
    auto("render_target_flipping", 1, N),
    auto("vertex_winding", 1, N),
    auto("fog_colour", 4, N),
    auto("fog_params", 4, N),
    auto("surface_ambient_colour", 4, N),
    auto("surface_diffuse_colour", 4, N),
    auto("surface_specular_colour", 4, N),
    auto("surface_emissive_colour", 4, N),
    auto("surface_shininess", 1, N),
    auto("surface_alpha_rejection_value", 1, N),
    auto("light_count", 1, N),
    auto("ambient_light_colour", 4, N),
    auto("light_diffuse_colour", 4, I),
    auto("light_specular_colour", 4, I),
    auto("light_attenuation", 4, I),
    auto("spotlight_params", 4, I),
    auto("light_position", 4, I),
    auto("light_position_object_space", 4, I),
    auto("light_position_view_space", 4, I),
    auto("light_direction", 4, I),
    auto("light_direction_object_space", 4, I),
    auto("light_direction_view_space", 4, I),
    auto("light_distance_object_space", 1, I),
    auto("light_power", 1, I),
    auto("light_diffuse_colour_power_scaled", 4, I),
    auto("light_specular_colour_power_scaled", 4, I),
    auto("light_diffuse_colour_array", 4, I),
    auto("light_specular_colour_array", 4, I),
    auto("light_diffuse_colour_power_scaled_array", 4, I),
    auto("light_specular_colour_power_scaled_array", 4, I),
    auto("light_attenuation_array", 4, I),
    auto("light_position_array", 4, I),
    auto("light_position_object_space_array", 4, I),
    auto("light_position_view_space_array", 4, I),
    auto("light_direction_array", 4, I),
    auto("light_direction_object_space_array", 4, I),
    auto("light_direction_view_space_array", 4, I),
    auto("light_distance_object_space_array", 1, I),
    auto("light_power_array", 1, I),
    auto("spotlight_params_array", 4, I),
    auto("derived_ambient_light_colour", 4, N),
    auto("derived_scene_colour", 4, N),
    auto("derived_light_diffuse_colour", 4, I),
    auto("derived_light_specular_colour", 4, I),
    auto("derived_light_diffuse_colour_array", 4, I),
    auto("derived_light_specular_colour_array", 4, I),
    auto("light_number", 1, I),
    auto("light_casts_shadows", 1, I),
    auto("light_casts_shadows_array", 1, I),
    auto("shadow_extrusion_distance", 1, I),
    auto("camera_position", 3, N),
    auto("camera_position_object_space", 3, N),
    auto("texture_viewproj_matrix", 16, I),
    auto("texture_viewproj_matrix_array", 16, I),
    auto("texture_worldviewproj_matrix", 16, I),
    auto("texture_worldviewproj_matrix_array", 16, I),
    auto("spotlight_viewproj_matrix", 16, I),
    auto("spotlight_viewproj_matrix_array", 16, I),
    auto("spotlight_worldviewproj_matrix", 16, I),
    auto("spotlight_worldviewproj_matrix_array", 16, I),
    auto("custom", 4, I),
    auto("time", 1, R),
    auto("time_0_x", 4, R),
    auto("costime_0_x", 4, R),
    auto("sintime_0_x", 4, R),
    auto("tantime_0_x", 4, R),
    auto("time_0_x_packed", 4, R),
    auto("time_0_1", 4, R),
    auto("costime_0_1", 4, R),
    auto("sintime_0_1", 4, R),
    auto("tantime_0_1", 4, R),
    auto("time_0_1_packed", 4, R),
    auto("time_0_2pi", 4, R),
    auto("costime_0_2pi", 4, R),
    auto("sintime_0_2pi", 4, R),
    auto("tantime_0_2pi", 4, R),
    auto("time_0_2pi_packed", 4, R),
    auto("frame_time", 1, R),
    auto("fps", 1, N),
    auto("viewport_width", 1, N),
    auto("viewport_height", 1, N),
    auto("inverse_viewport_width", 1, N),
    auto("inverse_viewport_height", 1, N),
    auto("viewport_size", 4, N),
    auto("view_direction", 3, N),
    auto("view_side_vector", 3, N),
    auto("view_up_vector", 3, N),
    auto("fov", 1, N),
    auto("near_clip_distance", 1, N),
    auto("far_clip_distance", 1, N),
    auto("pass_number", 1, N),
    auto("pass_iteration_number", 1, N),
    auto("animation_parametric", 4, I),
    auto("texel_offsets", 4, N),
    auto("scene_depth_range", 4, N),
    auto("shadow_scene_depth_range", 4, I),
    auto("shadow_scene_depth_range_array", 4, I),
    auto("shadow_colour", 4, N),
    auto("texture_size", 4, I),
    auto("inverse_texture_size", 4, I),
    auto("packed_texture_size", 4, I),
    auto("texture_matrix", 16, I),
    auto("lod_camera_position", 3, N),
    auto("lod_camera_position_object_space", 3, N),
    auto("light_custom", 4, I),
];

/// Looks up an auto constant by name, returning its wire code.
pub fn find_auto_constant(name: &str) -> Option<(u16, &'static AutoConstant)> {
    let name = name.to_ascii_lowercase();
    AUTO_CONSTANTS
        .iter()
        .enumerate()
        .find(|(_, c)| c.name == name)
        .map(|(i, c)| (i as u16, c))
}

/// The auto constant with wire code `code`.
pub fn auto_constant(code: u16) -> Option<&'static AutoConstant> {
    AUTO_CONSTANTS.get(code as usize)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = AUTO_CONSTANTS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AUTO_CONSTANTS.len());
    }

    #[test]
    fn lookup_ignores_case() {
        let (code, c) = find_auto_constant("WORLD_MATRIX").unwrap();
        assert_eq!(code, 0);
        assert_eq!(c.elements, 16);
        assert_eq!(auto_constant(code).map(|c| c.name), Some("world_matrix"));
        assert!(find_auto_constant("world_matrix_x").is_none());
    }

    #[test]
    fn extra_types() {
        assert_eq!(find_auto_constant("light_position").unwrap().1.extra_type, BuiltinType::Int);
        assert_eq!(find_auto_constant("time").unwrap().1.extra_type, BuiltinType::Real);
        assert_eq!(find_auto_constant("fps").unwrap().1.extra_type, BuiltinType::None);
    }
}
