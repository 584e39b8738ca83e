//! Built-in GLSL programs, selectable by name.
//!
//! Positions are in window pixels with the origin top-left; every vertex
//! stage maps them to clip space through `u_viewport`.

use super::{POSITION_LOCATION, TEXCOORD_LOCATION};

/// Vertex and fragment source of one program.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource {
    pub name: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
}

/// Attribute names bound to fixed locations before linking.
pub const ATTRIBUTE_BINDINGS: [(u32, &str); 2] = [
    (POSITION_LOCATION, "a_position"),
    (TEXCOORD_LOCATION, "a_texcoord"),
];

/// Flat color fill, `u_color` in RGBA.
pub const COLOR: ShaderSource = ShaderSource {
    name: "color",
    vertex: r#"
#version 120
uniform vec2 u_viewport;
attribute vec3 a_position;
attribute vec2 a_texcoord;

void main() {
    vec2 ndc = a_position.xy / u_viewport * vec2(2.0, -2.0) + vec2(-1.0, 1.0);
    gl_Position = vec4(ndc, a_position.z, 1.0);
}
"#,
    fragment: r#"
#version 120
uniform vec4 u_color;

void main() {
    gl_FragColor = u_color;
}
"#,
};

/// Textured quad sampling `u_texture`.
pub const TEXTURE: ShaderSource = ShaderSource {
    name: "texture",
    vertex: r#"
#version 120
uniform vec2 u_viewport;
attribute vec3 a_position;
attribute vec2 a_texcoord;
varying vec2 v_texcoord;

void main() {
    vec2 ndc = a_position.xy / u_viewport * vec2(2.0, -2.0) + vec2(-1.0, 1.0);
    gl_Position = vec4(ndc, a_position.z, 1.0);
    v_texcoord = a_texcoord;
}
"#,
    fragment: r#"
#version 120
uniform sampler2D u_texture;
varying vec2 v_texcoord;

void main() {
    gl_FragColor = texture2D(u_texture, v_texcoord);
}
"#,
};

pub const BUILTIN: [ShaderSource; 2] = [COLOR, TEXTURE];

pub fn find(name: &str) -> Option<&'static ShaderSource> {
    BUILTIN.iter().find(|source| source.name == name)
}
