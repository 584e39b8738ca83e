use super::shaders::{self, ATTRIBUTE_BINDINGS};
use super::{Bindable, Texture, check};
use crate::error::ResourceError;
use glam::Vec2;
use glhal_native::{GlBackend, ProgramId, TextureId, Uniform};
use std::cell::RefCell;
use std::rc::Rc;

/// Linked program built from one of the [`shaders::BUILTIN`] sources.
///
/// Sampler uniforms get texture units in the order they are first set;
/// binding the shader binds every assigned texture to its unit.
pub struct Shader {
    gl: Rc<dyn GlBackend>,
    id: ProgramId,
    name: String,
    samplers: RefCell<Vec<(String, TextureId)>>,
}

impl Shader {
    pub(crate) fn new(gl: Rc<dyn GlBackend>, name: &str) -> Result<Self, ResourceError> {
        let source =
            shaders::find(name).ok_or_else(|| ResourceError::UnknownShader(name.to_owned()))?;
        let id = gl
            .compile_program(source.vertex, source.fragment, &ATTRIBUTE_BINDINGS)
            .map_err(|e| {
                tracing::error!(target: "graphics", "shader {name} failed to build: {e}");
                ResourceError::ShaderCompile {
                    name: name.to_owned(),
                    log: e.0,
                }
            })?;
        tracing::debug!("built shader {name} as program {}", id.get());
        Ok(Self {
            gl,
            id,
            name: name.to_owned(),
            samplers: RefCell::new(Vec::new()),
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_float(&self, name: &str, value: f32) -> Result<(), ResourceError> {
        self.set(name, Uniform::Float(value))
    }

    pub fn set_vec2(&self, name: &str, value: Vec2) -> Result<(), ResourceError> {
        self.set(name, Uniform::Vec2(value.to_array()))
    }

    pub fn set_vec4(&self, name: &str, value: [f32; 4]) -> Result<(), ResourceError> {
        self.set(name, Uniform::Vec4(value))
    }

    /// Point sampler `name` at `texture`. The texture must stay alive while
    /// the shader is used with it.
    pub fn set_texture(&self, name: &str, texture: &Texture) -> Result<(), ResourceError> {
        let unit = {
            let mut samplers = self.samplers.borrow_mut();
            match samplers.iter().position(|(sampler, _)| sampler == name) {
                Some(unit) => {
                    samplers[unit].1 = texture.id();
                    unit
                }
                None => {
                    samplers.push((name.to_owned(), texture.id()));
                    samplers.len() - 1
                }
            }
        };
        self.set(name, Uniform::Int(unit as i32))
    }

    fn set(&self, name: &str, value: Uniform) -> Result<(), ResourceError> {
        self.gl.set_uniform(self.id, name, value);
        check(self.gl.as_ref(), "glUniform")
    }
}

impl Bindable for Shader {
    fn bind(&self) -> Result<(), ResourceError> {
        let gl = self.gl.as_ref();
        gl.use_program(Some(self.id));
        check(gl, "glUseProgram")?;
        for (unit, (_, texture)) in self.samplers.borrow().iter().enumerate() {
            gl.bind_texture(unit as u32, Some(*texture));
            check(gl, "glBindTexture")?;
        }
        Ok(())
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        if self.gl.is_alive() {
            self.gl.delete_program(self.id);
        }
    }
}
