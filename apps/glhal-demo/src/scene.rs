use anyhow::Result;
use glam::{IVec2, Vec2};
use glhal_common::{BlendMode, Image, Size};
use glhal_device::{
    Bindable, FrameBuffer, GraphicsDevice, Shader, Texture, Vertex, VertexBuffer,
};
use glhal_native::PrimitiveKind;

const CHECKER_SIZE: u32 = 8;
const TARGET_SIZE: Size = Size::new(256, 256);
const PROBE_SIZE: f32 = 96.0;

/// Everything the demo draws, created once against the device.
pub struct Scene {
    color: Shader,
    textured: Shader,
    quad: VertexBuffer<Vertex>,
    outline: VertexBuffer<Vertex>,
    checker: Texture,
    target: FrameBuffer,
    blend: BlendMode,
}

impl Scene {
    pub fn new(device: &GraphicsDevice) -> Result<Self> {
        let checker = device.create_texture_from_image(&checkerboard(CHECKER_SIZE))?;
        Ok(Self {
            color: device.create_shader("color")?,
            textured: device.create_shader("texture")?,
            quad: device.create_vertex_buffer(6)?,
            outline: device.create_vertex_buffer(8)?,
            checker,
            target: device.create_frame_buffer(TARGET_SIZE)?,
            blend: BlendMode::Alpha,
        })
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Step to the next blend mode, wrapping around.
    pub fn cycle_blend_mode(&mut self) {
        let at = BlendMode::ALL
            .iter()
            .position(|m| *m == self.blend)
            .unwrap_or(0);
        self.blend = BlendMode::ALL[(at + 1) % BlendMode::ALL.len()];
        tracing::info!("blend mode: {:?}", self.blend);
    }

    /// Render one frame: the checkerboard into the off-screen target, the
    /// target onto the window, then a blended probe at `pointer`.
    pub fn draw(&self, device: &GraphicsDevice, pointer: IVec2) -> Result<()> {
        let window = device.window_size()?;
        let window_extent = extent(window);

        self.target.bind()?;
        device.clear()?;
        device.set_blend_mode(BlendMode::None)?;
        self.textured.set_vec2("u_viewport", extent(TARGET_SIZE))?;
        self.textured.set_texture("u_texture", &self.checker)?;
        self.fill(device, &self.textured, Vec2::ZERO, extent(TARGET_SIZE))?;
        self.target.unbind()?;

        device.clear()?;
        self.textured.set_vec2("u_viewport", window_extent)?;
        self.textured.set_texture("u_texture", self.target.texture())?;
        self.fill(device, &self.textured, Vec2::ZERO, window_extent)?;

        let corner = pointer.as_vec2() - Vec2::splat(PROBE_SIZE / 2.0);
        device.set_blend_mode(self.blend)?;
        device.enable_scissor(
            corner.x as i32,
            corner.y as i32,
            PROBE_SIZE as i32,
            PROBE_SIZE as i32,
        )?;
        self.color.set_vec2("u_viewport", window_extent)?;
        self.color.set_vec4("u_color", [0.9, 0.4, 0.1, 0.6])?;
        self.fill(device, &self.color, corner, Vec2::splat(PROBE_SIZE))?;
        device.disable_scissor()?;

        device.set_blend_mode(BlendMode::None)?;
        device.set_line_width(2.0)?;
        self.color.set_vec4("u_color", [1.0, 1.0, 1.0, 1.0])?;
        self.outline
            .set_data(&outline_vertices(corner, Vec2::splat(PROBE_SIZE)), 0)?;
        self.color.bind()?;
        self.outline.bind()?;
        device.draw_primitives(PrimitiveKind::Lines, 0, 8)?;
        Ok(())
    }

    fn fill(&self, device: &GraphicsDevice, shader: &Shader, origin: Vec2, size: Vec2) -> Result<()> {
        self.quad.set_data(&quad_vertices(origin, size), 0)?;
        shader.bind()?;
        self.quad.bind()?;
        device.draw_primitives(PrimitiveKind::Triangles, 0, 6)?;
        Ok(())
    }
}

fn extent(size: Size) -> Vec2 {
    Vec2::new(size.width as f32, size.height as f32)
}

/// Two triangles covering `size` pixels at `origin`.
fn quad_vertices(origin: Vec2, size: Vec2) -> [Vertex; 6] {
    let (l, t) = (origin.x, origin.y);
    let (r, b) = (origin.x + size.x, origin.y + size.y);
    [
        Vertex::new(l, t, 0.0, 1.0),
        Vertex::new(r, t, 1.0, 1.0),
        Vertex::new(r, b, 1.0, 0.0),
        Vertex::new(l, t, 0.0, 1.0),
        Vertex::new(r, b, 1.0, 0.0),
        Vertex::new(l, b, 0.0, 0.0),
    ]
}

fn outline_vertices(origin: Vec2, size: Vec2) -> [Vertex; 8] {
    let (l, t) = (origin.x, origin.y);
    let (r, b) = (origin.x + size.x, origin.y + size.y);
    let v = |x, y| Vertex::new(x, y, 0.0, 0.0);
    [
        v(l, t),
        v(r, t),
        v(r, t),
        v(r, b),
        v(r, b),
        v(l, b),
        v(l, b),
        v(l, t),
    ]
}

/// `cells` x `cells` BGRA checkerboard, one pixel per cell.
fn checkerboard(cells: u32) -> Image {
    let mut image = Image::new(Size::new(cells, cells));
    let stride = image.stride();
    for (y, row) in image.data_mut().chunks_exact_mut(stride).enumerate() {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let shade = if (x + y) % 2 == 0 { 0xE0 } else { 0x30 };
            px.copy_from_slice(&[shade, shade, shade, 0xFF]);
        }
    }
    image
}

/// ARGB crosshair cursor, `size` pixels square with the hotspot centered.
pub fn crosshair(size: u32) -> (Size, Vec<u8>, IVec2) {
    let mid = size / 2;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let on = x == mid || y == mid;
            pixels.extend_from_slice(if on {
                &[0xFF, 0xFF, 0xFF, 0xFF]
            } else {
                &[0, 0, 0, 0]
            });
        }
    }
    (Size::new(size, size), pixels, IVec2::splat(mid as i32))
}
