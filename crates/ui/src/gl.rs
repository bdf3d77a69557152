//! OpenGL rectangle pass: one vertex buffer, one `mat3` uniform, one draw.

#![allow(unsafe_code)]

use std::sync::{Arc, Mutex};

use eframe::egui_glow;
use eframe::glow::{self, HasContext};
use flamechart_core::render::{RectVertex, RectangleBackend};
use flamechart_protocol::AffineTransform;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlowError {
    #[error("failed to create {what}: {message}")]
    Create { what: &'static str, message: String },
    #[error("shader failed to compile: {0}")]
    Compile(String),
    #[error("program failed to link: {0}")]
    Link(String),
}

const VERTEX_SHADER: &str = r#"
    in vec2 a_position;
    in vec3 a_color;
    uniform mat3 u_config_space_to_ndc;
    out vec3 v_color;

    void main() {
        vec3 ndc = u_config_space_to_ndc * vec3(a_position, 1.0);
        gl_Position = vec4(ndc.xy, 0.0, 1.0);
        v_color = a_color;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    in vec3 v_color;
    out vec4 out_color;

    void main() {
        out_color = vec4(v_color, 1.0);
    }
"#;

fn shader_version() -> &'static str {
    if cfg!(target_arch = "wasm32") {
        "#version 300 es"
    } else {
        "#version 330"
    }
}

/// GPU objects for the rectangle pass.
struct RectanglePipeline {
    program: glow::Program,
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
}

impl RectanglePipeline {
    fn new(gl: &glow::Context) -> Result<Self, GlowError> {
        let create = |what: &'static str| move |message: String| GlowError::Create { what, message };

        unsafe {
            let program = gl.create_program().map_err(create("program"))?;

            let sources = [
                (glow::VERTEX_SHADER, VERTEX_SHADER),
                (glow::FRAGMENT_SHADER, FRAGMENT_SHADER),
            ];
            let mut shaders = Vec::with_capacity(sources.len());
            for (kind, source) in sources {
                let shader = gl.create_shader(kind).map_err(create("shader"))?;
                gl.shader_source(shader, &format!("{}\n{source}", shader_version()));
                gl.compile_shader(shader);
                if !gl.get_shader_compile_status(shader) {
                    let log = gl.get_shader_info_log(shader);
                    gl.delete_shader(shader);
                    gl.delete_program(program);
                    return Err(GlowError::Compile(log));
                }
                gl.attach_shader(program, shader);
                shaders.push(shader);
            }

            gl.bind_attrib_location(program, 0, "a_position");
            gl.bind_attrib_location(program, 1, "a_color");
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(GlowError::Link(log));
            }

            let vertex_array = gl.create_vertex_array().map_err(create("vertex array"))?;
            let vertex_buffer = gl.create_buffer().map_err(create("vertex buffer"))?;

            let stride = std::mem::size_of::<RectVertex>() as i32;
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 8);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            Ok(Self {
                program,
                vertex_array,
                vertex_buffer,
            })
        }
    }

    fn upload(&self, gl: &glow::Context, vertices: &[RectVertex]) {
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn paint(&self, gl: &glow::Context, matrix: &[f32; 9], vertex_count: i32) {
        unsafe {
            gl.use_program(Some(self.program));
            // Looked up per draw: web uniform locations are not `Send`.
            let location = gl.get_uniform_location(self.program, "u_config_space_to_ndc");
            gl.uniform_matrix_3_f32_slice(location.as_ref(), false, matrix);
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_arrays(glow::TRIANGLES, 0, vertex_count);
            gl.bind_vertex_array(None);
        }
    }

    fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vertex_array);
            gl.delete_buffer(self.vertex_buffer);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawCall {
    matrix: [f32; 9],
    vertex_count: i32,
}

/// [`RectangleBackend`] on the eframe GL context.
///
/// Uploads happen immediately during `update`. Draws are deferred: `draw`
/// records the call and [`paint_callback`](Self::paint_callback) hands it to
/// egui, which runs it with the GL viewport set to the chart's rectangle.
pub struct GlowBackend {
    gl: Arc<glow::Context>,
    pipeline: Arc<Mutex<RectanglePipeline>>,
    pending: Option<DrawCall>,
}

impl GlowBackend {
    pub fn new(gl: Arc<glow::Context>) -> Result<Self, GlowError> {
        let pipeline = RectanglePipeline::new(&gl)?;
        tracing::debug!("created GL rectangle pipeline");
        Ok(Self {
            gl,
            pipeline: Arc::new(Mutex::new(pipeline)),
            pending: None,
        })
    }

    /// The recorded draw as an egui paint callback covering `rect`.
    pub fn paint_callback(&mut self, rect: egui::Rect) -> Option<egui::PaintCallback> {
        let call = self.pending.take()?;
        let pipeline = Arc::clone(&self.pipeline);
        let callback = egui_glow::CallbackFn::new(move |_info, painter| {
            let pipeline = pipeline.lock().unwrap_or_else(|e| e.into_inner());
            pipeline.paint(painter.gl(), &call.matrix, call.vertex_count);
        });
        Some(egui::PaintCallback {
            rect,
            callback: Arc::new(callback),
        })
    }

    pub fn destroy(&self) {
        let pipeline = self.pipeline.lock().unwrap_or_else(|e| e.into_inner());
        pipeline.destroy(&self.gl);
    }
}

impl RectangleBackend for GlowBackend {
    type Error = GlowError;

    fn upload(&mut self, vertices: &[RectVertex]) -> Result<(), GlowError> {
        let pipeline = self.pipeline.lock().unwrap_or_else(|e| e.into_inner());
        pipeline.upload(&self.gl, vertices);
        Ok(())
    }

    fn draw(&mut self, config_space_to_ndc: &AffineTransform, vertex_count: usize) {
        let Ok(vertex_count) = i32::try_from(vertex_count) else {
            tracing::warn!(vertex_count, "too many vertices for one draw");
            return;
        };
        self.pending = Some(DrawCall {
            matrix: config_space_to_ndc.to_mat3_column_major(),
            vertex_count,
        });
    }
}
