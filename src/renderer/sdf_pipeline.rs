//! Raymarched cabinet renderer
//!
//! The whole machine is drawn by `sdf_shader.wgsl` as signed distance fields
//! over a fullscreen triangle. The CPU side only fills one uniform block from
//! the scene rig each frame.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::scene::{RolePose, SceneRig, SceneRole};
use crate::sim::{MachineState, RoundPhase};

/// Node names of the cabinet drawn by the shader, in draw order
pub const CABINET_NODES: [&str; 6] = ["cabinet", "pile", "track", "clawBase", "claw", "bear"];

/// Uniform block, laid out to match `Globals` in the shader (112 bytes)
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CabinetUniforms {
    resolution: [f32; 2],
    time: f32,
    phase: u32,
    // xyz + visibility flag in w
    grip: [f32; 4],
    carriage: [f32; 4],
    rail: [f32; 4],
    prize: [f32; 4],
    limits: [f32; 2],
    rest_height: f32,
    grab_height: f32,
    phase_progress: f32,
    _pad: [f32; 3],
}

impl CabinetUniforms {
    fn from_scene(state: &MachineState, rig: &SceneRig, size: (u32, u32), seconds: f32) -> Self {
        let slot = |role: SceneRole| -> [f32; 4] {
            let RolePose {
                translation,
                visible,
            } = rig.pose(role);
            translation.extend(if visible { 1.0 } else { 0.0 }).to_array()
        };

        Self {
            resolution: [size.0 as f32, size.1 as f32],
            time: seconds,
            phase: match state.phase {
                RoundPhase::Idle => 0,
                RoundPhase::CoinFlight => 1,
                RoundPhase::Lowering => 2,
                RoundPhase::Rising => 3,
                RoundPhase::Resolved => 4,
            },
            grip: slot(SceneRole::ClawGrip),
            carriage: slot(SceneRole::ClawBase),
            rail: slot(SceneRole::TrackRail),
            prize: slot(SceneRole::Prize),
            limits: [state.bounds.limit_x, state.bounds.limit_z],
            rest_height: state.rest_height,
            grab_height: state.grab_height,
            phase_progress: state.phase_progress(),
            _pad: [0.0; 3],
        }
    }
}

pub struct SdfRenderState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pub size: (u32, u32),
    // Date.now() at startup, in ms
    epoch_ms: f64,
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("cabinet_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let config = surface_config(&surface, adapter, width, height);
        surface.configure(&device, &config);

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cabinet_uniforms"),
            contents: bytemuck::bytes_of(&CabinetUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cabinet_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<CabinetUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cabinet_bindings"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        let pipeline = build_pipeline(&device, &layout, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniforms,
            bind_group,
            size: (width, height),
            epoch_ms: 0.0,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.epoch_ms = time;
    }

    /// Draw one frame. `time` is the animation-frame timestamp in ms.
    pub fn render(
        &mut self,
        state: &MachineState,
        rig: &SceneRig,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        let seconds = ((time - self.epoch_ms) / 1000.0) as f32;
        let block = CabinetUniforms::from_scene(state, rig, self.size, seconds);
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&block));

        let frame = self.surface.get_current_texture()?;
        let target = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cabinet_frame"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cabinet_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        // Every pixel is written by the shader
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit([encoder.finish()]);
        frame.present();
        Ok(())
    }
}

/// Prefer an sRGB format so the shader can output linear color
fn surface_config(
    surface: &wgpu::Surface<'static>,
    adapter: &wgpu::Adapter,
    width: u32,
    height: u32,
) -> wgpu::SurfaceConfiguration {
    let caps = surface.get_capabilities(adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .unwrap_or(caps.formats[0]);
    log::info!("Surface format {:?} (of {:?})", format, caps.formats);

    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("cabinet_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("cabinet_pipeline_layout"),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("cabinet_pipeline"),
        layout: Some(&pipeline_layout),
        // Fullscreen triangle from vertex_index, no buffers
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(format.into())],
            compilation_options: Default::default(),
        }),
        primitive: Default::default(),
        depth_stencil: None,
        multisample: Default::default(),
        multiview_mask: None,
        cache: None,
    })
}
