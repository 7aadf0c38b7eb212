use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use tracing::info;
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

mod camera;
mod color;
mod geometry;

use splatview_data::{load_scene_bytes, SceneBuffer};
use splatview_sort::{SortConfig, SortWorker};

use crate::camera::{Camera, OrbitController};
use crate::geometry::{QuadVertex, QUAD_INDICES, QUAD_VERTICES};

#[derive(Parser)]
#[command(name = "splatview")]
#[command(about = "Depth-sorted Gaussian splat viewer")]
struct Cli {
    /// Scene to load: an http(s) URL or a local .splat file
    #[arg(default_value = "https://antimatter15.com/splat-data/train.splat")]
    source: String,

    /// Constant offset added to projected depths so keys stay positive
    #[arg(long, default_value = "10000.0")]
    depth_offset: f32,

    /// View-change threshold below which a resort is skipped
    #[arg(long, default_value = "0.01")]
    view_epsilon: f32,

    /// Window width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value = "720")]
    height: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    focal: [f32; 2],
    viewport: [f32; 2],
}

fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_instance_buffer(
    device: &wgpu::Device,
    label: &str,
    count: usize,
    components: usize,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (count.max(1) * components * std::mem::size_of::<f32>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Log a sample of a freshly decoded scene: the first records with their
/// nearest named color.
fn inspect_scene(scene: &SceneBuffer) {
    for (i, record) in scene.records().iter().take(2).enumerate() {
        let [x, y, z] = record.position;
        let [r, g, b, a] = record.color_f32();
        info!(
            "splat {i}: position ({x:.3}, {y:.3}, {z:.3}), color {} (alpha {a:.2})",
            color::nearest_common_color([r, g, b])
        );
    }
}

struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,

    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,

    global_buffer: wgpu::Buffer,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    center_buffer: wgpu::Buffer,
    scale_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    rotation_buffer: wgpu::Buffer,
    instance_count: u32,

    camera: Camera,
    controller: OrbitController,
    worker: SortWorker,
}

impl State {
    async fn new(window: Arc<Window>, scene: SceneBuffer, sort_config: SortConfig) -> Result<Self> {
        let size = window.inner_size();

        // 1) WGPU init
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapters found")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Splat Viewer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            "surface configured: {}x{} {:?}",
            config.width, config.height, surface_format
        );

        let (depth_texture, depth_view) = create_depth_texture(&device, config.width, config.height);

        // 2) Sort worker: the scene moves to it once, sorted frames come back
        let splat_count = scene.splat_count();
        let mut worker = SortWorker::spawn(sort_config);
        let generation = worker.upload_scene(scene);
        info!(generation, splats = splat_count, "scene handed to sort worker");

        // 3) GPU buffers
        let camera = Camera {
            eye: Vec3::new(0.0, 0.0, 6.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: config.width as f32 / config.height as f32,
            fovy: 45.0_f32.to_radians(),
            znear: 0.1,
            zfar: 1000.0,
        };
        let controller = OrbitController::new(6.0, 0.005);

        let focal = camera.focal_length(config.width as f32, config.height as f32);
        let globals = GlobalUniforms {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            focal: focal.to_array(),
            viewport: [config.width as f32, config.height as f32],
        };

        let global_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global Uniform Buffer"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let center_buffer = create_instance_buffer(&device, "Center Instance Buffer", splat_count, 3);
        let scale_buffer = create_instance_buffer(&device, "Scale Instance Buffer", splat_count, 3);
        let color_buffer = create_instance_buffer(&device, "Color Instance Buffer", splat_count, 4);
        let rotation_buffer =
            create_instance_buffer(&device, "Rotation Instance Buffer", splat_count, 4);

        // 4) Pipeline
        let shader = device.create_shader_module(wgpu::include_wgsl!("assets/shader.wgsl"));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Splat Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let [center_layout, scale_layout, color_layout, rotation_layout] =
            geometry::instance_layouts();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Splat Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    QuadVertex::layout(),
                    center_layout,
                    scale_layout,
                    color_layout,
                    rotation_layout,
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth_texture,
            depth_view,
            pipeline,
            bind_group,
            global_buffer,
            quad_vertex_buffer,
            quad_index_buffer,
            center_buffer,
            scale_buffer,
            color_buffer,
            rotation_buffer,
            instance_count: 0,
            camera,
            controller,
            worker,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        info!("resizing to {}x{}", new_size.width, new_size.height);
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.camera.aspect = self.size.width as f32 / self.size.height as f32;
        self.surface.configure(&self.device, &self.config);

        let (depth_texture, depth_view) =
            create_depth_texture(&self.device, self.config.width, self.config.height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    fn update(&mut self) {
        self.controller.update_camera(&mut self.camera);

        self.worker
            .submit_view(self.camera.build_view_projection_matrix());

        let focal = self
            .camera
            .focal_length(self.config.width as f32, self.config.height as f32);
        let globals = GlobalUniforms {
            view: self.camera.view_matrix().to_cols_array_2d(),
            proj: self.camera.projection_matrix().to_cols_array_2d(),
            focal: focal.to_array(),
            viewport: [self.config.width as f32, self.config.height as f32],
        };
        self.queue
            .write_buffer(&self.global_buffer, 0, bytemuck::bytes_of(&globals));

        if let Some(frame) = self.worker.try_latest_frame() {
            let splats = &frame.splats;
            self.queue
                .write_buffer(&self.center_buffer, 0, bytemuck::cast_slice(&splats.center));
            self.queue
                .write_buffer(&self.scale_buffer, 0, bytemuck::cast_slice(&splats.scale));
            self.queue
                .write_buffer(&self.color_buffer, 0, bytemuck::cast_slice(&splats.color));
            self.queue.write_buffer(
                &self.rotation_buffer,
                0,
                bytemuck::cast_slice(&splats.rotation),
            );
            self.instance_count = splats.splat_count() as u32;
        }
    }

    fn render(&mut self) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                anyhow::bail!("Surface out of memory");
            }
            Err(e) => {
                return Err(anyhow::anyhow!(e));
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.0,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            rpass.set_vertex_buffer(1, self.center_buffer.slice(..));
            rpass.set_vertex_buffer(2, self.scale_buffer.slice(..));
            rpass.set_vertex_buffer(3, self.color_buffer.slice(..));
            rpass.set_vertex_buffer(4, self.rotation_buffer.slice(..));
            rpass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..self.instance_count);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

struct App {
    scene: Option<SceneBuffer>,
    sort_config: SortConfig,
    width: u32,
    height: u32,
    window: Option<Arc<Window>>,
    state: Option<State>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(scene) = self.scene.take() else {
            return;
        };

        let attrs = Window::default_attributes()
            .with_title("Splat Viewer")
            .with_inner_size(PhysicalSize::new(self.width, self.height));

        let window = Arc::new(event_loop.create_window(attrs).unwrap());
        let state =
            pollster::block_on(State::new(Arc::clone(&window), scene, self.sort_config)).unwrap();

        self.window = Some(window);
        self.state = Some(state);

        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            state.controller.process_events(&event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(state) = &mut self.state {
                    state.update();
                    let _ = state.render();
                }

                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(state) = &mut self.state {
                state.controller.process_mouse(delta.0, delta.1);
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    let bytes = runtime
        .block_on(load_scene_bytes(&cli.source))
        .with_context(|| format!("failed to load scene from {}", cli.source))?;
    let scene = SceneBuffer::from_bytes(&bytes)?;
    info!(splats = scene.splat_count(), "scene decoded");
    inspect_scene(&scene);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        scene: Some(scene),
        sort_config: SortConfig {
            depth_offset: cli.depth_offset,
            view_epsilon: cli.view_epsilon,
        },
        width: cli.width,
        height: cli.height,
        window: None,
        state: None,
    };
    event_loop.run_app(&mut app)?;

    if let Some(state) = app.state {
        state.worker.shutdown();
    }

    Ok(())
}
