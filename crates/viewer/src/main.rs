//! Holocard: a holographic card hanging from a physics-driven lanyard band.
//!
//! Main binary: fixed-timestep physics loop + wgpu rendering.

mod config;
mod drag;
mod scene;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use holocard_core::srgb_to_linear;
use holocard_input::{InputSurface, PointerReader, PointerTracker};
use holocard_render::pipelines::band::BandUniform;
use holocard_render::texture::load_optional;
use holocard_render::{
    BandPipeline, GlowType, HoloClock, HoloPipeline, HoloUniforms, Ray, RenderContext,
    RibbonGeometry, SceneCamera, TextureInputs, TextureSet,
};

use config::ViewerConfig;
use scene::{Scene, CARD_HALF_EXTENTS};

/// Scene background (#393E46).
const BACKGROUND: [f32; 3] = [0x39 as f32 / 255.0, 0x3E as f32 / 255.0, 0x46 as f32 / 255.0];

#[derive(Parser, Debug, Clone)]
#[command(name = "holocard", version)]
struct Args {
    /// TOML-subset config file; missing file means defaults
    #[arg(long, default_value = "holocard.toml")]
    config: PathBuf,

    /// Card type for the glow color (water, fire, grass, ...)
    #[arg(long)]
    card_type: Option<String>,
}

/// GPU state, created once the window exists.
struct Gpu {
    ctx: RenderContext,
    band: BandPipeline,
    holo: HoloPipeline,
}

struct App {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    scene: Scene,
    camera: SceneCamera,
    ribbon: RibbonGeometry,
    input: InputSurface,
    // Keeps the pointer listener registered
    _tracker: PointerTracker,
    pointer: PointerReader,
    clock: HoloClock,
    uniforms: HoloUniforms,
    cursor: Option<(f64, f64)>,
    last_frame: Instant,
    frame_count: u64,
    steps_since_report: u32,
    fps_timer: Instant,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let mut scene = Scene::new(&config);
        if let Err(e) = scene.attach_card() {
            log::warn!("card not attached: {}", e);
        }

        let glow = match GlowType::from_name(&config.card_type) {
            Some(t) => t,
            None => {
                log::warn!("unknown card type {:?}, using water", config.card_type);
                GlowType::Water
            }
        };
        log::info!("card type {} (glow {})", glow.name(), glow.hex());
        let uniforms = HoloUniforms::new(glow.color(), config.opaque);

        let input = InputSurface::new(1.0, 1.0);
        let tracker = PointerTracker::mount(&input);
        let pointer = tracker.reader();

        Self {
            config,
            window: None,
            gpu: None,
            scene,
            camera: SceneCamera::new(),
            ribbon: RibbonGeometry::new(),
            input,
            _tracker: tracker,
            pointer,
            clock: HoloClock::new(),
            uniforms,
            cursor: None,
            last_frame: Instant::now(),
            frame_count: 0,
            steps_since_report: 0,
            fps_timer: Instant::now(),
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<Gpu> {
        let ctx = pollster::block_on(RenderContext::new(window))?;

        let [r, g, b] = srgb_to_linear(self.config.band_color);
        let mut band = BandPipeline::new(
            &ctx,
            BandUniform::new([r, g, b, 1.0], self.config.band_width_px),
        );
        let [w, h] = ctx.resolution();
        band.set_resolution(&ctx.queue, w, h);

        let max_dim = ctx.device.limits().max_texture_dimension_2d;
        let textures = TextureSet::resolve(TextureInputs {
            card: load_optional(self.config.card_texture.as_deref(), max_dim),
            holo: load_optional(self.config.holo_texture.as_deref(), max_dim),
            grain: load_optional(self.config.grain_texture.as_deref(), max_dim),
            noise: load_optional(self.config.noise_texture.as_deref(), max_dim),
            normal: load_optional(self.config.normal_texture.as_deref(), max_dim),
        });
        let card_size = [
            (CARD_HALF_EXTENTS[0] * 2.0) as f32,
            (CARD_HALF_EXTENTS[1] * 2.0) as f32,
        ];
        let holo = HoloPipeline::new(&ctx, &textures, &self.uniforms, card_size);

        Ok(Gpu { ctx, band, holo })
    }

    fn ray_at(&self, x: f64, y: f64) -> Option<Ray> {
        let (w, h) = self.input.size();
        self.camera.screen_ray(x as f32, y as f32, w as f32, h as f32)
    }

    /// Draw one frame. Only unrecoverable surface errors are returned.
    fn render(&mut self) -> Result<()> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };

        let view_proj = self.camera.view_projection(gpu.ctx.aspect());

        self.ribbon.set_points(self.scene.polyline());
        gpu.band.update_view_proj(&gpu.ctx.queue, view_proj);
        gpu.band.upload(&gpu.ctx.queue, &self.ribbon);

        let model = self.scene.card_model_matrix().unwrap_or(glam::Mat4::IDENTITY);
        self.uniforms.set_transforms(view_proj, model);
        self.uniforms
            .update_frame(self.clock.elapsed(), self.pointer.get());
        gpu.holo.update_uniforms(&gpu.ctx.queue, &self.uniforms);

        let output = match gpu.ctx.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.ctx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("out of GPU memory"));
            }
            Err(e) => {
                log::warn!("surface error: {:?}", e);
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b] = srgb_to_linear(BACKGROUND);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.ctx.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            gpu.band.draw(&mut pass);
            gpu.holo.draw(&mut pass);
        }

        gpu.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // Frame stats
        self.frame_count += 1;
        let elapsed = self.fps_timer.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            log::debug!(
                "FPS: {:.0} | physics steps/s: {:.0} | bodies: {} | dragging: {}",
                self.frame_count as f64 / elapsed,
                self.steps_since_report as f64 / elapsed,
                self.scene.world.body_count(),
                self.scene.is_dragging(),
            );
            self.frame_count = 0;
            self.steps_since_report = 0;
            self.fps_timer = Instant::now();
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Holocard")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let gpu = match self.init_gpu(window.clone()).context("GPU setup") {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("{:#}", e);
                event_loop.exit();
                return;
            }
        };

        let [w, h] = gpu.ctx.resolution();
        self.input.resize(w as f64, h as f64);
        self.gpu = Some(gpu);
        self.last_frame = Instant::now();
        window.request_redraw();
        self.window = Some(window);

        log::info!("holocard initialized");
        log::info!("Controls: LMB drag = move card, ESC = quit");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.ctx.resize(new_size.width, new_size.height);
                    let [w, h] = gpu.ctx.resolution();
                    gpu.band.set_resolution(&gpu.ctx.queue, w, h);
                }
                self.input
                    .resize(new_size.width as f64, new_size.height as f64);
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Key::Named(NamedKey::Escape) = logical_key.as_ref() {
                    event_loop.exit();
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x, position.y));
                self.input.dispatch_pointer_move(position.x, position.y);
                if self.scene.is_dragging() {
                    if let Some(ray) = self.ray_at(position.x, position.y) {
                        self.scene.drag_to(&ray);
                    }
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let ray = self.cursor.and_then(|(x, y)| self.ray_at(x, y));
                    if let Some(ray) = ray {
                        self.scene.begin_drag(&ray);
                    }
                }
                ElementState::Released => self.scene.end_drag(),
            },

            WindowEvent::RedrawRequested => {
                // Fixed timestep physics
                let now = Instant::now();
                let frame_time = now.duration_since(self.last_frame).as_secs_f64();
                self.last_frame = now;

                self.steps_since_report += self.scene.frame(frame_time);

                if let Err(e) = self.render() {
                    log::error!("{:#}", e);
                    event_loop.exit();
                    return;
                }

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = ViewerConfig::from_file(&args.config);
    if let Some(card_type) = args.card_type {
        config.card_type = card_type;
    }

    log::info!("starting holocard");

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("event loop")?;
    Ok(())
}
