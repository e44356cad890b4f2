//! Super Mario Bros: main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Every frame inside
//! `RedrawRequested`:
//!
//!   1. `begin_frame()` banks the wall-clock delta and returns the whole
//!      10 ms steps it buys
//!   2. `GameWorld::step` runs once per owed step with the keys held at that
//!      moment, forwarding sound cues to the mixer
//!   3. the sprite mesh is rebuilt from the world when anything moved
//!   4. sprites are drawn, then the egui overlay is composited on top
//!
//! `about_to_wait` paces presentation with a `FrameLimiter` deadline so the
//! loop never busy-waits. The session ends only when the window is closed.

mod assets;
mod audio;
mod mesh;

use std::path::Path;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::{TextureCache, DEBUG_WHITE};
use audio::GameAudio;
use mesh::{build_world_mesh, count_texture_binds, DrawCall, FrameView};
use smb_core::animation::load_animation_file;
use smb_core::config::DEFAULT_CONFIG_PATH;
use smb_core::level::load_level_or_empty;
use smb_core::scene::{load_scene, SceneBackground, SceneFile};
use smb_core::walker::{default_walker_clip, walker_clip_from_file};
use smb_core::{
    CharacterSprites, FrameLimiter, GameConfig, GameWorld, InputState, Key, TimeState,
};
use smb_devtools::{DebugOverlay, OverlayStats};
use smb_platform::{create_window, PlatformConfig};
use smb_render::{Camera2D, GpuContext, SpritePipeline, SpriteVertex};

/// Sky colour used when no scene file is available.
const DEFAULT_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.871,
    g: 0.631,
    b: 0.631,
    a: 1.0,
};

/// Everything the running game owns. Built in `ApplicationHandler::resumed`
/// once a window exists.
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    limiter: FrameLimiter,
    input: InputState,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,

    world: GameWorld,
    audio: GameAudio,
    textures: TextureCache,
    background: Option<SceneBackground>,
    brick_texture: String,
    clear_color: wgpu::Color,
    show_gaps: bool,
    paused: bool,
    single_step_requested: bool,

    // The sprite mesh is rebuilt on the CPU after each simulated frame and
    // streamed into these buffers. They grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
    sprite_count: usize,
}

impl GameState {
    fn new(window: Arc<Window>, config: &GameConfig) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        let camera = Camera2D::new(config.window.width, config.window.height);

        let (world, scene) = load_world(config);
        let clear_color = scene
            .as_ref()
            .map(|scene| {
                let [r, g, b] = scene.clear_color_f64();
                wgpu::Color { r, g, b, a: 1.0 }
            })
            .unwrap_or(DEFAULT_CLEAR);

        let mut textures = TextureCache::new();
        let mut keys: Vec<String> = vec![config.assets.brick_texture.clone(), DEBUG_WHITE.into()];
        if let Some(scene) = &scene {
            keys.extend(scene.textures());
        }
        keys.extend(world.character().sprites().textures());
        for walker in world.walkers() {
            keys.extend(walker.clip().frames.iter().map(|f| f.texture.clone()));
        }
        textures.ensure_all(
            &gpu.device,
            &gpu.queue,
            &sprite_pipeline,
            keys.iter().map(String::as_str),
        );
        log::info!(
            "{} textures resident ({} placeholders)",
            textures.len(),
            textures.failed_count()
        );

        let audio = GameAudio::new(&config.assets);

        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time: TimeState::with_rate(config.window.target_fps),
            limiter: FrameLimiter::new(config.window.target_fps),
            input: InputState::new(),
            camera,
            sprite_pipeline,
            debug_overlay,
            world,
            audio,
            textures,
            background: scene.and_then(|scene| scene.background),
            brick_texture: config.assets.brick_texture.clone(),
            clear_color,
            show_gaps: false,
            paused: false,
            single_step_requested: false,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
            sprite_count: 0,
        };
        state.rebuild_mesh();
        Ok(state)
    }

    fn estimate_memory_mb(&self) -> f32 {
        let mut bytes = self.textures.memory_bytes();
        bytes += self.mesh_vertex_capacity * std::mem::size_of::<SpriteVertex>();
        bytes += self.mesh_index_capacity * std::mem::size_of::<u32>();
        bytes as f32 / (1024.0 * 1024.0)
    }

    fn overlay_stats(&self) -> OverlayStats {
        let character = self.world.character();
        let scroll = self.world.scroll();
        let running = scroll.running_position();
        let mut motion_label = character.state().label().to_string();
        if let Some(kind) = character.jump_kind() {
            motion_label.push_str(&format!(" ({kind:?})").to_lowercase());
        }
        OverlayStats {
            draw_calls: self.draw_calls.len() as u32,
            texture_binds: count_texture_binds(&self.draw_calls) as u32,
            sprite_count: self.sprite_count as u32,
            texture_count: self.textures.len() as u32,
            memory_estimate_mb: self.estimate_memory_mb(),
            motion_label,
            screen_pos: character.position().into(),
            running_pos: running.into(),
            scroll_offset: scroll.offset(),
            gap_units: self.world.layout().gaps().len(),
            level_length: scroll.total_length(),
            falling: character.is_falling(),
            audio_label: self.audio.status_label().to_string(),
            show_gaps: self.show_gaps,
            paused: self.paused,
        }
    }

    fn toggle_gaps(&mut self) {
        self.show_gaps = !self.show_gaps;
        log::info!("Gap overlay: {}", if self.show_gaps { "ON" } else { "OFF" });
    }

    fn rebuild_mesh(&mut self) {
        let view = FrameView {
            background: self.background.as_ref(),
            brick_texture: &self.brick_texture,
            viewport: self.camera.logical_size,
            show_gaps: self.show_gaps,
        };
        let mesh = build_world_mesh(&self.world, &view);

        // Anything the animation file introduced after start-up.
        for draw in &mesh.draw_calls {
            self.textures.ensure(
                &self.gpu.device,
                &self.gpu.queue,
                &self.sprite_pipeline,
                &draw.texture_key,
            );
        }

        self.ensure_mesh_capacity(mesh.vertices.len(), mesh.indices.len());
        self.sprite_count = mesh.quad_count();
        if !mesh.vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
        if !mesh.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
        self.draw_calls = mesh.draw_calls;
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    /// Run the fixed steps owed this frame. Returns true when the world moved.
    fn simulate(&mut self, steps: u32) -> bool {
        if steps == 0 {
            return false;
        }
        let mut changed = false;
        if self.input.is_just_pressed(Key::F3) {
            self.debug_overlay.toggle();
        }
        if self.input.is_just_pressed(Key::F4) {
            self.toggle_gaps();
            changed = true;
        }

        let dt = self.time.fixed_dt as f32;
        for _ in 0..steps {
            if self.paused && !self.single_step_requested {
                break;
            }
            self.single_step_requested = false;

            for cue in self.world.step(self.input.frame_input(), dt) {
                self.audio.play(cue);
            }
            changed = true;
        }
        changed
    }

    fn render(&mut self) {
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        // The panel still runs while hidden so egui keeps its input state.
        let stats = if self.debug_overlay.is_visible() {
            self.overlay_stats()
        } else {
            OverlayStats::default()
        };
        let overlay = self.debug_overlay.run(&self.window, &self.time, &stats);
        let overlay_actions = overlay.actions;

        if overlay_actions.toggle_pause {
            self.paused = !self.paused;
            log::info!(
                "Simulation {}",
                if self.paused { "PAUSED" } else { "RESUMED" }
            );
        }
        if overlay_actions.single_step {
            self.single_step_requested = true;
        }
        if overlay_actions.toggle_gaps {
            self.toggle_gaps();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut last_bound_texture_key: Option<&Arc<str>> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("World Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.draw_calls {
                let Some(texture) = self.textures.get(&draw.texture_key) else {
                    continue;
                };
                if last_bound_texture_key.is_none_or(|last| **last != *draw.texture_key) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound_texture_key = Some(&draw.texture_key);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.debug_overlay.render(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &view,
            &screen_descriptor,
            &overlay,
        );

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Level, scene decorations, walkers and Mario's frames. Every file is
/// optional: a missing one is logged and replaced by built-in defaults.
fn load_world(config: &GameConfig) -> (GameWorld, Option<SceneFile>) {
    let layout = load_level_or_empty(Path::new(&config.level.path), config.level.column_width);

    let scene = match load_scene(Path::new(&config.assets.scene)) {
        Ok(scene) => {
            log::info!(
                "Scene '{}' loaded: {} layers, {} walkers",
                scene.scene_id,
                scene.layers.len(),
                scene.walkers.len()
            );
            Some(scene)
        }
        Err(err) => {
            log::warn!("{err}. Running without decorations.");
            None
        }
    };

    let sprites = load_animation_file(Path::new(&config.assets.mario_animation))
        .and_then(|file| CharacterSprites::from_animation_file(&file))
        .unwrap_or_else(|err| {
            log::warn!("{err}. Using built-in Mario frames.");
            CharacterSprites::default()
        });
    let walker_clip = load_animation_file(Path::new(&config.assets.walker_animation))
        .and_then(|file| walker_clip_from_file(&file))
        .unwrap_or_else(|err| {
            log::warn!("{err}. Using built-in walker frames.");
            default_walker_clip()
        });

    let mut world = GameWorld::new(config.clone(), layout, sprites);
    if let Some(scene) = &scene {
        world = world
            .with_decorations(scene.decoration_layers())
            .with_walkers(scene.walker_specs(), &walker_clip);
    }
    (world, scene)
}

struct App {
    config: GameConfig,
    state: Option<GameState>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.config.window.title.clone(),
            width: self.config.window.width,
            height: self.config.window.height,
            ..PlatformConfig::default()
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let created = create_window(event_loop, &self.platform_config())
            .and_then(|window| GameState::new(window, &self.config));
        match created {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Start-up failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_mut() {
            if state.limiter.frame_due(std::time::Instant::now()) {
                state.window.request_redraw();
            }
            event_loop.set_control_flow(ControlFlow::WaitUntil(state.limiter.next_deadline()));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .on_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!(
                    "Close requested after {} steps, exiting.",
                    state.world.steps()
                );
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => state.input.release_all(),

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                let steps = state.time.begin_frame();
                if state.simulate(steps) {
                    state.rebuild_mesh();
                }
                state.render();

                // Edge-triggered keys survive frames that ran no step.
                if steps > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("World Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("World Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::Space => Some(Key::Space),
        KeyCode::ShiftLeft => Some(Key::LShift),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH));
    log::info!(
        "Super Mario Bros starting at {} steps per second",
        config.window.target_fps
    );

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn gameplay_keys_are_mapped() {
        assert_eq!(map_key(KeyCode::ArrowRight), Some(Key::Right));
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(map_key(KeyCode::Space), Some(Key::Space));
        assert_eq!(map_key(KeyCode::ShiftLeft), Some(Key::LShift));
        assert_eq!(map_key(KeyCode::KeyW), None);
        assert_eq!(map_key(KeyCode::Escape), None);
    }

    #[test]
    fn missing_files_still_produce_a_playable_world() {
        let mut config = GameConfig::default();
        let missing = std::env::temp_dir().join(format!("smb_missing_{}", std::process::id()));
        let missing = missing.to_string_lossy().into_owned();
        config.level.path = format!("{missing}/level.dat");
        config.assets.scene = format!("{missing}/scene.json");
        config.assets.mario_animation = format!("{missing}/mario.json");
        config.assets.walker_animation = format!("{missing}/gomma.json");

        let (world, scene) = load_world(&config);
        assert!(scene.is_none());
        assert!(world.layout().is_empty());
        assert!(world.walkers().is_empty());
        assert_eq!(world.character().position(), Vec2::new(390.0, 475.0));
    }
}
