//! egui developer panel drawn over the game, toggled with F3.
//!
//! A frame of overlay work is two calls. `run` lays out the panel and
//! tessellates it into an [`OverlayFrame`]; `render` uploads that frame and
//! draws it in its own load-op pass after the sprites. egui's renderer wants
//! a `RenderPass<'static>`, so that pass is detached with `forget_lifetime()`.
//!
//! Window events reach egui even while the panel is hidden so its input
//! state never goes stale.

use egui::{Color32, Ui};
use smb_core::time::TimeState;
use winit::event::WindowEvent;
use winit::window::Window;

/// Snapshot of the game shown in the panel.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub draw_calls: u32,
    /// Bind-group switches predicted for the draw list
    pub texture_binds: u32,
    pub sprite_count: u32,
    pub texture_count: u32,
    pub memory_estimate_mb: f32,
    /// Combined motion state, e.g. "running" or "jumping (high)"
    pub motion_label: String,
    pub screen_pos: (f32, f32),
    pub running_pos: (f32, f32),
    pub scroll_offset: f32,
    pub gap_units: usize,
    pub level_length: f32,
    pub falling: bool,
    pub audio_label: String,
    pub show_gaps: bool,
    pub paused: bool,
}

/// Buttons clicked this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance one fixed step while paused
    pub single_step: bool,
    pub toggle_gaps: bool,
}

/// Tessellated panel waiting to be drawn.
pub struct OverlayFrame {
    primitives: Vec<egui::ClippedPrimitive>,
    textures: egui::TexturesDelta,
    pub actions: OverlayActions,
}

pub struct DebugOverlay {
    ctx: egui::Context,
    winit_state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    visible: bool,
}

impl DebugOverlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let winit_state =
            egui_winit::State::new(ctx.clone(), ctx.viewport_id(), window, None, None, None);
        let renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);
        Self {
            ctx,
            winit_state,
            renderer,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    /// Returns true when egui wants the event for itself.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    pub fn run(&mut self, window: &Window, time: &TimeState, stats: &OverlayStats) -> OverlayFrame {
        let mut actions = OverlayActions::default();
        let visible = self.visible;
        let raw_input = self.winit_state.take_egui_input(window);
        let output = self.ctx.run(raw_input, |ctx| {
            if !visible {
                return;
            }
            egui::Window::new("Debug")
                .default_pos([10.0, 10.0])
                .resizable(false)
                .show(ctx, |ui| {
                    timing_section(ui, time);
                    ui.separator();
                    world_section(ui, stats);
                    ui.separator();
                    render_section(ui, stats);
                    ui.separator();
                    actions = control_section(ui, stats);
                });
        });

        self.winit_state
            .handle_platform_output(window, output.platform_output);
        OverlayFrame {
            primitives: self.ctx.tessellate(output.shapes, output.pixels_per_point),
            textures: output.textures_delta,
            actions,
        }
    }

    /// Upload and draw `frame` over whatever `target` already holds.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        screen: &egui_wgpu::ScreenDescriptor,
        frame: &OverlayFrame,
    ) {
        for (id, delta) in &frame.textures.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &frame.primitives, screen);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Overlay Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &frame.primitives, screen);
        }

        for id in &frame.textures.free {
            self.renderer.free_texture(id);
        }
    }
}

fn timing_section(ui: &mut Ui, time: &TimeState) {
    ui.label(format!(
        "FPS: {:.1} ({:.2} ms)",
        time.fps(),
        time.frame_time_ms()
    ));
    ui.label(format!(
        "Steps: {} this frame, {} total",
        time.steps_this_frame, time.fixed_step_count
    ));
}

fn world_section(ui: &mut Ui, stats: &OverlayStats) {
    ui.label(format!("Mario: {}", stats.motion_label));
    ui.label(format!(
        "Screen ({:.1}, {:.1})  running ({:.1}, {:.1})",
        stats.screen_pos.0, stats.screen_pos.1, stats.running_pos.0, stats.running_pos.1
    ));
    ui.label(format!(
        "Scrolled {:.0} of {:.0}, {} gap units",
        stats.scroll_offset, stats.level_length, stats.gap_units
    ));
    if stats.falling {
        ui.colored_label(Color32::LIGHT_RED, "FALLING");
    }
}

fn render_section(ui: &mut Ui, stats: &OverlayStats) {
    ui.label(format!(
        "{} sprites in {} draws ({} binds)",
        stats.sprite_count, stats.draw_calls, stats.texture_binds
    ));
    ui.label(format!(
        "{} textures, ~{:.1} MB",
        stats.texture_count, stats.memory_estimate_mb
    ));
    ui.label(&stats.audio_label);
}

fn control_section(ui: &mut Ui, stats: &OverlayStats) -> OverlayActions {
    let mut actions = OverlayActions::default();
    ui.horizontal(|ui| {
        let gaps = if stats.show_gaps { "Hide gaps" } else { "Show gaps" };
        actions.toggle_gaps = ui.button(gaps).clicked();
        let pause = if stats.paused { "Resume" } else { "Pause" };
        actions.toggle_pause = ui.button(pause).clicked();
        actions.single_step = stats.paused && ui.button("Step").clicked();
    });
    if stats.paused {
        ui.colored_label(Color32::YELLOW, "PAUSED");
    }
    actions
}
