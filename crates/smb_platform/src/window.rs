use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Super Mario Bros".to_string(),
            width: 1600,
            height: 900,
            resizable: true,
        }
    }
}

impl PlatformConfig {
    pub fn logical_size(&self) -> LogicalSize<u32> {
        LogicalSize::new(self.width, self.height)
    }
}

/// Open the game window. The world is always laid out in the logical
/// `width` x `height` space; a resized window only scales it.
pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, String> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(config.logical_size())
        .with_resizable(config.resizable);

    let window = event_loop
        .create_window(attrs)
        .map_err(|e| format!("Failed to create window '{}': {e}", config.title))?;
    log::info!(
        "Window '{}' created at {}x{}",
        config.title,
        config.width,
        config.height
    );
    Ok(Arc::new(window))
}
