mod scene;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::IVec2;
use glhal_common::{Size, WindowMode};
use glhal_device::{DeviceConfig, GraphicsDevice};
use glhal_input::{InputHandler, Key, KeyEventKind, KeyInput, MouseInput};
use glhal_native_winit::WinitPlatform;
use scene::Scene;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

const FRAME_TIME: Duration = Duration::from_millis(16);

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Windowed,
    Fullscreen,
    PseudoFullscreen,
}

impl From<Mode> for WindowMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Windowed => WindowMode::Windowed,
            Mode::Fullscreen => WindowMode::Fullscreen,
            Mode::PseudoFullscreen => WindowMode::PseudoFullscreen,
        }
    }
}

#[derive(Parser)]
#[command(name = "glhal-demo", about = "Open a graphics device and draw a test scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON device configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window width, 0 for the desktop width
    #[arg(long)]
    width: Option<u32>,

    /// Window height, 0 for the desktop height
    #[arg(long)]
    height: Option<u32>,

    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Confine the mouse to the window
    #[arg(long)]
    lock_mouse: bool,

    /// Stop after this many frames instead of waiting for quit
    #[arg(long)]
    frames: Option<u64>,

    /// Save the last frame as a PNG
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Also write graphics diagnostics to this file
    #[arg(long)]
    graphics_log: Option<PathBuf>,
}

impl Cli {
    fn device_config(&self) -> Result<DeviceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => DeviceConfig {
                title: "glhal demo".into(),
                ..DeviceConfig::default()
            },
        };
        if let Some(width) = self.width {
            config.size.width = width;
        }
        if let Some(height) = self.height {
            config.size.height = height;
        }
        if let Some(mode) = self.mode {
            config.window_mode = mode.into();
        }
        config.lock_mouse |= self.lock_mouse;
        Ok(config)
    }
}

fn init_logging(verbose: bool, graphics_log: Option<&Path>) -> Result<()> {
    let filter = if verbose { "debug" } else { "info" };
    let console = tracing_subscriber::fmt::layer().with_filter(EnvFilter::new(filter));
    let graphics = match graphics_log {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(Targets::new().with_target("graphics", Level::TRACE));
            Some(layer)
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(console)
        .with(graphics)
        .init();
    Ok(())
}

/// What the frame loop acts on after pumping input.
#[derive(Default)]
struct DemoInput {
    quit: bool,
    pointer: IVec2,
    cycle_blend: bool,
    toggle_grab: bool,
    copy: bool,
    paste: bool,
}

impl InputHandler for DemoInput {
    fn on_key(&mut self, input: KeyInput) {
        if input.event != KeyEventKind::Down || input.repeat {
            return;
        }
        match input.key {
            Key::Escape => self.quit = true,
            Key::Space => self.cycle_blend = true,
            Key::Char('g') => self.toggle_grab = true,
            Key::Char('c') if input.modifiers.ctrl => self.copy = true,
            Key::Char('v') if input.modifiers.ctrl => self.paste = true,
            _ => {}
        }
    }

    fn on_mouse(&mut self, input: MouseInput) {
        self.pointer = input.location;
    }

    fn on_focus_changed(&mut self, focused: bool) {
        tracing::debug!(focused, "focus changed");
    }

    fn on_resize(&mut self, size: Size) {
        tracing::info!("window resized to {size}");
    }

    fn on_quit(&mut self) {
        self.quit = true;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.graphics_log.as_deref())?;

    let config = cli.device_config()?;
    let mut device = GraphicsDevice::new(WinitPlatform::new(), &config)?;
    let result = run(&mut device, &cli);
    device.dispose()?;
    result
}

fn run(device: &mut GraphicsDevice, cli: &Cli) -> Result<()> {
    let mut scene = Scene::new(device)?;
    let (size, pixels, hotspot) = scene::crosshair(17);
    let cursor = device.create_hardware_cursor("crosshair", size, &pixels, hotspot)?;
    device.set_hardware_cursor(Some(&cursor))?;

    let mut input = DemoInput::default();
    let mut grabbed = false;
    let mut frame = 0u64;
    while !input.quit && cli.frames.is_none_or(|limit| frame < limit) {
        let started = Instant::now();

        input.cycle_blend = false;
        input.toggle_grab = false;
        input.copy = false;
        input.paste = false;
        device.pump_input(&mut input)?;

        if input.cycle_blend {
            scene.cycle_blend_mode();
        }
        if input.toggle_grab {
            grabbed = !grabbed;
            if grabbed {
                device.grab_window_mouse_focus()?;
            } else {
                device.release_window_mouse_focus()?;
            }
        }
        if input.copy {
            let text = format!("blend mode {:?}", scene.blend_mode());
            if !device.set_clipboard_text(&text)? {
                tracing::warn!("clipboard unavailable");
            }
        }
        if input.paste {
            match device.get_clipboard_text()? {
                Some(text) => tracing::info!("clipboard: {text:?}"),
                None => tracing::info!("clipboard is empty"),
            }
        }

        scene.draw(device, input.pointer)?;
        if let Some(path) = &cli.screenshot {
            if cli.frames.is_some_and(|limit| frame + 1 == limit) {
                save_screenshot(device, path)?;
            }
        }
        device.present()?;
        device.end_frame()?;
        frame += 1;

        if let Some(rest) = FRAME_TIME.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    if let Some(path) = &cli.screenshot {
        if cli.frames.is_none() {
            scene.draw(device, input.pointer)?;
            save_screenshot(device, path)?;
        }
    }
    tracing::info!("rendered {frame} frames");
    Ok(())
}

fn save_screenshot(device: &GraphicsDevice, path: &Path) -> Result<()> {
    let image = device.take_screenshot()?;
    image::save_buffer(
        path,
        &image.to_rgba(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )
    .with_context(|| format!("saving {}", path.display()))?;
    tracing::info!("saved {} screenshot to {}", image.size(), path.display());
    Ok(())
}
