use std::{path::PathBuf, sync::Arc, time};

use anyhow::Context;
use chip8::{Chip8, Key};
use clap::{command, Parser};
use log::{debug, error, info};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{self, EventLoop},
    platform::{
        pump_events::{EventLoopExtPumpEvents, PumpStatus},
        scancode::PhysicalKeyExtScancode,
    },
    window::Window,
};

const SCALE_FACTOR: u32 = 10;
const FRAME_INTERVAL: time::Duration = time::Duration::new(0, 1_000_000_000u32 / 60);

struct AppConfig {
    pub window: winit::window::WindowAttributes,
    pub args: Args,
}

impl AppConfig {
    pub fn new(args: Args) -> Self {
        Self {
            window: Window::default_attributes()
                .with_title("CHIP-8")
                .with_inner_size(LogicalSize::new(
                    (chip8::SCREEN_WIDTH as u32) * SCALE_FACTOR,
                    (chip8::SCREEN_HEIGHT as u32) * SCALE_FACTOR,
                ))
                .with_resizable(false),
            args,
        }
    }
}

struct State {
    pub(crate) chip8: Chip8,
    pub(crate) window: Arc<Window>,
    pub(crate) pixels: Pixels<'static>,
    pub(crate) tone: bool,
}

struct App {
    config: AppConfig,
    state: Option<State>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn init(&mut self, event_loop: &event_loop::ActiveEventLoop) -> anyhow::Result<()> {
        let mut chip8 = Chip8::new()
            .legacy_shift(self.config.args.legacy_shift)
            .ops_per_cycle(self.config.args.ops_per_cycle);

        if let Some(path) = self.config.args.load.to_owned() {
            chip8.load_rom_from_file(path)?;
        }

        debug!("{}", chip8);

        let window = event_loop
            .create_window(self.config.window.to_owned())
            .context("create window")?;
        let window = Arc::new(window);

        let window_size = window.inner_size();
        let surface_texture =
            SurfaceTexture::new(window_size.width, window_size.height, window.clone());

        let pixels = Pixels::new(
            chip8::SCREEN_WIDTH as u32,
            chip8::SCREEN_HEIGHT as u32,
            surface_texture,
        )
        .context("create pixels instance")?;

        let state = self.state.insert(State {
            chip8,
            window,
            pixels,
            tone: false,
        });

        App::render(state)?;
        state.window.request_redraw();

        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &event_loop::ActiveEventLoop) {
        if let Err(e) = self.init(event_loop) {
            error!("init failed: {:?}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Exiting...");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let Some(state) = self.state.as_mut() else {
                    return;
                };

                state.window.pre_present_notify();
                if let Err(e) = App::render(state) {
                    error!("render failed: {:?}", e);
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput {
                device_id: _,
                event,
                is_synthetic: _,
            } => {
                if let Some(scancode) = event.physical_key.to_scancode() {
                    let Some(state) = self.state.as_mut() else {
                        return;
                    };

                    let key = Key::from_scancode(scancode);
                    if event.state.is_pressed() {
                        if event.repeat {
                            return;
                        }
                        state.chip8.keydown(key);
                    } else {
                        state.chip8.keyup(key);
                    }
                }
            }
            _ => (),
        }
    }
}

impl App {
    pub fn render(state: &mut State) -> anyhow::Result<()> {
        let fb = state.chip8.fb();
        for (i, pixel) in state.pixels.frame_mut().chunks_exact_mut(4).enumerate() {
            let x = i % chip8::SCREEN_WIDTH;
            let y = i / chip8::SCREEN_WIDTH;

            let rgba = if fb[y][x] {
                [255, 255, 255, 255]
            } else {
                [0, 0, 0, 255]
            };

            pixel.copy_from_slice(&rgba);
        }

        state.pixels.render().context("render frame")?;
        Ok(())
    }

    /// Advance the machine by one tick. Returns false once the machine hit a fatal error.
    pub fn tick(state: &mut State) -> bool {
        if let Err(e) = state.chip8.tick() {
            error!("machine halted: {}", e);
            debug!("{}", state.chip8);
            return false;
        }

        let tone = state.chip8.is_sound_playing();
        if tone != state.tone {
            debug!("tone {}", if tone { "on" } else { "off" });
            state.tone = tone;
        }

        if state.chip8.is_fb_dirty() {
            state.window.request_redraw();
        }
        true
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "PATH", help = "Load ROM into memory", value_hint = clap::ValueHint::FilePath)]
    load: Option<PathBuf>,
    #[arg(long, help = "Shift V[y] instead of V[x] (COSMAC VIP behaviour)")]
    legacy_shift: bool,
    #[arg(long, default_value_t = chip8::DEFAULT_OPS_PER_CYCLE, help = "Instructions per 60 Hz tick")]
    ops_per_cycle: usize,
}

fn main() -> std::process::ExitCode {
    env_logger::init();

    let args = Args::parse();

    let mut event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("create event loop: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };
    let config = AppConfig::new(args);

    let mut app = App::new(config);

    loop {
        let timeout = Some(time::Duration::ZERO);
        let status = event_loop.pump_app_events(timeout, &mut app);

        if let PumpStatus::Exit(exit_code) = status {
            break std::process::ExitCode::from(exit_code as u8);
        }

        if let Some(state) = app.state.as_mut() {
            if !App::tick(state) {
                break std::process::ExitCode::FAILURE;
            }
        }

        std::thread::sleep(FRAME_INTERVAL);
    }
}
