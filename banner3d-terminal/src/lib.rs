//! Terminal front-end for the cube banner
use banner3d_core::{Banner, BannerConfig, Font, Framebuffer};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod cli;
pub mod logging;
pub mod renderer;

pub use renderer::AsciiRenderer;

/// Orbit step for one key press, in radians
const KEY_ROTATE_STEP: f32 = 0.1;
/// Pan step for one key press, in terminal cells
const KEY_PAN_STEP: f32 = 4.0;

/// Stops a running [`TerminalApp`] from anywhere, e.g. a signal handler.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the render loop to exit after the current frame. Calling it
    /// again has no effect.
    pub fn destroy(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Puts the terminal back into cooked mode when dropped, including on early
/// returns and panics.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal(&mut stdout());
    }
}

/// Undo everything [`TerminalApp::run`] switched on. Each step runs even if
/// an earlier one fails.
fn restore_terminal<W: Write>(writer: &mut W) {
    if let Err(err) = execute!(
        writer,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show
    ) {
        log::warn!("failed to reset terminal screen: {err}");
    }
    if let Err(err) = terminal::disable_raw_mode() {
        log::warn!("failed to leave raw mode: {err}");
    }
    log::debug!("terminal restored");
}

/// Main application struct for the terminal banner
pub struct TerminalApp {
    banner: Banner,
    framebuffer: Framebuffer,
    renderer: AsciiRenderer,
    stop: StopHandle,
    target_frame_time: Duration,
    drag: Option<(MouseButton, u16, u16)>,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Build the banner to fill the current terminal, minus the status line.
    pub fn new(config: &BannerConfig, font: &Font, fps: u32) -> anyhow::Result<Self> {
        let (width, height) = terminal::size()?;
        Self::with_size(config, font, fps, width, height)
    }

    pub fn with_size(
        config: &BannerConfig,
        font: &Font,
        fps: u32,
        width: u16,
        height: u16,
    ) -> anyhow::Result<Self> {
        let (fb_width, fb_height) = viewport(width, height);
        let banner = Banner::with_font(config, font, fb_width, fb_height)?;
        log::info!(
            "banner with {} lit cells in a {}x{} terminal",
            banner.lit_cells().len(),
            width,
            height
        );

        Ok(Self {
            banner,
            framebuffer: Framebuffer::new(fb_width, fb_height),
            renderer: AsciiRenderer::new(1),
            stop: StopHandle::default(),
            target_frame_time: Duration::from_millis(1000 / u64::from(fps.max(1))),
            drag: None,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let _restore = TerminalGuard;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;

        self.main_loop()
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while !self.stop.is_stopped() {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            if self.banner.frame(&mut self.framebuffer) {
                self.render()?;
            }

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
                self.draw_status()?;
            }
        }

        Ok(())
    }

    /// Apply one terminal event to the controls.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => {
                let (fb_width, fb_height) = viewport(width, height);
                self.banner.resize(&mut self.framebuffer, fb_width, fb_height);
                log::debug!("resized to {}x{}", width, height);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
        if quit {
            self.stop.destroy();
            return;
        }

        let (width, height) = (self.framebuffer.width(), self.framebuffer.height());
        let Banner {
            camera, controls, ..
        } = &mut self.banner;
        let Some(controls) = controls.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Char('w') | KeyCode::Up => controls.rotate_up(KEY_ROTATE_STEP),
            KeyCode::Char('s') | KeyCode::Down => controls.rotate_up(-KEY_ROTATE_STEP),
            KeyCode::Char('a') | KeyCode::Left => controls.rotate_left(KEY_ROTATE_STEP),
            KeyCode::Char('d') | KeyCode::Right => controls.rotate_left(-KEY_ROTATE_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let scale = controls.zoom_scale();
                controls.dolly_in(camera, scale);
            }
            KeyCode::Char('-') => {
                let scale = controls.zoom_scale();
                controls.dolly_out(camera, scale);
            }
            KeyCode::Char('i') => controls.pan_drag(0.0, KEY_PAN_STEP, camera, width, height),
            KeyCode::Char('k') => controls.pan_drag(0.0, -KEY_PAN_STEP, camera, width, height),
            KeyCode::Char('j') => controls.pan_drag(KEY_PAN_STEP, 0.0, camera, width, height),
            KeyCode::Char('l') => controls.pan_drag(-KEY_PAN_STEP, 0.0, camera, width, height),
            KeyCode::Char('r') => {
                controls.reset(camera);
                self.banner.request_redraw();
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (width, height) = (self.framebuffer.width(), self.framebuffer.height());
        let Banner {
            camera, controls, ..
        } = &mut self.banner;
        let Some(controls) = controls.as_mut() else {
            return;
        };

        match mouse.kind {
            MouseEventKind::Down(button) => self.drag = Some((button, mouse.column, mouse.row)),
            MouseEventKind::Up(_) => self.drag = None,
            MouseEventKind::Drag(button) => {
                if let Some((start_button, x, y)) = self.drag {
                    if start_button == button {
                        let dx = f32::from(mouse.column) - f32::from(x);
                        let dy = f32::from(mouse.row) - f32::from(y);
                        match button {
                            MouseButton::Left => controls.rotate_drag(dx, dy, height),
                            _ => controls.pan_drag(dx, dy, camera, width, height),
                        }
                    }
                }
                self.drag = Some((button, mouse.column, mouse.row));
            }
            MouseEventKind::ScrollUp => controls.zoom_wheel(camera, -1.0),
            MouseEventKind::ScrollDown => controls.zoom_wheel(camera, 1.0),
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        self.renderer.draw(&self.framebuffer, &mut stdout)?;
        self.draw_status()
    }

    fn draw_status(&self) -> io::Result<()> {
        let mut stdout = stdout();
        let stats = self.banner.last_stats();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "banner3d | FPS: {:.1} | {} tris | WASD/Arrows=Orbit +/-=Zoom IJKL=Pan R=Reset Q=Quit",
                self.fps, stats.triangles
            )),
            ResetColor
        )?;
        stdout.flush()
    }
}

/// Framebuffer size for a terminal, leaving the first row for the status line.
fn viewport(width: u16, height: u16) -> (u32, u32) {
    (u32::from(width.max(1)), u32::from(height.saturating_sub(1).max(1)))
}
