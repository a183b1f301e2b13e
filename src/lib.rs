// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

// External crate imports
use bon::Builder;
use pixels::{Pixels, SurfaceTexture};
use rusttype::{Font, Scale};
use thiserror::Error;
use tracing::{debug, info, warn};

// Standard library imports
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

// ============================================================================
// COLOR & PAINT
// ============================================================================

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const GREEN: Color = Color::new(0x00, 0x80, 0x00);
    pub const RED: Color = Color::new(0xff, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

/// Fill paint for the dial ring: a solid color, or a horizontal gradient
/// interpolated left-to-right across the draw region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Color),
    HorizontalGradient { start: Color, end: Color },
}

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Command enum for type-safe gauge updates from another thread
#[derive(Debug, Clone)]
pub enum GaugeCommand {
    SetFillValue(i32),
    SetMaxValue(i32),
    SetGradientFill(bool),
}

/// Errors surfaced by the window host
#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("pixel surface error: {0}")]
    Surface(#[from] pixels::Error),
}

/// Main gauge widget struct - the primary public interface
#[derive(Debug, Clone)]
pub struct RadialGauge {
    config: GaugeConfig,
}

/// Gauge configuration.
///
/// `max_value` is expected to be >= 1 and `steps` >= 4; nothing enforces
/// this at assignment time. Out-of-range `fill_value` is clamped when the
/// gauge is drawn, never when it is set.
#[derive(Debug, Clone, Builder)]
pub struct GaugeConfig {
    pub max_value: i32,
    #[builder(default = 48)]
    pub steps: i32,
    #[builder(default = 1.0)]
    pub gauge_thickness: f32,
    #[builder(default = 0)]
    pub fill_value: i32,
    #[builder(default = 0)]
    pub needle_thickness: i32,
    #[builder(default = Color::BLACK)]
    pub needle_color: Color,
    #[builder(default = Color::WHITE)]
    pub middle_area_color: Color,
    #[builder(default = false)]
    pub gradient_fill: bool,

    // Window configuration
    #[builder(default = "Radial Gauge".to_string())]
    pub title: String,
    #[builder(default = 400)]
    pub window_width: usize,
    #[builder(default = 400)]
    pub window_height: usize,
    #[builder(default = 60.0)]
    pub max_framerate: f64,

    // Font configuration. Text commands are skipped when empty.
    #[builder(default = &[])]
    pub font_data: &'static [u8],
}

impl RadialGauge {
    pub fn new(config: GaugeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GaugeConfig {
        &self.config
    }

    /// Set the displayed value. Stored as given; clamping happens at draw
    /// time only.
    pub fn set_fill_value(&mut self, value: i32) {
        self.config.fill_value = value;
    }

    pub fn set_max_value(&mut self, value: i32) {
        self.config.max_value = value;
    }

    pub fn set_gradient_fill(&mut self, on: bool) {
        self.config.gradient_fill = on;
    }

    /// Open a window and render the gauge until the window is closed.
    pub fn show(&mut self) -> Result<(), GaugeError> {
        self.run_window(None)
    }

    /// Open a window and render the gauge, draining `receiver` for value
    /// updates at the top of every redraw.
    pub fn show_with_commands(
        &mut self,
        receiver: Receiver<GaugeCommand>,
    ) -> Result<(), GaugeError> {
        self.run_window(Some(receiver))
    }

    fn run_window(&self, receiver: Option<Receiver<GaugeCommand>>) -> Result<(), GaugeError> {
        let mut config = self.config.clone();

        if config.font_data.is_empty() {
            warn!("no font data configured; readout and tick labels will be skipped");
        }
        let font = Font::try_from_vec(config.font_data.to_vec());

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)?;

        let window = std::sync::Arc::new(window);
        let window_clone = window.clone();

        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let frame_duration = std::time::Duration::from_secs_f64(1.0 / config.max_framerate);
        let mut last_frame = Instant::now();

        info!(title = %config.title, "opening gauge window");

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        let _ = pixels.resize_buffer(new_size.width, new_size.height);
                        let _ = pixels.resize_surface(new_size.width, new_size.height);
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(ref receiver) = receiver {
                            apply_commands(&mut config, receiver);
                        }

                        let frame = pixels.frame_mut();
                        let mut canvas = Canvas::new(frame, fb_width, fb_height);
                        canvas.clear(Color::WHITE);

                        let region = Region::new(0.0, 0.0, fb_width as f32, fb_height as f32);
                        let scene = build_gauge_scene(region, &config);
                        scene.render(&mut canvas, region, font.as_ref());

                        if let Err(err) = pixels.render() {
                            warn!(%err, "surface present failed");
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if last_frame.elapsed() >= frame_duration {
                        window_clone.request_redraw();
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

/// Drain every pending command without blocking.
fn apply_commands(config: &mut GaugeConfig, receiver: &Receiver<GaugeCommand>) {
    loop {
        match receiver.try_recv() {
            Ok(GaugeCommand::SetFillValue(value)) => config.fill_value = value,
            Ok(GaugeCommand::SetMaxValue(value)) => config.max_value = value,
            Ok(GaugeCommand::SetGradientFill(on)) => config.gradient_fill = on,
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                debug!("command channel disconnected");
                break;
            }
        }
    }
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

/// Rectangular draw region handed in by the host for each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    fn limiting_dim(&self) -> f32 {
        if self.width < self.height {
            self.width
        } else {
            self.height
        }
    }

    fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// RGBA framebuffer wrapper the scene rasterizes into.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
    clip: Option<Vec<(f32, f32)>>,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        Self {
            frame,
            width,
            height,
            clip: None,
        }
    }

    /// Fill the whole frame, ignoring any clip polygon.
    pub fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }
}

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Install an even-odd clip polygon; later commands only touch pixels
    /// inside it.
    SetClip { polygon: Vec<(f32, f32)> },
    FillCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        paint: Paint,
    },
    StrokeCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        thickness: f32,
        color: Color,
    },
    Line {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        thickness: f32,
        color: Color,
    },
    /// Text centered on (x, y).
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        color: Color,
    },
}

/// Ordered list of drawing commands for one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Rasterize every command in order. `region` gives gradient paints
    /// their horizontal extent. Text commands are skipped when `font` is
    /// `None`.
    pub fn render(&self, canvas: &mut Canvas, region: Region, font: Option<&Font<'_>>) {
        for command in &self.commands {
            match command {
                DrawCommand::SetClip { polygon } => {
                    canvas.clip = Some(polygon.clone());
                }
                DrawCommand::FillCircle {
                    cx,
                    cy,
                    radius,
                    paint,
                } => {
                    fill_circle(canvas, *cx, *cy, *radius, *paint, region);
                }
                DrawCommand::StrokeCircle {
                    cx,
                    cy,
                    radius,
                    thickness,
                    color,
                } => {
                    stroke_circle(canvas, *cx, *cy, *radius, *thickness, *color);
                }
                DrawCommand::Line {
                    x0,
                    y0,
                    x1,
                    y1,
                    thickness,
                    color,
                } => {
                    draw_thick_line_aa(
                        canvas,
                        x0.round() as i32,
                        y0.round() as i32,
                        x1.round() as i32,
                        y1.round() as i32,
                        *thickness,
                        *color,
                    );
                }
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font_size,
                    color,
                } => {
                    if let Some(font) = font {
                        draw_text(
                            canvas,
                            *x as i32,
                            *y as i32,
                            text,
                            font,
                            Scale::uniform(*font_size),
                            *color,
                        );
                    } else {
                        debug!(text = %text, "skipping text command, no font loaded");
                    }
                }
            }
        }
    }
}

// ============================================================================
// GAUGE GEOMETRY
// ============================================================================

// The clip wedge reuses the original widget's fixed pixel offsets. They do
// not scale with the region; kept here so the whole defect lives in one
// place.
const CLIP_WEDGE_SIDE_INSET: f32 = 5.0;
const CLIP_WEDGE_TOP_OVERHANG: f32 = 10.0;

// The bottom corners used to measure the empty wedge sit 3 units below the
// region.
const DIAL_CORNER_DROP: f32 = 3.0;

const OUTER_RING_STROKE_WIDTH: f32 = 2.0;
const FACE_STROKE_WIDTH: f32 = 3.0;
const NEEDLE_STROKE_WIDTH: f32 = 3.0;
const TICK_STROKE_WIDTH: f32 = 3.0;
const NEEDLE_REACH_FACTOR: f64 = 1.5;
const PIVOT_RADIUS_DIVISOR: f32 = 30.0;
const TICK_LABEL_RADIUS_FACTOR: f64 = 1.075;
const READOUT_OFFSET_Y: f32 = 50.0;
const READOUT_FONT_SIZE: f32 = 25.0;
const TICK_LABEL_FONT_SIZE: f32 = 10.0;

/// Signed angle in degrees between the vectors p1->p2 and p1->p3.
pub fn angle_between_degrees(p1: (f32, f32), p2: (f32, f32), p3: (f32, f32)) -> f64 {
    let angle = f64::atan2((p2.1 - p1.1) as f64, (p2.0 - p1.0) as f64)
        - f64::atan2((p3.1 - p1.1) as f64, (p3.0 - p1.0) as f64);
    angle.to_degrees()
}

/// Fraction that maps a full 360 degree sweep onto the visible dial arc for
/// the given region. The empty wedge is measured from the region's center
/// to its two dropped bottom corners.
pub fn removed_circle_percentage(region: Region) -> f64 {
    let top = (region.width / 2.0, region.height / 2.0);
    let bottom_left = (region.x, region.height + DIAL_CORNER_DROP);
    let bottom_right = (region.width, region.height + DIAL_CORNER_DROP);
    let empty_angle = angle_between_degrees(top, bottom_left, bottom_right);
    (180.0 - empty_angle / 2.0) / 360.0
}

/// Map a fill amount onto a needle sweep angle in degrees.
///
/// Normalizes to [-1, 1], converts with the widget's historical scaling
/// (the 100 factor ties the sweep width to the magnitude of `max_value`),
/// then compresses onto the visible arc. Callers must not "correct" the
/// formula; rendered dials are pinned against it.
pub fn fill_sweep_degrees(fill_amount: f64, max_value: f64, removed_circle_percentage: f64) -> f64 {
    let zero_pos = (fill_amount / max_value) * 2.0 - 1.0;
    let degrees = (zero_pos * 100.0) * 360.0 / max_value;
    degrees * removed_circle_percentage
}

/// Point on the dial at `radius` from the center, angle measured clockwise
/// from straight up.
pub fn dial_point(cx: f32, cy: f32, radius: f64, angle_radians: f64) -> (f32, f32) {
    (
        (radius * angle_radians.sin()) as f32 + cx,
        (-radius * angle_radians.cos()) as f32 + cy,
    )
}

/// Fraction of the outer radius where a tick's inner end sits.
///
/// The conditional order is load-bearing: the midpoint check shadows the
/// quarter check, and index zero overrides both.
fn tick_size_factor(i: i32, steps: i32) -> f64 {
    let mut tick_size = 0.9;

    if i == steps / 2 {
        tick_size = 0.7;
    } else if i % (steps / 4) == 0 {
        tick_size = 0.8;
    }

    if i == 0 {
        tick_size = 1.0;
    }

    tick_size
}

// ============================================================================
// SCENE COMPOSITION
// ============================================================================

/// Build the full command list for one gauge frame.
///
/// Command order matches the widget's draw order: numeric readout (before
/// the clip, so it is never cut by the wedge), clip wedge, outer ring,
/// face disc, needle pivot and line, then tick marks with labels.
pub fn build_gauge_scene(region: Region, config: &GaugeConfig) -> Scene {
    let mut scene = Scene::new();

    let limiting_dim = region.limiting_dim();
    let (cx, cy) = region.center();

    let ring_paint = if config.gradient_fill {
        Paint::HorizontalGradient {
            start: Color::GREEN,
            end: Color::RED,
        }
    } else {
        Paint::Solid(Color::GREEN)
    };

    // Readout shows the value as handed in; only the needle uses the
    // clamped one.
    scene.push(DrawCommand::Text {
        x: cx,
        y: cy + READOUT_OFFSET_Y,
        text: config.fill_value.to_string(),
        font_size: READOUT_FONT_SIZE,
        color: Color::BLACK,
    });

    // Everything after this clip only touches pixels outside the bottom
    // wedge, which is what turns the disc into a dial.
    scene.push(DrawCommand::SetClip {
        polygon: vec![
            (cx, cy),
            (region.x + CLIP_WEDGE_SIDE_INSET, region.height),
            (region.x, region.y - CLIP_WEDGE_TOP_OVERHANG),
            (region.width, region.y - CLIP_WEDGE_TOP_OVERHANG),
            (region.width, region.height),
            (cx, cy),
        ],
    });

    scene.push(DrawCommand::FillCircle {
        cx,
        cy,
        radius: limiting_dim / 2.0,
        paint: ring_paint,
    });
    scene.push(DrawCommand::StrokeCircle {
        cx,
        cy,
        radius: limiting_dim / 2.0,
        thickness: OUTER_RING_STROKE_WIDTH,
        color: Color::BLACK,
    });

    let face_radius = limiting_dim / (config.gauge_thickness + 2.0);
    scene.push(DrawCommand::FillCircle {
        cx,
        cy,
        radius: face_radius,
        paint: Paint::Solid(config.middle_area_color),
    });
    scene.push(DrawCommand::StrokeCircle {
        cx,
        cy,
        radius: face_radius,
        thickness: FACE_STROKE_WIDTH,
        color: Color::BLACK,
    });

    let removed = removed_circle_percentage(region);

    let mut fill_value = config.fill_value;
    if fill_value > config.max_value {
        fill_value = config.max_value;
    }
    if fill_value < 0 {
        fill_value = 0;
    }

    push_needle(&mut scene, region, config, fill_value, removed);
    push_tick_marks(&mut scene, region, config, removed);

    scene
}

/// Render the gauge into `canvas`, loading the configured font on the fly.
pub fn render_gauge(canvas: &mut Canvas, region: Region, config: &GaugeConfig) {
    let scene = build_gauge_scene(region, config);
    let font = Font::try_from_vec(config.font_data.to_vec());
    scene.render(canvas, region, font.as_ref());
}

fn push_needle(
    scene: &mut Scene,
    region: Region,
    config: &GaugeConfig,
    fill_amount: i32,
    removed_circle_percentage: f64,
) {
    let (cx, cy) = region.center();
    let limiting_dim = region.limiting_dim();

    scene.push(DrawCommand::FillCircle {
        cx,
        cy,
        radius: limiting_dim / PIVOT_RADIUS_DIVISOR,
        paint: Paint::Solid(config.needle_color),
    });

    let angle_degrees = fill_sweep_degrees(
        fill_amount as f64,
        config.max_value as f64,
        removed_circle_percentage,
    );
    let angle_radians = angle_degrees.to_radians();

    // Tip lands just past the face disc edge.
    let radius =
        limiting_dim as f64 / (config.gauge_thickness as f64 + 2.0) * NEEDLE_REACH_FACTOR;
    let (tip_x, tip_y) = dial_point(cx, cy, radius, angle_radians);

    scene.push(DrawCommand::Line {
        x0: cx,
        y0: cy,
        x1: tip_x,
        y1: tip_y,
        thickness: NEEDLE_STROKE_WIDTH,
        color: config.needle_color,
    });
}

fn push_tick_marks(
    scene: &mut Scene,
    region: Region,
    config: &GaugeConfig,
    removed_circle_percentage: f64,
) {
    let (cx, cy) = region.center();
    let radius = region.limiting_dim() as f64 / 2.0;

    for i in 0..config.steps {
        let step_scale = i as f64 / config.steps as f64;
        let tick_size = tick_size_factor(i, config.steps);

        let angle_degrees = fill_sweep_degrees(
            step_scale * config.max_value as f64,
            config.max_value as f64,
            removed_circle_percentage,
        );
        let angle_radians = angle_degrees.to_radians();

        let outer = dial_point(cx, cy, radius, angle_radians);
        let inner = dial_point(cx, cy, radius * tick_size, angle_radians);
        scene.push(DrawCommand::Line {
            x0: outer.0,
            y0: outer.1,
            x1: inner.0,
            y1: inner.1,
            thickness: TICK_STROKE_WIDTH,
            color: Color::BLACK,
        });

        let percent_of_max = ((config.max_value as f64 / config.steps as f64) * i as f64) as i32;
        let label = dial_point(cx, cy, radius * TICK_LABEL_RADIUS_FACTOR, angle_radians);
        scene.push(DrawCommand::Text {
            x: label.0,
            y: label.1,
            text: percent_of_max.to_string(),
            font_size: TICK_LABEL_FONT_SIZE,
            color: Color::BLACK,
        });
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

/// Even-odd point-in-polygon test by ray casting.
fn point_in_polygon(polygon: &[(f32, f32)], x: f32, y: f32) -> bool {
    if polygon.len() < 3 {
        return true;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn set_pixel(canvas: &mut Canvas, x: i32, y: i32, color: Color, alpha: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= canvas.width || y >= canvas.height {
        return;
    }
    if let Some(clip) = canvas.clip.as_deref() {
        if !point_in_polygon(clip, x as f32 + 0.5, y as f32 + 0.5) {
            return;
        }
    }
    let idx = (y * canvas.width + x) * 4;
    if idx + 4 > canvas.frame.len() {
        return;
    }
    let src = [color.r as f32, color.g as f32, color.b as f32, 255.0 * alpha];
    let dst = [
        canvas.frame[idx] as f32,
        canvas.frame[idx + 1] as f32,
        canvas.frame[idx + 2] as f32,
        canvas.frame[idx + 3] as f32,
    ];
    let a = src[3] / 255.0;
    let out = [
        (src[0] * a + dst[0] * (1.0 - a)).round() as u8,
        (src[1] * a + dst[1] * (1.0 - a)).round() as u8,
        (src[2] * a + dst[2] * (1.0 - a)).round() as u8,
        0xff,
    ];
    canvas.frame[idx..idx + 4].copy_from_slice(&out);
}

fn lerp_color(start: Color, end: Color, t: f32) -> Color {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::new(mix(start.r, end.r), mix(start.g, end.g), mix(start.b, end.b))
}

fn draw_thick_line_aa(
    canvas: &mut Canvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: f32,
    color: Color,
) {
    let pad = thickness.ceil() as i32 + 1;
    let min_x = x0.min(x1).saturating_sub(pad).max(0);
    let max_x = x0.max(x1).saturating_add(pad).min(canvas.width as i32 - 1);
    let min_y = y0.min(y1).saturating_sub(pad).max(0);
    let max_y = y0.max(y1).saturating_add(pad).min(canvas.height as i32 - 1);
    let dx = x1 as f32 - x0 as f32;
    let dy = y1 as f32 - y0 as f32;
    let len_sq = dx * dx + dy * dy;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 - x0 as f32;
            let py = y as f32 - y0 as f32;
            let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);
            let lx = x0 as f32 + t * dx;
            let ly = y0 as f32 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                set_pixel(canvas, x, y, color, aa);
            }
        }
    }
}

fn fill_circle(canvas: &mut Canvas, cx: f32, cy: f32, radius: f32, paint: Paint, region: Region) {
    // Degenerate configs produce non-finite radii; draw nothing rather
    // than walking an unbounded pixel range.
    if !cx.is_finite() || !cy.is_finite() || !radius.is_finite() || radius <= 0.0 {
        return;
    }
    let min_x = ((cx - radius - 1.0).floor() as i32).max(0);
    let max_x = ((cx + radius + 1.0).ceil() as i32).min(canvas.width as i32 - 1);
    let min_y = ((cy - radius - 1.0).floor() as i32).max(0);
    let max_y = ((cy + radius + 1.0).ceil() as i32).min(canvas.height as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let aa = if dist > radius {
                1.0 - (dist - radius).min(1.0)
            } else {
                1.0
            };
            if dist <= radius + 1.0 && aa > 0.0 {
                let color = match paint {
                    Paint::Solid(color) => color,
                    Paint::HorizontalGradient { start, end } => {
                        let t = ((x as f32 - region.x) / region.width).clamp(0.0, 1.0);
                        lerp_color(start, end, t)
                    }
                };
                set_pixel(canvas, x, y, color, aa);
            }
        }
    }
}

fn stroke_circle(canvas: &mut Canvas, cx: f32, cy: f32, radius: f32, thickness: f32, color: Color) {
    if !cx.is_finite() || !cy.is_finite() || !radius.is_finite() || radius <= 0.0 {
        return;
    }
    let half = thickness / 2.0;
    let reach = radius + half + 1.0;
    let min_x = ((cx - reach).floor() as i32).max(0);
    let max_x = ((cx + reach).ceil() as i32).min(canvas.width as i32 - 1);
    let min_y = ((cy - reach).floor() as i32).max(0);
    let max_y = ((cy + reach).ceil() as i32).min(canvas.height as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let aa = (1.0 - ((dist - radius).abs() - half).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                set_pixel(canvas, x, y, color, aa);
            }
        }
    }
}

fn draw_text(
    canvas: &mut Canvas,
    x: i32,
    y: i32,
    text: &str,
    font: &Font<'_>,
    scale: Scale,
    color: Color,
) {
    use rusttype::{point, PositionedGlyph};
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, 0.0 + v_metrics.ascent))
        .collect();
    // Bounding box for the whole string, so the text centers on (x, y)
    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    let width_px = if min_x < max_x { max_x - min_x } else { 0 };
    let height_px = if min_y < max_y { max_y - min_y } else { 0 };
    let offset_x = x - width_px / 2;
    let offset_y = y - height_px / 2;
    let (canvas_w, canvas_h) = (canvas.width as i32, canvas.height as i32);
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i32 + bb.min.x - min_x;
                let py = offset_y + gy as i32 + bb.min.y - min_y;
                if px >= 0 && px < canvas_w && py >= 0 && py < canvas_h {
                    set_pixel(canvas, px, py, color, v);
                }
            });
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
