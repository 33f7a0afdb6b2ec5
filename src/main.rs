use bitmap_demo::colors;
use bitmap_demo::config::{DisplayConfig, DEEPEST_BPP};
use bitmap_demo::io::*;
use bitmap_demo::io::RenderTarget;
use bitmap_demo::keyboard::KeyboardState;
use bitmap_demo::{Demo, DemoError};

use clap::Parser;
use log::LevelFilter;
use macroquad::prelude::*;

/// What the platform default config resolves to: 320x180 at 8 bpp.
const DEFAULT_MODE: (u16, u16, u8) = (320, 180, 8);

/// Glyph cell size at multiplier 1.
const CELL: u16 = 8;

#[derive(Clone, Debug)]
enum Primitive {
    FillCircle {
        color: u16,
        x: u16,
        y: u16,
        radius: u16,
    },
    Circle {
        color: u16,
        x: u16,
        y: u16,
        radius: u16,
    },
    Line {
        color: u16,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    },
    Rect {
        color: u16,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },
    RoundedRect {
        color: u16,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        radius: u16,
        filled: bool,
    },
    Text {
        x: u16,
        y: u16,
        multiplier: u8,
        foreground: u16,
        background: Option<u16>,
        text: String,
    },
}

/// Keeps the canvas as a display list and replays it, scaled to the window, every frame.
struct MacroquadCanvas {
    width: u16,
    height: u16,
    bpp: u8,
    primitives: Vec<Primitive>,
    cursor: (u16, u16),
    multiplier: u8,
    foreground: u16,
    background: Option<u16>,
}

impl MacroquadCanvas {
    fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            bpp: 0,
            primitives: Vec::new(),
            cursor: (0, 0),
            multiplier: 1,
            foreground: 0,
            background: None,
        }
    }

    fn unpack(&self, packed: u16) -> Color {
        if self.bpp == DEEPEST_BPP {
            let r = ((packed >> 11) & 0x1F) as u8;
            let g = ((packed >> 5) & 0x3F) as u8;
            let b = (packed & 0x1F) as u8;
            return Color::from_rgba(r << 3 | r >> 2, g << 2 | g >> 4, b << 3 | b >> 2, 255);
        }

        let index = packed & ((1u32 << self.bpp) - 1) as u16;
        match self.bpp {
            // Shallow modes are gray ramps.
            1 | 2 => {
                let level = (index * 255 / ((1 << self.bpp) - 1)) as u8;
                Color::from_rgba(level, level, level, 255)
            }
            _ => indexed(index),
        }
    }

    fn paint(&self, primitive: &Primitive, scale: f32) {
        let s = |v: u16| v as f32 * scale;
        let thickness = scale.max(1.0);

        match primitive {
            Primitive::FillCircle { color, x, y, radius } => {
                draw_circle(s(*x), s(*y), s(*radius), self.unpack(*color));
            }
            Primitive::Circle { color, x, y, radius } => {
                draw_circle_lines(s(*x), s(*y), s(*radius), thickness, self.unpack(*color));
            }
            Primitive::Line { color, x0, y0, x1, y1 } => {
                draw_line(s(*x0), s(*y0), s(*x1), s(*y1), thickness, self.unpack(*color));
            }
            Primitive::Rect {
                color,
                x,
                y,
                width,
                height,
            } => {
                draw_rectangle_lines(s(*x), s(*y), s(*width), s(*height), thickness, self.unpack(*color));
            }
            Primitive::RoundedRect {
                color,
                x,
                y,
                width,
                height,
                radius,
                filled,
            } => {
                let (x, y, w, h) = (s(*x), s(*y), s(*width), s(*height));
                let r = s(*radius).min(w / 2.0).min(h / 2.0);
                let color = self.unpack(*color);
                let corners = [
                    (x + r, y + r, 180.0f32),
                    (x + w - r, y + r, 270.0),
                    (x + w - r, y + h - r, 0.0),
                    (x + r, y + h - r, 90.0),
                ];

                if *filled {
                    draw_rectangle(x + r, y, w - 2.0 * r, h, color);
                    draw_rectangle(x, y + r, w, h - 2.0 * r, color);
                    for (cx, cy, _) in corners {
                        draw_circle(cx, cy, r, color);
                    }
                } else {
                    draw_line(x + r, y, x + w - r, y, thickness, color);
                    draw_line(x + r, y + h, x + w - r, y + h, thickness, color);
                    draw_line(x, y + r, x, y + h - r, thickness, color);
                    draw_line(x + w, y + r, x + w, y + h - r, thickness, color);
                    for (cx, cy, start) in corners {
                        quarter_arc(cx, cy, r, start, thickness, color);
                    }
                }
            }
            Primitive::Text {
                x,
                y,
                multiplier,
                foreground,
                background,
                text,
            } => {
                let line_height = CELL * *multiplier as u16;
                let size = s(line_height);
                for (row, line) in text.split('\n').enumerate() {
                    let top = s(*y + row as u16 * line_height);
                    let dims = measure_text(line, None, size as u16, 1.0);
                    if let Some(background) = background {
                        draw_rectangle(s(*x), top, dims.width, size, self.unpack(*background));
                    }
                    draw_text(line, s(*x), top + dims.offset_y, size, self.unpack(*foreground));
                }
            }
        }
    }
}

fn quarter_arc(cx: f32, cy: f32, r: f32, start: f32, thickness: f32, color: Color) {
    const SEGMENTS: usize = 8;
    let point = |step: usize| {
        let angle = (start + 90.0 * step as f32 / SEGMENTS as f32).to_radians();
        (cx + r * angle.cos(), cy + r * angle.sin())
    };
    for step in 0..SEGMENTS {
        let (x0, y0) = point(step);
        let (x1, y1) = point(step + 1);
        draw_line(x0, y0, x1, y1, thickness, color);
    }
}

/// 16 symbolic colors, a 6x6x6 cube and a gray ramp, like a 256-color terminal.
fn indexed(index: u16) -> Color {
    if let Some(symbol) = colors::Color::from_index(index) {
        let (r, g, b) = symbol.rgb();
        return Color::from_rgba(r, g, b, 255);
    }

    if index < 232 {
        let cube = index - 16;
        let level = |v: u16| if v == 0 { 0 } else { (55 + v * 40) as u8 };
        Color::from_rgba(level(cube / 36), level(cube / 6 % 6), level(cube % 6), 255)
    } else {
        let level = (8 + (index - 232) * 10) as u8;
        Color::from_rgba(level, level, level, 255)
    }
}

impl RenderTarget for MacroquadCanvas {
    fn init(&mut self, config: &DisplayConfig) {
        (self.width, self.height, self.bpp) = if config.is_platform_default() {
            DEFAULT_MODE
        } else {
            (config.width, config.height, config.bpp)
        };
        self.cursor = (0, 0);
        self.multiplier = 1;
        self.background = None;
    }

    fn erase(&mut self) {
        self.primitives.clear();
    }

    fn canvas_width(&self) -> u16 {
        self.width
    }

    fn canvas_height(&self) -> u16 {
        self.height
    }

    fn bits_per_pixel(&self) -> u8 {
        self.bpp
    }

    fn fill_circle(&mut self, color: u16, x: u16, y: u16, radius: u16) {
        self.primitives.push(Primitive::FillCircle { color, x, y, radius });
    }

    fn draw_circle(&mut self, color: u16, x: u16, y: u16, radius: u16) {
        self.primitives.push(Primitive::Circle { color, x, y, radius });
    }

    fn draw_hline(&mut self, color: u16, x: u16, y: u16, width: u16) {
        self.draw_line(color, x, y, x.saturating_add(width), y);
    }

    fn draw_vline(&mut self, color: u16, x: u16, y: u16, height: u16) {
        self.draw_line(color, x, y, x, y.saturating_add(height));
    }

    fn draw_line(&mut self, color: u16, x0: u16, y0: u16, x1: u16, y1: u16) {
        self.primitives.push(Primitive::Line { color, x0, y0, x1, y1 });
    }

    fn draw_rect(&mut self, color: u16, x: u16, y: u16, width: u16, height: u16) {
        self.primitives.push(Primitive::Rect {
            color,
            x,
            y,
            width,
            height,
        });
    }

    fn draw_rounded_rect(&mut self, color: u16, x: u16, y: u16, width: u16, height: u16, radius: u16) {
        self.primitives.push(Primitive::RoundedRect {
            color,
            x,
            y,
            width,
            height,
            radius,
            filled: false,
        });
    }

    fn fill_rounded_rect(&mut self, color: u16, x: u16, y: u16, width: u16, height: u16, radius: u16) {
        self.primitives.push(Primitive::RoundedRect {
            color,
            x,
            y,
            width,
            height,
            radius,
            filled: true,
        });
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor = (x, y);
    }

    fn set_text_multiplier(&mut self, multiplier: u8) {
        self.multiplier = multiplier.max(1);
    }

    fn set_text_color(&mut self, foreground: u16) {
        self.foreground = foreground;
        self.background = None;
    }

    fn set_text_colors(&mut self, foreground: u16, background: u16) {
        self.foreground = foreground;
        self.background = Some(background);
    }

    fn draw_string(&mut self, text: &str) {
        let (x, y) = self.cursor;
        let cell = CELL * self.multiplier as u16;
        let rows = text.split('\n').count() as u16;
        let last = text.rsplit('\n').next().unwrap_or_default().chars().count() as u16;

        self.primitives.push(Primitive::Text {
            x,
            y,
            multiplier: self.multiplier,
            foreground: self.foreground,
            background: self.background,
            text: text.to_string(),
        });
        self.cursor = (x + last * cell, y + (rows - 1) * cell);
    }

    fn present(&mut self) {
        clear_background(BLACK);
        if self.width == 0 || self.height == 0 {
            return;
        }

        let scale = (screen_width() / self.width as f32).min(screen_height() / self.height as f32);
        for primitive in &self.primitives {
            self.paint(primitive, scale);
        }
    }
}

/// Builds the key-state bitmask from whatever macroquad reports as down this frame.
struct MacroquadKeys;

impl KeyRegister for MacroquadKeys {
    fn read_block(&mut self, offset: usize, buf: &mut [u8]) {
        let state = KeyboardState::from_down_keys(get_keys_down().into_iter().filter_map(hid_code));
        buf.copy_from_slice(&state.as_bytes()[offset..offset + buf.len()]);
    }
}

/// USB HID usage codes for the keys the demo can see.
fn hid_code(key: KeyCode) -> Option<u8> {
    let letters = [
        KeyCode::A,
        KeyCode::B,
        KeyCode::C,
        KeyCode::D,
        KeyCode::E,
        KeyCode::F,
        KeyCode::G,
        KeyCode::H,
        KeyCode::I,
        KeyCode::J,
        KeyCode::K,
        KeyCode::L,
        KeyCode::M,
        KeyCode::N,
        KeyCode::O,
        KeyCode::P,
        KeyCode::Q,
        KeyCode::R,
        KeyCode::S,
        KeyCode::T,
        KeyCode::U,
        KeyCode::V,
        KeyCode::W,
        KeyCode::X,
        KeyCode::Y,
        KeyCode::Z,
    ];
    // These are ordered based on their HID usage code, starting at 1.
    let digits = [
        KeyCode::Key1,
        KeyCode::Key2,
        KeyCode::Key3,
        KeyCode::Key4,
        KeyCode::Key5,
        KeyCode::Key6,
        KeyCode::Key7,
        KeyCode::Key8,
        KeyCode::Key9,
        KeyCode::Key0,
    ];
    let functions = [
        KeyCode::F1,
        KeyCode::F2,
        KeyCode::F3,
        KeyCode::F4,
        KeyCode::F5,
        KeyCode::F6,
        KeyCode::F7,
        KeyCode::F8,
        KeyCode::F9,
        KeyCode::F10,
        KeyCode::F11,
        KeyCode::F12,
    ];

    if let Some(i) = letters.iter().position(|k| *k == key) {
        return Some(0x04 + i as u8);
    }
    if let Some(i) = digits.iter().position(|k| *k == key) {
        return Some(0x1E + i as u8);
    }
    if let Some(i) = functions.iter().position(|k| *k == key) {
        return Some(0x3A + i as u8);
    }

    match key {
        KeyCode::Enter => Some(0x28),
        KeyCode::Escape => Some(0x29),
        KeyCode::Backspace => Some(0x2A),
        KeyCode::Tab => Some(0x2B),
        KeyCode::Space => Some(0x2C),
        KeyCode::Minus => Some(0x2D),
        KeyCode::Equal => Some(0x2E),
        KeyCode::LeftBracket => Some(0x2F),
        KeyCode::RightBracket => Some(0x30),
        KeyCode::Backslash => Some(0x31),
        KeyCode::Semicolon => Some(0x33),
        KeyCode::Apostrophe => Some(0x34),
        KeyCode::GraveAccent => Some(0x35),
        KeyCode::Comma => Some(0x36),
        KeyCode::Period => Some(0x37),
        KeyCode::Slash => Some(0x38),
        KeyCode::Right => Some(0x4F),
        KeyCode::Left => Some(0x50),
        KeyCode::Down => Some(0x51),
        KeyCode::Up => Some(0x52),
        _ => None,
    }
}

struct StdoutConsole;

impl Console for StdoutConsole {
    fn print_line(&mut self, line: &str) {
        println!("{line}");
    }
}

#[derive(Parser)]
#[command(about = "Cycles a bitmap canvas through every supported pixel depth")]
struct Cli {
    /// Seed for the random fills and lines
    #[arg(long)]
    seed: Option<u64>,
    /// Show only this mode of the tour, by position. Repeat to pick several.
    #[arg(long = "only", value_name = "INDEX")]
    only: Vec<usize>,
    /// Print the tour and exit
    #[arg(long)]
    list: bool,
    /// -v info, -vv debug, -vvv trace. RUST_LOG still wins.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn configs(&self) -> Result<Vec<DisplayConfig>, DemoError> {
        let tour = DisplayConfig::tour();
        if self.only.is_empty() {
            Ok(tour)
        } else {
            DisplayConfig::select(&tour, &self.only)
        }
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Bitmap Graphics Demo".to_owned(),
        window_width: 640,
        window_height: 480,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if args.list {
        for (index, config) in DisplayConfig::tour().iter().enumerate() {
            println!("{index}: {config}");
        }
        return;
    }

    let demo = args.configs().and_then(|configs| {
        let mut builder = Demo::init()
            .with_configs(configs)
            .with_render_target(Box::new(MacroquadCanvas::new()))
            .with_key_register(Box::new(MacroquadKeys))
            .with_console(Box::new(StdoutConsole));
        if let Some(seed) = args.seed {
            builder = builder.with_seed(seed);
        }
        builder.build()
    });

    let mut demo = match demo {
        Ok(demo) => demo,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    loop {
        demo.step();
        if demo.is_done() {
            break;
        }
        next_frame().await;
    }
}
