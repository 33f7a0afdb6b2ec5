pub mod colors;
pub mod config;
pub mod io_traits;
pub mod keyboard;

use log::{debug, info};
use rand::prelude::*;

use crate::colors::Color;
use crate::config::{DisplayConfig, DEEPEST_BPP};
use crate::io_traits::{Console, KeyRegister, RenderTarget};
use crate::keyboard::{ExitCondition, Gate, InputTracker, KEY_ESC};

pub use crate::io_traits as io;

/// Lines scribbled into the lower-left quadrant on every screen.
const RANDOM_LINES: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("no render target was given")]
    MissingRenderTarget,
    #[error("no key register was given")]
    MissingKeyRegister,
    #[error("there are no display configs to show")]
    NoConfigs,
    #[error("{0} bits per pixel is not a supported depth")]
    UnsupportedDepth(u8),
    #[error("there is no display mode #{0}")]
    NoSuchMode(usize),
}

/// Text multipliers for one depth class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextScale {
    pub title: u8,
    pub info: u8,
    /// Vertical offset of the second info line.
    pub info_gap: u16,
    pub prompt: u8,
}

impl TextScale {
    /// Shallow modes run at high resolutions and need larger text, the 16 bpp canvas is tiny.
    pub fn for_depth(bpp: u8) -> Self {
        let shallow = bpp <= 2;
        Self {
            title: if bpp == DEEPEST_BPP {
                1
            } else if shallow {
                4
            } else {
                2
            },
            info: if shallow { 2 } else { 1 },
            info_gap: if shallow { 25 } else { 18 },
            prompt: if shallow { 3 } else { 1 },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Configuring(usize),
    Drawing(usize),
    AwaitingInput(usize),
    Done,
}

pub struct DemoBuilder {
    configs: Vec<DisplayConfig>,
    render_target: Option<Box<dyn RenderTarget>>,
    key_register: Option<Box<dyn KeyRegister>>,
    console: Option<Box<dyn Console>>,
    exit_key: u8,
    seed: Option<u64>,
}

impl DemoBuilder {
    fn new() -> Self {
        Self {
            configs: DisplayConfig::tour(),
            render_target: None,
            key_register: None,
            console: None,
            exit_key: KEY_ESC,
            seed: None,
        }
    }

    pub fn with_configs(mut self, configs: Vec<DisplayConfig>) -> Self {
        self.configs = configs;
        self
    }

    pub fn with_render_target(mut self, render_target: Box<dyn RenderTarget>) -> Self {
        self.render_target = Some(render_target);
        self
    }

    pub fn with_key_register(mut self, key_register: Box<dyn KeyRegister>) -> Self {
        self.key_register = Some(key_register);
        self
    }

    pub fn with_console(mut self, console: Box<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn with_exit_key(mut self, code: u8) -> Self {
        self.exit_key = code;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// ## If not set:
    ///
    /// - `configs` will be the full five-mode tour
    /// - `render_target` and `key_register` are errors
    /// - `console` will discard every line
    /// - `exit_key` will be Escape
    /// - `seed` will come from the OS
    pub fn build(self) -> Result<Demo, DemoError> {
        if self.configs.is_empty() {
            return Err(DemoError::NoConfigs);
        }
        let target = self.render_target.ok_or(DemoError::MissingRenderTarget)?;
        let register = self.key_register.ok_or(DemoError::MissingKeyRegister)?;

        Ok(Demo {
            configs: self.configs,
            target,
            tracker: InputTracker::new(register),
            console: self
                .console
                .unwrap_or_else(|| Box::new(NullConsole) as Box<dyn Console>),
            exit_key: self.exit_key,
            rng: match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
            stage: Stage::Configuring(0),
        })
    }
}

struct NullConsole;

impl Console for NullConsole {
    fn print_line(&mut self, _line: &str) {}
}

pub struct Demo {
    configs: Vec<DisplayConfig>,
    target: Box<dyn RenderTarget>,
    tracker: InputTracker,
    console: Box<dyn Console>,
    exit_key: u8,
    rng: StdRng,
    stage: Stage,
}

impl Demo {
    pub fn init() -> DemoBuilder {
        DemoBuilder::new()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Steps until every config has been shown and dismissed.
    pub fn run(&mut self) {
        while !self.is_done() {
            self.step();
        }
    }

    /// Performs one state transition. While awaiting input that is a single poll.
    pub fn step(&mut self) -> Stage {
        let next = match self.stage {
            Stage::Configuring(index) => {
                let config = &self.configs[index];
                info!("mode {}/{}: {}", index + 1, self.configs.len(), config);
                self.target.init(config);
                self.target.erase();
                Stage::Drawing(index)
            }
            Stage::Drawing(index) => {
                self.draw();
                Stage::AwaitingInput(index)
            }
            Stage::AwaitingInput(index) => {
                let condition = ExitCondition::for_depth(self.target.bits_per_pixel(), self.exit_key);
                let console = &mut self.console;
                let gate = self
                    .tracker
                    .poll_for_exit(condition, |event| console.print_line(&event.to_string()));

                match gate {
                    Gate::Exit if index + 1 < self.configs.len() => Stage::Configuring(index + 1),
                    Gate::Exit => {
                        self.console.print_line("Goodbye!");
                        Stage::Done
                    }
                    _ => Stage::AwaitingInput(index),
                }
            }
            Stage::Done => Stage::Done,
        };

        if next != self.stage {
            debug!("{:?} -> {:?}", self.stage, next);
        }
        self.stage = next;
        self.target.present();
        next
    }

    fn color(&self, color: Color) -> u16 {
        self.target.color(color, self.target.bits_per_pixel() == DEEPEST_BPP)
    }

    /// Uniform over black..=white, clamped to what the depth can represent.
    fn random_color(&mut self) -> u16 {
        let bpp = self.target.bits_per_pixel();
        let black = self.color(Color::Black);
        let white = self.color(Color::White);
        let top = match bpp {
            1..=15 => white.min((1u16 << bpp) - 1),
            _ => white,
        };
        self.rng.gen_range(black..=top.max(black))
    }

    fn random_in(&mut self, low: u16, high: u16) -> u16 {
        self.rng.gen_range(low..=high.max(low))
    }

    fn draw(&mut self) {
        let w = self.target.canvas_width();
        let h = self.target.canvas_height();
        let bpp = self.target.bits_per_pixel();
        let scale = TextScale::for_depth(bpp);

        let fill = self.random_color();
        self.target.fill_circle(fill, w / 2, h / 2, w / 8);
        let green = self.color(Color::Green);
        self.target.draw_hline(green, w / 3, h / 2, w / 3);
        let red = self.color(Color::Red);
        self.target.draw_vline(red, w / 2, 0, h);
        let yellow = self.color(Color::Yellow);
        self.target.draw_line(yellow, w / 3, h, 2 * w / 3, 0);
        let blue = self.color(Color::Blue);
        self.target.draw_line(blue, w / 3, 0, 2 * w / 3, h);
        let white = self.color(Color::White);
        self.target.draw_rect(white, w / 3, 0, w / 3 + 1, h);
        let cyan = self.color(Color::Cyan);
        self.target.draw_circle(cyan, w / 2, h / 2, w / 4);
        let dark_cyan = self.color(Color::DarkCyan);
        self.target.draw_rounded_rect(dark_cyan, 0, 0, w / 4, h / 4, 10);
        let fill = self.random_color();
        self.target.fill_rounded_rect(
            fill,
            3 * w / 4,
            3 * h / 4,
            (w / 4).saturating_sub(1),
            (h / 4).saturating_sub(1),
            10,
        );

        // Title
        self.target.set_text_multiplier(scale.title);
        if bpp > 1 {
            let dark_red = self.color(Color::DarkRed);
            self.target.set_text_colors(yellow, dark_red);
        } else {
            self.target.set_text_color(yellow);
        }
        self.target.set_cursor(w / 16, h / 10);
        self.target.draw_string("Bitmap Graphics Demo");

        // Depth and canvas size
        self.target.set_text_multiplier(scale.info);
        self.target.set_text_color(white);
        self.target.set_cursor(4 * w / 5, 5 + h / 4);
        self.target.draw_string(&format!("bpp{bpp}"));
        self.target.set_cursor(4 * w / 5, scale.info_gap + h / 4);
        self.target.draw_string(&format!("{w}x{h}"));

        for _ in 0..RANDOM_LINES {
            let color = self.random_color();
            let x0 = self.random_in(0, w / 4);
            let y0 = self.random_in(h / 2, h);
            let x1 = self.random_in(0, w / 4);
            let y1 = self.random_in(h / 2, h);
            self.target.draw_line(color, x0, y0, x1, y1);
        }

        self.target.set_text_multiplier(scale.prompt);
        self.target.set_text_color(white);
        self.target.set_cursor(0, 5 + h / 4);
        if bpp == DEEPEST_BPP {
            self.target.draw_string("Press ESC \nkey to \nexit!");
        } else {
            self.target.draw_string("Press any \nkey to \ncontinue");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::KeyboardState;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Init(DisplayConfig),
        Erase,
        Line(u16),
        Shape,
        Multiplier(u8),
        TextColors(u16, Option<u16>),
        Text(String),
        Present,
    }

    /// Records calls and resolves the platform default to 320x180 at 8 bpp.
    struct DummyTarget {
        calls: Rc<RefCell<Vec<Call>>>,
        mode: (u16, u16, u8),
    }

    impl DummyTarget {
        fn new() -> (Self, Rc<RefCell<Vec<Call>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let target = Self {
                calls: calls.clone(),
                mode: (0, 0, 0),
            };
            (target, calls)
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl RenderTarget for DummyTarget {
        fn init(&mut self, config: &DisplayConfig) {
            self.mode = if config.is_platform_default() {
                (320, 180, 8)
            } else {
                (config.width, config.height, config.bpp)
            };
            self.record(Call::Init(*config));
        }

        fn erase(&mut self) {
            self.record(Call::Erase);
        }

        fn canvas_width(&self) -> u16 {
            self.mode.0
        }

        fn canvas_height(&self) -> u16 {
            self.mode.1
        }

        fn bits_per_pixel(&self) -> u8 {
            self.mode.2
        }

        fn fill_circle(&mut self, _color: u16, _x: u16, _y: u16, _radius: u16) {
            self.record(Call::Shape);
        }

        fn draw_circle(&mut self, _color: u16, _x: u16, _y: u16, _radius: u16) {
            self.record(Call::Shape);
        }

        fn draw_hline(&mut self, _color: u16, _x: u16, _y: u16, _width: u16) {
            self.record(Call::Shape);
        }

        fn draw_vline(&mut self, _color: u16, _x: u16, _y: u16, _height: u16) {
            self.record(Call::Shape);
        }

        fn draw_line(&mut self, color: u16, _x0: u16, _y0: u16, _x1: u16, _y1: u16) {
            self.record(Call::Line(color));
        }

        fn draw_rect(&mut self, _color: u16, _x: u16, _y: u16, _width: u16, _height: u16) {
            self.record(Call::Shape);
        }

        fn draw_rounded_rect(&mut self, _color: u16, _x: u16, _y: u16, _w: u16, _h: u16, _r: u16) {
            self.record(Call::Shape);
        }

        fn fill_rounded_rect(&mut self, _color: u16, _x: u16, _y: u16, _w: u16, _h: u16, _r: u16) {
            self.record(Call::Shape);
        }

        fn set_cursor(&mut self, _x: u16, _y: u16) {}

        fn set_text_multiplier(&mut self, multiplier: u8) {
            self.record(Call::Multiplier(multiplier));
        }

        fn set_text_color(&mut self, foreground: u16) {
            self.record(Call::TextColors(foreground, None));
        }

        fn set_text_colors(&mut self, foreground: u16, background: u16) {
            self.record(Call::TextColors(foreground, Some(background)));
        }

        fn draw_string(&mut self, text: &str) {
            self.record(Call::Text(text.to_string()));
        }

        fn present(&mut self) {
            self.record(Call::Present);
        }
    }

    /// Hands out snapshots in order, then repeats the last one.
    struct DummyKeys {
        snapshots: VecDeque<KeyboardState>,
        last: KeyboardState,
    }

    impl DummyKeys {
        fn new(snapshots: Vec<KeyboardState>) -> Self {
            Self {
                snapshots: snapshots.into(),
                last: KeyboardState::idle(),
            }
        }
    }

    impl KeyRegister for DummyKeys {
        fn read_block(&mut self, offset: usize, buf: &mut [u8]) {
            if let Some(next) = self.snapshots.pop_front() {
                self.last = next;
            }
            buf.copy_from_slice(&self.last.as_bytes()[offset..offset + buf.len()]);
        }
    }

    struct DummyConsole(Rc<RefCell<Vec<String>>>);

    impl Console for DummyConsole {
        fn print_line(&mut self, line: &str) {
            self.0.borrow_mut().push(line.to_string());
        }
    }

    fn down(codes: &[u8]) -> KeyboardState {
        KeyboardState::from_down_keys(codes.iter().copied())
    }

    fn idle() -> KeyboardState {
        KeyboardState::idle()
    }

    fn config(width: u16, height: u16, bpp: u8) -> DisplayConfig {
        DisplayConfig::new(0xFF00, 0x0000, 1, width, height, bpp).unwrap()
    }

    fn demo(
        configs: Vec<DisplayConfig>,
        keys: Vec<KeyboardState>,
    ) -> (Demo, Rc<RefCell<Vec<Call>>>, Rc<RefCell<Vec<String>>>) {
        let (target, calls) = DummyTarget::new();
        let lines = Rc::new(RefCell::new(Vec::new()));
        let demo = Demo::init()
            .with_configs(configs)
            .with_render_target(Box::new(target))
            .with_key_register(Box::new(DummyKeys::new(keys)))
            .with_console(Box::new(DummyConsole(lines.clone())))
            .with_seed(7)
            .build()
            .unwrap();
        (demo, calls, lines)
    }

    /// Steps through configuring and drawing of the current config.
    fn show(demo: &mut Demo) {
        demo.step();
        demo.step();
        assert!(matches!(demo.stage(), Stage::AwaitingInput(_)));
    }

    #[test]
    fn build_requires_collaborators() {
        let (target, _) = DummyTarget::new();
        assert!(matches!(
            Demo::init().with_render_target(Box::new(target)).build(),
            Err(DemoError::MissingKeyRegister)
        ));
        assert!(matches!(
            Demo::init().with_key_register(Box::new(DummyKeys::new(vec![]))).build(),
            Err(DemoError::MissingRenderTarget)
        ));
        assert!(matches!(
            Demo::init().with_configs(vec![]).build(),
            Err(DemoError::NoConfigs)
        ));
    }

    #[test]
    fn stages_follow_configure_draw_await() {
        let (mut demo, calls, _) = demo(vec![config(640, 480, 1)], vec![idle(), down(&[10])]);

        assert_eq!(demo.step(), Stage::Drawing(0));
        assert_eq!(demo.step(), Stage::AwaitingInput(0));
        assert_eq!(demo.step(), Stage::AwaitingInput(0));
        assert_eq!(demo.step(), Stage::Done);
        assert_eq!(demo.step(), Stage::Done);

        let calls = calls.borrow();
        assert_eq!(calls[0], Call::Init(config(640, 480, 1)));
        assert_eq!(calls[1], Call::Erase);
        assert_eq!(calls[2], Call::Present);
        assert_eq!(calls.iter().filter(|call| **call == Call::Present).count(), 5);
    }

    #[test]
    fn shallow_then_deep_scenario() {
        let (mut demo, _, lines) = demo(
            vec![config(640, 480, 1), config(240, 124, 16)],
            vec![
                down(&[10]),
                idle(),
                down(&[10]),
                down(&[10]),
                idle(),
                down(&[KEY_ESC]),
            ],
        );

        show(&mut demo);
        assert_eq!(demo.step(), Stage::Configuring(1));

        show(&mut demo);
        assert_eq!(demo.step(), Stage::AwaitingInput(1));
        assert_eq!(demo.step(), Stage::AwaitingInput(1));
        assert_eq!(demo.step(), Stage::AwaitingInput(1));
        assert_eq!(demo.step(), Stage::AwaitingInput(1));
        assert_eq!(demo.step(), Stage::Done);

        assert_eq!(
            *lines.borrow(),
            vec![
                "key 10 pressed",
                "key 10 released",
                "key 10 pressed",
                "key 10 released",
                "key 41 pressed",
                "Goodbye!",
            ]
        );
    }

    #[test]
    fn deepest_mode_ignores_other_keys() {
        let mut keys = Vec::new();
        for code in [4u8, 10, 40, 0x2C, 200] {
            keys.push(down(&[code]));
            keys.push(idle());
        }
        let (mut demo, _, _) = demo(vec![config(240, 124, 16)], keys);

        show(&mut demo);
        for _ in 0..10 {
            assert_eq!(demo.step(), Stage::AwaitingInput(0));
        }
    }

    #[test]
    fn run_shows_every_config_once() {
        let configs = DisplayConfig::tour();
        let mut keys = Vec::new();
        for _ in 0..configs.len() {
            keys.push(down(&[KEY_ESC]));
            keys.push(idle());
        }
        let (mut demo, calls, lines) = demo(configs.clone(), keys);

        demo.run();
        assert!(demo.is_done());

        let inits: Vec<Call> = calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::Init(_)))
            .cloned()
            .collect();
        assert_eq!(inits, configs.into_iter().map(Call::Init).collect::<Vec<_>>());
        assert_eq!(lines.borrow().last().map(String::as_str), Some("Goodbye!"));
    }

    #[test]
    fn held_key_does_not_skip_the_next_mode() {
        let (mut demo, _, _) = demo(
            vec![config(640, 480, 1), config(640, 360, 2)],
            vec![down(&[10]), down(&[10]), down(&[10]), idle(), down(&[10])],
        );

        show(&mut demo);
        assert_eq!(demo.step(), Stage::Configuring(1));
        show(&mut demo);
        assert_eq!(demo.step(), Stage::AwaitingInput(1));
        assert_eq!(demo.step(), Stage::AwaitingInput(1));
        assert_eq!(demo.step(), Stage::AwaitingInput(1));
        assert_eq!(demo.step(), Stage::Done);
    }

    #[test]
    fn custom_exit_key_replaces_escape() {
        let (target, _) = DummyTarget::new();
        let mut demo = Demo::init()
            .with_configs(vec![config(240, 124, 16)])
            .with_render_target(Box::new(target))
            .with_key_register(Box::new(DummyKeys::new(vec![
                down(&[KEY_ESC]),
                idle(),
                down(&[0x28]),
            ])))
            .with_exit_key(0x28)
            .build()
            .unwrap();

        show(&mut demo);
        assert_eq!(demo.step(), Stage::AwaitingInput(0));
        assert_eq!(demo.step(), Stage::AwaitingInput(0));
        assert_eq!(demo.step(), Stage::Done);
    }

    #[test]
    fn text_scale_table() {
        assert_eq!(
            TextScale::for_depth(1),
            TextScale {
                title: 4,
                info: 2,
                info_gap: 25,
                prompt: 3
            }
        );
        assert_eq!(TextScale::for_depth(2), TextScale::for_depth(1));
        assert_eq!(
            TextScale::for_depth(4),
            TextScale {
                title: 2,
                info: 1,
                info_gap: 18,
                prompt: 1
            }
        );
        assert_eq!(TextScale::for_depth(8), TextScale::for_depth(4));
        assert_eq!(TextScale::for_depth(16).title, 1);
        assert_eq!(TextScale::for_depth(16).prompt, 1);
    }

    #[test]
    fn drawing_script_adapts_to_depth() {
        let (mut demo, calls, _) = demo(vec![config(640, 480, 1), config(240, 124, 16)], vec![]);

        show(&mut demo);
        let shallow: Vec<Call> = calls.borrow_mut().drain(..).collect();
        demo.configs.swap(0, 1);
        demo.stage = Stage::Configuring(0);
        show(&mut demo);
        let deep: Vec<Call> = calls.borrow().clone();

        let texts = |calls: &[Call]| -> Vec<String> {
            calls
                .iter()
                .filter_map(|call| match call {
                    Call::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(
            texts(&shallow),
            vec!["Bitmap Graphics Demo", "bpp1", "640x480", "Press any \nkey to \ncontinue"]
        );
        assert_eq!(
            texts(&deep),
            vec!["Bitmap Graphics Demo", "bpp16", "240x124", "Press ESC \nkey to \nexit!"]
        );

        // Title is foreground only at 1 bpp, over dark red elsewhere. Colors are packed per depth.
        assert!(shallow.contains(&Call::TextColors(11, None)));
        assert!(deep.contains(&Call::TextColors(Color::Yellow.pack(true), Some(Color::DarkRed.pack(true)))));

        let multipliers = |calls: &[Call]| -> Vec<u8> {
            calls
                .iter()
                .filter_map(|call| match call {
                    Call::Multiplier(m) => Some(*m),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(multipliers(&shallow), vec![4, 2, 3]);
        assert_eq!(multipliers(&deep), vec![1, 1, 1]);
    }

    #[test]
    fn random_colors_stay_within_depth() {
        for (bpp, top) in [(1u8, 1u16), (2, 3), (4, 15), (8, 15)] {
            let (mut demo, calls, _) = demo(vec![config(320, 240, bpp)], vec![]);
            show(&mut demo);

            let lines: Vec<u16> = calls
                .borrow()
                .iter()
                .filter_map(|call| match call {
                    Call::Line(color) => Some(*color),
                    _ => None,
                })
                .collect();
            // Two fixed diagonals plus the random scribbles.
            assert_eq!(lines.len(), 2 + RANDOM_LINES);
            assert!(lines[2..].iter().all(|color| *color <= top), "bpp{bpp}");
        }
    }

    #[test]
    fn platform_default_uses_target_depth() {
        let (mut demo, calls, _) = demo(vec![DisplayConfig::platform_default()], vec![down(&[10])]);
        show(&mut demo);
        assert!(calls.borrow().contains(&Call::Text("bpp8".to_string())));
        assert!(calls.borrow().contains(&Call::Text("320x180".to_string())));
        // 8 bpp is not the deepest mode, so any key advances.
        assert_eq!(demo.step(), Stage::Done);
    }
}
