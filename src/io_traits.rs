use crate::colors::Color;
use crate::config::DisplayConfig;

/// The bitmap graphics capability the demo draws through.
///
/// Colors are always passed already packed for the active depth, see [`RenderTarget::color`].
pub trait RenderTarget {
    /// Reinitializes geometry and pixel format. An all-zero config means "platform default".
    fn init(&mut self, config: &DisplayConfig);
    fn erase(&mut self);

    fn canvas_width(&self) -> u16;
    fn canvas_height(&self) -> u16;
    fn bits_per_pixel(&self) -> u8;

    /// Packs a symbolic color. `rgb` selects the 16 bpp encoding.
    fn color(&self, color: Color, rgb: bool) -> u16 {
        color.pack(rgb)
    }

    fn fill_circle(&mut self, color: u16, x: u16, y: u16, radius: u16);
    fn draw_circle(&mut self, color: u16, x: u16, y: u16, radius: u16);
    fn draw_hline(&mut self, color: u16, x: u16, y: u16, width: u16);
    fn draw_vline(&mut self, color: u16, x: u16, y: u16, height: u16);
    fn draw_line(&mut self, color: u16, x0: u16, y0: u16, x1: u16, y1: u16);
    fn draw_rect(&mut self, color: u16, x: u16, y: u16, width: u16, height: u16);
    fn draw_rounded_rect(&mut self, color: u16, x: u16, y: u16, width: u16, height: u16, radius: u16);
    fn fill_rounded_rect(&mut self, color: u16, x: u16, y: u16, width: u16, height: u16, radius: u16);

    fn set_cursor(&mut self, x: u16, y: u16);
    fn set_text_multiplier(&mut self, multiplier: u8);
    fn set_text_color(&mut self, foreground: u16);
    fn set_text_colors(&mut self, foreground: u16, background: u16);
    /// Draws at the cursor. `\n` returns to the cursor's starting column on the next line.
    fn draw_string(&mut self, text: &str);

    /// Called once after every orchestrator step.
    fn present(&mut self) {}
}

/// A memory-mapped key-state region, one bit per key code.
pub trait KeyRegister {
    /// Fills `buf` with the bytes starting at `offset` into the region.
    fn read_block(&mut self, offset: usize, buf: &mut [u8]);
}

/// Fire-and-forget line output.
pub trait Console {
    fn print_line(&mut self, line: &str);
}
