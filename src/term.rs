//! Terminal presenter
//!
//! Setup/teardown of the raw-mode terminal (with a panic hook so a crash
//! never leaves the shell unusable) and the half-block widget that blits
//! the composed canvas into a ratatui frame. Each terminal cell carries two
//! vertical pixels via ▀/▄/█, which is all the graphics support the face
//! needs on any Unicode terminal.

use std::io::{self, stdout, Write};
use std::panic;

use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use ratatui::Terminal;

use crate::errors::Result;
use crate::render::{Canvas, Color};

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Restore the terminal before the panic message prints; a panic in raw
/// mode otherwise leaves the terminal unusable
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

/// Initialize the terminal: raw mode, alternate screen, mouse capture (the
/// pointer feed for eye tracking) and focus change events (pointer leave)
pub fn init() -> Result<Tui> {
    install_panic_hook();

    enable_raw_mode()?;
    execute!(
        stdout(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        crossterm::cursor::Hide
    )?;

    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode. Safe to call more than once.
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(
        stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange,
        crossterm::cursor::Show
    )?;
    Ok(())
}

/// Blits a canvas into a ratatui area, two vertical pixels per cell
pub struct CanvasWidget<'a> {
    canvas: &'a Canvas,
    background: Color,
}

impl<'a> CanvasWidget<'a> {
    pub fn new(canvas: &'a Canvas, background: Color) -> Self {
        Self { canvas, background }
    }

    /// Flatten a canvas pixel onto the opaque background color
    fn pixel_at(&self, x: u32, y: u32) -> Color {
        self.canvas
            .get_pixel(x, y)
            .map_or(self.background, |p| p.blend_over(&self.background))
    }

    /// Pick the half-block character and color pair for a top/bottom pixel
    /// pair
    fn cell_for(&self, top: Color, bot: Color) -> (char, Color, Color) {
        if top.distance(&bot) < 0.1 {
            let avg = Color::rgb(
                (top.r + bot.r) / 2.0,
                (top.g + bot.g) / 2.0,
                (top.b + bot.b) / 2.0,
            );
            return ('█', avg, avg);
        }
        // The lighter pixel goes in the foreground for better contrast on
        // terminals that dim backgrounds
        if top.luminance() >= bot.luminance() {
            ('▀', top, bot)
        } else {
            ('▄', bot, top)
        }
    }
}

impl Widget for CanvasWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 || self.canvas.width == 0 {
            return;
        }

        let scale_x = f64::from(self.canvas.width) / f64::from(area.width);
        let scale_y = f64::from(self.canvas.height) / (f64::from(area.height) * 2.0);

        for row in 0..area.height {
            for col in 0..area.width {
                let px = (f64::from(col) * scale_x) as u32;
                let top_y = (f64::from(row) * 2.0 * scale_y) as u32;
                let bot_y = ((f64::from(row) * 2.0 + 1.0) * scale_y) as u32;

                let top = self.pixel_at(px.min(self.canvas.width - 1), top_y);
                let bot = self.pixel_at(px.min(self.canvas.width - 1), bot_y);
                let (ch, fg, bg) = self.cell_for(top, bot);

                let cell = &mut buf[(area.x + col, area.y + row)];
                cell.set_char(ch);
                cell.set_fg(fg.to_ratatui());
                cell.set_bg(bg.to_ratatui());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shapes::{Circle, Point};

    #[test]
    fn test_uniform_pixels_use_full_block() {
        let canvas = Canvas::new(2, 4);
        let widget = CanvasWidget::new(&canvas, Color::BLACK);
        let (ch, _, _) = widget.cell_for(Color::BLACK, Color::BLACK);
        assert_eq!(ch, '█');
    }

    #[test]
    fn test_contrasting_pixels_use_half_block() {
        let canvas = Canvas::new(2, 4);
        let widget = CanvasWidget::new(&canvas, Color::BLACK);
        let (ch, fg, _) = widget.cell_for(Color::WHITE, Color::BLACK);
        assert_eq!(ch, '▀');
        assert!(fg.luminance() > 0.9);

        let (ch, fg, _) = widget.cell_for(Color::BLACK, Color::WHITE);
        assert_eq!(ch, '▄');
        assert!(fg.luminance() > 0.9);
    }

    #[test]
    fn test_render_into_buffer() {
        let mut canvas = Canvas::new(20, 20);
        canvas.draw(&Circle::new(Point::new(10.0, 10.0), 6.0, Color::WHITE).filled());

        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);
        CanvasWidget::new(&canvas, Color::BLACK).render(area, &mut buf);

        // The center cell shows the circle
        let center = &buf[(10u16, 5u16)];
        assert_ne!(center.symbol(), " ");
    }

    #[test]
    fn test_empty_area_is_noop() {
        let canvas = Canvas::new(4, 4);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        CanvasWidget::new(&canvas, Color::BLACK).render(area, &mut buf);
    }
}
