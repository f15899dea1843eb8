use std::fmt::Display as FmtDisplay;

use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub type FrameBuffer = [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// The output grid as seen by the interpreter. Coordinates handed to `get` and `set`
/// are already wrapped into the 64x32 grid by the drawing logic.
pub trait Screen {
    fn get(&self, x: usize, y: usize) -> bool;
    fn set(&mut self, x: usize, y: usize, value: bool);
    fn clear(&mut self);

    /// Flip a pixel and report whether it was on before
    fn toggle(&mut self, x: usize, y: usize) -> bool {
        let prev = self.get(x, y);
        self.set(x, y, !prev);
        prev
    }
}

impl<S: Screen + ?Sized> Screen for &mut S {
    fn get(&self, x: usize, y: usize) -> bool {
        (**self).get(x, y)
    }

    fn set(&mut self, x: usize, y: usize, value: bool) {
        (**self).set(x, y, value)
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

pub struct Display {
    /// One entry per pixel, on (true) or off (false)
    pub(crate) fb: FrameBuffer,
    pub(crate) dirty: bool,
}

impl Display {
    pub fn new() -> Self {
        Self {
            fb: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
            dirty: false,
        }
    }

    /// Copy out the frame buffer and mark the display as presented
    pub fn fb(&mut self) -> FrameBuffer {
        self.dirty = false;
        self.fb
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Screen for Display {
    fn get(&self, x: usize, y: usize) -> bool {
        self.fb[y % SCREEN_HEIGHT][x % SCREEN_WIDTH]
    }

    /// This marks the display as dirty, causing it to be re-rendered on the next update
    fn set(&mut self, x: usize, y: usize, value: bool) {
        self.dirty = true;
        self.fb[y % SCREEN_HEIGHT][x % SCREEN_WIDTH] = value;
    }

    fn clear(&mut self) {
        self.dirty = true;
        for row in self.fb.iter_mut() {
            row.fill(false);
        }
    }
}

impl FmtDisplay for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.fb.iter() {
            for &pixel in row.iter() {
                write!(f, "{}", if pixel { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Display, Screen, SCREEN_HEIGHT, SCREEN_WIDTH};

    #[test]
    fn test_toggle_reports_previous() {
        let mut display = Display::new();
        let (x, y) = (SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1);
        assert!(!display.toggle(x, y));
        assert!(display.get(x, y));
        assert!(display.toggle(x, y));
        assert!(!display.get(x, y));
        assert!(!display.get(0, 0));
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new();
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                display.set(x, y, true);
            }
        }
        display.fb();
        assert!(!display.is_dirty());

        display.clear();
        assert!(display.is_dirty());
        assert!(display.fb().iter().flatten().all(|&pixel| !pixel));
    }

    #[test]
    fn test_borrowed_screen() {
        let mut display = Display::new();
        {
            let screen = &mut display;
            screen.set(3, 4, true);
            assert!(Screen::get(&screen, 3, 4));
        }
        assert!(display.get(3, 4));
    }

    #[test]
    fn test_render_text() {
        let mut display = Display::new();
        display.set(1, 0, true);
        let text = display.to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first.len(), SCREEN_WIDTH);
        assert!(first.starts_with(".#."));
        assert_eq!(text.lines().count(), SCREEN_HEIGHT);
    }
}
