use std::time::Instant;

use crt_core::events::{KeyKind, PointerKind};
use crt_core::{InputEvent, PixelSource};

/// Top-row colour bars: white, yellow, cyan, green, magenta, red, blue.
const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

const BLOCK: u32 = 32;
const MARK_RADIUS: i64 = 3;
const MAX_MARKS: usize = 64;

// ---------------------------------------------------------------------------
// DemoCanvas — the software source surface
// ---------------------------------------------------------------------------

/// A small animated test card drawn in software: colour bars, a grey ramp
/// that scrolls with time, and a block bouncing across the ramp. Clicks
/// leave marks, the pointer draws a crosshair, and `c` clears the marks.
pub struct DemoCanvas {
    width: u32,
    height: u32,
    epoch: Instant,
    marks: Vec<(i64, i64)>,
    crosshair: Option<(i64, i64)>,
}

impl DemoCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            epoch: Instant::now(),
            marks: Vec::new(),
            crosshair: None,
        }
    }

    pub fn marks(&self) -> usize {
        self.marks.len()
    }

    /// Draw the card as it looks `time` seconds after creation.
    pub fn paint(&self, time: f32, out: &mut Vec<u8>) {
        let (w, h) = (self.width as usize, self.height as usize);
        out.clear();
        out.resize(w * h * 4, 255);

        let bars_h = h * 2 / 3;
        let scroll = (time * 40.0) as usize;
        for y in 0..h {
            for x in 0..w {
                let rgb = if y < bars_h {
                    BARS[x * BARS.len() / w.max(1)]
                } else {
                    let v = (((x + scroll) % w.max(1)) * 255 / w.max(1)) as u8;
                    [v, v, v]
                };
                let i = (y * w + x) * 4;
                out[i..i + 3].copy_from_slice(&rgb);
            }
        }

        let (bx, by) = self.block_origin(time);
        self.fill(out, bx, by, BLOCK as i64, BLOCK as i64, [255, 255, 255]);

        for &(mx, my) in &self.marks {
            let r = MARK_RADIUS;
            self.fill(out, mx - r, my - r, 2 * r + 1, 2 * r + 1, [255, 0, 0]);
        }

        if let Some((cx, cy)) = self.crosshair {
            self.fill(out, 0, cy, self.width as i64, 1, [0, 255, 0]);
            self.fill(out, cx, 0, 1, self.height as i64, [0, 255, 0]);
        }
    }

    /// Top-left corner of the bouncing block: a triangle wave across the
    /// width, riding on the ramp below the bars.
    fn block_origin(&self, time: f32) -> (i64, i64) {
        let span = self.width.saturating_sub(BLOCK).max(1) as f32;
        let phase = (time * 120.0) % (2.0 * span);
        let x = if phase < span { phase } else { 2.0 * span - phase };
        let ramp_top = self.height * 2 / 3;
        let ramp_h = self.height - ramp_top;
        let y = ramp_top + ramp_h.saturating_sub(BLOCK) / 2;
        (x as i64, y as i64)
    }

    fn fill(&self, out: &mut [u8], x0: i64, y0: i64, w: i64, h: i64, rgb: [u8; 3]) {
        let (cw, ch) = (self.width as i64, self.height as i64);
        for y in y0.max(0)..(y0 + h).min(ch) {
            for x in x0.max(0)..(x0 + w).min(cw) {
                let i = ((y * cw + x) * 4) as usize;
                out[i..i + 3].copy_from_slice(&rgb);
            }
        }
    }
}

impl PixelSource for DemoCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_pixels(&self, out: &mut Vec<u8>) {
        self.paint(self.epoch.elapsed().as_secs_f32(), out);
    }

    fn dispatch_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Pointer(p) => {
                let pos = (p.x.floor() as i64, p.y.floor() as i64);
                match p.kind {
                    PointerKind::Click => {
                        if self.marks.len() == MAX_MARKS {
                            self.marks.remove(0);
                        }
                        self.marks.push(pos);
                        log::debug!("canvas click at {:?}", pos);
                    }
                    PointerKind::Move => self.crosshair = Some(pos),
                    PointerKind::Down | PointerKind::Up => {}
                }
            }
            InputEvent::Keyboard(k) => {
                if k.kind == KeyKind::Down && k.key.eq_ignore_ascii_case("c") {
                    log::debug!("canvas cleared {} marks", self.marks.len());
                    self.marks.clear();
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crt_core::events::{KeyEvent, Modifiers, PointerButton, PointerEvent};

    fn pointer(kind: PointerKind, x: f64, y: f64) -> InputEvent {
        InputEvent::Pointer(PointerEvent {
            kind,
            x,
            y,
            button: PointerButton::Primary,
            buttons: 0,
            modifiers: Modifiers::default(),
        })
    }

    fn key_down(key: &str) -> InputEvent {
        InputEvent::Keyboard(KeyEvent {
            kind: KeyKind::Down,
            key: key.into(),
            code: format!("Key{}", key.to_uppercase()),
            repeat: false,
            modifiers: Modifiers::default(),
        })
    }

    fn pixel(buf: &[u8], w: u32, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * w + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2]]
    }

    #[test]
    fn paint_fills_whole_opaque_buffer() {
        let canvas = DemoCanvas::new(70, 30);
        let mut buf = Vec::new();
        canvas.paint(0.0, &mut buf);
        assert_eq!(buf.len(), 70 * 30 * 4);
        assert!(buf.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn first_and_last_bars_are_white_and_blue() {
        let canvas = DemoCanvas::new(70, 30);
        let mut buf = Vec::new();
        canvas.paint(0.0, &mut buf);
        assert_eq!(pixel(&buf, 70, 0, 0), BARS[0]);
        assert_eq!(pixel(&buf, 70, 69, 0), BARS[6]);
    }

    #[test]
    fn click_leaves_a_red_mark() {
        let mut canvas = DemoCanvas::new(70, 60);
        canvas.dispatch_event(pointer(PointerKind::Click, 10.4, 5.9));
        let mut buf = Vec::new();
        canvas.paint(0.0, &mut buf);
        assert_eq!(canvas.marks(), 1);
        assert_eq!(pixel(&buf, 70, 10, 5), [255, 0, 0]);
    }

    #[test]
    fn down_and_up_do_not_mark() {
        let mut canvas = DemoCanvas::new(70, 60);
        canvas.dispatch_event(pointer(PointerKind::Down, 1.0, 1.0));
        canvas.dispatch_event(pointer(PointerKind::Up, 1.0, 1.0));
        assert_eq!(canvas.marks(), 0);
    }

    #[test]
    fn move_draws_crosshair() {
        let mut canvas = DemoCanvas::new(70, 60);
        canvas.dispatch_event(pointer(PointerKind::Move, 20.0, 7.0));
        let mut buf = Vec::new();
        canvas.paint(0.0, &mut buf);
        assert_eq!(pixel(&buf, 70, 0, 7), [0, 255, 0]);
        assert_eq!(pixel(&buf, 70, 20, 0), [0, 255, 0]);
    }

    #[test]
    fn c_key_clears_marks() {
        let mut canvas = DemoCanvas::new(70, 60);
        canvas.dispatch_event(pointer(PointerKind::Click, 1.0, 1.0));
        canvas.dispatch_event(pointer(PointerKind::Click, 2.0, 2.0));
        canvas.dispatch_event(key_down("x"));
        assert_eq!(canvas.marks(), 2);
        canvas.dispatch_event(key_down("C"));
        assert_eq!(canvas.marks(), 0);
    }

    #[test]
    fn marks_are_capped() {
        let mut canvas = DemoCanvas::new(70, 60);
        for i in 0..(MAX_MARKS + 10) {
            canvas.dispatch_event(pointer(PointerKind::Click, i as f64, 0.0));
        }
        assert_eq!(canvas.marks(), MAX_MARKS);
    }

    #[test]
    fn block_moves_over_time() {
        let canvas = DemoCanvas::new(200, 90);
        assert_ne!(canvas.block_origin(0.0), canvas.block_origin(0.5));
        let (x, _) = canvas.block_origin(1000.0);
        assert!((0..=(200 - BLOCK as i64)).contains(&x));
    }
}
