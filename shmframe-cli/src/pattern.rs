//! Synthetic BGRA test pattern used by `shmframe run`.
//!
//! Horizontal blue gradient, vertical green gradient and a red bar that
//! moves one column per frame, so a reader can see frames advancing.

/// Reusable frame buffer for the test pattern.
pub struct TestPattern {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Render frame number `frame` and return its pixels.
    pub fn render(&mut self, frame: u64) -> &[u8] {
        let w = self.width.max(1) as usize;
        let h = self.height.max(1) as usize;
        let bar = (frame % w as u64) as usize;

        for (i, px) in self.pixels.chunks_exact_mut(4).enumerate() {
            let x = i % w;
            let y = i / w;
            let red = if x == bar { 0xFF } else { 0x00 };
            px[0] = (x * 255 / w) as u8;
            px[1] = (y * 255 / h) as u8;
            px[2] = red;
            px[3] = 0xFF;
        }

        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_size() {
        let mut pattern = TestPattern::new(8, 4);
        assert_eq!(pattern.render(0).len(), 8 * 4 * 4);
    }

    #[test]
    fn test_bar_moves() {
        let mut pattern = TestPattern::new(4, 1);
        let first = pattern.render(0).to_vec();
        let second = pattern.render(1).to_vec();
        assert_eq!(first[2], 0xFF);
        assert_eq!(second[2], 0x00);
        assert_eq!(second[4 + 2], 0xFF);
    }
}
