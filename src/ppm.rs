use super::camera::PixelSink;

/// Plain-text PPM (P3) image buffer.  Random access so the renderer can
/// deliver rows in any order.
pub struct PpmImage {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl PpmImage {
    pub fn create(width: usize, height: usize) -> PpmImage {
        PpmImage { width, height, pixels: vec![[0, 0, 0]; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, col: usize, row: usize) -> [u8; 3] {
        self.pixels[row * self.width + col]
    }

    pub fn get_text(&self) -> String {
        let mut text = String::new();
        // COLS x ROWS; 255 is max colour
        text.push_str(&format!("P3\n{} {}\n255\n", self.width, self.height));
        for row in self.pixels.chunks(self.width) {
            for [r, g, b] in row {
                text.push_str(&format!("{:4} {:4} {:4}", r, g, b));
            }
            text.push('\n');
        }
        text
    }
}

impl PixelSink for PpmImage {
    fn set_pixel(&mut self, col: usize, row: usize, r: u8, g: u8, b: u8) {
        self.pixels[row * self.width + col] = [r, g, b];
    }
}
