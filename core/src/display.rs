//! Video output sink.
//!
//! The merger pushes finished scanlines here, one line at a time, after the
//! optional postprocessor chain has run. Sinks that can take true-colour
//! data report it via `wants_rgb()`; the postprocessors are bypassed for
//! indexed-only sinks.

/// Packed 0x00RRGGBB colour value for true colour output.
pub type PackedRgb = u32;

pub trait VideoSink {
    /// True if the sink accepts `push_rgb_line`. Postprocessing only
    /// engages on true-colour-capable sinks.
    fn wants_rgb(&self) -> bool {
        false
    }

    /// Deliver one finished scanline of palette indices.
    fn push_line(&mut self, y: usize, line: &[u8]);

    /// Deliver one finished scanline of packed RGB pixels.
    fn push_rgb_line(&mut self, _y: usize, _line: &[PackedRgb]) {}
}

/// In-memory frame store, the default sink for the assembled machine and
/// the test drivers.
pub struct FrameSink {
    width: usize,
    height: usize,
    indexed: Vec<u8>,
    rgb: Option<Vec<PackedRgb>>,
}

impl FrameSink {
    /// Indexed-colour frame store.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            indexed: vec![0; width * height],
            rgb: None,
        }
    }

    /// Frame store that also captures true-colour lines, enabling the
    /// postprocessor chain.
    pub fn new_true_color(width: usize, height: usize) -> Self {
        let mut sink = Self::new(width, height);
        sink.rgb = Some(vec![0; width * height]);
        sink
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Palette indices of a stored line.
    pub fn line(&self, y: usize) -> &[u8] {
        &self.indexed[y * self.width..(y + 1) * self.width]
    }

    /// Packed RGB pixels of a stored line, if true colour is captured.
    pub fn rgb_line(&self, y: usize) -> Option<&[PackedRgb]> {
        self.rgb
            .as_ref()
            .map(|rgb| &rgb[y * self.width..(y + 1) * self.width])
    }

    pub fn clear(&mut self) {
        self.indexed.fill(0);
        if let Some(rgb) = &mut self.rgb {
            rgb.fill(0);
        }
    }
}

impl VideoSink for FrameSink {
    fn wants_rgb(&self) -> bool {
        self.rgb.is_some()
    }

    fn push_line(&mut self, y: usize, line: &[u8]) {
        if y >= self.height {
            return;
        }
        let count = line.len().min(self.width);
        self.indexed[y * self.width..y * self.width + count].copy_from_slice(&line[..count]);
    }

    fn push_rgb_line(&mut self, y: usize, line: &[PackedRgb]) {
        if y >= self.height {
            return;
        }
        if let Some(rgb) = &mut self.rgb {
            let count = line.len().min(self.width);
            rgb[y * self.width..y * self.width + count].copy_from_slice(&line[..count]);
        }
    }
}
