//! Display postprocessors.
//!
//! Optional true-colour filters between the merger and the video sink:
//! line blur averages each pixel with the same column of the previous
//! line, frame blur with the same pixel of the previous frame, and the
//! combined mode mixes both with double weight on the current pixel.
//! All of them require a true-colour-capable sink and pass indexed lines
//! through untouched otherwise.

use serde::{Deserialize, Serialize};

use crate::device::antic::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::device::gtia::palette;
use crate::display::{PackedRgb, VideoSink};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostprocessorMode {
    #[default]
    None,
    /// Blur colours of the same intensity on adjacent lines.
    LineBlur,
    /// Blur each pixel with the previous frame.
    FrameBlur,
    /// Line and frame blur combined.
    Both,
}

pub struct Postprocessor {
    mode: PostprocessorMode,
    /// Colour indices of the previous line within this frame.
    prev_line: Vec<u8>,
    /// Colour indices of the previous frame, row-major.
    prev_frame: Vec<u8>,
    row: usize,
    rgb: Vec<PackedRgb>,
}

impl Postprocessor {
    pub fn new(mode: PostprocessorMode) -> Self {
        let frame_size = match mode {
            PostprocessorMode::FrameBlur | PostprocessorMode::Both => {
                DISPLAY_WIDTH * usize::from(DISPLAY_HEIGHT)
            }
            _ => 0,
        };
        Self {
            mode,
            prev_line: vec![0; DISPLAY_WIDTH],
            prev_frame: vec![0; frame_size],
            row: 0,
            rgb: vec![0; DISPLAY_WIDTH],
        }
    }

    pub fn mode(&self) -> PostprocessorMode {
        self.mode
    }

    pub fn reset(&mut self) {
        self.prev_line.fill(0);
        self.prev_frame.fill(0);
        self.row = 0;
    }

    /// Frame boundary: restart the frame store walk and the line history.
    pub fn vertical_blank(&mut self) {
        self.row = 0;
        self.prev_line.fill(0);
    }

    /// Filter one line and push it into the sink. Bypassed entirely for
    /// sinks without true-colour support.
    pub fn push_line(
        &mut self,
        y: usize,
        line: &[u8],
        map: &[PackedRgb; 256],
        sink: &mut dyn VideoSink,
    ) {
        if self.mode == PostprocessorMode::None || !sink.wants_rgb() {
            sink.push_line(y, line);
            return;
        }

        let count = line.len().min(DISPLAY_WIDTH);
        match self.mode {
            PostprocessorMode::LineBlur => {
                for i in 0..count {
                    let cur = line[i];
                    let prev = self.prev_line[i];
                    // Blur only when both lines share the intensity
                    // nibble; edges stay crisp.
                    self.rgb[i] = if (cur ^ prev) & 0x0F != 0 {
                        map[usize::from(cur)]
                    } else {
                        palette::mix(map[usize::from(cur)], map[usize::from(prev)])
                    };
                }
                self.prev_line[..count].copy_from_slice(&line[..count]);
            }
            PostprocessorMode::FrameBlur => {
                let row = self.frame_row(count);
                for i in 0..count {
                    self.rgb[i] = palette::mix(
                        map[usize::from(line[i])],
                        map[usize::from(self.prev_frame[row + i])],
                    );
                }
                self.prev_frame[row..row + count].copy_from_slice(&line[..count]);
            }
            PostprocessorMode::Both => {
                let row = self.frame_row(count);
                for i in 0..count {
                    let cur = line[i];
                    let prev_line = self.prev_line[i];
                    let prev_frame = self.prev_frame[row + i];
                    self.rgb[i] = if (cur ^ prev_line) & 0x0F != 0 {
                        palette::mix(map[usize::from(cur)], map[usize::from(prev_frame)])
                    } else {
                        palette::mix3(
                            map[usize::from(prev_line)],
                            map[usize::from(prev_frame)],
                            map[usize::from(cur)],
                        )
                    };
                }
                self.prev_frame[row..row + count].copy_from_slice(&line[..count]);
                self.prev_line[..count].copy_from_slice(&line[..count]);
            }
            PostprocessorMode::None => unreachable!(),
        }
        self.row += 1;
        sink.push_rgb_line(y, &self.rgb[..count]);
    }

    fn frame_row(&self, count: usize) -> usize {
        let row = self.row.min(usize::from(DISPLAY_HEIGHT) - 1) * DISPLAY_WIDTH;
        debug_assert!(row + count <= self.prev_frame.len());
        row
    }
}
