//! Per-frame motion stats stream.
//!
//! Columnar text, one line per detected frame. The header carries the
//! grid dimensions once so offline tooling can scale coordinates.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use vigilcam_common::error::{VigilError, VigilResult};
use vigilcam_model::CompositeVector;

/// Writes detected-frame composite vectors as a columnar text stream.
pub struct StatsWriter<W: Write> {
    writer: W,
    header_written: bool,
}

impl StatsWriter<BufWriter<File>> {
    /// Open a stats file, truncating any previous stream.
    pub fn create(path: &Path) -> VigilResult<Self> {
        let file = File::create(path).map_err(|e| {
            VigilError::motion(format!("Failed to open stats file {}: {e}", path.display()))
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> StatsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    /// Append one frame record. Displacement is negated so positive
    /// values read as scene motion rather than encoder block motion.
    pub fn write_frame(
        &mut self,
        grid_width: usize,
        grid_height: usize,
        frame_count: u64,
        fps: u32,
        cvec: &CompositeVector,
    ) -> VigilResult<()> {
        if !self.header_written {
            writeln!(self.writer, "time, x, y, dx, dy, magnitude, count")?;
            writeln!(self.writer, "# width {grid_width} height {grid_height}")?;
            self.header_written = true;
        }
        let time = frame_count as f32 / fps.max(1) as f32;
        let magnitude = (cvec.mag2 as f32).sqrt();
        writeln!(
            self.writer,
            "{time:6.3}, {:3}, {:3}, {:3}, {:3}, {magnitude:3.0}, {:4}",
            cvec.x, cvec.y, -cvec.vx, -cvec.vy, cvec.mag2_count
        )?;
        Ok(())
    }

    pub fn flush(&mut self) -> VigilResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
