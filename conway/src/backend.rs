// backend.rs - The compute/render collaborator the scheduler drives

use std::io::Write;

use tokio::sync::watch;

use crate::error::{LifeError, Result};
use crate::grid::{ALIVE, GridSize, Workgroups};
use crate::rule::Rule;

/// Opaque handle to a cell buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) usize);

/// A device able to run the update rule over cell buffers and present them.
///
/// Calls made for one tick arrive in order: `dispatch_compute`, then
/// `render_frame` on the buffer just written, then `submit`. A backend that
/// queues work must make the render observe the finished dispatch.
pub trait Backend {
    fn allocate_buffer(&mut self, cells: usize) -> Result<BufferHandle>;

    /// One-shot upload, used when seeding.
    fn write_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()>;

    /// Runs `rule` once per cell, reading only `read` and writing only `write`.
    fn dispatch_compute(
        &mut self,
        rule: &Rule,
        read: BufferHandle,
        write: BufferHandle,
        groups: Workgroups,
    ) -> Result<()>;

    /// Presents one frame showing the cells of `state`.
    fn render_frame(&mut self, state: BufferHandle) -> Result<()>;

    /// Ends the ordered unit of work for the current tick.
    fn submit(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_buffer(&self, handle: BufferHandle) -> Result<&[u32]>;
}

/// One presented picture of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frames presented before this one.
    pub sequence: u64,
    pub size: GridSize,
    pub cells: Vec<u32>,
}

impl Frame {
    pub fn is_alive(&self, x: u32, y: u32) -> bool {
        self.cells[self.size.index(x, y)] == ALIVE
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c == ALIVE).count()
    }

    /// `#` for live cells and `.` for dead ones, one line per row.
    pub fn to_text(&self) -> String {
        let width = self.size.width() as usize;
        let mut text = String::with_capacity(self.cells.len() + self.size.height() as usize);
        for row in self.cells.chunks(width) {
            text.extend(row.iter().map(|&c| if c == ALIVE { '#' } else { '.' }));
            text.push('\n');
        }
        text
    }
}

/// Destination of rendered frames.
pub trait FrameSink {
    fn present(&mut self, frame: Frame) -> Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn present(&mut self, frame: Frame) -> Result<()> {
        self.push(frame);
        Ok(())
    }
}

/// Keeps only the latest frame; readers poll the receiver.
impl FrameSink for watch::Sender<Option<Frame>> {
    fn present(&mut self, frame: Frame) -> Result<()> {
        self.send_replace(Some(frame));
        Ok(())
    }
}

/// Writes frames as text, optionally clearing an ANSI terminal first.
pub struct TextSink<W: Write> {
    out: W,
    clear: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for TextSink<W> {
    fn present(&mut self, frame: Frame) -> Result<()> {
        let io = |e: std::io::Error| LifeError::Present(e.to_string());
        if self.clear {
            write!(self.out, "\x1b[2J\x1b[H").map_err(io)?;
        }
        writeln!(
            self.out,
            "frame {}  population {}",
            frame.sequence,
            frame.population()
        )
        .map_err(io)?;
        self.out.write_all(frame.to_text().as_bytes()).map_err(io)?;
        self.out.flush().map_err(io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DEAD;

    fn frame() -> Frame {
        let size = GridSize::new(3, 2).unwrap();
        Frame {
            sequence: 4,
            size,
            cells: vec![ALIVE, DEAD, DEAD, DEAD, ALIVE, ALIVE],
        }
    }

    #[test]
    fn frame_text_and_population() {
        let frame = frame();
        assert_eq!(frame.to_text(), "#..\n.##\n");
        assert_eq!(frame.population(), 3);
        assert!(frame.is_alive(2, 1));
        assert!(!frame.is_alive(1, 0));
    }

    #[test]
    fn text_sink_writes_header_and_grid() {
        let mut sink = TextSink::new(Vec::new(), false);
        sink.present(frame()).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "frame 4  population 3\n#..\n.##\n");
    }

    #[test]
    fn watch_sink_keeps_latest() {
        let (mut tx, rx) = watch::channel(None);
        tx.present(frame()).unwrap();
        let mut second = frame();
        second.sequence = 5;
        tx.present(second).unwrap();
        assert_eq!(rx.borrow().as_ref().map(|f| f.sequence), Some(5));
    }
}
