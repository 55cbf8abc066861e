//! Stream framing
//!
//! Turns newline-delimited reads into complete inbound units. A unit that
//! opens a `<mos>` envelope accumulates lines until `</mos>` arrives; any
//! other non-blank line is a unit of its own (classified later as
//! unrecognized). An envelope ends at its `</mos>`, so several envelopes on
//! one line are separate units. Units larger than the configured limit are
//! discarded.

use super::classifier::ENVELOPE_TAG;
use super::scanner::Scanner;

const ENVELOPE_END: &str = "</mos>";

/// Result of feeding a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One complete inbound unit (trailing line terminators removed)
    Complete(String),
    /// A unit exceeded the size limit and was dropped (bytes discarded)
    Oversized(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discard {
    /// Skip until the envelope closes
    Envelope,
    /// Skip until end of line
    Line,
}

#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: String,
    max_bytes: usize,
    discarding: Option<Discard>,
    discarded: usize,
}

impl FrameAccumulator {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            max_bytes: max_bytes.max(1),
            discarding: None,
            discarded: 0,
        }
    }

    /// Bytes buffered for the unit in progress
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one read chunk (a full line including `\n`, or a partial line
    /// when the reader hit its size cap)
    ///
    /// A chunk can complete several units, e.g. two envelopes on one line.
    pub fn push(&mut self, chunk: &str) -> Vec<Frame> {
        let mut frames = Vec::new();
        let line_done = chunk.ends_with('\n');
        let mut rest = chunk;

        if let Some(mode) = self.discarding {
            match mode {
                Discard::Envelope => match chunk.find(ENVELOPE_END) {
                    Some(at) => {
                        let end = at + ENVELOPE_END.len();
                        self.discarded += end;
                        rest = &chunk[end..];
                    }
                    None => {
                        self.discarded += chunk.len();
                        return frames;
                    }
                },
                Discard::Line => {
                    self.discarded += chunk.len();
                    if !line_done {
                        return frames;
                    }
                    rest = "";
                }
            }
            self.discarding = None;
            frames.push(Frame::Oversized(std::mem::take(&mut self.discarded)));
        }

        self.buffer.push_str(rest);
        self.drain_units(line_done, &mut frames);
        frames
    }

    /// Split every complete unit off the front of the buffer
    fn drain_units(&mut self, line_done: bool, frames: &mut Vec<Frame>) {
        loop {
            if self.buffer.trim().is_empty() {
                self.buffer.clear();
                return;
            }

            let envelope_start = envelope_start(&self.buffer);
            let unit_end = match envelope_start {
                Some(start) => self.buffer[start..]
                    .find(ENVELOPE_END)
                    .map(|at| start + at + ENVELOPE_END.len()),
                None => line_done.then_some(self.buffer.len()),
            };

            match unit_end {
                Some(end) if end > self.max_bytes => {
                    self.buffer.drain(..end);
                    frames.push(Frame::Oversized(end));
                }
                Some(end) => {
                    let unit: String = self.buffer.drain(..end).collect();
                    frames.push(Frame::Complete(
                        unit.trim_end_matches(['\r', '\n']).to_string(),
                    ));
                }
                None => {
                    if self.buffer.len() > self.max_bytes {
                        self.discarded = self.buffer.len();
                        self.buffer.clear();
                        self.discarding = Some(if envelope_start.is_some() {
                            Discard::Envelope
                        } else {
                            Discard::Line
                        });
                    }
                    return;
                }
            }
        }
    }

    /// Flush whatever is buffered at end of stream
    pub fn finish(&mut self) -> Option<Frame> {
        if self.discarding.take().is_some() {
            return Some(Frame::Oversized(std::mem::take(&mut self.discarded)));
        }
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            return None;
        }
        Some(Frame::Complete(self.take_unit()))
    }

    fn take_unit(&mut self) -> String {
        let unit = std::mem::take(&mut self.buffer);
        unit.trim_end_matches(['\r', '\n']).to_string()
    }
}

fn envelope_start(buffer: &str) -> Option<usize> {
    Scanner::new(buffer).start_tag_offset(ENVELOPE_TAG)
}
