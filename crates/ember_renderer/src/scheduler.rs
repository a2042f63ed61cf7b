//! Work partitioning across threads and nodes.
//!
//! Every worker gets an interleaved set of pixels up front. On a single
//! node each thread takes every `threads`-th scanline. In a cluster every
//! node takes every `nodes`-th scanline and its threads interleave along
//! the row; a row is shipped once all of the node's threads are past it.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Pixels assigned to one worker: columns `start_x, start_x + step_x, ..`
/// of rows `start_y, start_y + step_y, ..`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRange {
    pub start_x: u32,
    pub step_x: u32,
    pub start_y: u32,
    pub step_y: u32,
}

impl PixelRange {
    /// Share of worker `tid` out of `threads` on node `node` of `nodes`.
    pub fn for_worker(tid: usize, threads: usize, node: usize, nodes: usize) -> Self {
        let threads = threads.max(1) as u32;
        if nodes <= 1 {
            Self {
                start_x: 0,
                step_x: 1,
                start_y: tid as u32,
                step_y: threads,
            }
        } else {
            Self {
                start_x: tid as u32,
                step_x: threads,
                start_y: node as u32,
                step_y: nodes as u32,
            }
        }
    }

    /// Rows of an image `height` pixels tall, top to bottom.
    pub fn rows(&self, height: u32) -> impl Iterator<Item = u32> {
        (self.start_y..height).step_by(self.step_y as usize)
    }

    pub fn columns(&self, width: u32) -> impl Iterator<Item = u32> {
        (self.start_x..width).step_by(self.step_x as usize)
    }
}

/// Per-row completion counters for one node.
///
/// Rows are numbered by the order a node renders them (its k-th row), not
/// by image row. Every worker renders its rows in that order, so row `k`
/// is always complete before row `k + 1` and the first `rows_done()` rows
/// can be shipped.
#[derive(Debug)]
pub struct RowTracker {
    counters: Vec<AtomicUsize>,
    rows_done: AtomicUsize,
    threads: usize,
}

impl RowTracker {
    pub fn new(rows: usize, threads: usize) -> Self {
        Self {
            counters: (0..rows).map(|_| AtomicUsize::new(0)).collect(),
            rows_done: AtomicUsize::new(0),
            threads: threads.max(1),
        }
    }

    /// Record that one worker finished its part of row `k`. The worker that
    /// completes the row bumps the done count and gets the new value.
    pub fn finish_row(&self, k: usize) -> Option<usize> {
        let count = self.counters[k].fetch_add(1, Ordering::AcqRel) + 1;
        if count == self.threads {
            self.counters[k].store(0, Ordering::Release);
            let done = self.rows_done.fetch_add(1, Ordering::AcqRel) + 1;
            debug_assert!(done <= self.counters.len());
            Some(done)
        } else {
            None
        }
    }

    /// Rows completed by every worker so far.
    pub fn rows_done(&self) -> usize {
        self.rows_done.load(Ordering::Acquire)
    }

    pub fn rows(&self) -> usize {
        self.counters.len()
    }
}
