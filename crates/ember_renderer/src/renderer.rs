//! Render session.
//!
//! A [`Renderer`] owns the scene, the acceleration grid and a persistent
//! worker pool. Each frame:
//!
//! 1. `prepare` rebuilds the grid, pool and per-worker scratch if the scene
//!    changed in a way that invalidates them
//! 2. every worker renders its [`PixelRange`] into per-row buffers
//! 3. in a cluster, finished rows are published through a [`RowExchange`]
//!    while the frame is still running
//! 4. the rows are assembled into the output [`FrameBuffer`]

use crate::camera::CameraRig;
use crate::error::{RenderError, RenderResult};
use crate::exchange::RowExchange;
use crate::grid::Grid;
use crate::intersect::FrameContext;
use crate::sampling::seed_for_worker;
use crate::scheduler::{PixelRange, RowTracker};
use crate::shade::Scratch;
use ember_core::{FrameBuffer, Scene};
use ember_math::Color;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Called with the percentage of the frame done, in [0, 100].
pub type ProgressFn = Box<dyn FnMut(f32) + Send>;

/// Called with human-readable status messages.
pub type MessageFn = Box<dyn FnMut(&str) + Send>;

/// Scanlines between progress reports.
const PROGRESS_INTERVAL: u32 = 16;

pub struct Renderer {
    scene: Scene,
    grid: Option<Grid>,
    pool: rayon::ThreadPool,
    scratch: Vec<Mutex<Scratch>>,
    progress: Option<ProgressFn>,
    message: Option<MessageFn>,
}

impl Renderer {
    /// Start a session. The worker pool is created immediately; everything
    /// else is built on the first frame.
    pub fn new(scene: Scene) -> RenderResult<Self> {
        let pool = build_pool(thread_count(&scene))?;
        Ok(Self {
            scene,
            grid: None,
            pool,
            scratch: Vec::new(),
            progress: None,
            message: None,
        })
    }

    pub fn with_progress(mut self, f: impl FnMut(f32) + Send + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn with_message(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.message = Some(Box::new(f));
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access. Changes that need a rebuild are picked up by
    /// the next frame.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Bring prepared state in line with the scene. Cheap when nothing changed.
    pub fn prepare(&mut self) -> RenderResult<()> {
        if !self.scene.needs_rebuild() && !self.scratch.is_empty() {
            return Ok(());
        }
        let start = Instant::now();

        let threads = thread_count(&self.scene);
        if self.pool.current_num_threads() != threads {
            self.pool = build_pool(threads)?;
        }

        self.grid = Grid::build(self.scene.bounded(), self.scene.options());

        let objects = self.scene.object_count();
        self.scratch = (0..threads)
            .map(|tid| Mutex::new(Scratch::new(objects, seed_for_worker(tid, 0))))
            .collect();

        self.scene.mark_rebuilt();

        let elapsed = start.elapsed().as_secs_f64();
        log::info!("Preprocessing Time: {:10.4} seconds", elapsed);
        self.notify(&format!("Preprocessing Time: {:10.4} seconds", elapsed));
        Ok(())
    }

    /// Render the whole frame on this machine.
    pub fn render(&mut self) -> RenderResult<FrameBuffer> {
        self.run(0, 1, None)
    }

    /// Render node `node`'s share of a frame split across `nodes` machines.
    ///
    /// Every finished row is sent through `exchange` as soon as all local
    /// workers are past it. The returned frame holds only this node's rows.
    pub fn render_node(
        &mut self,
        node: usize,
        nodes: usize,
        exchange: &mut dyn RowExchange,
    ) -> RenderResult<FrameBuffer> {
        self.run(node, nodes, Some(exchange))
    }

    fn notify(&mut self, text: &str) {
        if let Some(f) = self.message.as_mut() {
            f(text);
        }
    }

    fn run(
        &mut self,
        node: usize,
        nodes: usize,
        exchange: Option<&mut dyn RowExchange>,
    ) -> RenderResult<FrameBuffer> {
        if node >= nodes {
            return Err(RenderError::InvalidNode { node, nodes });
        }
        self.prepare()?;
        if nodes as u32 > self.scene.options().height {
            log::warn!(
                "{} nodes for {} scanlines; some nodes have nothing to render",
                nodes,
                self.scene.options().height
            );
        }

        let Self {
            scene,
            grid,
            pool,
            scratch,
            progress,
            ..
        } = &mut *self;
        let scene: &Scene = scene;
        let scratch: &[Mutex<Scratch>] = scratch;

        let options = scene.options();
        let (width, height, format) = (options.width, options.height, options.format);
        let threads = scratch.len();
        let ctx = FrameContext::new(scene, grid.as_ref());
        let rig = CameraRig::new(&scene.camera, width, height);

        // Image rows owned by this node, in render order
        let ys: Vec<u32> = (node as u32..height).step_by(nodes).collect();
        let rows: Vec<Mutex<FrameBuffer>> = ys
            .iter()
            .map(|_| Mutex::new(FrameBuffer::new(width, 1, format)))
            .collect();
        let tracker = RowTracker::new(ys.len(), threads);
        let sender = exchange.map(|exchange| {
            Mutex::new(RowSender {
                exchange,
                sent: 0,
                error: None,
            })
        });

        let progress = Mutex::new(progress.as_mut());
        let reports = node == 0;
        if reports {
            report(&progress, 0.0);
        }

        let start = Instant::now();
        pool.broadcast(|bc| {
            let tid = bc.index();
            let Some(cell) = scratch.get(tid) else {
                return;
            };
            let mut scratch = cell.lock().unwrap_or_else(PoisonError::into_inner);
            scratch.reseed(seed_for_worker(tid, node));

            let range = PixelRange::for_worker(tid, threads, node, nodes);
            let mut line: Vec<(u32, Color)> = Vec::new();
            for y in range.rows(height) {
                line.clear();
                for x in range.columns(width) {
                    line.push((x, rig.sample_pixel(&ctx, x, y, &mut scratch)));
                }

                let row = (y as usize - node) / nodes;
                {
                    let mut buf = rows[row].lock().unwrap_or_else(PoisonError::into_inner);
                    for &(x, col) in &line {
                        buf.set_pixel(x, 0, col);
                    }
                }

                if let Some(sender) = &sender {
                    tracker.finish_row(row);
                    if tid == 0 {
                        let mut sender = sender.lock().unwrap_or_else(PoisonError::into_inner);
                        sender.flush(tracker.rows_done(), &ys, &rows);
                    }
                }

                if reports && tid == 0 && y % PROGRESS_INTERVAL == 0 {
                    report(&progress, 100.0 * (y + 1) as f32 / height as f32);
                }
            }
        });

        if let Some(sender) = sender {
            let mut sender = sender.into_inner().unwrap_or_else(PoisonError::into_inner);
            sender.flush(ys.len(), &ys, &rows);
            sender.finish()?;
        }

        let mut frame = FrameBuffer::new(width, height, format);
        for (&y, row) in ys.iter().zip(rows) {
            let row = row.into_inner().unwrap_or_else(PoisonError::into_inner);
            frame.write_row_bytes(y, row.as_bytes());
        }

        if reports {
            report(&progress, 100.0);
        }
        drop(progress);

        let elapsed = start.elapsed().as_secs_f64();
        log::info!("Ray Tracing Time: {:10.4} seconds", elapsed);
        self.notify(&format!("Ray Tracing Time: {:10.4} seconds", elapsed));
        Ok(frame)
    }
}

/// Render `scene` once with a throwaway session.
pub fn render(scene: Scene) -> RenderResult<FrameBuffer> {
    Renderer::new(scene)?.render()
}

fn thread_count(scene: &Scene) -> usize {
    scene
        .options()
        .threads
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .max(1)
}

fn build_pool(threads: usize) -> RenderResult<rayon::ThreadPool> {
    log::debug!("Starting {} render threads", threads);
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("ember-worker-{i}"))
        .build()?)
}

fn report(progress: &Mutex<Option<&mut ProgressFn>>, percent: f32) {
    let mut hook = progress.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(f) = hook.as_deref_mut() {
        f(percent);
    }
}

/// Ships a node's rows in render order.
struct RowSender<'a> {
    exchange: &'a mut dyn RowExchange,
    sent: usize,
    error: Option<RenderError>,
}

impl RowSender<'_> {
    /// Send rows `sent..upto`. After the first failure nothing more is sent.
    fn flush(&mut self, upto: usize, ys: &[u32], rows: &[Mutex<FrameBuffer>]) {
        while self.error.is_none() && self.sent < upto {
            let k = self.sent;
            let bytes = rows[k]
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .row_bytes(0);
            if let Err(e) = self.exchange.send_row(ys[k], &bytes) {
                self.error = Some(e);
            }
            self.sent += 1;
        }
    }

    fn finish(mut self) -> RenderResult<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => self.exchange.finish(),
        }
    }
}
