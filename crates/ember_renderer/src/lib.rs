//! Ember Renderer - multi-threaded CPU ray tracer
//!
//! Recursive ray casting over an [`ember_core::Scene`] with:
//! - A uniform grid for spatial acceleration
//! - Four shading tiers, from hit/miss masks up to shadows and AO
//! - Perspective, orthographic, fisheye and depth-of-field cameras
//! - A persistent worker pool, optionally split across cluster nodes
//!
//! # Example
//!
//! ```ignore
//! let mut renderer = Renderer::new(scene)?.with_progress(|p| println!("{p:.0}%"));
//! let frame = renderer.render()?;
//! ```

mod camera;
mod error;
mod exchange;
mod grid;
mod intersect;
mod mailbox;
mod ray;
mod renderer;
mod sampling;
mod scheduler;
mod shade;

pub use camera::CameraRig;
pub use error::{RenderError, RenderResult};
pub use exchange::{LocalCluster, LocalEndpoint, RowExchange, RowMessage};
pub use grid::{Grid, MAX_CELLS_PER_AXIS};
pub use intersect::FrameContext;
pub use mailbox::Mailbox;
pub use ray::{AcceptPolicy, Intersection, RayKind, TraceRay};
pub use renderer::{render, MessageFn, ProgressFn, Renderer};
pub use sampling::seed_for_worker;
pub use scheduler::{PixelRange, RowTracker};
pub use shade::Scratch;
