//! Shipping finished scanlines between render nodes.
//!
//! A node renders every `nodes`-th row and publishes each finished row
//! through a [`RowExchange`]. [`LocalCluster`] is an in-process transport
//! that gathers rows from several nodes into one frame.

use crate::error::{RenderError, RenderResult};
use ember_core::{FrameBuffer, PixelFormat};
use std::sync::mpsc::{self, Receiver, Sender};

/// Transport for one node's finished rows.
pub trait RowExchange: Send {
    /// Publish image row `y` in the frame's native byte layout.
    fn send_row(&mut self, y: u32, bytes: &[u8]) -> RenderResult<()>;

    /// Called once after the node's last row has been sent.
    fn finish(&mut self) -> RenderResult<()>;
}

/// One row in flight.
#[derive(Debug, Clone)]
pub struct RowMessage {
    pub node: usize,
    pub y: u32,
    pub bytes: Vec<u8>,
}

/// In-process stand-in for a cluster: every node gets an endpoint, rows
/// arrive on a shared channel.
#[derive(Debug)]
pub struct LocalCluster {
    nodes: usize,
    tx: Sender<RowMessage>,
    rx: Receiver<RowMessage>,
}

impl LocalCluster {
    pub fn new(nodes: usize) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { nodes, tx, rx }
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Transport for node `node`.
    pub fn endpoint(&self, node: usize) -> RenderResult<LocalEndpoint> {
        if node >= self.nodes {
            return Err(RenderError::InvalidNode {
                node,
                nodes: self.nodes,
            });
        }
        Ok(LocalEndpoint {
            node,
            tx: self.tx.clone(),
            sent: 0,
            finished: false,
        })
    }

    /// Assemble every row received so far into a frame.
    pub fn gather(&self, width: u32, height: u32, format: PixelFormat) -> RenderResult<FrameBuffer> {
        let mut frame = FrameBuffer::new(width, height, format);
        let stride = frame.row_stride();
        for msg in self.rx.try_iter() {
            if msg.y >= height || msg.bytes.len() != stride {
                return Err(RenderError::Exchange(format!(
                    "Row {} from node {} does not fit a {}x{} frame",
                    msg.y, msg.node, width, height
                )));
            }
            frame.write_row_bytes(msg.y, &msg.bytes);
        }
        Ok(frame)
    }
}

/// A node's side of a [`LocalCluster`].
#[derive(Debug)]
pub struct LocalEndpoint {
    node: usize,
    tx: Sender<RowMessage>,
    sent: usize,
    finished: bool,
}

impl LocalEndpoint {
    pub fn node(&self) -> usize {
        self.node
    }

    /// Rows sent so far.
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RowExchange for LocalEndpoint {
    fn send_row(&mut self, y: u32, bytes: &[u8]) -> RenderResult<()> {
        if self.finished {
            return Err(RenderError::Exchange(format!(
                "Node {} sent row {} after finishing",
                self.node, y
            )));
        }
        self.tx
            .send(RowMessage {
                node: self.node,
                y,
                bytes: bytes.to_vec(),
            })
            .map_err(|e| RenderError::Exchange(e.to_string()))?;
        self.sent += 1;
        Ok(())
    }

    fn finish(&mut self) -> RenderResult<()> {
        self.finished = true;
        log::debug!("Node {} finished after {} rows", self.node, self.sent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_math::Color;

    #[test]
    fn test_rows_gather_into_frame() {
        let cluster = LocalCluster::new(2);
        let mut a = cluster.endpoint(0).unwrap();
        let mut b = cluster.endpoint(1).unwrap();

        let mut row = FrameBuffer::new(2, 1, PixelFormat::Rgb24);
        row.set_pixel(1, 0, Color::ONE);
        a.send_row(0, row.as_bytes()).unwrap();
        b.send_row(1, row.as_bytes()).unwrap();
        a.finish().unwrap();
        b.finish().unwrap();

        let frame = cluster.gather(2, 2, PixelFormat::Rgb24).unwrap();
        assert_eq!(frame.pixel(1, 0), Color::ONE);
        assert_eq!(frame.pixel(1, 1), Color::ONE);
        assert_eq!(frame.pixel(0, 1), Color::ZERO);
        assert_eq!((a.sent(), b.sent()), (1, 1));
    }

    #[test]
    fn test_invalid_node() {
        let cluster = LocalCluster::new(2);
        assert!(matches!(
            cluster.endpoint(2),
            Err(RenderError::InvalidNode { node: 2, nodes: 2 })
        ));
    }

    #[test]
    fn test_send_after_finish_fails() {
        let cluster = LocalCluster::new(1);
        let mut a = cluster.endpoint(0).unwrap();
        a.finish().unwrap();
        assert!(matches!(a.send_row(0, &[]), Err(RenderError::Exchange(_))));
    }

    #[test]
    fn test_mismatched_row_rejected() {
        let cluster = LocalCluster::new(1);
        let mut a = cluster.endpoint(0).unwrap();
        a.send_row(0, &[0, 0, 0]).unwrap();
        assert!(cluster.gather(4, 4, PixelFormat::Rgb24).is_err());
    }
}
