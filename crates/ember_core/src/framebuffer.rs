//! Output pixel buffer in one of two fixed layouts.
//!
//! Row 0 is the top of the image. Both layouts are interleaved RGB.

use crate::options::PixelFormat;
use ember_math::Color;

#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    Rgb24(Vec<u8>),
    Rgb96F(Vec<f32>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    data: PixelData,
}

/// Quantize one channel the way 8-bit output expects: truncate, then clamp.
#[inline]
pub fn quantize(c: f32) -> u8 {
    ((c * 255.0) as i32).clamp(0, 255) as u8
}

impl FrameBuffer {
    /// A black buffer of the given size and layout.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * 3;
        let data = match format {
            PixelFormat::Rgb24 => PixelData::Rgb24(vec![0; len]),
            PixelFormat::Rgb96F => PixelData::Rgb96F(vec![0.0; len]),
        };
        Self {
            width,
            height,
            data,
        }
    }

    pub fn format(&self) -> PixelFormat {
        match self.data {
            PixelData::Rgb24(_) => PixelFormat::Rgb24,
            PixelData::Rgb96F(_) => PixelFormat::Rgb96F,
        }
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.offset(x, y);
        match &mut self.data {
            PixelData::Rgb24(buf) => {
                buf[i] = quantize(color.x);
                buf[i + 1] = quantize(color.y);
                buf[i + 2] = quantize(color.z);
            }
            PixelData::Rgb96F(buf) => {
                buf[i..i + 3].copy_from_slice(&color.to_array());
            }
        }
    }

    /// Stored pixel value; 8-bit data is scaled back to [0, 1].
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let i = self.offset(x, y);
        match &self.data {
            PixelData::Rgb24(buf) => Color::new(
                buf[i] as f32 / 255.0,
                buf[i + 1] as f32 / 255.0,
                buf[i + 2] as f32 / 255.0,
            ),
            PixelData::Rgb96F(buf) => Color::new(buf[i], buf[i + 1], buf[i + 2]),
        }
    }

    /// Raw bytes of the whole buffer in native layout.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            PixelData::Rgb24(buf) => buf,
            PixelData::Rgb96F(buf) => bytemuck::cast_slice(buf),
        }
    }

    /// Bytes per row in native layout.
    pub fn row_stride(&self) -> usize {
        let channel = match self.data {
            PixelData::Rgb24(_) => 1,
            PixelData::Rgb96F(_) => std::mem::size_of::<f32>(),
        };
        self.width as usize * 3 * channel
    }

    /// Copy of one row in native byte layout.
    pub fn row_bytes(&self, y: u32) -> Vec<u8> {
        let stride = self.row_stride();
        let start = y as usize * stride;
        self.as_bytes()[start..start + stride].to_vec()
    }

    /// Overwrite one row from native byte layout. Short input writes a partial row.
    pub fn write_row_bytes(&mut self, y: u32, bytes: &[u8]) {
        let start = self.offset(0, y);
        match &mut self.data {
            PixelData::Rgb24(buf) => {
                let n = bytes.len().min(self.width as usize * 3);
                buf[start..start + n].copy_from_slice(&bytes[..n]);
            }
            PixelData::Rgb96F(buf) => {
                let row = &mut buf[start..start + self.width as usize * 3];
                let dst: &mut [u8] = bytemuck::cast_slice_mut(row);
                let n = bytes.len().min(dst.len());
                dst[..n].copy_from_slice(&bytes[..n]);
            }
        }
    }

    /// 8-bit RGB copy suitable for encoding.
    pub fn to_rgb8(&self) -> Vec<u8> {
        match &self.data {
            PixelData::Rgb24(buf) => buf.clone(),
            PixelData::Rgb96F(buf) => buf.iter().map(|c| quantize(*c)).collect(),
        }
    }

    /// Scale float output so the largest channel becomes 1. No-op for 8-bit data.
    pub fn normalize(&mut self) {
        if let PixelData::Rgb96F(buf) = &mut self.data {
            let max = buf.iter().copied().fold(0.0f32, f32::max);
            if max > 0.0 {
                let inv = 1.0 / max;
                buf.iter_mut().for_each(|c| *c *= inv);
            }
        }
    }

    /// Raise float channels to `1 / gamma`. No-op for 8-bit data.
    pub fn apply_gamma(&mut self, gamma: f32) {
        if gamma <= 0.0 {
            return;
        }
        if let PixelData::Rgb96F(buf) = &mut self.data {
            let inv = 1.0 / gamma;
            buf.iter_mut()
                .for_each(|c| *c = if *c > 0.0 { c.powf(inv) } else { 0.0 });
        }
    }

    /// Swap rows top to bottom.
    pub fn flip_vertical(&mut self) {
        let h = self.height as usize;
        let w3 = self.width as usize * 3;
        fn flip<T>(buf: &mut [T], w3: usize, h: usize) {
            for y in 0..h / 2 {
                let (top, bottom) = buf.split_at_mut((h - 1 - y) * w3);
                top[y * w3..(y + 1) * w3].swap_with_slice(&mut bottom[..w3]);
            }
        }
        match &mut self.data {
            PixelData::Rgb24(buf) => flip(buf, w3, h),
            PixelData::Rgb96F(buf) => flip(buf, w3, h),
        }
    }
}
