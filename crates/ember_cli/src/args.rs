//! Command-line parsing.

use anyhow::{Context, Result};
use clap::Parser;
use ember_core::{RenderOptions, ShaderMode};
use std::path::PathBuf;

/// Render the built-in demo scene to an image file.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "ember", version, long_about = None)]
pub struct Args {
    /// Output image; the extension picks the format (png, ppm, ...)
    #[arg(default_value = "ember.png")]
    pub output: PathBuf,

    /// Render options (JSON) to start from
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Output resolution, as <W>x<H>
    #[arg(long, value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Shading quality
    #[arg(long, value_enum, ignore_case = true)]
    pub shader: Option<CliShader>,

    /// Extra antialiasing samples per pixel
    #[arg(long = "aa")]
    pub aa_samples: Option<u32>,

    /// Ambient occlusion samples
    #[arg(long = "ao")]
    pub ao_samples: Option<u32>,

    /// Maximum ray recursion depth
    #[arg(long = "depth")]
    pub max_depth: Option<u32>,

    /// Image to wrap around the center sphere
    #[arg(long)]
    pub texture: Option<String>,

    /// Split the frame across N in-process nodes
    #[arg(long, default_value_t = 1, value_parser = parse_nodes)]
    pub nodes: usize,

    /// Flip the image vertically before writing
    #[arg(long)]
    pub flip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliShader {
    Auto,
    /// White on hit, black on miss
    Lowest,
    /// Unlit surface color
    Low,
    /// Lighting without shadows or ambient occlusion
    Medium,
    Full,
}

impl From<CliShader> for ShaderMode {
    fn from(s: CliShader) -> Self {
        match s {
            CliShader::Auto => ShaderMode::Auto,
            CliShader::Lowest => ShaderMode::Lowest,
            CliShader::Low => ShaderMode::Low,
            CliShader::Medium => ShaderMode::Medium,
            CliShader::Full => ShaderMode::Full,
        }
    }
}

impl Args {
    /// Load the options file, if any, and apply command-line overrides.
    pub fn render_options(&self) -> Result<RenderOptions> {
        let mut options = match &self.options {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => RenderOptions::default(),
        };

        if let Some((width, height)) = self.size {
            options.width = width;
            options.height = height;
        }
        if self.threads.is_some() {
            options.threads = self.threads;
        }
        if let Some(shader) = self.shader {
            options.shader = shader.into();
        }
        Ok(options)
    }
}

fn parse_size(text: &str) -> Result<(u32, u32), String> {
    let (w, h) = text
        .split_once('x')
        .ok_or_else(|| format!("expected <W>x<H>, got {text:?}"))?;
    let dim = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| format!("expected a number, got {s:?}"))
    };
    Ok((dim(w)?, dim(h)?))
}

fn parse_nodes(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("expected a number, got {text:?}")),
    }
}
