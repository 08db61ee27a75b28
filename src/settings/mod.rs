use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::rendering::backend::RenderOptions;

#[derive(Parser, Debug)]
#[command(name = "procmat")]
#[command(version)]
#[command(about = "Loads procedural materials and renders their outputs")]
pub struct CliArgs {
    #[arg(long, env = "PROCMAT_DATA_DIR", default_value_t = default_data_dir())]
    pub data_dir: String,

    #[command(flatten)]
    pub system: SystemArgs,

    #[command(subcommand)]
    pub operation_mode: OperationMode,
}

pub fn default_data_dir() -> String {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("_data")
        .to_string_lossy()
        .to_string()
}

#[derive(Args, Debug, Clone)]
pub struct SystemArgs {
    /// Unlimited render budget and editor previews for every output.
    #[arg(long, env = "PROCMAT_EDITOR")]
    pub editor: bool,

    #[arg(long, default_value_t = 32, env = "PROCMAT_CORES")]
    pub cores: u32,

    /// Render memory budget in MB.
    #[arg(long, default_value_t = 512, env = "PROCMAT_MEMORY_BUDGET")]
    pub memory_budget: u32,

    #[arg(long, value_enum, default_value_t = CompressionProfile::Desktop, env = "PROCMAT_COMPRESSION")]
    pub compression: CompressionProfile,

    /// Don't resolve bound image inputs before rendering.
    #[arg(long)]
    pub skip_image_inputs: bool,

    /// Keep BC5 normal maps unsigned.
    #[arg(long)]
    pub unsigned_normal_maps: bool,
}

#[derive(Subcommand, Debug)]
pub enum OperationMode {
    /// Loads the materials and dumps every rendered output next to its texture path.
    Render {
        #[arg(required = true)]
        materials: Vec<String>,
    },
    /// Prints graphs, inputs and outputs of a material.
    Inspect { material: String },
    /// Changes an input, renders and saves the material.
    Set {
        material: String,
        input: String,
        value: String,
        #[arg(long, default_value_t = 0)]
        graph: u16,
    },
    /// Rebuilds the material from its package, keeping customized values.
    Reimport { material: String },
}

/// Which compressed formats the target platform supports.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionProfile {
    #[default]
    Desktop,
    /// No compression, outputs keep their package format.
    Mobile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// Renders with unlimited options and adds a preview output per static output.
    pub editor_mode: bool,
    /// Options applied outside the editor and when entering simulation.
    pub runtime_budget: RenderOptions,
    pub render_image_inputs: bool,
    /// Converts BC5 results to signed normal maps.
    pub signed_normal_maps: bool,
    pub compression: CompressionProfile,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            editor_mode: false,
            runtime_budget: RenderOptions {
                cores: Some(32),
                memory_budget_mb: Some(512),
            },
            render_image_inputs: true,
            signed_normal_maps: true,
            compression: CompressionProfile::Desktop,
        }
    }
}

impl From<&SystemArgs> for SystemConfig {
    fn from(args: &SystemArgs) -> Self {
        Self {
            editor_mode: args.editor,
            runtime_budget: RenderOptions {
                cores: Some(args.cores),
                memory_budget_mb: Some(args.memory_budget),
            },
            render_image_inputs: !args.skip_image_inputs,
            signed_normal_maps: !args.unsigned_normal_maps,
            compression: args.compression,
        }
    }
}
