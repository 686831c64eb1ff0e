//! Editor configuration
//!
//! [`EditorConfig`] carries every tunable of the editor with the defaults the
//! product ships with. The binary overrides a subset of them from the command
//! line through [`Cli`].

use std::path::PathBuf;

use cgmath::{Deg, Vector3};
use clap::Parser;

use crate::store::Color;

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub background: Color,

    pub camera_fov: Deg<f32>,
    pub camera_near: f32,
    pub camera_far: f32,
    pub camera_eye: Vector3<f32>,
    pub camera_target: Vector3<f32>,
    /// Fraction of orbit/pan velocity kept per 60 Hz tick is `1 - damping`
    pub orbit_damping: f32,

    pub ground_size: f32,
    pub ground_color: Color,
    pub grid_size: f32,

    pub ghost_opacity: f32,
    pub outline_color: Color,

    pub default_color: Color,
    pub palette: Vec<(String, Color)>,

    /// Seconds a notice stays on screen
    pub notice_lifetime: f32,

    /// OBJ model backing the composite prototype, if any
    pub sofa_model: Option<PathBuf>,
    /// Flat JSON record list to seed from and save back to
    pub layout_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            window_width: 1200,
            window_height: 800,
            background: Color(0xf0f0f0),

            camera_fov: Deg(75.0),
            camera_near: 0.1,
            camera_far: 1000.0,
            camera_eye: Vector3::new(0.0, 1.5, 5.0),
            camera_target: Vector3::new(0.0, 0.0, 0.0),
            orbit_damping: 0.05,

            ground_size: 50.0,
            ground_color: Color(0xdddddd),
            grid_size: 1.0,

            ghost_opacity: 0.5,
            outline_color: Color::YELLOW,

            default_color: Color::DEFAULT_ACTIVE,
            palette: vec![
                ("Green".to_string(), Color::GREEN),
                ("Blue".to_string(), Color::BLUE),
                ("Purple".to_string(), Color::PURPLE),
            ],

            notice_lifetime: 3.0,

            sofa_model: None,
            layout_path: None,
        }
    }
}

/// Plinth 3D layout editor
#[derive(Parser, Clone, Debug)]
#[command(name = "plinth")]
#[command(about = "Drag objects onto a ground plane, then select, recolor and delete them")]
pub struct Cli {
    /// Initial window width
    #[arg(long, default_value = "1200")]
    pub width: u32,

    /// Initial window height
    #[arg(long, default_value = "800")]
    pub height: u32,

    /// JSON layout file to load at startup and save on exit
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// OBJ model enabling the "Sofa" prototype
    #[arg(long)]
    pub sofa_model: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self) -> EditorConfig {
        EditorConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            layout_path: self.layout,
            sofa_model: self.sofa_model,
            ..EditorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = Cli::parse_from([
            "plinth",
            "--width",
            "640",
            "--layout",
            "room.json",
            "--sofa-model",
            "sofa.obj",
        ]);
        let config = cli.into_config();
        assert_eq!(config.window_width, 640);
        assert_eq!(config.window_height, 800);
        assert_eq!(config.layout_path, Some(PathBuf::from("room.json")));
        assert_eq!(config.sofa_model, Some(PathBuf::from("sofa.obj")));
        assert_eq!(config.default_color, Color::DEFAULT_ACTIVE);
    }
}
