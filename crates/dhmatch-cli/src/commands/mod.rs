pub mod config;
pub mod match_images;
pub mod synth;

mod selection;
