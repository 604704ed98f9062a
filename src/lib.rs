pub mod artifact;
pub mod assets;
pub mod config;
pub mod fingerprint;
pub mod generate;
pub mod logger;
pub mod naming;
pub mod pages;
pub mod post;
pub mod post_render;
pub mod registry;
pub mod sync;
pub mod view;
mod test_data;
