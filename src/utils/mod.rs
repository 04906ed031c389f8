pub mod helpers;
pub mod render;
