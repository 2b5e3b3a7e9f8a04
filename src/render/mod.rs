pub mod chunk;
pub mod draw;
pub mod frame;
pub mod pipeline;
pub mod style;
