pub mod assemble;
pub mod ffmpeg;
pub mod image_seq;
pub mod sink;
