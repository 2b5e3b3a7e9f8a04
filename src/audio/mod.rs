pub mod analysis;
pub mod bins;
pub mod channel;
pub mod decode;
pub mod normalize;
pub mod segment;
pub mod smooth;
pub mod spectrum;
