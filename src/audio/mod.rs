pub mod analysis;
pub mod decode;
pub mod extract;
pub mod features;
