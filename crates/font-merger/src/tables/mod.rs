//! Table-specific merge implementations

pub mod cmap;
pub mod glyf;
pub mod head;
pub mod hmtx;
pub mod kern;
pub mod os2;
pub mod post;
pub mod vmtx;
