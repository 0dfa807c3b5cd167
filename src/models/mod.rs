pub mod settings;
pub mod video;

pub use settings::*;
pub use video::*;
