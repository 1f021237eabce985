pub mod detection;
pub mod errors;
pub mod frame;
pub mod model;
