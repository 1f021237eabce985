pub mod dto;
pub mod frame_decoder;
pub mod ports;
pub mod services;
