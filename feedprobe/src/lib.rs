// Library interface for feedprobe modules
// This allows tests and the binaries to import modules

pub mod fetch;
pub mod mock;
pub mod normalize;
pub mod render;
pub mod server;
pub mod xml_format;
