/// HTTP surface of the provisioner
pub mod server;

pub use server::HttpServer;
