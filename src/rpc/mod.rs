pub mod server;
pub mod socket;

pub use server::RigRpc;
pub use socket::{run_as_proxy, start_socket_server};
