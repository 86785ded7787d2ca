mod relay_server;

pub use relay_server::*;
