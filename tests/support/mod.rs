pub mod fixtures;
pub mod socket_guard;
