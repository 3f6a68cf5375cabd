pub mod container;
pub mod controller;
pub mod router;
pub mod terminal;

pub use container::{Container, ContainerConfig};
pub use router::Router;
pub use terminal::TerminalRenderer;
