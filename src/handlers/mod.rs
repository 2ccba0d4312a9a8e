pub mod health;
pub mod control;
pub mod pages;
pub mod features;

pub use health::health_handler;
pub use control::control_handler;
pub use pages::{app_handler, index_handler, setup_handler};
pub use features::features_handler;
