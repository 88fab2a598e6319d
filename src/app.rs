pub mod bootstrap;
pub mod controller;

pub use bootstrap::run;
pub use controller::IngestController;
