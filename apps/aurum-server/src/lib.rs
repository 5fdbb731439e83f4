pub mod api;
pub mod bootstrap;
pub mod obs;
pub mod scheduler;
