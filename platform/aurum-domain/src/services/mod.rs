pub mod pricing;
pub mod timestamps;
