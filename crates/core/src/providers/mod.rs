pub mod registry;
pub mod traits;

// Rate source implementations
pub mod cbrf;
pub mod cbrf_metals;
