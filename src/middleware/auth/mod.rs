pub mod bearer;
pub mod gate;

pub use bearer::extract_bearer;
