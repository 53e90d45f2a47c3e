// Purchase actions - invoked by the payment glue
pub mod purchases;

pub use purchases::*;
