// Business domains
pub mod rotation;
pub mod squares;
