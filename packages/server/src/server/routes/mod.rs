// HTTP routes
pub mod health;
pub mod purchases;
pub mod shuffle;
pub mod squares;
pub mod stream;

pub use health::*;
pub use purchases::*;
pub use shuffle::*;
pub use squares::*;
pub use stream::*;
