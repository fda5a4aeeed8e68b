mod aggregate;
mod budget;
mod category;
mod clock;
mod debt;
mod error;
mod filter;
mod goal;
mod money;
mod obligation;
mod record;
mod schedule;

pub use aggregate::*;
pub use budget::*;
pub use category::*;
pub use clock::*;
pub use debt::*;
pub use error::*;
pub use filter::*;
pub use goal::*;
pub use money::*;
pub use obligation::*;
pub use record::*;
pub use schedule::*;
