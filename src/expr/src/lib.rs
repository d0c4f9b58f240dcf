//! Arithmetic expression parsing via the shunting-yard algorithm, and the
//! admixture graph input (AGI) file format built on top of it.

mod agi;
mod error;
mod shunting_yard;

pub use agi::AgiInput;
pub use error::ExprError;
pub use shunting_yard::Expression;
