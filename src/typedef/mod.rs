//! Values, column types and statements shared by the schema model and the
//! statement engine.

pub mod random;
mod simple;
mod stmt;
mod types;
mod value;

pub use simple::SimpleType;
pub use stmt::{StatementCacheType, StatementType, Stmt, StmtCache};
pub use types::{ColumnType, CounterType, TupleType, UdtType, WireType};
pub use value::{Value, ValueWithToken, Values};
