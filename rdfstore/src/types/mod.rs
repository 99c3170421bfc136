mod ids;
mod term;
mod triple;

pub use ids::{TermId, TxnId};
pub use term::{Literal, Term, TermKind};
pub use triple::{Position, RejectReason, Triple};
