mod call_orchestrator;
mod call_record;

pub use call_orchestrator::*;
pub use call_record::*;
