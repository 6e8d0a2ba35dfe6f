pub mod change;
pub mod publish;
pub mod pipeline;
