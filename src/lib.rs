pub mod application;
pub mod automator;
pub mod binder;
pub mod bindings;
pub mod conjunct;
pub mod error;
pub mod expression;
pub mod problem;
pub mod proof_state;
pub mod proof_step;
pub mod prover;
pub mod report;
pub mod site;
pub mod syntax;
pub mod theorem;
pub mod transformation;

#[cfg(test)]
mod tests;
