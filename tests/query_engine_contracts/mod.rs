//! Contracts for hint binding and batch evaluation.

mod hint_contract;
mod vectorized_contract;
