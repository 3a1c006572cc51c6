//! sitebook: construction project bookkeeping. Expense categorization and milestone sequencing
//! with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
