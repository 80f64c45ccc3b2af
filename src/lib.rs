pub mod data;
pub mod logging;
pub mod statement;

#[cfg(test)]
mod data_tests;
