pub mod command;
pub mod ids;
pub mod path;
pub mod snapshot;
pub mod unit;

#[cfg(test)]
pub(crate) mod testing;
