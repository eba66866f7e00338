pub mod abstract_action;
pub mod generator;
pub mod ledger;
pub mod script;

#[cfg(test)]
mod tests;
