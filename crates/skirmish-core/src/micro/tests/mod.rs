mod generator_tests;
mod property_ledger_tests;
