pub mod budget;
pub mod customer;
pub mod ledger;
pub mod product;
