pub mod apriori;
pub mod fpgrowth;
pub mod rules;
