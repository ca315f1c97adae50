pub mod facts;
pub mod feed_state;
pub mod mappings;
pub mod pricing;
pub mod seed;
