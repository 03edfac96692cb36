pub mod columns;
pub mod filter;
pub mod jobslist;
pub mod layout;
pub mod queues;
