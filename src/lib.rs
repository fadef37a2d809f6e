pub mod filters;
pub mod listings_client;
pub mod report;
pub mod schemas;
pub mod settings;
