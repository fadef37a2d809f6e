pub mod listings_response;
pub mod requisition;
