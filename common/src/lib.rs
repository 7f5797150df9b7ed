pub mod bucket;
pub mod poller;
pub mod req;
pub mod request;
pub mod series;
pub mod status;
