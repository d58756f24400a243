mod logging;

pub use logging::{log_requests, REQUEST_ID_HEADER};
