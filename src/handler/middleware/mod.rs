pub mod clientip;
pub mod request_log;
