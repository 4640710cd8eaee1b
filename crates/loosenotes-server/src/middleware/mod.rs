//! HTTP middleware.

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, propagate_request_id, request_id_layer, request_span};
