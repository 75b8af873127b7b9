//! Domain types and models

pub mod api;

pub use api::{
    ApiError, ApiResult, CredentialCheck, SkewReport, NON_JSON_RESPONSE, UNPARSEABLE_DETAIL,
};
