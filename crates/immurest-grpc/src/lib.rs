//! gRPC bindings for the tamper-evident backend service.
//!
//! Generated from `proto/immurest.proto` at build time (protoc is vendored,
//! no system install needed). `proto_convert` maps the wire types onto the
//! strongly typed model in `immurest-core`.

#![allow(clippy::derive_partial_eq_without_eq)]

pub mod proto {
    tonic::include_proto!("immurest.v1");
}

pub mod proto_convert;

pub use proto::immu_service_client::ImmuServiceClient;
pub use proto::immu_service_server::{ImmuService, ImmuServiceServer};
pub use proto_convert::ConvertError;
