//! HTTP layer for record-oriented resources.
//!
//! Resources implement [`Resource`] plus any of the capability traits
//! ([`CreateView`], [`ListView`], [`RetrieveView`], [`UpdateView`],
//! [`DeleteView`]); [`ResourceRouter`] and [`crud_routes`] mount them on axum.
//! Every response, success or failure, is an [`Envelope`].

pub mod envelope;
pub mod error;
pub mod extract;
pub mod http;
pub mod messages;
pub mod middleware;
pub mod module;
pub mod principal;
pub mod request_id;
pub mod router;
pub mod schema;
pub mod text;
pub mod views;

pub use envelope::Envelope;
pub use error::{ApiError, ApiResult, FieldError};
pub use extract::{Payload, QueryParams};
pub use http::{finish_router, HttpOptions};
pub use middleware::ApiVersion;
pub use module::Module;
pub use principal::Principal;
pub use router::{crud_routes, not_found, shared_crud_routes, ResourceRouter};
pub use schema::{FieldSpec, FieldType, Schema};
pub use text::{full_name, title_case};
pub use views::{
    default_list_query, page_params, Action, BaseView, CreateView, Created, DeleteView, ListView,
    MethodMapping, RequestContext, Resource, RetrieveView, UpdateView,
};

pub use query_core::Lookup;
