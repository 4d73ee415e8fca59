//! GraphQL API definitions.

pub mod contract;
pub mod invoice;
mod mutation;
pub mod pricing;
mod query;
pub mod room;
pub mod scalar;
pub mod user;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    contract::Contract, invoice::Invoice, mutation::Mutation, query::Query,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
