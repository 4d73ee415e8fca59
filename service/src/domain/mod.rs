//! Domain definitions.

/// Defines a new UUID-based identifier.
macro_rules! define_id {
    ($(#[doc = $doc:literal])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            ::serde::Deserialize,
            ::derive_more::Display,
            Eq,
            ::derive_more::From,
            ::derive_more::FromStr,
            Hash,
            ::derive_more::Into,
            Ord,
            PartialEq,
            PartialOrd,
            ::serde::Serialize,
        )]
        #[cfg_attr(
            feature = "postgres",
            derive(::postgres_types::ToSql, ::postgres_types::FromSql),
            postgres(transparent)
        )]
        pub struct $name(::uuid::Uuid);

        impl $name {
            #[doc = concat!("Creates a new random [`", stringify!($name), "`].")]
            #[must_use]
            pub fn new() -> Self {
                Self(::uuid::Uuid::new_v4())
            }
        }
    };
}

pub mod contract;
pub mod invoice;
pub mod promotion;
pub mod room;
pub mod user;

pub use self::{
    contract::Contract, invoice::Invoice, promotion::Promotion, room::Room,
    user::User,
};
