//! `Room`-related definitions.

use derive_more::{Display, From, Into};
use juniper::GraphQLScalar;
use service::domain;
use uuid::Uuid;

use crate::define_error;

/// Unique identifier of a `Room`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::room::Id)]
#[into(domain::room::Id)]
#[graphql(name = "RoomId", transparent)]
pub struct Id(Uuid);

define_error! {
    enum RoomError {
        #[code = "ROOM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Room` with the specified ID does not exist"]
        NotExists,

        #[code = "ROOM_NOT_PRICED"]
        #[status = UNPROCESSABLE_ENTITY]
        #[message = "`Room` has no rent for the requested `BillingPeriod`"]
        NotPriced,

        #[code = "ROOM_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`Room` is booked by another `Contract` in the requested \
                     days"]
        Occupied,
    }
}
