//! [`Scope`] definitions.

use common::define_kind;
use uuid::Uuid;

use crate::domain::{room, Room};
#[cfg(doc)]
use crate::domain::Promotion;

/// Set of [`Room`]s a [`Promotion`] is limited to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Every [`Room`].
    Global,

    /// [`Room`]s of a building.
    Building(room::BuildingId),

    /// [`Room`]s on a floor.
    Floor(room::FloorId),

    /// [`Room`]s of a type.
    RoomType(room::TypeId),

    /// A single [`Room`].
    Room(room::Id),
}

impl Scope {
    /// Creates a new [`Scope`] out of its stored [`Kind`] and target.
    ///
    /// [`None`] is returned if a targeted [`Kind`] has no target.
    #[must_use]
    pub fn new(kind: Kind, target: Option<Uuid>) -> Option<Self> {
        Some(match kind {
            Kind::Global => Self::Global,
            Kind::Building => Self::Building(target?.into()),
            Kind::Floor => Self::Floor(target?.into()),
            Kind::RoomType => Self::RoomType(target?.into()),
            Kind::Room => Self::Room(target?.into()),
        })
    }

    /// Indicates whether the provided [`Room`] is in this [`Scope`].
    #[must_use]
    pub fn covers(&self, room: &Room) -> bool {
        match *self {
            Self::Global => true,
            Self::Building(id) => room.building_id == id,
            Self::Floor(id) => room.floor_id == id,
            Self::RoomType(id) => room.type_id == id,
            Self::Room(id) => room.id == id,
        }
    }
}

define_kind! {
    #[doc = "Kind of a [`Scope`]."]
    enum Kind {
        #[doc = "[`Scope::Global`]."]
        Global = 1,

        #[doc = "[`Scope::Building`]."]
        Building = 2,

        #[doc = "[`Scope::Floor`]."]
        Floor = 3,

        #[doc = "[`Scope::RoomType`]."]
        RoomType = 4,

        #[doc = "[`Scope::Room`]."]
        Room = 5,
    }
}
