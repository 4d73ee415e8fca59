//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Boxed error of a [`Task`] running in a [`Background`].
type BoxedError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s on the current thread.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Names and handles of the spawned [`Task`]s.
    tasks: Vec<(&'static str, task::JoinHandle<Result<(), BoxedError>>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `{name}` background task");
        let handle = self
            .set
            .spawn_local(future.map_err(|e| BoxedError::from(Box::new(e))));
        self.tasks.push((name, handle));
    }

    /// Returns the number of [`Task`]s spawned in this [`Background`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Indicates whether no [`Task`] is spawned in this [`Background`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), BoxedError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, tasks } = self;

        let tasks = tasks.into_iter().map(|(name, handle)| {
            handle
                .map(move |res| {
                    let res = res
                        .map_err(|e| BoxedError::from(Box::new(e)))
                        .and_then(|r| r);
                    if let Err(e) = &res {
                        log::error!("`{name}` background task stopped: {e}");
                    }
                    res
                })
                .boxed_local()
        });
        future::try_join_all(
            tasks.chain([set.map(Ok::<_, BoxedError>).boxed_local()]),
        )
        .map_ok(drop)
        .boxed_local()
    }
}
