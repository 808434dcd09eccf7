//! Mutation handles returned by the controller

use futures::future::{self, BoxFuture};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::domain::StoreError;

/// Terminal outcome of an optimistic mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<C = ()> {
    /// The store accepted the change
    Committed(C),
    /// The store rejected it; local state was restored and the user notified
    RolledBack(StoreError),
}

impl<C> Outcome<C> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed(_))
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Outcome::Committed(_) => None,
            Outcome::RolledBack(err) => Some(err),
        }
    }
}

/// An optimistic change that is already visible locally.
///
/// Awaiting it issues the remote call and settles the change. Dropping it
/// before it resolves rolls the change back.
#[must_use = "the remote call only runs when the mutation is awaited"]
pub struct Mutation<T, C = ()> {
    preview: T,
    settle: BoxFuture<'static, Outcome<C>>,
}

impl<T, C: Send + 'static> Mutation<T, C> {
    pub(crate) fn new(preview: T, settle: BoxFuture<'static, Outcome<C>>) -> Self {
        Self { preview, settle }
    }

    /// Already settled, no remote call needed
    pub(crate) fn ready(preview: T, outcome: Outcome<C>) -> Self {
        Self::new(preview, Box::pin(future::ready(outcome)))
    }
}

impl<T, C> Mutation<T, C> {
    /// The item as it looked right after the optimistic apply
    pub fn preview(&self) -> &T {
        &self.preview
    }
}

// The preview is never pinned, only the boxed settlement is polled.
impl<T, C> Unpin for Mutation<T, C> {}

impl<T, C> Future for Mutation<T, C> {
    type Output = Outcome<C>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().settle.as_mut().poll(cx)
    }
}
