//! Transport-agnostic endpoints.
//!
//! An endpoint hands its command to a [`Sender`](crate::mediator::Sender)
//! and returns the outcome as is.

pub mod users;

#[cfg(test)]
pub(crate) mod mock;
