//! Internal implementation details.

pub(crate) mod teardown;

pub(crate) use teardown::{AsyncTeardownStack, Release, SyncRelease, TeardownStack};
