//! Platform Abstraction Layer (PAL). Private bindings to the operating system storage APIs that
//! the drive adapters forward to, hidden behind a facade so unit tests can substitute a mock.

mod abstractions;
pub(crate) use abstractions::*;

mod facade;
pub(crate) use facade::*;

mod real;
pub(crate) use real::*;
