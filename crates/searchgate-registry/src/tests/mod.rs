//! Behavioural suites for the service registry.
