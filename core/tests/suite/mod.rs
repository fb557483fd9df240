// Aggregates all integration tests as modules.
mod interception;
