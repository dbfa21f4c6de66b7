//! GraphQL schema definitions for rickdash.
//!
//! This crate contains the generated schema types for the Rick and Morty
//! GraphQL API. Keeping them in their own crate avoids recompiling the
//! generated code when unrelated code changes.

// Disable all clippy lints for this crate - it's entirely generated code
#![allow(clippy::all)]
#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]

/// Rick and Morty GraphQL schema types.
///
/// Generated from `schemas/rickandmorty.graphql`; exports everything needed
/// to build type-safe queries against the public endpoint.
#[cynic::schema("rickandmorty")]
pub mod rickandmorty {}
