//! Tessera Comprehensive Test Suite
//!
//! End-to-end guarantees of the data graph, the filter contract and the
//! parallel dispatch primitive.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Graph Invariants**
//!   Multi-parent links, cascading erase, deep copy isolation, path parsing.
//!
//! - **Tier 2: Filter Contract**
//!   Validation purity, declare-then-fill equality, action ordering,
//!   state machine outcomes.
//!
//! - **Tier 3: Parallel Dispatch**
//!   Cancellation safety and parallel/sequential equivalence.
//!
//! - **Tier 4: Pipelines**
//!   Whole-pipeline preflight, execution and persistence.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test tessera_comprehensive
//!
//! # Run only the dispatch tests
//! cargo test --test tessera_comprehensive parallel
//!
//! # Show engine logs (debug level, test writer)
//! cargo test --test tessera_comprehensive -- --nocapture
//! ```

// Test utilities
mod test_utils;

// Tier 1
mod graph_invariants;

// Tier 2
mod filter_contract;

// Tier 3
mod parallel_dispatch;

// Tier 4
mod pipeline_tests;
