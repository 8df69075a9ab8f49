//! Integration tests for ledgersync-remote
//!
//! Uses wiremock to simulate the object-storage gateway and verifies
//! end-to-end behavior of metadata fetches, downloads, uploads, folder
//! listings, and token rotation.

mod common;

mod test_provider;
