//! Repository layout checks: every source module has a mirrored unit test file
