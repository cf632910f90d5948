//! Fixture programs shared by the machine, pipeline and noun/verb tests.
