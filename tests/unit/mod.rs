mod decoder_tests;
mod graph_tests;
mod schema_tests;
mod sqlgen_tests;
