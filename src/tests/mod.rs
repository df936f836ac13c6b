pub mod common;

mod refresh_single_flight;
