pub mod proc_initiateor;
pub mod proc_loader;
pub mod proc_validator;
pub mod sasl;
pub mod settings;
