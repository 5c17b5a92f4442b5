pub mod data_uri;
pub mod logging;
pub mod path_resolver;
pub mod validation;
