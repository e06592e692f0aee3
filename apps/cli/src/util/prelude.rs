pub use crate::print_output;
pub use crate::util::error::improve_client_error;
