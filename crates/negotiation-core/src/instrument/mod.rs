pub mod limits;
pub mod method;
pub mod present_value;
