pub mod js_value;
pub mod preview;
