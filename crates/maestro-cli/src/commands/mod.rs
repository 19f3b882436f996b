mod control;
mod status;

pub use control::control;
pub use status::render_status;
