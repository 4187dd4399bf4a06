pub mod night;
pub mod site;
pub mod target;
pub mod time;
pub mod track;

pub use night::*;
pub use site::*;
pub use target::*;
pub use time::*;
pub use track::*;
